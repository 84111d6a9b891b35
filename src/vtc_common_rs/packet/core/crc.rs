/// Table-driven CRC engine
/// One generic implementation serves every register width (8/16/32/64/128 bits).
/// The algorithm is MSB-first and never reflects input or output.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::ops::BitXor;

use log::trace;

/// Unsigned integer usable as a CRC register
pub trait CrcWidth:
    Copy + Eq + Debug + Default + BitXor<Output = Self> + Send + Sync + 'static
{
    /// Register width in bits
    const BITS: u32;

    /// Places `byte` in the high-order byte of the register
    fn from_top_byte(byte: u8) -> Self;

    /// High-order byte of the register
    fn top_byte(self) -> u8;

    fn top_bit_set(self) -> bool;

    fn shl1(self) -> Self;

    /// Shift left by one byte; an 8-bit register shifts to zero
    fn shl8(self) -> Self;

    /// Widened value, used when storing a checksum into a frame
    fn to_u64_lossy(self) -> u64;
}

macro_rules! impl_crc_width {
    ($($t:ty),*) => {$(
        impl CrcWidth for $t {
            const BITS: u32 = <$t>::BITS;

            #[inline(always)]
            fn from_top_byte(byte: u8) -> Self {
                (byte as $t) << (Self::BITS - 8)
            }

            #[inline(always)]
            fn top_byte(self) -> u8 {
                (self >> (Self::BITS - 8)) as u8
            }

            #[inline(always)]
            fn top_bit_set(self) -> bool {
                (self >> (Self::BITS - 1)) != 0
            }

            #[inline(always)]
            fn shl1(self) -> Self {
                self << 1
            }

            #[inline(always)]
            fn shl8(self) -> Self {
                self.checked_shl(8).unwrap_or(0)
            }

            #[inline(always)]
            fn to_u64_lossy(self) -> u64 {
                self as u64
            }
        }
    )*};
}

impl_crc_width!(u8, u16, u32, u64, u128);

/// Immutable 256-entry lookup table for one polynomial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcTable<T: CrcWidth> {
    polynomial: T,
    entries: [T; 256],
}

impl<T: CrcWidth> CrcTable<T> {
    /// Build the table for `polynomial`
    ///
    /// Each entry is the remainder of one byte fed through eight
    /// shift-and-XOR division steps, starting from the register's high byte.
    pub fn new(polynomial: T) -> Self {
        let mut entries = [T::default(); 256];

        for (i, slot) in entries.iter_mut().enumerate() {
            let mut remainder = T::from_top_byte(i as u8);
            for _ in 0..8 {
                let top = remainder.top_bit_set();
                remainder = remainder.shl1();
                if top {
                    remainder = remainder ^ polynomial;
                }
            }
            *slot = remainder;
        }

        trace!("built {}-bit CRC table for polynomial {:?}", T::BITS, polynomial);

        Self { polynomial, entries }
    }

    pub fn polynomial(&self) -> T {
        self.polynomial
    }

    #[inline(always)]
    pub fn get(&self, index: u8) -> T {
        self.entries[index as usize]
    }

    pub fn entries(&self) -> &[T; 256] {
        &self.entries
    }
}

/// Catalogue parameters of a non-reflected CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcAlgorithm<T: CrcWidth> {
    pub name: &'static str,
    pub poly: T,
    pub init: T,
    pub xor_out: T,
    /// Checksum of ASCII "123456789"
    pub check: T,
}

/// CRC engine bound to one polynomial
#[derive(Debug, Clone)]
pub struct Crc<T: CrcWidth> {
    table: CrcTable<T>,
    init: T,
    xor_out: T,
}

impl<T: CrcWidth> Crc<T> {
    /// Engine with zero preset and no final XOR
    pub fn new(polynomial: T) -> Self {
        Self {
            table: CrcTable::new(polynomial),
            init: T::default(),
            xor_out: T::default(),
        }
    }

    pub fn from_algorithm(algorithm: &CrcAlgorithm<T>) -> Self {
        Self {
            table: CrcTable::new(algorithm.poly),
            init: algorithm.init,
            xor_out: algorithm.xor_out,
        }
    }

    pub fn table(&self) -> &CrcTable<T> {
        &self.table
    }

    pub fn init(&self) -> T {
        self.init
    }

    pub fn xor_out(&self) -> T {
        self.xor_out
    }

    /// Running remainder over an iterator of bytes
    ///
    /// Args:
    ///     bytes: any sequence whose items are bytes
    ///     initial: remainder carried in from a previous call (or the preset)
    ///
    /// Returns:
    ///     remainder after the last byte, without final XOR
    pub fn compute_iter<I>(&self, bytes: I, initial: T) -> T
    where
        I: IntoIterator,
        I::Item: Borrow<u8>,
    {
        bytes.into_iter().fold(initial, |remainder, byte| {
            let index = *byte.borrow() ^ remainder.top_byte();
            self.table.get(index) ^ remainder.shl8()
        })
    }

    /// Running remainder over a contiguous buffer
    ///
    /// Same bytes through the same path as [`Crc::compute_iter`].
    pub fn compute(&self, data: &[u8], initial: T) -> T {
        self.compute_iter(data, initial)
    }

    /// Full checksum: preset, remainder, final XOR
    pub fn checksum(&self, data: &[u8]) -> T {
        self.compute(data, self.init) ^ self.xor_out
    }

    /// Streaming accumulator starting at the preset
    pub fn digest(&self) -> CrcDigest<'_, T> {
        CrcDigest {
            crc: self,
            remainder: self.init,
        }
    }
}

/// Incremental checksum over several buffers
#[derive(Debug, Clone)]
pub struct CrcDigest<'a, T: CrcWidth> {
    crc: &'a Crc<T>,
    remainder: T,
}

impl<'a, T: CrcWidth> CrcDigest<'a, T> {
    pub fn update(&mut self, data: &[u8]) {
        self.remainder = self.crc.compute(data, self.remainder);
    }

    /// Remainder so far, without final XOR
    pub fn remainder(&self) -> T {
        self.remainder
    }

    pub fn finalize(self) -> T {
        self.remainder ^ self.crc.xor_out
    }
}
