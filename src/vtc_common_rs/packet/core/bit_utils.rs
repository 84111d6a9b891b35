/// Bit-field access on byte buffers
/// Reads and writes 1..=64 bit fields at any bit offset, J1939 style.
///
/// Every elementary access is a read-modify-write of one 8-byte window
/// starting at the byte that contains the field's first bit. A window can
/// hold any field of up to 56 bits at any in-byte shift (7 + 56 <= 64), so
/// 57..=64 bit fields are split into a 56-bit part and a high remainder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::exceptions::BitRangeError;

/// Widest field a single window access can carry
pub const WINDOW_FIELD_BITS: usize = 56;

/// Widest field the codec accepts
pub const MAX_FIELD_BITS: usize = 64;

/// Bit numbering and value orientation inside the buffer
///
/// LittleEndian ("Intel", J1939): bit 0 is the LSB of byte 0 and the value's
/// LSB sits at `bit_offset`.
/// BigEndian ("Motorola", network order): bit 0 is the MSB of byte 0 and the
/// value's MSB sits at `bit_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    #[serde(alias = "little", alias = "intel")]
    LittleEndian,
    #[serde(alias = "big", alias = "motorola")]
    BigEndian,
}

impl ByteOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "little_endian",
            ByteOrder::BigEndian => "big_endian",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "little_endian" | "little-endian" | "little" | "le" | "intel" => Ok(ByteOrder::LittleEndian),
            "big_endian" | "big-endian" | "big" | "be" | "motorola" => Ok(ByteOrder::BigEndian),
            _ => Err(format!("Invalid byte order: {}", s)),
        }
    }
}

/// Value that can be stored in a bit field
///
/// Conversion is by bit pattern: narrowing truncates, widening zero-extends.
/// Signed fields that need sign extension go through [`get_bits_signed`].
pub trait BitValue: Copy {
    fn to_raw(self) -> u64;
    fn from_raw(raw: u64) -> Self;
}

macro_rules! impl_bit_value_int {
    ($($t:ty),*) => {$(
        impl BitValue for $t {
            #[inline(always)]
            fn to_raw(self) -> u64 {
                self as u64
            }

            #[inline(always)]
            fn from_raw(raw: u64) -> Self {
                raw as $t
            }
        }
    )*};
}

impl_bit_value_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl BitValue for bool {
    #[inline(always)]
    fn to_raw(self) -> u64 {
        self as u64
    }

    #[inline(always)]
    fn from_raw(raw: u64) -> Self {
        raw & 1 != 0
    }
}

impl BitValue for f32 {
    #[inline(always)]
    fn to_raw(self) -> u64 {
        self.to_bits() as u64
    }

    #[inline(always)]
    fn from_raw(raw: u64) -> Self {
        f32::from_bits(raw as u32)
    }
}

impl BitValue for f64 {
    #[inline(always)]
    fn to_raw(self) -> u64 {
        self.to_bits()
    }

    #[inline(always)]
    fn from_raw(raw: u64) -> Self {
        f64::from_bits(raw)
    }
}

/// Mask of the low `bits` bits (1..=64)
#[inline(always)]
pub fn low_mask(bits: usize) -> u64 {
    u64::MAX >> (64 - bits)
}

/// Validate a field against a buffer of `buffer_len` bytes
pub fn check_bit_range(
    buffer_len: usize,
    bit_offset: usize,
    bit_length: usize,
) -> Result<(), BitRangeError> {
    if bit_length == 0 || bit_length > MAX_FIELD_BITS {
        return Err(BitRangeError::InvalidLength(bit_length));
    }
    let buffer_bits = buffer_len.saturating_mul(8);
    match bit_offset.checked_add(bit_length) {
        Some(end) if end <= buffer_bits => Ok(()),
        _ => Err(BitRangeError::OutOfBounds {
            bit_offset,
            bit_length,
            buffer_bits,
        }),
    }
}

#[inline(always)]
fn is_byte_aligned(bit_offset: usize, bit_length: usize) -> bool {
    bit_offset % 8 == 0 && bit_length % 8 == 0
}

/// Load the 8-byte window at `start`, zero-filled past the buffer end
#[inline(always)]
fn load_window(buf: &[u8], start: usize) -> ([u8; 8], usize) {
    let end = (start + 8).min(buf.len());
    let mut window = [0u8; 8];
    window[..end - start].copy_from_slice(&buf[start..end]);
    (window, end - start)
}

/// Shift of the field's LSB inside the window word
#[inline(always)]
fn window_shift(bit_offset: usize, bit_length: usize, order: ByteOrder) -> usize {
    match order {
        ByteOrder::LittleEndian => bit_offset % 8,
        ByteOrder::BigEndian => 64 - bit_offset % 8 - bit_length,
    }
}

fn write_window(dest: &mut [u8], raw: u64, bit_offset: usize, bit_length: usize, order: ByteOrder) {
    debug_assert!(bit_length <= WINDOW_FIELD_BITS);
    let start = bit_offset / 8;
    let (window, used) = load_window(dest, start);

    let shift = window_shift(bit_offset, bit_length, order);
    let mask = low_mask(bit_length) << shift;
    let word = match order {
        ByteOrder::LittleEndian => u64::from_le_bytes(window),
        ByteOrder::BigEndian => u64::from_be_bytes(window),
    };
    let word = (word & !mask) | ((raw << shift) & mask);
    let window = match order {
        ByteOrder::LittleEndian => word.to_le_bytes(),
        ByteOrder::BigEndian => word.to_be_bytes(),
    };

    dest[start..start + used].copy_from_slice(&window[..used]);
}

fn read_window(src: &[u8], bit_offset: usize, bit_length: usize, order: ByteOrder) -> u64 {
    debug_assert!(bit_length <= WINDOW_FIELD_BITS);
    let (window, _) = load_window(src, bit_offset / 8);

    let word = match order {
        ByteOrder::LittleEndian => u64::from_le_bytes(window),
        ByteOrder::BigEndian => u64::from_be_bytes(window),
    };
    (word >> window_shift(bit_offset, bit_length, order)) & low_mask(bit_length)
}

fn write_aligned(dest: &mut [u8], raw: u64, byte_offset: usize, byte_length: usize, order: ByteOrder) {
    let target = &mut dest[byte_offset..byte_offset + byte_length];
    match order {
        ByteOrder::LittleEndian => target.copy_from_slice(&raw.to_le_bytes()[..byte_length]),
        ByteOrder::BigEndian => target.copy_from_slice(&raw.to_be_bytes()[8 - byte_length..]),
    }
}

fn read_aligned(src: &[u8], byte_offset: usize, byte_length: usize, order: ByteOrder) -> u64 {
    let source = &src[byte_offset..byte_offset + byte_length];
    let mut bytes = [0u8; 8];
    match order {
        ByteOrder::LittleEndian => {
            bytes[..byte_length].copy_from_slice(source);
            u64::from_le_bytes(bytes)
        }
        ByteOrder::BigEndian => {
            bytes[8 - byte_length..].copy_from_slice(source);
            u64::from_be_bytes(bytes)
        }
    }
}

/// Write a bit field, reporting range violations
///
/// Args:
///     dest: target buffer
///     value: value to store (its low `bit_length` bits are used)
///     bit_offset: first bit of the field from the buffer start
///     bit_length: field width, 1..=64
///     order: bit numbering and value orientation
///
/// Returns:
///     Err if the field is empty, wider than 64 bits or runs past the buffer
pub fn checked_set_bits<V: BitValue>(
    dest: &mut [u8],
    value: V,
    bit_offset: usize,
    bit_length: usize,
    order: ByteOrder,
) -> Result<(), BitRangeError> {
    check_bit_range(dest.len(), bit_offset, bit_length)?;
    let raw = value.to_raw() & low_mask(bit_length);

    if is_byte_aligned(bit_offset, bit_length) {
        write_aligned(dest, raw, bit_offset / 8, bit_length / 8, order);
    } else if bit_length <= WINDOW_FIELD_BITS {
        write_window(dest, raw, bit_offset, bit_length, order);
    } else {
        let rest = bit_length - WINDOW_FIELD_BITS;
        let (first, second) = match order {
            // low 56 bits, then byte 7 of the little-endian value
            ByteOrder::LittleEndian => (raw & low_mask(WINDOW_FIELD_BITS), raw >> WINDOW_FIELD_BITS),
            ByteOrder::BigEndian => (raw >> rest, raw & low_mask(rest)),
        };
        write_window(dest, first, bit_offset, WINDOW_FIELD_BITS, order);
        write_window(dest, second, bit_offset + WINDOW_FIELD_BITS, rest, order);
    }
    Ok(())
}

/// Read a bit field, reporting range violations
pub fn checked_get_bits<V: BitValue>(
    src: &[u8],
    bit_offset: usize,
    bit_length: usize,
    order: ByteOrder,
) -> Result<V, BitRangeError> {
    check_bit_range(src.len(), bit_offset, bit_length)?;

    let raw = if is_byte_aligned(bit_offset, bit_length) {
        read_aligned(src, bit_offset / 8, bit_length / 8, order)
    } else if bit_length <= WINDOW_FIELD_BITS {
        read_window(src, bit_offset, bit_length, order)
    } else {
        let rest = bit_length - WINDOW_FIELD_BITS;
        let first = read_window(src, bit_offset, WINDOW_FIELD_BITS, order);
        let second = read_window(src, bit_offset + WINDOW_FIELD_BITS, rest, order);
        match order {
            ByteOrder::LittleEndian => first | (second << WINDOW_FIELD_BITS),
            ByteOrder::BigEndian => (first << rest) | second,
        }
    };
    Ok(V::from_raw(raw))
}

/// Write a bit field
///
/// Panics if `bit_length` is outside 1..=64 or the field runs past `dest`.
pub fn set_bits<V: BitValue>(
    dest: &mut [u8],
    value: V,
    bit_offset: usize,
    bit_length: usize,
    order: ByteOrder,
) {
    if let Err(err) = checked_set_bits(dest, value, bit_offset, bit_length, order) {
        panic!("set_bits: {}", err);
    }
}

/// Read a bit field
///
/// Panics if `bit_length` is outside 1..=64 or the field runs past `src`.
pub fn get_bits<V: BitValue>(src: &[u8], bit_offset: usize, bit_length: usize, order: ByteOrder) -> V {
    match checked_get_bits(src, bit_offset, bit_length, order) {
        Ok(value) => value,
        Err(err) => panic!("get_bits: {}", err),
    }
}

/// Sign-extend the low `bit_length` bits (1..=64) of `raw`
#[inline(always)]
pub fn sign_extend(raw: u64, bit_length: usize) -> i64 {
    let unused = 64 - bit_length;
    ((raw << unused) as i64) >> unused
}

/// Read a two's complement field, sign-extended from `bit_length` bits
pub fn get_bits_signed(src: &[u8], bit_offset: usize, bit_length: usize, order: ByteOrder) -> i64 {
    let raw: u64 = get_bits(src, bit_offset, bit_length, order);
    sign_extend(raw, bit_length)
}

/// Named bit field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub name: &'static str,
    pub start: usize,
    pub length: usize,
}

impl BitField {
    pub const fn new(name: &'static str, start: usize, length: usize) -> Self {
        Self { name, start, length }
    }

    /// Read this field from a frame
    pub fn get<V: BitValue>(&self, frame: &[u8], order: ByteOrder) -> V {
        get_bits(frame, self.start, self.length, order)
    }

    /// Write this field into a frame
    pub fn set<V: BitValue>(&self, frame: &mut [u8], value: V, order: ByteOrder) {
        set_bits(frame, value, self.start, self.length, order);
    }

    pub fn get_signed(&self, frame: &[u8], order: ByteOrder) -> i64 {
        get_bits_signed(frame, self.start, self.length, order)
    }

    /// End bit (exclusive)
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Largest unsigned value the field can hold
    pub fn max_value(&self) -> u64 {
        low_mask(self.length.clamp(1, MAX_FIELD_BITS))
    }
}

/// Sequential frame layout
#[derive(Debug, Clone, Default)]
pub struct FrameFields {
    fields: Vec<BitField>,
    total_bits: usize,
}

impl FrameFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field after the last one
    pub fn add_field(&mut self, name: &'static str, length: usize) -> &mut Self {
        let field = BitField::new(name, self.total_bits, length);
        self.total_bits = field.end();
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&BitField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_all_fields(&self) -> &[BitField] {
        &self.fields
    }

    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    pub fn total_bytes(&self) -> usize {
        (self.total_bits + 7) / 8
    }
}
