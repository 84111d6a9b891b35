/// CRC catalogue and frame checksum embedding
/// Named non-reflected CRC presets, plus computing, embedding and verifying
/// a checksum stored at a fixed bit position inside a frame.

use bitvec::prelude::*;
use log::warn;
use once_cell::sync::Lazy;

use super::bit_utils::{checked_get_bits, checked_set_bits, check_bit_range, low_mask, ByteOrder};
use super::crc::{Crc, CrcAlgorithm, CrcWidth};
use super::exceptions::ChecksumError;

pub const CRC8_SMBUS: CrcAlgorithm<u8> = CrcAlgorithm {
    name: "CRC-8/SMBUS",
    poly: 0x07,
    init: 0x00,
    xor_out: 0x00,
    check: 0xF4,
};

pub const CRC8_SAE_J1850: CrcAlgorithm<u8> = CrcAlgorithm {
    name: "CRC-8/SAE-J1850",
    poly: 0x1D,
    init: 0xFF,
    xor_out: 0xFF,
    check: 0x4B,
};

pub const CRC8_AUTOSAR: CrcAlgorithm<u8> = CrcAlgorithm {
    name: "CRC-8/AUTOSAR",
    poly: 0x2F,
    init: 0xFF,
    xor_out: 0xFF,
    check: 0xDF,
};

pub const CRC16_XMODEM: CrcAlgorithm<u16> = CrcAlgorithm {
    name: "CRC-16/XMODEM",
    poly: 0x1021,
    init: 0x0000,
    xor_out: 0x0000,
    check: 0x31C3,
};

/// Also known as CRC-16/CCITT-FALSE
pub const CRC16_IBM_3740: CrcAlgorithm<u16> = CrcAlgorithm {
    name: "CRC-16/IBM-3740",
    poly: 0x1021,
    init: 0xFFFF,
    xor_out: 0x0000,
    check: 0x29B1,
};

pub const CRC16_UMTS: CrcAlgorithm<u16> = CrcAlgorithm {
    name: "CRC-16/UMTS",
    poly: 0x8005,
    init: 0x0000,
    xor_out: 0x0000,
    check: 0xFEE8,
};

pub const CRC32_MPEG2: CrcAlgorithm<u32> = CrcAlgorithm {
    name: "CRC-32/MPEG-2",
    poly: 0x04C1_1DB7,
    init: 0xFFFF_FFFF,
    xor_out: 0x0000_0000,
    check: 0x0376_E6E7,
};

pub const CRC32_BZIP2: CrcAlgorithm<u32> = CrcAlgorithm {
    name: "CRC-32/BZIP2",
    poly: 0x04C1_1DB7,
    init: 0xFFFF_FFFF,
    xor_out: 0xFFFF_FFFF,
    check: 0xFC89_1918,
};

pub const CRC32_CKSUM: CrcAlgorithm<u32> = CrcAlgorithm {
    name: "CRC-32/CKSUM",
    poly: 0x04C1_1DB7,
    init: 0x0000_0000,
    xor_out: 0xFFFF_FFFF,
    check: 0x765E_7680,
};

pub const CRC64_ECMA_182: CrcAlgorithm<u64> = CrcAlgorithm {
    name: "CRC-64/ECMA-182",
    poly: 0x42F0_E1EB_A9EA_3693,
    init: 0x0000_0000_0000_0000,
    xor_out: 0x0000_0000_0000_0000,
    check: 0x6C40_DF5F_0B49_7347,
};

pub const CRC64_WE: CrcAlgorithm<u64> = CrcAlgorithm {
    name: "CRC-64/WE",
    poly: 0x42F0_E1EB_A9EA_3693,
    init: 0xFFFF_FFFF_FFFF_FFFF,
    xor_out: 0xFFFF_FFFF_FFFF_FFFF,
    check: 0x62EC_59E3_F1A4_F00A,
};

/// Control frame checksum engine
pub static CRC8_SAE_J1850_ENGINE: Lazy<Crc<u8>> = Lazy::new(|| Crc::from_algorithm(&CRC8_SAE_J1850));

/// State frame checksum engine
pub static CRC16_IBM_3740_ENGINE: Lazy<Crc<u16>> = Lazy::new(|| Crc::from_algorithm(&CRC16_IBM_3740));

/// Preset chosen at runtime (config file, CLI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcPreset {
    Crc8(CrcAlgorithm<u8>),
    Crc16(CrcAlgorithm<u16>),
    Crc32(CrcAlgorithm<u32>),
    Crc64(CrcAlgorithm<u64>),
}

impl CrcPreset {
    pub fn all() -> Vec<CrcPreset> {
        vec![
            CrcPreset::Crc8(CRC8_SMBUS),
            CrcPreset::Crc8(CRC8_SAE_J1850),
            CrcPreset::Crc8(CRC8_AUTOSAR),
            CrcPreset::Crc16(CRC16_XMODEM),
            CrcPreset::Crc16(CRC16_IBM_3740),
            CrcPreset::Crc16(CRC16_UMTS),
            CrcPreset::Crc32(CRC32_MPEG2),
            CrcPreset::Crc32(CRC32_BZIP2),
            CrcPreset::Crc32(CRC32_CKSUM),
            CrcPreset::Crc64(CRC64_ECMA_182),
            CrcPreset::Crc64(CRC64_WE),
        ]
    }

    /// Look up a preset by catalogue name or common alias (case-insensitive)
    pub fn by_name(name: &str) -> Result<CrcPreset, ChecksumError> {
        let wanted = normalize_name(name);
        let wanted = match wanted.as_str() {
            "crc8" => "crc8smbus".to_string(),
            "crc16ccittfalse" => "crc16ibm3740".to_string(),
            "crc32posix" => "crc32cksum".to_string(),
            "crc64" => "crc64ecma182".to_string(),
            _ => wanted,
        };
        Self::all()
            .into_iter()
            .find(|preset| normalize_name(preset.name()) == wanted)
            .ok_or_else(|| ChecksumError::UnknownAlgorithm(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            CrcPreset::Crc8(alg) => alg.name,
            CrcPreset::Crc16(alg) => alg.name,
            CrcPreset::Crc32(alg) => alg.name,
            CrcPreset::Crc64(alg) => alg.name,
        }
    }

    /// Register width in bits
    pub fn width(&self) -> usize {
        match self {
            CrcPreset::Crc8(_) => 8,
            CrcPreset::Crc16(_) => 16,
            CrcPreset::Crc32(_) => 32,
            CrcPreset::Crc64(_) => 64,
        }
    }

    pub fn check(&self) -> u64 {
        match self {
            CrcPreset::Crc8(alg) => alg.check as u64,
            CrcPreset::Crc16(alg) => alg.check as u64,
            CrcPreset::Crc32(alg) => alg.check as u64,
            CrcPreset::Crc64(alg) => alg.check,
        }
    }

    /// Checksum widened to u64
    pub fn checksum(&self, data: &[u8]) -> u64 {
        match self {
            CrcPreset::Crc8(alg) => Crc::from_algorithm(alg).checksum(data) as u64,
            CrcPreset::Crc16(alg) => Crc::from_algorithm(alg).checksum(data) as u64,
            CrcPreset::Crc32(alg) => Crc::from_algorithm(alg).checksum(data) as u64,
            CrcPreset::Crc64(alg) => Crc::from_algorithm(alg).checksum(data),
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Copy of `frame` with the checksum field cleared
///
/// Lsb0 / Msb0 bit numbering matches ByteOrder::LittleEndian / BigEndian.
fn without_checksum_field(frame: &[u8], start_bit: usize, length: usize, order: ByteOrder) -> Vec<u8> {
    let mut tmp = frame.to_vec();
    let range = start_bit..start_bit + length;
    match order {
        ByteOrder::LittleEndian => BitSlice::<u8, Lsb0>::from_slice_mut(&mut tmp)[range].fill(false),
        ByteOrder::BigEndian => BitSlice::<u8, Msb0>::from_slice_mut(&mut tmp)[range].fill(false),
    }
    tmp
}

fn field_check(frame: &[u8], start_bit: usize, length: usize) -> Result<(), ChecksumError> {
    check_bit_range(frame.len(), start_bit, length)
        .map_err(|_| ChecksumError::FieldOutOfBounds { start_bit, length })
}

/// Compute a frame checksum and store it in the frame
///
/// Args:
///     frame: frame bytes, checksum field content is ignored
///     start_bit: first bit of the checksum field
///     length: checksum field width in bits (<= 64)
///     order: byte order of the stored checksum
///     checksum_fn: checksum over the frame with the field cleared
///
/// Returns:
///     the stored checksum (masked to `length` bits)
pub fn embed_checksum_at<F>(
    frame: &mut [u8],
    start_bit: usize,
    length: usize,
    order: ByteOrder,
    checksum_fn: F,
) -> Result<u64, ChecksumError>
where
    F: Fn(&[u8]) -> u64,
{
    field_check(frame, start_bit, length)?;
    let cleared = without_checksum_field(frame, start_bit, length, order);
    let checksum = checksum_fn(&cleared) & low_mask(length);
    checked_set_bits(frame, checksum, start_bit, length, order)
        .map_err(|_| ChecksumError::FieldOutOfBounds { start_bit, length })?;
    Ok(checksum)
}

/// Recompute a frame checksum and compare it with the stored one
pub fn verify_checksum_at_checked<F>(
    frame: &[u8],
    start_bit: usize,
    length: usize,
    order: ByteOrder,
    checksum_fn: F,
) -> Result<(), ChecksumError>
where
    F: Fn(&[u8]) -> u64,
{
    field_check(frame, start_bit, length)?;
    let stored: u64 = checked_get_bits(frame, start_bit, length, order)
        .map_err(|_| ChecksumError::FieldOutOfBounds { start_bit, length })?;
    let cleared = without_checksum_field(frame, start_bit, length, order);
    let computed = checksum_fn(&cleared) & low_mask(length);

    if computed == stored {
        Ok(())
    } else {
        warn!(
            "checksum mismatch at bit {}: stored 0x{:X}, computed 0x{:X}",
            start_bit, stored, computed
        );
        Err(ChecksumError::mismatch(computed, stored))
    }
}

/// Embed the checksum of `crc` at `(start_bit, length)`
pub fn embed_crc_at<T: CrcWidth>(
    frame: &mut [u8],
    crc: &Crc<T>,
    start_bit: usize,
    length: usize,
    order: ByteOrder,
) -> Result<u64, ChecksumError> {
    embed_checksum_at(frame, start_bit, length, order, |data| crc.checksum(data).to_u64_lossy())
}

pub fn verify_crc_at_checked<T: CrcWidth>(
    frame: &[u8],
    crc: &Crc<T>,
    start_bit: usize,
    length: usize,
    order: ByteOrder,
) -> Result<(), ChecksumError> {
    verify_checksum_at_checked(frame, start_bit, length, order, |data| crc.checksum(data).to_u64_lossy())
}

pub fn verify_crc_at<T: CrcWidth>(
    frame: &[u8],
    crc: &Crc<T>,
    start_bit: usize,
    length: usize,
    order: ByteOrder,
) -> bool {
    verify_crc_at_checked(frame, crc, start_bit, length, order).is_ok()
}
