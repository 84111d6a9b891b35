//! Frame codec core
//! CRC engine, bit-field access, checksum embedding and error types

pub mod crc;
pub mod checksum;
pub mod bit_utils;
pub mod exceptions;
pub mod format_base;

pub use crc::{Crc, CrcAlgorithm, CrcDigest, CrcTable, CrcWidth};
pub use checksum::{
    embed_crc_at, verify_crc_at, verify_crc_at_checked, CrcPreset, CRC16_IBM_3740, CRC32_MPEG2,
    CRC8_SAE_J1850,
};
pub use bit_utils::{
    checked_get_bits, checked_set_bits, get_bits, get_bits_signed, set_bits, BitField, BitValue,
    ByteOrder, FrameFields,
};
pub use exceptions::{BitRangeError, ChecksumError, FrameError, FrameParseError, FrameResult};
pub use format_base::FrameFormat;
