/// Error types for frame encoding and decoding
/// Bit-range violations, frame parse failures and checksum failures

use std::fmt;
use std::error::Error;

/// Bit-field range violation
#[derive(Debug, Clone, PartialEq)]
pub enum BitRangeError {
    /// Field length outside 1..=64
    InvalidLength(usize),
    /// Field does not fit in the buffer
    OutOfBounds { bit_offset: usize, bit_length: usize, buffer_bits: usize },
}

impl fmt::Display for BitRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitRangeError::InvalidLength(length) => {
                write!(f, "bit length {} is outside 1..=64", length)
            }
            BitRangeError::OutOfBounds { bit_offset, bit_length, buffer_bits } => {
                write!(
                    f,
                    "bit field {}+{} exceeds buffer of {} bits",
                    bit_offset, bit_length, buffer_bits
                )
            }
        }
    }
}

impl Error for BitRangeError {}

/// Frame parse error
#[derive(Debug, Clone, PartialEq)]
pub enum FrameParseError {
    /// Buffer shorter than the frame
    InsufficientData { required: usize, actual: usize },
    /// Field value outside its domain
    FieldOutOfRange { field: String, value: u64, max: u64 },
    /// Input that is not a frame at all
    UnexpectedFormat(String),
}

impl fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameParseError::InsufficientData { required, actual } => {
                write!(f, "insufficient data: required {} bytes, got {} bytes", required, actual)
            }
            FrameParseError::FieldOutOfRange { field, value, max } => {
                write!(f, "field '{}' out of range: {} (max: {})", field, value, max)
            }
            FrameParseError::UnexpectedFormat(msg) => {
                write!(f, "unexpected format: {}", msg)
            }
        }
    }
}

impl Error for FrameParseError {}

/// Checksum error
#[derive(Debug, Clone, PartialEq)]
pub enum ChecksumError {
    /// Stored and computed checksums differ
    Mismatch { expected: u64, actual: u64 },
    /// Checksum field does not fit in the frame
    FieldOutOfBounds { start_bit: usize, length: usize },
    /// Unknown algorithm name
    UnknownAlgorithm(String),
}

impl fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumError::Mismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected 0x{:X}, got 0x{:X}", expected, actual)
            }
            ChecksumError::FieldOutOfBounds { start_bit, length } => {
                write!(f, "checksum field {}+{} does not fit in the frame", start_bit, length)
            }
            ChecksumError::UnknownAlgorithm(name) => {
                write!(f, "unknown CRC algorithm: {}", name)
            }
        }
    }
}

impl Error for ChecksumError {}

/// Combined error for the frame layer
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Parse(FrameParseError),
    Checksum(ChecksumError),
    BitRange(BitRangeError),
    /// Configuration could not be loaded or is invalid
    Config(String),
    Io(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Parse(err) => write!(f, "frame parse error: {}", err),
            FrameError::Checksum(err) => write!(f, "checksum error: {}", err),
            FrameError::BitRange(err) => write!(f, "bit range error: {}", err),
            FrameError::Config(msg) => write!(f, "config error: {}", msg),
            FrameError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for FrameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FrameError::Parse(err) => Some(err),
            FrameError::Checksum(err) => Some(err),
            FrameError::BitRange(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FrameParseError> for FrameError {
    fn from(err: FrameParseError) -> Self {
        FrameError::Parse(err)
    }
}

impl From<ChecksumError> for FrameError {
    fn from(err: ChecksumError) -> Self {
        FrameError::Checksum(err)
    }
}

impl From<BitRangeError> for FrameError {
    fn from(err: BitRangeError) -> Self {
        FrameError::BitRange(err)
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Io(err.to_string())
    }
}

pub type FrameResult<T> = Result<T, FrameError>;

impl FrameParseError {
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        FrameParseError::InsufficientData { required, actual }
    }

    pub fn field_out_of_range(field: &str, value: u64, max: u64) -> Self {
        FrameParseError::FieldOutOfRange {
            field: field.to_string(),
            value,
            max,
        }
    }
}

impl ChecksumError {
    pub fn mismatch(expected: u64, actual: u64) -> Self {
        ChecksumError::Mismatch { expected, actual }
    }
}
