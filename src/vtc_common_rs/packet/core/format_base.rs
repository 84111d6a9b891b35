/// Fixed-layout frame format base
/// Encoding fills the fields and then seals the checksum; decoding checks
/// the length, verifies the checksum and then reads the fields.

use log::debug;

use super::bit_utils::{BitField, ByteOrder, FrameFields, MAX_FIELD_BITS};
use super::checksum::{embed_checksum_at, verify_checksum_at_checked};
use super::exceptions::{FrameParseError, FrameResult};

/// Base trait for fixed-size, 1-byte packed frames
pub trait FrameFormat: Sized {
    /// Frame name, used in logs
    const NAME: &'static str;

    /// Frame size in bytes
    const FRAME_SIZE: usize;

    /// Byte order of every field, the checksum included
    const BYTE_ORDER: ByteOrder = ByteOrder::LittleEndian;

    /// Field layout, checksum field included
    fn layout() -> FrameFields;

    /// Position of the checksum field
    fn checksum_field() -> BitField;

    /// Checksum over the frame with the checksum field cleared
    fn frame_checksum(cleared: &[u8]) -> u64;

    /// Write every field except the checksum
    fn write_fields(&self, frame: &mut [u8]);

    /// Read every field except the checksum
    fn read_fields(frame: &[u8]) -> FrameResult<Self>;

    /// Encode and seal the frame
    fn to_bytes(&self) -> Vec<u8> {
        let mut frame = vec![0u8; Self::FRAME_SIZE];
        self.write_fields(&mut frame);
        seal_frame::<Self>(&mut frame);
        frame
    }

    /// Decode a frame, verifying its checksum
    fn from_bytes(data: &[u8]) -> FrameResult<Self> {
        Self::from_bytes_with(data, true)
    }

    /// Decode a frame, optionally skipping checksum verification
    fn from_bytes_with(data: &[u8], verify: bool) -> FrameResult<Self> {
        if data.len() < Self::FRAME_SIZE {
            return Err(FrameParseError::insufficient_data(Self::FRAME_SIZE, data.len()).into());
        }
        let frame = &data[..Self::FRAME_SIZE];
        if verify {
            verify_frame::<Self>(frame)?;
        }
        let decoded = Self::read_fields(frame)?;
        debug!("decoded {} ({} bytes, verify={})", Self::NAME, Self::FRAME_SIZE, verify);
        Ok(decoded)
    }

    /// Checksum stored in an encoded frame
    fn stored_checksum(frame: &[u8]) -> u64 {
        Self::checksum_field().get(frame, Self::BYTE_ORDER)
    }
}

/// Fill the checksum field of an encoded frame
pub fn seal_frame<F: FrameFormat>(frame: &mut [u8]) {
    let field = F::checksum_field();
    // layout constants guarantee the field fits FRAME_SIZE
    if let Err(err) = embed_checksum_at(frame, field.start, field.length, F::BYTE_ORDER, F::frame_checksum) {
        panic!("{} checksum field outside frame: {}", F::NAME, err);
    }
}

/// Verify the checksum field of an encoded frame
pub fn verify_frame<F: FrameFormat>(frame: &[u8]) -> FrameResult<()> {
    let field = F::checksum_field();
    verify_checksum_at_checked(frame, field.start, field.length, F::BYTE_ORDER, F::frame_checksum)?;
    Ok(())
}

/// Check that a layout is contiguous, fills the frame exactly and keeps every
/// field within the 64-bit access limit
pub fn layout_is_consistent<F: FrameFormat>() -> bool {
    let layout = F::layout();
    let mut expected_start = 0;
    for field in layout.get_all_fields() {
        if field.start != expected_start || field.length == 0 || field.length > MAX_FIELD_BITS {
            return false;
        }
        expected_start = field.end();
    }
    let checksum = F::checksum_field();
    layout.total_bits() == F::FRAME_SIZE * 8
        && layout.get_field(checksum.name) == Some(&checksum)
}
