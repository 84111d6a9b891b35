/// VTC Rust Implementation
/// Table-driven CRC, bit-field packing and vehicle telemetry frames

pub mod vtc_common_rs;

// Convenience re-exports
pub mod prelude {
    pub use crate::vtc_common_rs::packet::core::{
        checked_get_bits, checked_set_bits, get_bits, get_bits_signed, set_bits, BitField, ByteOrder, Crc,
        CrcAlgorithm, CrcPreset, FrameError, FrameFormat, FrameResult,
    };
    pub use crate::vtc_common_rs::packet::types::{
        CanFrame, ControlMode, GearState, J1939Id, SignalSpec, VehicleControlFrame, VehicleStateFrame,
    };
    pub use crate::vtc_common_rs::utils::{CodecConfig, ConfigLoader, SpinLock};
}
