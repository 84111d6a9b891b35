//! Vehicle telemetry codec: frames, CRC and bit-field tooling

pub mod packet;
pub mod utils;
