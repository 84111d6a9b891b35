use std::str::FromStr;

use crate::vtc_common_rs::packet::core::bit_utils::{BitField, ByteOrder, FrameFields};
use crate::vtc_common_rs::packet::core::checksum::CRC8_SAE_J1850_ENGINE;
use crate::vtc_common_rs::packet::core::exceptions::{FrameParseError, FrameResult};
use crate::vtc_common_rs::packet::core::format_base::FrameFormat;

const LE: ByteOrder = ByteOrder::LittleEndian;

const STEERING_ANGLE: BitField = BitField::new("steering_angle", 0, 32);
const THROTTLE: BitField = BitField::new("throttle", 32, 32);
const BRAKE: BitField = BitField::new("brake", 64, 32);
const GEAR: BitField = BitField::new("gear", 96, 3);
const CONTROL_MODE: BitField = BitField::new("control_mode", 99, 2);
const HANDBRAKE: BitField = BitField::new("handbrake", 101, 1);
const EMERGENCY_STOP: BitField = BitField::new("emergency_stop", 102, 1);
const RESERVED: BitField = BitField::new("reserved", 103, 9);
const SEQUENCE: BitField = BitField::new("sequence", 112, 8);
const CRC: BitField = BitField::new("crc", 120, 8);

/// Transmission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GearState {
    #[default]
    Park = 0,
    Reverse = 1,
    Neutral = 2,
    Drive = 3,
}

impl GearState {
    pub const MAX: u8 = 3;

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GearState::Park),
            1 => Some(GearState::Reverse),
            2 => Some(GearState::Neutral),
            3 => Some(GearState::Drive),
            _ => None,
        }
    }

    /// Decode a raw field value, naming the field on failure
    pub fn decode(field: &str, value: u8) -> FrameResult<Self> {
        Self::from_u8(value)
            .ok_or_else(|| FrameParseError::field_out_of_range(field, value as u64, Self::MAX as u64).into())
    }
}

impl FromStr for GearState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "p" | "park" => Ok(GearState::Park),
            "r" | "reverse" => Ok(GearState::Reverse),
            "n" | "neutral" => Ok(GearState::Neutral),
            "d" | "drive" => Ok(GearState::Drive),
            _ => Err(format!("Invalid gear: {}", s)),
        }
    }
}

/// Who is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ControlMode {
    #[default]
    Manual = 0,
    Autonomous = 1,
    Remote = 2,
}

impl ControlMode {
    pub const MAX: u8 = 2;

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ControlMode::Manual),
            1 => Some(ControlMode::Autonomous),
            2 => Some(ControlMode::Remote),
            _ => None,
        }
    }

    pub fn decode(field: &str, value: u8) -> FrameResult<Self> {
        Self::from_u8(value)
            .ok_or_else(|| FrameParseError::field_out_of_range(field, value as u64, Self::MAX as u64).into())
    }
}

impl FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(ControlMode::Manual),
            "autonomous" | "auto" => Ok(ControlMode::Autonomous),
            "remote" => Ok(ControlMode::Remote),
            _ => Err(format!("Invalid control mode: {}", s)),
        }
    }
}

/// Vehicle control command (16 bytes)
///
/// Layout (little-endian, packed):
/// - bytes 0..12: steering angle, throttle, brake (f32 each)
/// - bits 96..112: control word (gear:3, control mode:2, handbrake:1, emergency stop:1, reserved:9)
/// - byte 14: sequence counter
/// - byte 15: CRC-8/SAE-J1850 over the frame with this byte cleared
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleControlFrame {
    /// Steering angle in radians, positive to the left
    pub steering_angle: f32,
    /// 0.0..=1.0
    pub throttle: f32,
    /// 0.0..=1.0
    pub brake: f32,
    pub gear: GearState,
    pub control_mode: ControlMode,
    pub handbrake: bool,
    pub emergency_stop: bool,
    pub sequence: u8,
}

impl VehicleControlFrame {
    pub fn new(steering_angle: f32, throttle: f32, brake: f32, gear: GearState, control_mode: ControlMode) -> Self {
        Self {
            steering_angle,
            throttle,
            brake,
            gear,
            control_mode,
            ..Default::default()
        }
    }

    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_handbrake(mut self, handbrake: bool) -> Self {
        self.handbrake = handbrake;
        self
    }

    pub fn with_emergency_stop(mut self, emergency_stop: bool) -> Self {
        self.emergency_stop = emergency_stop;
        self
    }

    /// Raw 16-bit control word (bytes 12..14)
    pub fn control_word(&self) -> u16 {
        (self.gear as u16)
            | (self.control_mode as u16) << 3
            | (self.handbrake as u16) << 5
            | (self.emergency_stop as u16) << 6
    }
}

impl FrameFormat for VehicleControlFrame {
    const NAME: &'static str = "VehicleControlFrame";
    const FRAME_SIZE: usize = 16;

    fn layout() -> FrameFields {
        let mut fields = FrameFields::new();
        for field in [
            STEERING_ANGLE, THROTTLE, BRAKE, GEAR, CONTROL_MODE,
            HANDBRAKE, EMERGENCY_STOP, RESERVED, SEQUENCE, CRC,
        ] {
            fields.add_field(field.name, field.length);
        }
        fields
    }

    fn checksum_field() -> BitField {
        CRC
    }

    fn frame_checksum(cleared: &[u8]) -> u64 {
        CRC8_SAE_J1850_ENGINE.checksum(cleared) as u64
    }

    fn write_fields(&self, frame: &mut [u8]) {
        STEERING_ANGLE.set(frame, self.steering_angle, LE);
        THROTTLE.set(frame, self.throttle, LE);
        BRAKE.set(frame, self.brake, LE);
        GEAR.set(frame, self.gear as u8, LE);
        CONTROL_MODE.set(frame, self.control_mode as u8, LE);
        HANDBRAKE.set(frame, self.handbrake, LE);
        EMERGENCY_STOP.set(frame, self.emergency_stop, LE);
        RESERVED.set(frame, 0u16, LE);
        SEQUENCE.set(frame, self.sequence, LE);
    }

    fn read_fields(frame: &[u8]) -> FrameResult<Self> {
        Ok(Self {
            steering_angle: STEERING_ANGLE.get(frame, LE),
            throttle: THROTTLE.get(frame, LE),
            brake: BRAKE.get(frame, LE),
            gear: GearState::decode(GEAR.name, GEAR.get(frame, LE))?,
            control_mode: ControlMode::decode(CONTROL_MODE.name, CONTROL_MODE.get(frame, LE))?,
            handbrake: HANDBRAKE.get(frame, LE),
            emergency_stop: EMERGENCY_STOP.get(frame, LE),
            sequence: SEQUENCE.get(frame, LE),
        })
    }
}
