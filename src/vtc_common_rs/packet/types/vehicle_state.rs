use crate::vtc_common_rs::packet::core::bit_utils::{BitField, ByteOrder, FrameFields};
use crate::vtc_common_rs::packet::core::checksum::CRC16_IBM_3740_ENGINE;
use crate::vtc_common_rs::packet::core::exceptions::FrameResult;
use crate::vtc_common_rs::packet::core::format_base::FrameFormat;
use super::vehicle_control::{ControlMode, GearState};

const LE: ByteOrder = ByteOrder::LittleEndian;

const WHEEL_ANGULAR_VELOCITY: [BitField; 4] = [
    BitField::new("wheel_angular_velocity_fl", 0, 32),
    BitField::new("wheel_angular_velocity_fr", 32, 32),
    BitField::new("wheel_angular_velocity_rl", 64, 32),
    BitField::new("wheel_angular_velocity_rr", 96, 32),
];
const WHEEL_TORQUE: [BitField; 4] = [
    BitField::new("wheel_torque_fl", 128, 32),
    BitField::new("wheel_torque_fr", 160, 32),
    BitField::new("wheel_torque_rl", 192, 32),
    BitField::new("wheel_torque_rr", 224, 32),
];
const STEERING_ANGLE: BitField = BitField::new("steering_angle", 256, 32);
const GEAR: BitField = BitField::new("gear", 288, 8);
const CONTROL_MODE: BitField = BitField::new("control_mode", 296, 8);
const CRC: BitField = BitField::new("crc", 304, 16);

/// Wheel position, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    FrontLeft = 0,
    FrontRight = 1,
    RearLeft = 2,
    RearRight = 3,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [Wheel::FrontLeft, Wheel::FrontRight, Wheel::RearLeft, Wheel::RearRight];
}

/// One wheel's telemetry
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelState {
    /// rad/s
    pub angular_velocity: f32,
    /// N·m
    pub torque: f32,
}

/// Vehicle state telemetry (40 bytes)
///
/// Layout (little-endian, packed):
/// - bytes 0..16: wheel angular velocity [f32; 4] (FL, FR, RL, RR)
/// - bytes 16..32: wheel torque [f32; 4]
/// - bytes 32..36: steering angle f32
/// - byte 36: gear, byte 37: control mode
/// - bytes 38..40: CRC-16/IBM-3740 over the frame with these bytes cleared
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleStateFrame {
    pub wheel_angular_velocity: [f32; 4],
    pub wheel_torque: [f32; 4],
    pub steering_angle: f32,
    pub gear: GearState,
    pub control_mode: ControlMode,
}

impl VehicleStateFrame {
    pub fn wheel(&self, wheel: Wheel) -> WheelState {
        WheelState {
            angular_velocity: self.wheel_angular_velocity[wheel as usize],
            torque: self.wheel_torque[wheel as usize],
        }
    }

    pub fn set_wheel(&mut self, wheel: Wheel, state: WheelState) {
        self.wheel_angular_velocity[wheel as usize] = state.angular_velocity;
        self.wheel_torque[wheel as usize] = state.torque;
    }

    /// Mean wheel speed, rad/s
    pub fn mean_angular_velocity(&self) -> f32 {
        self.wheel_angular_velocity.iter().sum::<f32>() / 4.0
    }
}

fn write_f32_array(frame: &mut [u8], fields: &[BitField; 4], values: &[f32; 4]) {
    for (field, value) in fields.iter().zip(values) {
        field.set(frame, *value, LE);
    }
}

fn read_f32_array(frame: &[u8], fields: &[BitField; 4]) -> [f32; 4] {
    let mut values = [0f32; 4];
    for (field, value) in fields.iter().zip(values.iter_mut()) {
        *value = field.get(frame, LE);
    }
    values
}

impl FrameFormat for VehicleStateFrame {
    const NAME: &'static str = "VehicleStateFrame";
    const FRAME_SIZE: usize = 40;

    fn layout() -> FrameFields {
        let mut fields = FrameFields::new();
        let wheels = WHEEL_ANGULAR_VELOCITY.iter().chain(WHEEL_TORQUE.iter());
        for field in wheels.chain([STEERING_ANGLE, GEAR, CONTROL_MODE, CRC].iter()) {
            fields.add_field(field.name, field.length);
        }
        fields
    }

    fn checksum_field() -> BitField {
        CRC
    }

    fn frame_checksum(cleared: &[u8]) -> u64 {
        CRC16_IBM_3740_ENGINE.checksum(cleared) as u64
    }

    fn write_fields(&self, frame: &mut [u8]) {
        write_f32_array(frame, &WHEEL_ANGULAR_VELOCITY, &self.wheel_angular_velocity);
        write_f32_array(frame, &WHEEL_TORQUE, &self.wheel_torque);
        STEERING_ANGLE.set(frame, self.steering_angle, LE);
        GEAR.set(frame, self.gear as u8, LE);
        CONTROL_MODE.set(frame, self.control_mode as u8, LE);
    }

    fn read_fields(frame: &[u8]) -> FrameResult<Self> {
        Ok(Self {
            wheel_angular_velocity: read_f32_array(frame, &WHEEL_ANGULAR_VELOCITY),
            wheel_torque: read_f32_array(frame, &WHEEL_TORQUE),
            steering_angle: STEERING_ANGLE.get(frame, LE),
            gear: GearState::decode(GEAR.name, GEAR.get(frame, LE))?,
            control_mode: ControlMode::decode(CONTROL_MODE.name, CONTROL_MODE.get(frame, LE))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vtc_common_rs::packet::core::exceptions::{FrameError, FrameParseError};
    use crate::vtc_common_rs::packet::core::format_base::{layout_is_consistent, seal_frame};

    fn sample() -> VehicleStateFrame {
        VehicleStateFrame {
            wheel_angular_velocity: [10.0, 10.5, 9.75, 10.25],
            wheel_torque: [120.0, 118.5, -4.0, 0.0],
            steering_angle: 0.125,
            gear: GearState::Drive,
            control_mode: ControlMode::Remote,
        }
    }

    #[test]
    fn test_layout() {
        assert!(layout_is_consistent::<VehicleStateFrame>());
    }

    #[test]
    fn test_every_layout_field_is_readable() {
        let bytes = sample().to_bytes();
        let layout = VehicleStateFrame::layout();
        assert_eq!(layout.get_all_fields().len(), 12);
        for field in layout.get_all_fields() {
            assert!(field.length <= 64, "{}", field.name);
            let _: u64 = field.get(&bytes, LE);
        }
        let rl: f32 = layout.get_field("wheel_torque_rl").unwrap().get(&bytes, LE);
        assert_eq!(rl, -4.0);
    }

    #[test]
    fn test_field_positions() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[4..8], &10.5f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &(-4.0f32).to_le_bytes());
        assert_eq!(&bytes[32..36], &0.125f32.to_le_bytes());
        assert_eq!(bytes[36], 3);
        assert_eq!(bytes[37], 2);

        let mut cleared = bytes.clone();
        cleared[38] = 0;
        cleared[39] = 0;
        let crc = CRC16_IBM_3740_ENGINE.checksum(&cleared);
        assert_eq!(&bytes[38..40], &crc.to_le_bytes());
        assert_eq!(VehicleStateFrame::stored_checksum(&bytes), crc as u64);
    }

    #[test]
    fn test_round_trip_and_wheels() {
        let frame = sample();
        let decoded = VehicleStateFrame::from_bytes(&frame.to_bytes()).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.wheel(Wheel::RearLeft), WheelState { angular_velocity: 9.75, torque: -4.0 });
        assert_eq!(decoded.mean_angular_velocity(), 10.125);
    }

    #[test]
    fn test_set_wheel() {
        let mut frame = VehicleStateFrame::default();
        frame.set_wheel(Wheel::FrontRight, WheelState { angular_velocity: 3.0, torque: 7.5 });
        assert_eq!(frame.wheel_angular_velocity, [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(frame.wheel_torque, [0.0, 7.5, 0.0, 0.0]);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = sample().to_bytes();
        bytes.extend_from_slice(&[0xEE; 8]);
        assert_eq!(VehicleStateFrame::from_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_invalid_control_mode() {
        let mut bytes = sample().to_bytes();
        bytes[37] = 9;
        seal_frame::<VehicleStateFrame>(&mut bytes);
        assert_eq!(
            VehicleStateFrame::from_bytes(&bytes).unwrap_err(),
            FrameError::Parse(FrameParseError::field_out_of_range("control_mode", 9, 2))
        );
    }
}
