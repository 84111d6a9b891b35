use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vtc_rust::vtc_common_rs::packet::types::{ControlMode, GearState, VehicleControlFrame, VehicleStateFrame};

/// Deterministic test data for frame and bit-field tests
pub struct TestDataGenerator {
    rng: StdRng,
}

impl TestDataGenerator {
    pub fn new() -> Self {
        Self::with_seed(0x5EED_F00D)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.rng.gen()).collect()
    }

    pub fn value(&mut self) -> u64 {
        self.rng.gen()
    }

    pub fn index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    pub fn gear(&mut self) -> GearState {
        GearState::from_u8(self.rng.gen_range(0..=GearState::MAX)).unwrap_or_default()
    }

    pub fn control_mode(&mut self) -> ControlMode {
        ControlMode::from_u8(self.rng.gen_range(0..=ControlMode::MAX)).unwrap_or_default()
    }

    pub fn control_frame(&mut self) -> VehicleControlFrame {
        let frame = VehicleControlFrame::new(
            self.rng.gen_range(-0.6..=0.6),
            self.rng.gen_range(0.0..=1.0),
            self.rng.gen_range(0.0..=1.0),
            self.gear(),
            self.control_mode(),
        );
        frame
            .with_handbrake(self.rng.gen())
            .with_emergency_stop(self.rng.gen())
            .with_sequence(self.rng.gen())
    }

    pub fn state_frame(&mut self) -> VehicleStateFrame {
        let mut frame = VehicleStateFrame {
            steering_angle: self.rng.gen_range(-0.6..=0.6),
            gear: self.gear(),
            control_mode: self.control_mode(),
            ..Default::default()
        };
        for i in 0..4 {
            frame.wheel_angular_velocity[i] = self.rng.gen_range(-50.0..=150.0);
            frame.wheel_torque[i] = self.rng.gen_range(-400.0..=400.0);
        }
        frame
    }
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
