/// Frame type definitions
pub mod vehicle_control;
pub mod vehicle_state;
pub mod can_signal;

pub use vehicle_control::{ControlMode, GearState, VehicleControlFrame};
pub use vehicle_state::{VehicleStateFrame, Wheel, WheelState};
pub use can_signal::{CanFrame, J1939Id, MessageSpec, SignalSpec};
