#![forbid(unsafe_code)]

mod sensor;
mod status;

pub use sensor::{Sensor, SensorId, SensorType};
pub use status::{AlarmStatus, ArmingStatus};
