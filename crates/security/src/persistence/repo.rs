#![forbid(unsafe_code)]

use crate::domain::{AlarmStatus, ArmingStatus, Sensor};
use crate::error::Error;

/// Durable store for sensors and both statuses.
///
/// The service holds the repository behind its own lock, so implementations
/// need no interior synchronization.
pub trait StatusRepository: Send {
    /// All known sensors.
    fn sensors(&self) -> Result<Vec<Sensor>, Error>;
    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), Error>;
    /// Removing a sensor the store does not know is not an error.
    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), Error>;
    /// Store `sensor`, replacing the stored sensor with the same id.
    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), Error>;

    fn arming_status(&self) -> Result<ArmingStatus, Error>;
    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), Error>;

    fn alarm_status(&self) -> Result<AlarmStatus, Error>;
    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), Error>;
}
