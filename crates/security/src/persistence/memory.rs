#![forbid(unsafe_code)]

use crate::domain::{AlarmStatus, ArmingStatus, Sensor, SensorId};
use crate::error::Error;
use crate::persistence::StatusRepository;
use std::collections::HashMap;
use tracing::trace;

/// Process-local repository. Starts disarmed with no alarm and no sensors.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    sensors: HashMap<SensorId, Sensor>,
    arming: ArmingStatus,
    alarm: AlarmStatus,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensors(sensors: impl IntoIterator<Item = Sensor>) -> Self {
        Self {
            sensors: sensors.into_iter().map(|s| (s.id(), s)).collect(),
            ..Self::default()
        }
    }
}

impl StatusRepository for InMemoryRepository {
    /// Sensors ordered by name, ties broken by id.
    fn sensors(&self) -> Result<Vec<Sensor>, Error> {
        let mut sensors: Vec<_> = self.sensors.values().cloned().collect();
        sensors.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        Ok(sensors)
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), Error> {
        trace!(id = %sensor.id(), name = sensor.name(), "adding sensor");
        self.sensors.insert(sensor.id(), sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), Error> {
        if self.sensors.remove(&sensor.id()).is_none() {
            trace!(id = %sensor.id(), "removing unknown sensor");
        }
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), Error> {
        self.sensors.insert(sensor.id(), sensor.clone());
        Ok(())
    }

    fn arming_status(&self) -> Result<ArmingStatus, Error> {
        Ok(self.arming)
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), Error> {
        self.arming = status;
        Ok(())
    }

    fn alarm_status(&self) -> Result<AlarmStatus, Error> {
        Ok(self.alarm)
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), Error> {
        self.alarm = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorType;

    #[test]
    fn sensors_are_listed_by_name() {
        let repo = InMemoryRepository::with_sensors([
            Sensor::new("Window", SensorType::Window),
            Sensor::new("Door", SensorType::Door),
            Sensor::new("Motion", SensorType::Motion),
        ]);

        let names: Vec<_> = repo
            .sensors()
            .unwrap()
            .iter()
            .map(|s| s.name().to_owned())
            .collect();
        assert_eq!(names, ["Door", "Motion", "Window"]);
    }

    #[test]
    fn update_upserts_by_id() {
        let mut repo = InMemoryRepository::new();
        let mut sensor = Sensor::new("Door", SensorType::Door);
        repo.update_sensor(&sensor).unwrap();

        sensor.set_active(true);
        repo.update_sensor(&sensor).unwrap();

        let sensors = repo.sensors().unwrap();
        assert_eq!(sensors.len(), 1);
        assert!(sensors[0].active());
    }

    #[test]
    fn removing_unknown_sensor_is_a_noop() {
        let mut repo = InMemoryRepository::with_sensors([Sensor::new("Door", SensorType::Door)]);
        repo.remove_sensor(&Sensor::new("Ghost", SensorType::Motion))
            .unwrap();
        assert_eq!(repo.sensors().unwrap().len(), 1);
    }
}
