#![forbid(unsafe_code)]

use crate::domain::{AlarmStatus, ArmingStatus, Sensor};
use crate::error::Error;
use crate::persistence::StatusRepository;
use tracing::{debug, warn};

enum Undo {
    Sensor(Sensor),
    Forget(Sensor),
    Arming(ArmingStatus),
    Alarm(AlarmStatus),
}

/// Write journal over a repository. Every write records how to revert it;
/// `rollback` replays those reverts newest-first so a failed operation
/// leaves the repository as it found it.
pub(crate) struct Transaction<'a> {
    repo: &'a mut dyn StatusRepository,
    undo: Vec<Undo>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(repo: &'a mut dyn StatusRepository) -> Self {
        Self {
            repo,
            undo: Vec::new(),
        }
    }

    pub(crate) fn repo(&self) -> &dyn StatusRepository {
        &*self.repo
    }

    /// Write `sensor`. `previous` is the stored version, if any.
    pub(crate) fn update_sensor(
        &mut self,
        sensor: &Sensor,
        previous: Option<&Sensor>,
    ) -> Result<(), Error> {
        self.repo.update_sensor(sensor)?;
        self.undo.push(match previous {
            Some(previous) => Undo::Sensor(previous.clone()),
            None => Undo::Forget(sensor.clone()),
        });
        Ok(())
    }

    pub(crate) fn set_arming_status(
        &mut self,
        status: ArmingStatus,
        previous: ArmingStatus,
    ) -> Result<(), Error> {
        self.repo.set_arming_status(status)?;
        self.undo.push(Undo::Arming(previous));
        Ok(())
    }

    pub(crate) fn set_alarm_status(
        &mut self,
        status: AlarmStatus,
        previous: AlarmStatus,
    ) -> Result<(), Error> {
        self.repo.set_alarm_status(status)?;
        self.undo.push(Undo::Alarm(previous));
        Ok(())
    }

    pub(crate) fn commit(self) {
        debug!(writes = self.undo.len(), "transaction committed");
    }

    /// Revert every write made so far. A revert that fails is logged and
    /// the remaining reverts still run.
    pub(crate) fn rollback(self) {
        let Self { repo, undo } = self;
        debug!(writes = undo.len(), "rolling back transaction");
        for step in undo.into_iter().rev() {
            let result = match &step {
                Undo::Sensor(sensor) => repo.update_sensor(sensor),
                Undo::Forget(sensor) => repo.remove_sensor(sensor),
                Undo::Arming(status) => repo.set_arming_status(*status),
                Undo::Alarm(status) => repo.set_alarm_status(*status),
            };
            if let Err(err) = result {
                warn!(error = %err, "failed to revert repository write");
            }
        }
    }

    /// Run `f` inside a transaction, committing on success and rolling
    /// back on error.
    pub(crate) fn run<T>(
        repo: &'a mut dyn StatusRepository,
        f: impl FnOnce(&mut Transaction<'a>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut tx = Self::begin(repo);
        match f(&mut tx) {
            Ok(value) => {
                tx.commit();
                Ok(value)
            }
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorType;
    use crate::persistence::InMemoryRepository;

    #[test]
    fn rollback_restores_every_write() {
        let door = Sensor::new("Door", SensorType::Door);
        let mut repo = InMemoryRepository::with_sensors([door.clone()]);
        let window = Sensor::new("Window", SensorType::Window);

        let mut tx = Transaction::begin(&mut repo);
        tx.update_sensor(&door.with_active(true), Some(&door))
            .unwrap();
        tx.update_sensor(&window, None).unwrap();
        tx.set_arming_status(ArmingStatus::ArmedAway, ArmingStatus::Disarmed)
            .unwrap();
        tx.set_alarm_status(AlarmStatus::Alarm, AlarmStatus::NoAlarm)
            .unwrap();
        tx.rollback();

        let sensors = repo.sensors().unwrap();
        assert_eq!(sensors.len(), 1);
        assert!(!sensors[0].active());
        assert_eq!(repo.arming_status().unwrap(), ArmingStatus::Disarmed);
        assert_eq!(repo.alarm_status().unwrap(), AlarmStatus::NoAlarm);
    }

    #[test]
    fn run_commits_on_success() {
        let mut repo = InMemoryRepository::new();
        Transaction::run(&mut repo, |tx| {
            tx.set_alarm_status(AlarmStatus::PendingAlarm, AlarmStatus::NoAlarm)
        })
        .unwrap();
        assert_eq!(repo.alarm_status().unwrap(), AlarmStatus::PendingAlarm);
    }

    #[test]
    fn run_rolls_back_on_error() {
        let mut repo = InMemoryRepository::new();
        let err = Transaction::run(&mut repo, |tx| {
            tx.set_alarm_status(AlarmStatus::Alarm, AlarmStatus::NoAlarm)?;
            Err::<(), _>(Error::repository("disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, Error::Repository(_)));
        assert_eq!(repo.alarm_status().unwrap(), AlarmStatus::NoAlarm);
    }
}
