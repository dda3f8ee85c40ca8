#![forbid(unsafe_code)]

use crate::classifier::{Image, ImageClassifier};
use crate::domain::{AlarmStatus, ArmingStatus, Sensor};
use crate::error::Error;
use crate::listener::{ListenerId, Listeners, Notification, Outbox, StatusListener};
use crate::persistence::{StatusRepository, Transaction};
use crate::transition::{self, SensorChange};
use config::Config;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Services {
    pub repo: Box<dyn StatusRepository>,
    pub classifier: Box<dyn ImageClassifier>,
}

impl Services {
    pub fn new(
        repo: impl StatusRepository + 'static,
        classifier: impl ImageClassifier + 'static,
    ) -> Self {
        Self {
            repo: Box::new(repo),
            classifier: Box::new(classifier),
        }
    }
}

/// Arming status, alarm status and sensors read under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub arming: ArmingStatus,
    pub alarm: AlarmStatus,
    pub sensors: Vec<Sensor>,
}

struct State {
    repo: Box<dyn StatusRepository>,
    classifier: Box<dyn ImageClassifier>,
    /// Result of the last successful classification.
    cat_in_view: bool,
}

/// The alarm state machine.
///
/// Each operation reads the stored statuses, applies the transition table
/// and writes the result back while holding a single lock, so no caller sees
/// the arming status of one operation next to the alarm status of another.
/// Writes of a failed operation are rolled back. Notifications are queued
/// before the lock is released, so they reach listeners in commit order, and
/// delivered after it.
pub struct SecurityService {
    confidence_threshold: f32,
    alarm_on_arm_with_cat: bool,
    state: Mutex<State>,
    listeners: Mutex<Listeners>,
    outbox: Outbox,
}

impl SecurityService {
    pub fn new(config: &Config, services: Services) -> Self {
        Self {
            confidence_threshold: config.detection.confidence_threshold,
            alarm_on_arm_with_cat: config.system.alarm_on_arm_with_cat,
            state: Mutex::new(State {
                repo: services.repo,
                classifier: services.classifier,
                cat_in_view: false,
            }),
            listeners: Mutex::new(Listeners::default()),
            outbox: Outbox::default(),
        }
    }

    /// Set `sensor`'s flag to `active`, persist it, and apply the alarm rules
    /// if the stored flag actually flipped. On success `sensor` holds the new
    /// flag.
    pub fn change_sensor_activation_status(
        &self,
        sensor: &mut Sensor,
        active: bool,
    ) -> Result<(), Error> {
        let mut notifications = Vec::new();
        {
            let mut state = self.state.lock();
            let updated = Transaction::run(state.repo.as_mut(), |tx| {
                let repo = tx.repo();
                let stored = repo.sensors()?.into_iter().find(|s| s.id() == sensor.id());
                let was_active = stored.as_ref().map_or(sensor.active(), Sensor::active);
                let arming = repo.arming_status()?;
                let alarm = repo.alarm_status()?;

                let updated = sensor.with_active(active);
                tx.update_sensor(&updated, stored.as_ref())?;

                let Some(change) = SensorChange::between(was_active, active) else {
                    debug!(sensor = updated.name(), active, "sensor flag unchanged");
                    return Ok(updated);
                };
                notifications.push(Notification::SensorsChanged);

                let next = transition::on_sensor_change(arming, alarm, change);
                debug!(
                    sensor = updated.name(),
                    ?change,
                    %arming,
                    from = %alarm,
                    to = %next,
                    "sensor transition"
                );
                if next != alarm {
                    tx.set_alarm_status(next, alarm)?;
                    notifications.push(Notification::AlarmStatus(next));
                }
                Ok(updated)
            })?;
            self.outbox.post(&notifications);
            *sensor = updated;
        }

        self.outbox.deliver(&self.listeners);
        Ok(())
    }

    /// Deactivate `sensor`. Only fires the deactivation rule if the sensor
    /// was active.
    pub fn deactivate_sensor(&self, sensor: &mut Sensor) -> Result<(), Error> {
        self.change_sensor_activation_status(sensor, false)
    }

    /// Classify `image` and apply the camera rules: a cat raises the alarm
    /// when armed, no cat with every sensor inactive clears it. Returns
    /// whether a cat was seen.
    pub fn process_image(&self, image: &Image) -> Result<bool, Error> {
        let mut notifications = Vec::new();
        let contains_cat = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let contains_cat = state
                .classifier
                .image_contains_cat(image, self.confidence_threshold)?;

            Transaction::run(state.repo.as_mut(), |tx| {
                let repo = tx.repo();
                let arming = repo.arming_status()?;
                let alarm = repo.alarm_status()?;
                let any_active = repo.sensors()?.iter().any(Sensor::active);

                if let Some(next) = transition::on_image(arming, contains_cat, any_active) {
                    tx.set_alarm_status(next, alarm)?;
                    if next != alarm {
                        notifications.push(Notification::AlarmStatus(next));
                    }
                }
                Ok(())
            })?;

            state.cat_in_view = contains_cat;
            notifications.push(Notification::CatDetected(contains_cat));
            self.outbox.post(&notifications);
            contains_cat
        };
        debug!(contains_cat, "image processed");

        self.outbox.deliver(&self.listeners);
        Ok(contains_cat)
    }

    /// Persist a new arming status. Disarming clears the alarm; arming resets
    /// every sensor to inactive without running the sensor rules.
    pub fn set_arming_status(&self, status: ArmingStatus) -> Result<(), Error> {
        let mut notifications = Vec::new();
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let cat_in_view = state.cat_in_view;

            Transaction::run(state.repo.as_mut(), |tx| {
                let previous = tx.repo().arming_status()?;
                let alarm = tx.repo().alarm_status()?;

                if status.is_armed() {
                    let sensors = tx.repo().sensors()?;
                    let mut reset = 0usize;
                    for sensor in sensors.iter().filter(|s| s.active()) {
                        tx.update_sensor(&sensor.with_active(false), Some(sensor))?;
                        reset += 1;
                    }
                    if reset > 0 {
                        debug!(reset, "sensors reset on arming");
                        notifications.push(Notification::SensorsChanged);
                    }
                }

                tx.set_arming_status(status, previous)?;
                info!(from = %previous, to = %status, "arming status changed");

                let forced = transition::on_arming(status, cat_in_view, self.alarm_on_arm_with_cat);
                if let Some(next) = forced {
                    tx.set_alarm_status(next, alarm)?;
                    if next != alarm {
                        notifications.push(Notification::AlarmStatus(next));
                    }
                }
                Ok(())
            })?;
            self.outbox.post(&notifications);
        }

        self.outbox.deliver(&self.listeners);
        Ok(())
    }

    pub fn add_sensor(&self, sensor: Sensor) -> Result<(), Error> {
        {
            let mut state = self.state.lock();
            state.repo.add_sensor(sensor)?;
            self.outbox.post(&[Notification::SensorsChanged]);
        }
        self.outbox.deliver(&self.listeners);
        Ok(())
    }

    pub fn remove_sensor(&self, sensor: &Sensor) -> Result<(), Error> {
        {
            let mut state = self.state.lock();
            state.repo.remove_sensor(sensor)?;
            self.outbox.post(&[Notification::SensorsChanged]);
        }
        self.outbox.deliver(&self.listeners);
        Ok(())
    }

    pub fn sensors(&self) -> Result<Vec<Sensor>, Error> {
        self.state.lock().repo.sensors()
    }

    pub fn alarm_status(&self) -> Result<AlarmStatus, Error> {
        self.state.lock().repo.alarm_status()
    }

    pub fn arming_status(&self) -> Result<ArmingStatus, Error> {
        self.state.lock().repo.arming_status()
    }

    pub fn snapshot(&self) -> Result<StatusSnapshot, Error> {
        let state = self.state.lock();
        Ok(StatusSnapshot {
            arming: state.repo.arming_status()?,
            alarm: state.repo.alarm_status()?,
            sensors: state.repo.sensors()?,
        })
    }

    /// Whether the last processed image showed a cat.
    pub fn cat_in_view(&self) -> bool {
        self.state.lock().cat_in_view
    }

    pub fn add_status_listener(&self, listener: Arc<dyn StatusListener>) -> ListenerId {
        self.listeners.lock().add(listener)
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_status_listener(&self, id: ListenerId) -> bool {
        self.listeners.lock().remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}
