#![forbid(unsafe_code)]
#![allow(dead_code)]

use parking_lot::Mutex;
use security::domain::{AlarmStatus, ArmingStatus, Sensor};
use security::{
    Error, Image, ImageClassifier, InMemoryRepository, SecurityService, Services, StatusListener,
    StatusRepository,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Alarm(AlarmStatus),
    Cat(bool),
    Sensors,
}

/// Listener that records every call.
#[derive(Debug, Default)]
pub struct Recorder(Mutex<Vec<Event>>);

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    pub fn alarms(&self) -> Vec<AlarmStatus> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Alarm(status) => Some(*status),
                _ => None,
            })
            .collect()
    }
}

impl StatusListener for Recorder {
    fn alarm_status_changed(&self, status: AlarmStatus) {
        self.0.lock().push(Event::Alarm(status));
    }

    fn cat_detected(&self, detected: bool) {
        self.0.lock().push(Event::Cat(detected));
    }

    fn sensors_changed(&self) {
        self.0.lock().push(Event::Sensors);
    }
}

/// Classifier with a fixed answer that remembers the thresholds it was
/// asked with.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    pub answer: Arc<Mutex<Result<bool, String>>>,
    pub thresholds: Arc<Mutex<Vec<f32>>>,
}

impl FixedClassifier {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Ok(answer))),
            thresholds: Arc::default(),
        }
    }

    pub fn set(&self, answer: Result<bool, String>) {
        *self.answer.lock() = answer;
    }
}

impl ImageClassifier for FixedClassifier {
    fn image_contains_cat(&self, _image: &Image, confidence_threshold: f32) -> Result<bool, Error> {
        self.thresholds.lock().push(confidence_threshold);
        self.answer.lock().clone().map_err(Error::classifier)
    }
}

/// Which repository write should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    UpdateSensor { after: usize },
    SetArming,
    SetAlarm,
}

/// In-memory repository shared with the test, with one-shot injectable
/// write failures and a log of alarm writes.
#[derive(Debug, Clone, Default)]
pub struct SharedRepository {
    pub inner: Arc<Mutex<InMemoryRepository>>,
    pub fail: Arc<Mutex<Option<FailOn>>>,
    pub alarm_writes: Arc<Mutex<Vec<AlarmStatus>>>,
    sensor_updates: Arc<Mutex<usize>>,
}

impl SharedRepository {
    pub fn with_sensors(sensors: impl IntoIterator<Item = Sensor>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryRepository::with_sensors(sensors))),
            ..Self::default()
        }
    }

    pub fn fail_on(&self, fail: FailOn) {
        *self.fail.lock() = Some(fail);
        *self.sensor_updates.lock() = 0;
    }

    pub fn seed(&self, arming: ArmingStatus, alarm: AlarmStatus) {
        let mut inner = self.inner.lock();
        inner.set_arming_status(arming).unwrap();
        inner.set_alarm_status(alarm).unwrap();
    }

    fn failure(&self, what: FailOn) -> Result<(), Error> {
        let mut fail = self.fail.lock();
        if *fail == Some(what) {
            *fail = None;
            Err(Error::repository(format!("injected failure: {what:?}")))
        } else {
            Ok(())
        }
    }
}

impl StatusRepository for SharedRepository {
    fn sensors(&self) -> Result<Vec<Sensor>, Error> {
        self.inner.lock().sensors()
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), Error> {
        self.inner.lock().add_sensor(sensor)
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), Error> {
        self.inner.lock().remove_sensor(sensor)
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), Error> {
        let mut fail = self.fail.lock();
        if let Some(FailOn::UpdateSensor { after }) = *fail {
            let mut count = self.sensor_updates.lock();
            if *count >= after {
                *fail = None;
                return Err(Error::repository("injected failure: update_sensor"));
            }
            *count += 1;
        }
        drop(fail);
        self.inner.lock().update_sensor(sensor)
    }

    fn arming_status(&self) -> Result<ArmingStatus, Error> {
        self.inner.lock().arming_status()
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), Error> {
        self.failure(FailOn::SetArming)?;
        self.inner.lock().set_arming_status(status)
    }

    fn alarm_status(&self) -> Result<AlarmStatus, Error> {
        self.inner.lock().alarm_status()
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), Error> {
        self.failure(FailOn::SetAlarm)?;
        self.alarm_writes.lock().push(status);
        self.inner.lock().set_alarm_status(status)
    }
}

pub struct Harness {
    pub service: SecurityService,
    pub repo: SharedRepository,
    pub classifier: FixedClassifier,
    pub recorder: Arc<Recorder>,
}

impl Harness {
    pub fn new(sensors: impl IntoIterator<Item = Sensor>) -> Self {
        Self::with_config(&config::Config::default(), sensors)
    }

    pub fn empty() -> Self {
        Self::new(Vec::<Sensor>::new())
    }

    pub fn configured(config: &config::Config) -> Self {
        Self::with_config(config, Vec::<Sensor>::new())
    }

    pub fn with_config(config: &config::Config, sensors: impl IntoIterator<Item = Sensor>) -> Self {
        let repo = SharedRepository::with_sensors(sensors);
        let classifier = FixedClassifier::answering(false);
        let service = SecurityService::new(config, Services::new(repo.clone(), classifier.clone()));
        let recorder = Arc::new(Recorder::default());
        service.add_status_listener(recorder.clone());
        Self {
            service,
            repo,
            classifier,
            recorder,
        }
    }

    pub fn seed(&self, arming: ArmingStatus, alarm: AlarmStatus) {
        self.repo.seed(arming, alarm);
    }

    pub fn alarm(&self) -> AlarmStatus {
        self.service.alarm_status().unwrap()
    }

    pub fn stored(&self, sensor: &Sensor) -> Sensor {
        self.service
            .sensors()
            .unwrap()
            .into_iter()
            .find(|s| s == sensor)
            .unwrap()
    }
}
