use crate::error::Error;
use config::Config;
use security::domain::{ArmingStatus, Sensor, SensorType};
use security::{
    Image, InMemoryRepository, LoggingListener, ScriptedClassifier, SecurityService, Services,
    StatusSnapshot,
};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info_span};

/// A sensor present before the first step.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SensorDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Arm {
        status: ArmingStatus,
    },
    Activate {
        sensor: String,
    },
    Deactivate {
        sensor: String,
    },
    Set {
        sensor: String,
        active: bool,
    },
    /// A camera frame. `cat` is what the scripted camera reports for it;
    /// `path` optionally supplies the frame bytes.
    Image {
        cat: bool,
        path: Option<PathBuf>,
    },
    AddSensor {
        name: String,
        #[serde(rename = "type")]
        sensor_type: SensorType,
    },
    RemoveSensor {
        sensor: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub sensors: Vec<SensorDecl>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(toml_edit::de::from_str(text)?)
    }

    /// Replay every step against a fresh in-memory service and return the
    /// final state.
    pub fn run(&self, config: &Config) -> Result<StatusSnapshot, Error> {
        let mut runner = Runner::new(config, &self.sensors)?;
        for (index, step) in self.steps.iter().enumerate() {
            let span = info_span!("step", index);
            let _enter = span.enter();
            runner.apply(step)?;
        }
        Ok(runner.service.snapshot()?)
    }
}

struct Runner {
    service: SecurityService,
    camera: ScriptedClassifier,
    sensors: HashMap<String, Sensor>,
}

impl Runner {
    fn new(config: &Config, decls: &[SensorDecl]) -> Result<Self, Error> {
        let mut sensors = HashMap::new();
        for decl in decls {
            let mut sensor = Sensor::new(decl.name.clone(), decl.sensor_type);
            sensor.set_active(decl.active);
            if sensors.insert(decl.name.clone(), sensor).is_some() {
                return Err(Error::DuplicateSensor(decl.name.clone()));
            }
        }

        let camera = ScriptedClassifier::default();
        let repo = InMemoryRepository::with_sensors(sensors.values().cloned());
        let service = SecurityService::new(config, Services::new(repo, camera.clone()));
        service.add_status_listener(Arc::new(LoggingListener));

        Ok(Self {
            service,
            camera,
            sensors,
        })
    }

    fn lookup<'a>(
        sensors: &'a mut HashMap<String, Sensor>,
        name: &str,
    ) -> Result<&'a mut Sensor, Error> {
        sensors
            .get_mut(name)
            .ok_or_else(|| Error::UnknownSensor(name.to_owned()))
    }

    fn apply(&mut self, step: &Step) -> Result<(), Error> {
        debug!(?step, "applying step");
        match step {
            Step::Arm { status } => {
                self.service.set_arming_status(*status)?;
                if status.is_armed() {
                    for sensor in self.sensors.values_mut() {
                        sensor.set_active(false);
                    }
                }
            }
            Step::Activate { sensor } => {
                let sensor = Self::lookup(&mut self.sensors, sensor)?;
                self.service.change_sensor_activation_status(sensor, true)?;
            }
            Step::Set { sensor, active } => {
                let sensor = Self::lookup(&mut self.sensors, sensor)?;
                self.service.change_sensor_activation_status(sensor, *active)?;
            }
            Step::Deactivate { sensor } => {
                let sensor = Self::lookup(&mut self.sensors, sensor)?;
                self.service.deactivate_sensor(sensor)?;
            }
            Step::Image { cat, path } => {
                let image = match path {
                    Some(path) => Image::new(fs::read(path).map_err(|source| Error::Read {
                        path: path.clone(),
                        source,
                    })?),
                    None => Image::default(),
                };
                self.camera.push(*cat);
                self.service.process_image(&image)?;
            }
            Step::AddSensor { name, sensor_type } => {
                if self.sensors.contains_key(name) {
                    return Err(Error::DuplicateSensor(name.clone()));
                }
                let sensor = Sensor::new(name.clone(), *sensor_type);
                self.service.add_sensor(sensor.clone())?;
                self.sensors.insert(name.clone(), sensor);
            }
            Step::RemoveSensor { sensor } => {
                let removed = Self::lookup(&mut self.sensors, sensor)?.clone();
                self.service.remove_sensor(&removed)?;
                self.sensors.remove(sensor);
            }
        }
        Ok(())
    }
}
