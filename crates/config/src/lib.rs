#![forbid(unsafe_code)]

mod detection;
mod error;
mod system;

pub use detection::Detection;
pub use error::Error;
pub use system::System;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables with this prefix override file values. Sections are
/// separated by `__`, e.g. `CATPOINT_DETECTION__CONFIDENCE_THRESHOLD=80`.
pub const ENV_PREFIX: &str = "CATPOINT_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub detection: Detection,
    pub system: System,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file at `path`, layered over the defaults and under
    /// the `CATPOINT_` environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config.normalize())
    }

    fn normalize(mut self) -> Self {
        self.detection = self.detection.clamp();
        self
    }
}
