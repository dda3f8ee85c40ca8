use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml_edit::de::Error),

    #[error("Security service failed: {0}")]
    Security(#[from] security::Error),

    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),

    #[error("Sensor declared twice: {0}")]
    DuplicateSensor(String),
}
