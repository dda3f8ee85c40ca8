#![forbid(unsafe_code)]

//! Alarm state machine for a home-security monitor: sensors, an arming mode
//! and a camera cat detector feed a single alarm status.

pub mod classifier;
pub mod domain;
mod error;
pub mod listener;
pub mod persistence;
mod service;
pub mod transition;

pub use classifier::{Image, ImageClassifier, ScriptedClassifier};
pub use error::{BoxError, Error};
pub use listener::{ListenerId, LoggingListener, StatusListener};
pub use persistence::{InMemoryRepository, StatusRepository};
pub use service::{SecurityService, Services, StatusSnapshot};
