#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct System {
    /// Raise the alarm when arming home while the last camera image showed
    /// a cat.
    pub alarm_on_arm_with_cat: bool,
}
