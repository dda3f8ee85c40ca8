#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Detection {
    /// Minimum classifier confidence (percent, clamped to 0..=100) for an
    /// image to count as containing a cat.
    pub confidence_threshold: f32,
}

impl Default for Detection {
    fn default() -> Self {
        Self {
            confidence_threshold: 50.0,
        }
    }
}

impl Detection {
    pub fn clamp(self) -> Self {
        let confidence_threshold = if self.confidence_threshold.is_nan() {
            Self::default().confidence_threshold
        } else {
            self.confidence_threshold.clamp(0.0, 100.0)
        };
        Self {
            confidence_threshold,
        }
    }
}
