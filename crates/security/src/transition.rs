#![forbid(unsafe_code)]

//! Alarm transition table. Every function here is pure; the service feeds
//! them the freshly read state and persists whatever they return.

use crate::domain::{AlarmStatus, ArmingStatus};

/// An observed flip of a sensor's active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChange {
    Activated,
    Deactivated,
}

impl SensorChange {
    /// `None` when the flag did not actually change.
    pub fn between(was_active: bool, now_active: bool) -> Option<Self> {
        match (was_active, now_active) {
            (false, true) => Some(Self::Activated),
            (true, false) => Some(Self::Deactivated),
            (false, false) | (true, true) => None,
        }
    }
}

/// Alarm status after a sensor flip.
pub fn on_sensor_change(
    arming: ArmingStatus,
    alarm: AlarmStatus,
    change: SensorChange,
) -> AlarmStatus {
    use AlarmStatus::*;
    use SensorChange::*;

    if arming == ArmingStatus::Disarmed {
        return alarm;
    }

    match (alarm, change) {
        (NoAlarm, Activated) => PendingAlarm,
        (PendingAlarm, Activated) => Alarm,
        (Alarm, Activated) => Alarm,
        (PendingAlarm, Deactivated) => NoAlarm,
        // A single sensor clearing never downgrades a full alarm.
        (Alarm, Deactivated) => Alarm,
        (NoAlarm, Deactivated) => NoAlarm,
    }
}

/// Alarm status the classifier result asks for, if any.
pub fn on_image(arming: ArmingStatus, contains_cat: bool, any_active: bool) -> Option<AlarmStatus> {
    match (contains_cat, arming.is_armed(), any_active) {
        (true, true, _) => Some(AlarmStatus::Alarm),
        (true, false, _) => None,
        (false, _, false) => Some(AlarmStatus::NoAlarm),
        (false, _, true) => None,
    }
}

/// Alarm status forced by moving to `arming`, if any. `alarm_on_cat` enables
/// the arm-home-with-cat-in-view rule.
pub fn on_arming(arming: ArmingStatus, cat_in_view: bool, alarm_on_cat: bool) -> Option<AlarmStatus> {
    match arming {
        ArmingStatus::Disarmed => Some(AlarmStatus::NoAlarm),
        ArmingStatus::ArmedHome if alarm_on_cat && cat_in_view => Some(AlarmStatus::Alarm),
        ArmingStatus::ArmedHome | ArmingStatus::ArmedAway => None,
    }
}
