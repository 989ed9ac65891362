use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::StoredSettings;

pub const DEFAULT_DURATION_SECONDS: u32 = 60;
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Timer parameters owned by the background controller.
///
/// Only ever mutated through validated setting updates; persisting them is
/// the UI side's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub duration_seconds: u32,
    pub volume: f32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_DURATION_SECONDS,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl TimerConfig {
    /// Build from whatever the settings store had. Absent or invalid fields
    /// fall back to the defaults.
    pub fn from_stored(stored: &StoredSettings) -> Self {
        let defaults = Self::default();
        Self {
            duration_seconds: stored
                .duration_seconds
                .and_then(|d| Self::validate_duration(i64::from(d)).ok())
                .unwrap_or(defaults.duration_seconds),
            volume: stored
                .volume
                .and_then(|v| Self::validate_volume(f64::from(v)).ok())
                .unwrap_or(defaults.volume),
        }
    }

    /// Accepts any whole number of seconds that is at least 1.
    pub fn validate_duration(seconds: i64) -> Result<u32, ValidationError> {
        if seconds < 1 {
            return Err(ValidationError::Duration(seconds));
        }
        u32::try_from(seconds).map_err(|_| ValidationError::Duration(seconds))
    }

    pub fn validate_volume(volume: f64) -> Result<f32, ValidationError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::Volume(volume));
        }
        Ok(volume as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_store_is_empty() {
        let cfg = TimerConfig::from_stored(&StoredSettings::default());
        assert_eq!(cfg.duration_seconds, 60);
        assert!((cfg.volume - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_stored_fields_fall_back_individually() {
        let stored = StoredSettings {
            duration_seconds: Some(0),
            volume: Some(0.25),
            ..Default::default()
        };
        let cfg = TimerConfig::from_stored(&stored);
        assert_eq!(cfg.duration_seconds, 60);
        assert!((cfg.volume - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn duration_bounds() {
        assert!(TimerConfig::validate_duration(0).is_err());
        assert!(TimerConfig::validate_duration(-5).is_err());
        assert_eq!(TimerConfig::validate_duration(1).unwrap(), 1);
        assert!(TimerConfig::validate_duration(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn volume_bounds() {
        assert!(TimerConfig::validate_volume(-0.1).is_err());
        assert!(TimerConfig::validate_volume(1.01).is_err());
        assert!(TimerConfig::validate_volume(f64::NAN).is_err());
        assert_eq!(TimerConfig::validate_volume(1.0).unwrap(), 1.0);
    }
}
