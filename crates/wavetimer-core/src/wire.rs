//! JSON-lines wire format between the UI and background processes.
//!
//! Background → UI lines are snapshots:
//! `{"remainingTime":42,"isTimerRunning":true,"isNear":false}`.
//!
//! UI → background lines carry one setting or one lifecycle action:
//! `{"durationSeconds":90}`, `{"volume":0.5}`, `{"action":"startTimer"}`,
//! `{"action":"stopService"}`.
//!
//! Decoding is lenient in both directions. An incomplete snapshot is dropped
//! whole; a UI line is read key by key and anything unrecognised is skipped.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::WireError;
use crate::events::{Snapshot, UiMessage};
use crate::timer::TimerConfig;

pub const KEY_DURATION: &str = "durationSeconds";
pub const KEY_VOLUME: &str = "volume";
pub const KEY_ACTION: &str = "action";
pub const ACTION_START_TIMER: &str = "startTimer";
pub const ACTION_STOP_SERVICE: &str = "stopService";

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, WireError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Decode one snapshot line. Unknown extra fields are ignored; a missing or
/// wrong-typed field rejects the line.
pub fn decode_snapshot(line: &str) -> Result<Snapshot, WireError> {
    let value: Value =
        serde_json::from_str(line.trim()).map_err(|e| WireError::Malformed(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| WireError::Malformed("expected a JSON object".into()))?;
    let remaining = obj
        .get("remainingTime")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(WireError::MissingField("remainingTime"))?;
    let running = obj
        .get("isTimerRunning")
        .and_then(Value::as_bool)
        .ok_or(WireError::MissingField("isTimerRunning"))?;
    let near = obj
        .get("isNear")
        .and_then(Value::as_bool)
        .ok_or(WireError::MissingField("isNear"))?;
    Ok(Snapshot {
        remaining_seconds: remaining,
        is_running: running,
        is_near: near,
    })
}

pub fn encode_ui_message(message: &UiMessage) -> Result<String, WireError> {
    let mut obj = Map::new();
    match *message {
        UiMessage::DurationChanged(secs) => {
            obj.insert(KEY_DURATION.into(), Value::from(secs));
        }
        UiMessage::VolumeChanged(volume) => {
            obj.insert(KEY_VOLUME.into(), Value::from(f64::from(volume)));
        }
        UiMessage::StartTimer => {
            obj.insert(KEY_ACTION.into(), Value::from(ACTION_START_TIMER));
        }
        UiMessage::StopService => {
            obj.insert(KEY_ACTION.into(), Value::from(ACTION_STOP_SERVICE));
        }
    }
    Ok(serde_json::to_string(&Value::Object(obj))?)
}

/// Decode one UI line into every message it validly carries.
///
/// Setting updates come before a lifecycle action from the same line so a
/// stop never swallows a setting sent alongside it.
pub fn decode_ui_messages(line: &str) -> Vec<UiMessage> {
    let obj = match serde_json::from_str::<Value>(line.trim()) {
        Ok(Value::Object(obj)) => obj,
        Ok(other) => {
            debug!(?other, "ignoring non-object ui message");
            return Vec::new();
        }
        Err(e) => {
            debug!(error = %e, "ignoring malformed ui message");
            return Vec::new();
        }
    };

    let mut settings = Vec::new();
    let mut actions = Vec::new();
    for (key, value) in &obj {
        match key.as_str() {
            KEY_DURATION => match value.as_i64().map(TimerConfig::validate_duration) {
                Some(Ok(secs)) => settings.push(UiMessage::DurationChanged(secs)),
                Some(Err(e)) => debug!(error = %e, "ignoring duration update"),
                None => debug!(%value, "ignoring non-integer duration"),
            },
            KEY_VOLUME => match value.as_f64().map(TimerConfig::validate_volume) {
                Some(Ok(volume)) => settings.push(UiMessage::VolumeChanged(volume)),
                Some(Err(e)) => debug!(error = %e, "ignoring volume update"),
                None => debug!(%value, "ignoring non-numeric volume"),
            },
            KEY_ACTION => match value.as_str() {
                Some(ACTION_START_TIMER) => actions.push(UiMessage::StartTimer),
                Some(ACTION_STOP_SERVICE) => actions.push(UiMessage::StopService),
                _ => debug!(%value, "ignoring unknown action"),
            },
            other => debug!(key = other, "ignoring unknown ui message key"),
        }
    }
    settings.extend(actions);
    settings
}
