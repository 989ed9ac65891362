use serde::{Deserialize, Serialize};

/// Full state tuple sent from the background process to the UI.
///
/// Always carries all three fields; the UI replaces its view wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "remainingTime")]
    pub remaining_seconds: u32,
    #[serde(rename = "isTimerRunning")]
    pub is_running: bool,
    #[serde(rename = "isNear")]
    pub is_near: bool,
}

/// Messages flowing UI → background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiMessage {
    /// New countdown length, already validated (≥ 1).
    DurationChanged(u32),
    /// New alarm volume, already validated (0.0..=1.0).
    VolumeChanged(f32),
    /// Same as a wave from `Idle`; no-op otherwise.
    StartTimer,
    /// Ask the background process to tear down and exit.
    StopService,
}

impl UiMessage {
    /// Setting updates are the messages the UI also persists.
    pub fn is_setting(&self) -> bool {
        matches!(self, Self::DurationChanged(_) | Self::VolumeChanged(_))
    }
}

/// Messages flowing background → UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMessage {
    Snapshot(Snapshot),
}
