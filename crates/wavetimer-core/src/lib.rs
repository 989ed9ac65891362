//! # wavetimer Core Library
//!
//! Business logic for a hands-free interval timer: a wave over a proximity
//! sensor starts or restarts a countdown and an alarm sounds at zero.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: a tick-driven state machine. It owns no timers; the
//!   background controller feeds it ticks.
//! - **Proximity Debouncer**: turns raw near/far readings into wave triggers.
//! - **Background Controller**: a single serialized event loop that owns the
//!   tick source, the post-alarm cooldown, the sensor subscription and the
//!   channel to the UI process.
//! - **Channel / Wire**: a best-effort duplex message pipe, either in-process
//!   or over a JSON-lines byte stream between two processes.
//! - **Storage**: TOML app configuration and the per-user settings store.
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: countdown state machine
//! - [`ProximityDebouncer`]: near→far edge detection
//! - [`BackgroundController`]: event loop for the background process
//! - [`UiSession`]: UI-process view of the background state

pub mod alarm;
pub mod channel;
pub mod controller;
pub mod error;
pub mod events;
pub mod notification;
pub mod proximity;
pub mod storage;
pub mod timer;
pub mod ui;
pub mod wire;

pub use alarm::{trigger_alarm, AudioOutput};
pub use channel::{duplex, BackgroundEnd, SnapshotSink, UiEnd};
pub use controller::{
    BackgroundController, ControllerExit, ControllerState, SensorEvents, ServicePolicy,
};
pub use error::{AudioError, ConfigError, CoreError, StoreError, ValidationError, WireError};
pub use events::{BackgroundMessage, Snapshot, UiMessage};
pub use notification::{status_text, Notifier};
pub use proximity::{DebounceOutcome, ProximityDebouncer, ProximityReading};
pub use storage::{Config, MemorySettingsStore, SettingsStore, StoredSettings, TomlSettingsStore};
pub use timer::{format_time, CountdownEngine, CountdownPhase, TickOutcome, TimerConfig, WaveEffect};
pub use ui::{UiNotice, UiSession};
