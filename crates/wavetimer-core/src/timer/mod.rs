mod config;
mod engine;
mod format;

pub use config::{TimerConfig, DEFAULT_DURATION_SECONDS, DEFAULT_VOLUME};
pub use engine::{CountdownEngine, CountdownPhase, TickOutcome, WaveEffect};
pub use format::format_time;
