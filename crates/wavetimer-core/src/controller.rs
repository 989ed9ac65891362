//! Background task controller.
//!
//! One task, one loop: UI messages, sensor readings, timer ticks and the
//! post-alarm cooldown are all handled by [`BackgroundController::run`] in
//! strict sequence, so a tick decrement can never interleave with a
//! wave-triggered reset. The controller owns every timer; the engine only
//! reacts to them.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::alarm::{trigger_alarm, AudioOutput};
use crate::channel::{BackgroundEnd, SnapshotSink};
use crate::events::{Snapshot, UiMessage};
use crate::notification::{status_text, Notifier};
use crate::proximity::{DebounceOutcome, ProximityDebouncer, ProximityReading};
use crate::storage::ServiceConfig;
use crate::timer::{CountdownEngine, TickOutcome, TimerConfig, WaveEffect};

/// Subscription to the proximity sensor. Not restartable: once it yields
/// `None` no further readings arrive.
pub type SensorEvents = mpsc::Receiver<ProximityReading>;

/// Everything the background process knows, owned in one place and handed to
/// the controller at startup.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub config: TimerConfig,
    pub engine: CountdownEngine,
    pub debouncer: ProximityDebouncer,
}

impl ControllerState {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            engine: CountdownEngine::new(config.duration_seconds),
            config,
            debouncer: ProximityDebouncer::new(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot(self.debouncer.is_near())
    }
}

/// Longest tick period accepted; anything above is clamped.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Longest post-alarm cooldown accepted.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// Timing policy for the background process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePolicy {
    pub tick_interval: Duration,
    pub cooldown: Duration,
    pub alarm_asset: String,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            cooldown: Duration::from_secs(3),
            alarm_asset: "alarm".into(),
        }
    }
}

impl ServicePolicy {
    /// Bring both periods into a range the timer wheel can schedule.
    pub fn clamped(self) -> Self {
        Self {
            tick_interval: self
                .tick_interval
                .clamp(Duration::from_millis(1), MAX_TICK_INTERVAL),
            cooldown: self.cooldown.min(MAX_COOLDOWN),
            alarm_asset: self.alarm_asset,
        }
    }
}

impl From<&ServiceConfig> for ServicePolicy {
    fn from(cfg: &ServiceConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(cfg.tick_interval_ms),
            cooldown: Duration::from_secs(cfg.cooldown_secs),
            alarm_asset: cfg.alarm_asset.clone(),
        }
        .clamped()
    }
}

/// Why [`BackgroundController::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerExit {
    /// The UI sent a stop-service command.
    StopRequested,
    /// The UI detached, the sensor ended and the timer is at rest: nothing can
    /// change the state any more.
    Orphaned,
}

pub struct BackgroundController<A: AudioOutput, N: Notifier> {
    state: ControllerState,
    policy: ServicePolicy,
    inbound: Option<mpsc::UnboundedReceiver<UiMessage>>,
    outbound: SnapshotSink,
    sensor: Option<SensorEvents>,
    audio: A,
    notifier: N,
    tick: Option<Interval>,
    cooldown: Option<Pin<Box<Sleep>>>,
    torn_down: bool,
}

impl<A: AudioOutput, N: Notifier> BackgroundController<A, N> {
    pub fn new(
        state: ControllerState,
        policy: ServicePolicy,
        channel: BackgroundEnd,
        sensor: SensorEvents,
        audio: A,
        notifier: N,
    ) -> Self {
        let (inbound, outbound) = channel.into_parts();
        Self {
            state,
            policy: policy.clamped(),
            inbound: Some(inbound),
            outbound,
            sensor: Some(sensor),
            audio,
            notifier,
            tick: None,
            cooldown: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Drive the controller until it is stopped. Teardown always runs, also
    /// when the future is dropped early or a handler panics.
    pub async fn run(mut self) -> ControllerExit {
        info!(
            duration = self.state.config.duration_seconds,
            volume = self.state.config.volume,
            "background timer started"
        );
        if let Err(e) = self.audio.load_asset(&self.policy.alarm_asset) {
            warn!(asset = %self.policy.alarm_asset, error = %e, "alarm asset unavailable");
        }
        self.emit();

        let exit = loop {
            tokio::select! {
                biased;
                message = recv_unbounded(&mut self.inbound) => match message {
                    Some(message) => {
                        if let Some(exit) = self.handle_message(message) {
                            break exit;
                        }
                    }
                    None => {
                        debug!("ui detached; timer keeps running");
                        self.inbound = None;
                    }
                },
                reading = recv_bounded(&mut self.sensor) => match reading {
                    Some(reading) => self.handle_reading(reading),
                    None => {
                        warn!("sensor stream ended; waves disabled");
                        self.sensor = None;
                    }
                },
                () = next_tick(&mut self.tick) => self.handle_tick(),
                () = cooldown_elapsed(&mut self.cooldown) => self.handle_cooldown_elapsed(),
            }

            if self.is_orphaned() {
                break ControllerExit::Orphaned;
            }
        };

        self.teardown();
        exit
    }

    fn handle_message(&mut self, message: UiMessage) -> Option<ControllerExit> {
        match message {
            UiMessage::DurationChanged(secs) => {
                self.state.config.duration_seconds = secs;
                let before = self.state.engine.remaining_seconds();
                let reset = self.state.engine.set_duration(secs);
                debug!(secs, reset, "duration updated");
                if reset || before != self.state.engine.remaining_seconds() {
                    self.emit();
                }
            }
            UiMessage::VolumeChanged(volume) => {
                self.state.config.volume = volume;
                debug!(volume, "volume updated");
            }
            UiMessage::StartTimer => {
                if self.state.engine.start() {
                    self.activate_tick();
                    self.emit();
                } else {
                    debug!(phase = ?self.state.engine.phase(), "start ignored");
                }
            }
            UiMessage::StopService => {
                info!("stop requested");
                return Some(ControllerExit::StopRequested);
            }
        }
        None
    }

    fn handle_reading(&mut self, reading: ProximityReading) {
        if self.state.debouncer.observe(reading) == DebounceOutcome::WaveDetected {
            match self.state.engine.wave() {
                WaveEffect::Started => {
                    debug!("wave: countdown started");
                    self.activate_tick();
                }
                WaveEffect::Restarted => debug!("wave: countdown restarted"),
                WaveEffect::Ignored => {
                    debug!(phase = ?self.state.engine.phase(), "wave ignored")
                }
            }
        }
        self.emit();
    }

    fn handle_tick(&mut self) {
        match self.state.engine.tick() {
            TickOutcome::Counted => self.emit(),
            TickOutcome::Completed => self.complete(),
            TickOutcome::Ignored => self.tick = None,
        }
    }

    fn complete(&mut self) {
        self.tick = None;
        info!("countdown complete");
        trigger_alarm(self.state.config.volume, &mut self.audio);
        self.state.engine.begin_cooldown();
        self.cooldown = Some(Box::pin(tokio::time::sleep(self.policy.cooldown)));
        self.emit();
    }

    fn handle_cooldown_elapsed(&mut self) {
        self.cooldown = None;
        if self.state.engine.finish_cooldown() {
            debug!("cooldown over; timer rearmed");
            self.emit();
        }
    }

    fn activate_tick(&mut self) {
        let period = self.policy.tick_interval;
        let now = Instant::now();
        let start = now.checked_add(period).unwrap_or(now);
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        self.tick = Some(interval);
    }

    fn emit(&mut self) {
        let snapshot = self.state.snapshot();
        self.outbound.send(snapshot);
        self.notifier.show(&status_text(&snapshot));
    }

    fn is_orphaned(&self) -> bool {
        self.inbound.is_none()
            && self.sensor.is_none()
            && self.tick.is_none()
            && self.cooldown.is_none()
    }

    /// Cancel every timer, drop the sensor subscription, release the audio
    /// output and clear the notification. Idempotent.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.tick = None;
        self.cooldown = None;
        self.sensor = None;
        self.inbound = None;
        self.state.engine.stop();
        self.audio.dispose();
        self.notifier.clear();
        self.outbound.close();
        info!("background timer stopped");
    }
}

impl<A: AudioOutput, N: Notifier> Drop for BackgroundController<A, N> {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn recv_unbounded<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn recv_bounded<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(tick: &mut Option<Interval>) {
    match tick {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn cooldown_elapsed(cooldown: &mut Option<Pin<Box<Sleep>>>) {
    match cooldown {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_starts_idle_at_configured_duration() {
        let state = ControllerState::new(TimerConfig {
            duration_seconds: 45,
            volume: 0.5,
        });
        let snap = state.snapshot();
        assert_eq!(snap.remaining_seconds, 45);
        assert!(!snap.is_running);
        assert!(!snap.is_near);
    }

    #[test]
    fn policy_from_service_config() {
        let cfg = ServiceConfig {
            cooldown_secs: 5,
            tick_interval_ms: 0,
            alarm_asset: "bell".into(),
        };
        let policy = ServicePolicy::from(&cfg);
        assert_eq!(policy.cooldown, Duration::from_secs(5));
        assert_eq!(policy.tick_interval, Duration::from_millis(1));
        assert_eq!(policy.alarm_asset, "bell");
    }

    #[test]
    fn policy_clamps_huge_periods() {
        let cfg = ServiceConfig {
            cooldown_secs: u64::MAX,
            tick_interval_ms: u64::MAX,
            alarm_asset: "alarm".into(),
        };
        let policy = ServicePolicy::from(&cfg);
        assert_eq!(policy.tick_interval, MAX_TICK_INTERVAL);
        assert_eq!(policy.cooldown, MAX_COOLDOWN);
    }
}
