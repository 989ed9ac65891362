//! Countdown engine implementation.
//!
//! Like the rest of the core, the engine owns no timers: the caller activates
//! a periodic tick source while [`CountdownEngine::is_ticking`] is true and
//! calls [`CountdownEngine::tick`] once per period.
//!
//! ## State Transitions
//!
//! ```text
//!           start / wave                 tick reaches 0
//!  Idle ──────────────────► Running ─────────────────────► Completing
//!   ▲                        │   ▲                             │
//!   │                        └───┘ wave (restart)              │ begin_cooldown
//!   │        finish_cooldown                                   ▼
//!   └──────────────────────────────────────────────────── CoolingDown
//!
//!  any ── stop ──► Stopped (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::events::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownPhase {
    Idle,
    Running,
    /// Remaining hit zero; the alarm is being fired. Only observable between
    /// [`CountdownEngine::tick`] returning `Completed` and
    /// [`CountdownEngine::begin_cooldown`].
    Completing,
    /// Post-alarm delay before returning to `Idle`.
    CoolingDown,
    Stopped,
}

/// What a tick did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed.
    Ignored,
    /// Remaining was decremented and is still above zero.
    Counted,
    /// Remaining reached zero and the engine is now `Completing`.
    Completed,
}

/// What a wave did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveEffect {
    /// Armed from `Idle`; the tick source must be activated.
    Started,
    /// Remaining reset to the full duration; the tick source keeps running.
    Restarted,
    Ignored,
}

/// Core countdown engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    duration_seconds: u32,
    remaining_seconds: u32,
    phase: CountdownPhase,
    /// Number of times the engine has passed through `Completing`.
    #[serde(default)]
    completions: u64,
}

impl CountdownEngine {
    /// Create an idle engine with `remaining == duration`.
    pub fn new(duration_seconds: u32) -> Self {
        let duration_seconds = duration_seconds.max(1);
        Self {
            duration_seconds,
            remaining_seconds: duration_seconds,
            phase: CountdownPhase::Idle,
            completions: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn completions(&self) -> u64 {
        self.completions
    }

    /// The running flag as the UI sees it.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, CountdownPhase::Running | CountdownPhase::Completing)
    }

    /// Whether a periodic tick source must be active.
    pub fn is_ticking(&self) -> bool {
        self.phase == CountdownPhase::Running
    }

    /// Full state tuple for the UI.
    pub fn snapshot(&self, is_near: bool) -> Snapshot {
        Snapshot {
            remaining_seconds: self.remaining_seconds,
            is_running: self.is_running(),
            is_near,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the countdown. Only valid from `Idle`; returns whether it moved.
    pub fn start(&mut self) -> bool {
        match self.phase {
            CountdownPhase::Idle => {
                self.remaining_seconds = self.duration_seconds;
                self.phase = CountdownPhase::Running;
                true
            }
            _ => false,
        }
    }

    /// A wave arms an idle timer and restarts a running one. Waves during the
    /// cooldown are ignored.
    pub fn wave(&mut self) -> WaveEffect {
        match self.phase {
            CountdownPhase::Idle => {
                self.start();
                WaveEffect::Started
            }
            CountdownPhase::Running => {
                self.remaining_seconds = self.duration_seconds;
                WaveEffect::Restarted
            }
            CountdownPhase::Completing | CountdownPhase::CoolingDown | CountdownPhase::Stopped => {
                WaveEffect::Ignored
            }
        }
    }

    /// Call once per tick period while running.
    ///
    /// The tick whose decrement reaches zero moves straight to `Completing`;
    /// no extra tick is spent at zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != CountdownPhase::Running {
            return TickOutcome::Ignored;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.phase = CountdownPhase::Completing;
            self.completions += 1;
            return TickOutcome::Completed;
        }
        TickOutcome::Counted
    }

    /// `Completing` → `CoolingDown`, once the alarm has been fired.
    pub fn begin_cooldown(&mut self) -> bool {
        if self.phase != CountdownPhase::Completing {
            return false;
        }
        self.phase = CountdownPhase::CoolingDown;
        true
    }

    /// `CoolingDown` → `Idle`, rearmed to the full duration.
    pub fn finish_cooldown(&mut self) -> bool {
        if self.phase != CountdownPhase::CoolingDown {
            return false;
        }
        self.remaining_seconds = self.duration_seconds;
        self.phase = CountdownPhase::Idle;
        true
    }

    /// Change the duration used by the next reset.
    ///
    /// An idle engine shows the new length immediately (returns `true`). A
    /// running countdown keeps its remaining time unless that would exceed the
    /// new duration, in which case it is clamped.
    pub fn set_duration(&mut self, duration_seconds: u32) -> bool {
        self.duration_seconds = duration_seconds.max(1);
        match self.phase {
            CountdownPhase::Idle => {
                self.remaining_seconds = self.duration_seconds;
                true
            }
            CountdownPhase::Stopped => false,
            _ => {
                self.remaining_seconds = self.remaining_seconds.min(self.duration_seconds);
                false
            }
        }
    }

    /// Terminal. The engine cannot leave `Stopped`.
    pub fn stop(&mut self) {
        self.phase = CountdownPhase::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn start_from_idle_arms_full_duration() {
        let mut engine = CountdownEngine::new(5);
        assert_eq!(engine.phase(), CountdownPhase::Idle);
        assert!(engine.start());
        assert_eq!(engine.remaining_seconds(), 5);
        assert!(engine.is_running());
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut engine = CountdownEngine::new(5);
        engine.start();
        engine.tick();
        assert!(!engine.start());
        assert_eq!(engine.remaining_seconds(), 4);
        assert_eq!(engine.phase(), CountdownPhase::Running);
    }

    #[test]
    fn wave_restarts_running_countdown() {
        let mut engine = CountdownEngine::new(10);
        assert_eq!(engine.wave(), WaveEffect::Started);
        engine.tick();
        engine.tick();
        assert_eq!(engine.remaining_seconds(), 8);
        assert_eq!(engine.wave(), WaveEffect::Restarted);
        assert_eq!(engine.remaining_seconds(), 10);
        assert!(engine.is_ticking());
        engine.tick();
        assert_eq!(engine.remaining_seconds(), 9);
    }

    #[test]
    fn completes_exactly_on_fifth_tick() {
        let mut engine = CountdownEngine::new(5);
        engine.start();
        for _ in 0..4 {
            assert_eq!(engine.tick(), TickOutcome::Counted);
        }
        assert_eq!(engine.tick(), TickOutcome::Completed);
        assert_eq!(engine.phase(), CountdownPhase::Completing);
        assert_eq!(engine.remaining_seconds(), 0);
        assert_eq!(engine.completions(), 1);

        // Further ticks do nothing until the cooldown cycle finishes.
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert!(engine.begin_cooldown());
        assert!(!engine.is_running());
        assert!(engine.finish_cooldown());
        assert_eq!(engine.phase(), CountdownPhase::Idle);
        assert_eq!(engine.remaining_seconds(), 5);
        assert_eq!(engine.completions(), 1);
    }

    #[test]
    fn wave_during_cooldown_is_ignored() {
        let mut engine = CountdownEngine::new(1);
        engine.start();
        assert_eq!(engine.tick(), TickOutcome::Completed);
        engine.begin_cooldown();
        assert_eq!(engine.wave(), WaveEffect::Ignored);
        assert!(!engine.start());
        assert_eq!(engine.phase(), CountdownPhase::CoolingDown);
    }

    #[test]
    fn set_duration_idle_vs_running() {
        let mut engine = CountdownEngine::new(60);
        assert!(engine.set_duration(90));
        assert_eq!(engine.remaining_seconds(), 90);

        engine.start();
        for _ in 0..60 {
            engine.tick();
        }
        assert_eq!(engine.remaining_seconds(), 30);
        assert!(!engine.set_duration(120));
        assert_eq!(engine.remaining_seconds(), 30);
        engine.wave();
        assert_eq!(engine.remaining_seconds(), 120);
    }

    #[test]
    fn shrinking_duration_clamps_remaining() {
        let mut engine = CountdownEngine::new(60);
        engine.start();
        engine.set_duration(10);
        assert_eq!(engine.remaining_seconds(), 10);
    }

    #[test]
    fn stopped_is_terminal() {
        let mut engine = CountdownEngine::new(3);
        engine.start();
        engine.stop();
        assert!(!engine.start());
        assert_eq!(engine.wave(), WaveEffect::Ignored);
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert!(!engine.finish_cooldown());
        assert_eq!(engine.phase(), CountdownPhase::Stopped);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Start,
        Wave,
        Tick,
        Cool,
        Duration(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Start),
            Just(Op::Wave),
            Just(Op::Tick),
            Just(Op::Cool),
            (1u32..200).prop_map(Op::Duration),
        ]
    }

    proptest! {
        #[test]
        fn remaining_never_exceeds_duration(initial in 1u32..200, ops in prop::collection::vec(op(), 0..300)) {
            let mut engine = CountdownEngine::new(initial);
            for op in ops {
                match op {
                    Op::Start => { engine.start(); }
                    Op::Wave => { engine.wave(); }
                    Op::Tick => { engine.tick(); }
                    Op::Cool => {
                        engine.begin_cooldown();
                        engine.finish_cooldown();
                    }
                    Op::Duration(d) => { engine.set_duration(d); }
                }
                prop_assert!(engine.remaining_seconds() <= engine.duration_seconds());
                if engine.phase() == CountdownPhase::Running {
                    prop_assert!(engine.remaining_seconds() > 0);
                }
            }
        }
    }
}
