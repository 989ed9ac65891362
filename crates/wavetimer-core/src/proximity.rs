//! Proximity debouncing.
//!
//! The sensor reports a stream of near/far readings. Only the near→far edge
//! counts as a wave, so a hand lingering over the sensor triggers once when
//! it is withdrawn rather than on arrival.

use serde::{Deserialize, Serialize};

/// One raw reading from the proximity sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityReading {
    pub is_near: bool,
}

impl ProximityReading {
    pub fn near() -> Self {
        Self { is_near: true }
    }

    pub fn far() -> Self {
        Self { is_near: false }
    }

    /// Parse a line from a text sensor source. Accepts `near`/`far`,
    /// `1`/`0` and `true`/`false`, case-insensitively.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "near" | "1" | "true" => Some(Self::near()),
            "far" | "0" | "false" => Some(Self::far()),
            _ => None,
        }
    }
}

/// Result of feeding one reading into the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// Near→far edge.
    WaveDetected,
    /// Reading recorded, no trigger.
    Absorbed,
}

/// One bit of memory: the previous `is_near`.
///
/// A fresh debouncer has no prior reading, which behaves as "far": the first
/// reading can never be a wave.
#[derive(Debug, Clone, Default)]
pub struct ProximityDebouncer {
    is_near: bool,
}

impl ProximityDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest tracked value, forwarded into every snapshot.
    pub fn is_near(&self) -> bool {
        self.is_near
    }

    pub fn observe(&mut self, reading: ProximityReading) -> DebounceOutcome {
        let was_near = self.is_near;
        self.is_near = reading.is_near;
        if was_near && !reading.is_near {
            DebounceOutcome::WaveDetected
        } else {
            DebounceOutcome::Absorbed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn waves(readings: &[bool]) -> Vec<usize> {
        let mut debouncer = ProximityDebouncer::new();
        readings
            .iter()
            .enumerate()
            .filter_map(|(i, &near)| {
                (debouncer.observe(ProximityReading { is_near: near })
                    == DebounceOutcome::WaveDetected)
                    .then_some(i)
            })
            .collect()
    }

    #[test]
    fn only_near_to_far_triggers() {
        assert_eq!(waves(&[true, false]), vec![1]);
        assert!(waves(&[false, true]).is_empty());
        assert!(waves(&[false, false, false]).is_empty());
    }

    #[test]
    fn lingering_hand_triggers_once() {
        assert_eq!(waves(&[true, true, true, true, false, false]), vec![4]);
    }

    #[test]
    fn first_reading_far_is_not_a_wave() {
        assert!(waves(&[false]).is_empty());
    }

    #[test]
    fn tracks_latest_value_even_without_trigger() {
        let mut debouncer = ProximityDebouncer::new();
        debouncer.observe(ProximityReading::near());
        assert!(debouncer.is_near());
        debouncer.observe(ProximityReading::near());
        assert!(debouncer.is_near());
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(ProximityReading::parse("NEAR"), Some(ProximityReading::near()));
        assert_eq!(ProximityReading::parse(" 0 \n"), Some(ProximityReading::far()));
        assert_eq!(ProximityReading::parse("true"), Some(ProximityReading::near()));
        assert_eq!(ProximityReading::parse("maybe"), None);
    }

    proptest! {
        #[test]
        fn waves_fire_exactly_at_near_to_far_edges(readings in prop::collection::vec(any::<bool>(), 0..200)) {
            let expected: Vec<usize> = (1..readings.len())
                .filter(|&i| readings[i - 1] && !readings[i])
                .collect();
            prop_assert_eq!(waves(&readings), expected);
        }
    }
}
