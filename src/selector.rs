//! Dwell selection - a key commits after the pointer stays on it for `hold_time`
//!
//! The selector is advanced once per frame with the key under the pointer (if
//! any). It never looks at the clock itself; callers pass the frame timestamp,
//! so the threshold is only as precise as the frame rate.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorState {
    Idle,
    Holding { key: String, since: Instant },
}

#[derive(Debug)]
pub struct DwellSelector {
    state: SelectorState,
    hold_time: Duration,
}

impl DwellSelector {
    pub fn new(hold_time: Duration) -> Self {
        Self {
            state: SelectorState::Idle,
            hold_time,
        }
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn hold_time(&self) -> Duration {
        self.hold_time
    }

    /// Key currently being held, if any
    pub fn candidate(&self) -> Option<&str> {
        match &self.state {
            SelectorState::Idle => None,
            SelectorState::Holding { key, .. } => Some(key),
        }
    }

    /// Advance one frame. Returns the key label when the hold completes.
    pub fn update(&mut self, detected: Option<&str>, now: Instant) -> Option<String> {
        let Some(detected) = detected else {
            self.state = SelectorState::Idle;
            return None;
        };

        match &self.state {
            SelectorState::Holding { key, since } if key == detected => {
                if now.saturating_duration_since(*since) >= self.hold_time {
                    let key = key.clone();
                    self.state = SelectorState::Idle;
                    return Some(key);
                }
                None
            }
            _ => {
                self.state = SelectorState::Holding {
                    key: detected.to_string(),
                    since: now,
                };
                None
            }
        }
    }

    /// Hand tracking lost: drop any partial hold
    pub fn reset(&mut self) {
        self.state = SelectorState::Idle;
    }

    /// Fraction of the hold elapsed for the current candidate, in [0, 1]
    pub fn progress(&self, now: Instant) -> Option<f32> {
        match &self.state {
            SelectorState::Idle => None,
            SelectorState::Holding { since, .. } => {
                if self.hold_time.is_zero() {
                    return Some(1.0);
                }
                let held = now.saturating_duration_since(*since).as_secs_f32();
                Some((held / self.hold_time.as_secs_f32()).clamp(0.0, 1.0))
            }
        }
    }
}
