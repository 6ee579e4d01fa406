//! Frequency / playback state machine.
//!
//! Pure logic, no hardware dependencies. Consumes one event at a time and
//! tells the main loop what the playback controller must do.
//!
//! ```text
//!             Start                      Stop
//!  Stopped ──────────▶ Running ──────────────────▶ Stopped
//!     │                  │  ▲
//!     │ Inc/Dec          │  │ Inc/Dec: retune at new frequency
//!     ▼                  └──┘
//!  Stopped (frequency changes, hardware untouched)
//! ```
//!
//! Increment doubles, decrement halves; both clamp to the configured
//! bounds so table generation always succeeds.

use crate::config::SignalConfig;
use crate::events::Event;

/// Run state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Running,
}

/// What the playback controller must do after an event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Nothing to do.
    None,
    /// Release the PWM, drive idle level, cancel the safety timer.
    Halt,
    /// Regenerate the table at this frequency, reconfigure, re-arm.
    Play(f32),
}

/// Current frequency and run state.
#[derive(Clone, Debug)]
pub struct FrequencyStateMachine {
    state: PlaybackState,
    frequency: f32,
    min_hz: f32,
    max_hz: f32,
}

impl FrequencyStateMachine {
    /// Stopped, at the configured initial frequency clamped into bounds.
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            state: PlaybackState::Stopped,
            frequency: config.clamp_frequency(config.initial_hz),
            min_hz: config.min_frequency(),
            max_hz: config.max_frequency(),
        }
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[inline]
    pub fn bounds(&self) -> (f32, f32) {
        (self.min_hz, self.max_hz)
    }

    /// Apply one event.
    ///
    /// `output_active` is false when the last reconfigure failed; an
    /// unchanged frequency then still retries playback.
    pub fn handle(&mut self, event: Event, output_active: bool) -> Action {
        match event {
            Event::Stop => {
                self.state = PlaybackState::Stopped;
                Action::Halt
            }
            Event::Start => {
                self.state = PlaybackState::Running;
                Action::Play(self.frequency)
            }
            Event::Increment => {
                let changed = self.increment();
                self.retune(changed, output_active)
            }
            Event::Decrement => {
                let changed = self.decrement();
                self.retune(changed, output_active)
            }
        }
    }

    /// Double the frequency, clamped to the maximum.
    ///
    /// Returns `true` if the frequency changed.
    pub fn increment(&mut self) -> bool {
        let next = (self.frequency * 2.0).min(self.max_hz);
        self.set_frequency(next)
    }

    /// Halve the frequency, clamped to the minimum.
    ///
    /// Returns `true` if the frequency changed.
    pub fn decrement(&mut self) -> bool {
        let next = (self.frequency / 2.0).max(self.min_hz);
        self.set_frequency(next)
    }

    fn set_frequency(&mut self, next: f32) -> bool {
        if next == self.frequency {
            return false;
        }
        self.frequency = next;
        true
    }

    fn retune(&self, changed: bool, output_active: bool) -> Action {
        if self.is_running() && (changed || !output_active) {
            Action::Play(self.frequency)
        } else {
            Action::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LED_PROFILE;

    fn fsm() -> FrequencyStateMachine {
        FrequencyStateMachine::new(&LED_PROFILE)
    }

    /// LED clock with a 100-entry table: bounds are 1 Hz to 25 Hz.
    fn narrow(initial_hz: f32) -> FrequencyStateMachine {
        FrequencyStateMachine::new(&SignalConfig {
            initial_hz,
            table_capacity: 100,
            ..LED_PROFILE
        })
    }

    #[test]
    fn test_initial_state() {
        let m = fsm();
        assert_eq!(m.state(), PlaybackState::Stopped);
        assert_eq!(m.frequency(), 0.25);
    }

    #[test]
    fn test_initial_frequency_is_clamped() {
        let m = narrow(1000.0);
        assert_eq!(m.frequency(), 25.0);
        assert_eq!(m.bounds(), (1.0, 25.0));
        assert_eq!(narrow(0.01).frequency(), 1.0);
    }

    #[test]
    fn test_start_plays_current_frequency() {
        let mut m = fsm();
        assert_eq!(m.handle(Event::Start, false), Action::Play(0.25));
        assert!(m.is_running());
    }

    #[test]
    fn test_stop_from_any_state() {
        let mut m = fsm();
        assert_eq!(m.handle(Event::Stop, false), Action::Halt);
        m.handle(Event::Start, false);
        assert_eq!(m.handle(Event::Stop, true), Action::Halt);
        assert_eq!(m.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_increment_clamps_at_max() {
        let mut m = fsm();
        for _ in 0..20 {
            m.increment();
        }
        assert_eq!(m.frequency(), 25.0);
        assert!(!m.increment());
    }

    #[test]
    fn test_running_retune_only_on_change() {
        let mut m = narrow(25.0);
        m.handle(Event::Start, true);
        assert_eq!(m.handle(Event::Increment, true), Action::None);
        assert_eq!(m.handle(Event::Decrement, true), Action::Play(12.5));
    }

    #[test]
    fn test_degraded_output_retries_at_clamp() {
        let mut m = narrow(25.0);
        m.handle(Event::Start, false);
        assert_eq!(m.handle(Event::Increment, false), Action::Play(25.0));
    }
}
