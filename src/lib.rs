//! # PwmSiggen
//!
//! Button-controlled PWM sine generator with a safety timeout.
//!
//! ## Architecture
//!
//! Interrupt context and the main loop share exactly one thing, the
//! [`EventBus`]:
//! - Buttons and the safety timer only `post()` flags
//! - The main loop drains all flags once per iteration and is the single
//!   writer of the duty-cycle table, the run state and the PWM
//! - No mutexes, no callbacks into the core
//!
//! ```text
//! ButtonBank ──┐                      ┌─▶ FrequencyStateMachine
//!              ├─▶ EventBus ─▶ SignalLoop
//! TimeoutGate ─┘                      └─▶ PlaybackController ─▶ PwmOutput
//!                                                   └──────────▶ CountdownTimer
//! ```
//!
//! Hardware is reached only through the capability traits in [`hal`].

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod diag_sink;
pub mod error;
pub mod events;
pub mod fault;
pub mod fsm;
pub mod hal;
pub mod logging;
pub mod main_loop;
pub mod playback;
pub mod waveform;

pub use config::{ClockParameters, SignalConfig, CONFIG};
pub use error::{ConfigError, HardwareError, Resource, TableError};
pub use events::{Event, EventBus, PendingEvents};
pub use fault::{FaultCode, FaultState};
pub use fsm::{FrequencyStateMachine, PlaybackState};
pub use logging::{LogStream, DIAG_LOG};
pub use main_loop::{boot, SignalLoop};
pub use playback::PlaybackController;
pub use waveform::DutyCycleTable;
