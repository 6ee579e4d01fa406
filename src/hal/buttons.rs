//! Button lines and debounce.
//!
//! Board glue registers one edge callback per button and forwards every
//! edge to `ButtonBank::on_edge` from interrupt context. The bank drops
//! edges inside the debounce window, maps the line to its action and posts
//! it to the event bus. Atomics only, safe from any interrupt.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::DEBOUNCE_MS;
use crate::events::{Event, EventBus};

/// Number of button lines on the board.
pub const NUM_BUTTONS: usize = 4;

/// Physical button lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonLine {
    Button0 = 0,
    Button1 = 1,
    Button2 = 2,
    Button3 = 3,
}

impl ButtonLine {
    pub const ALL: [ButtonLine; NUM_BUTTONS] = [
        ButtonLine::Button0,
        ButtonLine::Button1,
        ButtonLine::Button2,
        ButtonLine::Button3,
    ];

    /// Convert from raw line index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What happened to one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Posted a new event.
    Posted(Event),
    /// Event was already pending; merged into it.
    Collapsed(Event),
    /// Inside the debounce window; ignored.
    Bounced,
}

struct LineState {
    seen: AtomicBool,
    last_ms: AtomicU32,
}

impl LineState {
    const fn new() -> Self {
        Self {
            seen: AtomicBool::new(false),
            last_ms: AtomicU32::new(0),
        }
    }
}

/// Debounced mapping from button lines to events.
pub struct ButtonBank {
    actions: [Event; NUM_BUTTONS],
    lines: [LineState; NUM_BUTTONS],
    debounce_ms: u32,
    bounced: AtomicU32,
}

impl ButtonBank {
    /// Board wiring: 0 = decrement, 1 = increment, 2 = stop, 3 = start.
    pub const BOARD_MAP: [Event; NUM_BUTTONS] =
        [Event::Decrement, Event::Increment, Event::Stop, Event::Start];

    pub const fn new(actions: [Event; NUM_BUTTONS], debounce_ms: u32) -> Self {
        Self {
            actions,
            lines: [
                LineState::new(),
                LineState::new(),
                LineState::new(),
                LineState::new(),
            ],
            debounce_ms,
            bounced: AtomicU32::new(0),
        }
    }

    /// Board wiring with the default 50 ms debounce.
    pub const fn board() -> Self {
        Self::new(Self::BOARD_MAP, DEBOUNCE_MS)
    }

    /// Action mapped to `line`.
    #[inline]
    pub fn action(&self, line: ButtonLine) -> Event {
        self.actions[line.index()]
    }

    /// Handle one edge on `line` at `now_ms` (interrupt context).
    ///
    /// `now_ms` may wrap; only differences are used.
    pub fn on_edge(&self, line: ButtonLine, now_ms: u32, bus: &EventBus) -> EdgeOutcome {
        let state = &self.lines[line.index()];

        if state.seen.load(Ordering::Acquire) {
            let last = state.last_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) < self.debounce_ms {
                self.bounced.fetch_add(1, Ordering::Relaxed);
                return EdgeOutcome::Bounced;
            }
        }
        state.last_ms.store(now_ms, Ordering::Relaxed);
        state.seen.store(true, Ordering::Release);

        let event = self.action(line);
        if bus.post(event) {
            EdgeOutcome::Posted(event)
        } else {
            EdgeOutcome::Collapsed(event)
        }
    }

    /// Edges dropped by debounce since boot.
    #[inline]
    pub fn bounced(&self) -> u32 {
        self.bounced.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }
}

impl Default for ButtonBank {
    fn default() -> Self {
        Self::board()
    }
}
