//! Event flag bus between interrupt producers and the main loop.
//!
//! # Architecture
//!
//! ```text
//! Button ISR ──┐
//!              ├──▶ post() ──▶ [STOP|START|INC|DEC] ──▶ drain_all() ──▶ Main loop
//! Timer ISR ───┘     fetch_or      one atomic byte        swap(0)
//! ```
//!
//! # Rules
//!
//! - Interrupt context only calls `post()`. It never touches the table,
//!   the playback state or the PWM configuration.
//! - Flags are presence bits, not a queue. Posting an already-set flag is
//!   a no-op (counted as collapsed).
//! - `drain_all()` reads and clears every flag in one atomic step: a post
//!   either lands in this drain or in the next one, never in both, never lost.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use bitflags::bitflags;

bitflags! {
    /// Set of events pending between two polls.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct PendingEvents: u8 {
        const STOP = 1 << 0;
        const START = 1 << 1;
        const INCREMENT = 1 << 2;
        const DECREMENT = 1 << 3;
    }
}

/// A logical action requested by a button or the safety timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Stop,
    Start,
    Increment,
    Decrement,
}

impl Event {
    /// Dispatch order when several events are pending in one poll.
    ///
    /// Stop first, so a safety stop always wins over a concurrent request.
    pub const PRIORITY: [Event; 4] = [Event::Stop, Event::Start, Event::Increment, Event::Decrement];

    /// Bit for this event in `PendingEvents`.
    #[inline]
    pub const fn flag(self) -> PendingEvents {
        match self {
            Event::Stop => PendingEvents::STOP,
            Event::Start => PendingEvents::START,
            Event::Increment => PendingEvents::INCREMENT,
            Event::Decrement => PendingEvents::DECREMENT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Stop => "stop",
            Event::Start => "start",
            Event::Increment => "increment",
            Event::Decrement => "decrement",
        }
    }
}

impl PendingEvents {
    /// Pending events in dispatch order.
    pub fn in_priority_order(self) -> impl Iterator<Item = Event> {
        Event::PRIORITY
            .into_iter()
            .filter(move |event| self.contains(event.flag()))
    }
}

/// Lock-free event flag bus (many interrupt producers, one consumer).
pub struct EventBus {
    flags: AtomicU8,
    posted: AtomicU32,
    collapsed: AtomicU32,
}

impl EventBus {
    /// Create a bus with no pending events.
    pub const fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            posted: AtomicU32::new(0),
            collapsed: AtomicU32::new(0),
        }
    }

    /// Set the flag for `event` (interrupt-safe, never blocks).
    ///
    /// Returns `false` if the flag was already pending, in which case the
    /// post collapses into the pending one.
    #[inline]
    pub fn post(&self, event: Event) -> bool {
        let bit = event.flag().bits();
        let prev = self.flags.fetch_or(bit, Ordering::AcqRel);
        self.posted.fetch_add(1, Ordering::Relaxed);

        if prev & bit != 0 {
            self.collapsed.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Take every pending flag and clear them in the same atomic step.
    ///
    /// Main loop only.
    #[inline]
    pub fn drain_all(&self) -> PendingEvents {
        PendingEvents::from_bits_truncate(self.flags.swap(0, Ordering::AcqRel))
    }

    /// Peek at pending flags without consuming them.
    #[inline]
    pub fn pending(&self) -> PendingEvents {
        PendingEvents::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Check if anything is pending.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.flags.load(Ordering::Acquire) != 0
    }

    /// Total posts since boot.
    #[inline]
    pub fn posted(&self) -> u32 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Posts that found their flag already set.
    #[inline]
    pub fn collapsed(&self) -> u32 {
        self.collapsed.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_and_drain() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());

        assert!(bus.post(Event::Start));
        assert!(bus.has_pending());

        let drained = bus.drain_all();
        assert_eq!(drained, PendingEvents::START);
        assert!(bus.drain_all().is_empty());
    }

    #[test]
    fn test_priority_order() {
        let all = PendingEvents::all();
        let order: std::vec::Vec<Event> = all.in_priority_order().collect();
        assert_eq!(order, Event::PRIORITY.to_vec());

        let some = PendingEvents::DECREMENT | PendingEvents::STOP;
        let order: std::vec::Vec<Event> = some.in_priority_order().collect();
        assert_eq!(order, vec![Event::Stop, Event::Decrement]);
    }

    #[test]
    fn test_concurrent_posts_are_never_lost() {
        use std::sync::Arc;
        use std::thread;

        let bus = Arc::new(EventBus::new());
        let mut seen = PendingEvents::empty();

        let handles: std::vec::Vec<_> = Event::PRIORITY
            .into_iter()
            .map(|event| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        bus.post(event);
                    }
                })
            })
            .collect();

        // Drain concurrently with the producers
        for _ in 0..100 {
            seen |= bus.drain_all();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        seen |= bus.drain_all();

        assert_eq!(seen, PendingEvents::all());
        assert_eq!(bus.posted(), 4000);
    }
}
