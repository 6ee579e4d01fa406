//! Event flag bus tests

use pwm_siggen::events::{Event, EventBus, PendingEvents};

#[test]
fn test_burst_collapses_to_one() {
    let bus = EventBus::new();

    assert!(bus.post(Event::Increment));
    for _ in 0..9 {
        assert!(!bus.post(Event::Increment));
    }

    assert_eq!(bus.drain_all(), PendingEvents::INCREMENT);
    assert_eq!(bus.posted(), 10);
    assert_eq!(bus.collapsed(), 9);
}

#[test]
fn test_drain_clears_everything() {
    let bus = EventBus::new();
    bus.post(Event::Start);
    bus.post(Event::Decrement);

    assert_eq!(
        bus.pending(),
        PendingEvents::START | PendingEvents::DECREMENT
    );
    let drained = bus.drain_all();
    assert!(drained.contains(PendingEvents::START));
    assert!(drained.contains(PendingEvents::DECREMENT));
    assert!(!bus.has_pending());
    assert!(bus.drain_all().is_empty());
}

#[test]
fn test_dispatch_order() {
    let bus = EventBus::new();
    bus.post(Event::Decrement);
    bus.post(Event::Increment);
    bus.post(Event::Start);
    bus.post(Event::Stop);

    let order: Vec<Event> = bus.drain_all().in_priority_order().collect();
    assert_eq!(
        order,
        vec![Event::Stop, Event::Start, Event::Increment, Event::Decrement]
    );
}

#[test]
fn test_post_after_drain_lands_in_next_batch() {
    let bus = EventBus::new();
    bus.post(Event::Stop);
    let first = bus.drain_all();

    bus.post(Event::Stop);
    assert_eq!(first, PendingEvents::STOP);
    assert_eq!(bus.drain_all(), PendingEvents::STOP);
}
