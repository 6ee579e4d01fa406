//! Button bank debounce and mapping tests

use pwm_siggen::events::{Event, EventBus, PendingEvents};
use pwm_siggen::hal::{ButtonBank, ButtonLine, EdgeOutcome};

#[test]
fn test_board_mapping() {
    let bank = ButtonBank::board();
    assert_eq!(bank.action(ButtonLine::Button0), Event::Decrement);
    assert_eq!(bank.action(ButtonLine::Button1), Event::Increment);
    assert_eq!(bank.action(ButtonLine::Button2), Event::Stop);
    assert_eq!(bank.action(ButtonLine::Button3), Event::Start);
    assert_eq!(bank.debounce_ms(), 50);
}

#[test]
fn test_bounce_inside_window_is_dropped() {
    let bank = ButtonBank::board();
    let bus = EventBus::new();

    assert_eq!(
        bank.on_edge(ButtonLine::Button3, 1_000, &bus),
        EdgeOutcome::Posted(Event::Start)
    );
    assert_eq!(
        bank.on_edge(ButtonLine::Button3, 1_020, &bus),
        EdgeOutcome::Bounced
    );
    assert_eq!(
        bank.on_edge(ButtonLine::Button3, 1_049, &bus),
        EdgeOutcome::Bounced
    );
    assert_eq!(bank.bounced(), 2);
    assert_eq!(bus.posted(), 1);
}

#[test]
fn test_press_after_window_collapses_until_drained() {
    let bank = ButtonBank::board();
    let bus = EventBus::new();

    bank.on_edge(ButtonLine::Button1, 0, &bus);
    assert_eq!(
        bank.on_edge(ButtonLine::Button1, 60, &bus),
        EdgeOutcome::Collapsed(Event::Increment)
    );
    assert_eq!(bus.drain_all(), PendingEvents::INCREMENT);

    assert_eq!(
        bank.on_edge(ButtonLine::Button1, 120, &bus),
        EdgeOutcome::Posted(Event::Increment)
    );
}

#[test]
fn test_lines_debounce_independently() {
    let bank = ButtonBank::board();
    let bus = EventBus::new();

    bank.on_edge(ButtonLine::Button2, 500, &bus);
    assert_eq!(
        bank.on_edge(ButtonLine::Button3, 510, &bus),
        EdgeOutcome::Posted(Event::Start)
    );
    assert_eq!(bus.drain_all(), PendingEvents::STOP | PendingEvents::START);
}

#[test]
fn test_first_edge_at_time_zero_is_accepted() {
    let bank = ButtonBank::board();
    let bus = EventBus::new();

    assert_eq!(
        bank.on_edge(ButtonLine::Button0, 0, &bus),
        EdgeOutcome::Posted(Event::Decrement)
    );
}

#[test]
fn test_clock_wrap() {
    let bank = ButtonBank::board();
    let bus = EventBus::new();

    bank.on_edge(ButtonLine::Button2, u32::MAX - 10, &bus);
    assert_eq!(
        bank.on_edge(ButtonLine::Button2, 20, &bus),
        EdgeOutcome::Bounced
    );
    assert!(matches!(
        bank.on_edge(ButtonLine::Button2, 60, &bus),
        EdgeOutcome::Collapsed(Event::Stop)
    ));
}

#[test]
fn test_custom_mapping() {
    let bank = ButtonBank::new(
        [Event::Stop, Event::Start, Event::Increment, Event::Decrement],
        0,
    );
    let bus = EventBus::new();

    bank.on_edge(ButtonLine::Button0, 5, &bus);
    assert_eq!(
        bank.on_edge(ButtonLine::Button0, 5, &bus),
        EdgeOutcome::Collapsed(Event::Stop)
    );
    assert_eq!(ButtonLine::from_index(3), Some(ButtonLine::Button3));
    assert_eq!(ButtonLine::from_index(4), None);
}
