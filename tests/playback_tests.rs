//! Playback controller call-sequence tests

mod common;

use common::{FakeCountdown, FakePwm, PwmCall, TimerCall};

use pwm_siggen::config::LED_PROFILE;
use pwm_siggen::error::{Resource, TableError};
use pwm_siggen::hal::TimeoutGate;
use pwm_siggen::playback::{PlaybackController, PlaybackError, Started};

fn controller<'a>(
    pwm: &FakePwm,
    timer: &FakeCountdown,
    gate: &'a TimeoutGate,
) -> PlaybackController<'a, FakePwm, FakeCountdown> {
    PlaybackController::new(pwm.clone(), timer.clone(), gate, LED_PROFILE)
}

#[test]
fn test_start_releases_before_acquire() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);

    let started = playback.start(0.25).unwrap();
    assert_eq!(
        started,
        Started {
            cycles: 400,
            top: 1250
        }
    );
    assert_eq!(
        pwm.calls(),
        vec![
            PwmCall::Release,
            PwmCall::Acquire {
                top: 1250,
                samples: 400
            }
        ]
    );
    assert_eq!(timer.calls(), vec![TimerCall::Restart(30_000)]);
    assert!(playback.is_active());
    assert!(gate.is_armed());
}

#[test]
fn test_retune_pairs_release_and_acquire() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);

    playback.start(0.25).unwrap();
    playback.start(0.5).unwrap();
    playback.start(1.0).unwrap();

    let calls = pwm.calls();
    assert_eq!(calls.len(), 6);
    for pair in calls.chunks(2) {
        assert_eq!(pair[0], PwmCall::Release);
        assert!(matches!(pair[1], PwmCall::Acquire { .. }));
    }
    assert_eq!(
        calls[5],
        PwmCall::Acquire {
            top: 1250,
            samples: 100
        }
    );
    assert_eq!(timer.calls().len(), 3);
}

#[test]
fn test_halt_releases_and_idles() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);

    playback.start(0.25).unwrap();
    pwm.take_calls();
    playback.halt();

    assert_eq!(pwm.calls(), vec![PwmCall::Release, PwmCall::Idle(true)]);
    assert_eq!(timer.calls().last(), Some(&TimerCall::Cancel));
    assert!(!playback.is_active());
    assert!(!gate.is_armed());
}

#[test]
fn test_hardware_failure_goes_idle_but_arms_timer() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);
    pwm.set_failing(true);

    let err = playback.start(0.25).unwrap_err();
    match err {
        PlaybackError::Hardware(e) => assert_eq!(e.resource, Resource::Pwm),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(pwm.calls().last(), Some(&PwmCall::Idle(true)));
    assert!(!playback.is_active());
    assert!(gate.is_armed());
}

#[test]
fn test_timer_failure_releases_output() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);
    timer.fail.set(true);

    let err = playback.start(0.25).unwrap_err();
    assert!(matches!(err, PlaybackError::Hardware(e) if e.resource == Resource::Timer));
    assert!(!playback.is_active());
    assert!(!gate.is_armed());
    assert_eq!(
        &pwm.calls()[2..],
        &[PwmCall::Release, PwmCall::Idle(true)]
    );
}

#[test]
fn test_table_error_touches_no_hardware() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);

    let err = playback.start(0.01).unwrap_err();
    assert!(matches!(
        err,
        PlaybackError::Table(TableError::TooLarge { .. })
    ));
    assert!(pwm.calls().is_empty());
    assert!(timer.calls().is_empty());
}

#[test]
fn test_acquired_table_matches_controller_table() {
    let (pwm, timer, gate) = (FakePwm::default(), FakeCountdown::default(), TimeoutGate::new());
    let mut playback = controller(&pwm, &timer, &gate);

    playback.start(2.0).unwrap();
    assert_eq!(
        pwm.last_table.borrow().as_slice(),
        playback.table().as_slice()
    );
}
