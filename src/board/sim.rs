//! Host dry-run.
//!
//! Simulated PWM, countdown and clock driven by a scripted button session
//! in simulated time. Prints the diagnostic log and a short summary.

use std::cell::Cell;

use pwm_siggen::error::HardwareError;
use pwm_siggen::hal::{
    ButtonBank, ButtonLine, CountdownTimer, PwmConfig, PwmOutput, ReferenceClock, TimeoutGate,
};
use pwm_siggen::{
    boot, diag_error, diag_info, diag_sink, EventBus, FaultState, PlaybackController, SignalLoop,
    CONFIG, DIAG_LOG,
};

/// Main loop period in simulated milliseconds.
const POLL_INTERVAL_MS: u32 = 10;

struct SimClock;

impl ReferenceClock for SimClock {
    fn start(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}

#[derive(Default)]
struct SimPwm {
    acquires: u32,
    samples: usize,
    top: u16,
    level_high: Option<bool>,
}

impl PwmOutput for SimPwm {
    fn acquire(&mut self, config: &PwmConfig, table: &[u16]) -> Result<(), HardwareError> {
        self.acquires += 1;
        self.samples = table.len();
        self.top = config.top_count;
        self.level_high = None;
        Ok(())
    }

    fn release(&mut self) {
        self.samples = 0;
    }

    fn drive_idle(&mut self, high: bool) {
        self.level_high = Some(high);
    }
}

struct SimCountdown<'c> {
    now_ms: &'c Cell<u32>,
    deadline_ms: Option<u32>,
}

impl CountdownTimer for SimCountdown<'_> {
    fn restart(&mut self, timeout_ms: u32) -> Result<(), HardwareError> {
        self.deadline_ms = Some(self.now_ms.get().wrapping_add(timeout_ms));
        Ok(())
    }

    fn cancel(&mut self) {
        self.deadline_ms = None;
    }
}

#[derive(Clone, Copy)]
enum Step {
    Press(ButtonLine),
    Wait(u32),
}

const START: ButtonLine = ButtonLine::Button3;
const STOP: ButtonLine = ButtonLine::Button2;
const UP: ButtonLine = ButtonLine::Button1;
const DOWN: ButtonLine = ButtonLine::Button0;

/// Start, retune, bounce, let the safety timer expire, restart, stop.
const SCRIPT: &[Step] = &[
    Step::Press(UP),
    Step::Wait(100),
    Step::Press(START),
    Step::Wait(100),
    Step::Press(UP),
    Step::Wait(20),
    Step::Press(UP),
    Step::Wait(100),
    Step::Press(DOWN),
    Step::Wait(31_000),
    Step::Press(START),
    Step::Wait(200),
    Step::Press(STOP),
    Step::Press(START),
    Step::Wait(100),
];

pub fn run() {
    println!("{} (host dry-run)", env!("VERSION_STRING"));

    let bus = EventBus::new();
    let gate = TimeoutGate::new();
    let buttons = ButtonBank::board();
    let fault = FaultState::new();
    let now_ms = Cell::new(0u32);

    if let Err(e) = boot(&mut SimClock, &CONFIG) {
        diag_error!(DIAG_LOG, 0, "boot failed: {}", e);
        print_log();
        return;
    }

    let countdown = SimCountdown {
        now_ms: &now_ms,
        deadline_ms: None,
    };
    let playback = PlaybackController::new(SimPwm::default(), countdown, &gate, CONFIG);
    let mut signal = SignalLoop::new(&bus, &fault, &DIAG_LOG, playback);
    diag_info!(DIAG_LOG, 0, "ready: {} Hz", signal.frequency());

    for step in SCRIPT {
        match *step {
            Step::Press(line) => {
                let _ = buttons.on_edge(line, now_ms.get(), &bus);
            }
            Step::Wait(ms) => {
                let mut waited = 0;
                while waited < ms {
                    now_ms.set(now_ms.get().wrapping_add(POLL_INTERVAL_MS));
                    waited += POLL_INTERVAL_MS;

                    let expired = signal
                        .playback()
                        .timer()
                        .deadline_ms
                        .is_some_and(|deadline| now_ms.get() >= deadline);
                    if expired {
                        gate.on_expired(&bus);
                    }

                    signal.poll(i64::from(now_ms.get()) * 1000);
                }
            }
        }
    }

    print_log();

    let pwm = signal.playback().pwm();
    println!(
        "state {:?} at {} Hz, {} acquires, last table {} x top {}, idle high {:?}",
        signal.state(),
        signal.frequency(),
        pwm.acquires,
        pwm.samples,
        pwm.top,
        pwm.level_high
    );
    println!(
        "events posted {}, collapsed {}, bounced {}, timeouts {}, faults {}",
        bus.posted(),
        bus.collapsed(),
        buttons.bounced(),
        gate.expirations(),
        fault.count()
    );
}

fn print_log() {
    let mut out = String::new();
    diag_sink::drain_into(&DIAG_LOG, &mut out);
    print!("{out}");
}
