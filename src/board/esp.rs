//! ESP-IDF board glue.
//!
//! - Reference clock: the esp_timer task service
//! - PWM: LEDC channel 0; a periodic esp_timer steps the duty through the
//!   table once per PWM cycle
//! - Safety countdown: one-shot esp_timer posting through `TimeoutGate`
//! - Buttons: GPIO falling-edge interrupts into `ButtonBank`
//! - Log sink: UART1 TX (stdout if the UART cannot be opened)
//!
//! Interrupt callbacks touch atomics only. Everything else runs in the
//! main task.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, InterruptType, Output, PinDriver, Pull};
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution, CHANNEL0, TIMER0};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{self, UartTxDriver, UART1};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{EspError, ESP_ERR_INVALID_STATE};
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use pwm_siggen::config::{BUTTON_PINS, LOG_BAUD_RATE, LOG_TX_PIN, MAX_TABLE_CAPACITY};
use pwm_siggen::error::{HardwareError, Resource};
use pwm_siggen::hal::{
    ButtonBank, ButtonLine, CountdownTimer, PwmConfig, PwmOutput, ReferenceClock, TimeoutGate,
};
use pwm_siggen::main_loop::BootError;
use pwm_siggen::{
    boot, diag_error, diag_info, diag_sink, EventBus, FaultState, PlaybackController, SignalLoop,
    CONFIG, DIAG_LOG,
};

static EVENT_BUS: EventBus = EventBus::new();
static TIMEOUT_GATE: TimeoutGate = TimeoutGate::new();
static BUTTONS: ButtonBank = ButtonBank::board();
static FAULT_STATE: FaultState = FaultState::new();

/// Main loop period.
const POLL_INTERVAL_MS: u32 = 10;

/// Shortest duty step the esp_timer service keeps up with.
const MIN_STEP_US: u32 = 50;

/// Above this PWM rate LEDC cannot hold 14-bit resolution.
const HIGH_RES_MAX_HZ: u32 = 1_000;

#[inline]
fn now_us() -> i64 {
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}

/// Millisecond tick for debounce (wraps after ~49 days).
#[inline]
fn now_ms() -> u32 {
    (now_us() / 1000) as u32
}

fn hw(resource: Resource) -> impl Fn(EspError) -> HardwareError {
    move |e| HardwareError::new(resource, e.code())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- Reference clock ---

#[derive(Default)]
struct TimerServiceClock {
    service: Option<EspTaskTimerService>,
}

impl TimerServiceClock {
    fn service(&self) -> Result<EspTaskTimerService, HardwareError> {
        self.service
            .clone()
            .ok_or(HardwareError::new(Resource::Clock, ESP_ERR_INVALID_STATE as i32))
    }
}

impl ReferenceClock for TimerServiceClock {
    fn start(&mut self) -> Result<(), HardwareError> {
        if self.service.is_none() {
            self.service = Some(EspTaskTimerService::new().map_err(hw(Resource::Clock))?);
        }
        Ok(())
    }
}

// --- PWM ---

/// Live LEDC playback, stepped from the timer task.
struct Stepper {
    // Declared before the timer driver: the channel stops first on drop.
    duty: LedcDriver<'static>,
    _timer: LedcTimerDriver<'static, TIMER0>,
    table: heapless::Vec<u32, MAX_TABLE_CAPACITY>,
    index: usize,
}

impl Stepper {
    fn step(&mut self) {
        if self.table.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.table.len();
        let _ = self.duty.set_duty(self.table[self.index]);
    }
}

struct LedcPwm {
    timer: TIMER0,
    channel: CHANNEL0,
    output_pin: u8,
    service: EspTaskTimerService,
    active: Arc<Mutex<Option<Stepper>>>,
    tick: Option<EspTimer<'static>>,
    idle: Option<PinDriver<'static, AnyOutputPin, Output>>,
}

impl LedcPwm {
    fn new(timer: TIMER0, channel: CHANNEL0, output_pin: u8, service: EspTaskTimerService) -> Self {
        Self {
            timer,
            channel,
            output_pin,
            service,
            active: Arc::new(Mutex::new(None)),
            tick: None,
            idle: None,
        }
    }

    fn start(&mut self, config: &PwmConfig, table: &[u16]) -> Result<(), EspError> {
        // Dropping the idle driver resets the pin for LEDC.
        self.idle = None;

        let cycle_hz = (config.base_clock_hz / u32::from(config.top_count.max(1))).max(1);
        let resolution = if cycle_hz <= HIGH_RES_MAX_HZ {
            Resolution::Bits14
        } else {
            Resolution::Bits8
        };

        // SAFETY: drivers built on these clones are dropped by `release()`,
        // which always runs before the next acquire.
        let (timer, channel, pin) = unsafe {
            (
                self.timer.clone_unchecked(),
                self.channel.clone_unchecked(),
                AnyOutputPin::new(i32::from(config.output_pin)),
            )
        };

        let timer = LedcTimerDriver::new(
            timer,
            &TimerConfig::new()
                .frequency(Hertz(cycle_hz))
                .resolution(resolution),
        )?;
        let mut duty = LedcDriver::new(channel, &timer, pin)?;

        let max_duty = duty.get_max_duty();
        let top = u32::from(config.top_count.max(1));
        let mut scaled = heapless::Vec::new();
        for &value in table {
            let _ = scaled.push(u32::from(value) * max_duty / top);
        }
        if let Some(&first) = scaled.first() {
            duty.set_duty(first)?;
        }
        duty.enable()?;

        *lock(&self.active) = Some(Stepper {
            duty,
            _timer: timer,
            table: scaled,
            index: 0,
        });

        let shared = Arc::clone(&self.active);
        let tick = self.service.timer(move || {
            if let Some(stepper) = lock(&shared).as_mut() {
                stepper.step();
            }
        })?;
        tick.every(Duration::from_micros(u64::from(
            (1_000_000 / cycle_hz).max(MIN_STEP_US),
        )))?;
        self.tick = Some(tick);
        Ok(())
    }
}

impl PwmOutput for LedcPwm {
    fn acquire(&mut self, config: &PwmConfig, table: &[u16]) -> Result<(), HardwareError> {
        match self.start(config, table) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.release();
                Err(HardwareError::new(Resource::Pwm, e.code()))
            }
        }
    }

    fn release(&mut self) {
        // Dropping the esp_timer cancels it.
        self.tick = None;
        *lock(&self.active) = None;
    }

    fn drive_idle(&mut self, high: bool) {
        // SAFETY: `release()` dropped the LEDC driver on this pin.
        let pin = unsafe { AnyOutputPin::new(i32::from(self.output_pin)) };
        if let Ok(mut out) = PinDriver::output(pin) {
            let _ = if high { out.set_high() } else { out.set_low() };
            self.idle = Some(out);
        }
    }
}

// --- Safety countdown ---

struct OneShotCountdown {
    timer: EspTimer<'static>,
}

impl OneShotCountdown {
    fn new(service: &EspTaskTimerService) -> Result<Self, HardwareError> {
        let timer = service
            .timer(|| {
                TIMEOUT_GATE.on_expired(&EVENT_BUS);
            })
            .map_err(hw(Resource::Timer))?;
        Ok(Self { timer })
    }
}

impl CountdownTimer for OneShotCountdown {
    fn restart(&mut self, timeout_ms: u32) -> Result<(), HardwareError> {
        let _ = self.timer.cancel();
        self.timer
            .after(Duration::from_millis(u64::from(timeout_ms)))
            .map_err(hw(Resource::Timer))
    }

    fn cancel(&mut self) {
        let _ = self.timer.cancel();
    }
}

// --- Buttons ---

fn init_buttons() -> Result<Vec<PinDriver<'static, AnyIOPin, Input>>, HardwareError> {
    let input = hw(Resource::Input);
    let mut drivers = Vec::with_capacity(BUTTON_PINS.len());

    for line in ButtonLine::ALL {
        // SAFETY: button pins are not claimed by any other driver.
        let pin = unsafe { AnyIOPin::new(i32::from(BUTTON_PINS[line.index()])) };
        let mut button = PinDriver::input(pin).map_err(&input)?;
        button.set_pull(Pull::Up).map_err(&input)?;
        button
            .set_interrupt_type(InterruptType::NegEdge)
            .map_err(&input)?;

        // SAFETY: the callback runs in ISR context and only touches atomics.
        unsafe {
            button
                .subscribe(move || {
                    let _ = BUTTONS.on_edge(line, now_ms(), &EVENT_BUS);
                })
                .map_err(&input)?;
        }
        button.enable_interrupt().map_err(&input)?;
        drivers.push(button);
    }
    Ok(drivers)
}

// --- Log sink ---

enum LogSink {
    Uart(UartTxDriver<'static>),
    Stdout,
}

impl LogSink {
    fn open(uart: UART1) -> Self {
        let config = uart::config::Config::default().baudrate(Hertz(LOG_BAUD_RATE));
        // SAFETY: the log TX pin is reserved for the console.
        let tx = unsafe { AnyOutputPin::new(i32::from(LOG_TX_PIN)) };

        match UartTxDriver::new(
            uart,
            tx,
            Option::<AnyIOPin>::None, // CTS
            Option::<AnyIOPin>::None, // RTS
            &config,
        ) {
            Ok(driver) => LogSink::Uart(driver),
            Err(_) => LogSink::Stdout,
        }
    }
}

impl fmt::Write for LogSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self {
            LogSink::Uart(tx) => tx.write(s.as_bytes()).map(|_| ()).map_err(|_| fmt::Error),
            LogSink::Stdout => {
                print!("{s}");
                Ok(())
            }
        }
    }
}

// --- Entry ---

pub fn run() {
    esp_idf_svc::sys::link_patches();

    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => {
            println!("peripherals unavailable: {e}");
            return;
        }
    };

    let mut sink = LogSink::open(peripherals.uart1);
    diag_info!(DIAG_LOG, now_us(), "{}", env!("VERSION_STRING"));

    if let Err(e) = serve(peripherals.ledc.timer0, peripherals.ledc.channel0, &mut sink) {
        diag_error!(DIAG_LOG, now_us(), "boot failed: {}", e);
    }

    loop {
        diag_sink::drain_into(&DIAG_LOG, &mut sink);
        FreeRtos::delay_ms(1000);
    }
}

fn serve(timer: TIMER0, channel: CHANNEL0, sink: &mut LogSink) -> Result<(), BootError> {
    let mut clock = TimerServiceClock::default();
    boot(&mut clock, &CONFIG)?;
    let service = clock.service()?;

    let mut pwm = LedcPwm::new(timer, channel, CONFIG.output_pin, service.clone());
    pwm.drive_idle(CONFIG.idle_high);
    let countdown = OneShotCountdown::new(&service)?;
    let mut buttons = init_buttons()?;

    let playback = PlaybackController::new(pwm, countdown, &TIMEOUT_GATE, CONFIG);
    let mut signal = SignalLoop::new(&EVENT_BUS, &FAULT_STATE, &DIAG_LOG, playback);

    let (min_hz, max_hz) = signal.fsm().bounds();
    diag_info!(
        DIAG_LOG,
        now_us(),
        "ready: {} Hz, range {}..{} Hz, timeout {} ms",
        signal.frequency(),
        min_hz,
        max_hz,
        CONFIG.safety_timeout_ms
    );

    loop {
        signal.poll(now_us());

        // GPIO interrupts disarm themselves after each edge.
        for button in buttons.iter_mut() {
            let _ = button.enable_interrupt();
        }

        diag_sink::drain_into(&DIAG_LOG, sink);
        FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }
}
