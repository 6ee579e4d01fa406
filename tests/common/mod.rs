//! Recording fakes for the hardware capabilities.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pwm_siggen::error::{HardwareError, Resource};
use pwm_siggen::hal::{CountdownTimer, PwmConfig, PwmOutput, ReferenceClock};

/// One call observed by `FakePwm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PwmCall {
    Acquire { top: u16, samples: usize },
    Release,
    Idle(bool),
}

/// PWM fake. Clones share the call log and the failure switch.
#[derive(Clone, Default)]
pub struct FakePwm {
    pub calls: Rc<RefCell<Vec<PwmCall>>>,
    pub fail: Rc<Cell<bool>>,
    pub last_table: Rc<RefCell<Vec<u16>>>,
}

impl FakePwm {
    pub fn calls(&self) -> Vec<PwmCall> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<PwmCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl PwmOutput for FakePwm {
    fn acquire(&mut self, config: &PwmConfig, table: &[u16]) -> Result<(), HardwareError> {
        self.calls.borrow_mut().push(PwmCall::Acquire {
            top: config.top_count,
            samples: table.len(),
        });
        if self.fail.get() {
            return Err(HardwareError::new(Resource::Pwm, -1));
        }
        *self.last_table.borrow_mut() = table.to_vec();
        Ok(())
    }

    fn release(&mut self) {
        self.calls.borrow_mut().push(PwmCall::Release);
    }

    fn drive_idle(&mut self, high: bool) {
        self.calls.borrow_mut().push(PwmCall::Idle(high));
    }
}

/// One call observed by `FakeCountdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCall {
    Restart(u32),
    Cancel,
}

#[derive(Clone, Default)]
pub struct FakeCountdown {
    pub calls: Rc<RefCell<Vec<TimerCall>>>,
    pub fail: Rc<Cell<bool>>,
}

impl FakeCountdown {
    pub fn calls(&self) -> Vec<TimerCall> {
        self.calls.borrow().clone()
    }
}

impl CountdownTimer for FakeCountdown {
    fn restart(&mut self, timeout_ms: u32) -> Result<(), HardwareError> {
        if self.fail.get() {
            return Err(HardwareError::new(Resource::Timer, -2));
        }
        self.calls.borrow_mut().push(TimerCall::Restart(timeout_ms));
        Ok(())
    }

    fn cancel(&mut self) {
        self.calls.borrow_mut().push(TimerCall::Cancel);
    }
}

#[derive(Default)]
pub struct FakeClock {
    pub starts: u32,
    pub fail: bool,
}

impl ReferenceClock for FakeClock {
    fn start(&mut self) -> Result<(), HardwareError> {
        if self.fail {
            return Err(HardwareError::new(Resource::Clock, -3));
        }
        self.starts += 1;
        Ok(())
    }
}
