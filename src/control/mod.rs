//! Control loops.
//!
//! The engine services one loop per control interval, round-robin, then
//! refreshes the aggregate alarm flag.

pub mod alarms;
pub mod enable;
pub mod hysteresis;
pub mod loop_ctrl;

use crate::config::SystemConfig;
use crate::matrix::Source;
use crate::state::SystemState;
use crate::store::addr::{flag, LOOP_COUNT};
use crate::timing::IntervalGuard;

pub use loop_ctrl::{ControlLoop, DwellOutcome, DwellState, LoopConfig, LoopReport};

pub struct ControlEngine {
    guard: IntervalGuard,
    next: usize,
    loops: [ControlLoop; LOOP_COUNT],
}

impl ControlEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            guard: IntervalGuard::new(config.control_interval_ms),
            next: 0,
            loops: Source::LOOPS.map(ControlLoop::new),
        }
    }

    /// Service the next loop when the control interval has elapsed.
    pub fn service(&mut self, now_ms: u32, state: &mut SystemState) -> Option<LoopReport> {
        if !self.guard.ready(now_ms) {
            return None;
        }
        Some(self.step(now_ms, state))
    }

    /// Service the next loop unconditionally.
    pub fn step(&mut self, now_ms: u32, state: &mut SystemState) -> LoopReport {
        let report = self.loops[self.next].service(now_ms, state);
        self.next = (self.next + 1) % LOOP_COUNT;

        let any = (0..LOOP_COUNT)
            .any(|i| state.store.flag(flag::loop_flag(flag::LOOP_ALARM_BASE, i)));
        state.store.set_flag(flag::ANY_ALARM, any);
        report
    }

    pub fn control_loop(&self, index: usize) -> Option<&ControlLoop> {
        self.loops.get(index)
    }
}
