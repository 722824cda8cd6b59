//! Wall-clock and duration driven sources.
//!
//! ```text
//!   clock registers ──▶ TimeOfDayGate ──▶ matrix row TimeOfDay (up to 4 targets)
//!   trigger flag ─────▶ TimeLimitedCommand ──▶ matrix row TimeLimited
//! ```
//!
//! Both sources publish once per tick.  Neither blocks: the time-limited
//! command polls the millisecond clock against its start stamp.

use heapless::Vec;
use log::info;

use crate::channel::{Channel, OutputId};
use crate::matrix::Source;
use crate::state::SystemState;
use crate::store::addr::{self, flag, TOD_OUTPUTS};
use crate::timing::elapsed_ms;

const MINUTES_PER_DAY: u16 = 24 * 60;

// ═══════════════════════════════════════════════════════════════
//  Time-of-day gate
// ═══════════════════════════════════════════════════════════════

/// A daily window in minutes after midnight, `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDayWindow {
    pub start_min: u16,
    pub stop_min: u16,
}

impl TimeOfDayWindow {
    pub fn from_hm(start_h: u16, start_m: u16, stop_h: u16, stop_m: u16) -> Self {
        Self {
            start_min: (start_h * 60 + start_m) % MINUTES_PER_DAY,
            stop_min: (stop_h * 60 + stop_m) % MINUTES_PER_DAY,
        }
    }

    /// Check a minute-of-day against the window.  `start > stop` wraps past
    /// midnight; `start == stop` is an empty window.
    pub fn contains(&self, minute_of_day: u16) -> bool {
        if self.start_min <= self.stop_min {
            minute_of_day >= self.start_min && minute_of_day < self.stop_min
        } else {
            minute_of_day >= self.start_min || minute_of_day < self.stop_min
        }
    }
}

#[derive(Debug, Default)]
pub struct TimeOfDayGate {
    active: bool,
}

impl TimeOfDayGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(state: &SystemState) -> TimeOfDayWindow {
        let s = &state.store;
        TimeOfDayWindow::from_hm(
            s.u16(addr::TOD_START_HOUR),
            s.u16(addr::TOD_START_MINUTE),
            s.u16(addr::TOD_STOP_HOUR),
            s.u16(addr::TOD_STOP_MINUTE),
        )
    }

    /// Evaluate the window and drive every target.  A closed or disabled
    /// gate holds its targets off.
    pub fn service(&mut self, state: &mut SystemState) -> bool {
        let now = state.store.u16(addr::HOUR) * 60 + state.store.u16(addr::MINUTE);
        let active = state.store.flag(flag::TOD_ENABLE)
            && !state.startup()
            && state.time_valid()
            && Self::window(state).contains(now);
        self.set_active(active);
        state.store.set_flag(flag::TOD_ACTIVE, active);

        let mut physical: Vec<OutputId, TOD_OUTPUTS> = Vec::new();
        for i in 0..TOD_OUTPUTS {
            let target: Channel = state.store.channel(addr::TOD_OUTPUT_BASE + i as u16);
            if let Some(out) = target.physical_output() {
                if !physical.contains(&out) {
                    // Capacity equals the number of target slots.
                    let _ = physical.push(out);
                }
            } else if let Some(v) = target.virtual_state_index() {
                state.store.set_flag(flag::VIRTUAL_STATE_BASE + v as u16, active);
            }
        }
        state
            .matrix
            .publish_many(Source::TimeOfDay, &physical, active);
        active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        if active != self.active {
            info!("Scheduler: time-of-day gate {}", if active { "open" } else { "closed" });
            self.active = active;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Time-limited command
// ═══════════════════════════════════════════════════════════════

/// Holds its command flag true for a configured number of seconds.
#[derive(Debug, Default)]
pub struct TimeLimitedCommand {
    started_ms: Option<u32>,
}

impl TimeLimitedCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&mut self, now_ms: u32, state: &mut SystemState) -> bool {
        let s = &mut state.store;
        if s.take_flag(flag::TLC_TRIGGER) {
            s.set_flag(flag::TLC_COMMAND, true);
            self.started_ms = Some(now_ms);
            info!("Scheduler: timed command triggered");
        }

        let mut command = s.flag(flag::TLC_COMMAND);
        if command {
            let duration_ms = u32::from(s.u16(addr::TLC_DURATION)) * 1000;
            let since = self.started_ms.get_or_insert(now_ms);
            if elapsed_ms(since, now_ms) >= duration_ms {
                info!("Scheduler: timed command expired");
                s.set_flag(flag::TLC_COMMAND, false);
                self.started_ms = None;
                command = false;
            }
        } else {
            self.started_ms = None;
        }

        let target = s.channel(addr::TLC_OUTPUT);
        state.drive_target(Source::TimeLimited, target, command);
        command
    }

    pub fn is_running(&self) -> bool {
        self.started_ms.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
