//! Event counter, frequency window and run-time timer.
//!
//! The counter and the timer watch independently selected digital channels.
//! Both accumulators live in the store as `u32` register pairs so they
//! persist with the rest of the settings image.

use log::info;

use crate::channel::{Channel, ResetInterval};
use crate::config::SystemConfig;
use crate::state::SystemState;
use crate::store::addr::{self, flag};
use crate::timing::IntervalGuard;

/// Highest frequency reported, in events per second.
pub const MAX_FREQUENCY: u32 = 1000;

/// Wall-clock position used to detect hour/day/month rollovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    month: u16,
    day: u16,
    hour: u16,
}

impl Stamp {
    fn read(state: &SystemState) -> Self {
        Self {
            month: state.store.u16(addr::MONTH),
            day: state.store.u16(addr::DAY),
            hour: state.store.u16(addr::HOUR),
        }
    }

    /// True when moving from `self` to `next` crosses `interval`.
    fn crosses(&self, next: &Stamp, interval: ResetInterval) -> bool {
        let month = self.month != next.month;
        let day = month || self.day != next.day;
        let hour = day || self.hour != next.hour;
        match interval {
            ResetInterval::Never => false,
            ResetInterval::Hourly => hour,
            ResetInterval::Daily => day,
            ResetInterval::Monthly => month,
        }
    }
}

pub struct EventCounter {
    last_count_level: Option<bool>,
    window: IntervalGuard,
    window_events: u32,
    second: IntervalGuard,
    stamp: Option<Stamp>,
}

impl EventCounter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            last_count_level: None,
            window: IntervalGuard::new(config.frequency_window_ms.max(1)),
            window_events: 0,
            second: IntervalGuard::new(1000),
            stamp: None,
        }
    }

    pub fn service(&mut self, now_ms: u32, state: &mut SystemState) {
        let count_source = state.store.channel(addr::COUNT_SOURCE);
        let timer_source = state.store.channel(addr::TIMER_SOURCE);
        self.service_periodic_resets(state);

        // ── Counter ───────────────────────────────────────────────
        if state.store.take_flag(flag::RESET_COUNTER) {
            info!("Counter: counter reset");
            state.store.set_u32(addr::COUNTER, 0);
        }
        if count_source == Channel::None {
            state.store.set_u32(addr::COUNTER, 0);
            self.last_count_level = None;
        } else {
            let level = state.digital(count_source);
            if self.last_count_level == Some(false) && level {
                let n = state.store.u32(addr::COUNTER).wrapping_add(1);
                state.store.set_u32(addr::COUNTER, n);
                self.window_events = self.window_events.saturating_add(1);
            }
            self.last_count_level = Some(level);
        }

        if self.window.ready(now_ms) {
            let per_second =
                u64::from(self.window_events) * 1000 / u64::from(self.window.period_ms());
            let freq = per_second.min(u64::from(MAX_FREQUENCY)) as u16;
            state.store.set_u16(addr::FREQUENCY, freq);
            self.window_events = 0;
        }

        // ── Timer ─────────────────────────────────────────────────
        if state.store.take_flag(flag::RESET_TIMER) {
            info!("Counter: timer reset");
            state.store.set_u32(addr::TIMER, 0);
        }
        if timer_source == Channel::None {
            state.store.set_u32(addr::TIMER, 0);
        } else if self.second.ready(now_ms) && state.digital(timer_source) {
            let t = state.store.u32(addr::TIMER).saturating_add(1);
            state.store.set_u32(addr::TIMER, t);
        }
    }

    fn service_periodic_resets(&mut self, state: &mut SystemState) {
        if !state.time_valid() {
            return;
        }
        let now = Stamp::read(state);
        let Some(prev) = self.stamp.replace(now) else {
            return;
        };
        let count_interval =
            ResetInterval::from_raw(state.store.u16(addr::COUNT_RESET_INTERVAL)).unwrap_or_default();
        let timer_interval =
            ResetInterval::from_raw(state.store.u16(addr::TIMER_RESET_INTERVAL)).unwrap_or_default();
        if prev.crosses(&now, count_interval) {
            info!("Counter: {count_interval:?} counter reset");
            state.store.set_u32(addr::COUNTER, 0);
        }
        if prev.crosses(&now, timer_interval) {
            info!("Counter: {timer_interval:?} timer reset");
            state.store.set_u32(addr::TIMER, 0);
        }
    }
}
