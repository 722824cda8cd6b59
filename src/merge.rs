//! Two-channel merge into the processed reading.

use log::debug;

use crate::channel::{Channel, MergeFn, Units};
use crate::config::SystemConfig;
use crate::state::{Reading, SystemState};
use crate::store::addr::{self, flag};
use crate::timing::IntervalGuard;

/// Combine two readings.
///
/// Sum and difference need both inputs.  Every other function passes a lone
/// valid input straight through; priority always prefers A.
pub fn combine(function: MergeFn, a: Reading, b: Reading) -> Reading {
    match (a.valid, b.valid) {
        (false, false) => Reading::INVALID,
        (true, true) => Reading::valid(match function {
            MergeFn::Average => (a.value + b.value) / 2.0,
            MergeFn::Min => a.value.min(b.value),
            MergeFn::Max => a.value.max(b.value),
            MergeFn::Sum => a.value + b.value,
            MergeFn::Difference => a.value - b.value,
            MergeFn::Priority => a.value,
        }),
        _ if matches!(function, MergeFn::Sum | MergeFn::Difference) => Reading::INVALID,
        (true, false) => a,
        (false, true) => b,
    }
}

fn mergeable(ch: Channel) -> bool {
    ch.is_analog() && ch != Channel::ProcessedReading
}

pub struct MergeEngine {
    guard: IntervalGuard,
}

impl MergeEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            guard: IntervalGuard::new(config.merge_interval_ms),
        }
    }

    pub fn service(&mut self, now_ms: u32, state: &mut SystemState) -> Option<Reading> {
        if !self.guard.ready(now_ms) {
            return None;
        }
        Some(self.update(state))
    }

    /// Recompute the processed reading unconditionally.
    pub fn update(&mut self, state: &mut SystemState) -> Reading {
        let a_ch = state.store.channel(addr::MERGE_A);
        let b_ch = state.store.channel(addr::MERGE_B);
        let function = MergeFn::from_raw(state.store.u16(addr::MERGE_FUNCTION)).unwrap_or_default();

        let (result, units) = if mergeable(a_ch) && mergeable(b_ch) {
            let a = state.reading(a_ch);
            let b = state.reading(b_ch);
            let result = combine(function, a, b);
            let units = if a.valid || !b.valid {
                state.units(a_ch)
            } else {
                state.units(b_ch)
            };
            (result, units)
        } else {
            (Reading::INVALID, Units::None)
        };

        if !result.valid {
            debug!("Merge: {a_ch:?}/{b_ch:?} {function:?} invalid");
        }
        let s = &mut state.store;
        s.set_f32(addr::PROCESSED_VALUE, if result.valid { result.value } else { 0.0 });
        s.set_flag(flag::PROCESSED_VALID, result.valid);
        s.set_units(addr::PROCESSED_UNITS, units);
        result
    }
}
