//! Two-input logic gate.

use log::debug;

use crate::channel::{Channel, LogicFn};
use crate::matrix::Source;
use crate::state::SystemState;
use crate::store::addr::{self, flag};

/// Stateless apart from the last result, which is kept for logging.
#[derive(Debug, Default)]
pub struct LogicGate {
    last: Option<bool>,
}

impl LogicGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the configured function and publish the result.
    pub fn service(&mut self, state: &mut SystemState) -> bool {
        let s = &state.store;
        let a = state.digital(s.channel(addr::LOGIC_IN_A));
        let b = state.digital(s.channel(addr::LOGIC_IN_B));
        let function = LogicFn::from_raw(s.u16(addr::LOGIC_FUNCTION)).unwrap_or_default();
        let target: Channel = s.channel(addr::LOGIC_OUTPUT);

        let result = function.apply(a, b);
        if self.last != Some(result) {
            debug!("Logic: {function:?}({a}, {b}) = {result}");
            self.last = Some(result);
        }
        state.store.set_flag(flag::LOGIC_RESULT, result);
        state.drive_target(Source::Logic, target, result);
        result
    }
}
