//! Loop alarm evaluation.

use crate::state::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmState {
    pub low: bool,
    pub high: bool,
}

impl AlarmState {
    pub const CLEAR: AlarmState = AlarmState {
        low: false,
        high: false,
    };
    pub const BOTH: AlarmState = AlarmState {
        low: true,
        high: true,
    };

    pub fn any(&self) -> bool {
        self.low || self.high
    }
}

/// Inputs to one alarm evaluation.
#[derive(Debug, Clone, Copy)]
pub struct AlarmInput {
    /// Enable off, startup lockout or silence.  Time-domain inputs ignore it.
    pub suppressed: bool,
    pub time_input: bool,
    pub time_valid: bool,
    pub reading: Reading,
    pub low_limit: f32,
    pub high_limit: f32,
}

pub fn evaluate(input: &AlarmInput) -> AlarmState {
    // Time-domain loops alarm on lost time and nothing else.
    if input.time_input {
        return if input.time_valid {
            AlarmState::CLEAR
        } else {
            AlarmState::BOTH
        };
    }
    if input.suppressed {
        return AlarmState::CLEAR;
    }
    if !input.reading.valid {
        return AlarmState::BOTH;
    }
    AlarmState {
        low: input.reading.value < input.low_limit,
        high: input.reading.value > input.high_limit,
    }
}
