//! Register and flag address map.
//!
//! Single source of truth for the flat address space: every module
//! addresses the store through these constants rather than literals.
//! Floats and 32-bit integers occupy two consecutive registers, low word
//! first.

use crate::channel::{Channel, OutputId};

/// Number of 16-bit data registers.
pub const DATA_SIZE: u16 = 320;
/// Number of boolean status flags.
pub const STATUS_SIZE: u16 = 72;
/// Registers below this address are cleared by a defaults load; the
/// credential block above it survives.
pub const DATA_CLEAR_SIZE: u16 = 300;

/// Registers occupied by a packed string (two characters per register).
pub const STRING_REGS: u16 = 8;
/// Characters a packed string can hold.
pub const STRING_CHARS: usize = (STRING_REGS * 2) as usize;

/// Number of control loops.
pub const LOOP_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// System block
// ---------------------------------------------------------------------------

pub const STATUS_CODE: u16 = 0;
pub const MODEL_NUMBER: u16 = 1;
pub const SERIAL_NUMBER: u16 = 2;
pub const FIRMWARE_REV: u16 = 3;
pub const HEARTBEAT_IN: u16 = 4;
pub const HEARTBEAT_OUT: u16 = 5;
pub const DISPLAY_A: u16 = 8;
pub const DISPLAY_B: u16 = 9;
pub const TIMEZONE: u16 = 10;
pub const YEAR: u16 = 11;
pub const MONTH: u16 = 12;
pub const DAY: u16 = 13;
pub const HOUR: u16 = 14;
pub const MINUTE: u16 = 15;
pub const SECOND: u16 = 16;

// ---------------------------------------------------------------------------
// Readings, units, calibration
// ---------------------------------------------------------------------------

/// First analog value (WQ amplifier); channel `n` sits at `+ 2 * (n - 1)`.
pub const READING_BASE: u16 = 20;
pub const WQ_VALUE: u16 = 20;
pub const TEMP1_VALUE: u16 = 22;
pub const TEMP2_VALUE: u16 = 24;
pub const ANALOG1_VALUE: u16 = 26;
pub const ANALOG2_VALUE: u16 = 28;
pub const INTERNAL_TEMP_VALUE: u16 = 30;
pub const SUPPLY_VALUE: u16 = 32;
pub const PROCESSED_VALUE: u16 = 34;

/// Unit code of analog channel `n` at `UNITS_BASE + n - 1`.
pub const UNITS_BASE: u16 = 36;
pub const PROCESSED_UNITS: u16 = 43;
/// Channel used for pH temperature compensation.
pub const PH_COMP_SOURCE: u16 = 44;

/// Calibration offsets (floats) for WQ, Temp1, Temp2, Analog1, Analog2.
pub const OFFSET_BASE: u16 = 50;
/// Calibration gains (floats), same order.
pub const GAIN_BASE: u16 = 60;
pub const CALIBRATED_CHANNELS: usize = 5;

// ---------------------------------------------------------------------------
// Control loops
// ---------------------------------------------------------------------------

pub const LOOP_BASE: u16 = 70;
pub const LOOP_STRIDE: u16 = 16;

/// Register offsets within one loop block.
pub mod loop_reg {
    pub const INPUT: u16 = 0;
    pub const OUTPUT: u16 = 1;
    pub const SETPOINT: u16 = 2;
    pub const HYSTERESIS: u16 = 4;
    pub const ALARM_LOW: u16 = 6;
    pub const ALARM_HIGH: u16 = 8;
    pub const ENABLE_SOURCE: u16 = 10;
    pub const MIN_ON_TIME: u16 = 11;
    pub const MINIMUM: u16 = 12;
    pub const MAXIMUM: u16 = 14;
}

/// Absolute address of `offset` in loop block `index` (0-based).
pub const fn loop_addr(index: usize, offset: u16) -> u16 {
    LOOP_BASE + index as u16 * LOOP_STRIDE + offset
}

// ---------------------------------------------------------------------------
// Auxiliary modules
// ---------------------------------------------------------------------------

pub const LOGIC_IN_A: u16 = 136;
pub const LOGIC_IN_B: u16 = 137;
pub const LOGIC_FUNCTION: u16 = 138;
pub const LOGIC_OUTPUT: u16 = 139;

pub const TOD_START_HOUR: u16 = 140;
pub const TOD_START_MINUTE: u16 = 141;
pub const TOD_STOP_HOUR: u16 = 142;
pub const TOD_STOP_MINUTE: u16 = 143;
pub const TOD_OUTPUT_BASE: u16 = 144;
pub const TOD_OUTPUTS: usize = 4;

pub const TLC_OUTPUT: u16 = 148;
/// Time-limited command duration in seconds.
pub const TLC_DURATION: u16 = 149;

pub const COUNT_SOURCE: u16 = 150;
pub const COUNTER: u16 = 151;
pub const COUNT_RESET_INTERVAL: u16 = 153;
pub const TIMER_SOURCE: u16 = 154;
pub const TIMER: u16 = 155;
pub const TIMER_RESET_INTERVAL: u16 = 157;
pub const FREQUENCY: u16 = 158;

pub const MERGE_A: u16 = 166;
pub const MERGE_B: u16 = 167;
pub const MERGE_FUNCTION: u16 = 168;

// ---------------------------------------------------------------------------
// Names and credentials
// ---------------------------------------------------------------------------

pub const MODEL_NAME: u16 = 170;
/// Names of analog channels 1..=8, one string block each.
pub const CHANNEL_NAME_BASE: u16 = 178;
/// Names of the four loops.
pub const LOOP_NAME_BASE: u16 = 242;
/// Names of the two digital inputs.
pub const INPUT_NAME_BASE: u16 = 274;
pub const TOD_NAME: u16 = 290;

pub const WIFI_SSID: u16 = 300;
pub const WIFI_PASSWORD: u16 = 308;

// ---------------------------------------------------------------------------
// Status flags
// ---------------------------------------------------------------------------

pub mod flag {
    pub const STATUS: u16 = 0;
    pub const TIME_VALID: u16 = 1;
    pub const STARTUP: u16 = 2;
    pub const SAVE_REQUEST: u16 = 3;
    pub const DEFAULTS_REQUEST: u16 = 4;
    pub const SILENCE: u16 = 7;
    pub const DIGITAL_IN_1: u16 = 8;
    pub const DIGITAL_IN_2: u16 = 9;
    /// Physical output state, relay 1 .. digital out 2.
    pub const OUTPUT_STATUS_BASE: u16 = 10;
    /// Manual request for an unowned physical output.
    pub const OUTPUT_REQUEST_BASE: u16 = 14;
    pub const VIRTUAL_STATE_BASE: u16 = 18;
    /// Validity of analog channel `n` at `VALID_BASE + n - 1`.
    pub const VALID_BASE: u16 = 20;
    pub const PROCESSED_VALID: u16 = 27;
    pub const LOGIC_RESULT: u16 = 28;
    pub const FLASHER: u16 = 29;
    pub const LOOP_ENABLE_BASE: u16 = 30;
    pub const LOOP_HIGH_ACTING_BASE: u16 = 34;
    pub const LOOP_ACTIVE_BASE: u16 = 38;
    pub const ANY_ALARM: u16 = 42;
    pub const LOOP_ALARM_BASE: u16 = 43;
    pub const LOOP_ALARM_LOW_BASE: u16 = 47;
    pub const LOOP_ALARM_HIGH_BASE: u16 = 51;
    pub const LOOP_RESET_MINMAX_BASE: u16 = 55;
    pub const TOD_ENABLE: u16 = 61;
    pub const TOD_ACTIVE: u16 = 62;
    pub const RESET_COUNTER: u16 = 63;
    pub const RESET_TIMER: u16 = 64;
    pub const LOOP_ONE_SHOT_BASE: u16 = 66;
    pub const TLC_TRIGGER: u16 = 70;
    pub const TLC_COMMAND: u16 = 71;

    pub const fn output_status(out: crate::channel::OutputId) -> u16 {
        OUTPUT_STATUS_BASE + out.index() as u16
    }

    pub const fn output_request(out: crate::channel::OutputId) -> u16 {
        OUTPUT_REQUEST_BASE + out.index() as u16
    }

    pub const fn loop_flag(base: u16, index: usize) -> u16 {
        base + index as u16
    }
}

// ---------------------------------------------------------------------------
// Channel resolution
// ---------------------------------------------------------------------------

/// Zero-based slot of an analog channel.
const fn analog_slot(ch: Channel) -> Option<u16> {
    if ch.is_analog() {
        Some(ch.raw() - Channel::WqAmp.raw())
    } else {
        None
    }
}

/// Float register holding an analog channel's engineering value.
pub const fn value_addr(ch: Channel) -> Option<u16> {
    match analog_slot(ch) {
        Some(slot) => Some(READING_BASE + 2 * slot),
        None => None,
    }
}

/// Flag holding an analog channel's validity.
pub const fn valid_flag(ch: Channel) -> Option<u16> {
    match analog_slot(ch) {
        Some(slot) => Some(flag::VALID_BASE + slot),
        None => None,
    }
}

/// Register holding an analog channel's unit code.
pub const fn units_addr(ch: Channel) -> Option<u16> {
    match analog_slot(ch) {
        Some(slot) => Some(UNITS_BASE + slot),
        None => None,
    }
}

/// Flag holding a digital channel's state.
pub const fn digital_flag(ch: Channel) -> Option<u16> {
    use Channel::*;
    let r = ch.raw();
    match ch {
        DigitalIn1 => Some(flag::DIGITAL_IN_1),
        DigitalIn2 => Some(flag::DIGITAL_IN_2),
        Relay1 | Relay2 | DigitalOut1 | DigitalOut2 => {
            Some(flag::OUTPUT_STATUS_BASE + r - Relay1.raw())
        }
        VirtualState1 | VirtualState2 => Some(flag::VIRTUAL_STATE_BASE + r - VirtualState1.raw()),
        Loop1 | Loop2 | Loop3 | Loop4 => Some(flag::LOOP_ACTIVE_BASE + r - Loop1.raw()),
        AnyAlarm => Some(flag::ANY_ALARM),
        Loop1Alarm | Loop2Alarm | Loop3Alarm | Loop4Alarm => {
            Some(flag::LOOP_ALARM_BASE + r - Loop1Alarm.raw())
        }
        Loop1AlarmLow | Loop2AlarmLow | Loop3AlarmLow | Loop4AlarmLow => {
            Some(flag::LOOP_ALARM_LOW_BASE + r - Loop1AlarmLow.raw())
        }
        Loop1AlarmHigh | Loop2AlarmHigh | Loop3AlarmHigh | Loop4AlarmHigh => {
            Some(flag::LOOP_ALARM_HIGH_BASE + r - Loop1AlarmHigh.raw())
        }
        Flasher => Some(flag::FLASHER),
        TimeOfDay => Some(flag::TOD_ACTIVE),
        // `None` here would name `Channel::None` through the glob import.
        _ => Option::None,
    }
}

/// Offset and gain registers of a user-calibratable channel.
pub const fn calibration_addrs(ch: Channel) -> Option<(u16, u16)> {
    match ch {
        Channel::WqAmp | Channel::Temp1 | Channel::Temp2 | Channel::Analog1 | Channel::Analog2 => {
            let slot = match ch {
                Channel::WqAmp => 0,
                Channel::Temp1 => 1,
                Channel::Temp2 => 2,
                Channel::Analog1 => 3,
                _ => 4,
            };
            Some((OFFSET_BASE + 2 * slot, GAIN_BASE + 2 * slot))
        }
        _ => None,
    }
}

/// Name block of an analog channel.
pub const fn channel_name_addr(ch: Channel) -> Option<u16> {
    match analog_slot(ch) {
        Some(slot) => Some(CHANNEL_NAME_BASE + STRING_REGS * slot),
        None => None,
    }
}

/// Digital state flag of a physical output.
pub const fn output_flag(out: OutputId) -> u16 {
    flag::output_status(out)
}
