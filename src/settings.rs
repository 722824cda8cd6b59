//! Factory defaults and the configuration limit pass.
//!
//! Remote writes land in the store unchecked.  [`enforce_limits`] runs
//! before the next tick (see [`StateStore::request_limit_check`]) and pulls
//! every selector back into its category and every number into its range,
//! then rebuilds the output ownership table.

use log::{info, warn};

use crate::channel::{Channel, LogicFn, MergeFn, ResetInterval, Units};
use crate::config::SystemConfig;
use crate::matrix::Source;
use crate::state::SystemState;
use crate::store::StateStore;
use crate::store::addr::{self, flag, loop_addr, loop_reg, LOOP_COUNT, STRING_REGS, TOD_OUTPUTS};

pub const MODEL_NAME: &str = "SymbCtrl Mk2";
pub const DEFAULT_TIMEZONE: i16 = -10;
pub const TIMEZONE_MIN: i16 = -12;
pub const TIMEZONE_MAX: i16 = 14;
pub const MAX_DWELL_SECS: u16 = 3600;

const CHANNEL_NAMES: [&str; 8] = [
    "Water quality",
    "Temp 1",
    "Temp 2",
    "Analog 1",
    "Analog 2",
    "Internal temp",
    "Supply",
    "Processed",
];

/// Firmware revision as `major * 256 + minor`.
pub fn firmware_rev() -> u16 {
    let major: u16 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0);
    let minor: u16 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0);
    major * 256 + minor
}

// ═══════════════════════════════════════════════════════════════
//  Defaults
// ═══════════════════════════════════════════════════════════════

/// Reset every setting to factory values.  Stored credentials survive.
pub fn load_defaults(store: &mut StateStore, config: &SystemConfig) {
    store.clear_data_below(addr::DATA_CLEAR_SIZE);
    store.clear_status();

    store.set_u16(addr::MODEL_NUMBER, config.model_number);
    store.set_u16(addr::SERIAL_NUMBER, config.serial_number);
    store.set_u16(addr::FIRMWARE_REV, firmware_rev());
    store.set_channel(addr::DISPLAY_A, Channel::WqAmp);
    store.set_channel(addr::DISPLAY_B, Channel::Temp1);
    store.set_i16(addr::TIMEZONE, DEFAULT_TIMEZONE);

    let units = [
        Units::Ph,
        Units::DegC,
        Units::DegC,
        Units::Volt,
        Units::Volt,
        Units::DegC,
        Units::Volt,
    ];
    for (i, u) in units.into_iter().enumerate() {
        store.set_units(addr::UNITS_BASE + i as u16, u);
    }
    for i in 0..addr::CALIBRATED_CHANNELS as u16 {
        store.set_f32(addr::GAIN_BASE + 2 * i, 1.0);
    }

    for i in 0..LOOP_COUNT {
        store.set_f32(loop_addr(i, loop_reg::SETPOINT), 1.0);
        store.set_f32(loop_addr(i, loop_reg::HYSTERESIS), 1.0);
        store.set_f32(loop_addr(i, loop_reg::ALARM_LOW), 0.0);
        store.set_f32(loop_addr(i, loop_reg::ALARM_HIGH), 2.0);
        store.set_flag(flag::loop_flag(flag::LOOP_HIGH_ACTING_BASE, i), true);
        store.set_flag(flag::loop_flag(flag::LOOP_RESET_MINMAX_BASE, i), true);
    }

    store.set_u16(addr::TOD_START_HOUR, 6);
    store.set_u16(addr::TOD_STOP_HOUR, 18);

    store.set_string(addr::MODEL_NAME, MODEL_NAME);
    for (i, name) in CHANNEL_NAMES.iter().enumerate() {
        store.set_string(addr::CHANNEL_NAME_BASE + STRING_REGS * i as u16, name);
    }
    for i in 0..LOOP_COUNT {
        let mut name = crate::store::RegString::new();
        let _ = core::fmt::write(&mut name, format_args!("Control {}", i + 1));
        store.set_string(addr::LOOP_NAME_BASE + STRING_REGS * i as u16, &name);
    }
    store.set_string(addr::INPUT_NAME_BASE, "Input 1");
    store.set_string(addr::INPUT_NAME_BASE + STRING_REGS, "Input 2");
    store.set_string(addr::TOD_NAME, "Time of day");
    info!("Settings: factory defaults loaded");
}

// ═══════════════════════════════════════════════════════════════
//  Limit pass
// ═══════════════════════════════════════════════════════════════

/// Counts corrections made during one limit pass.
struct Limiter<'a> {
    store: &'a mut StateStore,
    corrections: u16,
}

impl Limiter<'_> {
    /// Reset a selector to `None` unless it decodes and satisfies `ok`.
    fn channel(&mut self, at: u16, ok: impl Fn(Channel) -> bool) -> Channel {
        let raw = self.store.u16(at);
        match Channel::from_raw(raw) {
            Some(ch) if ch.is_none() || ok(ch) => ch,
            _ => {
                self.reset_channel(at);
                Channel::None
            }
        }
    }

    fn reset_channel(&mut self, at: u16) {
        self.store.set_channel(at, Channel::None);
        self.corrections += 1;
    }

    fn clamp(&mut self, at: u16, max: u16) {
        let v = self.store.u16(at);
        if v > max {
            self.store.set_u16(at, max);
            self.corrections += 1;
        }
    }

    fn clamp_i16(&mut self, at: u16, min: i16, max: i16) {
        let v = self.store.i16(at);
        let c = v.clamp(min, max);
        if c != v {
            self.store.set_i16(at, c);
            self.corrections += 1;
        }
    }

    /// General-purpose unit codes: anything past the sensor range clamps.
    fn units(&mut self, at: u16) {
        self.clamp(at, Units::MAX_SENSOR);
    }

    /// Temperature channels only report °C or °F.
    fn temperature_units(&mut self, at: u16) {
        if !self.store.units(at).is_temperature() {
            self.store.set_units(at, Units::DegC);
            self.corrections += 1;
        }
    }
}

fn loop_input(ch: Channel) -> bool {
    ch.is_analog() || ch.is_time_domain()
}

fn merge_input(ch: Channel) -> bool {
    ch.is_analog() && ch != Channel::ProcessedReading
}

/// Category and range corrections followed by the ownership pass.
/// Returns the number of corrections.
pub fn enforce_limits(state: &mut SystemState) -> u16 {
    let mut lim = Limiter {
        store: &mut state.store,
        corrections: 0,
    };

    // ── System ────────────────────────────────────────────────────
    lim.channel(addr::DISPLAY_A, |_| true);
    lim.channel(addr::DISPLAY_B, |_| true);
    lim.clamp_i16(addr::TIMEZONE, TIMEZONE_MIN, TIMEZONE_MAX);

    // ── Acquisition ───────────────────────────────────────────────
    for ch in [Channel::WqAmp, Channel::Analog1, Channel::Analog2] {
        if let Some(at) = addr::units_addr(ch) {
            lim.units(at);
        }
    }
    for ch in [Channel::Temp1, Channel::Temp2, Channel::InternalTemp] {
        if let Some(at) = addr::units_addr(ch) {
            lim.temperature_units(at);
        }
    }
    lim.channel(addr::PH_COMP_SOURCE, |_| true);

    // ── Loops ─────────────────────────────────────────────────────
    for i in 0..LOOP_COUNT {
        lim.channel(loop_addr(i, loop_reg::INPUT), loop_input);
        let output = lim.channel(loop_addr(i, loop_reg::OUTPUT), Channel::is_output);
        let enable = lim.channel(loop_addr(i, loop_reg::ENABLE_SOURCE), Channel::is_digital);
        if !enable.is_none() && enable == output {
            lim.reset_channel(loop_addr(i, loop_reg::ENABLE_SOURCE));
        }
        lim.clamp(loop_addr(i, loop_reg::MIN_ON_TIME), MAX_DWELL_SECS);
    }

    // ── Logic gate ────────────────────────────────────────────────
    let a = lim.channel(addr::LOGIC_IN_A, Channel::is_digital);
    let b = lim.channel(addr::LOGIC_IN_B, Channel::is_digital);
    lim.clamp(addr::LOGIC_FUNCTION, LogicFn::MAX_RAW);
    let out = lim.channel(addr::LOGIC_OUTPUT, Channel::is_output);
    if !out.is_none() && (out == a || out == b) {
        lim.reset_channel(addr::LOGIC_OUTPUT);
    }

    // ── Time of day and time-limited command ──────────────────────
    lim.clamp(addr::TOD_START_HOUR, 23);
    lim.clamp(addr::TOD_STOP_HOUR, 23);
    lim.clamp(addr::TOD_START_MINUTE, 59);
    lim.clamp(addr::TOD_STOP_MINUTE, 59);
    for i in 0..TOD_OUTPUTS as u16 {
        lim.channel(addr::TOD_OUTPUT_BASE + i, Channel::is_output);
    }
    lim.channel(addr::TLC_OUTPUT, Channel::is_output);

    // ── Counter / timer ───────────────────────────────────────────
    lim.channel(addr::COUNT_SOURCE, Channel::is_digital);
    lim.channel(addr::TIMER_SOURCE, Channel::is_digital);
    lim.clamp(addr::COUNT_RESET_INTERVAL, ResetInterval::MAX_RAW);
    lim.clamp(addr::TIMER_RESET_INTERVAL, ResetInterval::MAX_RAW);

    // ── Merge ─────────────────────────────────────────────────────
    lim.channel(addr::MERGE_A, merge_input);
    lim.channel(addr::MERGE_B, merge_input);
    lim.clamp(addr::MERGE_FUNCTION, MergeFn::MAX_RAW);

    let mut corrections = lim.corrections;
    corrections += rebuild_ownership(state);
    if corrections > 0 {
        info!("Settings: limit pass made {corrections} corrections");
    }
    corrections
}

/// Claim physical outputs in priority order, dropping later claimants.
fn rebuild_ownership(state: &mut SystemState) -> u16 {
    let mut claims: heapless::Vec<(Source, u16), 10> = heapless::Vec::new();
    for (i, source) in Source::LOOPS.into_iter().enumerate() {
        let _ = claims.push((source, loop_addr(i, loop_reg::OUTPUT)));
    }
    for i in 0..TOD_OUTPUTS as u16 {
        let _ = claims.push((Source::TimeOfDay, addr::TOD_OUTPUT_BASE + i));
    }
    let _ = claims.push((Source::Logic, addr::LOGIC_OUTPUT));
    let _ = claims.push((Source::TimeLimited, addr::TLC_OUTPUT));

    let previous = state.ownership.clone();
    state.ownership.clear();
    let mut dropped = 0;
    for (source, at) in claims {
        let Some(out) = state.store.channel(at).physical_output() else {
            continue;
        };
        if let Err(conflict) = state.ownership.claim(out, source) {
            warn!("Settings: {conflict}");
            state.store.set_channel(at, Channel::None);
            dropped += 1;
        }
    }
    state.matrix.adopt(&previous, &state.ownership);
    dropped
}
