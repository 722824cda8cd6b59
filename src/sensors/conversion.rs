//! Counts-to-engineering-unit transfer functions.
//!
//! Constants are fixed by the front-end hardware: 12-bit converters on a
//! 2.5 V reference behind per-channel amplifiers and dividers.

use serde::{Deserialize, Serialize};

// ── Chemistry amplifier (MCP3021 input) ──────────────────────

/// Count at which the amplifier output represents 0 V at the probe.
pub const WQ_ZERO_COUNTS: f32 = 442.0;
/// Volts per count at the probe (inverting amplifier).
pub const WQ_VOLTS_PER_COUNT: f32 = -0.001_044;

pub fn chemistry_volts(avg: f32) -> f32 {
    (avg - WQ_ZERO_COUNTS) * WQ_VOLTS_PER_COUNT
}

/// Amplifier rail-to-rail range; outside it the probe is open or shorted.
pub fn chemistry_in_range(avg: f32) -> bool {
    avg > 100.0 && avg < 4000.0
}

// ── Temperature amplifiers ───────────────────────────────────

pub const TEMP_ZERO_COUNTS: f32 = 1200.0;
pub const TEMP_DEG_PER_COUNT: f32 = 0.048_17;

pub fn temperature_c(avg: f32) -> f32 {
    (avg - TEMP_ZERO_COUNTS) * TEMP_DEG_PER_COUNT
}

pub fn temperature_in_range(c: f32) -> bool {
    (-35.0..=135.0).contains(&c)
}

// ── General analog inputs ────────────────────────────────────

pub const ANALOG_VOLTS_PER_COUNT: f32 = 0.002_639;
/// 250 Ω burden on the current-loop option.
pub const MILLIAMPS_PER_VOLT: f32 = 4.016_06;
pub const ANALOG_MAX_COUNTS: f32 = 4090.0;

pub fn analog_volts(avg: f32) -> f32 {
    avg * ANALOG_VOLTS_PER_COUNT
}

pub fn analog_in_range(avg: f32) -> bool {
    (0.0..=ANALOG_MAX_COUNTS).contains(&avg)
}

// ── Internal thermistor ──────────────────────────────────────

const THERM_R25: f32 = 10_000.0;
const THERM_BETA: f32 = 3950.0;
const THERM_T25_K: f32 = 298.15;
const THERM_SUPPLY_V: f32 = 3.3;
const ADC_REF_V: f32 = 2.5;
const ADC_FULL_SCALE: f32 = 4095.0;
/// Self-heating of the board near the sensor.
const THERM_SELF_HEAT_C: f32 = 3.0;

/// Beta-equation temperature from the divider count, or `None` when the
/// divider is open or shorted.
pub fn internal_temp_c(avg: f32) -> Option<f32> {
    if avg <= 0.0 {
        return None;
    }
    let v = avg * ADC_REF_V / ADC_FULL_SCALE;
    let ratio = THERM_SUPPLY_V / v - 1.0;
    if ratio <= 0.0 {
        return None;
    }
    let r = THERM_R25 / ratio;
    let t = 1.0 / ((r / THERM_R25).ln() / THERM_BETA + 1.0 / THERM_T25_K) - 273.15
        - THERM_SELF_HEAT_C;
    t.is_finite().then_some(t)
}

pub fn internal_temp_in_range(c: f32) -> bool {
    (-20.0..=120.0).contains(&c)
}

// ── Supply monitor ───────────────────────────────────────────

pub const SUPPLY_VOLTS_PER_COUNT: f32 = 0.004_378;

pub fn supply_volts(avg: f32) -> f32 {
    avg * SUPPLY_VOLTS_PER_COUNT
}

// ── Unit helpers ─────────────────────────────────────────────

pub fn c_to_f(c: f32) -> f32 {
    c * 1.8 + 32.0
}

pub fn f_to_c(f: f32) -> f32 {
    (f - 32.0) / 1.8
}

/// User offset/gain pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub offset: f32,
    pub gain: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Calibration {
    pub const IDENTITY: Calibration = Calibration {
        offset: 0.0,
        gain: 1.0,
    };

    pub fn apply(&self, v: f32) -> f32 {
        (v + self.offset) * self.gain
    }
}
