//! Nernst conversion from probe volts to pH.

use super::conversion::Calibration;

pub const PH_NEUTRAL: f32 = 7.0;
pub const PH_MIN: f32 = 0.5;
pub const PH_MAX: f32 = 14.5;
/// Ideal slope at 25 °C, volts per pH unit.
pub const IDEAL_SLOPE_V: f32 = -0.059_16;
/// Nernst slope per kelvin, volts per pH unit.
pub const NERNST_SLOPE_V_PER_K: f32 = -0.000_198;
pub const KELVIN_OFFSET: f32 = 273.15;

/// Temperature source for the slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compensation {
    /// No compensation configured: ideal 25 °C slope.
    Ideal,
    /// Compensate at this temperature (°C).
    At(f32),
    /// Compensation configured but its channel is invalid: ideal slope and
    /// the reading is flagged invalid.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhReading {
    pub ph: f32,
    pub valid: bool,
}

/// Convert probe volts to calibrated pH.
///
/// The result is clamped to the probe's usable range (clamping invalidates)
/// before the user calibration pivots around pH 7.
pub fn volts_to_ph(volts: f32, comp: Compensation, cal: Calibration) -> PhReading {
    let (slope, mut valid) = match comp {
        Compensation::Ideal => (IDEAL_SLOPE_V, true),
        Compensation::At(c) => (NERNST_SLOPE_V_PER_K * (c + KELVIN_OFFSET), true),
        Compensation::Unavailable => (IDEAL_SLOPE_V, false),
    };
    let mut ph = volts / slope + PH_NEUTRAL;
    if !(PH_MIN..=PH_MAX).contains(&ph) {
        ph = ph.clamp(PH_MIN, PH_MAX);
        valid = false;
    }
    PhReading {
        ph: (ph + cal.offset - PH_NEUTRAL) * cal.gain + PH_NEUTRAL,
        valid,
    }
}
