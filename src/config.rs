//! Engine tuning parameters.
//!
//! Everything operator-facing (setpoints, channel selections, calibration)
//! lives in the register map.  `SystemConfig` carries the fixed tuning that
//! the register map does not expose: engine cadences, lockout windows, the
//! tracking-filter policy and the supervisor bands.

use serde::{Deserialize, Serialize};

use crate::sensors::filter::FilterPolicy;

/// Core system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Engine cadence ---
    /// Minimum gap between acquisition positions (ms).
    pub sample_interval_ms: u32,
    /// Minimum gap between control-loop services; each call services one loop (ms).
    pub control_interval_ms: u32,
    /// Two-channel merge cadence (ms).
    pub merge_interval_ms: u32,
    /// Counter frequency measurement window (ms).
    pub frequency_window_ms: u32,

    // --- Lockouts ---
    /// Alarm and time-of-day lockout after boot (s).
    pub startup_delay_secs: u32,
    /// How long a time sync stays trusted without a fresh one (h).
    pub time_valid_hours: u32,

    // --- Acquisition ---
    pub filter: FilterPolicy,
    /// Raw count above which an analog input reads as a digital high.
    pub digital_threshold: u16,

    // --- Supervision ---
    pub supply_low_v: f32,
    pub supply_high_v: f32,
    pub internal_temp_high_c: f32,

    // --- Reporting ---
    pub telemetry_interval_secs: u32,

    // --- Identity ---
    pub model_number: u16,
    pub serial_number: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 4,
            control_interval_ms: 250, // 4 loops -> each at 1 Hz
            merge_interval_ms: 1000,
            frequency_window_ms: 1000,

            startup_delay_secs: 30,
            time_valid_hours: 48,

            filter: FilterPolicy::default(),
            digital_threshold: 2048,

            supply_low_v: 8.0,
            supply_high_v: 16.0,
            internal_temp_high_c: 55.0,

            telemetry_interval_secs: 60,

            model_number: 1000,
            serial_number: 0,
        }
    }
}

impl SystemConfig {
    pub fn startup_delay_ms(&self) -> u32 {
        self.startup_delay_secs.saturating_mul(1000)
    }

    pub fn time_valid_ms(&self) -> u32 {
        self.time_valid_hours.saturating_mul(3_600_000)
    }
}
