//! Analog acquisition and conditioning engine.
//!
//! ```text
//!   pos  channel        converter
//!   0    WQ amplifier   MCP3021 (dedicated)
//!   1    Temp1          MCP3208 in0   ─┐
//!   2    Temp2          MCP3208 in1    │ each read preselects
//!   3    Analog2        MCP3208 in2    │ the next input so the
//!   4    Analog1        MCP3208 in3    │ mux settles for a full
//!   5    Supply         MCP3208 in4    │ cycle
//!   6    Internal temp  MCP3208 in5   ─┘ (wraps to in0)
//! ```
//!
//! One position is serviced per call, gated by the sample interval.  Each
//! sample feeds that position's [`TrackingAverage`]; the average is then
//! scaled, range-checked, calibrated and unit-converted, and the result and
//! its validity written to the store.

pub mod conversion;
pub mod filter;
pub mod ph;

use log::debug;

use crate::app::ports::SensorPort;
use crate::channel::{Channel, Units};
use crate::config::SystemConfig;
use crate::state::SystemState;
use crate::store::addr::{self, flag};
use crate::timing::IntervalGuard;

use conversion::Calibration;
use filter::TrackingAverage;
use ph::Compensation;

/// Inputs on the multi-channel converter in use by the sweep.
const MUX_INPUTS: u8 = 6;

// ───────────────────────────────────────────────────────────────
// Sweep positions
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Chemistry,
    Temp1,
    Temp2,
    Analog2,
    Analog1,
    Supply,
    Internal,
}

impl Position {
    pub const SWEEP: [Position; 7] = [
        Self::Chemistry,
        Self::Temp1,
        Self::Temp2,
        Self::Analog2,
        Self::Analog1,
        Self::Supply,
        Self::Internal,
    ];

    pub const fn channel(self) -> Channel {
        match self {
            Self::Chemistry => Channel::WqAmp,
            Self::Temp1 => Channel::Temp1,
            Self::Temp2 => Channel::Temp2,
            Self::Analog2 => Channel::Analog2,
            Self::Analog1 => Channel::Analog1,
            Self::Supply => Channel::SupplyVoltage,
            Self::Internal => Channel::InternalTemp,
        }
    }

    /// Multi-channel converter input, `None` for the dedicated converter.
    pub const fn mux_input(self) -> Option<u8> {
        match self {
            Self::Chemistry => None,
            Self::Temp1 => Some(0),
            Self::Temp2 => Some(1),
            Self::Analog2 => Some(2),
            Self::Analog1 => Some(3),
            Self::Supply => Some(4),
            Self::Internal => Some(5),
        }
    }

    /// Digital input derived from this position's raw sample.
    const fn digital_flag(self) -> Option<u16> {
        match self {
            Self::Analog1 => Some(flag::DIGITAL_IN_1),
            Self::Analog2 => Some(flag::DIGITAL_IN_2),
            _ => None,
        }
    }
}

/// Latest conditioned result of one position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogReading {
    pub raw_average: f32,
    pub value: f32,
    pub units: Units,
    pub valid: bool,
}

// ───────────────────────────────────────────────────────────────
// AnalogEngine
// ───────────────────────────────────────────────────────────────

pub struct AnalogEngine {
    guard: IntervalGuard,
    next: usize,
    filters: [TrackingAverage; 7],
    readings: [AnalogReading; 7],
    digital_threshold: u16,
}

impl AnalogEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            guard: IntervalGuard::new(config.sample_interval_ms),
            next: 0,
            filters: [TrackingAverage::new(config.filter); 7],
            readings: [AnalogReading::default(); 7],
            digital_threshold: config.digital_threshold,
        }
    }

    /// Service the next sweep position if the sample interval has elapsed.
    /// Returns the position serviced.
    pub fn service(
        &mut self,
        now_ms: u32,
        sensors: &mut impl SensorPort,
        state: &mut SystemState,
    ) -> Option<Position> {
        if !self.guard.ready(now_ms) {
            return None;
        }
        let index = self.next;
        self.next = (self.next + 1) % Position::SWEEP.len();
        let pos = Position::SWEEP[index];
        self.sample(index, pos, sensors, state);
        Some(pos)
    }

    /// Run one full sweep back to back, ignoring the interval guard.
    pub fn sweep(&mut self, sensors: &mut impl SensorPort, state: &mut SystemState) {
        for (index, pos) in Position::SWEEP.into_iter().enumerate() {
            self.sample(index, pos, sensors, state);
        }
        self.next = 0;
    }

    pub fn reading(&self, ch: Channel) -> Option<&AnalogReading> {
        Position::SWEEP
            .iter()
            .position(|p| p.channel() == ch)
            .map(|i| &self.readings[i])
    }

    pub fn readings(&self) -> impl Iterator<Item = (Channel, &AnalogReading)> {
        Position::SWEEP
            .iter()
            .zip(self.readings.iter())
            .map(|(p, r)| (p.channel(), r))
    }

    // ── Internal ──────────────────────────────────────────────

    fn sample(
        &mut self,
        index: usize,
        pos: Position,
        sensors: &mut impl SensorPort,
        state: &mut SystemState,
    ) {
        let ch = pos.channel();
        let raw = match pos.mux_input() {
            None => sensors.read_chemistry(),
            Some(input) => {
                let raw = sensors.read_channel(input);
                if let Err(e) = sensors.preselect((input + 1) % MUX_INPUTS) {
                    debug!("Analog: preselect after {:?} failed: {}", ch, e);
                }
                raw
            }
        };

        let raw = match raw {
            Ok(r) => r,
            Err(e) => {
                debug!("Analog: {:?} read failed: {}", ch, e);
                self.readings[index].valid = false;
                if let Some(f) = addr::valid_flag(ch) {
                    state.store.set_flag(f, false);
                }
                return;
            }
        };

        if let Some(f) = pos.digital_flag() {
            state.store.set_flag(f, raw > self.digital_threshold);
        }

        let avg = self.filters[index].update(raw);
        let units = state.units(ch);
        let (value, valid) = condition(pos, avg, units, state);

        self.readings[index] = AnalogReading {
            raw_average: avg,
            value,
            units,
            valid,
        };
        if let (Some(v), Some(f)) = (addr::value_addr(ch), addr::valid_flag(ch)) {
            state.store.set_f32(v, value);
            state.store.set_flag(f, valid);
        }
    }
}

/// Calibration pair of a channel from the store (identity if none).
pub fn calibration(state: &SystemState, ch: Channel) -> Calibration {
    addr::calibration_addrs(ch).map_or(Calibration::IDENTITY, |(o, g)| Calibration {
        offset: state.store.f32(o),
        gain: state.store.f32(g),
    })
}

/// Resolve the pH compensation source.
fn compensation(state: &SystemState) -> Compensation {
    let src = state.store.channel(addr::PH_COMP_SOURCE);
    match src {
        Channel::Temp1 | Channel::Temp2 | Channel::Analog1 | Channel::Analog2 => {
            let r = state.reading(src);
            if !r.valid {
                return Compensation::Unavailable;
            }
            if state.units(src) == Units::DegF {
                Compensation::At(conversion::f_to_c(r.value))
            } else {
                Compensation::At(r.value)
            }
        }
        _ => Compensation::Ideal,
    }
}

/// Engineering value and validity of a filtered average.
fn condition(pos: Position, avg: f32, units: Units, state: &SystemState) -> (f32, bool) {
    use conversion::*;

    let cal = calibration(state, pos.channel());
    let to_units = |c: f32| if units == Units::DegF { c_to_f(c) } else { c };

    match pos {
        Position::Chemistry => {
            let v = chemistry_volts(avg);
            let in_range = chemistry_in_range(avg);
            match units {
                Units::Ph => {
                    let r = ph::volts_to_ph(v, compensation(state), cal);
                    (r.ph, in_range && r.valid)
                }
                Units::MilliVolt => (cal.apply(v * 1000.0), in_range),
                _ => (cal.apply(v), in_range),
            }
        }
        Position::Temp1 | Position::Temp2 => {
            let c = temperature_c(avg);
            (to_units(cal.apply(c)), temperature_in_range(c))
        }
        Position::Analog1 | Position::Analog2 => {
            let v = analog_volts(avg);
            let scaled = match units {
                Units::MilliAmp => v * MILLIAMPS_PER_VOLT,
                Units::MilliVolt => v * 1000.0,
                _ => v,
            };
            (cal.apply(scaled), analog_in_range(avg))
        }
        Position::Internal => match internal_temp_c(avg) {
            Some(c) => (to_units(c), internal_temp_in_range(c)),
            None => (0.0, false),
        },
        Position::Supply => (supply_volts(avg), true),
    }
}
