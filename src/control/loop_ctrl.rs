//! One bang-bang control loop.
//!
//! Evaluation order per service:
//!
//! 1. resolve the input reading (analog or time-domain)
//! 2. demand: window or hysteresis band, forced off when invalid
//! 3. enable: manual, direct external or one-shot latch
//! 4. command = enabled && valid && demand
//! 5. dwell hold, then publish to status + matrix (untouched while held)
//! 6. alarms, then min/max tracking

use log::debug;

use crate::channel::Channel;
use crate::matrix::Source;
use crate::state::{Reading, SystemState};
use crate::store::addr::{flag, loop_addr, loop_reg};
use crate::timing::elapsed_ms;

use super::alarms::{self, AlarmInput, AlarmState};
use super::enable::{self, EnableSource, ShotState};
use super::hysteresis;

// ───────────────────────────────────────────────────────────────
// Dwell hold
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellOutcome {
    Publish(bool),
    Hold,
}

/// Minimum on/off time between published changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DwellState {
    published: bool,
    holding_since: Option<u32>,
}

impl DwellState {
    pub fn step(&mut self, commanded: bool, dwell_ms: u32, now_ms: u32) -> DwellOutcome {
        if dwell_ms == 0 || commanded == self.published {
            self.holding_since = None;
            self.published = commanded;
            return DwellOutcome::Publish(commanded);
        }
        match self.holding_since.as_mut() {
            None => {
                self.holding_since = Some(now_ms);
                DwellOutcome::Hold
            }
            Some(since) => {
                if elapsed_ms(since, now_ms) >= dwell_ms {
                    self.holding_since = None;
                    self.published = commanded;
                    DwellOutcome::Publish(commanded)
                } else {
                    DwellOutcome::Hold
                }
            }
        }
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn is_holding(&self) -> bool {
        self.holding_since.is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration snapshot
// ───────────────────────────────────────────────────────────────

/// A loop's settings as read from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    pub input: Channel,
    pub output: Channel,
    pub setpoint: f32,
    pub hysteresis: f32,
    pub alarm_low: f32,
    pub alarm_high: f32,
    pub enable_source: Channel,
    pub min_on_secs: u16,
    pub enabled: bool,
    pub high_acting: bool,
    pub one_shot: bool,
}

impl LoopConfig {
    pub fn read(state: &SystemState, index: usize) -> Self {
        let s = &state.store;
        Self {
            input: s.channel(loop_addr(index, loop_reg::INPUT)),
            output: s.channel(loop_addr(index, loop_reg::OUTPUT)),
            setpoint: s.f32(loop_addr(index, loop_reg::SETPOINT)),
            hysteresis: s.f32(loop_addr(index, loop_reg::HYSTERESIS)),
            alarm_low: s.f32(loop_addr(index, loop_reg::ALARM_LOW)),
            alarm_high: s.f32(loop_addr(index, loop_reg::ALARM_HIGH)),
            enable_source: s.channel(loop_addr(index, loop_reg::ENABLE_SOURCE)),
            min_on_secs: s.u16(loop_addr(index, loop_reg::MIN_ON_TIME)),
            enabled: s.flag(flag::loop_flag(flag::LOOP_ENABLE_BASE, index)),
            high_acting: s.flag(flag::loop_flag(flag::LOOP_HIGH_ACTING_BASE, index)),
            one_shot: s.flag(flag::loop_flag(flag::LOOP_ONE_SHOT_BASE, index)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

/// What one service of a loop decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopReport {
    pub index: usize,
    /// Published (possibly held) active state.
    pub active: bool,
    pub held: bool,
    pub enabled: bool,
    pub reading: Reading,
    pub alarms: AlarmState,
    /// Aggregate alarm changed this service.
    pub alarm_changed: bool,
}

#[derive(Debug, Clone)]
pub struct ControlLoop {
    index: usize,
    source: Source,
    /// Raw hysteresis decision, carried between services.
    demand: bool,
    shot: ShotState,
    dwell: DwellState,
    alarms: AlarmState,
}

impl ControlLoop {
    /// `source` is the loop's matrix row, one of [`Source::LOOPS`].
    pub fn new(source: Source) -> Self {
        debug_assert!(source.is_loop(), "{source} is not a control loop");
        Self {
            index: source.index(),
            source,
            demand: false,
            shot: ShotState::Idle,
            dwell: DwellState::default(),
            alarms: AlarmState::CLEAR,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn shot(&self) -> ShotState {
        self.shot
    }

    pub fn dwell(&self) -> &DwellState {
        &self.dwell
    }

    pub fn service(&mut self, now_ms: u32, state: &mut SystemState) -> LoopReport {
        let cfg = LoopConfig::read(state, self.index);
        let source = self.source;

        // 1. Input
        let time_input = cfg.input.is_time_domain();
        let reading = if cfg.input.is_analog() || time_input {
            state.reading(cfg.input)
        } else {
            Reading::INVALID
        };

        // 2. Demand
        self.demand = if !reading.valid {
            false
        } else if time_input {
            hysteresis::window(reading.value, cfg.setpoint, cfg.hysteresis)
        } else {
            hysteresis::band(
                self.demand,
                reading.value,
                cfg.setpoint,
                cfg.hysteresis,
                cfg.high_acting,
            )
        };

        // 3. Enable
        let enable_source = if cfg.enabled {
            EnableSource::Manual
        } else if cfg.enable_source.is_digital() {
            let ext = state.digital(cfg.enable_source);
            if cfg.one_shot {
                EnableSource::OneShot(ext)
            } else {
                EnableSource::Direct(ext)
            }
        } else {
            EnableSource::Off
        };
        let enabled = enable::resolve(enable_source, self.demand, &mut self.shot);

        // 4-5. Command through the dwell hold
        let commanded = enabled && reading.valid && self.demand;
        let dwell_ms = u32::from(cfg.min_on_secs) * 1000;
        let held = match self.dwell.step(commanded, dwell_ms, now_ms) {
            DwellOutcome::Publish(on) => {
                state
                    .store
                    .set_flag(flag::loop_flag(flag::LOOP_ACTIVE_BASE, self.index), on);
                state.drive_target(source, cfg.output, on);
                false
            }
            DwellOutcome::Hold => {
                debug!("Loop {}: holding {}", self.index + 1, self.dwell.published());
                true
            }
        };

        // 6. Alarms
        let alarms = alarms::evaluate(&AlarmInput {
            suppressed: !enabled || state.startup() || state.silenced(),
            time_input,
            time_valid: state.time_valid(),
            reading,
            low_limit: cfg.alarm_low,
            high_limit: cfg.alarm_high,
        });
        let alarm_changed = alarms.any() != self.alarms.any();
        self.alarms = alarms;
        let s = &mut state.store;
        s.set_flag(flag::loop_flag(flag::LOOP_ALARM_LOW_BASE, self.index), alarms.low);
        s.set_flag(flag::loop_flag(flag::LOOP_ALARM_HIGH_BASE, self.index), alarms.high);
        s.set_flag(flag::loop_flag(flag::LOOP_ALARM_BASE, self.index), alarms.any());

        // 7. Min/max
        let min_addr = loop_addr(self.index, loop_reg::MINIMUM);
        let max_addr = loop_addr(self.index, loop_reg::MAXIMUM);
        let reset_flag = flag::loop_flag(flag::LOOP_RESET_MINMAX_BASE, self.index);
        let startup = s.flag(flag::STARTUP);
        if s.take_flag(reset_flag) || startup {
            s.set_f32(min_addr, reading.value);
            s.set_f32(max_addr, reading.value);
        } else if reading.valid {
            if reading.value < s.f32(min_addr) {
                s.set_f32(min_addr, reading.value);
            }
            if reading.value > s.f32(max_addr) {
                s.set_f32(max_addr, reading.value);
            }
        }

        LoopReport {
            index: self.index,
            active: self.dwell.published(),
            held,
            enabled,
            reading,
            alarms,
            alarm_changed,
        }
    }
}
