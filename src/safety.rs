//! System supervisor.
//!
//! Runs every tick after the control engine and accumulates a fault bitmask.
//! Faults are level-triggered: each evaluation sets or clears every bit, so
//! several can be active at once and each clears on its own.  The mask is
//! mirrored into the status-code register and the status flag.

use log::{error, info};

use crate::channel::{Channel, Units};
use crate::config::SystemConfig;
use crate::error::SystemFault;
use crate::sensors::conversion::f_to_c;
use crate::state::SystemState;
use crate::store::addr::{self, flag};

pub struct SafetySupervisor {
    supply_low_v: f32,
    supply_high_v: f32,
    internal_temp_high_c: f32,
    /// Latched fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            supply_low_v: config.supply_low_v,
            supply_high_v: config.supply_high_v,
            internal_temp_high_c: config.internal_temp_high_c,
            faults: 0,
        }
    }

    /// Evaluate every condition.  Returns the updated fault bitmask.
    pub fn evaluate(&mut self, state: &mut SystemState) -> u8 {
        // ── Supply ────────────────────────────────────────────────
        let supply = state.reading(Channel::SupplyVoltage);
        self.eval_fault(SystemFault::SupplyLow, supply.valid && supply.value < self.supply_low_v);
        self.eval_fault(
            SystemFault::SupplyHigh,
            supply.valid && supply.value > self.supply_high_v,
        );

        // ── Board temperature ─────────────────────────────────────
        let internal = state.reading(Channel::InternalTemp);
        let internal_c = if state.units(Channel::InternalTemp) == Units::DegF {
            f_to_c(internal.value)
        } else {
            internal.value
        };
        self.eval_fault(
            SystemFault::InternalOverTemp,
            internal.valid && internal_c > self.internal_temp_high_c,
        );

        // ── Time ──────────────────────────────────────────────────
        self.eval_fault(
            SystemFault::TimeInvalid,
            !state.startup() && !state.time_valid(),
        );

        // ── Control alarms ────────────────────────────────────────
        self.eval_fault(SystemFault::ControlAlarm, state.store.flag(flag::ANY_ALARM));

        state.store.set_u16(addr::STATUS_CODE, u16::from(self.faults));
        state.store.set_flag(flag::STATUS, self.faults != 0);
        self.faults
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, fault: SystemFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    fn eval_fault(&mut self, fault: SystemFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("Safety: fault set: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("Safety: fault cleared: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
