//! The `SystemState` aggregate passed to every engine.
//!
//! Bundles the store, the arbitration matrix, the output ownership table and
//! the network-connected flag so engines receive their shared state as an
//! explicit `&mut` instead of reaching for globals.

use crate::channel::{Channel, Units};
use crate::matrix::{OutputMatrix, OwnershipTable, Source};
use crate::store::StateStore;
use crate::store::addr::{self, flag};

/// An engineering value with its validity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub value: f32,
    pub valid: bool,
}

impl Reading {
    pub const INVALID: Reading = Reading {
        value: 0.0,
        valid: false,
    };

    pub const fn valid(value: f32) -> Self {
        Self { value, valid: true }
    }
}

#[derive(Clone, Default)]
pub struct SystemState {
    pub store: StateStore,
    pub matrix: OutputMatrix,
    pub ownership: OwnershipTable,
    pub network_connected: bool,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value and validity of an analog or time-domain channel.  Anything
    /// else reads as invalid.
    pub fn reading(&self, ch: Channel) -> Reading {
        if ch.is_time_domain() {
            return self.time_reading(ch);
        }
        match (addr::value_addr(ch), addr::valid_flag(ch)) {
            (Some(v), Some(f)) => Reading {
                value: self.store.f32(v),
                valid: self.store.flag(f),
            },
            _ => Reading::INVALID,
        }
    }

    /// Fractional wall-clock value for a time-domain channel.
    fn time_reading(&self, ch: Channel) -> Reading {
        let s = &self.store;
        let day = f32::from(s.u16(addr::DAY));
        let hour = f32::from(s.u16(addr::HOUR));
        let minute = f32::from(s.u16(addr::MINUTE));
        let second = f32::from(s.u16(addr::SECOND));
        let value = match ch {
            Channel::Days => day + hour / 24.0 + minute / 1440.0,
            Channel::Hours => hour + minute / 60.0 + second / 3600.0,
            Channel::Minutes => minute + second / 60.0,
            Channel::Seconds => second,
            _ => return Reading::INVALID,
        };
        Reading {
            value,
            valid: self.time_valid(),
        }
    }

    /// State of a digital channel; non-digital channels read `false`.
    pub fn digital(&self, ch: Channel) -> bool {
        addr::digital_flag(ch).is_some_and(|f| self.store.flag(f))
    }

    pub fn units(&self, ch: Channel) -> Units {
        addr::units_addr(ch).map_or(Units::None, |a| self.store.units(a))
    }

    pub fn time_valid(&self) -> bool {
        self.store.flag(flag::TIME_VALID)
    }

    pub fn startup(&self) -> bool {
        self.store.flag(flag::STARTUP)
    }

    pub fn silenced(&self) -> bool {
        self.store.flag(flag::SILENCE)
    }

    /// Route a single-target source's decision: a physical output goes
    /// through the matrix, a virtual state is written directly (and the row
    /// released), anything else releases the row.
    pub fn drive_target(&mut self, source: Source, target: Channel, on: bool) {
        if let Some(out) = target.physical_output() {
            self.matrix.publish(source, Some(out), on);
        } else if let Some(i) = target.virtual_state_index() {
            self.matrix.release(source);
            self.store
                .set_flag(flag::VIRTUAL_STATE_BASE + i as u16, on);
        } else {
            self.matrix.release(source);
        }
    }
}
