//! Wall-clock bookkeeping: startup lockout, time validity and the flasher.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::state::SystemState;
use crate::store::addr::{self, flag};
use crate::timing::elapsed_ms;

/// Broken-down local time as delivered by the time adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WallTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millis: u16,
}

/// Owns the startup, time-valid and flasher flags and the clock registers.
pub struct TimeKeeper {
    startup_delay_ms: u32,
    time_valid_ms: u32,
    boot_ms: Option<u32>,
    last_sync_ms: Option<u32>,
    startup: bool,
    time_valid: bool,
}

impl TimeKeeper {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            startup_delay_ms: config.startup_delay_ms(),
            time_valid_ms: config.time_valid_ms(),
            boot_ms: None,
            last_sync_ms: None,
            startup: true,
            time_valid: false,
        }
    }

    /// Record a successful network time synchronisation.
    pub fn note_sync(&mut self, now_ms: u32) {
        if self.last_sync_ms.is_none() {
            info!("Clock: first time sync");
        }
        self.last_sync_ms = Some(now_ms);
    }

    pub fn service(&mut self, now_ms: u32, wall: Option<WallTime>, state: &mut SystemState) {
        // ── Startup lockout ───────────────────────────────────────
        let boot = self.boot_ms.get_or_insert(now_ms);
        if self.startup && elapsed_ms(boot, now_ms) >= self.startup_delay_ms {
            info!("Clock: startup lockout over");
            self.startup = false;
        }

        // ── Time validity ─────────────────────────────────────────
        let synced_recently = match self.last_sync_ms.as_mut() {
            Some(since) => elapsed_ms(since, now_ms) < self.time_valid_ms,
            None => false,
        };
        let valid = synced_recently && wall.is_some();
        if valid != self.time_valid {
            if valid {
                info!("Clock: time valid");
            } else {
                warn!("Clock: time invalid");
            }
            self.time_valid = valid;
        }

        let s = &mut state.store;
        s.set_flag(flag::STARTUP, self.startup);
        s.set_flag(flag::TIME_VALID, self.time_valid);

        // ── Registers and flasher ─────────────────────────────────
        let flasher = match wall {
            Some(t) => {
                s.set_u16(addr::YEAR, t.year);
                s.set_u16(addr::MONTH, t.month.into());
                s.set_u16(addr::DAY, t.day.into());
                s.set_u16(addr::HOUR, t.hour.into());
                s.set_u16(addr::MINUTE, t.minute.into());
                s.set_u16(addr::SECOND, t.second.into());
                t.millis < 500
            }
            None => now_ms % 1000 < 500,
        };
        s.set_flag(flag::FLASHER, flasher);
    }

    pub fn startup(&self) -> bool {
        self.startup
    }

    pub fn time_valid(&self) -> bool {
        self.time_valid
    }
}
