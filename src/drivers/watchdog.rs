//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the controller if the cooperative main loop stops feeding it, so
//! a hung converter transaction can never freeze the relays in place.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

/// Default stall timeout.
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    subscribed: bool,
    timeout_ms: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI calls with a config that outlives them.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK {
                warn!("Watchdog: reconfigure returned {ret} (may already be configured)");
            }
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            let subscribed = ret == ESP_OK;
            if subscribed {
                info!("Watchdog: subscribed ({timeout_ms} ms, panic on trigger)");
            } else {
                warn!("Watchdog: failed to subscribe ({ret})");
            }
            Self {
                subscribed,
                timeout_ms,
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog: simulation, {timeout_ms} ms not enforced");
            if timeout_ms == 0 {
                warn!("Watchdog: zero timeout");
            }
            Self {
                subscribed: false,
                timeout_ms,
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Must be called at least once per timeout.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the calling task is subscribed.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
