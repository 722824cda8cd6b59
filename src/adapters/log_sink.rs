//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  Telemetry goes out as a single
//! JSON line so a host-side collector can parse it without a protocol
//! stack.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(line) => info!("TELEM | {line}"),
                Err(e) => warn!("TELEM | encode failed: {e}"),
            },
            AppEvent::OutputChanged { output, on } => {
                info!("OUTPUT | {output} -> {}", if *on { "on" } else { "off" });
            }
            AppEvent::LoopAlarm { index, alarms } => {
                if alarms.any() {
                    warn!(
                        "ALARM | loop {} low={} high={}",
                        index + 1,
                        alarms.low,
                        alarms.high
                    );
                } else {
                    info!("ALARM | loop {} cleared", index + 1);
                }
            }
            AppEvent::FaultDetected(flags) => {
                warn!("FAULT | detected, flags=0b{flags:08b}");
            }
            AppEvent::FaultCleared => info!("FAULT | all cleared"),
            AppEvent::SettingsSaved => info!("SETTINGS | saved"),
            AppEvent::DefaultsLoaded => info!("SETTINGS | factory defaults loaded"),
            AppEvent::LimitsCorrected(n) => info!("SETTINGS | {n} values corrected"),
            AppEvent::Started => info!("START | controller running"),
        }
    }
}
