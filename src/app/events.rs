//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to a display,
//! publish over the network, etc.

use heapless::Vec;
use serde::Serialize;

use crate::channel::{Channel, OUTPUT_COUNT, OutputId, Units};
use crate::control::alarms::AlarmState;
use crate::store::addr::LOOP_COUNT;

/// Analog channels reported in telemetry.
pub const TELEMETRY_CHANNELS: usize = 8;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started.
    Started,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// A physical output was switched.
    OutputChanged { output: OutputId, on: bool },

    /// A loop's aggregate alarm changed.
    LoopAlarm { index: usize, alarms: AlarmState },

    /// One or more system faults were raised (carries the full mask).
    FaultDetected(u8),

    /// All system faults have been cleared.
    FaultCleared,

    SettingsSaved,
    DefaultsLoaded,

    /// The limit pass rewrote this many settings.
    LimitsCorrected(u16),
}

/// One analog channel in a telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelTelemetry {
    pub channel: Channel,
    pub value: f32,
    pub units: Units,
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoopTelemetry {
    pub enabled: bool,
    pub active: bool,
    pub alarm_low: bool,
    pub alarm_high: bool,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub uptime_ms: u32,
    pub channels: Vec<ChannelTelemetry, TELEMETRY_CHANNELS>,
    pub loops: [LoopTelemetry; LOOP_COUNT],
    pub outputs: [bool; OUTPUT_COUNT],
    pub fault_flags: u8,
    pub time_valid: bool,
    pub startup: bool,
}
