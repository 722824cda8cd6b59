//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (register
//! protocol, local UI, provisioning) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::channel::{Channel, OutputId};
use crate::sensors::conversion::Calibration;
use crate::store::RegString;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Remote holding-register write, checked against the access table.
    WriteRegister { addr: u16, value: u16 },

    /// Remote coil write carrying the on/off sentinel.
    WriteCoil { addr: u16, raw: u16 },

    /// Set offset and gain of a calibratable channel; saved on the next
    /// persistence pass.
    Calibrate {
        channel: Channel,
        calibration: Calibration,
    },

    /// Manual enable of control loop `index` (0-based).
    SetLoopEnabled { index: usize, enabled: bool },

    /// Silence (or un-silence) every loop alarm.
    SilenceAlarms(bool),

    /// Restart min/max tracking of loop `index`.
    ResetMinMax(usize),

    ResetCounter,
    ResetTimer,

    /// Start the time-limited command.
    TriggerTimedCommand,

    /// Manual state for an output no source owns.
    SetOutputRequest { output: OutputId, on: bool },

    /// Persist every setting on the next persistence pass.
    SaveSettings,

    /// Restore factory settings (and persist them).
    LoadDefaults,

    /// Store network credentials; saved on the next persistence pass.
    SetCredentials { ssid: RegString, password: RegString },
}
