//! Unified error types for the SymbCtrl firmware.
//!
//! Every subsystem converts into the crate-wide [`Error`].  All variants are
//! `Copy` so they pass through the service and protocol layers without
//! allocation.  Data-quality problems (bad readings, bad configuration) are
//! never errors: they become validity flags or limit-pass corrections.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A converter could not be read.
    Sensor(SensorError),
    /// A state-store access fell outside its namespace.
    Store(StoreError),
    /// A register-protocol request was rejected.
    Protocol(ProtocolError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// A command referenced something that cannot be configured that way.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction failed.
    BusFault,
    /// No device answered at the expected address.
    NotResponding,
    /// The converter input number does not exist.
    InvalidInput(u8),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFault => write!(f, "bus transaction failed"),
            Self::NotResponding => write!(f, "device not responding"),
            Self::InvalidInput(n) => write!(f, "converter input {n} does not exist"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// `len` registers starting at `addr` overrun the data namespace.
    DataOutOfRange { addr: u16, len: u16 },
    /// The status flag address does not exist.
    StatusOutOfRange(u16),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataOutOfRange { addr, len } => {
                write!(f, "data address {addr} (+{len}) out of range")
            }
            Self::StatusOutOfRange(addr) => write!(f, "status address {addr} out of range"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Rejections at the register-protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// No register or coil at this address.
    IllegalAddress(u16),
    /// The address exists but the access table forbids this direction.
    NotPermitted(u16),
    /// A coil write carried something other than the on/off sentinels.
    IllegalValue(u16),
}

impl ProtocolError {
    /// Modbus exception code for this rejection.
    pub const fn exception_code(self) -> u8 {
        match self {
            Self::IllegalAddress(_) | Self::NotPermitted(_) => 0x02,
            Self::IllegalValue(_) => 0x03,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalAddress(a) => write!(f, "illegal address {a}"),
            Self::NotPermitted(a) => write!(f, "access to {a} not permitted"),
            Self::IllegalValue(v) => write!(f, "illegal coil value 0x{v:04X}"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<StoreError> for ProtocolError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DataOutOfRange { addr, .. } | StoreError::StatusOutOfRange(addr) => {
                Self::IllegalAddress(addr)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// System faults
// ---------------------------------------------------------------------------

/// System faults accumulated by the supervisor in a bitmask so several can
/// be active at once and cleared individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemFault {
    /// Supply voltage below the operating band.
    SupplyLow = 0b0000_0001,
    /// Supply voltage above the operating band.
    SupplyHigh = 0b0000_0010,
    /// Board temperature above its limit.
    InternalOverTemp = 0b0000_0100,
    /// Wall time unavailable after the startup lockout.
    TimeInvalid = 0b0000_1000,
    /// At least one control loop is in alarm.
    ControlAlarm = 0b0001_0000,
}

impl SystemFault {
    pub const ALL: [SystemFault; 5] = [
        Self::SupplyLow,
        Self::SupplyHigh,
        Self::InternalOverTemp,
        Self::TimeInvalid,
        Self::ControlAlarm,
    ];

    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SystemFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SupplyLow => write!(f, "supply voltage low"),
            Self::SupplyHigh => write!(f, "supply voltage high"),
            Self::InternalOverTemp => write!(f, "internal over temperature"),
            Self::TimeInvalid => write!(f, "wall time invalid"),
            Self::ControlAlarm => write!(f, "control loop alarm"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
