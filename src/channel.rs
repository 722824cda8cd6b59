//! Channel identifiers and the small enumerations used as configuration
//! selectors.
//!
//! Every input/output selector in the register map is a [`Channel`] wire
//! code.  Categories are disjoint and tested through predicates rather than
//! numeric range checks:
//!
//! ```text
//!   1 ─ 8    analog        WQ, Temp1/2, Analog1/2, internal, supply, processed
//!   9 ─ 34   digital       inputs, outputs, virtual states, loops, alarms, flasher
//!  11 ─ 16     └ output    relays, digital outputs, virtual states
//!  35 ─ 38   time domain   days, hours, minutes, seconds
//!  39        digital       time-of-day gate result
//! ```

use serde::{Deserialize, Serialize};

// ───────────────────────────────────────────────────────────────
// Channel
// ───────────────────────────────────────────────────────────────

/// A readable or writable point in the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum Channel {
    #[default]
    None = 0,
    WqAmp = 1,
    Temp1 = 2,
    Temp2 = 3,
    Analog1 = 4,
    Analog2 = 5,
    InternalTemp = 6,
    SupplyVoltage = 7,
    ProcessedReading = 8,
    DigitalIn1 = 9,
    DigitalIn2 = 10,
    Relay1 = 11,
    Relay2 = 12,
    DigitalOut1 = 13,
    DigitalOut2 = 14,
    VirtualState1 = 15,
    VirtualState2 = 16,
    Loop1 = 17,
    Loop2 = 18,
    Loop3 = 19,
    Loop4 = 20,
    AnyAlarm = 21,
    Loop1Alarm = 22,
    Loop2Alarm = 23,
    Loop3Alarm = 24,
    Loop4Alarm = 25,
    Loop1AlarmLow = 26,
    Loop2AlarmLow = 27,
    Loop3AlarmLow = 28,
    Loop4AlarmLow = 29,
    Loop1AlarmHigh = 30,
    Loop2AlarmHigh = 31,
    Loop3AlarmHigh = 32,
    Loop4AlarmHigh = 33,
    Flasher = 34,
    Days = 35,
    Hours = 36,
    Minutes = 37,
    Seconds = 38,
    TimeOfDay = 39,
}

impl Channel {
    /// Every channel in wire order.
    pub const ALL: [Channel; 40] = [
        Self::None,
        Self::WqAmp,
        Self::Temp1,
        Self::Temp2,
        Self::Analog1,
        Self::Analog2,
        Self::InternalTemp,
        Self::SupplyVoltage,
        Self::ProcessedReading,
        Self::DigitalIn1,
        Self::DigitalIn2,
        Self::Relay1,
        Self::Relay2,
        Self::DigitalOut1,
        Self::DigitalOut2,
        Self::VirtualState1,
        Self::VirtualState2,
        Self::Loop1,
        Self::Loop2,
        Self::Loop3,
        Self::Loop4,
        Self::AnyAlarm,
        Self::Loop1Alarm,
        Self::Loop2Alarm,
        Self::Loop3Alarm,
        Self::Loop4Alarm,
        Self::Loop1AlarmLow,
        Self::Loop2AlarmLow,
        Self::Loop3AlarmLow,
        Self::Loop4AlarmLow,
        Self::Loop1AlarmHigh,
        Self::Loop2AlarmHigh,
        Self::Loop3AlarmHigh,
        Self::Loop4AlarmHigh,
        Self::Flasher,
        Self::Days,
        Self::Hours,
        Self::Minutes,
        Self::Seconds,
        Self::TimeOfDay,
    ];

    /// Decode a wire code.  Unknown codes return `None` (the Option).
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Wire code.
    pub const fn raw(self) -> u16 {
        self as u16
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Channels carrying an engineering value plus validity.
    pub const fn is_analog(self) -> bool {
        let r = self.raw();
        r >= Self::WqAmp.raw() && r <= Self::ProcessedReading.raw()
    }

    /// Fractional wall-clock pseudo-channels.
    pub const fn is_time_domain(self) -> bool {
        let r = self.raw();
        r >= Self::Days.raw() && r <= Self::Seconds.raw()
    }

    /// Channels with a boolean state.
    pub const fn is_digital(self) -> bool {
        let r = self.raw();
        (r >= Self::DigitalIn1.raw() && r <= Self::Flasher.raw())
            || matches!(self, Self::TimeOfDay)
    }

    /// Channels a source may drive (physical outputs and virtual states).
    pub const fn is_output(self) -> bool {
        let r = self.raw();
        r >= Self::Relay1.raw() && r <= Self::VirtualState2.raw()
    }

    /// The physical output this channel names, if any.
    pub const fn physical_output(self) -> Option<OutputId> {
        match self {
            Self::Relay1 => Some(OutputId::Relay1),
            Self::Relay2 => Some(OutputId::Relay2),
            Self::DigitalOut1 => Some(OutputId::DigitalOut1),
            Self::DigitalOut2 => Some(OutputId::DigitalOut2),
            _ => None,
        }
    }

    /// 0 or 1 for the two virtual state channels.
    pub const fn virtual_state_index(self) -> Option<usize> {
        match self {
            Self::VirtualState1 => Some(0),
            Self::VirtualState2 => Some(1),
            _ => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Physical outputs
// ───────────────────────────────────────────────────────────────

/// Number of physical outputs on the board.
pub const OUTPUT_COUNT: usize = 4;

/// A physical output driven through the arbitration matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputId {
    Relay1,
    Relay2,
    DigitalOut1,
    DigitalOut2,
}

impl OutputId {
    pub const ALL: [OutputId; OUTPUT_COUNT] = [
        Self::Relay1,
        Self::Relay2,
        Self::DigitalOut1,
        Self::DigitalOut2,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn channel(self) -> Channel {
        match self {
            Self::Relay1 => Channel::Relay1,
            Self::Relay2 => Channel::Relay2,
            Self::DigitalOut1 => Channel::DigitalOut1,
            Self::DigitalOut2 => Channel::DigitalOut2,
        }
    }
}

impl core::fmt::Display for OutputId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Relay1 => write!(f, "relay 1"),
            Self::Relay2 => write!(f, "relay 2"),
            Self::DigitalOut1 => write!(f, "digital out 1"),
            Self::DigitalOut2 => write!(f, "digital out 2"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Units
// ───────────────────────────────────────────────────────────────

/// Engineering unit codes as stored in the unit registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum Units {
    #[default]
    None = 0,
    DegC = 1,
    DegF = 2,
    Ph = 3,
    MilliVolt = 4,
    Volt = 5,
    MilliAmp = 6,
    Amp = 7,
    Millimetre = 8,
    Metre = 9,
    Millilitre = 10,
    Litre = 11,
    Gram = 12,
    Kilogram = 13,
    Pound = 14,
    KiloPascal = 15,
    Psi = 16,
    Hertz = 17,
    Percent = 18,
    Ppm = 19,
    Ohm = 20,
    Day = 21,
    Hour = 22,
    Minute = 23,
    Second = 24,
    Mole = 25,
    Mph = 26,
    MetrePerSecond = 27,
    Degree = 28,
    MmHg = 29,
    MilliBar = 30,
    Watt = 31,
    KiloWatt = 32,
    KiloVoltAmp = 33,
}

impl Units {
    /// Highest code selectable for a general sensor channel.
    pub const MAX_SENSOR: u16 = Self::Second as u16;

    pub fn from_raw(raw: u16) -> Option<Self> {
        use Units::*;
        const TABLE: [Units; 34] = [
            None, DegC, DegF, Ph, MilliVolt, Volt, MilliAmp, Amp, Millimetre, Metre,
            Millilitre, Litre, Gram, Kilogram, Pound, KiloPascal, Psi, Hertz, Percent, Ppm,
            Ohm, Day, Hour, Minute, Second, Mole, Mph, MetrePerSecond, Degree, MmHg,
            MilliBar, Watt, KiloWatt, KiloVoltAmp,
        ];
        TABLE.get(raw as usize).copied()
    }

    pub const fn raw(self) -> u16 {
        self as u16
    }

    pub const fn is_temperature(self) -> bool {
        matches!(self, Self::DegC | Self::DegF)
    }

    /// Display symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::None => "",
            Self::DegC => "\u{00b0}C",
            Self::DegF => "\u{00b0}F",
            Self::Ph => "pH",
            Self::MilliVolt => "mV",
            Self::Volt => "V",
            Self::MilliAmp => "mA",
            Self::Amp => "A",
            Self::Millimetre => "mm",
            Self::Metre => "m",
            Self::Millilitre => "ml",
            Self::Litre => "l",
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Pound => "lbs",
            Self::KiloPascal => "kPa",
            Self::Psi => "PSI",
            Self::Hertz => "Hz",
            Self::Percent => "%",
            Self::Ppm => "PPM",
            Self::Ohm => "\u{03a9}",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "min",
            Self::Second => "s",
            Self::Mole => "mol",
            Self::Mph => "mph",
            Self::MetrePerSecond => "m/s",
            Self::Degree => "deg",
            Self::MmHg => "mmHg",
            Self::MilliBar => "mBar",
            Self::Watt => "W",
            Self::KiloWatt => "kW",
            Self::KiloVoltAmp => "kVA",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Function selectors
// ───────────────────────────────────────────────────────────────

/// Two-channel merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum MergeFn {
    #[default]
    Average = 0,
    Min = 1,
    Max = 2,
    Sum = 3,
    /// A − B.
    Difference = 4,
    /// Pass through whichever input is valid, A first.
    Priority = 5,
}

impl MergeFn {
    pub const MAX_RAW: u16 = Self::Priority as u16;

    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::Average),
            1 => Some(Self::Min),
            2 => Some(Self::Max),
            3 => Some(Self::Sum),
            4 => Some(Self::Difference),
            5 => Some(Self::Priority),
            _ => None,
        }
    }
}

/// Logic gate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum LogicFn {
    /// NOT A (B ignored).
    #[default]
    Not = 0,
    And = 1,
    Nand = 2,
    Or = 3,
    Nor = 4,
    Xor = 5,
    Xnor = 6,
    /// A passed straight through.
    Echo = 7,
}

impl LogicFn {
    pub const MAX_RAW: u16 = Self::Echo as u16;

    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::Not),
            1 => Some(Self::And),
            2 => Some(Self::Nand),
            3 => Some(Self::Or),
            4 => Some(Self::Nor),
            5 => Some(Self::Xor),
            6 => Some(Self::Xnor),
            7 => Some(Self::Echo),
            _ => None,
        }
    }

    pub const fn apply(self, a: bool, b: bool) -> bool {
        match self {
            Self::Not => !a,
            Self::And => a && b,
            Self::Nand => !(a && b),
            Self::Or => a || b,
            Self::Nor => !(a || b),
            Self::Xor => a ^ b,
            Self::Xnor => !(a ^ b),
            Self::Echo => a,
        }
    }
}

/// Automatic reset period for the counter and timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum ResetInterval {
    #[default]
    Never = 0,
    Hourly = 1,
    Daily = 2,
    Monthly = 3,
}

impl ResetInterval {
    pub const MAX_RAW: u16 = Self::Monthly as u16;

    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::Never),
            1 => Some(Self::Hourly),
            2 => Some(Self::Daily),
            3 => Some(Self::Monthly),
            _ => None,
        }
    }
}
