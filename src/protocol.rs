//! Register-protocol boundary.
//!
//! Holding registers map one-to-one onto the data namespace and coils onto
//! the status namespace.  Every request is checked against the address range
//! and a per-address [`Access`] table before it touches the store.  Accepted
//! writes request a limit pass so the engines never run on unchecked
//! configuration.
//!
//! Coil sentinels (`0xFF00` on, `0x0000` off) are translated here and
//! nowhere else.

use heapless::Vec;
use log::debug;

use crate::error::ProtocolError;
use crate::store::StateStore;
use crate::store::addr::{self, loop_addr, loop_reg, LOOP_COUNT};

pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;

/// Largest block a single holding-register read may return.
pub const MAX_READ_REGISTERS: usize = 125;

/// Direction(s) a remote client may access an address in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    /// Reserved; neither readable nor writable.
    NotConnected,
}

impl Access {
    pub const fn readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    pub const fn writable(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

// ───────────────────────────────────────────────────────────────
// Access tables
// ───────────────────────────────────────────────────────────────

fn is_loop_extreme(at: u16) -> bool {
    (0..LOOP_COUNT).any(|i| {
        let lo = loop_addr(i, loop_reg::MINIMUM);
        let hi = loop_addr(i, loop_reg::MAXIMUM) + 1;
        (lo..=hi).contains(&at)
    })
}

/// Access for a holding register, `None` past the data namespace.
pub fn holding_access(at: u16) -> Option<Access> {
    if at >= addr::DATA_SIZE {
        return None;
    }
    let access = match at {
        0..=3 | 5 | 11..=16 | 20..=35 | 43 | 151 | 152 | 155 | 156 | 158 | 170..=177 => {
            Access::ReadOnly
        }
        _ if is_loop_extreme(at) => Access::ReadOnly,
        300..=315 => Access::WriteOnly,
        6 | 7 | 17..=19 | 45..=49 | 134 | 135 | 159..=165 | 169 | 316..=319 => {
            Access::NotConnected
        }
        _ => Access::ReadWrite,
    };
    Some(access)
}

/// Access for a coil, `None` past the status namespace.
pub fn coil_access(at: u16) -> Option<Access> {
    if at >= addr::STATUS_SIZE {
        return None;
    }
    let access = match at {
        0..=2 | 8..=13 | 20..=29 | 38..=54 | 62 => Access::ReadOnly,
        3 | 4 | 55..=58 | 63 | 64 | 70 => Access::WriteOnly,
        5 | 6 | 59 | 60 | 65 => Access::NotConnected,
        _ => Access::ReadWrite,
    };
    Some(access)
}

fn check_read(access: Option<Access>, at: u16) -> Result<(), ProtocolError> {
    match access {
        None => Err(ProtocolError::IllegalAddress(at)),
        Some(a) if a.readable() => Ok(()),
        Some(_) => Err(ProtocolError::NotPermitted(at)),
    }
}

fn check_write(access: Option<Access>, at: u16) -> Result<(), ProtocolError> {
    match access {
        None => Err(ProtocolError::IllegalAddress(at)),
        Some(a) if a.writable() => Ok(()),
        Some(_) => Err(ProtocolError::NotPermitted(at)),
    }
}

// ───────────────────────────────────────────────────────────────
// Coil sentinels
// ───────────────────────────────────────────────────────────────

pub fn coil_to_bool(raw: u16) -> Result<bool, ProtocolError> {
    match raw {
        COIL_ON => Ok(true),
        COIL_OFF => Ok(false),
        other => Err(ProtocolError::IllegalValue(other)),
    }
}

pub const fn bool_to_coil(on: bool) -> u16 {
    if on { COIL_ON } else { COIL_OFF }
}

// ───────────────────────────────────────────────────────────────
// Requests
// ───────────────────────────────────────────────────────────────

pub fn read_holding(store: &StateStore, at: u16) -> Result<u16, ProtocolError> {
    check_read(holding_access(at), at)?;
    Ok(store.u16(at))
}

/// Read `count` consecutive registers; any unreadable address fails the lot.
pub fn read_holdings(
    store: &StateStore,
    start: u16,
    count: u16,
) -> Result<Vec<u16, MAX_READ_REGISTERS>, ProtocolError> {
    if count as usize > MAX_READ_REGISTERS {
        return Err(ProtocolError::IllegalValue(count));
    }
    store.check_data(start, count)?;
    let mut out = Vec::new();
    for at in start..start + count {
        check_read(holding_access(at), at)?;
        // Bounded by the count check above.
        let _ = out.push(store.u16(at));
    }
    Ok(out)
}

pub fn write_holding(store: &mut StateStore, at: u16, value: u16) -> Result<(), ProtocolError> {
    check_write(holding_access(at), at)?;
    apply_holding(store, at, value);
    store.request_limit_check();
    Ok(())
}

/// Write consecutive registers.  Every address is checked before any is
/// written, so a float pair never lands half-updated.
pub fn write_holdings(store: &mut StateStore, start: u16, values: &[u16]) -> Result<(), ProtocolError> {
    let len = u16::try_from(values.len()).map_err(|_| ProtocolError::IllegalAddress(start))?;
    store.check_data(start, len)?;
    for at in start..start + len {
        check_write(holding_access(at), at)?;
    }
    for (at, &v) in (start..).zip(values) {
        apply_holding(store, at, v);
    }
    store.request_limit_check();
    Ok(())
}

fn apply_holding(store: &mut StateStore, at: u16, value: u16) {
    debug!("Protocol: write {at} = {value}");
    store.set_u16(at, value);
    if at == addr::HEARTBEAT_IN {
        store.set_u16(addr::HEARTBEAT_OUT, value);
    }
}

pub fn read_coil(store: &StateStore, at: u16) -> Result<bool, ProtocolError> {
    check_read(coil_access(at), at)?;
    Ok(store.flag(at))
}

/// Write a coil from its on-the-wire sentinel.
pub fn write_coil(store: &mut StateStore, at: u16, raw: u16) -> Result<(), ProtocolError> {
    check_write(coil_access(at), at)?;
    let on = coil_to_bool(raw)?;
    debug!("Protocol: coil {at} = {on}");
    store.set_flag(at, on);
    store.request_limit_check();
    Ok(())
}
