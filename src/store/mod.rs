//! Shared state store.
//!
//! Two flat namespaces: 16-bit data registers and boolean status flags.
//! Every engine reads and writes through typed accessors here; nothing else
//! carries state between components.
//!
//! Out-of-range addresses are a hard safety boundary.  Every access checks
//! its whole span first; a miss logs a warning, reads return the zero value
//! and writes are dropped.

pub mod addr;

use heapless::String;
use log::warn;

use crate::channel::{Channel, Units};
use crate::error::StoreError;

use addr::{DATA_SIZE, STATUS_SIZE, STRING_CHARS, STRING_REGS};

/// A packed register string.
pub type RegString = String<STRING_CHARS>;

// ───────────────────────────────────────────────────────────────
// StateStore
// ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct StateStore {
    data: [u16; DATA_SIZE as usize],
    status: [bool; STATUS_SIZE as usize],
    /// Deferred "limits need checking" request.
    limits_pending: bool,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            data: [0; DATA_SIZE as usize],
            status: [false; STATUS_SIZE as usize],
            limits_pending: false,
        }
    }

    // ── Bounds ────────────────────────────────────────────────

    /// Check that `len` registers from `addr` exist.
    pub fn check_data(&self, addr: u16, len: u16) -> Result<(), StoreError> {
        if (addr as u32) + (len as u32) <= DATA_SIZE as u32 {
            Ok(())
        } else {
            Err(StoreError::DataOutOfRange { addr, len })
        }
    }

    pub fn check_status(&self, addr: u16) -> Result<(), StoreError> {
        if addr < STATUS_SIZE {
            Ok(())
        } else {
            Err(StoreError::StatusOutOfRange(addr))
        }
    }

    fn data_span(&self, addr: u16, len: u16) -> Option<core::ops::Range<usize>> {
        match self.check_data(addr, len) {
            Ok(()) => Some(addr as usize..(addr + len) as usize),
            Err(e) => {
                warn!("Store: {e}");
                None
            }
        }
    }

    fn status_index(&self, addr: u16) -> Option<usize> {
        match self.check_status(addr) {
            Ok(()) => Some(addr as usize),
            Err(e) => {
                warn!("Store: {e}");
                None
            }
        }
    }

    // ── 16-bit ────────────────────────────────────────────────

    pub fn u16(&self, addr: u16) -> u16 {
        self.data_span(addr, 1).map_or(0, |r| self.data[r.start])
    }

    pub fn set_u16(&mut self, addr: u16, value: u16) {
        if let Some(r) = self.data_span(addr, 1) {
            self.data[r.start] = value;
        }
    }

    pub fn i16(&self, addr: u16) -> i16 {
        self.u16(addr) as i16
    }

    pub fn set_i16(&mut self, addr: u16, value: i16) {
        self.set_u16(addr, value as u16);
    }

    // ── 32-bit (low word first) ───────────────────────────────

    pub fn u32(&self, addr: u16) -> u32 {
        self.data_span(addr, 2).map_or(0, |r| {
            u32::from(self.data[r.start]) | (u32::from(self.data[r.start + 1]) << 16)
        })
    }

    pub fn set_u32(&mut self, addr: u16, value: u32) {
        if let Some(r) = self.data_span(addr, 2) {
            self.data[r.start] = value as u16;
            self.data[r.start + 1] = (value >> 16) as u16;
        }
    }

    pub fn f32(&self, addr: u16) -> f32 {
        f32::from_bits(self.u32(addr))
    }

    pub fn set_f32(&mut self, addr: u16, value: f32) {
        self.set_u32(addr, value.to_bits());
    }

    // ── Strings (two characters per register, high byte first) ─

    pub fn string(&self, addr: u16) -> RegString {
        let mut out = RegString::new();
        let Some(span) = self.data_span(addr, STRING_REGS) else {
            return out;
        };
        let mut bytes = [0u8; STRING_CHARS];
        for (i, reg) in self.data[span].iter().enumerate() {
            bytes[2 * i] = (reg >> 8) as u8;
            bytes[2 * i + 1] = *reg as u8;
        }
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(STRING_CHARS);
        // Invalid UTF-8 (e.g. a half-written remote edit) reads as empty.
        if let Ok(s) = core::str::from_utf8(&bytes[..len]) {
            let _ = out.push_str(s);
        }
        out
    }

    /// Store `value`, truncated to the block on a character boundary.
    pub fn set_string(&mut self, addr: u16, value: &str) {
        let Some(span) = self.data_span(addr, STRING_REGS) else {
            return;
        };
        let mut bytes = [0u8; STRING_CHARS];
        let mut len = 0;
        for ch in value.chars() {
            let n = ch.len_utf8();
            if len + n > STRING_CHARS {
                break;
            }
            ch.encode_utf8(&mut bytes[len..len + n]);
            len += n;
        }
        for (i, reg) in self.data[span].iter_mut().enumerate() {
            *reg = (u16::from(bytes[2 * i]) << 8) | u16::from(bytes[2 * i + 1]);
        }
    }

    // ── Flags ─────────────────────────────────────────────────

    pub fn flag(&self, addr: u16) -> bool {
        self.status_index(addr).is_some_and(|i| self.status[i])
    }

    pub fn set_flag(&mut self, addr: u16, value: bool) {
        if let Some(i) = self.status_index(addr) {
            self.status[i] = value;
        }
    }

    /// Read a flag and clear it.
    pub fn take_flag(&mut self, addr: u16) -> bool {
        let set = self.flag(addr);
        if set {
            self.set_flag(addr, false);
        }
        set
    }

    // ── Typed selectors ───────────────────────────────────────

    /// Channel selector; unknown codes decode as `Channel::None`.
    pub fn channel(&self, addr: u16) -> Channel {
        Channel::from_raw(self.u16(addr)).unwrap_or_default()
    }

    pub fn set_channel(&mut self, addr: u16, ch: Channel) {
        self.set_u16(addr, ch.raw());
    }

    /// Unit code; unknown codes decode as `Units::None`.
    pub fn units(&self, addr: u16) -> Units {
        Units::from_raw(self.u16(addr)).unwrap_or_default()
    }

    pub fn set_units(&mut self, addr: u16, units: Units) {
        self.set_u16(addr, units.raw());
    }

    // ── Deferred limit check ──────────────────────────────────

    /// Ask for configuration limits to be re-validated before the next tick.
    pub fn request_limit_check(&mut self) {
        self.limits_pending = true;
    }

    /// Consume a pending limit-check request.
    pub fn take_limit_check(&mut self) -> bool {
        core::mem::take(&mut self.limits_pending)
    }

    pub fn limits_pending(&self) -> bool {
        self.limits_pending
    }

    // ── Raw image ─────────────────────────────────────────────

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn status(&self) -> &[bool] {
        &self.status
    }

    /// Copy a persisted image back in.  Shorter images leave the tail
    /// untouched; longer images are truncated.
    pub fn restore(&mut self, data: &[u16], status: &[bool]) {
        let n = data.len().min(self.data.len());
        self.data[..n].copy_from_slice(&data[..n]);
        let n = status.len().min(self.status.len());
        self.status[..n].copy_from_slice(&status[..n]);
    }

    /// Zero every register below `end`.
    pub fn clear_data_below(&mut self, end: u16) {
        let end = (end as usize).min(self.data.len());
        self.data[..end].fill(0);
    }

    pub fn clear_status(&mut self) {
        self.status.fill(false);
    }
}
