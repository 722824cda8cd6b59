//! MCP3021 single-channel I2C converter (chemistry amplifier input).
//!
//! The part answers at one of eight addresses depending on its ordering
//! code, so [`Mcp3021::discover`] probes the whole block once at boot.

use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::error::SensorError;

/// First address of the MCP3021 block.
pub const BASE_ADDRESS: u8 = 0x48;
/// Last address of the MCP3021 block.
pub const LAST_ADDRESS: u8 = 0x4F;

pub struct Mcp3021<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp3021<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: BASE_ADDRESS,
        }
    }

    /// Probe the address block and keep the first device that answers.
    /// Falls back to [`BASE_ADDRESS`] when nothing does.
    pub fn discover(&mut self) -> u8 {
        let mut buf = [0u8; 2];
        for addr in BASE_ADDRESS..=LAST_ADDRESS {
            if self.i2c.read(addr, &mut buf).is_ok() {
                info!("MCP3021: found at 0x{addr:02X}");
                self.address = addr;
                return addr;
            }
        }
        warn!("MCP3021: no device answered, using 0x{BASE_ADDRESS:02X}");
        self.address = BASE_ADDRESS;
        BASE_ADDRESS
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// One conversion.
    pub fn read(&mut self) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c.read(self.address, &mut buf).map_err(|e| {
            debug!("MCP3021: read failed: {e:?}");
            SensorError::NotResponding
        })?;
        Ok((u16::from(buf[0]) << 6) | (u16::from(buf[1]) >> 2))
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}
