//! MCP3208 eight-channel SPI converter (temperature, analog and supply inputs).

use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::error::SensorError;

pub const INPUTS: u8 = 8;

pub struct Mcp3208<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp3208<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Start bit, single-ended mode, then the three input-select bits.
    fn command(input: u8) -> [u8; 3] {
        [0b0000_0110 | (input >> 2), (input & 0b11) << 6, 0]
    }

    /// One single-ended conversion of `input` (12-bit counts).
    pub fn read(&mut self, input: u8) -> Result<u16, SensorError> {
        if input >= INPUTS {
            return Err(SensorError::InvalidInput(input));
        }
        let tx = Self::command(input);
        let mut rx = [0u8; 3];
        self.spi.transfer(&mut rx, &tx).map_err(|e| {
            debug!("MCP3208: input {input} transfer failed: {e:?}");
            SensorError::BusFault
        })?;
        Ok((u16::from(rx[1] & 0x0F) << 8) | u16::from(rx[2]))
    }

    /// Route the multiplexer to `input` with a discarded conversion so the
    /// sample-and-hold settles before the real read.
    pub fn preselect(&mut self, input: u8) -> Result<(), SensorError> {
        self.read(input).map(|_| ())
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}
