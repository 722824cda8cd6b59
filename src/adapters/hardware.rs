//! Hardware adapter: bridges the converters and output pins to the
//! domain port traits.
//!
//! Generic over `embedded-hal` buses and pins: on target it is built from
//! `esp-idf-hal` drivers, in tests from mocks.  This is the only module in
//! the system that touches actual hardware.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;
use log::warn;

use crate::app::ports::{OutputPort, SensorPort};
use crate::channel::{OUTPUT_COUNT, OutputId};
use crate::drivers::mcp3021::Mcp3021;
use crate::drivers::mcp3208::Mcp3208;
use crate::error::SensorError;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, SPI, P> {
    chemistry: Mcp3021<I2C>,
    multi: Mcp3208<SPI>,
    /// Relay 1, relay 2, digital out 1, digital out 2.
    outputs: [P; OUTPUT_COUNT],
}

impl<I2C: I2c, SPI: SpiDevice, P: OutputPin> HardwareAdapter<I2C, SPI, P> {
    /// Takes ownership of the buses and pins; the chemistry converter's
    /// address is discovered here.
    pub fn new(i2c: I2C, spi: SPI, outputs: [P; OUTPUT_COUNT]) -> Self {
        let mut chemistry = Mcp3021::new(i2c);
        chemistry.discover();
        let mut adapter = Self {
            chemistry,
            multi: Mcp3208::new(spi),
            outputs,
        };
        for out in OutputId::ALL {
            adapter.set_output(out, false);
        }
        adapter
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C: I2c, SPI: SpiDevice, P: OutputPin> SensorPort for HardwareAdapter<I2C, SPI, P> {
    fn read_chemistry(&mut self) -> Result<u16, SensorError> {
        self.chemistry.read()
    }

    fn read_channel(&mut self, input: u8) -> Result<u16, SensorError> {
        self.multi.read(input)
    }

    fn preselect(&mut self, input: u8) -> Result<(), SensorError> {
        self.multi.preselect(input)
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl<I2C: I2c, SPI: SpiDevice, P: OutputPin> OutputPort for HardwareAdapter<I2C, SPI, P> {
    fn set_output(&mut self, output: OutputId, on: bool) {
        let pin = &mut self.outputs[output.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            warn!("Hardware: {output} pin write failed: {e:?}");
        }
    }
}
