//! GPIO / peripheral pin assignments for the SymbCtrl controller board.
//!
//! `main.rs` claims the matching `gpioN` peripherals; keep the two in step.

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Relay coil drivers (active HIGH).
pub const RELAY1_GPIO: i32 = 14;
pub const RELAY2_GPIO: i32 = 9;

/// Open-drain digital outputs (active HIGH).
pub const DIGITAL_OUT1_GPIO: i32 = 33;
pub const DIGITAL_OUT2_GPIO: i32 = 37;

/// In [`crate::channel::OutputId`] order.
pub const OUTPUT_GPIOS: [i32; crate::channel::OUTPUT_COUNT] =
    [RELAY1_GPIO, RELAY2_GPIO, DIGITAL_OUT1_GPIO, DIGITAL_OUT2_GPIO];

// ---------------------------------------------------------------------------
// SPI bus: multi-channel converter (MCP3208)
// ---------------------------------------------------------------------------

pub const SPI_SCLK_GPIO: i32 = 16;
pub const SPI_MOSI_GPIO: i32 = 34;
pub const SPI_MISO_GPIO: i32 = 18;
pub const SPI_CS_GPIO: i32 = 38;
/// MCP3208 is specified to 2 MHz at 5 V, 1 MHz at 2.7 V.
pub const SPI_BAUD_HZ: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// I²C bus: chemistry front-end converter (MCP3021)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 35;
pub const I2C_SCL_GPIO: i32 = 36;
pub const I2C_BAUD_HZ: u32 = 100_000;
