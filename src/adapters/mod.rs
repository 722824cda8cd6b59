//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                  |
//! |------------|--------------|------------------------------|
//! | `hardware` | SensorPort   | MCP3021 (I2C), MCP3208 (SPI) |
//! |            | OutputPort   | Relay / digital-out GPIO     |
//! | `log_sink` | EventSink    | Serial log output            |
//! | `nvs`      | ConfigPort   | NVS / in-memory store        |
//! |            | SettingsPort |                              |
//! |            | StoragePort  |                              |
//! | `time`     | (none)       | ESP32 system timer, SNTP     |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
