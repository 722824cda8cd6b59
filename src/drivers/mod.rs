//! Converter drivers and peripheral helpers.
//!
//! Bus-level drivers are generic over the `embedded-hal` 1.0 traits so
//! they run against ESP-IDF peripherals on target and against mock buses in
//! tests.

pub mod mcp3021;
pub mod mcp3208;
pub mod watchdog;
