//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration for the SymbCtrl controller:
//! the fixed per-tick engine order, command handling and persistence
//! requests.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
