//! SymbCtrl firmware library.
//!
//! Exposes the acquisition, control and arbitration core for integration
//! testing and host-side simulation.  All ESP-IDF-specific code is guarded
//! by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod channel;
pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod logic;
pub mod matrix;
pub mod merge;
pub mod outputs;
pub mod pins;
pub mod protocol;
pub mod safety;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod store;
pub mod timing;

// Hardware-facing layers; the ESP-IDF branches are cfg-gated inside.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;
