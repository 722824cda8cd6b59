//! Fuzz target: remote register and coil writes
//!
//! Decodes the input as a stream of 5-byte write requests, applies each
//! through the register protocol, runs the limit pass after every accepted
//! write and ticks the control core.  Asserts that the limit pass leaves
//! the settings in a state a second pass does not change and that an owned
//! output never resolves on against its owner's vote.
//!
//! cargo fuzz run fuzz_register_writes

#![no_main]

use libfuzzer_sys::fuzz_target;
use symbctrl::channel::OutputId;
use symbctrl::config::SystemConfig;
use symbctrl::control::ControlEngine;
use symbctrl::protocol;
use symbctrl::settings::{enforce_limits, load_defaults};
use symbctrl::state::SystemState;

fuzz_target!(|data: &[u8]| {
    let config = SystemConfig::default();
    let mut state = SystemState::new();
    load_defaults(&mut state.store, &config);
    enforce_limits(&mut state);
    let mut control = ControlEngine::new(&config);

    for (i, chunk) in data.chunks_exact(5).enumerate() {
        let at = u16::from_le_bytes([chunk[0], chunk[1]]);
        let value = u16::from_le_bytes([chunk[2], chunk[3]]);
        let accepted = if chunk[4] & 1 == 0 {
            protocol::write_holding(&mut state.store, at, value).is_ok()
        } else {
            protocol::write_coil(&mut state.store, at, value).is_ok()
        };
        if accepted && state.store.take_limit_check() {
            enforce_limits(&mut state);
            assert_eq!(enforce_limits(&mut state), 0, "limit pass is not idempotent");
        }
        control.step(i as u32 * 250, &mut state);
    }

    for out in OutputId::ALL {
        if let Some(source) = state.ownership.owner(out) {
            assert!(state.matrix.vote(out, source) || !state.matrix.resolve(out));
        }
    }
});
