//! Physical output driver.
//!
//! Owned outputs follow the arbitration matrix; unowned outputs follow the
//! manual request flags so an operator can drive them directly.

use heapless::Vec;
use log::info;

use crate::app::ports::OutputPort;
use crate::channel::{OUTPUT_COUNT, OutputId};
use crate::state::SystemState;
use crate::store::addr::flag;

/// An output that changed on this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputChange {
    pub output: OutputId,
    pub on: bool,
}

#[derive(Debug, Default)]
pub struct OutputDriver {
    applied: [Option<bool>; OUTPUT_COUNT],
}

impl OutputDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Desired state of one output.
    pub fn desired(state: &SystemState, out: OutputId) -> bool {
        if state.ownership.owner(out).is_some() {
            state.matrix.resolve(out)
        } else {
            state.store.flag(flag::output_request(out))
        }
    }

    /// Resolve and drive every output; returns what changed.
    pub fn service(
        &mut self,
        state: &mut SystemState,
        port: &mut impl OutputPort,
    ) -> Vec<OutputChange, OUTPUT_COUNT> {
        let mut changes = Vec::new();
        for out in OutputId::ALL {
            let on = Self::desired(state, out);
            state.store.set_flag(flag::output_status(out), on);
            let slot = &mut self.applied[out.index()];
            if *slot != Some(on) {
                port.set_output(out, on);
                if slot.is_some() {
                    info!("Outputs: {out} {}", if on { "on" } else { "off" });
                    // One entry per output at most.
                    let _ = changes.push(OutputChange { output: out, on });
                }
                *slot = Some(on);
            }
        }
        changes
    }

    pub fn applied(&self, out: OutputId) -> Option<bool> {
        self.applied[out.index()]
    }
}
