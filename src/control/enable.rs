//! Loop enable resolution and the one-shot latch.
//!
//! ```text
//!              active && ext
//!   Idle ────────────────────▶ Armed ──┐ active: stays Armed (enabled)
//!    ▲  ▲                        │     │
//!    │  └──── !active && !ext ───┘◀────┘
//!    │                           │ !active && ext
//!    │        !ext               ▼
//!    └─────────────────────── Spent
//! ```
//!
//! Only `Armed` enables.  `Spent` blocks a re-trigger until the external
//! source has dropped, so one external pulse yields one active cycle.

/// One-shot latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShotState {
    #[default]
    Idle,
    Armed,
    Spent,
}

impl ShotState {
    /// Advance the latch.  Returns the new state and whether it enables.
    pub fn step(self, active: bool, external: bool) -> (ShotState, bool) {
        match self {
            Self::Idle if active && external => (Self::Armed, true),
            Self::Idle => (Self::Idle, false),
            Self::Armed if active => (Self::Armed, true),
            Self::Armed if external => (Self::Spent, false),
            Self::Armed => (Self::Idle, false),
            Self::Spent if external => (Self::Spent, false),
            Self::Spent => (Self::Idle, false),
        }
    }
}

/// How a loop is enabled this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableSource {
    /// The manual enable flag is set.
    Manual,
    /// Follow an external digital state directly.
    Direct(bool),
    /// Latch on an external digital state for one active cycle.
    OneShot(bool),
    /// No manual enable and no usable external source.
    Off,
}

/// Resolve the enable for this tick, advancing the latch.
pub fn resolve(source: EnableSource, active: bool, shot: &mut ShotState) -> bool {
    match source {
        EnableSource::Manual => {
            *shot = ShotState::Idle;
            true
        }
        EnableSource::Direct(ext) => {
            *shot = ShotState::Idle;
            ext
        }
        EnableSource::OneShot(ext) => {
            let (next, enabled) = shot.step(active, ext);
            *shot = next;
            enabled
        }
        EnableSource::Off => {
            *shot = ShotState::Idle;
            false
        }
    }
}
