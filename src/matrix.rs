//! Output arbitration.
//!
//! ```text
//!               Relay1  Relay2  DOut1  DOut2
//!   Loop1        true    false   true   true     <- Loop1 claims Relay2, off
//!   Loop2        true    true    true   true     <- not claiming
//!   ...
//!   TimeLimited  true    true    true   true
//!   ─────────────────────────────────────────
//!   resolve      AND     AND     AND    AND
//! ```
//!
//! Each source owns one row.  Columns it does not claim stay `true` so they
//! never veto.  The [`OwnershipTable`] records the single source allowed to
//! claim each physical output; the limit pass rebuilds it, drops any second
//! claimant and then calls [`OutputMatrix::adopt`] so a newly granted owner
//! holds its output off until it first publishes.

use core::fmt;

use crate::channel::{OUTPUT_COUNT, OutputId};

// ───────────────────────────────────────────────────────────────
// Sources
// ───────────────────────────────────────────────────────────────

pub const SOURCE_COUNT: usize = 7;

/// A logical writer into the matrix, in claim-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Loop1,
    Loop2,
    Loop3,
    Loop4,
    TimeOfDay,
    Logic,
    TimeLimited,
}

impl Source {
    pub const ALL: [Source; SOURCE_COUNT] = [
        Self::Loop1,
        Self::Loop2,
        Self::Loop3,
        Self::Loop4,
        Self::TimeOfDay,
        Self::Logic,
        Self::TimeLimited,
    ];

    pub const LOOPS: [Source; 4] = [Self::Loop1, Self::Loop2, Self::Loop3, Self::Loop4];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Source for control loop `index` (0-based).
    pub fn for_loop(index: usize) -> Option<Self> {
        Self::LOOPS.get(index).copied()
    }

    pub fn is_loop(self) -> bool {
        Self::LOOPS.contains(&self)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loop1 => write!(f, "loop 1"),
            Self::Loop2 => write!(f, "loop 2"),
            Self::Loop3 => write!(f, "loop 3"),
            Self::Loop4 => write!(f, "loop 4"),
            Self::TimeOfDay => write!(f, "time-of-day"),
            Self::Logic => write!(f, "logic gate"),
            Self::TimeLimited => write!(f, "time-limited command"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// OutputMatrix
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMatrix {
    votes: [[bool; OUTPUT_COUNT]; SOURCE_COUNT],
}

impl Default for OutputMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputMatrix {
    /// All rows inert.
    pub const fn new() -> Self {
        Self {
            votes: [[true; OUTPUT_COUNT]; SOURCE_COUNT],
        }
    }

    /// Rewrite `source`'s row: `state` at `output`, `true` everywhere else.
    /// `None` releases the whole row.
    pub fn publish(&mut self, source: Source, output: Option<OutputId>, state: bool) {
        let row = &mut self.votes[source.index()];
        *row = [true; OUTPUT_COUNT];
        if let Some(out) = output {
            row[out.index()] = state;
        }
    }

    /// Rewrite `source`'s row with `state` at every listed output.
    pub fn publish_many(&mut self, source: Source, outputs: &[OutputId], state: bool) {
        let row = &mut self.votes[source.index()];
        *row = [true; OUTPUT_COUNT];
        for out in outputs {
            row[out.index()] = state;
        }
    }

    pub fn release(&mut self, source: Source) {
        self.publish(source, None, true);
    }

    /// AND of every source's vote for `output`.
    pub fn resolve(&self, output: OutputId) -> bool {
        self.votes.iter().all(|row| row[output.index()])
    }

    pub fn vote(&self, output: OutputId, source: Source) -> bool {
        self.votes[source.index()][output.index()]
    }

    /// Align the columns with a rebuilt ownership table.  Non-owners stop
    /// voting; an owner that was not the owner in `previous` starts at off.
    pub fn adopt(&mut self, previous: &OwnershipTable, current: &OwnershipTable) {
        for out in OutputId::ALL {
            let owner = current.owner(out);
            let granted = owner.is_some() && owner != previous.owner(out);
            for source in Source::ALL {
                let cell = &mut self.votes[source.index()][out.index()];
                if Some(source) != owner {
                    *cell = true;
                } else if granted {
                    *cell = false;
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// OwnershipTable
// ───────────────────────────────────────────────────────────────

/// A second source tried to claim an already-owned output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipConflict {
    pub output: OutputId,
    pub owner: Source,
    pub claimant: Source,
}

impl fmt::Display for OwnershipConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} already owned by {}, {} dropped",
            self.output, self.owner, self.claimant
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipTable {
    owners: [Option<Source>; OUTPUT_COUNT],
}

impl OwnershipTable {
    pub const fn new() -> Self {
        Self {
            owners: [None; OUTPUT_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.owners = [None; OUTPUT_COUNT];
    }

    /// Record `source` as the owner of `output`.  Re-claiming by the current
    /// owner is allowed.
    pub fn claim(&mut self, output: OutputId, source: Source) -> Result<(), OwnershipConflict> {
        match self.owners[output.index()] {
            Some(owner) if owner != source => Err(OwnershipConflict {
                output,
                owner,
                claimant: source,
            }),
            _ => {
                self.owners[output.index()] = Some(source);
                Ok(())
            }
        }
    }

    pub fn owner(&self, output: OutputId) -> Option<Source> {
        self.owners[output.index()]
    }
}
