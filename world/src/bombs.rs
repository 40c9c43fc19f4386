//! Bomb lifecycle state machine.

use blastgrid_core::{PlayerId, TileCoord};

/// Lifecycle phase of a bomb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BombPhase {
    /// Instantiated on the grid, fuse not yet running.
    Placed,
    /// Fuse running.
    Armed,
    /// Exploded. Terminal.
    Detonated,
}

/// Inputs that drive [`BombPhase`] transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BombInput {
    /// The fuse timer was scheduled.
    Arm,
    /// The fuse ran out or a blast reached the bomb.
    Detonate,
}

impl BombPhase {
    /// Returns the next phase, or `None` when the input does not apply.
    pub(crate) fn transition(self, input: BombInput) -> Option<BombPhase> {
        match (self, input) {
            (Self::Placed, BombInput::Arm) => Some(Self::Armed),
            (Self::Armed, BombInput::Detonate) => Some(Self::Detonated),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Bomb {
    pub(crate) owner: PlayerId,
    pub(crate) tile: TileCoord,
    pub(crate) force: u32,
    pub(crate) phase: BombPhase,
}

impl Bomb {
    pub(crate) fn place(owner: PlayerId, tile: TileCoord, force: u32) -> Self {
        Self {
            owner,
            tile,
            force,
            phase: BombPhase::Placed,
        }
    }

    /// Applies an input, reporting whether the phase changed.
    pub(crate) fn fire(&mut self, input: BombInput) -> bool {
        match self.phase.transition(input) {
            Some(next) => {
                self.phase = next;
                true
            }
            None => false,
        }
    }
}
