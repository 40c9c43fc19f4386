//! Destructible object state machine.

use blastgrid_core::{DestructiblePolicy, DestructionState};

/// Outcome of telling a destructible to begin destruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Destruction {
    /// Already destroying; nothing changes.
    Ignored,
    /// Animation started; the object stays on its tile until it completes.
    Animating,
    /// Object leaves the grid immediately.
    Immediate,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Destructible {
    pub(crate) policy: DestructiblePolicy,
    pub(crate) state: DestructionState,
}

impl Destructible {
    pub(crate) fn new(policy: DestructiblePolicy) -> Self {
        Self {
            policy,
            state: DestructionState::Intact,
        }
    }

    pub(crate) fn begin(&mut self) -> Destruction {
        match self.state {
            DestructionState::Destroying => Destruction::Ignored,
            DestructionState::Intact if self.policy.animated => {
                self.state = DestructionState::Destroying;
                Destruction::Animating
            }
            DestructionState::Intact => Destruction::Immediate,
        }
    }
}
