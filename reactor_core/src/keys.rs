//! Runtime identifiers for the static trigger/reaction graph.
//!
//! The graph is fixed for the lifetime of the program, so plain index
//! newtypes are enough here; there is no need for the generational
//! slot-map keys a dynamic reactor hierarchy would require.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a [`Trigger`](reactor_runtime) in the static trigger table.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerId(pub u32);

/// Identifies a [`Reaction`](reactor_runtime) in the static reaction table.
///
/// The numeric value doubles as the reaction's topological priority index,
/// so `ReactionId`'s derived `Ord` is exactly the ordering the reaction
/// queue needs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReactionId(pub u32);

impl TriggerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ReactionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

impl std::fmt::Display for ReactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reaction#{}", self.0)
    }
}
