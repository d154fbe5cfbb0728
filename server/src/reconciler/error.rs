use ballast_shared::{NetEntityId, WorldError};
use thiserror::Error;

/// Errors that make an inventory claim impossible to reconcile at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// The claim does not have exactly one entry per slot
    #[error("Claim for inventory {inventory} has {actual} slots but the inventory has {expected}")]
    LengthMismatch {
        inventory: NetEntityId,
        expected: usize,
        actual: usize,
    },

    /// The claimed inventory does not exist on the server
    #[error("Claim targets unknown inventory {inventory}")]
    UnknownInventory { inventory: NetEntityId },

    /// Applying a validated claim broke an arena invariant
    #[error("Arena refused a validated claim: {0}")]
    Arena(#[from] WorldError),
}
