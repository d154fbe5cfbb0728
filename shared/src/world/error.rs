use thiserror::Error;

use crate::NetEntityId;

/// Errors that can occur while mutating the entity arena
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// An entity with this id already exists
    #[error("Entity {id} already exists")]
    DuplicateEntity { id: NetEntityId },

    /// The reserved id cannot name an entity
    #[error("The reserved id 0 cannot be used for an entity")]
    ReservedId,

    #[error("Item {id} does not exist")]
    UnknownItem { id: NetEntityId },

    #[error("Character {id} does not exist")]
    UnknownCharacter { id: NetEntityId },

    #[error("Inventory {id} does not exist")]
    UnknownInventory { id: NetEntityId },

    /// Inventories hold between 1 and 255 slots
    #[error("Inventory capacity {capacity} is outside of 1..=255")]
    InvalidCapacity { capacity: usize },

    /// Component indices travel in 4 bits
    #[error("Item {id} has {count} components, at most 16 are replicated")]
    TooManyComponents { id: NetEntityId, count: usize },

    #[error("Slot {slot} is out of bounds for inventory {inventory} with capacity {capacity}")]
    SlotOutOfBounds {
        inventory: NetEntityId,
        slot: usize,
        capacity: usize,
    },

    #[error("Slot {slot} of inventory {inventory} is already occupied by {occupant}")]
    SlotOccupied {
        inventory: NetEntityId,
        slot: usize,
        occupant: NetEntityId,
    },

    /// The item must be detached before it can be placed again
    #[error("Item {item} is already in inventory {inventory}")]
    AlreadyPlaced {
        item: NetEntityId,
        inventory: NetEntityId,
    },

    /// Placing the item would put a container inside itself
    #[error("Placing item {item} into inventory {inventory} would create a containment cycle")]
    ContainmentCycle {
        item: NetEntityId,
        inventory: NetEntityId,
    },

    /// An inventory state did not have one entry per slot
    #[error("Inventory {inventory} has {expected} slots but {actual} were given")]
    SlotCountMismatch {
        inventory: NetEntityId,
        expected: usize,
        actual: usize,
    },

    /// The arena no longer satisfies its own invariants
    #[error("Inconsistent arena: {reason}")]
    Inconsistent { reason: String },
}
