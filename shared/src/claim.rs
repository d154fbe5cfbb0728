use crate::{EventPayload, NetEntityId};

/// What a client believes an inventory should contain after its local change.
/// Never trusted until the server has validated it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventorySlotClaim {
    slots: Vec<Option<NetEntityId>>,
}

impl InventorySlotClaim {
    pub fn new(slots: Vec<Option<NetEntityId>>) -> Self {
        Self { slots }
    }

    /// Reads a claim out of an `InventoryState` payload.
    pub fn from_payload(payload: &EventPayload) -> Option<Self> {
        match payload {
            EventPayload::InventoryState { slots } => Some(Self {
                slots: slots.iter().map(|id| id.to_option()).collect(),
            }),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<NetEntityId>] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<NetEntityId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn to_payload(&self) -> EventPayload {
        EventPayload::inventory_state(&self.slots)
    }
}
