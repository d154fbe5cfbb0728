use ballast_shared::NetEntityId;

/// Who submitted a claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requester {
    /// Used in audit lines only
    pub name: String,
    /// Character the requester currently controls
    pub character: Option<NetEntityId>,
}

impl Requester {
    pub fn new(name: impl Into<String>, character: Option<NetEntityId>) -> Self {
        Self {
            name: name.into(),
            character,
        }
    }
}

/// A change the reconciler applied to the authoritative world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InventoryChange {
    /// Taken from the ground (`from == None`) or from another inventory
    PickedUp {
        item: NetEntityId,
        slot: usize,
        from: Option<NetEntityId>,
    },
    /// Rearranged within the claimed inventory
    Moved {
        item: NetEntityId,
        from_slot: usize,
        to_slot: usize,
    },
    /// Left at the owner's location
    Dropped { item: NetEntityId, slot: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    SlotOccupied { occupant: NetEntityId },
    /// The item is fixed in another inventory
    NotDetachable,
    NoAccess,
    /// The item is the container holding this inventory, directly or further up
    Cycle,
}

/// A claimed slot the reconciler refused to fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub slot: usize,
    pub item: NetEntityId,
    pub reason: RejectionReason,
}

/// Everything one reconciliation pass did and what the server must send
/// because of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileOutcome {
    pub inventory: NetEntityId,
    /// The requester may not touch this inventory; nothing was applied
    pub access_denied: bool,
    pub changes: Vec<InventoryChange>,
    pub rejections: Vec<Rejection>,
    /// Other inventories that gained or lost an item, or whose item a
    /// rejected claim referred to
    pub dirty_inventories: Vec<NetEntityId>,
    /// Items whose position the requester must be sent again
    pub forced_resyncs: Vec<NetEntityId>,
    pub audit: Vec<String>,
    /// Inventories whose authoritative state must be broadcast this tick, the
    /// claimed inventory first
    pub broadcasts: Vec<NetEntityId>,
}

impl ReconcileOutcome {
    pub(crate) fn new(inventory: NetEntityId) -> Self {
        Self {
            inventory,
            ..Default::default()
        }
    }

    /// Whether the world now matches what the requester asked for.
    pub fn fully_accepted(&self) -> bool {
        !self.access_denied && self.rejections.is_empty()
    }

    pub(crate) fn mark_dirty(&mut self, inventory: NetEntityId) {
        if inventory != self.inventory && !self.dirty_inventories.contains(&inventory) {
            self.dirty_inventories.push(inventory);
        }
    }

    pub(crate) fn finish(&mut self) {
        self.dirty_inventories.sort();
        self.broadcasts.clear();
        self.broadcasts.push(self.inventory);
        self.broadcasts.extend(self.dirty_inventories.iter().copied());
    }
}
