use crate::{
    events::{ComponentState, MAX_INVENTORY_SLOTS},
    world::error::WorldError,
    NetEntityId, Vec2,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    pub id: NetEntityId,
    pub position: Vec2,
    pub is_dead: bool,
}

impl Character {
    pub fn new(id: NetEntityId, position: Vec2) -> Self {
        Self {
            id,
            position,
            is_dead: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: NetEntityId,
    /// Last free-standing transform. While the item sits in an inventory its
    /// effective position is its owner's.
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    /// Attached items (wall fixtures, installed parts) cannot be picked up by
    /// a client claim, wherever they are.
    pub detachable: bool,
    pub has_body: bool,
    pub condition: f32,
    pub components: Vec<ComponentState>,
    pub(crate) parent: Option<NetEntityId>,
    pub(crate) previous_parent: Option<NetEntityId>,
}

impl Item {
    pub fn new(id: NetEntityId, position: Vec2) -> Self {
        Self {
            id,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            detachable: true,
            has_body: true,
            condition: 100.0,
            components: Vec::new(),
            parent: None,
            previous_parent: None,
        }
    }

    pub fn with_components(mut self, components: Vec<ComponentState>) -> Self {
        self.components = components;
        self
    }

    pub fn attached(mut self) -> Self {
        self.detachable = false;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.has_body = false;
        self
    }

    /// Inventory currently holding this item.
    pub fn parent(&self) -> Option<NetEntityId> {
        self.parent
    }

    /// Inventory this item was last removed from.
    pub fn previous_parent(&self) -> Option<NetEntityId> {
        self.previous_parent
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Who an inventory belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InventoryOwner {
    Character(NetEntityId),
    /// A container item such as a crate or a toolbox
    Item(NetEntityId),
    /// Fixed world storage that belongs to nobody
    World,
}

/// Who besides the owner may open a character's inventory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InventoryAccess {
    pub accessible_to_others: bool,
    pub accessible_when_owner_dead: bool,
}

/// A fixed-capacity row of slots. Slots only change through
/// [`crate::World`], which keeps every item in at most one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Inventory {
    id: NetEntityId,
    owner: InventoryOwner,
    access: InventoryAccess,
    slots: Vec<Option<NetEntityId>>,
}

impl Inventory {
    /// Character inventories share the id of their character and container
    /// inventories the id of their item.
    pub fn new(
        id: NetEntityId,
        owner: InventoryOwner,
        capacity: usize,
    ) -> Result<Self, WorldError> {
        if capacity == 0 || capacity > MAX_INVENTORY_SLOTS {
            return Err(WorldError::InvalidCapacity { capacity });
        }
        Ok(Self {
            id,
            owner,
            access: InventoryAccess::default(),
            slots: vec![None; capacity],
        })
    }

    pub fn with_access(mut self, access: InventoryAccess) -> Self {
        self.access = access;
        self
    }

    pub fn id(&self) -> NetEntityId {
        self.id
    }

    pub fn owner(&self) -> InventoryOwner {
        self.owner
    }

    pub fn access(&self) -> InventoryAccess {
        self.access
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<NetEntityId>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<NetEntityId> {
        self.slots.get(index).copied().flatten()
    }

    pub fn find(&self, item: NetEntityId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(item))
    }

    pub fn contains(&self, item: NetEntityId) -> bool {
        self.find(item).is_some()
    }

    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn items(&self) -> impl Iterator<Item = NetEntityId> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    pub(crate) fn set_slot(&mut self, index: usize, item: Option<NetEntityId>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = item;
        }
    }
}
