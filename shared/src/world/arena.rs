use std::collections::{HashMap, HashSet};

use log::trace;

use crate::{
    events::MAX_COMPONENT_INDEX,
    world::{
        entities::{Character, Inventory, InventoryOwner, Item},
        error::WorldError,
    },
    NetEntityId, Vec2,
};

// Containers nest, but never this deep in practice; the bound only protects
// the walks below from a corrupted arena.
const MAX_NESTING: usize = 64;

/// Arena of every networked entity, keyed by id. Entities refer to each other
/// by id only.
#[derive(Clone, Debug, Default)]
pub struct World {
    characters: HashMap<NetEntityId, Character>,
    items: HashMap<NetEntityId, Item>,
    inventories: HashMap<NetEntityId, Inventory>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_free_id(&self, id: NetEntityId) -> Result<(), WorldError> {
        if id.is_none() {
            return Err(WorldError::ReservedId);
        }
        if self.characters.contains_key(&id) || self.items.contains_key(&id) {
            return Err(WorldError::DuplicateEntity { id });
        }
        Ok(())
    }

    pub fn insert_character(&mut self, character: Character) -> Result<(), WorldError> {
        self.ensure_free_id(character.id)?;
        self.characters.insert(character.id, character);
        Ok(())
    }

    /// Inserts a free-standing item. Use [`World::put_item`] to place it.
    pub fn insert_item(&mut self, mut item: Item) -> Result<(), WorldError> {
        self.ensure_free_id(item.id)?;
        if item.components.len() > usize::from(MAX_COMPONENT_INDEX) + 1 {
            return Err(WorldError::TooManyComponents {
                id: item.id,
                count: item.components.len(),
            });
        }
        item.parent = None;
        item.previous_parent = None;
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Inserts an empty inventory. The owning character or item must exist.
    pub fn insert_inventory(&mut self, inventory: Inventory) -> Result<(), WorldError> {
        let id = inventory.id();
        if id.is_none() {
            return Err(WorldError::ReservedId);
        }
        if self.inventories.contains_key(&id) {
            return Err(WorldError::DuplicateEntity { id });
        }
        match inventory.owner() {
            InventoryOwner::Character(owner) if !self.characters.contains_key(&owner) => {
                return Err(WorldError::UnknownCharacter { id: owner });
            }
            InventoryOwner::Item(owner) if !self.items.contains_key(&owner) => {
                return Err(WorldError::UnknownItem { id: owner });
            }
            _ => {}
        }
        let mut inventory = inventory;
        for slot in 0..inventory.capacity() {
            inventory.set_slot(slot, None);
        }
        self.inventories.insert(id, inventory);
        Ok(())
    }

    pub fn character(&self, id: NetEntityId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: NetEntityId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn item(&self, id: NetEntityId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: NetEntityId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn inventory(&self, id: NetEntityId) -> Option<&Inventory> {
        self.inventories.get(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn inventories(&self) -> impl Iterator<Item = &Inventory> {
        self.inventories.values()
    }

    pub fn inventory_ids(&self) -> Vec<NetEntityId> {
        let mut ids: Vec<NetEntityId> = self.inventories.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Where the owner of `inventory` stands.
    pub fn owner_position(&self, inventory: NetEntityId) -> Option<Vec2> {
        let inventory = self.inventories.get(&inventory)?;
        match inventory.owner() {
            InventoryOwner::Character(id) => self.characters.get(&id).map(|c| c.position),
            InventoryOwner::Item(id) => self.world_position(id),
            InventoryOwner::World => None,
        }
    }

    /// Effective position of an item: its own when free-standing, otherwise
    /// that of whatever ultimately holds it.
    pub fn world_position(&self, item: NetEntityId) -> Option<Vec2> {
        let mut current = self.items.get(&item)?;
        for _ in 0..MAX_NESTING {
            let Some(parent) = current.parent else {
                return Some(current.position);
            };
            let Some(inventory) = self.inventories.get(&parent) else {
                return Some(current.position);
            };
            match inventory.owner() {
                InventoryOwner::Character(id) => {
                    return self.characters.get(&id).map(|c| c.position);
                }
                InventoryOwner::Item(id) => match self.items.get(&id) {
                    Some(container) => current = container,
                    None => return Some(current.position),
                },
                InventoryOwner::World => return Some(current.position),
            }
        }
        Some(current.position)
    }

    /// The character that ultimately holds `inventory`, looking through
    /// containers.
    pub fn root_character(&self, inventory: NetEntityId) -> Option<NetEntityId> {
        let mut current = inventory;
        for _ in 0..MAX_NESTING {
            match self.inventories.get(&current)?.owner() {
                InventoryOwner::Character(id) => return Some(id),
                InventoryOwner::World => return None,
                InventoryOwner::Item(id) => current = self.items.get(&id)?.parent?,
            }
        }
        None
    }

    /// Whether placing `item` into `inventory` would put a container inside
    /// itself.
    pub fn would_create_cycle(&self, item: NetEntityId, inventory: NetEntityId) -> bool {
        let mut current = inventory;
        for _ in 0..MAX_NESTING {
            let Some(holder) = self.inventories.get(&current) else {
                return false;
            };
            match holder.owner() {
                InventoryOwner::Item(id) if id == item => return true,
                InventoryOwner::Item(id) => match self.items.get(&id).and_then(|i| i.parent) {
                    Some(parent) => current = parent,
                    None => return false,
                },
                _ => return false,
            }
        }
        true
    }

    /// Removes `item` from the slot holding it, leaving it at its owner's
    /// location. Returns the slot it was taken from.
    pub fn detach_item(
        &mut self,
        item: NetEntityId,
    ) -> Result<Option<(NetEntityId, usize)>, WorldError> {
        let parent = self
            .items
            .get(&item)
            .ok_or(WorldError::UnknownItem { id: item })?
            .parent;
        let Some(parent) = parent else {
            return Ok(None);
        };
        let drop_position = self.world_position(item);

        let slot = match self.inventories.get_mut(&parent) {
            Some(inventory) => {
                let slot = inventory.find(item);
                if let Some(slot) = slot {
                    inventory.set_slot(slot, None);
                }
                slot
            }
            None => None,
        };

        if let Some(entry) = self.items.get_mut(&item) {
            entry.parent = None;
            entry.previous_parent = Some(parent);
            if let Some(position) = drop_position {
                entry.position = position;
            }
        }
        trace!("detached {} from inventory {}", item, parent);
        Ok(slot.map(|slot| (parent, slot)))
    }

    /// Places a free-standing item into an empty slot.
    pub fn put_item(
        &mut self,
        item: NetEntityId,
        inventory: NetEntityId,
        slot: usize,
    ) -> Result<(), WorldError> {
        let entry = self
            .items
            .get(&item)
            .ok_or(WorldError::UnknownItem { id: item })?;
        if let Some(parent) = entry.parent {
            return Err(WorldError::AlreadyPlaced {
                item,
                inventory: parent,
            });
        }
        let target = self
            .inventories
            .get(&inventory)
            .ok_or(WorldError::UnknownInventory { id: inventory })?;
        if slot >= target.capacity() {
            return Err(WorldError::SlotOutOfBounds {
                inventory,
                slot,
                capacity: target.capacity(),
            });
        }
        if let Some(occupant) = target.slot(slot) {
            return Err(WorldError::SlotOccupied {
                inventory,
                slot,
                occupant,
            });
        }
        if self.would_create_cycle(item, inventory) {
            return Err(WorldError::ContainmentCycle { item, inventory });
        }

        if let Some(target) = self.inventories.get_mut(&inventory) {
            target.set_slot(slot, Some(item));
        }
        if let Some(entry) = self.items.get_mut(&item) {
            entry.parent = Some(inventory);
        }
        trace!("placed {} into inventory {} slot {}", item, inventory, slot);
        Ok(())
    }

    /// Detaches `item` from wherever it is and places it into `slot`.
    pub fn move_item(
        &mut self,
        item: NetEntityId,
        inventory: NetEntityId,
        slot: usize,
    ) -> Result<(), WorldError> {
        let previous = self.detach_item(item)?;
        if let Err(err) = self.put_item(item, inventory, slot) {
            // restore so a failed move leaves the arena untouched
            if let Some((parent, old_slot)) = previous {
                let _ = self.put_item(item, parent, old_slot);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Removes an item from the arena. Anything inside its own inventory is
    /// dropped where the container was.
    pub fn remove_item(&mut self, item: NetEntityId) -> Result<Item, WorldError> {
        self.detach_item(item)?;
        if let Some(contents) = self.inventories.get(&item).map(|inv| inv.items().collect::<Vec<_>>()) {
            for content in contents {
                self.detach_item(content)?;
            }
            self.inventories.remove(&item);
        }
        self.items
            .remove(&item)
            .ok_or(WorldError::UnknownItem { id: item })
    }

    /// Overwrites an inventory with authoritative contents. Items moved in
    /// from elsewhere are taken out of their previous inventory. Unknown ids
    /// are left empty. Returns every other inventory that changed.
    pub fn apply_inventory_state(
        &mut self,
        inventory: NetEntityId,
        slots: &[Option<NetEntityId>],
    ) -> Result<Vec<NetEntityId>, WorldError> {
        let capacity = self
            .inventories
            .get(&inventory)
            .ok_or(WorldError::UnknownInventory { id: inventory })?
            .capacity();
        if slots.len() != capacity {
            return Err(WorldError::SlotCountMismatch {
                inventory,
                expected: capacity,
                actual: slots.len(),
            });
        }

        let mut touched = HashSet::new();
        let current: Vec<NetEntityId> = self
            .inventories
            .get(&inventory)
            .map(|inv| inv.items().collect())
            .unwrap_or_default();
        for item in current {
            self.detach_item(item)?;
        }

        let mut placed = HashSet::new();
        for (slot, claimed) in slots.iter().enumerate() {
            let Some(item) = *claimed else { continue };
            if !self.items.contains_key(&item) || self.would_create_cycle(item, inventory) {
                continue;
            }
            if !placed.insert(item) {
                continue;
            }
            if let Some((previous, _)) = self.detach_item(item)? {
                if previous != inventory {
                    touched.insert(previous);
                }
            }
            self.put_item(item, inventory, slot)?;
        }

        let mut touched: Vec<NetEntityId> = touched.into_iter().collect();
        touched.sort();
        Ok(touched)
    }

    /// Verifies that every item is in at most one slot and that parent links
    /// agree with slot contents.
    pub fn check_consistency(&self) -> Result<(), WorldError> {
        let mut seen: HashMap<NetEntityId, NetEntityId> = HashMap::new();
        for inventory in self.inventories.values() {
            for item in inventory.items() {
                if let Some(other) = seen.insert(item, inventory.id()) {
                    return Err(WorldError::Inconsistent {
                        reason: format!(
                            "item {} appears in inventories {} and {}",
                            item,
                            other,
                            inventory.id()
                        ),
                    });
                }
                let parent = self.items.get(&item).and_then(|i| i.parent);
                if parent != Some(inventory.id()) {
                    return Err(WorldError::Inconsistent {
                        reason: format!(
                            "item {} sits in inventory {} but its parent is {:?}",
                            item,
                            inventory.id(),
                            parent
                        ),
                    });
                }
            }
            let distinct: HashSet<NetEntityId> = inventory.items().collect();
            if distinct.len() != inventory.items().count() {
                return Err(WorldError::Inconsistent {
                    reason: format!("inventory {} holds an item twice", inventory.id()),
                });
            }
        }
        for item in self.items.values() {
            if let Some(parent) = item.parent {
                if seen.get(&item.id) != Some(&parent) {
                    return Err(WorldError::Inconsistent {
                        reason: format!(
                            "item {} claims parent {} but no slot holds it",
                            item.id, parent
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
