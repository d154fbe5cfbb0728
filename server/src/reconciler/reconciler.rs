use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use ballast_shared::{
    AccessPolicy, Character, InventoryOwner, InventorySlotClaim, NetEntityId, RangeAccessPolicy,
    World,
};

use crate::reconciler::{
    error::ClaimError,
    outcome::{InventoryChange, ReconcileOutcome, Rejection, RejectionReason, Requester},
};

pub const AUDIT_TARGET: &str = "ballast::audit";

/// Contains Config properties used when validating client claims
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Farthest distance at which a character may pick up a free-standing
    /// item, used by the default access policy
    pub pickup_distance: f32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            pickup_distance: 150.0,
        }
    }
}

/// Validates client inventory claims against the authoritative world and
/// applies whatever part of them is legal.
pub struct InventoryReconciler {
    policy: Box<dyn AccessPolicy>,
}

impl InventoryReconciler {
    pub fn new(policy: Box<dyn AccessPolicy>) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(Box::new(RangeAccessPolicy::new(config.pickup_distance)))
    }

    /// The live character `requester` controls, if any.
    fn live_character<'w>(&self, world: &'w World, requester: &Requester) -> Option<&'w Character> {
        let character = world.character(requester.character?)?;
        if character.is_dead {
            None
        } else {
            Some(character)
        }
    }

    /// Whether `character` may open `inventory` at all.
    fn can_open(&self, world: &World, character: &Character, inventory: NetEntityId) -> bool {
        let Some(target) = world.inventory(inventory) else {
            return false;
        };
        match target.owner() {
            InventoryOwner::Character(owner) if owner == character.id => true,
            InventoryOwner::Character(owner) => {
                let owner_dead = world.character(owner).map_or(true, |c| c.is_dead);
                if owner_dead {
                    target.access().accessible_when_owner_dead
                } else {
                    target.access().accessible_to_others
                }
            }
            InventoryOwner::Item(container) => world
                .item(container)
                .is_some_and(|container| self.policy.can_access_item(world, character, container)),
            InventoryOwner::World => true,
        }
    }

    /// Whether `requester` may open `inventory`.
    pub fn can_access_inventory(
        &self,
        world: &World,
        requester: &Requester,
        inventory: NetEntityId,
    ) -> bool {
        match self.live_character(world, requester) {
            Some(character) => self.can_open(world, character, inventory),
            None => false,
        }
    }

    /// Whether `requester` may take or operate `item` where it currently is.
    pub fn can_access_item(&self, world: &World, requester: &Requester, item: NetEntityId) -> bool {
        let Some(character) = self.live_character(world, requester) else {
            return false;
        };
        let Some(entry) = world.item(item) else {
            return false;
        };
        if let Some(parent) = entry.parent() {
            if !self.can_open(world, character, parent) {
                return false;
            }
        }
        self.policy.can_access_item(world, character, entry)
    }

    /// Reconciles `claim` for `inventory`. The inventory always ends up in a
    /// state the server is willing to broadcast; whatever of the claim could
    /// not be honoured is listed in the outcome.
    pub fn reconcile(
        &self,
        world: &mut World,
        inventory: NetEntityId,
        claim: &InventorySlotClaim,
        requester: &Requester,
    ) -> Result<ReconcileOutcome, ClaimError> {
        let snapshot: Vec<Option<NetEntityId>> = world
            .inventory(inventory)
            .ok_or(ClaimError::UnknownInventory { inventory })?
            .slots()
            .to_vec();
        if claim.len() != snapshot.len() {
            return Err(ClaimError::LengthMismatch {
                inventory,
                expected: snapshot.len(),
                actual: claim.len(),
            });
        }

        let mut outcome = ReconcileOutcome::new(inventory);

        if !self.can_access_inventory(world, requester, inventory) {
            warn!(
                "{} claimed inventory {} without access, re-sending the truth",
                requester.name, inventory
            );
            outcome.access_denied = true;
            for item in claim.slots().iter().flatten() {
                if let Some(source) = world.item(*item).and_then(|entry| entry.parent()) {
                    outcome.mark_dirty(source);
                }
            }
            outcome.finish();
            return Ok(outcome);
        }

        let claimed = normalize_claim(world, &snapshot, claim);
        let claimed_anywhere: HashSet<NetEntityId> = claimed.iter().flatten().copied().collect();

        // Lift items that move within the inventory, drop the ones no slot
        // claims anymore.
        let mut lifted: HashMap<NetEntityId, usize> = HashMap::new();
        for (slot, current) in snapshot.iter().enumerate() {
            let Some(current) = *current else { continue };
            if claimed[slot] == Some(current) {
                continue;
            }
            if claimed_anywhere.contains(&current) {
                world.detach_item(current)?;
                lifted.insert(current, slot);
            } else if claimed[slot].is_none() {
                world.detach_item(current)?;
                outcome.changes.push(InventoryChange::Dropped {
                    item: current,
                    slot,
                });
                audit(
                    &mut outcome,
                    format!("{} dropped {} from inventory {}", requester.name, current, inventory),
                );
            }
        }

        for (slot, wanted) in claimed.iter().enumerate() {
            let Some(item) = *wanted else { continue };
            if snapshot[slot] == Some(item) {
                continue;
            }
            self.fill_slot(world, inventory, slot, item, requester, &mut lifted, &mut outcome)?;
        }

        // Anything lifted but not placed goes back where it was, else to the
        // first free slot, else on the floor.
        let mut unplaced: Vec<(NetEntityId, usize)> = lifted.into_iter().collect();
        unplaced.sort_by_key(|(_, slot)| *slot);
        for (item, original_slot) in unplaced {
            let free = world.inventory(inventory).and_then(|target| {
                if target.slot(original_slot).is_none() {
                    Some(original_slot)
                } else {
                    target.first_free()
                }
            });
            match free {
                Some(slot) => {
                    world.put_item(item, inventory, slot)?;
                    if slot != original_slot {
                        outcome.changes.push(InventoryChange::Moved {
                            item,
                            from_slot: original_slot,
                            to_slot: slot,
                        });
                    }
                }
                None => {
                    outcome.changes.push(InventoryChange::Dropped {
                        item,
                        slot: original_slot,
                    });
                    audit(
                        &mut outcome,
                        format!(
                            "{} dropped {} from inventory {} (no room left)",
                            requester.name, item, inventory
                        ),
                    );
                }
            }
        }

        outcome.finish();
        debug!(
            "reconciled inventory {} for {}: {} changes, {} rejections",
            inventory,
            requester.name,
            outcome.changes.len(),
            outcome.rejections.len()
        );
        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_slot(
        &self,
        world: &mut World,
        inventory: NetEntityId,
        slot: usize,
        item: NetEntityId,
        requester: &Requester,
        lifted: &mut HashMap<NetEntityId, usize>,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), ClaimError> {
        let source = world.item(item).and_then(|entry| entry.parent());
        // a rejected item stays where it was; its inventory is re-sent in
        // case the requester already showed it elsewhere
        let reject = |outcome: &mut ReconcileOutcome, reason| {
            debug!(
                "{} may not put {} into inventory {} slot {}: {:?}",
                requester.name, item, inventory, slot, reason
            );
            outcome.rejections.push(Rejection { slot, item, reason });
            if let Some(source) = source {
                outcome.mark_dirty(source);
            }
        };

        if let Some(occupant) = world.inventory(inventory).and_then(|target| target.slot(slot)) {
            reject(outcome, RejectionReason::SlotOccupied { occupant });
            return Ok(());
        }

        if let Some(from_slot) = lifted.remove(&item) {
            world.put_item(item, inventory, slot)?;
            outcome.changes.push(InventoryChange::Moved {
                item,
                from_slot,
                to_slot: slot,
            });
            return Ok(());
        }

        let Some(entry) = world.item(item) else {
            return Ok(());
        };
        if !entry.detachable {
            reject(outcome, RejectionReason::NotDetachable);
            return Ok(());
        }

        if !self.can_access_item(world, requester, item) {
            reject(outcome, RejectionReason::NoAccess);
            outcome.forced_resyncs.push(item);
            return Ok(());
        }

        if world.would_create_cycle(item, inventory) {
            reject(outcome, RejectionReason::Cycle);
            return Ok(());
        }

        world.move_item(item, inventory, slot)?;
        outcome.changes.push(InventoryChange::PickedUp {
            item,
            slot,
            from: source,
        });
        let line = match source {
            Some(source) => {
                outcome.mark_dirty(source);
                format!(
                    "{} took {} from inventory {} into inventory {} slot {}",
                    requester.name, item, source, inventory, slot
                )
            }
            None => format!(
                "{} picked up {} into inventory {} slot {}",
                requester.name, item, inventory, slot
            ),
        };
        audit(outcome, line);
        Ok(())
    }
}

fn audit(outcome: &mut ReconcileOutcome, line: String) {
    info!(target: AUDIT_TARGET, "{}", line);
    outcome.audit.push(line);
}

/// Unknown ids claim nothing. An item claimed twice keeps its first slot; the
/// later slot keeps its current content when no other slot claims it.
fn normalize_claim(
    world: &World,
    snapshot: &[Option<NetEntityId>],
    claim: &InventorySlotClaim,
) -> Vec<Option<NetEntityId>> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut claimed: Vec<Option<NetEntityId>> = claim
        .slots()
        .iter()
        .enumerate()
        .map(|(slot, wanted)| {
            let item = (*wanted).filter(|item| world.item(*item).is_some())?;
            if seen.insert(item) {
                Some(item)
            } else {
                duplicates.push(slot);
                None
            }
        })
        .collect();

    for slot in duplicates {
        if let Some(current) = snapshot[slot] {
            if seen.insert(current) {
                claimed[slot] = Some(current);
            }
        }
    }
    claimed
}
