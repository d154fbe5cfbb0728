use crate::world::{
    arena::World,
    entities::{Character, Item},
};

/// Decides whether a character may pick up, take or operate a specific item.
/// Supplied by the simulation; the replication layer only asks.
pub trait AccessPolicy: Send + Sync {
    fn can_access_item(&self, world: &World, character: &Character, item: &Item) -> bool;
}

/// Grants access to items the character already carries and to items within
/// reach.
#[derive(Clone, Debug)]
pub struct RangeAccessPolicy {
    pickup_distance: f32,
}

impl RangeAccessPolicy {
    pub fn new(pickup_distance: f32) -> Self {
        Self { pickup_distance }
    }
}

impl AccessPolicy for RangeAccessPolicy {
    fn can_access_item(&self, world: &World, character: &Character, item: &Item) -> bool {
        if character.is_dead {
            return false;
        }
        let carried = item
            .parent()
            .and_then(|parent| world.root_character(parent))
            .is_some_and(|holder| holder == character.id);
        if carried {
            return true;
        }
        match world.world_position(item.id) {
            Some(position) => {
                position.distance_squared(character.position)
                    <= self.pickup_distance * self.pickup_distance
            }
            None => false,
        }
    }
}
