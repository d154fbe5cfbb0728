use ballast_shared::{
    Character, ComponentState, Inventory, InventoryAccess, InventoryOwner, Item, NetEntityId,
    PowerDistributorState, ReactorState, Vec2, World,
};

/// Entity ids used by [`TestWorld::build`].
pub mod ids {
    use ballast_shared::NetEntityId;

    /// Character standing at the origin, inventory with 4 slots
    pub const CAPTAIN: NetEntityId = NetEntityId::new(1);
    /// Character standing next to the captain, inventory with 4 slots
    pub const ENGINEER: NetEntityId = NetEntityId::new(2);
    /// Container item with a 3 slot inventory of the same id
    pub const TOOLBOX: NetEntityId = NetEntityId::new(20);
    /// Wall cabinet owned by the world, 2 slots
    pub const CABINET: NetEntityId = NetEntityId::new(30);
    pub const WRENCH: NetEntityId = NetEntityId::new(40);
    pub const TORCH: NetEntityId = NetEntityId::new(41);
    pub const WELDER: NetEntityId = NetEntityId::new(42);
    /// Lies far out of reach of both characters
    pub const FLARE: NetEntityId = NetEntityId::new(43);
    /// Fixed inside the cabinet
    pub const FUSE: NetEntityId = NetEntityId::new(44);
    /// Reactor (component 0) and power distributor (component 1)
    pub const REACTOR: NetEntityId = NetEntityId::new(50);
    /// Two power distributors, components 0 and 1
    pub const SWITCHBOARD: NetEntityId = NetEntityId::new(51);
}

pub struct TestWorld;

impl TestWorld {
    /// A small submarine deck: two crew, a toolbox, a cabinet, a reactor, a
    /// switchboard and a handful of loose items. The wrench starts in the captain's first
    /// slot.
    pub fn build() -> World {
        use ids::*;

        let mut world = World::new();
        world
            .insert_character(Character::new(CAPTAIN, Vec2::ZERO))
            .expect("captain");
        world
            .insert_character(Character::new(ENGINEER, Vec2::new(40.0, 0.0)))
            .expect("engineer");
        world
            .insert_inventory(
                Inventory::new(CAPTAIN, InventoryOwner::Character(CAPTAIN), 4).expect("capacity"),
            )
            .expect("captain inventory");
        world
            .insert_inventory(
                Inventory::new(ENGINEER, InventoryOwner::Character(ENGINEER), 4)
                    .expect("capacity")
                    .with_access(InventoryAccess {
                        accessible_to_others: false,
                        accessible_when_owner_dead: true,
                    }),
            )
            .expect("engineer inventory");

        world
            .insert_item(Item::new(TOOLBOX, Vec2::new(20.0, 0.0)))
            .expect("toolbox");
        world
            .insert_inventory(
                Inventory::new(TOOLBOX, InventoryOwner::Item(TOOLBOX), 3).expect("capacity"),
            )
            .expect("toolbox inventory");
        world
            .insert_inventory(Inventory::new(CABINET, InventoryOwner::World, 2).expect("capacity"))
            .expect("cabinet");

        for (id, x) in [(WRENCH, 0.0), (TORCH, 10.0), (WELDER, 30.0), (FLARE, 4000.0)] {
            world
                .insert_item(Item::new(id, Vec2::new(x, 0.0)))
                .expect("loose item");
        }
        world
            .insert_item(Item::new(FUSE, Vec2::new(60.0, 0.0)).attached())
            .expect("fuse");
        world
            .insert_item(
                Item::new(REACTOR, Vec2::new(50.0, 0.0))
                    .attached()
                    .with_components(vec![
                        ComponentState::Reactor(Self::reactor(false, 40.0)),
                        ComponentState::PowerDistributor(PowerDistributorState {
                            power_on: true,
                            step: 5,
                            load_ratio: 0.5,
                        }
                        .quantized()),
                    ]),
            )
            .expect("reactor");
        world
            .insert_item(
                Item::new(SWITCHBOARD, Vec2::new(50.0, 10.0))
                    .attached()
                    .with_components(vec![
                        ComponentState::PowerDistributor(Self::distributor(false, 2)),
                        ComponentState::PowerDistributor(Self::distributor(true, 8)),
                    ]),
            )
            .expect("switchboard");

        world.put_item(WRENCH, CAPTAIN, 0).expect("wrench");
        world.put_item(FUSE, CABINET, 0).expect("fuse");
        world
    }

    pub fn reactor(power_on: bool, temperature: f32) -> ReactorState {
        ReactorState {
            auto_temperature: false,
            power_on,
            temperature,
            target_fission_rate: 20.0,
            target_turbine_output: 60.0,
            degree_of_success: 0.5,
            temperature_boost: 0.0,
        }
        .quantized()
    }

    pub fn distributor(power_on: bool, step: u8) -> PowerDistributorState {
        PowerDistributorState {
            power_on,
            step,
            load_ratio: 0.25,
        }
        .quantized()
    }

    /// Slot contents of `inventory` as bare ids, 0 for empty.
    pub fn slots(world: &World, inventory: NetEntityId) -> Vec<u16> {
        world
            .inventory(inventory)
            .map(|inventory| {
                inventory
                    .slots()
                    .iter()
                    .map(|slot| NetEntityId::from_option(*slot).to_u16())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Builds a slot list from bare ids, 0 for empty.
    pub fn claim(ids: &[u16]) -> Vec<Option<NetEntityId>> {
        ids.iter().map(|id| NetEntityId::new(*id).to_option()).collect()
    }
}
