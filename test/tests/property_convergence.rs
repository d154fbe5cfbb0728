/// PROPERTY-BASED TESTS: replica convergence
///
/// Two players rearrange inventories and operate the reactor and the
/// switchboard while the server's own simulation moves things around, over a
/// link that may lose packets. Key invariants:
/// 1. Once the link is quiet every replica matches the server exactly
/// 2. No item ever sits in two slots, on the server or on any replica
/// 3. Nobody is disconnected for lagging behind

use proptest::prelude::*;

use ballast_client::ClientConfig;
use ballast_server::{DisconnectEvent, UserKey};
use ballast_shared::{ComponentState, NetEntityId, PowerDistributorState};
use ballast_test::{assert_clients_converged, ids, init_logging, TestHarness, TestWorld, TICK};

const USERS: [UserKey; 2] = [UserKey::new(1), UserKey::new(2)];
const INVENTORIES: [NetEntityId; 4] = [ids::CAPTAIN, ids::ENGINEER, ids::TOOLBOX, ids::CABINET];
const ITEM_CHOICES: [u16; 9] = [0, 0, 0, 20, 40, 41, 42, 43, 44];
/// Power distributor components players can operate
const PANELS: [(NetEntityId, u8); 3] = [
    (ids::REACTOR, 1),
    (ids::SWITCHBOARD, 0),
    (ids::SWITCHBOARD, 1),
];

#[derive(Clone, Debug)]
enum Action {
    Claim {
        user: usize,
        inventory: usize,
        slots: Vec<u16>,
    },
    Operate {
        user: usize,
        panel: usize,
        power_on: bool,
        step: u8,
    },
    Simulate {
        inventory: usize,
        slots: Vec<u16>,
    },
    Wait {
        ticks: usize,
    },
}

fn slots_strategy() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(prop::sample::select(ITEM_CHOICES.to_vec()), 4)
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0usize..2, 0usize..4, slots_strategy())
            .prop_map(|(user, inventory, slots)| Action::Claim { user, inventory, slots }),
        1 => (0usize..2, 0usize..PANELS.len(), any::<bool>(), 0u8..=10)
            .prop_map(|(user, panel, power_on, step)| Action::Operate { user, panel, power_on, step }),
        1 => (0usize..4, slots_strategy())
            .prop_map(|(inventory, slots)| Action::Simulate { inventory, slots }),
        1 => (1usize..5).prop_map(|ticks| Action::Wait { ticks }),
    ]
}

fn capacity(harness: &TestHarness, inventory: NetEntityId) -> usize {
    harness
        .server
        .world()
        .inventory(inventory)
        .map(|inventory| inventory.capacity())
        .unwrap_or(0)
}

fn play(harness: &mut TestHarness, action: &Action) {
    match action {
        Action::Claim {
            user,
            inventory,
            slots,
        } => {
            let inventory = INVENTORIES[*inventory];
            let slots = &slots[..capacity(harness, inventory)];
            // refusals of the local arena are fine, nothing was claimed then
            let _ = harness
                .client_mut(USERS[*user])
                .move_items(inventory, TestWorld::claim(slots));
            harness.step(TICK);
        }
        Action::Operate {
            user,
            panel,
            power_on,
            step,
        } => {
            let (item, component_index) = PANELS[*panel];
            let state = ComponentState::PowerDistributor(PowerDistributorState {
                power_on: *power_on,
                step: *step,
                load_ratio: 0.25,
            });
            harness
                .client_mut(USERS[*user])
                .set_component(item, component_index, state)
                .unwrap();
            harness.step(TICK);
        }
        Action::Simulate { inventory, slots } => {
            let inventory = INVENTORIES[*inventory];
            let slots = &slots[..capacity(harness, inventory)];
            harness
                .server
                .set_inventory(inventory, &TestWorld::claim(slots))
                .unwrap();
            harness.step(TICK);
        }
        Action::Wait { ticks } => harness.run(TICK, *ticks),
    }
}

fn connected_harness() -> TestHarness {
    init_logging();
    let mut harness = TestHarness::new(TestWorld::build());
    harness.connect(USERS[0], "captain", Some(ids::CAPTAIN), ClientConfig::default());
    harness.connect(USERS[1], "engineer", Some(ids::ENGINEER), ClientConfig::default());
    harness.run(TICK, 2);
    harness
}

fn settle_and_check(harness: &mut TestHarness) {
    harness.clear_drop_rule();
    // longer than the inventory sync delay plus a few resends
    harness.run(TICK, 60);

    assert_eq!(harness.server.users_count(), USERS.len());
    let mut disconnects = 0;
    for mut events in harness.take_server_events() {
        disconnects += events.read::<DisconnectEvent>().count();
    }
    assert_eq!(disconnects, 0);

    let clients: Vec<_> = USERS.iter().map(|user| harness.client(*user)).collect();
    assert_clients_converged(harness.server.world(), clients);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_replicas_converge(actions in prop::collection::vec(action_strategy(), 1..20)) {
        let mut harness = connected_harness();
        for action in &actions {
            play(&mut harness, action);
            harness.server.world().check_consistency().unwrap();
        }
        settle_and_check(&mut harness);
    }

    #[test]
    fn prop_replicas_converge_over_lossy_link(
        actions in prop::collection::vec(action_strategy(), 1..20),
        drop_every in 2usize..6,
    ) {
        let mut harness = connected_harness();
        harness.set_drop_rule(move |_, _, packet| packet % drop_every == 0);
        for action in &actions {
            play(&mut harness, action);
            for user in USERS {
                harness.client(user).world().check_consistency().unwrap();
            }
        }
        settle_and_check(&mut harness);
    }
}

/// Both players reach for the same torch in the same tick; it ends up in
/// exactly one inventory and both replicas agree on which
#[test]
fn simultaneous_pickup_of_one_item() {
    let mut harness = connected_harness();
    harness
        .client_mut(USERS[0])
        .move_items(ids::CAPTAIN, TestWorld::claim(&[40, 41, 0, 0]))
        .unwrap();
    harness
        .client_mut(USERS[1])
        .move_items(ids::ENGINEER, TestWorld::claim(&[41, 0, 0, 0]))
        .unwrap();
    harness.step(TICK);

    let world = harness.server.world();
    assert_eq!(world.item(ids::TORCH).unwrap().parent(), Some(ids::CAPTAIN));
    assert_eq!(TestWorld::slots(world, ids::ENGINEER), vec![0, 0, 0, 0]);
    settle_and_check(&mut harness);
}

/// Every other packet is lost for a while; the event log keeps resending
/// until both sides agree again
#[test]
fn heavy_loss_then_recovery() {
    let mut harness = connected_harness();
    harness.set_drop_rule(|_, _, packet| packet % 2 == 0);
    harness
        .client_mut(USERS[0])
        .move_items(ids::CAPTAIN, TestWorld::claim(&[0, 40, 41, 0]))
        .unwrap();
    harness
        .server
        .set_inventory(ids::TOOLBOX, &TestWorld::claim(&[42, 0, 0]))
        .unwrap();
    harness.run(TICK, 30);
    settle_and_check(&mut harness);
    assert_eq!(
        TestWorld::slots(harness.server.world(), ids::CAPTAIN),
        vec![0, 40, 41, 0]
    );
}
