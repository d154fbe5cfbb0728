/// Integration tests for client side prediction and its correction windows.
///
/// A local change is shown right away. Server updates for the same value that
/// arrive within the window are held back and only the latest one is applied
/// once the window closes.

use std::time::Duration;

use ballast_client::{Client, ClientConfig};
use ballast_server::{ComponentClaimEvent, UserKey};
use ballast_shared::{ComponentState, Vec2};
use ballast_test::{
    assert_clients_converged, assert_replica_matches, ids, init_logging, TestHarness, TestWorld,
    TICK,
};

const CAPTAIN: UserKey = UserKey::new(1);

fn harness(config: ClientConfig) -> TestHarness {
    init_logging();
    let mut harness = TestHarness::new(TestWorld::build());
    harness.connect(CAPTAIN, "captain", Some(ids::CAPTAIN), config);
    harness.run(TICK, 2);
    harness
}

fn reactor_seen(harness: &TestHarness, user: UserKey) -> ComponentState {
    harness.client(user).world().item(ids::REACTOR).unwrap().components[0]
}

fn reactor_truth(harness: &TestHarness) -> ComponentState {
    harness.server.world().item(ids::REACTOR).unwrap().components[0]
}

/// Server update at 0.1 s into a 0.3 s window is held back and becomes final
/// when the window closes
#[test]
fn update_inside_window_applies_when_window_closes() {
    let mut harness = harness(ClientConfig {
        correction_delay: Duration::from_millis(300),
        ..ClientConfig::default()
    });

    let switched_on = ComponentState::Reactor(TestWorld::reactor(true, 40.0));
    harness
        .client_mut(CAPTAIN)
        .set_component(ids::REACTOR, 0, switched_on)
        .unwrap();

    // the claim reaches the server, its echo is held back
    harness.step(TICK);
    let mut events = harness.take_server_events();
    let claims: Vec<_> = events
        .iter_mut()
        .flat_map(|events| events.read::<ComponentClaimEvent>())
        .collect();
    assert_eq!(claims.len(), 1);
    assert!(claims[0].accepted);
    assert_eq!(reactor_truth(&harness), switched_on);

    harness.step(TICK);
    let heated = ComponentState::Reactor(TestWorld::reactor(true, 70.0));
    harness
        .server
        .set_component_state(ids::REACTOR, 0, heated)
        .unwrap();

    for _ in 0..3 {
        harness.step(TICK);
        assert_eq!(reactor_seen(&harness, CAPTAIN), switched_on);
        assert!(harness.client(CAPTAIN).is_correction_pending(ids::REACTOR, 0));
    }

    harness.step(TICK);
    assert_eq!(reactor_seen(&harness, CAPTAIN), heated);
    assert!(!harness.client(CAPTAIN).is_correction_pending(ids::REACTOR, 0));
}

/// Without a local change server updates apply on arrival
#[test]
fn update_without_prediction_applies_at_once() {
    let mut harness = harness(ClientConfig::default());
    let heated = ComponentState::Reactor(TestWorld::reactor(false, 90.0));
    harness
        .server
        .set_component_state(ids::REACTOR, 0, heated)
        .unwrap();
    harness.step(TICK);
    assert_eq!(reactor_seen(&harness, CAPTAIN), heated);
}

/// The server keeps its own simulated values when a client switches the
/// reactor on, and the client ends up showing them
#[test]
fn simulated_fields_survive_a_claim() {
    let mut harness = harness(ClientConfig::default());
    let claim = ComponentState::Reactor(TestWorld::reactor(true, 99.0));
    harness
        .client_mut(CAPTAIN)
        .set_component(ids::REACTOR, 0, claim)
        .unwrap();
    harness.run(TICK, 20);

    assert_eq!(
        reactor_truth(&harness),
        ComponentState::Reactor(TestWorld::reactor(true, 40.0))
    );
    assert_replica_matches(harness.server.world(), harness.client(CAPTAIN).world());
}

/// A player too far away cannot operate the reactor; the claim is answered
/// with the unchanged state
#[test]
fn claim_out_of_reach_is_reverted() {
    init_logging();
    let mut world = TestWorld::build();
    world.character_mut(ids::ENGINEER).unwrap().position = Vec2::new(3000.0, 0.0);
    let mut harness = TestHarness::new(world);
    let engineer = UserKey::new(2);
    harness.connect(engineer, "engineer", Some(ids::ENGINEER), ClientConfig::default());
    harness.run(TICK, 2);

    let before = reactor_truth(&harness);
    harness
        .client_mut(engineer)
        .set_component(ids::REACTOR, 0, ComponentState::Reactor(TestWorld::reactor(true, 40.0)))
        .unwrap();
    harness.run(TICK, 20);

    assert_eq!(reactor_truth(&harness), before);
    assert_eq!(reactor_seen(&harness, engineer), before);
}

/// A value destroyed during its window is dropped together with whatever the
/// server sent for it
#[test]
fn destroyed_value_discards_buffered_update() {
    let mut harness = harness(ClientConfig::default());
    harness
        .client_mut(CAPTAIN)
        .set_component(ids::REACTOR, 1, TestWorld::build().item(ids::REACTOR).unwrap().components[1])
        .unwrap();
    harness.step(TICK);
    assert!(harness.client(CAPTAIN).is_correction_pending(ids::REACTOR, 1));

    harness.client_mut(CAPTAIN).remove_item(ids::REACTOR).unwrap();
    assert!(!harness.client(CAPTAIN).is_correction_pending(ids::REACTOR, 1));

    harness.run(TICK, 20);
    assert!(harness.client(CAPTAIN).world().item(ids::REACTOR).is_none());
}

/// Disconnecting drops open windows without applying them
#[test]
fn disconnect_drops_open_windows() {
    init_logging();
    let mut client = Client::new(ClientConfig::default(), TestWorld::build());
    client
        .move_items(ids::CAPTAIN, TestWorld::claim(&[0, 40, 0, 0]))
        .unwrap();
    assert!(client.is_inventory_sync_pending(ids::CAPTAIN));
    assert_eq!(client.pending_claims(), 1);

    client.disconnect();
    assert!(!client.is_inventory_sync_pending(ids::CAPTAIN));
    assert_eq!(client.pending_claims(), 0);
    client.update(Duration::from_secs(5)).unwrap();
    assert_eq!(TestWorld::slots(client.world(), ids::CAPTAIN), vec![0, 40, 0, 0]);
}

/// An inventory rearranged locally ignores server states for a second and
/// then settles on the newest one
#[test]
fn inventory_sync_waits_for_its_delay() {
    let mut harness = harness(ClientConfig::default());
    let engineer = UserKey::new(2);
    harness.connect(engineer, "engineer", Some(ids::ENGINEER), ClientConfig::default());
    harness.run(TICK, 2);

    harness
        .client_mut(CAPTAIN)
        .move_items(ids::CAPTAIN, TestWorld::claim(&[40, 41, 0, 0]))
        .unwrap();
    harness.step(TICK);
    assert_eq!(TestWorld::slots(harness.server.world(), ids::CAPTAIN), vec![40, 41, 0, 0]);

    // the server rearranges the inventory while the captain's window is open
    harness
        .server
        .set_inventory(ids::CAPTAIN, &TestWorld::claim(&[40, 0, 0, 41]))
        .unwrap();
    harness.run(TICK, 5);
    assert_eq!(
        TestWorld::slots(harness.client(CAPTAIN).world(), ids::CAPTAIN),
        vec![40, 41, 0, 0]
    );
    assert_eq!(
        TestWorld::slots(harness.client(engineer).world(), ids::CAPTAIN),
        vec![40, 0, 0, 41]
    );

    harness.run(TICK, 20);
    assert_eq!(
        TestWorld::slots(harness.client(CAPTAIN).world(), ids::CAPTAIN),
        vec![40, 0, 0, 41]
    );
    let clients: Vec<_> = [CAPTAIN, engineer]
        .iter()
        .map(|user| harness.client(*user))
        .collect();
    assert_clients_converged(harness.server.world(), clients);
}

/// Both distributors of the switchboard change in the same tick; the client
/// receives each of them
#[test]
fn sibling_components_update_independently() {
    let mut harness = harness(ClientConfig::default());
    let first = ComponentState::PowerDistributor(TestWorld::distributor(true, 4));
    let second = ComponentState::PowerDistributor(TestWorld::distributor(false, 9));
    harness
        .server
        .set_component_state(ids::SWITCHBOARD, 0, first)
        .unwrap();
    harness
        .server
        .set_component_state(ids::SWITCHBOARD, 1, second)
        .unwrap();
    harness.step(TICK);

    let seen = &harness.client(CAPTAIN).world().item(ids::SWITCHBOARD).unwrap().components;
    assert_eq!(seen, &vec![first, second]);
}

/// A window open on one distributor does not hold back updates for the other
#[test]
fn window_covers_only_its_own_component() {
    let mut harness = harness(ClientConfig {
        correction_delay: Duration::from_millis(300),
        ..ClientConfig::default()
    });
    let operated = ComponentState::PowerDistributor(TestWorld::distributor(true, 6));
    harness
        .client_mut(CAPTAIN)
        .set_component(ids::SWITCHBOARD, 0, operated)
        .unwrap();

    let rerouted = ComponentState::PowerDistributor(TestWorld::distributor(true, 1));
    harness
        .server
        .set_component_state(ids::SWITCHBOARD, 1, rerouted)
        .unwrap();
    harness.step(TICK);

    let client = harness.client(CAPTAIN);
    assert!(client.is_correction_pending(ids::SWITCHBOARD, 0));
    assert!(!client.is_correction_pending(ids::SWITCHBOARD, 1));
    assert_eq!(client.world().item(ids::SWITCHBOARD).unwrap().components[1], rerouted);

    harness.run(TICK, 20);
    assert_replica_matches(harness.server.world(), harness.client(CAPTAIN).world());
}
