/// Integration tests for inventory claims as the server sees them on the wire.
///
/// Each test drives a real server through its network endpoint, pretending to
/// be a client by hand-writing packets.

use ballast_server::{
    transport::{NetworkEndpoint, PacketChannel},
    ReconcileEvent, Server, ServerConfig, UserKey,
};
use ballast_shared::{
    ClientPacket, EntityEvent, EventId, EventPayload, InventorySlotClaim, NetEntityId,
    ServerPacket,
};
use ballast_test::{ids, init_logging, TestWorld, TICK};

fn start() -> (Server, NetworkEndpoint) {
    init_logging();
    let (network, tick) = PacketChannel::unbounded();
    (Server::new(ServerConfig::default(), TestWorld::build(), tick), network)
}

fn last_packet(network: &NetworkEndpoint) -> Option<ServerPacket> {
    let mut last = None;
    while let Some(outbound) = network.try_recv_outbound().unwrap() {
        last = Some(ServerPacket::from_bytes(&outbound.payload).unwrap());
    }
    last
}

fn decoded(packet: &ServerPacket) -> Vec<EntityEvent> {
    packet.events.iter().map(|event| event.decode().unwrap()).collect()
}

/// Connects `user` and returns the id of the last catch-up event.
fn join(server: &mut Server, network: &NetworkEndpoint, user: UserKey, character: NetEntityId) -> EventId {
    network.connect(user, "captain", Some(character)).unwrap();
    server.tick(TICK);
    let catch_up = last_packet(network).expect("catch-up packet");
    decoded(&catch_up).last().expect("catch-up events").id
}

fn claim(server_ack: EventId, inventory: NetEntityId, slots: &[u16]) -> Vec<u8> {
    ClientPacket {
        server_ack: Some(server_ack),
        events: vec![EntityEvent::new(
            EventId::new(1),
            inventory,
            InventorySlotClaim::new(TestWorld::claim(slots)).to_payload(),
        )],
    }
    .to_bytes()
}

/// Moving an item to another slot of the same inventory is applied and
/// answered with exactly one authoritative state of that inventory
#[test]
fn move_within_own_inventory() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    network
        .receive_bytes(user, &claim(ack, ids::CAPTAIN, &[0, 40, 0, 0]))
        .unwrap();
    server.tick(TICK);

    assert_eq!(TestWorld::slots(server.world(), ids::CAPTAIN), vec![0, 40, 0, 0]);

    let reply = last_packet(&network).unwrap();
    assert_eq!(reply.client_ack, Some(EventId::new(1)));
    let events = decoded(&reply);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].entity, ids::CAPTAIN);
    assert_eq!(
        events[0].payload,
        EventPayload::inventory_state(&TestWorld::claim(&[0, 40, 0, 0]))
    );

    let mut tick_events = server.take_events();
    let outcomes: Vec<_> = tick_events.read::<ReconcileEvent>().collect();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].1.fully_accepted());
    assert!(outcomes[0].1.audit.is_empty());
}

/// A claim on an inventory the requester may not open leaves it untouched,
/// re-sends its truth and writes no audit line
#[test]
fn claim_on_inaccessible_inventory() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    network
        .receive_bytes(user, &claim(ack, ids::ENGINEER, &[41, 0, 0, 0]))
        .unwrap();
    server.tick(TICK);

    assert_eq!(TestWorld::slots(server.world(), ids::ENGINEER), vec![0, 0, 0, 0]);
    assert_eq!(server.world().item(ids::TORCH).unwrap().parent(), None);

    let events = decoded(&last_packet(&network).unwrap());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].entity, ids::ENGINEER);
    assert_eq!(
        events[0].payload,
        EventPayload::inventory_state(&TestWorld::claim(&[0, 0, 0, 0]))
    );

    let mut tick_events = server.take_events();
    let (who, outcome) = tick_events.read::<ReconcileEvent>().next().unwrap();
    assert_eq!(who, user);
    assert!(outcome.access_denied);
    assert!(outcome.changes.is_empty());
    assert!(outcome.audit.is_empty());
}

/// Picking up a loose item in reach moves it and logs who took it
#[test]
fn pickup_in_reach_is_audited() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    network
        .receive_bytes(user, &claim(ack, ids::CAPTAIN, &[40, 41, 0, 0]))
        .unwrap();
    server.tick(TICK);

    assert_eq!(TestWorld::slots(server.world(), ids::CAPTAIN), vec![40, 41, 0, 0]);
    let mut tick_events = server.take_events();
    let (_, outcome) = tick_events.read::<ReconcileEvent>().next().unwrap();
    assert_eq!(outcome.audit.len(), 1);
    assert!(outcome.audit[0].contains("picked up"));
}

/// An item out of reach is refused, and the requester is sent its position
/// again on the same tick
#[test]
fn pickup_out_of_reach_forces_position_resync() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    network
        .receive_bytes(user, &claim(ack, ids::CAPTAIN, &[40, 43, 0, 0]))
        .unwrap();
    server.tick(TICK);

    assert_eq!(TestWorld::slots(server.world(), ids::CAPTAIN), vec![40, 0, 0, 0]);
    let reply = last_packet(&network).unwrap();
    let positions: Vec<NetEntityId> = reply
        .positions
        .iter()
        .map(|position| position.header().unwrap().entity)
        .collect();
    assert!(positions.contains(&ids::FLARE));
}

/// Fixed items cannot be taken out of the cabinet, and the cabinet is sent
/// again so the requester sees the fuse back in place
#[test]
fn attached_item_stays_in_cabinet() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    network
        .receive_bytes(user, &claim(ack, ids::CAPTAIN, &[40, 44, 0, 0]))
        .unwrap();
    server.tick(TICK);

    assert_eq!(TestWorld::slots(server.world(), ids::CABINET), vec![44, 0]);
    let entities: Vec<NetEntityId> = decoded(&last_packet(&network).unwrap())
        .iter()
        .map(|event| event.entity)
        .collect();
    assert_eq!(entities, vec![ids::CAPTAIN, ids::CABINET]);
}

/// A claim that does not match the inventory's slot count ends the
/// connection
#[test]
fn wrong_slot_count_disconnects() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    network
        .receive_bytes(user, &claim(ack, ids::CAPTAIN, &[40, 0]))
        .unwrap();
    server.tick(TICK);

    assert_eq!(server.users_count(), 0);
    assert_eq!(TestWorld::slots(server.world(), ids::CAPTAIN), vec![40, 0, 0, 0]);
}

/// A claim resent because its ack was lost is not applied twice
#[test]
fn resent_claim_is_applied_once() {
    let (mut server, network) = start();
    let user = UserKey::new(1);
    let ack = join(&mut server, &network, user, ids::CAPTAIN);

    let bytes = claim(ack, ids::CAPTAIN, &[0, 40, 0, 0]);
    network.receive_bytes(user, &bytes).unwrap();
    server.tick(TICK);
    last_packet(&network);
    server.take_events();

    // the world changed meanwhile; replaying the old claim must not undo it
    server
        .set_inventory(ids::CAPTAIN, &TestWorld::claim(&[0, 0, 40, 0]))
        .unwrap();
    network.receive_bytes(user, &bytes).unwrap();
    server.tick(TICK);

    assert_eq!(TestWorld::slots(server.world(), ids::CAPTAIN), vec![0, 0, 40, 0]);
    let mut tick_events = server.take_events();
    assert!(!tick_events.has::<ReconcileEvent>());
    let reply = last_packet(&network).unwrap();
    assert_eq!(reply.client_ack, Some(EventId::new(1)));
}
