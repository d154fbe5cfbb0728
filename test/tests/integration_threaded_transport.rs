/// Integration tests for the queues between network threads and the tick
/// thread.
///
/// Network threads only parse bytes and push them inbound; the tick thread
/// never blocks on them.

use std::{thread, time::Duration};

use ballast_client::{Client, ClientConfig};
use ballast_server::{
    transport::PacketChannel, DisconnectEvent, DisconnectReason, ProtocolError, Server,
    ServerConfig, UserKey,
};
use ballast_test::{ids, init_logging, TestWorld, TICK};

#[test]
fn claim_from_network_thread_is_acknowledged() {
    init_logging();
    let (network, tick) = PacketChannel::unbounded();
    let mut server = Server::new(ServerConfig::default(), TestWorld::build(), tick);
    let user = UserKey::new(1);

    let endpoint = network.clone();
    let handle = thread::spawn(move || {
        endpoint.connect(user, "captain", Some(ids::CAPTAIN)).unwrap();
        let mut client = Client::new(ClientConfig::default(), TestWorld::build());
        client
            .move_items(ids::CAPTAIN, TestWorld::claim(&[0, 0, 0, 40]))
            .unwrap();
        let bytes = client.send_packet().unwrap();
        endpoint.receive_bytes(user, &bytes).unwrap();

        while client.pending_claims() > 0 {
            let outbound = endpoint.recv_outbound().unwrap();
            assert_eq!(outbound.user, user);
            client.receive_packet(&outbound.payload).unwrap();
        }
        client
    });

    for _ in 0..2000 {
        if handle.is_finished() {
            break;
        }
        server.tick(TICK);
        thread::sleep(Duration::from_millis(1));
    }
    let client = handle.join().unwrap();

    assert_eq!(TestWorld::slots(server.world(), ids::CAPTAIN), vec![0, 0, 0, 40]);
    assert!(client.last_received().is_some());
}

#[test]
fn malformed_bytes_end_the_connection() {
    init_logging();
    let (network, tick) = PacketChannel::unbounded();
    let mut server = Server::new(ServerConfig::default(), TestWorld::build(), tick);
    let user = UserKey::new(1);

    let endpoint = network.clone();
    thread::spawn(move || {
        endpoint.connect(user, "captain", Some(ids::CAPTAIN)).unwrap();
        endpoint.receive_bytes(user, &[0xFF, 0xFF, 0xFF]).unwrap();
    })
    .join()
    .unwrap();

    server.tick(TICK);
    let mut events = server.take_events();
    let disconnects: Vec<_> = events.read::<DisconnectEvent>().collect();
    assert!(matches!(
        disconnects.as_slice(),
        [(who, DisconnectReason::Protocol(ProtocolError::Codec(_)))] if *who == user
    ));
    assert_eq!(server.users_count(), 0);
}

#[test]
fn endpoints_report_a_stopped_server() {
    let (network, tick) = PacketChannel::unbounded();
    let server = Server::new(ServerConfig::default(), TestWorld::build(), tick);
    drop(server);

    assert!(network.recv_outbound().is_err());
    assert!(network.try_recv_outbound().is_err());
    assert!(network.disconnect(UserKey::new(1)).is_err());
}
