use std::{collections::BTreeMap, time::Duration};

use ballast_client::{Client, ClientConfig};
use ballast_server::{
    transport::{NetworkEndpoint, PacketChannel},
    Events, Server, ServerConfig, UserKey,
};
use ballast_shared::{NetEntityId, World};

/// Which way a packet travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    ToServer,
    ToClient,
}

type DropRule = Box<dyn FnMut(Direction, UserKey, usize) -> bool>;

/// One server and any number of clients wired together in memory. Every
/// [`TestHarness::step`] moves client packets in, ticks the server, and
/// moves server packets out.
pub struct TestHarness {
    pub server: Server,
    network: NetworkEndpoint,
    clients: BTreeMap<UserKey, Client>,
    drop_rule: Option<DropRule>,
    packets: usize,
    server_events: Vec<Events>,
}

impl TestHarness {
    pub fn new(world: World) -> Self {
        Self::with_config(ServerConfig::default(), world)
    }

    pub fn with_config(config: ServerConfig, world: World) -> Self {
        let (network, tick) = PacketChannel::unbounded();
        Self {
            server: Server::new(config, world, tick),
            network,
            clients: BTreeMap::new(),
            drop_rule: None,
            packets: 0,
            server_events: Vec::new(),
        }
    }

    /// Loses every packet for which `rule(direction, user, packet_number)`
    /// returns true.
    pub fn set_drop_rule<F: FnMut(Direction, UserKey, usize) -> bool + 'static>(&mut self, rule: F) {
        self.drop_rule = Some(Box::new(rule));
    }

    pub fn clear_drop_rule(&mut self) {
        self.drop_rule = None;
    }

    /// Connects a client whose replica starts as a copy of the server world.
    pub fn connect(
        &mut self,
        user: UserKey,
        name: &str,
        character: Option<NetEntityId>,
        config: ClientConfig,
    ) {
        let client = Client::new(config, self.server.world().clone());
        self.network
            .connect(user, name, character)
            .expect("inbound queue open");
        self.clients.insert(user, client);
    }

    pub fn disconnect(&mut self, user: UserKey) {
        if let Some(mut client) = self.clients.remove(&user) {
            client.disconnect();
        }
        self.network.disconnect(user).expect("inbound queue open");
    }

    pub fn client(&self, user: UserKey) -> &Client {
        self.clients.get(&user).expect("client connected")
    }

    pub fn client_mut(&mut self, user: UserKey) -> &mut Client {
        self.clients.get_mut(&user).expect("client connected")
    }

    pub fn users(&self) -> Vec<UserKey> {
        self.clients.keys().copied().collect()
    }

    /// Server events collected since the last call.
    pub fn take_server_events(&mut self) -> Vec<Events> {
        std::mem::take(&mut self.server_events)
    }

    pub fn step(&mut self, elapsed: Duration) {
        let users: Vec<UserKey> = self.clients.keys().copied().collect();
        for user in &users {
            let Some(bytes) = self.clients.get_mut(user).and_then(Client::send_packet) else {
                continue;
            };
            if self.should_drop(Direction::ToServer, *user) {
                continue;
            }
            self.network
                .receive_bytes(*user, &bytes)
                .expect("inbound queue open");
        }

        self.server.tick(elapsed);
        self.server_events.push(self.server.take_events());

        while let Some(outbound) = self.network.try_recv_outbound().expect("outbound queue open") {
            if self.should_drop(Direction::ToClient, outbound.user) {
                continue;
            }
            if let Some(client) = self.clients.get_mut(&outbound.user) {
                client
                    .receive_packet(&outbound.payload)
                    .expect("server packets decode");
            }
        }

        for client in self.clients.values_mut() {
            client.update(elapsed).expect("buffered corrections decode");
        }
    }

    pub fn run(&mut self, elapsed: Duration, steps: usize) {
        for _ in 0..steps {
            self.step(elapsed);
        }
    }

    fn should_drop(&mut self, direction: Direction, user: UserKey) -> bool {
        self.packets += 1;
        let packet = self.packets;
        match &mut self.drop_rule {
            Some(rule) => rule(direction, user, packet),
            None => false,
        }
    }
}
