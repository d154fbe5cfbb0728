use std::{collections::HashMap, time::Duration};

use log::{debug, info, trace, warn};

use ballast_shared::{
    AccessPolicy, ClientPacket, ComponentState, EncodedEvent, EntityEvent, EventId, EventKind,
    EventPayload, GameInstant, InventorySlotClaim, NetEntityId, ServerPacket, Vec2, World,
    WorldError,
};

use crate::{
    components::merge_component_claim,
    error::{DisconnectReason, ProtocolError, ServerError},
    event_log::EntityEventLog,
    events::{ComponentClaim, Events},
    interest::InterestThrottle,
    reconciler::{InventoryChange, InventoryReconciler, Requester},
    server::server_config::ServerConfig,
    transport::{InboundMessage, OutboundPacket, TickEndpoint},
    user::{User, UserKey},
};

/// Position updates are unsequenced; their envelope id carries nothing.
const POSITION_EVENT_ID: EventId = EventId::new(0);

/// The authoritative side of the replication protocol. Owns the world, the
/// entity event log and every user record, and is driven by [`Server::tick`]
/// from a single thread.
pub struct Server {
    config: ServerConfig,
    world: World,
    event_log: EntityEventLog,
    reconciler: InventoryReconciler,
    throttle: InterestThrottle,
    users: HashMap<UserKey, User>,
    transport: TickEndpoint,
    now: GameInstant,
    events: Events,
}

impl Server {
    /// Create a new Server using the default range based access policy
    pub fn new(config: ServerConfig, world: World, transport: TickEndpoint) -> Self {
        let reconciler = InventoryReconciler::from_config(&config.reconcile);
        Self::build(config, world, transport, reconciler)
    }

    /// Create a new Server that asks `policy` which items a character may take
    pub fn with_access_policy(
        config: ServerConfig,
        world: World,
        transport: TickEndpoint,
        policy: Box<dyn AccessPolicy>,
    ) -> Self {
        Self::build(config, world, transport, InventoryReconciler::new(policy))
    }

    fn build(
        config: ServerConfig,
        world: World,
        transport: TickEndpoint,
        reconciler: InventoryReconciler,
    ) -> Self {
        Self {
            event_log: EntityEventLog::new(config.event_log.clone()),
            throttle: InterestThrottle::new(config.throttle.clone()),
            reconciler,
            config,
            world,
            users: HashMap::new(),
            transport,
            now: GameInstant::ZERO,
            events: Events::new(),
        }
    }

    // Tick

    /// Advances the clock by `elapsed`, handles everything the network
    /// threads queued since the last tick and sends one packet per user.
    pub fn tick(&mut self, elapsed: Duration) {
        self.now += elapsed;
        self.throttle.advance(elapsed);

        self.receive_inbound();
        self.check_timeouts();
        self.disconnect_evicted();
        self.send_packets();
    }

    /// Events produced since the last call.
    pub fn take_events(&mut self) -> Events {
        std::mem::replace(&mut self.events, Events::new())
    }

    fn receive_inbound(&mut self) {
        loop {
            let message = match self.transport.try_recv() {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(err) => {
                    warn!("Inbound queue unavailable: {}", err);
                    break;
                }
            };
            match message {
                InboundMessage::Connected {
                    user,
                    name,
                    character,
                } => self.add_user(user, name, character),
                InboundMessage::Packet { user, packet } => {
                    if let Err(error) = self.process_packet(user, packet) {
                        warn!("Protocol error from {}: {}", user, error);
                        self.disconnect_user(&user, DisconnectReason::Protocol(error));
                    }
                }
                InboundMessage::Malformed { user, error } => {
                    warn!("Malformed packet from {}: {}", user, error);
                    self.disconnect_user(&user, DisconnectReason::Protocol(error.into()));
                }
                InboundMessage::Disconnected { user } => {
                    self.disconnect_user(&user, DisconnectReason::ClientLeft)
                }
            }
        }
    }

    fn check_timeouts(&mut self) {
        let timed_out: Vec<UserKey> = self
            .users
            .keys()
            .filter(|key| {
                self.event_log
                    .oldest_unacked_send(key)
                    .is_some_and(|sent| {
                        self.now.saturating_duration_since(sent) > self.config.ack_timeout
                    })
            })
            .copied()
            .collect();
        for key in timed_out {
            warn!("{} did not acknowledge events in time", key);
            self.disconnect_user(&key, DisconnectReason::Timeout);
        }
    }

    fn disconnect_evicted(&mut self) {
        for key in self.event_log.take_evicted() {
            self.disconnect_user(&key, DisconnectReason::Lagging);
        }
    }

    fn send_packets(&mut self) {
        let mut keys: Vec<UserKey> = self.users.keys().copied().collect();
        keys.sort();
        for key in keys {
            let events = match self.event_log.drain_for(&key, self.now) {
                Ok(events) => events,
                Err(err) => {
                    warn!("Cannot drain events for {}: {}", key, err);
                    continue;
                }
            };
            let positions = self.collect_positions(key);
            let Some(user) = self.users.get_mut(&key) else {
                continue;
            };
            let ack_requested = user.take_ack_request();
            if events.is_empty() && positions.is_empty() && !ack_requested {
                continue;
            }

            let packet = ServerPacket {
                client_ack: user.last_client_event(),
                events: events.iter().map(EncodedEvent::encode).collect(),
                positions,
            };
            trace!(
                "sending {} events and {} positions to {}",
                packet.events.len(),
                packet.positions.len(),
                key
            );
            let outbound = OutboundPacket {
                user: key,
                payload: packet.to_bytes().into_boxed_slice(),
            };
            if let Err(err) = self.transport.send(outbound) {
                warn!("Cannot queue packet for {}: {}", key, err);
            }
        }
    }

    fn collect_positions(&mut self, key: UserKey) -> Vec<EncodedEvent> {
        let viewer = self.viewer_position(key);
        let mut ids: Vec<NetEntityId> = self.world.items().map(|item| item.id).collect();
        ids.sort();

        let mut positions = Vec::new();
        for id in ids {
            let Some(item) = self.world.item(id) else {
                continue;
            };
            if !self.throttle.should_send(item, key, viewer, self.now) {
                continue;
            }
            let payload = EventPayload::PositionUpdate {
                x: item.position.x,
                y: item.position.y,
                rotation: item.rotation,
                body_delta: Vec::new(),
            };
            positions.push(EncodedEvent::encode(&EntityEvent::new(
                POSITION_EVENT_ID,
                id,
                payload,
            )));
            self.throttle.mark_sent(id, key, self.now);
        }
        positions
    }

    /// Where the user's living character stands. Users without one watch as
    /// spectators.
    fn viewer_position(&self, key: UserKey) -> Option<Vec2> {
        let character = self.users.get(&key)?.character()?;
        let character = self.world.character(character)?;
        if character.is_dead {
            None
        } else {
            Some(character.position)
        }
    }

    // Users

    fn add_user(&mut self, key: UserKey, name: String, character: Option<NetEntityId>) {
        if self.users.contains_key(&key) {
            warn!("{} connected twice, ignoring", key);
            return;
        }
        if let Err(err) = self.event_log.add_recipient(key) {
            warn!("Cannot subscribe {}: {}", key, err);
            return;
        }
        let mut user = User::new(key, name, self.now);
        user.set_character(character);
        info!("{} ({}) connected", key, user.name());
        self.users.insert(key, user);

        // catch the newcomer up on everything it cannot derive itself
        let inventories = self.world.inventory_ids();
        let mut components: Vec<(NetEntityId, usize, ComponentState)> = Vec::new();
        for item in self.world.items() {
            for (index, state) in item.components.iter().enumerate() {
                components.push((item.id, index, *state));
            }
        }
        components.sort_by_key(|(id, index, _)| (*id, *index));
        self.event_log.reserve(inventories.len() + components.len());

        for inventory in inventories {
            self.broadcast_inventory(inventory);
        }
        for (item, index, state) in components {
            self.broadcast_component(item, index, state);
        }

        self.events.push_connection(&key);
    }

    fn disconnect_user(&mut self, key: &UserKey, reason: DisconnectReason) {
        let Some(user) = self.users.remove(key) else {
            return;
        };
        info!("{} ({}) disconnected: {:?}", key, user.name(), reason);
        self.event_log.remove_recipient(key);
        self.throttle.remove_recipient(key);
        self.events.push_disconnection(key, reason);
    }

    /// Changes which character a user controls.
    pub fn set_user_character(&mut self, key: &UserKey, character: Option<NetEntityId>) {
        if let Some(user) = self.users.get_mut(key) {
            user.set_character(character);
        }
    }

    pub fn user(&self, key: &UserKey) -> Option<&User> {
        self.users.get(key)
    }

    pub fn user_keys(&self) -> Vec<UserKey> {
        let mut keys: Vec<UserKey> = self.users.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn users_count(&self) -> usize {
        self.users.len()
    }

    // Client Packets

    fn process_packet(&mut self, key: UserKey, packet: ClientPacket) -> Result<(), ProtocolError> {
        let Some(user) = self.users.get_mut(&key) else {
            debug!("Dropping packet from unknown {}", key);
            return Ok(());
        };
        user.heard_from(self.now);

        if let Some(ack) = packet.server_ack {
            if self.event_log.has_recipient(&key) {
                self.event_log.ack(&key, ack)?;
            }
        }

        for event in packet.events {
            let Some(user) = self.users.get_mut(&key) else {
                break;
            };
            if user.is_stale_client_event(event.id) {
                trace!("{} resent client event {}", key, event.id);
                user.request_ack();
                continue;
            }
            if !user.is_next_client_event(event.id) {
                debug!("{} skipped ahead to client event {}, waiting", key, event.id);
                break;
            }
            let id = event.id;
            self.process_client_event(key, event)?;
            if let Some(user) = self.users.get_mut(&key) {
                user.mark_client_event_processed(id);
            }
        }
        Ok(())
    }

    fn process_client_event(&mut self, key: UserKey, event: EntityEvent) -> Result<(), ProtocolError> {
        let Some(requester) = self.requester(&key) else {
            return Ok(());
        };
        let entity = event.entity;
        match event.payload {
            payload @ EventPayload::InventoryState { .. } => {
                let Some(claim) = InventorySlotClaim::from_payload(&payload) else {
                    return Ok(());
                };
                let outcome =
                    self.reconciler
                        .reconcile(&mut self.world, entity, &claim, &requester)?;
                for item in &outcome.forced_resyncs {
                    self.throttle.force_resync(*item, key);
                }
                for change in &outcome.changes {
                    if let InventoryChange::Dropped { item, .. } = change {
                        self.throttle.reset(*item);
                    }
                }
                for inventory in &outcome.broadcasts {
                    self.broadcast_inventory(*inventory);
                }
                self.events.push_reconciliation(&key, outcome);
            }
            EventPayload::ComponentState {
                component_index,
                state,
            } => self.validate_component_claim(key, &requester, entity, component_index, state),
            other => {
                return Err(ProtocolError::UnexpectedKind {
                    kind: other.kind(),
                    entity,
                })
            }
        }
        Ok(())
    }

    fn validate_component_claim(
        &mut self,
        key: UserKey,
        requester: &Requester,
        item: NetEntityId,
        component_index: u8,
        claim: ComponentState,
    ) {
        let index = usize::from(component_index);
        let truth = self
            .world
            .item(item)
            .and_then(|entry| entry.components.get(index))
            .copied();
        let Some(truth) = truth else {
            warn!(
                "{} claimed component {} of {} which does not exist",
                key, component_index, item
            );
            self.events.push_component_claim(ComponentClaim {
                user: key,
                item,
                component_index,
                accepted: false,
            });
            return;
        };

        let merged = if self.reconciler.can_access_item(&self.world, requester, item) {
            merge_component_claim(&truth, claim)
        } else {
            warn!("{} may not operate {}", requester.name, item);
            None
        };

        let accepted = merged.is_some();
        let state = merged.unwrap_or(truth);
        if let Some(slot) = self
            .world
            .item_mut(item)
            .and_then(|entry| entry.components.get_mut(index))
        {
            *slot = state;
        }
        self.broadcast_component(item, index, state);
        self.events.push_component_claim(ComponentClaim {
            user: key,
            item,
            component_index,
            accepted,
        });
    }

    fn requester(&self, key: &UserKey) -> Option<Requester> {
        let user = self.users.get(key)?;
        Some(Requester::new(user.name(), user.character()))
    }

    // Broadcasts

    fn broadcast_inventory(&mut self, inventory: NetEntityId) {
        let Some(slots) = self.world.inventory(inventory).map(|inv| inv.slots().to_vec()) else {
            return;
        };
        if let Err(err) = self.event_log.push(inventory, EventKind::InventoryState, || {
            EventPayload::inventory_state(&slots)
        }) {
            warn!("Cannot log inventory {}: {}", inventory, err);
        }
    }

    fn broadcast_component(&mut self, item: NetEntityId, index: usize, state: ComponentState) {
        let Ok(component_index) = u8::try_from(index) else {
            return;
        };
        if let Err(err) = self.event_log.push(item, EventKind::ComponentState, || {
            EventPayload::ComponentState {
                component_index,
                state,
            }
        }) {
            warn!("Cannot log component {} of {}: {}", index, item, err);
        }
    }

    // Simulation

    pub fn now(&self) -> GameInstant {
        self.now
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct access to the arena. Changes made here reach clients only once
    /// they are announced through the mutators below.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn event_log(&self) -> &EntityEventLog {
        &self.event_log
    }

    pub fn throttle(&self) -> &InterestThrottle {
        &self.throttle
    }

    /// Logs an arbitrary event for every connected user. Payloads whose
    /// integer fields do not fit on the wire are refused.
    pub fn push_event(
        &mut self,
        entity: NetEntityId,
        payload: EventPayload,
    ) -> Result<EventId, ServerError> {
        let kind = payload.kind();
        let payload = payload.quantized();
        payload.check_ranges()?;
        Ok(self.event_log.push(entity, kind, move || payload)?)
    }

    /// Overwrites an inventory and announces it together with every inventory
    /// the moved items came from.
    pub fn set_inventory(
        &mut self,
        inventory: NetEntityId,
        slots: &[Option<NetEntityId>],
    ) -> Result<(), ServerError> {
        let touched = self.world.apply_inventory_state(inventory, slots)?;
        self.broadcast_inventory(inventory);
        for other in touched {
            self.broadcast_inventory(other);
        }
        Ok(())
    }

    /// Replaces a component's state as the simulation computed it.
    pub fn set_component_state(
        &mut self,
        item: NetEntityId,
        component_index: u8,
        state: ComponentState,
    ) -> Result<EventId, ServerError> {
        let state = state.quantized();
        let slot = self
            .world
            .item_mut(item)
            .ok_or(WorldError::UnknownItem { id: item })?
            .components
            .get_mut(usize::from(component_index))
            .ok_or(ServerError::UnknownComponent {
                item,
                component_index,
            })?;
        if slot.kind() != state.kind() {
            return Err(ServerError::ComponentKindMismatch {
                item,
                component_index,
                expected: slot.kind(),
                actual: state.kind(),
            });
        }
        *slot = state;
        self.push_event(
            item,
            EventPayload::ComponentState {
                component_index,
                state,
            },
        )
    }

    pub fn set_item_condition(
        &mut self,
        item: NetEntityId,
        condition: f32,
    ) -> Result<EventId, ServerError> {
        let entry = self
            .world
            .item_mut(item)
            .ok_or(WorldError::UnknownItem { id: item })?;
        entry.condition = condition;
        self.push_event(item, EventPayload::Status { condition })
    }

    /// Moves a free-standing item. Teleports restart its update interval so
    /// everyone in range hears about it promptly.
    pub fn move_item(
        &mut self,
        item: NetEntityId,
        position: Vec2,
        velocity: Vec2,
        teleport: bool,
    ) -> Result<(), ServerError> {
        let entry = self
            .world
            .item_mut(item)
            .ok_or(WorldError::UnknownItem { id: item })?;
        entry.position = position;
        entry.velocity = velocity;
        if teleport {
            self.throttle.reset(item);
        }
        Ok(())
    }

    /// Removes an item for good and drops its throttle state.
    pub fn remove_item(&mut self, item: NetEntityId) -> Result<(), ServerError> {
        let parent = self.world.item(item).and_then(|entry| entry.parent());
        self.world.remove_item(item)?;
        self.throttle.remove_entity(&item);
        if let Some(parent) = parent {
            self.broadcast_inventory(parent);
        }
        Ok(())
    }
}
