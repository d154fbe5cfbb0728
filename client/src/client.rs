use std::{collections::VecDeque, mem, time::Duration};

use log::{debug, trace, warn};

use ballast_shared::{
    read_component_header, ClientPacket, CodecError, ComponentKind, ComponentState, EncodedEvent,
    EntityEvent, EventHeader, EventId, EventKind, EventPayload, GameInstant, InventorySlotClaim,
    NetEntityId, OwnedBitReader, ServerPacket, Vec2, World,
};

use crate::{
    client_config::ClientConfig,
    error::ClientError,
    prediction::{PredictionCorrector, Resolution},
};

/// Claims beyond this many unacknowledged ones are refused so that client
/// event ids stay comparable.
pub const MAX_PENDING_CLAIMS: usize = 1024;

type ComponentKey = (NetEntityId, u8);

/// Raw state block of a component update received during a correction
/// window.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferedComponent {
    pub kind: ComponentKind,
    pub bits: OwnedBitReader,
}

/// One player's view of the world.
///
/// Local changes are shown immediately and sent to the server as claims.
/// Authoritative updates for a value the player just changed are held back
/// for a short while so the display does not flicker between the two.
pub struct Client {
    config: ClientConfig,
    world: World,
    now: GameInstant,
    /// Newest server event applied, in log order
    last_received: Option<EventId>,
    /// `last_received` as of the last packet we sent
    ack_sent: Option<EventId>,
    next_claim_id: EventId,
    unacked_claims: VecDeque<EntityEvent>,
    component_corrections: PredictionCorrector<ComponentKey, BufferedComponent>,
    inventory_corrections: PredictionCorrector<NetEntityId, Vec<Option<NetEntityId>>>,
    applied: Vec<EntityEvent>,
}

impl Client {
    /// Create a new Client around a replica of the server's world
    pub fn new(config: ClientConfig, world: World) -> Self {
        Self {
            component_corrections: PredictionCorrector::new(config.correction_delay),
            inventory_corrections: PredictionCorrector::new(config.inventory_sync_delay),
            config,
            world,
            now: GameInstant::ZERO,
            last_received: None,
            ack_sent: None,
            next_claim_id: EventId::new(1),
            unacked_claims: VecDeque::new(),
            applied: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn now(&self) -> GameInstant {
        self.now
    }

    pub fn last_received(&self) -> Option<EventId> {
        self.last_received
    }

    pub fn pending_claims(&self) -> usize {
        self.unacked_claims.len()
    }

    pub fn is_correction_pending(&self, item: NetEntityId, component_index: u8) -> bool {
        self.component_corrections
            .is_pending(&(item, component_index), self.now)
    }

    pub fn is_inventory_sync_pending(&self, inventory: NetEntityId) -> bool {
        self.inventory_corrections.is_pending(&inventory, self.now)
    }

    /// Server events without a local representation, for the game to apply.
    pub fn take_applied_events(&mut self) -> Vec<EntityEvent> {
        mem::take(&mut self.applied)
    }

    // Local changes

    /// Rearranges an inventory locally and claims the result.
    pub fn move_items(
        &mut self,
        inventory: NetEntityId,
        slots: Vec<Option<NetEntityId>>,
    ) -> Result<EventId, ClientError> {
        self.ensure_claim_room()?;
        self.world.apply_inventory_state(inventory, &slots)?;
        let claimed = self
            .world
            .inventory(inventory)
            .map(|inv| inv.slots().to_vec())
            .unwrap_or(slots);
        self.inventory_corrections.predict(inventory, self.now);
        Ok(self.queue_claim(inventory, InventorySlotClaim::new(claimed).to_payload()))
    }

    /// Changes a component locally and claims the new state.
    pub fn set_component(
        &mut self,
        item: NetEntityId,
        component_index: u8,
        state: ComponentState,
    ) -> Result<EventId, ClientError> {
        self.ensure_claim_room()?;
        let state = state.quantized();
        let slot = self
            .world
            .item_mut(item)
            .and_then(|entry| entry.components.get_mut(usize::from(component_index)))
            .ok_or(ClientError::UnknownComponent {
                item,
                component_index,
            })?;
        if slot.kind() != state.kind() {
            return Err(ClientError::ComponentKindMismatch {
                item,
                component_index,
                expected: slot.kind(),
                actual: state.kind(),
            });
        }
        *slot = state;
        self.component_corrections
            .predict((item, component_index), self.now);
        Ok(self.queue_claim(
            item,
            EventPayload::ComponentState {
                component_index,
                state,
            },
        ))
    }

    fn ensure_claim_room(&self) -> Result<(), ClientError> {
        if self.unacked_claims.len() >= MAX_PENDING_CLAIMS {
            return Err(ClientError::TooManyPendingClaims {
                pending: self.unacked_claims.len(),
            });
        }
        Ok(())
    }

    fn queue_claim(&mut self, entity: NetEntityId, payload: EventPayload) -> EventId {
        let id = self.next_claim_id;
        self.next_claim_id = id.next();
        trace!("queued claim {} for {}", id, entity);
        self.unacked_claims
            .push_back(EntityEvent::new(id, entity, payload));
        id
    }

    // Time

    /// Advances the clock and settles every correction window that elapsed.
    /// Every elapsed window is settled even if one of them fails; the first
    /// failure is returned.
    pub fn update(&mut self, elapsed: Duration) -> Result<(), ClientError> {
        self.now += elapsed;
        let mut first_error: Option<ClientError> = None;

        for ((item, component_index), resolution) in self.component_corrections.update(self.now) {
            let Resolution::ApplyBuffered(buffered) = resolution else {
                continue;
            };
            match ComponentState::read_block(buffered.kind, &mut buffered.bits.borrow()) {
                Ok(state) => {
                    debug!(
                        "correction window for {} #{} settled on server state",
                        item, component_index
                    );
                    self.apply_component(item, component_index, state);
                }
                Err(err) => {
                    warn!(
                        "buffered state for {} #{} does not decode: {}",
                        item, component_index, err
                    );
                    first_error.get_or_insert(CodecError::field("component.state")(err).into());
                }
            }
        }

        for (inventory, resolution) in self.inventory_corrections.update(self.now) {
            if let Resolution::ApplyBuffered(slots) = resolution {
                if let Err(err) = self.apply_inventory(inventory, &slots) {
                    warn!("buffered state for inventory {} does not apply: {}", inventory, err);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // Packets

    /// Bytes for the next packet to the server, if it has anything to say.
    /// Every unacknowledged claim is sent again.
    pub fn send_packet(&mut self) -> Option<Vec<u8>> {
        if self.unacked_claims.is_empty() && self.ack_sent == self.last_received {
            return None;
        }
        self.ack_sent = self.last_received;
        let packet = ClientPacket {
            server_ack: self.last_received,
            events: self.unacked_claims.iter().cloned().collect(),
        };
        Some(packet.to_bytes())
    }

    /// Applies one packet from the server.
    pub fn receive_packet(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        let packet = ServerPacket::from_bytes(bytes)?;

        if let Some(ack) = packet.client_ack {
            while let Some(front) = self.unacked_claims.front() {
                if ack.is_at_or_after(front.id) {
                    self.unacked_claims.pop_front();
                } else {
                    break;
                }
            }
        }

        for encoded in &packet.events {
            let header = encoded.header()?;
            if let Some(last) = self.last_received {
                if !header.id.is_more_recent_than(last) {
                    trace!("skipping already applied event {}", header.id);
                    // our ack was lost, repeat it
                    self.ack_sent = None;
                    continue;
                }
                if header.id != last.next() {
                    debug!("event {} arrived before {}, waiting for resend", header.id, last.next());
                    break;
                }
            }
            self.receive_event(header, encoded)?;
            self.last_received = Some(header.id);
        }

        for encoded in &packet.positions {
            self.apply_position(encoded.decode()?);
        }
        Ok(())
    }

    fn receive_event(&mut self, header: EventHeader, encoded: &EncodedEvent) -> Result<(), ClientError> {
        match header.kind {
            EventKind::ComponentState => {
                let mut reader = encoded.reader();
                EventHeader::read(&mut reader)?;
                let (component_index, kind) = read_component_header(&mut reader)?;
                let key = (header.entity, component_index);
                if self.component_corrections.is_pending(&key, self.now) {
                    let bits = reader
                        .extract_bits(kind.state_bit_length())
                        .map_err(CodecError::field("component.state"))?;
                    trace!("holding back state of {} #{}", header.entity, component_index);
                    self.component_corrections
                        .buffer(key, BufferedComponent { kind, bits }, self.now);
                    return Ok(());
                }
                if let EventPayload::ComponentState {
                    component_index,
                    state,
                } = encoded.decode()?.payload
                {
                    self.apply_component(header.entity, component_index, state);
                }
            }
            EventKind::InventoryState => {
                let event = encoded.decode()?;
                let Some(claim) = InventorySlotClaim::from_payload(&event.payload) else {
                    return Ok(());
                };
                let slots = claim.slots().to_vec();
                if let Some(slots) = self
                    .inventory_corrections
                    .buffer(header.entity, slots, self.now)
                {
                    self.apply_inventory(header.entity, &slots)?;
                }
            }
            EventKind::Status => {
                let event = encoded.decode()?;
                if let EventPayload::Status { condition } = event.payload {
                    if let Some(item) = self.world.item_mut(event.entity) {
                        item.condition = condition;
                    }
                }
                self.applied.push(event);
            }
            EventKind::PositionUpdate => self.apply_position(encoded.decode()?),
            _ => self.applied.push(encoded.decode()?),
        }
        Ok(())
    }

    fn apply_component(&mut self, item: NetEntityId, component_index: u8, state: ComponentState) {
        match self
            .world
            .item_mut(item)
            .and_then(|entry| entry.components.get_mut(usize::from(component_index)))
        {
            Some(slot) => *slot = state,
            None => warn!("server state for missing component {} #{}", item, component_index),
        }
    }

    fn apply_inventory(
        &mut self,
        inventory: NetEntityId,
        slots: &[Option<NetEntityId>],
    ) -> Result<(), ClientError> {
        if self.world.inventory(inventory).is_none() {
            warn!("server state for missing inventory {}", inventory);
            return Ok(());
        }
        self.world.apply_inventory_state(inventory, slots)?;
        Ok(())
    }

    fn apply_position(&mut self, event: EntityEvent) {
        let EventPayload::PositionUpdate { x, y, rotation, .. } = event.payload else {
            return;
        };
        if let Some(item) = self.world.item_mut(event.entity) {
            if item.parent().is_none() {
                item.position = Vec2::new(x, y);
                item.rotation = rotation;
            }
        }
    }

    // Connection

    /// Forgets everything tied to the current connection. Open correction
    /// windows are dropped without applying their buffered state.
    pub fn disconnect(&mut self) {
        self.component_corrections.clear();
        self.inventory_corrections.clear();
        self.unacked_claims.clear();
        self.last_received = None;
        self.ack_sent = None;
    }

    /// Removes an entity from the replica along with any correction pending
    /// for it.
    pub fn remove_item(&mut self, item: NetEntityId) -> Result<(), ClientError> {
        self.component_corrections
            .cancel_where(|(entity, _)| *entity == item);
        self.inventory_corrections.cancel(&item);
        self.world.remove_item(item)?;
        Ok(())
    }
}
