use std::{mem, vec::IntoIter};

use ballast_shared::NetEntityId;

use crate::{error::DisconnectReason, reconciler::ReconcileOutcome, user::UserKey};

/// Result of validating one client component claim.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentClaim {
    pub user: UserKey,
    pub item: NetEntityId,
    pub component_index: u8,
    /// Whether the claimed values were applied
    pub accepted: bool,
}

/// Everything that happened during the last [`crate::Server::tick`].
pub struct Events {
    connections: Vec<UserKey>,
    disconnections: Vec<(UserKey, DisconnectReason)>,
    reconciliations: Vec<(UserKey, ReconcileOutcome)>,
    component_claims: Vec<ComponentClaim>,

    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            reconciliations: Vec::new(),
            component_claims: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, user_key: &UserKey) {
        self.connections.push(*user_key);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, user_key: &UserKey, reason: DisconnectReason) {
        self.disconnections.push((*user_key, reason));
        self.empty = false;
    }

    pub(crate) fn push_reconciliation(&mut self, user_key: &UserKey, outcome: ReconcileOutcome) {
        self.reconciliations.push((*user_key, outcome));
        self.empty = false;
    }

    pub(crate) fn push_component_claim(&mut self, claim: ComponentClaim) {
        self.component_claims.push(claim);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<UserKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<(UserKey, DisconnectReason)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// ReconcileEvent
pub struct ReconcileEvent;
impl Event for ReconcileEvent {
    type Iter = IntoIter<(UserKey, ReconcileOutcome)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.reconciliations).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.reconciliations.is_empty()
    }
}

// ComponentClaimEvent
pub struct ComponentClaimEvent;
impl Event for ComponentClaimEvent {
    type Iter = IntoIter<ComponentClaim>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.component_claims).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.component_claims.is_empty()
    }
}
