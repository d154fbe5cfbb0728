use std::fmt;

use ballast_shared::{EventId, GameInstant, NetEntityId};

// UserKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct UserKey(u64);

impl UserKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {}", self.0)
    }
}

// User

/// Everything the server remembers about one connected player. Dropped with
/// the connection.
#[derive(Clone, Debug)]
pub struct User {
    key: UserKey,
    name: String,
    character: Option<NetEntityId>,
    /// Most recent client event this user sent that the server has processed
    last_client_event: Option<EventId>,
    /// Whether the next packet must carry `last_client_event` even if it has
    /// nothing else to say
    ack_pending: bool,
    last_heard: GameInstant,
}

impl User {
    pub fn new(key: UserKey, name: String, now: GameInstant) -> Self {
        Self {
            key,
            name,
            character: None,
            last_client_event: None,
            ack_pending: false,
            last_heard: now,
        }
    }

    pub fn key(&self) -> UserKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn character(&self) -> Option<NetEntityId> {
        self.character
    }

    pub fn last_client_event(&self) -> Option<EventId> {
        self.last_client_event
    }

    pub fn last_heard(&self) -> GameInstant {
        self.last_heard
    }

    pub(crate) fn set_character(&mut self, character: Option<NetEntityId>) {
        self.character = character;
    }

    pub(crate) fn heard_from(&mut self, now: GameInstant) {
        self.last_heard = now;
    }

    /// Whether `id` is the next client event this user should send. The first
    /// event of a session is accepted whatever its id.
    pub(crate) fn is_next_client_event(&self, id: EventId) -> bool {
        match self.last_client_event {
            Some(last) => id == last.next(),
            None => true,
        }
    }

    pub(crate) fn is_stale_client_event(&self, id: EventId) -> bool {
        match self.last_client_event {
            Some(last) => !id.is_more_recent_than(last),
            None => false,
        }
    }

    pub(crate) fn mark_client_event_processed(&mut self, id: EventId) {
        self.last_client_event = Some(id);
        self.ack_pending = true;
    }

    /// A resent client event means our last acknowledgement went missing.
    pub(crate) fn request_ack(&mut self) {
        if self.last_client_event.is_some() {
            self.ack_pending = true;
        }
    }

    pub(crate) fn take_ack_request(&mut self) -> bool {
        std::mem::take(&mut self.ack_pending)
    }
}
