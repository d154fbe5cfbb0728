use thiserror::Error;

use ballast_shared::{CodecError, ComponentKind, EventKind, NetEntityId, WorldError};

use crate::{event_log::EventLogError, reconciler::ClaimError};

/// A client broke the protocol. Always fatal to its connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Bytes from the client could not be decoded
    #[error("Malformed packet: {0}")]
    Codec(#[from] CodecError),

    /// The client sent an inventory claim that cannot apply to the target
    #[error("Invalid inventory claim: {0}")]
    Claim(#[from] ClaimError),

    /// Clients may only send inventory and component claims
    #[error("Clients may not send {kind:?} events (entity {entity})")]
    UnexpectedKind { kind: EventKind, entity: NetEntityId },

    /// The client acknowledged something the server never sent
    #[error("Invalid acknowledgement: {0}")]
    InvalidAck(#[from] EventLogError),
}

/// Why the server dropped a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The transport reported the connection closed
    ClientLeft,
    Protocol(ProtocolError),
    /// No acknowledgement arrived within the configured bound
    Timeout,
    /// The user fell so far behind that events it still needed were discarded
    Lagging,
}

/// Errors returned by the simulation-facing mutators on [`crate::Server`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    /// A field does not fit the range it has on the wire
    #[error("Event cannot be encoded: {0}")]
    InvalidPayload(#[from] CodecError),

    /// The item has no component at this index
    #[error("Item {item} has no component {component_index}")]
    UnknownComponent { item: NetEntityId, component_index: u8 },

    /// The new state is for a different kind of component
    #[error("Component {component_index} of item {item} is a {expected:?}, not a {actual:?}")]
    ComponentKindMismatch {
        item: NetEntityId,
        component_index: u8,
        expected: ComponentKind,
        actual: ComponentKind,
    },
}
