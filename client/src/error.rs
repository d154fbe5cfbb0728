use thiserror::Error;

use ballast_shared::{CodecError, ComponentKind, NetEntityId, WorldError};

/// Errors that can occur in a client session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server sent bytes that do not decode
    #[error("Malformed server packet: {0}")]
    Codec(#[from] CodecError),

    /// A local change could not be applied to the replica
    #[error(transparent)]
    World(#[from] WorldError),

    #[error("Item {item} has no component {component_index}")]
    UnknownComponent { item: NetEntityId, component_index: u8 },

    #[error("Component {component_index} of item {item} is a {expected:?}, not a {actual:?}")]
    ComponentKindMismatch {
        item: NetEntityId,
        component_index: u8,
        expected: ComponentKind,
        actual: ComponentKind,
    },

    /// Too many local changes are waiting for the server to confirm them
    #[error("{pending} claims are still unacknowledged")]
    TooManyPendingClaims { pending: usize },
}
