use ballast_shared::{EventId, EventKind};
use thiserror::Error;

use crate::UserKey;

/// Errors that can occur during entity event log operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    /// The recipient was never added or has already been removed
    #[error("{recipient} is not subscribed to the event log")]
    UnknownRecipient { recipient: UserKey },

    /// The recipient is already subscribed
    #[error("{recipient} is already subscribed to the event log")]
    DuplicateRecipient { recipient: UserKey },

    /// The payload builder produced a different kind than the one requested
    #[error("Payload builder produced a {actual:?} event where {expected:?} was requested")]
    WrongKind {
        expected: EventKind,
        actual: EventKind,
    },

    /// A recipient acknowledged an event that has not been issued yet
    #[error("{recipient} acknowledged event {ack} but the newest issued event is {head}")]
    AckBeyondHead {
        recipient: UserKey,
        ack: EventId,
        head: EventId,
    },
}
