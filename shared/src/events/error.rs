use ballast_serde::SerdeErr;
use thiserror::Error;

/// Errors produced while decoding an event. All of them are fatal to the
/// connection the bytes came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The envelope (id, entity, kind) could not be read in full
    #[error("Event envelope is truncated: {source}")]
    TruncatedEnvelope { source: SerdeErr },

    /// The kind tag does not name a known event kind
    #[error("Unknown event kind tag {tag}")]
    UnknownKind { tag: u32 },

    /// A payload field was missing, malformed or outside its declared range
    #[error("Invalid field `{field}`: {source}")]
    InvalidField {
        field: &'static str,
        source: SerdeErr,
    },

    /// A packet section announced more entries than it contained
    #[error("Malformed packet section `{section}`: {source}")]
    MalformedPacket {
        section: &'static str,
        source: SerdeErr,
    },

    /// Bits other than padding remained after the last event field
    #[error("{bits} unread bits after the end of the event")]
    TrailingBits { bits: u32 },
}

impl CodecError {
    pub fn field(field: &'static str) -> impl FnOnce(SerdeErr) -> CodecError {
        move |source| CodecError::InvalidField { field, source }
    }

    pub(crate) fn section(section: &'static str) -> impl FnOnce(SerdeErr) -> CodecError {
        move |source| CodecError::MalformedPacket { section, source }
    }
}
