mod channel;

pub use channel::{InboundMessage, NetworkEndpoint, OutboundPacket, PacketChannel, TickEndpoint};

use thiserror::Error;

/// The other end of a queue is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport queue closed")]
pub struct SendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport queue closed")]
pub struct RecvError;
