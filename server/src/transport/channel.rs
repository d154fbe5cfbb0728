use log::trace;
use smol::{
    channel,
    channel::{Receiver, Sender, TryRecvError},
};

use ballast_shared::{ClientPacket, CodecError, NetEntityId};

use super::{RecvError, SendError};
use crate::UserKey;

/// Something the network side hands to the tick thread.
#[derive(Debug)]
pub enum InboundMessage {
    Connected {
        user: UserKey,
        name: String,
        character: Option<NetEntityId>,
    },
    Packet {
        user: UserKey,
        packet: ClientPacket,
    },
    /// Bytes that did not parse. The tick thread drops the connection.
    Malformed {
        user: UserKey,
        error: CodecError,
    },
    Disconnected {
        user: UserKey,
    },
}

/// Encoded bytes for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    pub user: UserKey,
    pub payload: Box<[u8]>,
}

pub struct PacketChannel;

impl PacketChannel {
    /// Creates the pair of queues linking network threads to the tick thread.
    pub fn unbounded() -> (NetworkEndpoint, TickEndpoint) {
        let (inbound_sender, inbound_receiver) = channel::unbounded();
        let (outbound_sender, outbound_receiver) = channel::unbounded();
        (
            NetworkEndpoint {
                inbound: inbound_sender,
                outbound: outbound_receiver,
            },
            TickEndpoint {
                inbound: inbound_receiver,
                outbound: outbound_sender,
            },
        )
    }
}

/// Held by network threads. Cloneable; every clone feeds the same tick
/// thread.
#[derive(Clone)]
pub struct NetworkEndpoint {
    inbound: Sender<InboundMessage>,
    outbound: Receiver<OutboundPacket>,
}

impl NetworkEndpoint {
    pub fn connect(
        &self,
        user: UserKey,
        name: impl Into<String>,
        character: Option<NetEntityId>,
    ) -> Result<(), SendError> {
        self.send(InboundMessage::Connected {
            user,
            name: name.into(),
            character,
        })
    }

    /// Parses `bytes` on the calling thread and queues the result.
    pub fn receive_bytes(&self, user: UserKey, bytes: &[u8]) -> Result<(), SendError> {
        let message = match ClientPacket::from_bytes(bytes) {
            Ok(packet) => InboundMessage::Packet { user, packet },
            Err(error) => InboundMessage::Malformed { user, error },
        };
        trace!("queued {} inbound bytes from {}", bytes.len(), user);
        self.send(message)
    }

    pub fn disconnect(&self, user: UserKey) -> Result<(), SendError> {
        self.send(InboundMessage::Disconnected { user })
    }

    /// Next packet the tick thread produced, if any.
    pub fn try_recv_outbound(&self) -> Result<Option<OutboundPacket>, RecvError> {
        match self.outbound.try_recv() {
            Ok(packet) => Ok(Some(packet)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(RecvError),
        }
    }

    /// Waits for the next outbound packet.
    pub fn recv_outbound(&self) -> Result<OutboundPacket, RecvError> {
        smol::block_on(self.outbound.recv()).map_err(|_| RecvError)
    }

    fn send(&self, message: InboundMessage) -> Result<(), SendError> {
        self.inbound.send_blocking(message).map_err(|_| SendError)
    }
}

/// Held by the tick thread. Never blocks.
pub struct TickEndpoint {
    inbound: Receiver<InboundMessage>,
    outbound: Sender<OutboundPacket>,
}

impl TickEndpoint {
    pub fn try_recv(&self) -> Result<Option<InboundMessage>, RecvError> {
        match self.inbound.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(RecvError),
        }
    }

    pub fn send(&self, packet: OutboundPacket) -> Result<(), SendError> {
        self.outbound.try_send(packet).map_err(|_| SendError)
    }
}
