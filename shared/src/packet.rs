use ballast_serde::{BitReader, BitWrite, BitWriter, Serde};

use crate::{
    events::{CodecError, EncodedEvent, EntityEvent},
    EventId,
};

fn write_ack(writer: &mut dyn BitWrite, ack: Option<EventId>) {
    ack.ser(writer);
    writer.pad_to_byte();
}

fn read_ack(reader: &mut BitReader) -> Result<Option<EventId>, CodecError> {
    let ack = Option::<EventId>::de(reader).map_err(CodecError::section("ack"))?;
    reader.skip_padding().map_err(CodecError::section("ack"))?;
    Ok(ack)
}

fn write_frames(writer: &mut dyn BitWrite, frames: &[EncodedEvent]) {
    let count = frames.len().min(u16::MAX as usize);
    (count as u16).ser(writer);
    for frame in &frames[..count] {
        frame.ser(writer);
    }
}

fn read_frames(
    reader: &mut BitReader,
    section: &'static str,
) -> Result<Vec<EncodedEvent>, CodecError> {
    let count = u16::de(reader).map_err(CodecError::section(section))?;
    let mut frames = Vec::with_capacity((count as usize).min(reader.bits_remaining() as usize / 8));
    for _ in 0..count {
        frames.push(EncodedEvent::de(reader).map_err(CodecError::section(section))?);
    }
    Ok(frames)
}

fn ensure_consumed(reader: &BitReader) -> Result<(), CodecError> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(CodecError::TrailingBits {
            bits: reader.bits_remaining(),
        })
    }
}

/// Everything a client sends in one update.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientPacket {
    /// Most recent server event id the client has applied.
    pub server_ack: Option<EventId>,
    /// Unacknowledged client claims, oldest first. Ids come from the client's
    /// own sequence.
    pub events: Vec<EntityEvent>,
}

impl ClientPacket {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        write_ack(&mut writer, self.server_ack);
        let frames: Vec<EncodedEvent> = self.events.iter().map(EncodedEvent::encode).collect();
        write_frames(&mut writer, &frames);
        writer.to_bytes()
    }

    /// Parses and fully decodes a packet. Any malformed event fails the whole
    /// packet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BitReader::new(bytes);
        let server_ack = read_ack(&mut reader)?;
        let frames = read_frames(&mut reader, "client events")?;
        ensure_consumed(&reader)?;
        let events = frames
            .iter()
            .map(EncodedEvent::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { server_ack, events })
    }
}

/// Everything the server sends to one user in one tick.
///
/// Events are kept encoded so the client can set aside the raw bits of events
/// it is not ready to interpret.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerPacket {
    /// Most recent client event id the server has processed.
    pub client_ack: Option<EventId>,
    /// Logged events in id order.
    pub events: Vec<EncodedEvent>,
    /// Unsequenced position updates. Their ids carry no meaning.
    pub positions: Vec<EncodedEvent>,
}

impl ServerPacket {
    pub fn is_empty(&self) -> bool {
        self.client_ack.is_none() && self.events.is_empty() && self.positions.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        write_ack(&mut writer, self.client_ack);
        write_frames(&mut writer, &self.events);
        write_frames(&mut writer, &self.positions);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BitReader::new(bytes);
        let client_ack = read_ack(&mut reader)?;
        let events = read_frames(&mut reader, "server events")?;
        let positions = read_frames(&mut reader, "positions")?;
        ensure_consumed(&reader)?;
        Ok(Self {
            client_ack,
            events,
            positions,
        })
    }
}
