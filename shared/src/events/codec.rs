use ballast_serde::{read_var_len, write_var_len, BitReader, BitWrite, BitWriter, Serde, SerdeErr};

use crate::{
    events::{error::CodecError, kind::EventKind, payload::EventPayload},
    EventId, NetEntityId,
};

/// A single replicated mutation of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityEvent {
    pub id: EventId,
    pub entity: NetEntityId,
    pub payload: EventPayload,
}

impl EntityEvent {
    pub fn new(id: EventId, entity: NetEntityId, payload: EventPayload) -> Self {
        Self {
            id,
            entity,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// The part of an event that can be read without knowing anything about its
/// payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventHeader {
    pub id: EventId,
    pub entity: NetEntityId,
    pub kind: EventKind,
}

impl EventHeader {
    pub fn read(reader: &mut BitReader) -> Result<Self, CodecError> {
        let truncated = |source| CodecError::TruncatedEnvelope { source };
        let id = EventId::de(reader).map_err(truncated)?;
        let entity = NetEntityId::de(reader).map_err(truncated)?;
        let kind = EventKind::de(reader).map_err(|err| match err {
            SerdeErr::InvalidTag { tag, .. } => CodecError::UnknownKind { tag },
            source => CodecError::TruncatedEnvelope { source },
        })?;
        Ok(Self { id, entity, kind })
    }
}

/// Writes `event` followed by padding up to the next byte boundary.
pub fn write_event(writer: &mut dyn BitWrite, event: &EntityEvent) {
    event.id.ser(writer);
    event.entity.ser(writer);
    event.kind().ser(writer);
    event.payload.write_fields(writer);
    writer.pad_to_byte();
}

/// Reads one event, including its trailing padding.
pub fn read_event(reader: &mut BitReader) -> Result<EntityEvent, CodecError> {
    let header = EventHeader::read(reader)?;
    let payload = EventPayload::read_fields(header.kind, reader)?;
    reader
        .skip_padding()
        .map_err(CodecError::field("padding"))?;
    Ok(EntityEvent::new(header.id, header.entity, payload))
}

pub fn encode(event: &EntityEvent) -> Vec<u8> {
    let mut writer = BitWriter::new();
    write_event(&mut writer, event);
    writer.to_bytes()
}

/// Decodes exactly one event. Leftover bytes are an error.
pub fn decode(bytes: &[u8]) -> Result<EntityEvent, CodecError> {
    let mut reader = BitReader::new(bytes);
    let event = read_event(&mut reader)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBits {
            bits: reader.bits_remaining(),
        });
    }
    Ok(event)
}

/// The bytes of one encoded event, framed with a length prefix when placed in
/// a packet so receivers can walk past events they choose not to parse yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedEvent {
    bytes: Vec<u8>,
}

impl EncodedEvent {
    pub fn encode(event: &EntityEvent) -> Self {
        Self {
            bytes: encode(event),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reader(&self) -> BitReader<'_> {
        BitReader::new(&self.bytes)
    }

    pub fn header(&self) -> Result<EventHeader, CodecError> {
        EventHeader::read(&mut self.reader())
    }

    pub fn decode(&self) -> Result<EntityEvent, CodecError> {
        decode(&self.bytes)
    }
}

impl Serde for EncodedEvent {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_var_len(writer, self.bytes.len());
        for byte in &self.bytes {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let len = read_var_len(reader)?;
        let needed = (len as u64) * 8;
        if needed > reader.bits_remaining() as u64 {
            return Err(SerdeErr::OutOfBits {
                needed: needed.min(u32::MAX as u64) as u32,
                remaining: reader.bits_remaining(),
            });
        }
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(reader.read_byte()?);
        }
        Ok(Self { bytes })
    }
}
