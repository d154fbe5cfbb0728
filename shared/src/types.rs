use std::fmt;

use ballast_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

use crate::{sequence_greater_than, wrapping_diff};

/// Identity of a networked entity for the lifetime of a round.
/// `0` is reserved for "none" and doubles as the empty-slot marker on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetEntityId(u16);

impl NetEntityId {
    pub const NONE: Self = Self(0);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `None` for the reserved id, `Some(self)` otherwise.
    pub fn to_option(self) -> Option<Self> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }

    pub fn from_option(value: Option<Self>) -> Self {
        value.unwrap_or(Self::NONE)
    }
}

impl From<u16> for NetEntityId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for NetEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serde for NetEntityId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u16::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl ConstBitLength for NetEntityId {
    fn const_bit_length() -> u32 {
        u16::const_bit_length()
    }
}

/// Position of an event in a cyclic 16-bit sequence.
///
/// There is no `Ord`: order ids with [`EventId::is_more_recent_than`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventId(u16);

impl EventId {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn prev(self) -> Self {
        Self(self.0.wrapping_sub(1))
    }

    pub fn is_more_recent_than(self, other: EventId) -> bool {
        sequence_greater_than(self.0, other.0)
    }

    /// `self` is `other` or issued after it.
    pub fn is_at_or_after(self, other: EventId) -> bool {
        self == other || self.is_more_recent_than(other)
    }

    /// Signed distance from `self` to `other`.
    pub fn steps_to(self, other: EventId) -> i16 {
        wrapping_diff(self.0, other.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serde for EventId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u16::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl ConstBitLength for EventId {
    fn const_bit_length() -> u32 {
        u16::const_bit_length()
    }
}

/// A point in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}
