use ballast_serde::{
    ranged_bit_length, read_ranged_integer, write_ranged_integer, BitReader, BitWrite,
    ConstBitLength, Serde, SerdeErr,
};

/// A closed enumeration written as a ranged integer over its variants.
pub trait ClosedSet: Sized + Copy + 'static {
    const TYPE_NAME: &'static str;
    const ALL: &'static [Self];

    fn to_index(self) -> usize;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn tag_bit_length() -> u32 {
        ranged_bit_length(0, Self::ALL.len() as i64 - 1)
    }
}

pub(crate) fn write_tag<T: ClosedSet>(writer: &mut dyn BitWrite, value: T) {
    write_ranged_integer(writer, value.to_index() as i64, 0, T::ALL.len() as i64 - 1);
}

pub(crate) fn read_tag<T: ClosedSet>(reader: &mut BitReader) -> Result<T, SerdeErr> {
    let max = T::ALL.len() as i64 - 1;
    let index = read_ranged_integer(reader, 0, max).map_err(|err| match err {
        SerdeErr::OutOfRange { value, .. } => SerdeErr::InvalidTag {
            type_name: T::TYPE_NAME,
            tag: value as u32,
        },
        other => other,
    })?;
    T::from_index(index as usize).ok_or(SerdeErr::InvalidTag {
        type_name: T::TYPE_NAME,
        tag: index as u32,
    })
}

/// Every kind of event that can travel between server and client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    InventoryState,
    ComponentState,
    ChangeProperty,
    Status,
    AssignCampaignInteraction,
    SetStat,
    Upgrade,
    PositionUpdate,
}

impl ClosedSet for EventKind {
    const TYPE_NAME: &'static str = "EventKind";
    const ALL: &'static [Self] = &[
        EventKind::InventoryState,
        EventKind::ComponentState,
        EventKind::ChangeProperty,
        EventKind::Status,
        EventKind::AssignCampaignInteraction,
        EventKind::SetStat,
        EventKind::Upgrade,
        EventKind::PositionUpdate,
    ];

    fn to_index(self) -> usize {
        match self {
            EventKind::InventoryState => 0,
            EventKind::ComponentState => 1,
            EventKind::ChangeProperty => 2,
            EventKind::Status => 3,
            EventKind::AssignCampaignInteraction => 4,
            EventKind::SetStat => 5,
            EventKind::Upgrade => 6,
            EventKind::PositionUpdate => 7,
        }
    }
}

impl EventKind {
    /// Whether a client is allowed to send events of this kind.
    pub fn is_client_claim(self) -> bool {
        matches!(self, EventKind::InventoryState | EventKind::ComponentState)
    }
}

impl Serde for EventKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_tag(writer, *self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        read_tag(reader)
    }

    fn bit_length(&self) -> u32 {
        Self::tag_bit_length()
    }
}

impl ConstBitLength for EventKind {
    fn const_bit_length() -> u32 {
        Self::tag_bit_length()
    }
}
