//! # Ballast Shared
//! Common functionality shared between ballast-server & ballast-client crates:
//! entity and event ids, the event wire codec, packets and the entity arena.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use ballast_serde::{
    BitReader, BitWrite, BitWriter, ConstBitLength, OwnedBitReader, Serde, SerdeErr,
};

mod claim;
mod events;
mod game_time;
mod packet;
mod sequence_list;
mod types;
mod world;
mod wrapping_number;

pub use claim::InventorySlotClaim;
pub use events::{
    decode, encode, read_component_header, read_event, write_event, CampaignInteraction,
    ClosedSet, CodecError, ComponentKind, ComponentState, EncodedEvent, EntityEvent, EventHeader,
    EventKind, EventPayload, ItemStat, PowerDistributorState, PropertyValue, ReactorState,
    SteeringState, CONDITION_BITS, DISTRIBUTOR_MAX_STEP, MAX_COMPONENT_INDEX,
    MAX_INVENTORY_SLOTS, MAX_UPGRADE_INDEX, MAX_UPGRADE_LEVEL, PERCENT_BITS, ROTATION_BITS,
    STEERING_VELOCITY_LIMIT, TEMPERATURE_BOOST_LIMIT,
};
pub use game_time::GameInstant;
pub use packet::{ClientPacket, ServerPacket};
pub use sequence_list::{SequenceError, SequenceList};
pub use types::{EventId, NetEntityId, Vec2};
pub use world::{
    AccessPolicy, Character, Inventory, InventoryAccess, InventoryOwner, Item, RangeAccessPolicy,
    World, WorldError,
};
pub use wrapping_number::{
    sequence_greater_than, sequence_less_than, try_wrapping_diff, wrapping_diff,
    WrappingNumberError,
};
