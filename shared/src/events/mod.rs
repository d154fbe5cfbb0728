mod codec;
mod component;
mod error;
mod kind;
mod payload;

pub use codec::{decode, encode, read_event, write_event, EncodedEvent, EntityEvent, EventHeader};
pub use component::{
    ComponentKind, ComponentState, PowerDistributorState, ReactorState, SteeringState,
    DISTRIBUTOR_MAX_STEP, PERCENT_BITS, STEERING_VELOCITY_LIMIT, TEMPERATURE_BOOST_LIMIT,
};
pub use error::CodecError;
pub use kind::{ClosedSet, EventKind};
pub use payload::{
    read_component_header, CampaignInteraction, EventPayload, ItemStat, PropertyValue,
    CONDITION_BITS, MAX_COMPONENT_INDEX, MAX_INVENTORY_SLOTS, MAX_UPGRADE_INDEX,
    MAX_UPGRADE_LEVEL, ROTATION_BITS,
};
