use std::f32::consts::TAU;

use ballast_serde::{
    quantize_float, read_ranged_float, read_ranged_integer, write_ranged_float,
    write_ranged_integer, BitReader, BitWrite, Serde, SerdeErr, SignedVariableInteger,
    UnsignedVariableInteger,
};

use crate::{
    events::{
        component::{ComponentKind, ComponentState, DISTRIBUTOR_MAX_STEP},
        error::CodecError,
        kind::{read_tag, write_tag, ClosedSet, EventKind},
    },
    NetEntityId,
};

/// Inventories hold at most this many slots; the slot count travels as a byte.
pub const MAX_INVENTORY_SLOTS: usize = u8::MAX as usize;
/// Highest component index an item may expose.
pub const MAX_COMPONENT_INDEX: u8 = 15;
pub const MAX_UPGRADE_INDEX: u8 = 31;
pub const MAX_UPGRADE_LEVEL: u8 = 15;
pub const CONDITION_BITS: u32 = 8;
pub const ROTATION_BITS: u32 = 8;

/// Wraps into `0..TAU` at wire precision. A full turn becomes zero.
fn quantize_rotation(rotation: f32) -> f32 {
    let rotation = quantize_float(rotation.rem_euclid(TAU), 0.0, TAU, ROTATION_BITS);
    if rotation >= TAU {
        0.0
    } else {
        rotation
    }
}

/// A value assigned to an editable item property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PropertyTag {
    Bool,
    Int,
    Float,
    Text,
}

impl ClosedSet for PropertyTag {
    const TYPE_NAME: &'static str = "PropertyValue";
    const ALL: &'static [Self] = &[
        PropertyTag::Bool,
        PropertyTag::Int,
        PropertyTag::Float,
        PropertyTag::Text,
    ];

    fn to_index(self) -> usize {
        self as usize
    }
}

impl PropertyValue {
    fn tag(&self) -> PropertyTag {
        match self {
            PropertyValue::Bool(_) => PropertyTag::Bool,
            PropertyValue::Int(_) => PropertyTag::Int,
            PropertyValue::Float(_) => PropertyTag::Float,
            PropertyValue::Text(_) => PropertyTag::Text,
        }
    }

    fn write(&self, writer: &mut dyn BitWrite) {
        write_tag(writer, self.tag());
        match self {
            PropertyValue::Bool(value) => value.ser(writer),
            PropertyValue::Int(value) => SignedVariableInteger::<7>::new(*value).ser(writer),
            PropertyValue::Float(value) => value.ser(writer),
            PropertyValue::Text(value) => value.ser(writer),
        }
    }

    fn read(reader: &mut BitReader) -> Result<Self, CodecError> {
        let tag: PropertyTag = read_tag(reader).map_err(CodecError::field("property.tag"))?;
        Ok(match tag {
            PropertyTag::Bool => {
                PropertyValue::Bool(bool::de(reader).map_err(CodecError::field("property.bool"))?)
            }
            PropertyTag::Int => {
                let wide = SignedVariableInteger::<7>::de(reader)
                    .map_err(CodecError::field("property.int"))?
                    .get();
                let value = i32::try_from(wide).map_err(|_| CodecError::InvalidField {
                    field: "property.int",
                    source: SerdeErr::OutOfRange {
                        value: wide,
                        min: i32::MIN as i64,
                        max: i32::MAX as i64,
                    },
                })?;
                PropertyValue::Int(value)
            }
            PropertyTag::Float => {
                PropertyValue::Float(f32::de(reader).map_err(CodecError::field("property.float"))?)
            }
            PropertyTag::Text => {
                PropertyValue::Text(String::de(reader).map_err(CodecError::field("property.text"))?)
            }
        })
    }
}

/// What a campaign NPC offers when a player interacts with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CampaignInteraction {
    None,
    Talk,
    Examine,
    Crew,
    Store,
    Upgrade,
    MedicalClinic,
}

impl ClosedSet for CampaignInteraction {
    const TYPE_NAME: &'static str = "CampaignInteraction";
    const ALL: &'static [Self] = &[
        CampaignInteraction::None,
        CampaignInteraction::Talk,
        CampaignInteraction::Examine,
        CampaignInteraction::Crew,
        CampaignInteraction::Store,
        CampaignInteraction::Upgrade,
        CampaignInteraction::MedicalClinic,
    ];

    fn to_index(self) -> usize {
        self as usize
    }
}

/// Item statistics that talents and upgrades can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemStat {
    DeteriorationSpeed,
    BatteryCapacity,
    EngineMaxSpeed,
    PumpSpeed,
    ReactorMaxOutput,
    ReactorFuelConsumption,
    FabricationSpeed,
}

impl ClosedSet for ItemStat {
    const TYPE_NAME: &'static str = "ItemStat";
    const ALL: &'static [Self] = &[
        ItemStat::DeteriorationSpeed,
        ItemStat::BatteryCapacity,
        ItemStat::EngineMaxSpeed,
        ItemStat::PumpSpeed,
        ItemStat::ReactorMaxOutput,
        ItemStat::ReactorFuelConsumption,
        ItemStat::FabricationSpeed,
    ];

    fn to_index(self) -> usize {
        self as usize
    }
}

/// The body of an event. The variant is the event's kind.
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    /// Full contents of an inventory, one id per slot, `NetEntityId::NONE` for
    /// empty slots.
    InventoryState { slots: Vec<NetEntityId> },
    ComponentState {
        component_index: u8,
        state: ComponentState,
    },
    ChangeProperty {
        property_index: u16,
        value: PropertyValue,
    },
    /// Item condition, 0..=100
    Status { condition: f32 },
    AssignCampaignInteraction { interaction: CampaignInteraction },
    SetStat { stat: ItemStat, value: f32 },
    Upgrade { upgrade_index: u8, level: u8 },
    PositionUpdate {
        x: f32,
        y: f32,
        /// Radians, 0..TAU
        rotation: f32,
        /// Opaque physics body delta
        body_delta: Vec<u8>,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::InventoryState { .. } => EventKind::InventoryState,
            EventPayload::ComponentState { .. } => EventKind::ComponentState,
            EventPayload::ChangeProperty { .. } => EventKind::ChangeProperty,
            EventPayload::Status { .. } => EventKind::Status,
            EventPayload::AssignCampaignInteraction { .. } => EventKind::AssignCampaignInteraction,
            EventPayload::SetStat { .. } => EventKind::SetStat,
            EventPayload::Upgrade { .. } => EventKind::Upgrade,
            EventPayload::PositionUpdate { .. } => EventKind::PositionUpdate,
        }
    }

    pub fn inventory_state(slots: &[Option<NetEntityId>]) -> Self {
        EventPayload::InventoryState {
            slots: slots.iter().map(|slot| NetEntityId::from_option(*slot)).collect(),
        }
    }

    /// Rounds float fields to their on-wire precision, so that the value a
    /// sender keeps locally equals what every receiver decodes.
    pub fn quantized(self) -> Self {
        match self {
            EventPayload::ComponentState {
                component_index,
                state,
            } => EventPayload::ComponentState {
                component_index,
                state: state.quantized(),
            },
            EventPayload::Status { condition } => EventPayload::Status {
                condition: quantize_float(condition, 0.0, 100.0, CONDITION_BITS),
            },
            EventPayload::PositionUpdate {
                x,
                y,
                rotation,
                body_delta,
            } => EventPayload::PositionUpdate {
                x,
                y,
                rotation: quantize_rotation(rotation),
                body_delta,
            },
            other => other,
        }
    }

    /// Whether `self` carries the newer value of whatever `earlier` sets, so
    /// that a receiver which only gets `self` ends up in the same state.
    /// Component, property, stat and upgrade events only replace events for
    /// the same index.
    pub fn replaces(&self, earlier: &EventPayload) -> bool {
        match (self, earlier) {
            (EventPayload::InventoryState { .. }, EventPayload::InventoryState { .. })
            | (EventPayload::Status { .. }, EventPayload::Status { .. })
            | (
                EventPayload::AssignCampaignInteraction { .. },
                EventPayload::AssignCampaignInteraction { .. },
            )
            | (EventPayload::PositionUpdate { .. }, EventPayload::PositionUpdate { .. }) => true,
            (
                EventPayload::ComponentState {
                    component_index: new,
                    ..
                },
                EventPayload::ComponentState {
                    component_index: old,
                    ..
                },
            ) => new == old,
            (
                EventPayload::ChangeProperty {
                    property_index: new,
                    ..
                },
                EventPayload::ChangeProperty {
                    property_index: old,
                    ..
                },
            ) => new == old,
            (EventPayload::SetStat { stat: new, .. }, EventPayload::SetStat { stat: old, .. }) => {
                new == old
            }
            (
                EventPayload::Upgrade {
                    upgrade_index: new,
                    ..
                },
                EventPayload::Upgrade {
                    upgrade_index: old,
                    ..
                },
            ) => new == old,
            _ => false,
        }
    }

    /// Checks the integer fields against the ranges they have on the wire.
    /// Floats are quantized instead, see [`quantized`](Self::quantized).
    pub fn check_ranges(&self) -> Result<(), CodecError> {
        fn in_range(field: &'static str, value: u8, max: u8) -> Result<(), CodecError> {
            if value > max {
                return Err(CodecError::InvalidField {
                    field,
                    source: SerdeErr::OutOfRange {
                        value: i64::from(value),
                        min: 0,
                        max: i64::from(max),
                    },
                });
            }
            Ok(())
        }

        match self {
            EventPayload::InventoryState { slots } => {
                if slots.len() > MAX_INVENTORY_SLOTS {
                    return Err(CodecError::InvalidField {
                        field: "inventory.count",
                        source: SerdeErr::LengthExceeded {
                            len: slots.len() as u64,
                            max: MAX_INVENTORY_SLOTS as u64,
                        },
                    });
                }
                Ok(())
            }
            EventPayload::ComponentState {
                component_index,
                state,
            } => {
                in_range("component.index", *component_index, MAX_COMPONENT_INDEX)?;
                if let ComponentState::PowerDistributor(distributor) = state {
                    in_range("component.step", distributor.step, DISTRIBUTOR_MAX_STEP)?;
                }
                Ok(())
            }
            EventPayload::Upgrade {
                upgrade_index,
                level,
            } => {
                in_range("upgrade.index", *upgrade_index, MAX_UPGRADE_INDEX)?;
                in_range("upgrade.level", *level, MAX_UPGRADE_LEVEL)
            }
            _ => Ok(()),
        }
    }

    /// Writes every field after the kind. Integer fields that fail
    /// [`check_ranges`](Self::check_ranges) are clamped, so senders check
    /// before logging an event.
    pub fn write_fields(&self, writer: &mut dyn BitWrite) {
        match self {
            EventPayload::InventoryState { slots } => {
                let count = slots.len().min(MAX_INVENTORY_SLOTS);
                (count as u8).ser(writer);
                for slot in &slots[..count] {
                    slot.ser(writer);
                }
            }
            EventPayload::ComponentState {
                component_index,
                state,
            } => {
                write_ranged_integer(
                    writer,
                    *component_index as i64,
                    0,
                    MAX_COMPONENT_INDEX as i64,
                );
                state.kind().ser(writer);
                state.write_block(writer);
            }
            EventPayload::ChangeProperty {
                property_index,
                value,
            } => {
                UnsignedVariableInteger::<7>::new(*property_index).ser(writer);
                value.write(writer);
            }
            EventPayload::Status { condition } => {
                write_ranged_float(writer, *condition, 0.0, 100.0, CONDITION_BITS);
            }
            EventPayload::AssignCampaignInteraction { interaction } => {
                write_tag(writer, *interaction);
            }
            EventPayload::SetStat { stat, value } => {
                write_tag(writer, *stat);
                value.ser(writer);
            }
            EventPayload::Upgrade {
                upgrade_index,
                level,
            } => {
                write_ranged_integer(writer, *upgrade_index as i64, 0, MAX_UPGRADE_INDEX as i64);
                write_ranged_integer(writer, *level as i64, 0, MAX_UPGRADE_LEVEL as i64);
            }
            EventPayload::PositionUpdate {
                x,
                y,
                rotation,
                body_delta,
            } => {
                x.ser(writer);
                y.ser(writer);
                write_ranged_float(writer, quantize_rotation(*rotation), 0.0, TAU, ROTATION_BITS);
                body_delta.ser(writer);
            }
        }
    }

    /// Reads every field of a payload whose kind has already been read.
    pub fn read_fields(kind: EventKind, reader: &mut BitReader) -> Result<Self, CodecError> {
        Ok(match kind {
            EventKind::InventoryState => {
                let count = u8::de(reader).map_err(CodecError::field("inventory.count"))?;
                let mut slots = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    slots.push(NetEntityId::de(reader).map_err(CodecError::field("inventory.slot"))?);
                }
                EventPayload::InventoryState { slots }
            }
            EventKind::ComponentState => {
                let (component_index, component_kind) = read_component_header(reader)?;
                let state = ComponentState::read_block(component_kind, reader)
                    .map_err(CodecError::field("component.state"))?;
                EventPayload::ComponentState {
                    component_index,
                    state,
                }
            }
            EventKind::ChangeProperty => {
                let index = UnsignedVariableInteger::<7>::de(reader)
                    .map_err(CodecError::field("property.index"))?
                    .get();
                let property_index = u16::try_from(index).map_err(|_| CodecError::InvalidField {
                    field: "property.index",
                    source: SerdeErr::OutOfRange {
                        value: index,
                        min: 0,
                        max: u16::MAX as i64,
                    },
                })?;
                EventPayload::ChangeProperty {
                    property_index,
                    value: PropertyValue::read(reader)?,
                }
            }
            EventKind::Status => EventPayload::Status {
                condition: read_ranged_float(reader, 0.0, 100.0, CONDITION_BITS)
                    .map_err(CodecError::field("status.condition"))?,
            },
            EventKind::AssignCampaignInteraction => EventPayload::AssignCampaignInteraction {
                interaction: read_tag(reader).map_err(CodecError::field("campaign.interaction"))?,
            },
            EventKind::SetStat => EventPayload::SetStat {
                stat: read_tag(reader).map_err(CodecError::field("stat.kind"))?,
                value: f32::de(reader).map_err(CodecError::field("stat.value"))?,
            },
            EventKind::Upgrade => EventPayload::Upgrade {
                upgrade_index: read_ranged_integer(reader, 0, MAX_UPGRADE_INDEX as i64)
                    .map_err(CodecError::field("upgrade.index"))? as u8,
                level: read_ranged_integer(reader, 0, MAX_UPGRADE_LEVEL as i64)
                    .map_err(CodecError::field("upgrade.level"))? as u8,
            },
            EventKind::PositionUpdate => EventPayload::PositionUpdate {
                x: f32::de(reader).map_err(CodecError::field("position.x"))?,
                y: f32::de(reader).map_err(CodecError::field("position.y"))?,
                rotation: read_ranged_float(reader, 0.0, TAU, ROTATION_BITS)
                    .map_err(CodecError::field("position.rotation"))?,
                body_delta: Vec::<u8>::de(reader).map_err(CodecError::field("position.body"))?,
            },
        })
    }
}

/// Reads the component index and kind that precede a component state block.
pub fn read_component_header(reader: &mut BitReader) -> Result<(u8, ComponentKind), CodecError> {
    let component_index = read_ranged_integer(reader, 0, MAX_COMPONENT_INDEX as i64)
        .map_err(CodecError::field("component.index"))? as u8;
    let component_kind =
        ComponentKind::de(reader).map_err(CodecError::field("component.kind"))?;
    Ok((component_index, component_kind))
}
