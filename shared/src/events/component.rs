//! Fixed-width state blocks of the item components whose settings players can
//! change. Every block has a width known from its [`ComponentKind`] alone, so a
//! reader can set a block aside without understanding it.

use ballast_serde::{
    quantize_float, read_ranged_float, read_ranged_integer, write_ranged_float,
    write_ranged_integer, BitReader, BitWrite, ConstBitLength, Serde, SerdeErr,
};

use crate::events::kind::{read_tag, write_tag, ClosedSet};

pub const PERCENT_BITS: u32 = 8;
pub const TEMPERATURE_BOOST_LIMIT: f32 = 20.0;
pub const DISTRIBUTOR_MAX_STEP: u8 = 10;
pub const STEERING_VELOCITY_LIMIT: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Reactor,
    PowerDistributor,
    Steering,
}

impl ClosedSet for ComponentKind {
    const TYPE_NAME: &'static str = "ComponentKind";
    const ALL: &'static [Self] = &[
        ComponentKind::Reactor,
        ComponentKind::PowerDistributor,
        ComponentKind::Steering,
    ];

    fn to_index(self) -> usize {
        match self {
            ComponentKind::Reactor => 0,
            ComponentKind::PowerDistributor => 1,
            ComponentKind::Steering => 2,
        }
    }
}

impl ComponentKind {
    /// Width of this kind's state block on the wire.
    pub fn state_bit_length(self) -> u32 {
        match self {
            ComponentKind::Reactor => ReactorState::const_bit_length(),
            ComponentKind::PowerDistributor => PowerDistributorState::const_bit_length(),
            ComponentKind::Steering => SteeringState::const_bit_length(),
        }
    }
}

impl Serde for ComponentKind {
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

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactorState {
    pub auto_temperature: bool,
    pub power_on: bool,
    /// 0..=100
    pub temperature: f32,
    /// 0..=100
    pub target_fission_rate: f32,
    /// 0..=100
    pub target_turbine_output: f32,
    /// 0..=1
    pub degree_of_success: f32,
    pub temperature_boost: f32,
}

impl ReactorState {
    /// Rounds every float to the precision it has on the wire.
    pub fn quantized(self) -> Self {
        Self {
            temperature: quantize_float(self.temperature, 0.0, 100.0, PERCENT_BITS),
            target_fission_rate: quantize_float(self.target_fission_rate, 0.0, 100.0, PERCENT_BITS),
            target_turbine_output: quantize_float(
                self.target_turbine_output,
                0.0,
                100.0,
                PERCENT_BITS,
            ),
            degree_of_success: quantize_float(self.degree_of_success, 0.0, 1.0, PERCENT_BITS),
            temperature_boost: quantize_float(
                self.temperature_boost,
                -TEMPERATURE_BOOST_LIMIT,
                TEMPERATURE_BOOST_LIMIT,
                PERCENT_BITS,
            ),
            ..self
        }
    }
}

impl Serde for ReactorState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(self.auto_temperature);
        writer.write_bit(self.power_on);
        write_ranged_float(writer, self.temperature, 0.0, 100.0, PERCENT_BITS);
        write_ranged_float(writer, self.target_fission_rate, 0.0, 100.0, PERCENT_BITS);
        write_ranged_float(writer, self.target_turbine_output, 0.0, 100.0, PERCENT_BITS);
        write_ranged_float(writer, self.degree_of_success, 0.0, 1.0, PERCENT_BITS);
        write_ranged_float(
            writer,
            self.temperature_boost,
            -TEMPERATURE_BOOST_LIMIT,
            TEMPERATURE_BOOST_LIMIT,
            PERCENT_BITS,
        );
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            auto_temperature: reader.read_bit()?,
            power_on: reader.read_bit()?,
            temperature: read_ranged_float(reader, 0.0, 100.0, PERCENT_BITS)?,
            target_fission_rate: read_ranged_float(reader, 0.0, 100.0, PERCENT_BITS)?,
            target_turbine_output: read_ranged_float(reader, 0.0, 100.0, PERCENT_BITS)?,
            degree_of_success: read_ranged_float(reader, 0.0, 1.0, PERCENT_BITS)?,
            temperature_boost: read_ranged_float(
                reader,
                -TEMPERATURE_BOOST_LIMIT,
                TEMPERATURE_BOOST_LIMIT,
                PERCENT_BITS,
            )?,
        })
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl ConstBitLength for ReactorState {
    fn const_bit_length() -> u32 {
        1 + 1 + PERCENT_BITS * 5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerDistributorState {
    pub power_on: bool,
    /// Slider position, 0..=10
    pub step: u8,
    /// 0..=1
    pub load_ratio: f32,
}

impl PowerDistributorState {
    pub fn quantized(self) -> Self {
        Self {
            step: self.step.min(DISTRIBUTOR_MAX_STEP),
            load_ratio: quantize_float(self.load_ratio, 0.0, 1.0, PERCENT_BITS),
            ..self
        }
    }
}

impl Serde for PowerDistributorState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(self.power_on);
        write_ranged_integer(writer, self.step as i64, 0, DISTRIBUTOR_MAX_STEP as i64);
        write_ranged_float(writer, self.load_ratio, 0.0, 1.0, PERCENT_BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            power_on: reader.read_bit()?,
            step: read_ranged_integer(reader, 0, DISTRIBUTOR_MAX_STEP as i64)? as u8,
            load_ratio: read_ranged_float(reader, 0.0, 1.0, PERCENT_BITS)?,
        })
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl ConstBitLength for PowerDistributorState {
    fn const_bit_length() -> u32 {
        // the 0..=10 step takes 4 bits
        1 + ballast_serde::ranged_bit_length(0, DISTRIBUTOR_MAX_STEP as i64) + PERCENT_BITS
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringState {
    pub autopilot: bool,
    pub maintain_position: bool,
    pub target_velocity_x: f32,
    pub target_velocity_y: f32,
}

impl SteeringState {
    pub fn quantized(self) -> Self {
        let limit = STEERING_VELOCITY_LIMIT;
        Self {
            target_velocity_x: quantize_float(self.target_velocity_x, -limit, limit, PERCENT_BITS),
            target_velocity_y: quantize_float(self.target_velocity_y, -limit, limit, PERCENT_BITS),
            ..self
        }
    }
}

impl Serde for SteeringState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let limit = STEERING_VELOCITY_LIMIT;
        writer.write_bit(self.autopilot);
        writer.write_bit(self.maintain_position);
        write_ranged_float(writer, self.target_velocity_x, -limit, limit, PERCENT_BITS);
        write_ranged_float(writer, self.target_velocity_y, -limit, limit, PERCENT_BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let limit = STEERING_VELOCITY_LIMIT;
        Ok(Self {
            autopilot: reader.read_bit()?,
            maintain_position: reader.read_bit()?,
            target_velocity_x: read_ranged_float(reader, -limit, limit, PERCENT_BITS)?,
            target_velocity_y: read_ranged_float(reader, -limit, limit, PERCENT_BITS)?,
        })
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl ConstBitLength for SteeringState {
    fn const_bit_length() -> u32 {
        1 + 1 + PERCENT_BITS * 2
    }
}

/// The settings of one component, tagged by its kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComponentState {
    Reactor(ReactorState),
    PowerDistributor(PowerDistributorState),
    Steering(SteeringState),
}

impl ComponentState {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentState::Reactor(_) => ComponentKind::Reactor,
            ComponentState::PowerDistributor(_) => ComponentKind::PowerDistributor,
            ComponentState::Steering(_) => ComponentKind::Steering,
        }
    }

    pub fn quantized(self) -> Self {
        match self {
            ComponentState::Reactor(state) => ComponentState::Reactor(state.quantized()),
            ComponentState::PowerDistributor(state) => {
                ComponentState::PowerDistributor(state.quantized())
            }
            ComponentState::Steering(state) => ComponentState::Steering(state.quantized()),
        }
    }

    /// Writes only the state block; the kind is written by the caller.
    pub fn write_block(&self, writer: &mut dyn BitWrite) {
        match self {
            ComponentState::Reactor(state) => state.ser(writer),
            ComponentState::PowerDistributor(state) => state.ser(writer),
            ComponentState::Steering(state) => state.ser(writer),
        }
    }

    pub fn read_block(kind: ComponentKind, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(match kind {
            ComponentKind::Reactor => ComponentState::Reactor(ReactorState::de(reader)?),
            ComponentKind::PowerDistributor => {
                ComponentState::PowerDistributor(PowerDistributorState::de(reader)?)
            }
            ComponentKind::Steering => ComponentState::Steering(SteeringState::de(reader)?),
        })
    }
}
