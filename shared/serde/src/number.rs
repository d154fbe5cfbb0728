use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde, ConstBitLength,
};

pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, false, BITS>;
pub type SignedInteger<const BITS: u8> = SerdeInteger<true, false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<false, true, BITS>;
pub type SignedVariableInteger<const BITS: u8> = SerdeInteger<true, true, BITS>;

// The generic wrapper only carries the layout; all work happens in the
// non-generic inner type so monomorphization stays cheap.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    inner: SerdeIntegerInner,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
struct SerdeIntegerInner {
    value: i64,
    signed: bool,
    variable: bool,
    bits: u8,
}

impl SerdeIntegerInner {
    fn check(signed: bool, variable: bool, bits: u8, value: i64) -> Result<(), SerdeErr> {
        if bits == 0 || bits > 62 {
            panic!("integer layouts must use between 1 and 62 bits, got {}", bits);
        }
        if !signed && value < 0 {
            return Err(SerdeErr::OutOfRange {
                value,
                min: 0,
                max: i64::MAX,
            });
        }
        if !variable {
            let limit: i64 = 1_i64 << bits;
            let min = if signed { -(limit - 1) } else { 0 };
            if value >= limit || value < min {
                return Err(SerdeErr::OutOfRange {
                    value,
                    min,
                    max: limit - 1,
                });
            }
        }
        Ok(())
    }

    fn ser(&self, writer: &mut dyn BitWrite) {
        let mut magnitude: u64 = self.value.unsigned_abs();

        if self.signed {
            writer.write_bit(self.value < 0);
        }

        if self.variable {
            loop {
                let proceed = magnitude >= (1_u64 << self.bits);
                writer.write_bit(proceed);
                for _ in 0..self.bits {
                    writer.write_bit(magnitude & 1 != 0);
                    magnitude >>= 1;
                }
                if !proceed {
                    return;
                }
            }
        } else {
            for _ in 0..self.bits {
                writer.write_bit(magnitude & 1 != 0);
                magnitude >>= 1;
            }
        }
    }

    fn de(reader: &mut BitReader, signed: bool, variable: bool, bits: u8) -> Result<Self, SerdeErr> {
        let negative = if signed { reader.read_bit()? } else { false };

        let mut magnitude: u64 = 0;
        let mut shift: u32 = 0;

        if variable {
            loop {
                let proceed = reader.read_bit()?;
                for _ in 0..bits {
                    if shift >= 63 {
                        return Err(SerdeErr::LengthExceeded {
                            len: u64::from(shift) + 1,
                            max: 63,
                        });
                    }
                    if reader.read_bit()? {
                        magnitude |= 1 << shift;
                    }
                    shift += 1;
                }
                if !proceed {
                    break;
                }
            }
        } else {
            for _ in 0..bits {
                if reader.read_bit()? {
                    magnitude |= 1 << shift;
                }
                shift += 1;
            }
        }

        let value = magnitude as i64;
        Ok(Self {
            value: if negative { -value } else { value },
            signed,
            variable,
            bits,
        })
    }

    fn bit_length(&self) -> u32 {
        let mut output: u32 = if self.signed { 1 } else { 0 };

        if self.variable {
            let mut magnitude = self.value.unsigned_abs();
            loop {
                let proceed = magnitude >= (1_u64 << self.bits);
                output += 1 + self.bits as u32;
                magnitude >>= self.bits;
                if !proceed {
                    break;
                }
            }
        } else {
            output += self.bits as u32;
        }
        output
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> SerdeInteger<SIGNED, VARIABLE, BITS> {
    /// # Panics
    ///
    /// Panics if `value` does not fit the layout. Use [`Self::try_new`] for
    /// values that did not come from trusted code.
    pub fn new<T: Into<i64>>(value: T) -> Self {
        match Self::try_new(value) {
            Ok(integer) => integer,
            Err(err) => panic!("SerdeInteger::new: {}", err),
        }
    }

    pub fn try_new<T: Into<i64>>(value: T) -> Result<Self, SerdeErr> {
        let value = value.into();
        SerdeIntegerInner::check(SIGNED, VARIABLE, BITS, value)?;
        Ok(Self {
            inner: SerdeIntegerInner {
                value,
                signed: SIGNED,
                variable: VARIABLE,
                bits: BITS,
            },
        })
    }

    pub fn get(&self) -> i64 {
        self.inner.value
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> Serde
    for SerdeInteger<SIGNED, VARIABLE, BITS>
{
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.inner.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let inner = SerdeIntegerInner::de(reader, SIGNED, VARIABLE, BITS)?;
        Ok(Self { inner })
    }

    fn bit_length(&self) -> u32 {
        self.inner.bit_length()
    }
}

impl<const SIGNED: bool, const BITS: u8> ConstBitLength for SerdeInteger<SIGNED, false, BITS> {
    fn const_bit_length() -> u32 {
        let sign: u32 = if SIGNED { 1 } else { 0 };
        sign + BITS as u32
    }
}
