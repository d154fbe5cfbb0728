use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, number::UnsignedVariableInteger,
    serde::Serde, ConstBitLength,
};

/// Largest length prefix accepted for strings and sequences.
pub const MAX_VAR_LEN: u64 = u16::MAX as u64;

pub fn write_var_len(writer: &mut dyn BitWrite, len: usize) {
    UnsignedVariableInteger::<7>::new(len as i64).ser(writer);
}

pub fn read_var_len(reader: &mut BitReader) -> Result<usize, SerdeErr> {
    let len = UnsignedVariableInteger::<7>::de(reader)?.get() as u64;
    if len > MAX_VAR_LEN {
        return Err(SerdeErr::LengthExceeded {
            len,
            max: MAX_VAR_LEN,
        });
    }
    Ok(len as usize)
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

macro_rules! impl_serde_unsigned {
    ($type:ty) => {
        impl Serde for $type {
            fn ser(&self, writer: &mut dyn BitWrite) {
                for byte in self.to_le_bytes() {
                    writer.write_byte(byte);
                }
            }

            fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                let mut bytes = [0u8; std::mem::size_of::<$type>()];
                for byte in bytes.iter_mut() {
                    *byte = reader.read_byte()?;
                }
                Ok(<$type>::from_le_bytes(bytes))
            }

            fn bit_length(&self) -> u32 {
                <Self as ConstBitLength>::const_bit_length()
            }
        }

        impl ConstBitLength for $type {
            fn const_bit_length() -> u32 {
                <$type>::BITS
            }
        }
    };
}

impl_serde_unsigned!(u8);
impl_serde_unsigned!(u16);
impl_serde_unsigned!(u32);
impl_serde_unsigned!(u64);

impl Serde for f32 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.to_bits().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(f32::from_bits(u32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        32
    }
}

impl ConstBitLength for f32 {
    fn const_bit_length() -> u32 {
        32
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_var_len(writer, self.len());
        for byte in self.as_bytes() {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let len = read_var_len(reader)?;
        let mut bytes = Vec::with_capacity(len.min(reader.bits_remaining() as usize / 8));
        for _ in 0..len {
            bytes.push(reader.read_byte()?);
        }
        String::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_var_len(writer, self.len());
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let len = read_var_len(reader)?;
        let mut output = Vec::with_capacity(len.min(reader.bits_remaining() as usize));
        for _ in 0..len {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}
