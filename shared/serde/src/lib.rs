mod bit_reader;
mod bit_writer;
mod error;
mod impls;
mod number;
mod ranged;
mod serde;

pub use bit_reader::{BitReader, OwnedBitReader};
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use error::SerdeErr;
pub use impls::{read_var_len, write_var_len, MAX_VAR_LEN};
pub use number::{
    SerdeInteger, SignedInteger, SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
};
pub use ranged::{
    bits_to_hold, quantize_float, ranged_bit_length, read_ranged_float, read_ranged_integer,
    read_raw_bits, write_ranged_float, write_ranged_integer, write_raw_bits, MAX_FLOAT_BITS,
};
pub use serde::{ConstBitLength, Serde};
