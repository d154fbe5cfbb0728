//! Bounded encodings: integers that only spend the bits their range needs and
//! floats quantized into a fixed number of bits over `[min, max]`.

use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr};

/// Number of bits needed to hold `value`. Zero still takes one bit so that a
/// degenerate range stays visible on the wire.
pub fn bits_to_hold(value: u64) -> u32 {
    if value == 0 {
        1
    } else {
        64 - value.leading_zeros()
    }
}

/// Width of a ranged integer over `[min, max]`.
pub fn ranged_bit_length(min: i64, max: i64) -> u32 {
    bits_to_hold(max.abs_diff(min))
}

pub fn write_raw_bits(writer: &mut dyn BitWrite, mut value: u64, bits: u32) {
    for _ in 0..bits {
        writer.write_bit(value & 1 != 0);
        value >>= 1;
    }
}

pub fn read_raw_bits(reader: &mut BitReader, bits: u32) -> Result<u64, SerdeErr> {
    if bits as u64 > u64::BITS as u64 {
        return Err(SerdeErr::LengthExceeded {
            len: bits as u64,
            max: u64::BITS as u64,
        });
    }
    let mut output: u64 = 0;
    for index in 0..bits {
        if reader.read_bit()? {
            output |= 1 << index;
        }
    }
    Ok(output)
}

/// Writes `value` as an offset from `min`. Values outside `[min, max]` are
/// clamped; callers are expected to construct in-range values.
pub fn write_ranged_integer(writer: &mut dyn BitWrite, value: i64, min: i64, max: i64) {
    let clamped = value.clamp(min, max);
    let offset = clamped.abs_diff(min);
    write_raw_bits(writer, offset, ranged_bit_length(min, max));
}

pub fn read_ranged_integer(reader: &mut BitReader, min: i64, max: i64) -> Result<i64, SerdeErr> {
    let offset = read_raw_bits(reader, ranged_bit_length(min, max))?;
    let span = max.abs_diff(min);
    if offset > span {
        return Err(SerdeErr::OutOfRange {
            value: min.saturating_add_unsigned(offset),
            min,
            max,
        });
    }
    Ok(min.saturating_add_unsigned(offset))
}

/// Largest width a ranged float may use.
pub const MAX_FLOAT_BITS: u32 = 32;

/// Float widths outside `1..=MAX_FLOAT_BITS` are clamped into it, on both the
/// writing and the reading side, so the two always agree on the layout.
fn float_width(bits: u32) -> u32 {
    debug_assert!(
        (1..=MAX_FLOAT_BITS).contains(&bits),
        "ranged floats use between 1 and {} bits, got {}",
        MAX_FLOAT_BITS,
        bits
    );
    bits.clamp(1, MAX_FLOAT_BITS)
}

fn quantize(value: f32, min: f32, max: f32, bits: u32) -> u64 {
    let max_step = (1_u64 << float_width(bits)) - 1;
    let range = max - min;
    if range <= 0.0 || value.is_nan() {
        return 0;
    }
    let unit = ((value - min) / range).clamp(0.0, 1.0);
    ((unit as f64) * (max_step as f64)).round() as u64
}

fn dequantize(step: u64, min: f32, max: f32, bits: u32) -> f32 {
    let max_step = (1_u64 << float_width(bits)) - 1;
    if step == 0 {
        return min;
    }
    if step >= max_step {
        return max;
    }
    min + (max - min) * ((step as f64) / (max_step as f64)) as f32
}

/// Writes a float in `[min, max]` using `bits` bits, at least 1 and at most
/// [`MAX_FLOAT_BITS`].
pub fn write_ranged_float(writer: &mut dyn BitWrite, value: f32, min: f32, max: f32, bits: u32) {
    let bits = float_width(bits);
    write_raw_bits(writer, quantize(value, min, max, bits), bits);
}

pub fn read_ranged_float(
    reader: &mut BitReader,
    min: f32,
    max: f32,
    bits: u32,
) -> Result<f32, SerdeErr> {
    let bits = float_width(bits);
    let step = read_raw_bits(reader, bits)?;
    Ok(dequantize(step, min, max, bits))
}

/// The value a receiver would decode if `value` were written as a ranged
/// float. Senders use this so their local state matches what peers see.
pub fn quantize_float(value: f32, min: f32, max: f32, bits: u32) -> f32 {
    dequantize(quantize(value, min, max, bits), min, max, bits)
}
