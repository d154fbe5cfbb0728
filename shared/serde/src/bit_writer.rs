use crate::bit_reader::OwnedBitReader;

/// Anything bits can be written into: a real [`BitWriter`] or a [`BitCounter`]
/// used to measure how much space a value would take.
pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);
    fn write_byte(&mut self, byte: u8);
    /// Advances to the next byte boundary, writing zero bits.
    fn pad_to_byte(&mut self);
    fn bits_written(&self) -> u32;

    fn write_bits(&mut self, bits: &OwnedBitReader) {
        let mut reader = bits.borrow();
        for _ in 0..bits.bit_len() {
            // an OwnedBitReader always holds exactly bit_len bits
            let Ok(bit) = reader.read_bit() else {
                return;
            };
            self.write_bit(bit);
        }
    }
}

/// Growable, LSB-first bit writer.
pub struct BitWriter {
    buffer: Vec<u8>,
    bit_count: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            bit_count: 0,
        }
    }

    /// Returns a counter positioned where this writer currently is, so that
    /// byte padding is measured correctly.
    pub fn counter(&self) -> BitCounter {
        BitCounter::starting_at(self.bit_count)
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_count % 8 == 0
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        let bit_index = self.bit_count % 8;
        if bit_index == 0 {
            self.buffer.push(0);
        }
        if bit {
            if let Some(last) = self.buffer.last_mut() {
                *last |= 1 << bit_index;
            }
        }
        self.bit_count += 1;
    }

    fn write_byte(&mut self, byte: u8) {
        if self.is_aligned() {
            self.buffer.push(byte);
            self.bit_count += 8;
            return;
        }
        let mut temp = byte;
        for _ in 0..8 {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn pad_to_byte(&mut self) {
        let remainder = self.bit_count % 8;
        if remainder != 0 {
            // the partially filled byte is already zero in its upper bits
            self.bit_count += 8 - remainder;
        }
    }

    fn bits_written(&self) -> u32 {
        self.bit_count
    }
}

/// Counts bits instead of storing them.
pub struct BitCounter {
    start_bits: u32,
    current_bits: u32,
}

impl BitCounter {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(start_bits: u32) -> Self {
        Self {
            start_bits,
            current_bits: start_bits,
        }
    }

    /// Number of bits counted since this counter was created.
    pub fn bits_needed(&self) -> u32 {
        self.current_bits - self.start_bits
    }
}

impl Default for BitCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitCounter {
    fn write_bit(&mut self, _: bool) {
        self.current_bits += 1;
    }

    fn write_byte(&mut self, _: u8) {
        self.current_bits += 8;
    }

    fn pad_to_byte(&mut self) {
        let remainder = self.current_bits % 8;
        if remainder != 0 {
            self.current_bits += 8 - remainder;
        }
    }

    fn bits_written(&self) -> u32 {
        self.current_bits
    }
}
