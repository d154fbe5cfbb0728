use crate::{bit_writer::BitWrite, error::SerdeErr, BitWriter};

/// Sequential reader over an LSB-first bit buffer.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    bit_len: u32,
    position: u32,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            bit_len: (buffer.len() as u32) * 8,
            position: 0,
        }
    }

    fn with_bit_len(buffer: &'b [u8], bit_len: u32) -> Self {
        Self {
            buffer,
            bit_len,
            position: 0,
        }
    }

    pub fn bits_read(&self) -> u32 {
        self.position
    }

    pub fn bits_remaining(&self) -> u32 {
        self.bit_len - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.position >= self.bit_len {
            return Err(SerdeErr::OutOfBits {
                needed: 1,
                remaining: 0,
            });
        }
        let byte = self.buffer[(self.position / 8) as usize];
        let bit = (byte >> (self.position % 8)) & 1 != 0;
        self.position += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        self.ensure(8)?;
        if self.position % 8 == 0 {
            let byte = self.buffer[(self.position / 8) as usize];
            self.position += 8;
            return Ok(byte);
        }
        let mut output: u8 = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    /// Skips to the next byte boundary. Events end on a byte boundary, so this
    /// is how a reader realigns after the last field of an event.
    pub fn skip_padding(&mut self) -> Result<(), SerdeErr> {
        let remainder = self.position % 8;
        if remainder == 0 {
            return Ok(());
        }
        let pad = 8 - remainder;
        self.ensure(pad)?;
        self.position += pad;
        Ok(())
    }

    /// Copies the next `bit_count` bits out of the stream without interpreting
    /// them.
    pub fn extract_bits(&mut self, bit_count: u32) -> Result<OwnedBitReader, SerdeErr> {
        self.ensure(bit_count)?;
        let mut writer = BitWriter::new();
        for _ in 0..bit_count {
            writer.write_bit(self.read_bit()?);
        }
        Ok(OwnedBitReader::new(writer.to_bytes().into_boxed_slice(), bit_count))
    }

    fn ensure(&self, needed: u32) -> Result<(), SerdeErr> {
        let remaining = self.bits_remaining();
        if needed > remaining {
            return Err(SerdeErr::OutOfBits { needed, remaining });
        }
        Ok(())
    }
}

/// A detached run of bits, kept verbatim until someone is ready to read it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedBitReader {
    buffer: Box<[u8]>,
    bit_len: u32,
}

impl OwnedBitReader {
    pub fn new(buffer: Box<[u8]>, bit_len: u32) -> Self {
        Self { buffer, bit_len }
    }

    pub fn bit_len(&self) -> u32 {
        self.bit_len
    }

    pub fn borrow(&self) -> BitReader<'_> {
        BitReader::with_bit_len(&self.buffer, self.bit_len)
    }
}

impl From<Vec<u8>> for OwnedBitReader {
    fn from(bytes: Vec<u8>) -> Self {
        let bit_len = (bytes.len() as u32) * 8;
        Self::new(bytes.into_boxed_slice(), bit_len)
    }
}
