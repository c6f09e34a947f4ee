use byteorder::ByteOrder;

use crate::converter;
use crate::error::PodError;
use crate::Result;

/// Forward-only reader over a cleartext (already decoded) byte stream.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(byteorder::LittleEndian::read_u32(bytes))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Fail with [`PodError::UnexpectedEndOfData`] unless `len` bytes remain.
    pub fn ensure(&self, len: usize) -> Result<()> {
        if self.remaining() < len {
            return Err(PodError::UnexpectedEndOfData {
                needed: converter::usize_to_u64(len)?,
                remaining: converter::usize_to_u64(self.remaining())?,
            });
        }
        Ok(())
    }

    /// Consume everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();
        rest
    }
}
