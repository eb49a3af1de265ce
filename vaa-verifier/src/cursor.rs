use crate::error::VaaError;

/// Sequential big-endian reader over an untrusted buffer. Every read is bounds checked and a
/// short read fails with `MalformedMessage { reason: "truncated" }`.
#[derive(Debug, Clone)]
pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    /// Start reading at `pos`. Fails if `pos` is past the end of `data`.
    pub fn at(data: &'a [u8], pos: usize) -> Result<Self, VaaError> {
        if pos > data.len() {
            return Err(VaaError::truncated());
        }
        Ok(ByteCursor { data, pos })
    }

    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes from the current position to the end, without advancing.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Look at the next `len` bytes without advancing.
    pub fn peek_bytes(&self, len: usize) -> Result<&'a [u8], VaaError> {
        let end = self.pos.checked_add(len).ok_or_else(VaaError::truncated)?;
        self.data.get(self.pos..end).ok_or_else(VaaError::truncated)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], VaaError> {
        let bytes = self.peek_bytes(len)?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], VaaError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, VaaError> {
        self.read_array::<1>().map(|b| b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, VaaError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, VaaError> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, VaaError> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// Consume everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.remaining();
        self.pos = self.data.len();
        rest
    }
}
