//! Little-endian field codec shared by the record types.

/// Errors that can occur while encoding or decoding a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Output buffer too small for the record
    BufferTooSmall,
    /// Input shorter than the fixed record length
    Truncated,
}

/// Sequential field writer over a caller-provided buffer
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8], len: usize) -> Result<Self, WireError> {
        if buf.len() < len {
            return Err(WireError::BufferTooSmall);
        }
        Ok(Self { buf, pos: 0 })
    }

    pub(crate) fn bytes(&mut self, data: &[u8]) {
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
    }

    pub(crate) fn u16(&mut self, value: u16) {
        self.bytes(&value.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, value: u32) {
        self.bytes(&value.to_le_bytes());
    }

    pub(crate) fn finish(self) -> usize {
        self.pos
    }
}

/// Sequential field reader over a received packet
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8], len: usize) -> Result<Self, WireError> {
        if buf.len() < len {
            return Err(WireError::Truncated);
        }
        Ok(Self { buf, pos: 0 })
    }

    pub(crate) fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub(crate) fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.array())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }
}
