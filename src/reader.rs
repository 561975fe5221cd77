use std::io::{ErrorKind, Read};

use crate::error::{Error, Result};
use crate::mutf8;

/// Big-endian reader over a class-file byte stream.
pub(crate) struct ClassReader<R> {
    inner: R,
    position: usize,
}

impl<R: Read> ClassReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn read_u1(&mut self) -> Result<u8> {
        Ok(u8::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u2(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u4(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i4(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_f4(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u4()?))
    }

    /// Read a 64-bit constant stored as a high word followed by a low word.
    pub(crate) fn read_i8(&mut self) -> Result<i64> {
        let high = u64::from(self.read_u4()?);
        let low = u64::from(self.read_u4()?);
        Ok(((high << 32) | low) as i64)
    }

    pub(crate) fn read_f8(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_i8()? as u64))
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0; len];
        self.fill(&mut buffer)?;
        Ok(buffer)
    }

    /// Read `len` bytes of modified UTF-8 and decode them.
    pub(crate) fn read_modified_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        mutf8::decode(&bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buffer = [0; N];
        self.fill(&mut buffer)?;
        Ok(buffer)
    }

    fn fill(&mut self, buffer: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buffer) {
            Ok(()) => {
                self.position += buffer.len();
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(Error::malformed(format!(
                "unexpected end of class file at byte {} (needed {} more)",
                self.position,
                buffer.len()
            ))),
            Err(err) => Err(Error::Io(err)),
        }
    }
}
