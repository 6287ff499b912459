//! Low-level source primitives: single bytes and fixed-width big-endian
//! integers, read from any `io::Read`. Short reads surface as I/O errors:
//! a length prefix that promises more bytes than the source holds never
//! produces a partial value.

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

pub trait ReadWire: Read {
    fn get_u8(&mut self) -> Result<u8> {
        self.read_u8().map_err(Error::io("read u8"))
    }

    fn get_u16(&mut self) -> Result<u16> {
        self.read_u16::<BigEndian>().map_err(Error::io("read u16"))
    }

    fn get_u32(&mut self) -> Result<u32> {
        self.read_u32::<BigEndian>().map_err(Error::io("read u32"))
    }

    fn get_u64(&mut self) -> Result<u64> {
        self.read_u64::<BigEndian>().map_err(Error::io("read u64"))
    }

    fn get_i8(&mut self) -> Result<i8> {
        self.read_i8().map_err(Error::io("read i8"))
    }

    fn get_i16(&mut self) -> Result<i16> {
        self.read_i16::<BigEndian>().map_err(Error::io("read i16"))
    }

    fn get_i32(&mut self) -> Result<i32> {
        self.read_i32::<BigEndian>().map_err(Error::io("read i32"))
    }

    fn get_i64(&mut self) -> Result<i64> {
        self.read_i64::<BigEndian>().map_err(Error::io("read i64"))
    }

    fn get_f32(&mut self) -> Result<f32> {
        self.read_f32::<BigEndian>().map_err(Error::io("read f32"))
    }

    fn get_f64(&mut self) -> Result<f64> {
        self.read_f64::<BigEndian>().map_err(Error::io("read f64"))
    }

    /// Reads exactly `len` bytes into a fresh buffer.
    fn get_exact(&mut self, len: usize, step: &'static str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf).map_err(Error::io(step))?;
        Ok(buf)
    }
}

impl<R: Read + ?Sized> ReadWire for R {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_round_trip() {
        let data = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut src = &data[..];
        assert_eq!(src.get_u16().unwrap(), 0x0102);
        assert_eq!(src.get_u32().unwrap(), 0x0304_0506);
    }

    #[test]
    fn short_read_is_io_error() {
        let data = [0x01u8];
        let mut src = &data[..];
        let err = src.get_u32().unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn get_exact_length() {
        let data = [1u8, 2, 3];
        let mut src = &data[..];
        assert_eq!(src.get_exact(2, "test").unwrap(), vec![1, 2]);
        assert!(src.get_exact(2, "test").is_err());
    }
}
