//! Low-level sink primitives: single bytes and fixed-width big-endian
//! integers, written straight to any `io::Write`. Everything the encoder
//! emits goes through these.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::marker::Marker;

pub trait WriteWire: Write {
    fn put_marker(&mut self, m: Marker) -> Result<()> {
        self.write_u8(m.into_u8()).map_err(Error::io("write marker"))
    }

    fn put_u8(&mut self, v: u8) -> Result<()> {
        self.write_u8(v).map_err(Error::io("write u8"))
    }

    fn put_u16(&mut self, v: u16) -> Result<()> {
        self.write_u16::<BigEndian>(v).map_err(Error::io("write u16"))
    }

    fn put_u32(&mut self, v: u32) -> Result<()> {
        self.write_u32::<BigEndian>(v).map_err(Error::io("write u32"))
    }

    fn put_u64(&mut self, v: u64) -> Result<()> {
        self.write_u64::<BigEndian>(v).map_err(Error::io("write u64"))
    }

    fn put_slice(&mut self, buf: &[u8], step: &'static str) -> Result<()> {
        self.write_all(buf).map_err(Error::io(step))
    }
}

impl<W: Write + ?Sized> WriteWire for W {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_layout() {
        let mut buf = Vec::new();
        buf.put_u16(0x0102).unwrap();
        buf.put_u32(0x0304_0506).unwrap();
        buf.put_u64(0x0708_090a_0b0c_0d0e).unwrap();
        assert_eq!(
            buf,
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e]
        );
    }

    #[test]
    fn marker_byte() {
        let mut buf = Vec::new();
        buf.put_marker(Marker::Null).unwrap();
        buf.put_marker(Marker::FixStr(2)).unwrap();
        assert_eq!(buf, vec![0xc0, 0xa2]);
    }
}
