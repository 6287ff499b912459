use std::cmp;
use std::fmt;
use std::time;

use serde::{Deserialize, Serialize};

use crate::ext::{ExtDecode, ExtEncode};
use crate::error::{Error, Result};
use crate::reader::ReadWire;
use crate::writer::WriteWire;

/// Extension type id assigned to [`Timestamp`] in the default registry.
pub const TIMESTAMP_EXT: i8 = 0;

const MAX_NANOSEC: u32 = 999_999_999;

/// An event timestamp, carried on the wire as extension type 0: four bytes of
/// big-endian seconds since the Unix epoch followed by four bytes of
/// big-endian nanoseconds, always an 8-byte payload.
///
/// The wire form bounds the representable range: seconds fit a `u32`, so
/// times before 1970 or after 2106 are rejected at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    sec: u32,
    nano: u32,
}

impl Timestamp {
    /// Create a timestamp from seconds + nanoseconds since the Unix epoch.
    /// Returns `None` when the seconds fall outside the encodable range or
    /// the nanoseconds exceed 999 999 999.
    pub fn from_utc(sec: i64, nano: u32) -> Option<Timestamp> {
        if !(0..=u32::MAX as i64).contains(&sec) || nano > MAX_NANOSEC {
            None
        } else {
            Some(Timestamp {
                sec: sec as u32,
                nano,
            })
        }
    }

    /// Create a timestamp from a whole number of seconds since the Unix epoch.
    pub fn from_sec(sec: i64) -> Option<Timestamp> {
        Timestamp::from_utc(sec, 0)
    }

    /// Minimum possible time that can be represented.
    pub fn min_value() -> Timestamp {
        Timestamp { sec: 0, nano: 0 }
    }

    /// Maximum possible time that can be represented.
    pub fn max_value() -> Timestamp {
        Timestamp {
            sec: u32::MAX,
            nano: MAX_NANOSEC,
        }
    }

    /// The UNIX timestamp (number of seconds since January 1, 1970 0:00:00 UTC).
    pub fn timestamp_utc(&self) -> i64 {
        self.sec as i64
    }

    /// The number of nanoseconds past the second count.
    pub fn timestamp_subsec_nanos(&self) -> u32 {
        self.nano
    }

    /// Create a Timestamp based on the current system time. Can fail if the
    /// system clock is outside the representable range.
    pub fn now() -> Option<Timestamp> {
        match time::SystemTime::now().duration_since(time::SystemTime::UNIX_EPOCH) {
            Ok(t) => Timestamp::from_utc(t.as_secs() as i64, t.subsec_nanos()),
            Err(_) => None,
        }
    }
}

impl cmp::Ord for Timestamp {
    fn cmp(&self, other: &Timestamp) -> cmp::Ordering {
        if self.sec == other.sec {
            self.nano.cmp(&other.nano)
        } else {
            self.sec.cmp(&other.sec)
        }
    }
}

impl cmp::PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Timestamp) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UTC: {} sec + {} ns", self.sec, self.nano)
    }
}

impl ExtEncode for Timestamp {
    fn encode_ext(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.put_u32(self.sec)?;
        buf.put_u32(self.nano)?;
        Ok(())
    }
}

impl ExtDecode for Timestamp {
    fn decode_ext(r: &mut dyn std::io::Read, len: usize) -> Result<Self> {
        if len != 8 {
            return Err(Error::Message(format!(
                "timestamp payload must be 8 bytes, got {}",
                len
            )));
        }
        let sec = r.get_u32()?;
        let nano = r.get_u32()?;
        if nano > MAX_NANOSEC {
            return Err(Error::Message(format!(
                "timestamp nanoseconds out of range ({})",
                nano
            )));
        }
        Ok(Timestamp { sec, nano })
    }
}

impl crate::encode::Encode for Timestamp {
    fn encode<W: std::io::Write>(&self, enc: &mut crate::encode::Encoder<W>) -> Result<()> {
        enc.encode_ext(self)
    }
}

impl crate::decode::Decode for Timestamp {
    fn decode<R: std::io::Read>(d: &mut crate::decode::Decoder<R>) -> Result<Self> {
        d.decode_ext()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{marshal, unmarshal};

    #[test]
    fn construction_bounds() {
        assert!(Timestamp::from_utc(0, 0).is_some());
        assert!(Timestamp::from_utc(u32::MAX as i64, MAX_NANOSEC).is_some());
        assert!(Timestamp::from_utc(-1, 0).is_none());
        assert!(Timestamp::from_utc(u32::MAX as i64 + 1, 0).is_none());
        assert!(Timestamp::from_utc(0, MAX_NANOSEC + 1).is_none());
    }

    #[test]
    fn wire_form_is_fixext8() {
        let t = Timestamp::from_utc(1234567890, 123).unwrap();
        let bytes = marshal(&t).unwrap();
        assert_eq!(
            bytes,
            vec![0xd7, 0x00, 0x49, 0x96, 0x02, 0xd2, 0x00, 0x00, 0x00, 0x7b]
        );
    }

    #[test]
    fn roundtrip() {
        for t in [
            Timestamp::min_value(),
            Timestamp::max_value(),
            Timestamp::from_utc(1234567890, 999_999_999).unwrap(),
        ] {
            let bytes = marshal(&t).unwrap();
            let back: Timestamp = unmarshal(&bytes).unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn short_payload_rejected() {
        let mut data = [0u8; 4];
        let err = Timestamp::decode_ext(&mut &data[..], 4).unwrap_err();
        assert!(matches!(err, Error::Message(_)));
        let err = Timestamp::decode_ext(&mut &data[..], 8).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn ordering() {
        let a = Timestamp::from_utc(10, 0).unwrap();
        let b = Timestamp::from_utc(10, 1).unwrap();
        let c = Timestamp::from_utc(11, 0).unwrap();
        assert!(a < b && b < c);
    }
}
