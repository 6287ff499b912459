//! wirepack is a MessagePack serialization engine: a self-describing,
//! length-prefixed binary encoding for nested scalar, sequence, and
//! string-keyed map data, plus a user-extensible extension-type mechanism
//! for application-defined payloads.
//!
//! The engine is built around four pieces:
//!
//! - [`Encoder`] / [`Encode`]: value → bytes. Each supported shape has a
//!   deterministic, most-compact-in-class wire form; hand-written `Encode`
//!   impls take full responsibility for their own tag, length, and payload.
//! - [`Decoder`] / [`Decode`]: bytes → value. Decoding either produces a
//!   dynamically-typed [`Value`] or materializes directly into a
//!   caller-supplied destination shape, range-checking integers and
//!   tolerating any integer wire width that fits.
//! - [`ExtRegistry`]: a bidirectional mapping between small integer type ids
//!   and Rust types, injected into encoders and decoders. The built-in
//!   [`Timestamp`] rides on extension id 0.
//! - [`record!`]: declares a struct together with its wire field mapping
//!   (name overrides, omit-if-default, skip), carried as a string-keyed map
//!   with forward-compatible handling of unknown keys.
//!
//! One-shot use goes through [`marshal`] and [`unmarshal`]:
//!
//! ```
//! let bytes = wirepack::marshal("hi").unwrap();
//! assert_eq!(bytes, vec![0xa2, b'h', b'i']);
//! let back: String = wirepack::unmarshal(&bytes).unwrap();
//! assert_eq!(back, "hi");
//! ```
//!
//! Streaming callers bind an [`Encoder`] to any `io::Write` and a
//! [`Decoder`] to any `io::Read`; both are cheap to construct and are
//! single-threaded by contract (`&mut self` everywhere), so concurrent
//! callers each create their own.

mod builder;
mod coerce;
mod decode;
mod encode;
mod error;
mod ext;
mod integer;
mod marker;
mod reader;
mod record;
mod timestamp;
mod value;
mod writer;

use std::sync::Arc;

pub use self::builder::{ArrayBuilder, MapBuilder};
pub use self::coerce::FromValue;
pub use self::decode::{Decode, Decoder};
pub use self::encode::{Encode, Encoder};
pub use self::error::{Error, Result};
pub use self::ext::{ExtDecode, ExtDecodeFn, ExtEncode, ExtRegistry};
pub use self::integer::Integer;
pub use self::marker::Marker;
pub use self::reader::ReadWire;
pub use self::timestamp::{Timestamp, TIMESTAMP_EXT};
pub use self::value::{ByteBuf, Value};
pub use self::writer::WriteWire;

/// One-shot encode to an in-memory buffer, using the default extension
/// registry.
pub fn marshal<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    value.encode(&mut enc)?;
    Ok(buf)
}

/// One-shot encode with an injected extension registry.
pub fn marshal_with<T: Encode + ?Sized>(value: &T, registry: Arc<ExtRegistry>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut enc = Encoder::with_registry(&mut buf, registry);
    value.encode(&mut enc)?;
    Ok(buf)
}

/// One-shot decode from an in-memory buffer, using the default extension
/// registry. Trailing bytes after the first complete value are ignored.
pub fn unmarshal<T: Decode>(data: &[u8]) -> Result<T> {
    let mut dec = Decoder::new(data);
    T::decode(&mut dec)
}

/// One-shot decode with an injected extension registry.
pub fn unmarshal_with<T: Decode>(data: &[u8], registry: Arc<ExtRegistry>) -> Result<T> {
    let mut dec = Decoder::with_registry(data, registry);
    T::decode(&mut dec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn streaming_multiple_values() {
        let mut buf = Vec::new();
        {
            let mut enc = Encoder::new(&mut buf);
            enc.encode("first").unwrap();
            enc.encode(&7u8).unwrap();
            enc.encode(&vec![1i64, 2]).unwrap();
        }

        let mut dec = Decoder::new(Cursor::new(buf));
        let a: String = dec.decode().unwrap();
        let b: u8 = dec.decode().unwrap();
        let c: Vec<i64> = dec.decode().unwrap();
        assert_eq!(a, "first");
        assert_eq!(b, 7);
        assert_eq!(c, vec![1, 2]);
    }

    #[test]
    fn registry_injection_is_shared() {
        let registry = Arc::new(ExtRegistry::default());
        let t = Timestamp::from_sec(100).unwrap();
        let bytes = marshal_with(&t, Arc::clone(&registry)).unwrap();
        let back: Timestamp = unmarshal_with(&bytes, registry).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn timestamp_needs_a_registry_entry() {
        let empty = Arc::new(ExtRegistry::new());
        let t = Timestamp::from_sec(100).unwrap();
        let err = marshal_with(&t, empty).unwrap_err();
        assert!(matches!(err, Error::UnregisteredType { .. }));
    }

    #[test]
    fn trailing_bytes_are_left_in_the_stream() {
        let v: u8 = unmarshal(&[0x07, 0xde, 0xad]).unwrap();
        assert_eq!(v, 7);
    }
}
