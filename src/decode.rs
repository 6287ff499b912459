//! Bytes → value. The [`Decoder`] reads a tag, selects a per-marker
//! strategy, and produces either a dynamic [`Value`] or materializes
//! directly into a caller-provided destination shape via the [`Decode`]
//! trait. Each call is a self-contained recursive descent guided by the tag
//! stream; the only state kept between calls is the byte cursor and a
//! one-byte lookahead.

use std::any;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ext::{ExtDecode, ExtRegistry};
use crate::integer::Integer;
use crate::marker::Marker;
use crate::reader::ReadWire;
use crate::value::{ByteBuf, Value};

/// Deserializes MessagePack data from the bound source.
///
/// A `Decoder` is bound to exactly one source and must not be shared across
/// threads; create one per concurrent caller (construction is O(1)).
pub struct Decoder<R> {
    r: R,
    peeked: Option<u8>,
    registry: Arc<ExtRegistry>,
}

impl<R: Read> Decoder<R> {
    /// A decoder over `r` with the default extension registry (the built-in
    /// timestamp type at id 0).
    pub fn new(r: R) -> Self {
        Decoder::with_registry(r, Arc::new(ExtRegistry::default()))
    }

    /// A decoder over `r` with an injected extension registry.
    pub fn with_registry(r: R, registry: Arc<ExtRegistry>) -> Self {
        Decoder {
            r,
            peeked: None,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<ExtRegistry> {
        &self.registry
    }

    pub fn into_inner(self) -> R {
        self.r
    }

    /// Look at the next marker without consuming it.
    pub fn peek_marker(&mut self) -> Result<Marker> {
        let b = match self.peeked {
            Some(b) => b,
            None => {
                let b = self.r.get_u8()?;
                self.peeked = Some(b);
                b
            }
        };
        Ok(Marker::from_u8(b))
    }

    /// Consume and return the next marker.
    pub fn read_marker(&mut self) -> Result<Marker> {
        let b = match self.peeked.take() {
            Some(b) => b,
            None => self.r.get_u8()?,
        };
        Ok(Marker::from_u8(b))
    }

    /// Decode into any supported destination shape. Equivalent to
    /// `T::decode(self)`.
    pub fn decode<T: Decode>(&mut self) -> Result<T> {
        T::decode(self)
    }

    pub fn decode_nil(&mut self) -> Result<()> {
        match self.read_marker()? {
            Marker::Null => Ok(()),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "Null",
                found: m.name(),
            }),
        }
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        match self.read_marker()? {
            Marker::True => Ok(true),
            Marker::False => Ok(false),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "Bool",
                found: m.name(),
            }),
        }
    }

    /// Read any integer-family form (fixnum or explicit width) into an
    /// [`Integer`]. Both forms of the same logical value decode equal.
    pub fn decode_integer(&mut self) -> Result<Integer> {
        match self.read_marker()? {
            Marker::PosFixInt(v) => Ok(v.into()),
            Marker::NegFixInt(v) => Ok(v.into()),
            Marker::UInt8 => Ok(self.r.get_u8()?.into()),
            Marker::UInt16 => Ok(self.r.get_u16()?.into()),
            Marker::UInt32 => Ok(self.r.get_u32()?.into()),
            Marker::UInt64 => Ok(self.r.get_u64()?.into()),
            Marker::Int8 => Ok(self.r.get_i8()?.into()),
            Marker::Int16 => Ok(self.r.get_i16()?.into()),
            Marker::Int32 => Ok(self.r.get_i32()?.into()),
            Marker::Int64 => Ok(self.r.get_i64()?.into()),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "integer",
                found: m.name(),
            }),
        }
    }

    pub fn decode_f32(&mut self) -> Result<f32> {
        match self.read_marker()? {
            Marker::F32 => self.r.get_f32(),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "F32",
                found: m.name(),
            }),
        }
    }

    /// Accepts either float width; an F32 payload widens losslessly.
    pub fn decode_f64(&mut self) -> Result<f64> {
        match self.read_marker()? {
            Marker::F64 => self.r.get_f64(),
            Marker::F32 => Ok(self.r.get_f32()? as f64),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "F64",
                found: m.name(),
            }),
        }
    }

    pub fn decode_str(&mut self) -> Result<String> {
        let len = match self.read_marker()? {
            Marker::FixStr(l) => l as usize,
            Marker::Str8 => self.r.get_u8()? as usize,
            Marker::Str16 => self.r.get_u16()? as usize,
            Marker::Str32 => self.r.get_u32()? as usize,
            Marker::Reserved => return Err(Error::ReservedMarker),
            m => {
                return Err(Error::TypeMismatch {
                    expected: "Str",
                    found: m.name(),
                })
            }
        };
        let buf = self.r.get_exact(len, "read string payload")?;
        String::from_utf8(buf).map_err(|e| Error::BadUtf8 {
            step: "decode string",
            source: e.utf8_error(),
        })
    }

    pub fn decode_bin(&mut self) -> Result<Vec<u8>> {
        let len = match self.read_marker()? {
            Marker::Bin8 => self.r.get_u8()? as usize,
            Marker::Bin16 => self.r.get_u16()? as usize,
            Marker::Bin32 => self.r.get_u32()? as usize,
            Marker::Reserved => return Err(Error::ReservedMarker),
            m => {
                return Err(Error::TypeMismatch {
                    expected: "Bin",
                    found: m.name(),
                })
            }
        };
        self.r.get_exact(len, "read byte sequence payload")
    }

    /// Read an array header and return the element count. The caller is
    /// responsible for decoding exactly that many elements afterwards.
    pub fn decode_array_len(&mut self) -> Result<usize> {
        match self.read_marker()? {
            Marker::FixArray(l) => Ok(l as usize),
            Marker::Array16 => Ok(self.r.get_u16()? as usize),
            Marker::Array32 => Ok(self.r.get_u32()? as usize),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "Array",
                found: m.name(),
            }),
        }
    }

    /// Read a map header and return the pair count. The caller is
    /// responsible for decoding exactly that many key/value pairs afterwards.
    pub fn decode_map_len(&mut self) -> Result<usize> {
        match self.read_marker()? {
            Marker::FixMap(l) => Ok(l as usize),
            Marker::Map16 => Ok(self.r.get_u16()? as usize),
            Marker::Map32 => Ok(self.r.get_u32()? as usize),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "Map",
                found: m.name(),
            }),
        }
    }

    fn ext_len(&mut self, m: Marker) -> Result<usize> {
        match m {
            Marker::FixExt1 => Ok(1),
            Marker::FixExt2 => Ok(2),
            Marker::FixExt4 => Ok(4),
            Marker::FixExt8 => Ok(8),
            Marker::FixExt16 => Ok(16),
            Marker::Ext8 => Ok(self.r.get_u8()? as usize),
            Marker::Ext16 => Ok(self.r.get_u16()? as usize),
            Marker::Ext32 => Ok(self.r.get_u32()? as usize),
            Marker::Reserved => Err(Error::ReservedMarker),
            m => Err(Error::TypeMismatch {
                expected: "Ext",
                found: m.name(),
            }),
        }
    }

    /// Read an extension header: payload length and type id.
    pub fn decode_ext_header(&mut self) -> Result<(usize, i8)> {
        let m = self.read_marker()?;
        let len = self.ext_len(m)?;
        let id = self.r.get_u8()? as i8;
        Ok((len, id))
    }

    /// Decode an extension value into its registered Rust type. The type's
    /// hook reads from a length-limited sub-reader; whatever it leaves
    /// unconsumed is drained so the stream cursor stays aligned.
    pub fn decode_ext<T: ExtDecode + 'static>(&mut self) -> Result<T> {
        let (len, id) = self.decode_ext_header()?;
        let expected = self.registry.id_of::<T>().ok_or(Error::UnregisteredType {
            type_name: any::type_name::<T>(),
        })?;
        if expected != id {
            return Err(Error::WrongExtType {
                expected,
                found: id,
            });
        }
        let mut sub = (&mut self.r).take(len as u64);
        let v = T::decode_ext(&mut sub, len)?;
        io::copy(&mut sub, &mut io::sink()).map_err(Error::io("drain extension payload"))?;
        Ok(v)
    }

    pub fn decode_timestamp(&mut self) -> Result<crate::timestamp::Timestamp> {
        self.decode_ext()
    }

    /// Decode into `T`, treating a wire Nil as "leave the destination at its
    /// default". This is the rule record fields follow.
    pub fn decode_or_default<T: Decode + Default>(&mut self) -> Result<T> {
        if let Marker::Null = self.peek_marker()? {
            let _ = self.read_marker()?;
            return Ok(T::default());
        }
        T::decode(self)
    }

    /// Decode the next element into a dynamic [`Value`].
    pub fn decode_value(&mut self) -> Result<Value> {
        let m = self.read_marker()?;
        match m {
            Marker::Null => Ok(Value::Null),
            Marker::True => Ok(Value::Bool(true)),
            Marker::False => Ok(Value::Bool(false)),
            Marker::Reserved => Err(Error::ReservedMarker),
            Marker::PosFixInt(v) => Ok(Value::Int(v.into())),
            Marker::NegFixInt(v) => Ok(Value::Int(v.into())),
            Marker::UInt8 => Ok(Value::Int(self.r.get_u8()?.into())),
            Marker::UInt16 => Ok(Value::Int(self.r.get_u16()?.into())),
            Marker::UInt32 => Ok(Value::Int(self.r.get_u32()?.into())),
            Marker::UInt64 => Ok(Value::Int(self.r.get_u64()?.into())),
            Marker::Int8 => Ok(Value::Int(self.r.get_i8()?.into())),
            Marker::Int16 => Ok(Value::Int(self.r.get_i16()?.into())),
            Marker::Int32 => Ok(Value::Int(self.r.get_i32()?.into())),
            Marker::Int64 => Ok(Value::Int(self.r.get_i64()?.into())),
            Marker::F32 => Ok(Value::F32(self.r.get_f32()?)),
            Marker::F64 => Ok(Value::F64(self.r.get_f64()?)),
            Marker::FixStr(l) => self.read_str_value(l as usize),
            Marker::Str8 => {
                let l = self.r.get_u8()? as usize;
                self.read_str_value(l)
            }
            Marker::Str16 => {
                let l = self.r.get_u16()? as usize;
                self.read_str_value(l)
            }
            Marker::Str32 => {
                let l = self.r.get_u32()? as usize;
                self.read_str_value(l)
            }
            Marker::Bin8 => {
                let l = self.r.get_u8()? as usize;
                self.read_bin_value(l)
            }
            Marker::Bin16 => {
                let l = self.r.get_u16()? as usize;
                self.read_bin_value(l)
            }
            Marker::Bin32 => {
                let l = self.r.get_u32()? as usize;
                self.read_bin_value(l)
            }
            Marker::FixArray(l) => self.read_array_value(l as usize),
            Marker::Array16 => {
                let l = self.r.get_u16()? as usize;
                self.read_array_value(l)
            }
            Marker::Array32 => {
                let l = self.r.get_u32()? as usize;
                self.read_array_value(l)
            }
            Marker::FixMap(l) => self.read_map_value(l as usize),
            Marker::Map16 => {
                let l = self.r.get_u16()? as usize;
                self.read_map_value(l)
            }
            Marker::Map32 => {
                let l = self.r.get_u32()? as usize;
                self.read_map_value(l)
            }
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let len = self.ext_len(m)?;
                let id = self.r.get_u8()? as i8;
                let hook = self
                    .registry
                    .decode_fn(id)
                    .ok_or(Error::UnknownExtType(id))?;
                let mut sub = (&mut self.r).take(len as u64);
                let v = hook(id, &mut sub, len)?;
                io::copy(&mut sub, &mut io::sink())
                    .map_err(Error::io("drain extension payload"))?;
                Ok(v)
            }
        }
    }

    fn read_str_value(&mut self, len: usize) -> Result<Value> {
        let buf = self.r.get_exact(len, "read string payload")?;
        let s = String::from_utf8(buf).map_err(|e| Error::BadUtf8 {
            step: "decode string",
            source: e.utf8_error(),
        })?;
        Ok(Value::Str(s))
    }

    fn read_bin_value(&mut self, len: usize) -> Result<Value> {
        Ok(Value::Bin(self.r.get_exact(len, "read byte sequence payload")?))
    }

    fn read_array_value(&mut self, len: usize) -> Result<Value> {
        // Trust the header only as far as a bounded pre-allocation; the
        // element loop finds truncation on its own.
        let mut items = Vec::with_capacity(len.min(4096));
        for i in 0..len {
            let item = self.decode_value().map_err(|e| Error::Element {
                index: i,
                source: Box::new(e),
            })?;
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn read_map_value(&mut self, len: usize) -> Result<Value> {
        let mut map = BTreeMap::new();
        for i in 0..len {
            let key = self.decode_str().map_err(|e| Error::Element {
                index: i,
                source: Box::new(e),
            })?;
            let val = self.decode_value().map_err(|e| Error::Field {
                key: key.clone(),
                source: Box::new(e),
            })?;
            map.insert(key, val);
        }
        Ok(Value::Map(map))
    }
}

/// A destination shape the decoder knows how to materialize. Implementing
/// this by hand makes a type fully responsible for consuming its own tag,
/// length prefix, and payload.
pub trait Decode: Sized {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self>;
}

macro_rules! impl_decode_int {
    ($t: ty) => {
        impl Decode for $t {
            fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
                let v = d.decode_integer()?;
                <$t>::try_from(v).map_err(|value| Error::IntOutOfRange {
                    value,
                    target: stringify!($t),
                })
            }
        }
    };
}

impl_decode_int!(u8);
impl_decode_int!(u16);
impl_decode_int!(u32);
impl_decode_int!(u64);
impl_decode_int!(i8);
impl_decode_int!(i16);
impl_decode_int!(i32);
impl_decode_int!(i64);

impl Decode for () {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_nil()
    }
}

impl Decode for bool {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_bool()
    }
}

impl Decode for Integer {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_integer()
    }
}

impl Decode for f32 {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_f32()
    }
}

impl Decode for f64 {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_f64()
    }
}

impl Decode for String {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_str()
    }
}

impl Decode for ByteBuf {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        Ok(ByteBuf(d.decode_bin()?))
    }
}

impl Decode for Value {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        d.decode_value()
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        if let Marker::Null = d.peek_marker()? {
            let _ = d.read_marker()?;
            return Ok(None);
        }
        Ok(Some(T::decode(d)?))
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        let len = d.decode_array_len()?;
        let mut out = Vec::with_capacity(len.min(4096));
        for i in 0..len {
            let item = T::decode(d).map_err(|e| Error::Element {
                index: i,
                source: Box::new(e),
            })?;
            out.push(item);
        }
        Ok(out)
    }
}

impl<T: Decode> Decode for BTreeMap<String, T> {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        let len = d.decode_map_len()?;
        let mut out = BTreeMap::new();
        for i in 0..len {
            let key = d.decode_str().map_err(|e| Error::Element {
                index: i,
                source: Box::new(e),
            })?;
            let val = T::decode(d).map_err(|e| Error::Field {
                key: key.clone(),
                source: Box::new(e),
            })?;
            out.insert(key, val);
        }
        Ok(out)
    }
}

impl<T: Decode> Decode for HashMap<String, T> {
    fn decode<R: Read>(d: &mut Decoder<R>) -> Result<Self> {
        let len = d.decode_map_len()?;
        let mut out = HashMap::with_capacity(len.min(4096));
        for i in 0..len {
            let key = d.decode_str().map_err(|e| Error::Element {
                index: i,
                source: Box::new(e),
            })?;
            let val = T::decode(d).map_err(|e| Error::Field {
                key: key.clone(),
                source: Box::new(e),
            })?;
            out.insert(key, val);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::ExtEncode;
    use crate::{marshal, unmarshal};
    use rand::Rng;

    fn roundtrip<T>(v: T)
    where
        T: crate::encode::Encode + Decode + PartialEq + std::fmt::Debug,
    {
        let bytes = marshal(&v).unwrap();
        let back: T = unmarshal(&bytes).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn scalar_boundaries_roundtrip() {
        roundtrip(0u8);
        roundtrip(127u8);
        roundtrip(u8::MAX);
        roundtrip(u16::MAX);
        roundtrip(u32::MAX);
        roundtrip(u64::MAX);
        roundtrip(-1i8);
        roundtrip(-32i8);
        roundtrip(i8::MIN);
        roundtrip(i16::MIN);
        roundtrip(i32::MIN);
        roundtrip(i64::MIN);
        roundtrip(i64::MAX);
        roundtrip(f32::MIN_POSITIVE);
        roundtrip(f32::MAX);
        roundtrip(f64::MIN_POSITIVE);
        roundtrip(f64::MAX);
        roundtrip(true);
        roundtrip(false);
        roundtrip(String::new());
        roundtrip(ByteBuf(vec![]));
        roundtrip(Vec::<u8>::new());
        roundtrip(BTreeMap::<String, u8>::new());
        roundtrip(());
    }

    #[test]
    fn length_class_boundaries_roundtrip() {
        for len in [15usize, 16, 31, 32, 255, 256, 65535, 65536] {
            let s = "x".repeat(len);
            let bytes = marshal(s.as_str()).unwrap();
            let back: String = unmarshal(&bytes).unwrap();
            assert_eq!(back.len(), len);

            let b = ByteBuf(vec![7u8; len]);
            let back: ByteBuf = unmarshal(&marshal(&b).unwrap()).unwrap();
            assert_eq!(back.len(), len);

            let arr = vec![1u8; len];
            let back: Vec<u8> = unmarshal(&marshal(&arr).unwrap()).unwrap();
            assert_eq!(back.len(), len);
        }
    }

    #[test]
    fn fixnum_and_explicit_forms_decode_equal() {
        let five_fix: u8 = unmarshal(&[0x05]).unwrap();
        let five_wide: u8 = unmarshal(&[0xcc, 0x05]).unwrap();
        assert_eq!(five_fix, five_wide);

        let neg_fix: i64 = unmarshal(&[0xff]).unwrap();
        let neg_wide: i64 =
            unmarshal(&[0xd3, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(neg_fix, -1);
        assert_eq!(neg_fix, neg_wide);

        let v1: Value = unmarshal(&[0x05]).unwrap();
        let v2: Value = unmarshal(&[0xcd, 0x00, 0x05]).unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn integer_coercion_checks_range() {
        // 256 encoded as UInt16, decoded into wider and narrower widths.
        let wire = [0xcd, 0x01, 0x00];
        let wide: u64 = unmarshal(&wire).unwrap();
        assert_eq!(wide, 256);
        let signed: i16 = unmarshal(&wire).unwrap();
        assert_eq!(signed, 256);
        let narrow: Result<u8> = unmarshal(&wire);
        assert!(matches!(
            narrow.unwrap_err(),
            Error::IntOutOfRange { target: "u8", .. }
        ));

        let negative: Result<u32> = unmarshal(&[0xff]);
        assert!(matches!(
            negative.unwrap_err(),
            Error::IntOutOfRange { target: "u32", .. }
        ));
    }

    #[test]
    fn float_widths() {
        let bytes = marshal(&1.25f32).unwrap();
        let wide: f64 = unmarshal(&bytes).unwrap();
        assert_eq!(wide, 1.25);

        let narrow: Result<f32> = unmarshal(&marshal(&1.25f64).unwrap());
        assert!(matches!(
            narrow.unwrap_err(),
            Error::TypeMismatch { expected: "F32", .. }
        ));
    }

    #[test]
    fn truncated_input_is_io_error() {
        // FixStr(5) with only two payload bytes.
        let err = unmarshal::<String>(&[0xa5, b'h', b'i']).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));

        // UInt16 with a one-byte payload.
        let err = unmarshal::<u16>(&[0xcd, 0x01]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));

        // Array of two with one element present.
        let err = unmarshal::<Vec<u8>>(&[0x92, 0x01]).unwrap_err();
        match err {
            Error::Element { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::Io { .. }));
            }
            other => panic!("unexpected error: {}", other),
        }

        // Bin16 header claiming more bytes than are present.
        let err = unmarshal::<ByteBuf>(&[0xc5, 0x01, 0x00, 0xaa]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn reserved_marker_rejected() {
        let err = unmarshal::<Value>(&[0xc1]).unwrap_err();
        assert!(matches!(err, Error::ReservedMarker));
    }

    #[test]
    fn non_string_map_key_rejected() {
        // FixMap(1) with an integer key.
        let err = unmarshal::<Value>(&[0x81, 0x01, 0x02]).unwrap_err();
        match err {
            Error::Element { index: 0, source } => {
                assert!(matches!(*source, Error::TypeMismatch { expected: "Str", .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn unknown_ext_id_rejected() {
        // FixExt1, type id 99, one payload byte.
        let err = unmarshal::<Value>(&[0xd4, 0x63, 0x00]).unwrap_err();
        assert!(matches!(err, Error::UnknownExtType(99)));
    }

    #[test]
    fn dynamic_value_roundtrip() {
        let mut map = BTreeMap::new();
        map.insert("label".to_string(), Value::from("node-1"));
        map.insert("weight".to_string(), Value::from(12u8));
        map.insert("ratio".to_string(), Value::F64(0.25));
        map.insert("blob".to_string(), Value::Bin(vec![1, 2, 3]));
        map.insert(
            "children".to_string(),
            Value::Array(vec![Value::from(-4i8), Value::Null]),
        );
        let v = Value::Map(map);
        let bytes = marshal(&v).unwrap();
        let back: Value = unmarshal(&bytes).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn typed_sequence_from_mixed_widths() {
        // [255 (UInt8), -100 (Int8), 1 (fixnum)] into Vec<i64>.
        let wire = [0x93, 0xcc, 0xff, 0xd0, 0x9c, 0x01];
        let out: Vec<i64> = unmarshal(&wire).unwrap();
        assert_eq!(out, vec![255, -100, 1]);
    }

    #[test]
    fn option_destination() {
        let none: Option<u8> = unmarshal(&[0xc0]).unwrap();
        assert_eq!(none, None);
        let some: Option<u8> = unmarshal(&[0x05]).unwrap();
        assert_eq!(some, Some(5));
        let nested: Vec<Option<u8>> = unmarshal(&[0x92, 0xc0, 0x07]).unwrap();
        assert_eq!(nested, vec![None, Some(7)]);
    }

    #[derive(Debug, PartialEq)]
    struct Rgb(u8, u8, u8);

    impl ExtEncode for Rgb {
        fn encode_ext(&self, buf: &mut Vec<u8>) -> Result<()> {
            buf.extend_from_slice(&[self.0, self.1, self.2]);
            Ok(())
        }
    }

    impl ExtDecode for Rgb {
        fn decode_ext(r: &mut dyn Read, len: usize) -> Result<Self> {
            if len != 3 {
                return Err(Error::Message(format!("bad rgb payload length {}", len)));
            }
            let b = r.get_exact(3, "read rgb payload")?;
            Ok(Rgb(b[0], b[1], b[2]))
        }
    }

    impl From<Rgb> for Value {
        fn from(v: Rgb) -> Value {
            Value::Ext(2, vec![v.0, v.1, v.2])
        }
    }

    #[test]
    fn registered_ext_roundtrip() {
        let registry = Arc::new(ExtRegistry::default());
        registry.register::<Rgb>(2);

        let mut buf = Vec::new();
        let mut enc = crate::encode::Encoder::with_registry(&mut buf, registry.clone());
        enc.encode_ext(&Rgb(9, 8, 7)).unwrap();
        assert_eq!(buf, vec![0xc7, 0x03, 0x02, 9, 8, 7]);

        let mut dec = Decoder::with_registry(&buf[..], registry.clone());
        let back: Rgb = dec.decode_ext().unwrap();
        assert_eq!(back, Rgb(9, 8, 7));

        // Dynamic decode goes through the registered hook.
        let mut dec = Decoder::with_registry(&buf[..], registry);
        let v = dec.decode_value().unwrap();
        assert_eq!(v, Value::Ext(2, vec![9, 8, 7]));
    }

    #[test]
    fn wrong_ext_id_for_destination() {
        let registry = Arc::new(ExtRegistry::default());
        registry.register::<Rgb>(2);
        // Timestamp wire bytes decoded as Rgb.
        let wire = [0xd7, 0x00, 0, 0, 0, 1, 0, 0, 0, 0];
        let mut dec = Decoder::with_registry(&wire[..], registry);
        let err = dec.decode_ext::<Rgb>().unwrap_err();
        assert!(matches!(err, Error::WrongExtType { expected: 2, found: 0 }));
    }

    struct LazyByte(u8);

    impl ExtDecode for LazyByte {
        fn decode_ext(r: &mut dyn Read, _len: usize) -> Result<Self> {
            // Deliberately reads one byte of a longer payload.
            Ok(LazyByte(r.get_u8()?))
        }
    }

    impl From<LazyByte> for Value {
        fn from(v: LazyByte) -> Value {
            Value::Ext(9, vec![v.0])
        }
    }

    #[test]
    fn unconsumed_ext_payload_is_drained() {
        let registry = Arc::new(ExtRegistry::new());
        registry.register::<LazyByte>(9);
        // Ext8 len=4 id=9 payload [1,2,3,4], then a trailing bool.
        let wire = [0xc7, 0x04, 0x09, 1, 2, 3, 4, 0xc3];
        let mut dec = Decoder::with_registry(&wire[..], registry);
        let v: LazyByte = dec.decode_ext().unwrap();
        assert_eq!(v.0, 1);
        assert!(dec.decode_bool().unwrap());
    }

    #[test]
    fn randomized_integer_roundtrip() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let v: u64 = rng.gen();
            roundtrip(v);
            let v: i64 = rng.gen();
            roundtrip(v);
            roundtrip(Value::from(rng.gen::<i64>()));
        }
    }
}
