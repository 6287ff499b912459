//! Value → bytes. The [`Encoder`] owns the sink and writes tag + length
//! prefix + payload for every shape; the [`Encode`] trait is the per-shape
//! dispatch. A hand-written `Encode` impl is the "self-describing codec"
//! path and is fully responsible for its own wire form.

use std::any;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ext::{ExtEncode, ExtRegistry};
use crate::integer::{get_int_internal, IntPriv, Integer};
use crate::marker::Marker;
use crate::value::{ByteBuf, Value};
use crate::writer::WriteWire;

/// Serializes values into MessagePack form, writing directly to the bound
/// sink.
///
/// An `Encoder` is bound to exactly one sink and must not be shared across
/// threads; create one per concurrent caller (construction is O(1)).
pub struct Encoder<W> {
    w: W,
    registry: Arc<ExtRegistry>,
}

impl<W: Write> Encoder<W> {
    /// An encoder over `w` with the default extension registry (the built-in
    /// timestamp type at id 0).
    pub fn new(w: W) -> Self {
        Encoder::with_registry(w, Arc::new(ExtRegistry::default()))
    }

    /// An encoder over `w` with an injected extension registry.
    pub fn with_registry(w: W, registry: Arc<ExtRegistry>) -> Self {
        Encoder { w, registry }
    }

    pub fn registry(&self) -> &Arc<ExtRegistry> {
        &self.registry
    }

    /// Direct access to the underlying sink, for codec impls that need to
    /// write payload bytes themselves.
    pub fn writer(&mut self) -> &mut W {
        &mut self.w
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    /// Encode any supported value. Equivalent to `v.encode(self)`.
    pub fn encode<T: Encode + ?Sized>(&mut self, v: &T) -> Result<()> {
        v.encode(self)
    }

    pub fn encode_nil(&mut self) -> Result<()> {
        self.w.put_marker(Marker::Null)
    }

    pub fn encode_bool(&mut self, v: bool) -> Result<()> {
        self.w.put_marker(if v { Marker::True } else { Marker::False })
    }

    pub fn encode_u8(&mut self, v: u8) -> Result<()> {
        if v <= 127 {
            self.w.put_marker(Marker::PosFixInt(v))
        } else {
            self.w.put_marker(Marker::UInt8)?;
            self.w.put_u8(v)
        }
    }

    pub fn encode_u16(&mut self, v: u16) -> Result<()> {
        if v <= 127 {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else {
            self.w.put_marker(Marker::UInt16)?;
            self.w.put_u16(v)
        }
    }

    pub fn encode_u32(&mut self, v: u32) -> Result<()> {
        if v <= 127 {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else {
            self.w.put_marker(Marker::UInt32)?;
            self.w.put_u32(v)
        }
    }

    pub fn encode_u64(&mut self, v: u64) -> Result<()> {
        if v <= 127 {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else {
            self.w.put_marker(Marker::UInt64)?;
            self.w.put_u64(v)
        }
    }

    pub fn encode_i8(&mut self, v: i8) -> Result<()> {
        if v >= 0 {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else if v >= -32 {
            self.w.put_marker(Marker::NegFixInt(v))
        } else {
            self.w.put_marker(Marker::Int8)?;
            self.w.put_u8(v as u8)
        }
    }

    pub fn encode_i16(&mut self, v: i16) -> Result<()> {
        if (0..=127).contains(&v) {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else if (-32..0).contains(&v) {
            self.w.put_marker(Marker::NegFixInt(v as i8))
        } else {
            self.w.put_marker(Marker::Int16)?;
            self.w.put_u16(v as u16)
        }
    }

    pub fn encode_i32(&mut self, v: i32) -> Result<()> {
        if (0..=127).contains(&v) {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else if (-32..0).contains(&v) {
            self.w.put_marker(Marker::NegFixInt(v as i8))
        } else {
            self.w.put_marker(Marker::Int32)?;
            self.w.put_u32(v as u32)
        }
    }

    pub fn encode_i64(&mut self, v: i64) -> Result<()> {
        if (0..=127).contains(&v) {
            self.w.put_marker(Marker::PosFixInt(v as u8))
        } else if (-32..0).contains(&v) {
            self.w.put_marker(Marker::NegFixInt(v as i8))
        } else {
            self.w.put_marker(Marker::Int64)?;
            self.w.put_u64(v as u64)
        }
    }

    /// Encode an [`Integer`] in the fewest bytes that hold its value. Used
    /// for dynamic values, which carry no declared width; the typed
    /// `encode_u*`/`encode_i*` methods keep their declared width instead.
    pub fn encode_integer(&mut self, v: Integer) -> Result<()> {
        match get_int_internal(&v) {
            IntPriv::PosInt(v) => {
                if v <= 127 {
                    self.w.put_marker(Marker::PosFixInt(v as u8))
                } else if v <= u8::MAX as u64 {
                    self.w.put_marker(Marker::UInt8)?;
                    self.w.put_u8(v as u8)
                } else if v <= u16::MAX as u64 {
                    self.w.put_marker(Marker::UInt16)?;
                    self.w.put_u16(v as u16)
                } else if v <= u32::MAX as u64 {
                    self.w.put_marker(Marker::UInt32)?;
                    self.w.put_u32(v as u32)
                } else {
                    self.w.put_marker(Marker::UInt64)?;
                    self.w.put_u64(v)
                }
            }
            IntPriv::NegInt(v) => {
                if v >= -32 {
                    self.w.put_marker(Marker::NegFixInt(v as i8))
                } else if v >= i8::MIN as i64 {
                    self.w.put_marker(Marker::Int8)?;
                    self.w.put_u8(v as u8)
                } else if v >= i16::MIN as i64 {
                    self.w.put_marker(Marker::Int16)?;
                    self.w.put_u16(v as u16)
                } else if v >= i32::MIN as i64 {
                    self.w.put_marker(Marker::Int32)?;
                    self.w.put_u32(v as u32)
                } else {
                    self.w.put_marker(Marker::Int64)?;
                    self.w.put_u64(v as u64)
                }
            }
        }
    }

    pub fn encode_f32(&mut self, v: f32) -> Result<()> {
        self.w.put_marker(Marker::F32)?;
        self.w.put_u32(v.to_bits())
    }

    pub fn encode_f64(&mut self, v: f64) -> Result<()> {
        self.w.put_marker(Marker::F64)?;
        self.w.put_u64(v.to_bits())
    }

    pub fn encode_str(&mut self, v: &str) -> Result<()> {
        let len = v.len();
        if len < 32 {
            self.w.put_marker(Marker::FixStr(len as u8))?;
        } else if len <= u8::MAX as usize {
            self.w.put_marker(Marker::Str8)?;
            self.w.put_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.w.put_marker(Marker::Str16)?;
            self.w.put_u16(len as u16)?;
        } else if len <= u32::MAX as usize {
            self.w.put_marker(Marker::Str32)?;
            self.w.put_u32(len as u32)?;
        } else {
            return Err(Error::LengthTooLong {
                what: "string",
                len,
            });
        }
        self.w.put_slice(v.as_bytes(), "write string payload")
    }

    pub fn encode_bin(&mut self, v: &[u8]) -> Result<()> {
        let len = v.len();
        if len <= u8::MAX as usize {
            self.w.put_marker(Marker::Bin8)?;
            self.w.put_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.w.put_marker(Marker::Bin16)?;
            self.w.put_u16(len as u16)?;
        } else if len <= u32::MAX as usize {
            self.w.put_marker(Marker::Bin32)?;
            self.w.put_u32(len as u32)?;
        } else {
            return Err(Error::LengthTooLong {
                what: "byte sequence",
                len,
            });
        }
        self.w.put_slice(v, "write byte sequence payload")
    }

    /// Write an array header for `len` elements. The caller is responsible
    /// for encoding exactly that many elements afterwards.
    pub fn encode_array_header(&mut self, len: usize) -> Result<()> {
        if len < 16 {
            self.w.put_marker(Marker::FixArray(len as u8))
        } else if len <= u16::MAX as usize {
            self.w.put_marker(Marker::Array16)?;
            self.w.put_u16(len as u16)
        } else if len <= u32::MAX as usize {
            self.w.put_marker(Marker::Array32)?;
            self.w.put_u32(len as u32)
        } else {
            Err(Error::LengthTooLong { what: "array", len })
        }
    }

    /// Write a map header for `len` key/value pairs. The caller is
    /// responsible for encoding exactly that many pairs afterwards.
    pub fn encode_map_header(&mut self, len: usize) -> Result<()> {
        if len < 16 {
            self.w.put_marker(Marker::FixMap(len as u8))
        } else if len <= u16::MAX as usize {
            self.w.put_marker(Marker::Map16)?;
            self.w.put_u16(len as u16)
        } else if len <= u32::MAX as usize {
            self.w.put_marker(Marker::Map32)?;
            self.w.put_u32(len as u32)
        } else {
            Err(Error::LengthTooLong { what: "map", len })
        }
    }

    /// Write an extension header: the exact-length short forms for payloads
    /// of 1, 2, 4, 8, or 16 bytes, otherwise Ext8/16/32 with an explicit
    /// length, followed by the type id byte.
    pub fn encode_ext_header(&mut self, len: usize, id: i8) -> Result<()> {
        match len {
            1 => self.w.put_marker(Marker::FixExt1)?,
            2 => self.w.put_marker(Marker::FixExt2)?,
            4 => self.w.put_marker(Marker::FixExt4)?,
            8 => self.w.put_marker(Marker::FixExt8)?,
            16 => self.w.put_marker(Marker::FixExt16)?,
            _ if len <= u8::MAX as usize => {
                self.w.put_marker(Marker::Ext8)?;
                self.w.put_u8(len as u8)?;
            }
            _ if len <= u16::MAX as usize => {
                self.w.put_marker(Marker::Ext16)?;
                self.w.put_u16(len as u16)?;
            }
            _ if len <= u32::MAX as usize => {
                self.w.put_marker(Marker::Ext32)?;
                self.w.put_u32(len as u32)?;
            }
            _ => {
                return Err(Error::LengthTooLong {
                    what: "extension payload",
                    len,
                })
            }
        }
        self.w.put_u8(id as u8)
    }

    /// Encode a value of an extension-registered type. The payload is built
    /// in a scratch buffer first, so the header can be chosen by its exact
    /// length. Fails with a registry error if `T` has no id registered.
    pub fn encode_ext<T: ExtEncode + 'static>(&mut self, v: &T) -> Result<()> {
        let id = self
            .registry
            .id_of::<T>()
            .ok_or(Error::UnregisteredType {
                type_name: any::type_name::<T>(),
            })?;
        let mut payload = Vec::new();
        v.encode_ext(&mut payload)?;
        self.encode_ext_header(payload.len(), id)?;
        self.w.put_slice(&payload, "write extension payload")
    }

    /// Encode a dynamic value, dispatching on its runtime shape.
    pub fn encode_value(&mut self, v: &Value) -> Result<()> {
        match *v {
            Value::Null => self.encode_nil(),
            Value::Bool(b) => self.encode_bool(b),
            Value::Int(i) => self.encode_integer(i),
            Value::F32(f) => self.encode_f32(f),
            Value::F64(f) => self.encode_f64(f),
            Value::Str(ref s) => self.encode_str(s),
            Value::Bin(ref b) => self.encode_bin(b),
            Value::Array(ref items) => {
                self.encode_array_header(items.len())?;
                for (i, item) in items.iter().enumerate() {
                    self.encode_value(item).map_err(|e| Error::Element {
                        index: i,
                        source: Box::new(e),
                    })?;
                }
                Ok(())
            }
            Value::Map(ref entries) => {
                self.encode_map_header(entries.len())?;
                for (key, val) in entries {
                    self.encode_str(key)?;
                    self.encode_value(val).map_err(|e| Error::Field {
                        key: key.clone(),
                        source: Box::new(e),
                    })?;
                }
                Ok(())
            }
            Value::Timestamp(ref t) => self.encode_ext(t),
            Value::Ext(id, ref data) => {
                self.encode_ext_header(data.len(), id)?;
                self.w.put_slice(data, "write extension payload")
            }
        }
    }
}

/// A shape the encoder knows how to serialize. Implementing this by hand
/// makes a type fully responsible for its own tag, length prefix, and
/// payload.
pub trait Encode {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()>;
}

macro_rules! impl_encode_scalar {
    ($t: ty, $method: ident) => {
        impl Encode for $t {
            fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
                enc.$method(*self)
            }
        }
    };
}

impl_encode_scalar!(bool, encode_bool);
impl_encode_scalar!(u8, encode_u8);
impl_encode_scalar!(u16, encode_u16);
impl_encode_scalar!(u32, encode_u32);
impl_encode_scalar!(u64, encode_u64);
impl_encode_scalar!(i8, encode_i8);
impl_encode_scalar!(i16, encode_i16);
impl_encode_scalar!(i32, encode_i32);
impl_encode_scalar!(i64, encode_i64);
impl_encode_scalar!(f32, encode_f32);
impl_encode_scalar!(f64, encode_f64);
impl_encode_scalar!(Integer, encode_integer);

impl Encode for () {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_nil()
    }
}

impl Encode for str {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_str(self)
    }
}

impl Encode for String {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_str(self)
    }
}

impl Encode for ByteBuf {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_bin(&self.0)
    }
}

impl Encode for Value {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_value(self)
    }
}

impl<'a, T: Encode + ?Sized> Encode for &'a T {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        (**self).encode(enc)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        match self {
            None => enc.encode_nil(),
            Some(v) => v.encode(enc),
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_array_header(self.len())?;
        for (i, item) in self.iter().enumerate() {
            item.encode(enc).map_err(|e| Error::Element {
                index: i,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        self.as_slice().encode(enc)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        self.as_slice().encode(enc)
    }
}

impl<T: Encode> Encode for BTreeMap<String, T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_map_header(self.len())?;
        for (key, val) in self {
            enc.encode_str(key)?;
            val.encode(enc).map_err(|e| Error::Field {
                key: key.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for HashMap<String, T> {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<()> {
        enc.encode_map_header(self.len())?;
        for (key, val) in self {
            enc.encode_str(key)?;
            val.encode(enc).map_err(|e| Error::Field {
                key: key.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}
