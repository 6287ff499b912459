//! The extension-type registry: a bidirectional mapping between small integer
//! type ids and the Rust types that encode/decode those payloads.
//!
//! The registry is an explicit object injected into `Encoder`/`Decoder`
//! construction rather than hidden process-global state. It is the one piece
//! of shared mutable state in the engine: reads (every encode/decode of an
//! extension value) take the shared lock, writes (registration, expected
//! during startup) take the exclusive lock.

use std::any::TypeId;
use std::collections::HashMap;
use std::io::Read;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::reader::ReadWire;
use crate::timestamp::{Timestamp, TIMESTAMP_EXT};
use crate::value::Value;

/// Implemented by types that carry their own extension payload encoding.
/// `encode_ext` writes the raw payload bytes only; the engine wraps them in
/// the appropriate extension header once the length is known.
pub trait ExtEncode {
    fn encode_ext(&self, buf: &mut Vec<u8>) -> Result<()>;
}

/// Implemented by types that can materialize themselves from an extension
/// payload. The reader is bounded to exactly `len` bytes; reading past the
/// declared payload is impossible.
pub trait ExtDecode: Sized {
    fn decode_ext(r: &mut dyn Read, len: usize) -> Result<Self>;
}

/// Decode hook stored per registered id. Receives the id, a length-limited
/// reader over the payload, and the payload length.
pub type ExtDecodeFn = fn(i8, &mut dyn Read, usize) -> Result<Value>;

fn decode_into_value<T>(_id: i8, r: &mut dyn Read, len: usize) -> Result<Value>
where
    T: ExtDecode + Into<Value>,
{
    Ok(T::decode_ext(r, len)?.into())
}

fn decode_raw(id: i8, r: &mut dyn Read, len: usize) -> Result<Value> {
    let data = r.get_exact(len, "read extension payload")?;
    Ok(Value::Ext(id, data))
}

#[derive(Default)]
struct Tables {
    by_id: HashMap<i8, ExtDecodeFn>,
    by_type: HashMap<TypeId, i8>,
}

/// Bidirectional extension-type registry.
///
/// Registration is last-write-wins: re-registering an id or a type replaces
/// the earlier entry. Registering only one direction is legal but limits the
/// shape to one-way use.
pub struct ExtRegistry {
    tables: RwLock<Tables>,
}

impl ExtRegistry {
    /// An empty registry with no types at all, not even the built-in
    /// timestamp.
    pub fn new() -> Self {
        ExtRegistry {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `T` under `id`, in both directions: values of type `T` will
    /// encode as extension `id`, and decoding extension `id` dynamically will
    /// materialize through `T::decode_ext`.
    pub fn register<T>(&self, id: i8)
    where
        T: ExtDecode + Into<Value> + 'static,
    {
        let mut tables = self.write();
        tables.by_id.insert(id, decode_into_value::<T>);
        tables.by_type.insert(TypeId::of::<T>(), id);
    }

    /// Register a decode-side-only entry whose hook keeps the payload opaque:
    /// decoding extension `id` dynamically yields `Value::Ext(id, payload)`.
    pub fn register_raw(&self, id: i8) {
        self.write().by_id.insert(id, decode_raw);
    }

    /// The id `T` is registered under, if any. This is the encode-side
    /// lookup.
    pub fn id_of<T: 'static>(&self) -> Option<i8> {
        self.read().by_type.get(&TypeId::of::<T>()).copied()
    }

    /// The decode hook registered for `id`, if any.
    pub fn decode_fn(&self, id: i8) -> Option<ExtDecodeFn> {
        self.read().by_id.get(&id).copied()
    }

    /// Whether a decode hook exists for `id`.
    pub fn is_registered(&self, id: i8) -> bool {
        self.read().by_id.contains_key(&id)
    }
}

impl Default for ExtRegistry {
    /// The standard registry: the built-in [`Timestamp`] at id 0.
    fn default() -> Self {
        let registry = ExtRegistry::new();
        registry.register::<Timestamp>(TIMESTAMP_EXT);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_knows_timestamp() {
        let reg = ExtRegistry::default();
        assert_eq!(reg.id_of::<Timestamp>(), Some(TIMESTAMP_EXT));
        assert!(reg.is_registered(TIMESTAMP_EXT));
        assert!(!reg.is_registered(9));
    }

    #[test]
    fn empty_knows_nothing() {
        let reg = ExtRegistry::new();
        assert_eq!(reg.id_of::<Timestamp>(), None);
        assert!(!reg.is_registered(TIMESTAMP_EXT));
    }

    #[test]
    fn last_write_wins() {
        let reg = ExtRegistry::default();
        reg.register::<Timestamp>(7);
        assert_eq!(reg.id_of::<Timestamp>(), Some(7));
        assert!(reg.is_registered(7));
    }

    #[test]
    fn raw_registration_keeps_payload() {
        let reg = ExtRegistry::new();
        reg.register_raw(3);
        let hook = reg.decode_fn(3).unwrap();
        let payload = [0xaau8, 0xbb];
        let v = hook(3, &mut &payload[..], 2).unwrap();
        assert_eq!(v, Value::Ext(3, vec![0xaa, 0xbb]));
    }
}
