//! Aggregate builders: accumulate an unknown-count sequence of elements or
//! key/value pairs, then emit the size-appropriate header followed by the
//! buffered payload. MessagePack headers are length-prefixed, so the count
//! must be known before the header byte can be chosen.

use std::io::Write;
use std::sync::Arc;

use crate::encode::{Encode, Encoder};
use crate::error::{Error, Result};
use crate::ext::ExtRegistry;
use crate::writer::WriteWire;

/// Accumulates array elements until the count is known.
pub struct ArrayBuilder {
    count: usize,
    buf: Vec<u8>,
    registry: Arc<ExtRegistry>,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        ArrayBuilder::with_registry(Arc::new(ExtRegistry::default()))
    }

    pub fn with_registry(registry: Arc<ExtRegistry>) -> Self {
        ArrayBuilder {
            count: 0,
            buf: Vec::new(),
            registry,
        }
    }

    /// Encode one element onto the internal buffer.
    pub fn push<T: Encode + ?Sized>(&mut self, v: &T) -> Result<()> {
        let mut enc = Encoder::with_registry(&mut self.buf, Arc::clone(&self.registry));
        v.encode(&mut enc)
            .map_err(|e| Error::Element {
                index: self.count,
                source: Box::new(e),
            })?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Discard all buffered elements so the builder can be reused.
    pub fn reset(&mut self) {
        self.count = 0;
        self.buf.clear();
    }

    /// Emit the header for the accumulated count, then the buffered payload.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut enc = Encoder::with_registry(&mut *w, Arc::clone(&self.registry));
        enc.encode_array_header(self.count)?;
        enc.writer().put_slice(&self.buf, "write array payload")
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.buf.len() + 5);
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl Default for ArrayBuilder {
    fn default() -> Self {
        ArrayBuilder::new()
    }
}

/// Accumulates string-keyed map entries until the count is known.
pub struct MapBuilder {
    count: usize,
    buf: Vec<u8>,
    registry: Arc<ExtRegistry>,
}

impl MapBuilder {
    pub fn new() -> Self {
        MapBuilder::with_registry(Arc::new(ExtRegistry::default()))
    }

    pub fn with_registry(registry: Arc<ExtRegistry>) -> Self {
        MapBuilder {
            count: 0,
            buf: Vec::new(),
            registry,
        }
    }

    /// Encode one key/value pair onto the internal buffer.
    pub fn insert<T: Encode + ?Sized>(&mut self, key: &str, v: &T) -> Result<()> {
        let mut enc = Encoder::with_registry(&mut self.buf, Arc::clone(&self.registry));
        enc.encode_str(key)?;
        v.encode(&mut enc).map_err(|e| Error::Field {
            key: key.to_string(),
            source: Box::new(e),
        })?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Discard all buffered entries so the builder can be reused.
    pub fn reset(&mut self) {
        self.count = 0;
        self.buf.clear();
    }

    /// Emit the header for the accumulated count, then the buffered payload.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut enc = Encoder::with_registry(&mut *w, Arc::clone(&self.registry));
        enc.encode_map_header(self.count)?;
        enc.writer().put_slice(&self.buf, "write map payload")
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.buf.len() + 5);
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        MapBuilder::new()
    }
}
