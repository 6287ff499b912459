use std::fmt;
use std::io;

use crate::integer::Integer;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Occurs when the underlying sink or source fails, including short reads
    /// where a length prefix demanded more bytes than were available.
    Io {
        step: &'static str,
        source: io::Error,
    },
    /// The reserved marker byte (0xc1) was found in the input stream.
    ReservedMarker,
    /// A string's bytes were not valid UTF-8.
    BadUtf8 {
        step: &'static str,
        source: std::str::Utf8Error,
    },
    /// A string, byte sequence, array, map, or extension payload exceeded the
    /// largest length class the wire format can carry.
    LengthTooLong { what: &'static str, len: usize },
    /// The decoded value's shape cannot be placed in the requested
    /// destination shape.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// An integer was decoded but does not fit the requested width.
    IntOutOfRange {
        value: Integer,
        target: &'static str,
    },
    /// Extension encode was attempted for a type that has no id registered.
    UnregisteredType { type_name: &'static str },
    /// An extension type id was decoded that has no registered decode hook.
    UnknownExtType(i8),
    /// An extension value carried a different type id than the destination
    /// type is registered under.
    WrongExtType { expected: i8, found: i8 },
    /// Failure while processing an array element, tagged with its index.
    Element { index: usize, source: Box<Error> },
    /// Failure while processing a map entry, tagged with its key.
    Field { key: String, source: Box<Error> },
    /// Failure reported by a user-supplied extension codec.
    Message(String),
}

impl Error {
    /// Wraps an I/O failure with the operation that was in progress.
    /// Intended for use as `.map_err(Error::io("step name"))`.
    pub fn io(step: &'static str) -> impl FnOnce(io::Error) -> Error {
        move |source| Error::Io { step, source }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io { step, ref source } => {
                write!(f, "I/O failure during [{}]: {}", step, source)
            }
            Error::ReservedMarker => f.write_str("Reserved marker (0xc1) found"),
            Error::BadUtf8 { step, ref source } => {
                write!(f, "Invalid UTF-8 during [{}]: {}", step, source)
            }
            Error::LengthTooLong { what, len } => {
                write!(f, "{} is too long for the wire format ({} bytes)", what, len)
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "Expected {}, but value was {}", expected, found)
            }
            Error::IntOutOfRange { ref value, target } => {
                write!(f, "Integer {} cannot be represented as {}", value, target)
            }
            Error::UnregisteredType { type_name } => {
                write!(f, "No extension id registered for type {}", type_name)
            }
            Error::UnknownExtType(id) => {
                write!(f, "No decoder registered for extension type {}", id)
            }
            Error::WrongExtType { expected, found } => write!(
                f,
                "Expected extension type {}, but value used type {}",
                expected, found
            ),
            Error::Element { index, ref source } => {
                write!(f, "At element {}: {}", index, source)
            }
            Error::Field { ref key, ref source } => {
                write!(f, "At key \"{}\": {}", key, source)
            }
            Error::Message(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io { ref source, .. } => Some(source),
            Error::BadUtf8 { ref source, .. } => Some(source),
            Error::Element { ref source, .. } => Some(source),
            Error::Field { ref source, .. } => Some(source),
            _ => None,
        }
    }
}
