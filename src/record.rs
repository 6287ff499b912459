//! Structured records: the [`record!`] macro declares a struct together with
//! its wire field mapping, and generates `Encode`/`Decode` impls that carry
//! it as a string-keyed map.
//!
//! Per-field syntax, after the type:
//! - `=> "wire-name"` overrides the wire key (the declared field name is the
//!   default);
//! - `| omit_default` leaves the field off the wire when it equals its
//!   type's `Default` value (requires `PartialEq` on the field type);
//! - `| skip` excludes the field from the wire entirely, in both directions.
//!
//! Record types must derive (or implement) `Default`: decoding starts from
//! the default value, a wire Nil leaves the whole destination at its
//! default, and a Nil field value leaves that field at its default. Unknown
//! wire keys are decoded and discarded, so schema additions on the producer
//! side do not break older consumers.
//!
//! ```
//! wirepack::record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct Event {
//!         tag: String,
//!         count: i64 => "n",
//!         note: Option<String> | omit_default,
//!     }
//! }
//!
//! let e = Event { tag: "boot".into(), count: 2, note: None };
//! let bytes = wirepack::marshal(&e).unwrap();
//! let back: Event = wirepack::unmarshal(&bytes).unwrap();
//! assert_eq!(back, e);
//! ```

/// Declare a record type with a wire field mapping. See the module docs for
/// the field syntax.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $field:ident : $ty:ty $(=> $wire:literal)? $(| $flag:ident)* ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( pub $field: $ty, )*
        }

        impl $crate::Encode for $name {
            fn encode<W: ::std::io::Write>(
                &self,
                enc: &mut $crate::Encoder<W>,
            ) -> $crate::Result<()> {
                let mut fields =
                    $crate::MapBuilder::with_registry(::std::sync::Arc::clone(enc.registry()));
                $( $crate::record!(@encode fields, self, $field $(=> $wire)? $(| $flag)*); )*
                fields.write_to(enc.writer())
            }
        }

        impl $crate::Decode for $name {
            fn decode<R: ::std::io::Read>(d: &mut $crate::Decoder<R>) -> $crate::Result<Self> {
                if let $crate::Marker::Null = d.peek_marker()? {
                    let _ = d.read_marker()?;
                    return Ok(<$name as ::std::default::Default>::default());
                }
                let len = d.decode_map_len()?;
                let mut out = <$name as ::std::default::Default>::default();
                for _ in 0..len {
                    let key = d.decode_str()?;
                    let mut known = false;
                    $( $crate::record!(@decode d, out, key, known, $field $(=> $wire)? $(| $flag)*); )*
                    if !known {
                        // Unknown keys are decoded and discarded.
                        let _ = d.decode_value().map_err(|e| $crate::Error::Field {
                            key: key.clone(),
                            source: ::std::boxed::Box::new(e),
                        })?;
                    }
                }
                Ok(out)
            }
        }
    };

    (@encode $b:ident, $self:ident, $field:ident) => {
        $b.insert(stringify!($field), &$self.$field)?;
    };
    (@encode $b:ident, $self:ident, $field:ident => $wire:literal) => {
        $b.insert($wire, &$self.$field)?;
    };
    (@encode $b:ident, $self:ident, $field:ident | omit_default) => {
        {
            fn __wp_default_like<T: ::std::default::Default>(_: &T) -> T {
                <T as ::std::default::Default>::default()
            }
            if $self.$field != __wp_default_like(&$self.$field) {
                $b.insert(stringify!($field), &$self.$field)?;
            }
        }
    };
    (@encode $b:ident, $self:ident, $field:ident => $wire:literal | omit_default) => {
        {
            fn __wp_default_like<T: ::std::default::Default>(_: &T) -> T {
                <T as ::std::default::Default>::default()
            }
            if $self.$field != __wp_default_like(&$self.$field) {
                $b.insert($wire, &$self.$field)?;
            }
        }
    };
    (@encode $b:ident, $self:ident, $field:ident | skip) => {};
    (@encode $b:ident, $self:ident, $field:ident => $wire:literal | skip) => {};

    (@decode $d:ident, $out:ident, $key:ident, $known:ident, $field:ident) => {
        if !$known && $key == stringify!($field) {
            $out.$field = $d.decode_or_default().map_err(|e| $crate::Error::Field {
                key: $key.clone(),
                source: ::std::boxed::Box::new(e),
            })?;
            $known = true;
        }
    };
    (@decode $d:ident, $out:ident, $key:ident, $known:ident, $field:ident => $wire:literal) => {
        if !$known && $key == $wire {
            $out.$field = $d.decode_or_default().map_err(|e| $crate::Error::Field {
                key: $key.clone(),
                source: ::std::boxed::Box::new(e),
            })?;
            $known = true;
        }
    };
    (@decode $d:ident, $out:ident, $key:ident, $known:ident, $field:ident | omit_default) => {
        $crate::record!(@decode $d, $out, $key, $known, $field);
    };
    (@decode $d:ident, $out:ident, $key:ident, $known:ident, $field:ident => $wire:literal | omit_default) => {
        $crate::record!(@decode $d, $out, $key, $known, $field => $wire);
    };
    (@decode $d:ident, $out:ident, $key:ident, $known:ident, $field:ident | skip) => {};
    (@decode $d:ident, $out:ident, $key:ident, $known:ident, $field:ident => $wire:literal | skip) => {};
}
