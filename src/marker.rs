//! MessagePack format markers: the single tag byte that starts every wire
//! element. `from_u8`/`into_u8` form a bijection over all 256 byte values;
//! the family predicates classify markers by structural treatment.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    PosFixInt(u8),
    FixMap(u8),
    FixArray(u8),
    FixStr(u8),
    Null,
    Reserved,
    False,
    True,
    Bin8,
    Bin16,
    Bin32,
    Ext8,
    Ext16,
    Ext32,
    F32,
    F64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    FixExt1,
    FixExt2,
    FixExt4,
    FixExt8,
    FixExt16,
    Str8,
    Str16,
    Str32,
    Array16,
    Array32,
    Map16,
    Map32,
    NegFixInt(i8),
}

impl Marker {
    /// Construct a marker from a single byte.
    pub fn from_u8(n: u8) -> Marker {
        match n {
            0x00..=0x7f => Marker::PosFixInt(n),
            0x80..=0x8f => Marker::FixMap(n & 0x0f),
            0x90..=0x9f => Marker::FixArray(n & 0x0f),
            0xa0..=0xbf => Marker::FixStr(n & 0x1f),
            0xc0 => Marker::Null,
            0xc1 => Marker::Reserved,
            0xc2 => Marker::False,
            0xc3 => Marker::True,
            0xc4 => Marker::Bin8,
            0xc5 => Marker::Bin16,
            0xc6 => Marker::Bin32,
            0xc7 => Marker::Ext8,
            0xc8 => Marker::Ext16,
            0xc9 => Marker::Ext32,
            0xca => Marker::F32,
            0xcb => Marker::F64,
            0xcc => Marker::UInt8,
            0xcd => Marker::UInt16,
            0xce => Marker::UInt32,
            0xcf => Marker::UInt64,
            0xd0 => Marker::Int8,
            0xd1 => Marker::Int16,
            0xd2 => Marker::Int32,
            0xd3 => Marker::Int64,
            0xd4 => Marker::FixExt1,
            0xd5 => Marker::FixExt2,
            0xd6 => Marker::FixExt4,
            0xd7 => Marker::FixExt8,
            0xd8 => Marker::FixExt16,
            0xd9 => Marker::Str8,
            0xda => Marker::Str16,
            0xdb => Marker::Str32,
            0xdc => Marker::Array16,
            0xdd => Marker::Array32,
            0xde => Marker::Map16,
            0xdf => Marker::Map32,
            0xe0..=0xff => Marker::NegFixInt(n as i8),
        }
    }

    /// Converts a marker into its single-byte representation.
    /// Assumes the content of the marker is already masked appropriately.
    pub fn into_u8(self) -> u8 {
        match self {
            Marker::PosFixInt(val) => val,
            Marker::FixMap(len) => 0x80 | len,
            Marker::FixArray(len) => 0x90 | len,
            Marker::FixStr(len) => 0xa0 | len,
            Marker::Null => 0xc0,
            Marker::Reserved => 0xc1,
            Marker::False => 0xc2,
            Marker::True => 0xc3,
            Marker::Bin8 => 0xc4,
            Marker::Bin16 => 0xc5,
            Marker::Bin32 => 0xc6,
            Marker::Ext8 => 0xc7,
            Marker::Ext16 => 0xc8,
            Marker::Ext32 => 0xc9,
            Marker::F32 => 0xca,
            Marker::F64 => 0xcb,
            Marker::UInt8 => 0xcc,
            Marker::UInt16 => 0xcd,
            Marker::UInt32 => 0xce,
            Marker::UInt64 => 0xcf,
            Marker::Int8 => 0xd0,
            Marker::Int16 => 0xd1,
            Marker::Int32 => 0xd2,
            Marker::Int64 => 0xd3,
            Marker::FixExt1 => 0xd4,
            Marker::FixExt2 => 0xd5,
            Marker::FixExt4 => 0xd6,
            Marker::FixExt8 => 0xd7,
            Marker::FixExt16 => 0xd8,
            Marker::Str8 => 0xd9,
            Marker::Str16 => 0xda,
            Marker::Str32 => 0xdb,
            Marker::Array16 => 0xdc,
            Marker::Array32 => 0xdd,
            Marker::Map16 => 0xde,
            Marker::Map32 => 0xdf,
            Marker::NegFixInt(val) => val as u8,
        }
    }

    /// True for FixMap, Map16, and Map32.
    pub fn is_map_family(self) -> bool {
        matches!(self, Marker::FixMap(_) | Marker::Map16 | Marker::Map32)
    }

    /// True for FixArray, Array16, and Array32.
    pub fn is_array_family(self) -> bool {
        matches!(self, Marker::FixArray(_) | Marker::Array16 | Marker::Array32)
    }

    /// True for FixStr, Str8, Str16, and Str32.
    pub fn is_str_family(self) -> bool {
        matches!(
            self,
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32
        )
    }

    /// True for Bin8, Bin16, and Bin32.
    pub fn is_bin_family(self) -> bool {
        matches!(self, Marker::Bin8 | Marker::Bin16 | Marker::Bin32)
    }

    /// True for the fixed and variable extension markers.
    pub fn is_ext_family(self) -> bool {
        matches!(
            self,
            Marker::FixExt1
                | Marker::FixExt2
                | Marker::FixExt4
                | Marker::FixExt8
                | Marker::FixExt16
                | Marker::Ext8
                | Marker::Ext16
                | Marker::Ext32
        )
    }

    /// True for the single-byte positive and negative integer forms.
    pub fn is_fix_num_family(self) -> bool {
        matches!(self, Marker::PosFixInt(_) | Marker::NegFixInt(_))
    }

    pub fn name(self) -> &'static str {
        use self::Marker::*;
        match self {
            PosFixInt(_) => "PosFixInt",
            FixMap(_) => "FixMap",
            FixArray(_) => "FixArray",
            FixStr(_) => "FixStr",
            Null => "Null",
            Reserved => "Reserved",
            False => "False",
            True => "True",
            Bin8 => "Bin8",
            Bin16 => "Bin16",
            Bin32 => "Bin32",
            Ext8 => "Ext8",
            Ext16 => "Ext16",
            Ext32 => "Ext32",
            F32 => "F32",
            F64 => "F64",
            UInt8 => "UInt8",
            UInt16 => "UInt16",
            UInt32 => "UInt32",
            UInt64 => "UInt64",
            Int8 => "Int8",
            Int16 => "Int16",
            Int32 => "Int32",
            Int64 => "Int64",
            FixExt1 => "FixExt1",
            FixExt2 => "FixExt2",
            FixExt4 => "FixExt4",
            FixExt8 => "FixExt8",
            FixExt16 => "FixExt16",
            Str8 => "Str8",
            Str16 => "Str16",
            Str32 => "Str32",
            Array16 => "Array16",
            Array32 => "Array32",
            Map16 => "Map16",
            Map32 => "Map32",
            NegFixInt(_) => "NegFixInt",
        }
    }
}

impl From<u8> for Marker {
    fn from(val: u8) -> Marker {
        Marker::from_u8(val)
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection() {
        for n in 0..=255u8 {
            let marker = Marker::from_u8(n);
            assert_eq!(marker.into_u8(), n, "byte 0x{:02x} must round-trip", n);
        }
    }

    #[test]
    fn families_do_not_overlap() {
        for n in 0..=255u8 {
            let m = Marker::from_u8(n);
            let memberships = [
                m.is_map_family(),
                m.is_array_family(),
                m.is_str_family(),
                m.is_bin_family(),
                m.is_ext_family(),
                m.is_fix_num_family(),
            ]
            .iter()
            .filter(|&&x| x)
            .count();
            assert!(memberships <= 1, "byte 0x{:02x} is in {} families", n, memberships);
        }
    }

    #[test]
    fn family_sizes() {
        let count = |f: fn(Marker) -> bool| (0..=255u8).filter(|&n| f(Marker::from_u8(n))).count();
        assert_eq!(count(Marker::is_map_family), 16 + 2);
        assert_eq!(count(Marker::is_array_family), 16 + 2);
        assert_eq!(count(Marker::is_str_family), 32 + 3);
        assert_eq!(count(Marker::is_bin_family), 3);
        assert_eq!(count(Marker::is_ext_family), 5 + 3);
        assert_eq!(count(Marker::is_fix_num_family), 128 + 32);
    }

    #[test]
    fn null_is_in_no_family() {
        let m = Marker::Null;
        assert!(!m.is_map_family());
        assert!(!m.is_array_family());
        assert!(!m.is_str_family());
        assert!(!m.is_bin_family());
        assert!(!m.is_ext_family());
        assert!(!m.is_fix_num_family());
    }

    #[test]
    fn range_boundaries() {
        assert_eq!(Marker::from_u8(0x7f), Marker::PosFixInt(0x7f));
        assert_eq!(Marker::from_u8(0x80), Marker::FixMap(0));
        assert_eq!(Marker::from_u8(0x8f), Marker::FixMap(15));
        assert_eq!(Marker::from_u8(0x90), Marker::FixArray(0));
        assert_eq!(Marker::from_u8(0xa0), Marker::FixStr(0));
        assert_eq!(Marker::from_u8(0xbf), Marker::FixStr(31));
        assert_eq!(Marker::from_u8(0xc1), Marker::Reserved);
        assert_eq!(Marker::from_u8(0xe0), Marker::NegFixInt(-32));
        assert_eq!(Marker::from_u8(0xff), Marker::NegFixInt(-1));
    }
}
