//! BONJSON type tag byte. For internal use only.

/// Classification of a BONJSON type tag byte.
///
/// Covers every range in the wire format's single-byte type tag: small
/// integers and short strings are folded directly into the tag, everything
/// else names a following payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    /// `0x00..=0x64`: small unsigned integer, value equals the tag byte.
    SmallUInt(u8),
    /// `0x65..=0xA7`: short string, length `tag - 0x65` (0 to 66 bytes follow).
    ShortString(u8),
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    BigNumber,
    Null,
    False,
    True,
    ContainerEnd,
    ArrayBegin,
    ObjectBegin,
    RecordDefinition,
    RecordInstance,
    /// `0xBB..=0xF4`: reserved, must be rejected as invalid data.
    Reserved,
    /// `0xF5..=0xFE`: typed array, element kind/size encoded in the tag.
    TypedArray(u8),
    LongString,
}

const SHORT_STRING_LO: u8 = 0x65;
const SHORT_STRING_HI: u8 = 0xA7;
const TYPED_ARRAY_LO: u8 = 0xF5;
const TYPED_ARRAY_HI: u8 = 0xFE;

impl Tag {
    /// Construct a tag from a single byte.
    pub fn from_u8(n: u8) -> Tag {
        match n {
            0x00..=0x64 => Tag::SmallUInt(n),
            SHORT_STRING_LO..=SHORT_STRING_HI => Tag::ShortString(n - SHORT_STRING_LO),
            0xA8 => Tag::UInt8,
            0xA9 => Tag::UInt16,
            0xAA => Tag::UInt32,
            0xAB => Tag::UInt64,
            0xAC => Tag::Int8,
            0xAD => Tag::Int16,
            0xAE => Tag::Int32,
            0xAF => Tag::Int64,
            0xB0 => Tag::Float32,
            0xB1 => Tag::Float64,
            0xB2 => Tag::BigNumber,
            0xB3 => Tag::Null,
            0xB4 => Tag::False,
            0xB5 => Tag::True,
            0xB6 => Tag::ContainerEnd,
            0xB7 => Tag::ArrayBegin,
            0xB8 => Tag::ObjectBegin,
            0xB9 => Tag::RecordDefinition,
            0xBA => Tag::RecordInstance,
            TYPED_ARRAY_LO..=TYPED_ARRAY_HI => Tag::TypedArray(n - TYPED_ARRAY_LO),
            0xFF => Tag::LongString,
            _ => Tag::Reserved,
        }
    }

    /// Convert a tag back into its single-byte wire representation.
    ///
    /// Panics if a variant-carried value is out of its valid range; callers
    /// are expected to only construct tags with in-range payloads.
    pub fn into_u8(self) -> u8 {
        match self {
            Tag::SmallUInt(v) => {
                assert!(v <= 0x64);
                v
            }
            Tag::ShortString(len) => {
                assert!(len <= SHORT_STRING_HI - SHORT_STRING_LO);
                SHORT_STRING_LO + len
            }
            Tag::UInt8 => 0xA8,
            Tag::UInt16 => 0xA9,
            Tag::UInt32 => 0xAA,
            Tag::UInt64 => 0xAB,
            Tag::Int8 => 0xAC,
            Tag::Int16 => 0xAD,
            Tag::Int32 => 0xAE,
            Tag::Int64 => 0xAF,
            Tag::Float32 => 0xB0,
            Tag::Float64 => 0xB1,
            Tag::BigNumber => 0xB2,
            Tag::Null => 0xB3,
            Tag::False => 0xB4,
            Tag::True => 0xB5,
            Tag::ContainerEnd => 0xB6,
            Tag::ArrayBegin => 0xB7,
            Tag::ObjectBegin => 0xB8,
            Tag::RecordDefinition => 0xB9,
            Tag::RecordInstance => 0xBA,
            Tag::Reserved => 0xBB,
            Tag::TypedArray(kind) => {
                assert!(kind <= TYPED_ARRAY_HI - TYPED_ARRAY_LO);
                TYPED_ARRAY_LO + kind
            }
            Tag::LongString => 0xFF,
        }
    }
}

impl From<u8> for Tag {
    fn from(val: u8) -> Tag {
        Tag::from_u8(val)
    }
}

impl From<Tag> for u8 {
    fn from(val: Tag) -> u8 {
        val.into_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_uint_roundtrip() {
        for n in 0..=0x64u8 {
            assert_eq!(Tag::from_u8(n), Tag::SmallUInt(n));
            assert_eq!(Tag::SmallUInt(n).into_u8(), n);
        }
    }

    #[test]
    fn short_string_roundtrip() {
        for len in 0..=66u8 {
            let n = 0x65 + len;
            assert_eq!(Tag::from_u8(n), Tag::ShortString(len));
            assert_eq!(Tag::ShortString(len).into_u8(), n);
        }
    }

    #[test]
    fn fixed_markers() {
        assert_eq!(Tag::from_u8(0xB3), Tag::Null);
        assert_eq!(Tag::from_u8(0xB4), Tag::False);
        assert_eq!(Tag::from_u8(0xB5), Tag::True);
        assert_eq!(Tag::from_u8(0xB6), Tag::ContainerEnd);
        assert_eq!(Tag::from_u8(0xB7), Tag::ArrayBegin);
        assert_eq!(Tag::from_u8(0xB8), Tag::ObjectBegin);
        assert_eq!(Tag::from_u8(0xFF), Tag::LongString);
    }

    #[test]
    fn reserved_range() {
        assert_eq!(Tag::from_u8(0xBB), Tag::Reserved);
        assert_eq!(Tag::from_u8(0xF4), Tag::Reserved);
    }

    #[test]
    fn typed_array_roundtrip() {
        for kind in 0..=(0xFEu8 - 0xF5) {
            let n = 0xF5 + kind;
            assert_eq!(Tag::from_u8(n), Tag::TypedArray(kind));
            assert_eq!(Tag::TypedArray(kind).into_u8(), n);
        }
    }
}
