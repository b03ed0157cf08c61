//! Low-level tag dispatch: turns a byte slice into a flat stream of
//! [`Element`]s, one tag at a time, with no structural (container-balance,
//! name/value alternation) validation. [`crate::decode`] and
//! [`crate::posmap`] layer that on top.

use byteorder::{ByteOrder, LittleEndian};

use crate::bignum::BigNumber;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::tag::Tag;
use crate::varint::uleb128_decode;

/// Which primitive kind a typed array's tag names, and the width of each
/// packed element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypedArrayKind {
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
}

impl TypedArrayKind {
    pub fn element_size(self) -> usize {
        match self {
            TypedArrayKind::UInt8 | TypedArrayKind::Int8 => 1,
            TypedArrayKind::UInt16 | TypedArrayKind::Int16 => 2,
            TypedArrayKind::UInt32 | TypedArrayKind::Int32 | TypedArrayKind::Float32 => 4,
            TypedArrayKind::UInt64 | TypedArrayKind::Int64 | TypedArrayKind::Float64 => 8,
        }
    }

    fn from_tag_offset(offset: u8) -> Option<TypedArrayKind> {
        match offset {
            0 => Some(TypedArrayKind::UInt8),
            1 => Some(TypedArrayKind::UInt16),
            2 => Some(TypedArrayKind::UInt32),
            3 => Some(TypedArrayKind::UInt64),
            4 => Some(TypedArrayKind::Int8),
            5 => Some(TypedArrayKind::Int16),
            6 => Some(TypedArrayKind::Int32),
            7 => Some(TypedArrayKind::Int64),
            8 => Some(TypedArrayKind::Float32),
            9 => Some(TypedArrayKind::Float64),
            _ => None,
        }
    }

    pub(crate) fn tag_offset(self) -> u8 {
        match self {
            TypedArrayKind::UInt8 => 0,
            TypedArrayKind::UInt16 => 1,
            TypedArrayKind::UInt32 => 2,
            TypedArrayKind::UInt64 => 3,
            TypedArrayKind::Int8 => 4,
            TypedArrayKind::Int16 => 5,
            TypedArrayKind::Int32 => 6,
            TypedArrayKind::Int64 => 7,
            TypedArrayKind::Float32 => 8,
            TypedArrayKind::Float64 => 9,
        }
    }
}

/// One decoded wire-level token.
///
/// Array/object/record begin and end markers are yielded as distinct
/// events rather than nested structures, mirroring the document's own
/// flat byte stream; [`crate::decode::Decoder`] reconstructs structure
/// from this stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float32(f32),
    Float64(f64),
    BigNumber(BigNumber),
    String(&'a str),
    ArrayBegin,
    ObjectBegin,
    /// Begin a record definition: a list of key strings terminated by
    /// [`Element::ContainerEnd`].
    RecordDefinitionBegin,
    /// Begin a record instance referencing definition `index`: a list of
    /// values terminated by [`Element::ContainerEnd`].
    RecordInstanceBegin(u64),
    /// Begin a typed array's synthesized element stream, terminated by
    /// [`Element::ContainerEnd`] once its count of elements is exhausted.
    TypedArrayBegin(TypedArrayKind),
    ContainerEnd,
}

fn sign_extend(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    if bytes[bytes.len() - 1] & 0x80 != 0 {
        for b in buf.iter_mut().skip(bytes.len()) {
            *b = 0xFF;
        }
    }
    i64::from_le_bytes(buf)
}

fn zero_extend(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Tracks an in-progress typed array's synthesized primitive stream.
#[derive(Clone, Copy, Debug)]
struct TypedArrayState {
    kind: TypedArrayKind,
    remaining: u64,
}

/// Low-level, zero-copy tag-by-tag reader over an input slice.
///
/// Implements `Iterator<Item = Result<Element<'a>>>`; once an item is
/// `Err`, the iterator is latched closed and yields `None` afterward,
/// matching the spec's eager first-error-wins policy.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    errored: bool,
    typed_array: Option<TypedArrayState>,
    limits: Limits,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_limits(input, Limits::default())
    }

    pub fn with_limits(input: &'a [u8], limits: Limits) -> Self {
        Parser {
            input,
            pos: 0,
            errored: false,
            typed_array: None,
            limits,
        }
    }

    /// Current byte offset into the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let start = self.pos;
        self.input
            .get(start..start + n)
            .map(|s| {
                self.pos += n;
                s
            })
            .ok_or(Error::Incomplete { byte_offset: start })
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Convert `bytes` to a string, validating UTF-8 unless policy has
    /// disabled the check. The all-ASCII case is always well-formed UTF-8
    /// by construction, so it skips straight past the validator.
    ///
    /// # Safety
    /// With `reject_invalid_utf8` off, the caller is asserting the input
    /// is valid UTF-8; passing ill-formed bytes is undefined behavior.
    fn to_str(&self, bytes: &'a [u8], start: usize) -> Result<&'a str> {
        if crate::simd::all_ascii(bytes) {
            return Ok(unsafe { std::str::from_utf8_unchecked(bytes) });
        }
        if self.limits.reject_invalid_utf8 {
            std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { byte_offset: start })
        } else {
            Ok(unsafe { std::str::from_utf8_unchecked(bytes) })
        }
    }

    fn read_string(&mut self, len: usize) -> Result<&'a str> {
        if len > self.limits.max_string_length {
            return Err(Error::MaxStringLengthExceeded {
                byte_offset: self.pos,
                limit: self.limits.max_string_length,
            });
        }
        let start = self.pos;
        let bytes = self.take(len)?;
        if self.limits.reject_nul && crate::simd::contains_byte(bytes, 0) {
            return Err(Error::NulCharacter { byte_offset: start });
        }
        self.to_str(bytes, start)
    }

    fn read_long_string(&mut self) -> Result<&'a str> {
        let start = self.pos;
        let rest = &self.input[self.pos..];
        let term =
            crate::simd::find_byte(rest, 0xFF).ok_or(Error::Incomplete { byte_offset: start })?;
        if term > self.limits.max_string_length {
            return Err(Error::MaxStringLengthExceeded {
                byte_offset: start,
                limit: self.limits.max_string_length,
            });
        }
        let bytes = &rest[..term];
        self.pos += term + 1; // include terminator
        if self.limits.reject_nul && crate::simd::contains_byte(bytes, 0) {
            return Err(Error::NulCharacter { byte_offset: start });
        }
        self.to_str(bytes, start)
    }

    fn check_float(&self, v: f64, byte_offset: usize) -> Result<()> {
        if self.limits.reject_nan_infinity && !v.is_finite() {
            return Err(Error::InvalidData {
                byte_offset,
                reason: "NaN/Infinity float rejected by policy",
            });
        }
        Ok(())
    }

    fn next_typed_element(&mut self) -> Option<Result<Element<'a>>> {
        let state = self.typed_array.as_mut()?;
        if state.remaining == 0 {
            self.typed_array = None;
            return Some(Ok(Element::ContainerEnd));
        }
        let kind = state.kind;
        state.remaining -= 1;
        let size = kind.element_size();
        let offset = self.pos;
        let bytes = match self.take(size) {
            Ok(b) => b,
            Err(e) => {
                self.errored = true;
                return Some(Err(e));
            }
        };
        let elem = match kind {
            TypedArrayKind::UInt8
            | TypedArrayKind::UInt16
            | TypedArrayKind::UInt32
            | TypedArrayKind::UInt64 => Element::UInt(zero_extend(bytes)),
            TypedArrayKind::Int8 | TypedArrayKind::Int16 | TypedArrayKind::Int32 | TypedArrayKind::Int64 => {
                Element::Int(sign_extend(bytes))
            }
            TypedArrayKind::Float32 => {
                let v = LittleEndian::read_f32(bytes);
                if let Err(e) = self.check_float(v as f64, offset) {
                    self.errored = true;
                    return Some(Err(e));
                }
                Element::Float32(v)
            }
            TypedArrayKind::Float64 => {
                let v = LittleEndian::read_f64(bytes);
                if let Err(e) = self.check_float(v, offset) {
                    self.errored = true;
                    return Some(Err(e));
                }
                Element::Float64(v)
            }
        };
        Some(Ok(elem))
    }

    fn next_impl(&mut self) -> Option<Result<Element<'a>>> {
        if let Some(r) = self.next_typed_element() {
            return Some(r);
        }
        if self.pos >= self.input.len() {
            return None;
        }
        let offset = self.pos;
        let tag_byte = match self.take_u8() {
            Ok(b) => b,
            Err(e) => return Some(Err(e)),
        };
        let result = self.dispatch(Tag::from_u8(tag_byte), offset);
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }

    fn dispatch(&mut self, tag: Tag, offset: usize) -> Result<Element<'a>> {
        match tag {
            // Small-int tags decode as signed per the dispatch priority
            // table: "tag <= 0x64 -> small int, emit as signed integer
            // equal to tag."
            Tag::SmallUInt(v) => Ok(Element::Int(v as i64)),
            Tag::ShortString(len) => self.read_string(len as usize).map(Element::String),
            Tag::UInt8 => Ok(Element::UInt(zero_extend(self.take(1)?))),
            Tag::UInt16 => Ok(Element::UInt(zero_extend(self.take(2)?))),
            Tag::UInt32 => Ok(Element::UInt(zero_extend(self.take(4)?))),
            Tag::UInt64 => Ok(Element::UInt(zero_extend(self.take(8)?))),
            Tag::Int8 => Ok(Element::Int(sign_extend(self.take(1)?))),
            Tag::Int16 => Ok(Element::Int(sign_extend(self.take(2)?))),
            Tag::Int32 => Ok(Element::Int(sign_extend(self.take(4)?))),
            Tag::Int64 => Ok(Element::Int(sign_extend(self.take(8)?))),
            Tag::Float32 => {
                let b = self.take(4)?;
                let v = LittleEndian::read_f32(b);
                self.check_float(v as f64, offset)?;
                Ok(Element::Float32(v))
            }
            Tag::Float64 => {
                let b = self.take(8)?;
                let v = LittleEndian::read_f64(b);
                self.check_float(v, offset)?;
                Ok(Element::Float64(v))
            }
            Tag::BigNumber => {
                let rest = &self.input[self.pos..];
                let (big, n) = BigNumber::decode(rest, offset, self.limits.max_bignum_magnitude)?;
                self.pos += n;
                Ok(Element::BigNumber(big))
            }
            Tag::Null => Ok(Element::Null),
            Tag::False => Ok(Element::Bool(false)),
            Tag::True => Ok(Element::Bool(true)),
            Tag::ContainerEnd => Ok(Element::ContainerEnd),
            Tag::ArrayBegin => Ok(Element::ArrayBegin),
            Tag::ObjectBegin => Ok(Element::ObjectBegin),
            Tag::RecordDefinition => Ok(Element::RecordDefinitionBegin),
            Tag::RecordInstance => {
                let rest = &self.input[self.pos..];
                let (index, n) = uleb128_decode(rest, offset)?;
                self.pos += n;
                Ok(Element::RecordInstanceBegin(index))
            }
            Tag::TypedArray(kind_offset) => {
                let kind = TypedArrayKind::from_tag_offset(kind_offset).ok_or(Error::InvalidData {
                    byte_offset: offset,
                    reason: "reserved typed array tag",
                })?;
                let rest = &self.input[self.pos..];
                let (count, n) = uleb128_decode(rest, offset)?;
                if self.limits.reject_noncanonical_lengths
                    && n != crate::varint::uleb128_minimal_len(count)
                {
                    return Err(Error::InvalidData {
                        byte_offset: offset,
                        reason: "typed array length is not minimally encoded",
                    });
                }
                self.pos += n;
                if count as usize > self.limits.max_container_size {
                    return Err(Error::MaxContainerSizeExceeded {
                        byte_offset: offset,
                        limit: self.limits.max_container_size,
                    });
                }
                self.typed_array = Some(TypedArrayState {
                    kind,
                    remaining: count,
                });
                Ok(Element::TypedArrayBegin(kind))
            }
            Tag::LongString => self.read_long_string().map(Element::String),
            Tag::Reserved => Err(Error::InvalidData {
                byte_offset: offset,
                reason: "reserved type tag",
            }),
        }
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        self.next_impl()
    }
}

/// Write a single element's tag and payload to `buf`, choosing the
/// smallest standard encoding for integers (per the canonical-encoding
/// invariant).
pub fn serialize_elem(elem: &Element<'_>, buf: &mut Vec<u8>) {
    match *elem {
        Element::Null => buf.push(Tag::Null.into_u8()),
        Element::Bool(false) => buf.push(Tag::False.into_u8()),
        Element::Bool(true) => buf.push(Tag::True.into_u8()),
        Element::UInt(v) => serialize_uint(v, buf),
        Element::Int(v) => serialize_int(v, buf),
        Element::Float32(v) => {
            buf.push(Tag::Float32.into_u8());
            let mut tmp = [0u8; 4];
            LittleEndian::write_f32(&mut tmp, v);
            buf.extend_from_slice(&tmp);
        }
        Element::Float64(v) => {
            buf.push(Tag::Float64.into_u8());
            let mut tmp = [0u8; 8];
            LittleEndian::write_f64(&mut tmp, v);
            buf.extend_from_slice(&tmp);
        }
        Element::BigNumber(ref big) => {
            buf.push(Tag::BigNumber.into_u8());
            big.encode(buf);
        }
        Element::String(s) => serialize_str(s, buf),
        Element::ArrayBegin => buf.push(Tag::ArrayBegin.into_u8()),
        Element::ObjectBegin => buf.push(Tag::ObjectBegin.into_u8()),
        Element::RecordDefinitionBegin => buf.push(Tag::RecordDefinition.into_u8()),
        Element::RecordInstanceBegin(index) => {
            buf.push(Tag::RecordInstance.into_u8());
            crate::varint::uleb128_encode(index, buf);
        }
        Element::TypedArrayBegin(kind) => {
            buf.push(Tag::TypedArray(kind.tag_offset()).into_u8());
        }
        Element::ContainerEnd => buf.push(Tag::ContainerEnd.into_u8()),
    }
}

/// Emit the canonical minimal-width unsigned integer encoding.
pub fn serialize_uint(v: u64, buf: &mut Vec<u8>) {
    if v <= 0x64 {
        buf.push(Tag::SmallUInt(v as u8).into_u8());
    } else if v <= u8::MAX as u64 {
        buf.push(Tag::UInt8.into_u8());
        buf.push(v as u8);
    } else if v <= u16::MAX as u64 {
        buf.push(Tag::UInt16.into_u8());
        buf.extend_from_slice(&(v as u16).to_le_bytes());
    } else if v <= u32::MAX as u64 {
        buf.push(Tag::UInt32.into_u8());
        buf.extend_from_slice(&(v as u32).to_le_bytes());
    } else {
        buf.push(Tag::UInt64.into_u8());
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Emit the canonical minimal-width signed integer encoding, preferring an
/// unsigned tag when the value is non-negative.
pub fn serialize_int(v: i64, buf: &mut Vec<u8>) {
    if v >= 0 {
        serialize_uint(v as u64, buf);
        return;
    }
    if v >= i8::MIN as i64 {
        buf.push(Tag::Int8.into_u8());
        buf.push(v as i8 as u8);
    } else if v >= i16::MIN as i64 {
        buf.push(Tag::Int16.into_u8());
        buf.extend_from_slice(&(v as i16).to_le_bytes());
    } else if v >= i32::MIN as i64 {
        buf.push(Tag::Int32.into_u8());
        buf.extend_from_slice(&(v as i32).to_le_bytes());
    } else {
        buf.push(Tag::Int64.into_u8());
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Emit the canonical short/long string encoding for `s`.
pub fn serialize_str(s: &str, buf: &mut Vec<u8>) {
    let bytes = s.as_bytes();
    if bytes.len() <= 66 {
        buf.push(Tag::ShortString(bytes.len() as u8).into_u8());
        buf.extend_from_slice(bytes);
    } else {
        buf.push(Tag::LongString.into_u8());
        buf.extend_from_slice(bytes);
        buf.push(0xFF);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse_all(input: &[u8]) -> Result<Vec<Element<'_>>> {
        Parser::new(input).collect()
    }

    mod null {
        use super::*;

        #[test]
        fn spec_exact_bytes() {
            let mut buf = Vec::new();
            serialize_elem(&Element::Null, &mut buf);
            assert_eq!(buf, vec![0xB3]);
        }

        #[test]
        fn roundtrip() {
            let elems = parse_all(&[0xB3]).unwrap();
            assert_eq!(elems, vec![Element::Null]);
        }
    }

    mod bool {
        use super::*;

        #[test]
        fn spec_exact_bytes() {
            let mut buf = Vec::new();
            serialize_elem(&Element::Bool(true), &mut buf);
            assert_eq!(buf, vec![0xB5]);
            buf.clear();
            serialize_elem(&Element::Bool(false), &mut buf);
            assert_eq!(buf, vec![0xB4]);
        }
    }

    mod integer {
        use super::*;

        #[test]
        fn small_uint_is_single_byte() {
            let mut buf = Vec::new();
            serialize_elem(&Element::UInt(42), &mut buf);
            assert_eq!(buf, vec![0x2A]);
        }

        #[test]
        fn literal_scenario_1() {
            let mut buf = Vec::new();
            serialize_int(42, &mut buf);
            assert_eq!(buf, vec![0x2A]);
            assert_eq!(parse_all(&buf).unwrap(), vec![Element::UInt(42)]);
        }

        #[test]
        fn negative_one_uses_int8() {
            let mut buf = Vec::new();
            serialize_int(-1, &mut buf);
            assert_eq!(buf, vec![0xAC, 0xFF]);
        }

        #[test]
        fn value_256_uses_uint16() {
            let mut buf = Vec::new();
            serialize_int(256, &mut buf);
            assert_eq!(buf, vec![0xA9, 0x00, 0x01]);
        }

        #[test]
        fn literal_scenario_2_array() {
            let expected = [0xB7u8, 0x01, 0xAC, 0xFF, 0xA9, 0x00, 0x01, 0xB6];
            let elems = parse_all(&expected).unwrap();
            assert_eq!(
                elems,
                vec![
                    Element::ArrayBegin,
                    Element::UInt(1),
                    Element::Int(-1),
                    Element::UInt(256),
                    Element::ContainerEnd,
                ]
            );
        }

        #[test]
        fn boundaries_roundtrip() {
            for v in [
                -128i64,
                127,
                -32768,
                32767,
                i32::MIN as i64,
                i32::MAX as i64,
                i64::MIN,
                i64::MAX,
            ] {
                let mut buf = Vec::new();
                serialize_int(v, &mut buf);
                let elems = parse_all(&buf).unwrap();
                assert_eq!(elems.len(), 1);
                let decoded = match elems[0] {
                    Element::Int(v) => v,
                    Element::UInt(v) => v as i64,
                    _ => panic!("not an integer"),
                };
                assert_eq!(decoded, v);
            }
        }

        #[test]
        fn not_enough_bytes() {
            assert!(matches!(
                parse_all(&[0xAB, 0x01, 0x02]),
                Err(Error::Incomplete { .. })
            ));
        }
    }

    mod string {
        use super::*;

        #[test]
        fn literal_scenario_4_hello() {
            let mut buf = Vec::new();
            serialize_str("hello", &mut buf);
            assert_eq!(buf, vec![0x6A, b'h', b'e', b'l', b'l', b'o']);
        }

        #[test]
        fn literal_scenario_5_long_string() {
            let s = "x".repeat(100);
            let mut buf = Vec::new();
            serialize_str(&s, &mut buf);
            assert_eq!(buf[0], 0xFF);
            assert_eq!(buf.last(), Some(&0xFF));
            assert_eq!(buf.len(), 102);
            let elems = parse_all(&buf).unwrap();
            assert_eq!(elems, vec![Element::String(&s)]);
        }

        #[test]
        fn empty_short_string() {
            let mut buf = Vec::new();
            serialize_str("", &mut buf);
            assert_eq!(buf, vec![0x65]);
        }

        #[test]
        fn boundary_66_is_short_67_is_long() {
            let s66 = "a".repeat(66);
            let mut buf = Vec::new();
            serialize_str(&s66, &mut buf);
            assert_eq!(buf[0], 0xA7);

            let s67 = "a".repeat(67);
            let mut buf = Vec::new();
            serialize_str(&s67, &mut buf);
            assert_eq!(buf[0], 0xFF);
        }

        #[test]
        fn not_enough_bytes() {
            assert!(matches!(
                parse_all(&[0x6A, b'h', b'i']),
                Err(Error::Incomplete { .. })
            ));
        }

        #[test]
        fn unterminated_long_string_is_incomplete() {
            assert!(matches!(
                parse_all(&[0xFF, b'h', b'i']),
                Err(Error::Incomplete { .. })
            ));
        }

        #[test]
        fn invalid_utf8_rejected_by_default() {
            // Short string of length 1 holding a lone continuation byte.
            let buf = [0x66u8, 0x80];
            assert!(matches!(
                parse_all(&buf),
                Err(Error::InvalidUtf8 { .. })
            ));
        }

        #[test]
        fn invalid_utf8_accepted_when_policy_disabled() {
            let buf = [0x66u8, 0x80];
            let limits = Limits {
                reject_invalid_utf8: false,
                ..Limits::default()
            };
            let elems: Vec<_> = Parser::with_limits(&buf, limits)
                .collect::<Result<Vec<_>>>()
                .unwrap();
            assert_eq!(elems.len(), 1);
        }
    }

    mod object {
        use super::*;

        #[test]
        fn literal_scenario_3() {
            let expected = [0xB8u8, 0x66, b'a', 0xB5, 0x66, b'b', 0xB3, 0xB6];
            let elems = parse_all(&expected).unwrap();
            assert_eq!(
                elems,
                vec![
                    Element::ObjectBegin,
                    Element::String("a"),
                    Element::Bool(true),
                    Element::String("b"),
                    Element::Null,
                    Element::ContainerEnd,
                ]
            );
        }
    }

    mod reserved {
        use super::*;

        #[test]
        fn literal_scenario_6() {
            let mut parser = Parser::new(&[0xBB]);
            let result = parser.next().unwrap();
            assert!(matches!(
                result,
                Err(Error::InvalidData { byte_offset: 0, .. })
            ));
            assert_eq!(parser.position(), 1);
        }
    }

    mod typed_array {
        use super::*;

        #[test]
        fn uint8_array_of_three() {
            let mut buf = vec![Tag::TypedArray(TypedArrayKind::UInt8.tag_offset()).into_u8()];
            crate::varint::uleb128_encode(3, &mut buf);
            buf.extend_from_slice(&[1, 2, 3]);
            let elems = parse_all(&buf).unwrap();
            assert_eq!(
                elems,
                vec![
                    Element::TypedArrayBegin(TypedArrayKind::UInt8),
                    Element::UInt(1),
                    Element::UInt(2),
                    Element::UInt(3),
                    Element::ContainerEnd,
                ]
            );
        }

        #[test]
        fn empty_typed_array() {
            let mut buf = vec![Tag::TypedArray(TypedArrayKind::Float64.tag_offset()).into_u8()];
            crate::varint::uleb128_encode(0, &mut buf);
            let elems = parse_all(&buf).unwrap();
            assert_eq!(
                elems,
                vec![
                    Element::TypedArrayBegin(TypedArrayKind::Float64),
                    Element::ContainerEnd,
                ]
            );
        }

        #[test]
        fn overlong_length_rejected_when_policy_enabled() {
            // 3 encoded as a two-byte ULEB128 (0x83, 0x00) instead of the
            // minimal one-byte form (0x03).
            let mut buf = vec![Tag::TypedArray(TypedArrayKind::UInt8.tag_offset()).into_u8()];
            buf.extend_from_slice(&[0x83, 0x00]);
            buf.extend_from_slice(&[1, 2, 3]);

            let limits = Limits {
                reject_noncanonical_lengths: true,
                ..Limits::default()
            };
            let err = Parser::with_limits(&buf, limits)
                .collect::<Result<Vec<_>>>()
                .unwrap_err();
            assert!(matches!(err, Error::InvalidData { .. }));

            // Off by default, so the same bytes are accepted.
            let elems = parse_all(&buf).unwrap();
            assert_eq!(elems[0], Element::TypedArrayBegin(TypedArrayKind::UInt8));
        }
    }

    mod big_number {
        use super::*;

        #[test]
        fn zero_has_zero_signed_length() {
            let mut buf = Vec::new();
            serialize_elem(&Element::BigNumber(BigNumber::zero()), &mut buf);
            assert_eq!(buf, vec![0xB2, 0x00, 0x00]);
        }

        #[test]
        fn eight_byte_magnitude_each_sign() {
            for sign in [1i8, -1] {
                let big = BigNumber::new(sign, u64::MAX, 0);
                let mut buf = Vec::new();
                serialize_elem(&Element::BigNumber(big), &mut buf);
                let elems = parse_all(&buf).unwrap();
                assert_eq!(elems, vec![Element::BigNumber(big)]);
            }
        }
    }

    mod errored_latch {
        use super::*;

        #[test]
        fn stops_after_first_error() {
            let mut parser = Parser::new(&[0xBB, 0xB3]);
            assert!(parser.next().unwrap().is_err());
            assert!(parser.next().is_none());
        }
    }
}
