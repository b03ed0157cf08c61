//! Encoder: builds a document by emitting primitive values and
//! array/object begin/end markers, validating structure the same way
//! [`crate::decode::Decoder`] validates it on the way in.

use crate::bignum::BigNumber;
use crate::depth::{ContainerKind, DepthStack};
use crate::element::{serialize_elem, Element};
use crate::error::{trace, Error, Result};
use crate::integer::Integer;
use crate::limits::Limits;
use crate::value::Value;

/// Builds a BONJSON document into an in-memory buffer.
///
/// Calls must nest correctly (every `begin_array`/`begin_object` matched
/// by an `end_container`, objects alternating name/value) or the first
/// offending call returns `Err` and leaves the buffer as it was before
/// that call. `Encoder` does not allow resuming after an error.
pub struct Encoder {
    buf: Vec<u8>,
    depth: DepthStack,
    limits: Limits,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Encoder {
            buf: Vec::with_capacity(capacity),
            depth: DepthStack::new(),
            limits: Limits::default(),
        }
    }

    pub fn with_limits(limits: Limits) -> Self {
        Encoder {
            buf: Vec::new(),
            depth: DepthStack::new(),
            limits,
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the encoder, returning the finished buffer.
    ///
    /// Callers that care whether the document is well-formed should call
    /// [`Encoder::end_all`] first; this does not check for open
    /// containers on its own.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the bytes written so far without consuming the encoder.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Check that the next token (a value, or a container-begin standing
    /// in for one) is valid in the current position: inside an object
    /// expecting a key, only a string is allowed.
    fn check_position(&self, is_string: bool) -> Result<()> {
        if let Some(ContainerKind::Object { expect_value }) = self.depth.top() {
            if !expect_value && !is_string {
                return Err(trace(Error::ExpectedObjectName {
                    byte_offset: self.buf.len(),
                }));
            }
        }
        Ok(())
    }

    fn put(&mut self, elem: Element<'_>) -> Result<()> {
        self.check_position(matches!(elem, Element::String(_)))?;
        serialize_elem(&elem, &mut self.buf);
        self.depth.toggle_object_expectation();
        Ok(())
    }

    pub fn encode_null(&mut self) -> Result<()> {
        self.put(Element::Null)
    }

    pub fn encode_bool(&mut self, v: bool) -> Result<()> {
        self.put(Element::Bool(v))
    }

    pub fn encode_i64(&mut self, v: i64) -> Result<()> {
        self.put(Element::Int(v))
    }

    pub fn encode_u64(&mut self, v: u64) -> Result<()> {
        self.put(Element::UInt(v))
    }

    /// Emit `v`, folding to the narrowest lossless representation: a
    /// whole-valued double (excluding negative zero) goes out as an
    /// integer, a double that survives an `f32` round trip goes out as
    /// `0xB0`, and anything else falls back to `0xB1`.
    pub fn encode_f64(&mut self, v: f64) -> Result<()> {
        if self.limits.reject_nan_infinity && !v.is_finite() {
            return Err(trace(Error::ValueOutOfRange {
                byte_offset: self.buf.len(),
                reason: "float is NaN or infinite",
            }));
        }
        if v.is_finite()
            && v.fract() == 0.0
            && !(v == 0.0 && v.is_sign_negative())
            && (i64::MIN as f64..=i64::MAX as f64).contains(&v)
        {
            return self.encode_i64(v as i64);
        }
        if v.is_finite() && (v as f32) as f64 == v {
            return self.put(Element::Float32(v as f32));
        }
        self.put(Element::Float64(v))
    }

    pub fn encode_bignum(&mut self, v: BigNumber) -> Result<()> {
        if v.significand_len() > self.limits.max_bignum_magnitude {
            return Err(trace(Error::ValueOutOfRange {
                byte_offset: self.buf.len(),
                reason: "big number magnitude exceeds the configured limit",
            }));
        }
        self.put(Element::BigNumber(v))
    }

    pub fn encode_str(&mut self, v: &str) -> Result<()> {
        if self.limits.reject_nul && v.as_bytes().contains(&0) {
            return Err(trace(Error::NulCharacter {
                byte_offset: self.buf.len(),
            }));
        }
        if v.len() > self.limits.max_string_length {
            return Err(trace(Error::MaxStringLengthExceeded {
                byte_offset: self.buf.len(),
                limit: self.limits.max_string_length,
            }));
        }
        self.put(Element::String(v))
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.check_position(false)?;
        let offset = self.buf.len();
        serialize_elem(&Element::ArrayBegin, &mut self.buf);
        self.depth
            .push(ContainerKind::Array, self.limits.max_depth, offset)
            .map_err(trace)?;
        Ok(())
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.check_position(false)?;
        let offset = self.buf.len();
        serialize_elem(&Element::ObjectBegin, &mut self.buf);
        self.depth
            .push(ContainerKind::Object { expect_value: false }, self.limits.max_depth, offset)
            .map_err(trace)?;
        Ok(())
    }

    /// Close the innermost open array or object.
    pub fn end_container(&mut self) -> Result<()> {
        let offset = self.buf.len();
        let kind = self.depth.pop(offset).map_err(trace)?;
        if let ContainerKind::Object { expect_value } = kind {
            if expect_value {
                return Err(trace(Error::ExpectedObjectValue { byte_offset: offset }));
            }
        }
        serialize_elem(&Element::ContainerEnd, &mut self.buf);
        self.depth.toggle_object_expectation();
        Ok(())
    }

    /// Close every container still open, innermost first.
    pub fn end_all(&mut self) -> Result<()> {
        while !self.depth.is_empty() {
            self.end_container()?;
        }
        Ok(())
    }

    /// Emit a typed array of signed integers: tag selected by
    /// [`crate::element::TypedArrayKind::Int64`]'s fixed 8-byte width, a
    /// ULEB128 count, then the raw little-endian elements.
    pub fn encode_i64_array(&mut self, values: &[i64]) -> Result<()> {
        self.check_position(false)?;
        if values.len() > self.limits.max_container_size {
            return Err(trace(Error::MaxContainerSizeExceeded {
                byte_offset: self.buf.len(),
                limit: self.limits.max_container_size,
            }));
        }
        self.buf.push(crate::tag::Tag::TypedArray(7).into_u8());
        crate::varint::uleb128_encode(values.len() as u64, &mut self.buf);
        for &v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self.depth.toggle_object_expectation();
        Ok(())
    }

    /// Emit a typed array of unsigned integers (`TypedArrayKind::UInt64`).
    pub fn encode_u64_array(&mut self, values: &[u64]) -> Result<()> {
        self.check_position(false)?;
        if values.len() > self.limits.max_container_size {
            return Err(trace(Error::MaxContainerSizeExceeded {
                byte_offset: self.buf.len(),
                limit: self.limits.max_container_size,
            }));
        }
        self.buf.push(crate::tag::Tag::TypedArray(3).into_u8());
        crate::varint::uleb128_encode(values.len() as u64, &mut self.buf);
        for &v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self.depth.toggle_object_expectation();
        Ok(())
    }

    /// Emit a typed array of doubles (`TypedArrayKind::Float64`).
    pub fn encode_f64_array(&mut self, values: &[f64]) -> Result<()> {
        self.check_position(false)?;
        if values.len() > self.limits.max_container_size {
            return Err(trace(Error::MaxContainerSizeExceeded {
                byte_offset: self.buf.len(),
                limit: self.limits.max_container_size,
            }));
        }
        self.buf.push(crate::tag::Tag::TypedArray(9).into_u8());
        crate::varint::uleb128_encode(values.len() as u64, &mut self.buf);
        for &v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self.depth.toggle_object_expectation();
        Ok(())
    }

    /// No dedicated typed-array tag exists for booleans; emit an ordinary
    /// array of `Bool` elements instead.
    pub fn encode_bool_array(&mut self, values: &[bool]) -> Result<()> {
        self.begin_array()?;
        for &v in values {
            self.encode_bool(v)?;
        }
        self.end_container()
    }

    /// No dedicated typed-array tag exists for strings; emit an ordinary
    /// array of `String` elements instead.
    pub fn encode_str_array(&mut self, values: &[&str]) -> Result<()> {
        self.begin_array()?;
        for &v in values {
            self.encode_str(v)?;
        }
        self.end_container()
    }

    /// Emit an entire [`Value`] tree, recursing into arrays and objects.
    pub fn encode_value(&mut self, v: &Value) -> Result<()> {
        match v {
            Value::Null => self.encode_null(),
            Value::Bool(b) => self.encode_bool(*b),
            Value::Int(i) => {
                if i.is_negative() {
                    self.encode_i64(i.as_i64().expect("NegInt always fits in i64"))
                } else {
                    self.encode_u64(i.as_u64().expect("PosInt always fits in u64"))
                }
            }
            Value::Float(f) => self.encode_f64(*f),
            Value::BigNumber(b) => self.encode_bignum(*b),
            Value::String(s) => self.encode_str(s),
            Value::Array(items) => {
                self.begin_array()?;
                for item in items {
                    self.encode_value(item)?;
                }
                self.end_container()
            }
            Value::Object(entries) => {
                self.begin_object()?;
                for (key, value) in entries {
                    self.encode_str(key)?;
                    self.encode_value(value)?;
                }
                self.end_container()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{Decoder, NullVisitor, Visitor};

    fn decode_roundtrip(buf: &[u8]) -> Vec<String> {
        #[derive(Default)]
        struct Recorder(Vec<String>);
        impl Visitor for Recorder {
            fn on_null(&mut self) -> Result<()> {
                self.0.push("null".into());
                Ok(())
            }
            fn on_bool(&mut self, v: bool) -> Result<()> {
                self.0.push(format!("bool({v})"));
                Ok(())
            }
            fn on_int(&mut self, v: i64) -> Result<()> {
                self.0.push(format!("int({v})"));
                Ok(())
            }
            fn on_uint(&mut self, v: u64) -> Result<()> {
                self.0.push(format!("uint({v})"));
                Ok(())
            }
            fn on_string(&mut self, v: &str) -> Result<()> {
                self.0.push(format!("str({v})"));
                Ok(())
            }
            fn on_begin_array(&mut self) -> Result<()> {
                self.0.push("[".into());
                Ok(())
            }
            fn on_begin_object(&mut self) -> Result<()> {
                self.0.push("{".into());
                Ok(())
            }
            fn on_end_container(&mut self) -> Result<()> {
                self.0.push("}".into());
                Ok(())
            }
        }
        let mut rec = Recorder::default();
        Decoder::new(buf).run(&mut rec).unwrap();
        rec.0
    }

    #[test]
    fn object_roundtrips_through_decoder() {
        let mut enc = Encoder::new();
        enc.begin_object().unwrap();
        enc.encode_str("a").unwrap();
        enc.encode_bool(true).unwrap();
        enc.encode_str("b").unwrap();
        enc.encode_null().unwrap();
        enc.end_container().unwrap();
        let buf = enc.into_inner();
        assert_eq!(
            decode_roundtrip(&buf),
            vec!["{", "str(a)", "bool(true)", "str(b)", "null", "}"]
        );
    }

    #[test]
    fn nested_array_roundtrips() {
        let mut enc = Encoder::new();
        enc.begin_array().unwrap();
        enc.encode_i64(-5).unwrap();
        enc.begin_array().unwrap();
        enc.encode_u64(7).unwrap();
        enc.end_container().unwrap();
        enc.end_container().unwrap();
        let buf = enc.into_inner();
        assert_eq!(decode_roundtrip(&buf), vec!["[", "int(-5)", "[", "int(7)", "}", "}"]);
    }

    #[test]
    fn ending_container_mid_value_rejected() {
        let mut enc = Encoder::new();
        enc.begin_object().unwrap();
        enc.encode_str("a").unwrap();
        assert!(matches!(
            enc.end_container(),
            Err(Error::ExpectedObjectValue { .. })
        ));
    }

    #[test]
    fn non_string_in_name_position_rejected() {
        let mut enc = Encoder::new();
        enc.begin_object().unwrap();
        assert!(matches!(
            enc.encode_bool(true),
            Err(Error::ExpectedObjectName { .. })
        ));
    }

    #[test]
    fn end_container_without_open_rejected() {
        let mut enc = Encoder::new();
        assert!(matches!(
            enc.end_container(),
            Err(Error::UnbalancedContainers { .. })
        ));
    }

    #[test]
    fn depth_limit_enforced() {
        let limits = Limits {
            max_depth: 1,
            ..Limits::default()
        };
        let mut enc = Encoder::with_limits(limits);
        enc.begin_array().unwrap();
        assert!(matches!(
            enc.begin_array(),
            Err(Error::DepthExceeded { .. })
        ));
    }

    #[test]
    fn i64_typed_array_decodes_as_plain_array() {
        let mut enc = Encoder::new();
        enc.encode_i64_array(&[1, -2, 3]).unwrap();
        let buf = enc.into_inner();
        assert_eq!(
            decode_roundtrip(&buf),
            vec!["[", "int(1)", "int(-2)", "int(3)", "}"]
        );
    }

    #[test]
    fn nul_byte_rejected_by_default() {
        let mut enc = Encoder::new();
        assert!(matches!(
            enc.encode_str("a\0b"),
            Err(Error::NulCharacter { .. })
        ));
    }

    #[test]
    fn nan_rejected_by_default() {
        let mut enc = Encoder::new();
        assert!(matches!(
            enc.encode_f64(f64::NAN),
            Err(Error::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn encode_value_round_trips_through_decode_value() {
        use crate::decode::decode_value;
        use crate::value::Value;

        let tree = Value::Object(vec![
            ("name".to_string(), Value::from("alice")),
            (
                "scores".to_string(),
                Value::Array(vec![Value::from(1u32), Value::from(-2i32), Value::Null]),
            ),
        ]);
        let mut enc = Encoder::new();
        enc.encode_value(&tree).unwrap();
        let decoded = decode_value(&enc.into_inner()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn end_all_closes_every_open_container() {
        let mut enc = Encoder::new();
        enc.begin_array().unwrap();
        enc.begin_object().unwrap();
        enc.encode_str("a").unwrap();
        enc.encode_null().unwrap();
        enc.end_all().unwrap();
        let buf = enc.into_inner();
        let mut rec = NullVisitor;
        Decoder::new(&buf).run(&mut rec).unwrap();
    }
}
