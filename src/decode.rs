//! Streaming, callback-style decoder: validates document structure
//! (balanced containers, object name/value alternation, duplicate keys,
//! trailing bytes) on top of [`crate::element::Parser`]'s raw tag dispatch.

use crate::bignum::BigNumber;
use crate::depth::{ContainerKind, DepthStack};
use crate::element::{Element, Parser};
use crate::error::{trace, Error, Result};
use crate::integer::Integer;
use crate::limits::Limits;
use crate::value::Value;

/// Receives decode events in document order.
///
/// One method per event, mirroring the conceptual callback table: a
/// `Visitor` can abort the scan early by returning `Err` from any method.
pub trait Visitor {
    fn on_null(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_bool(&mut self, _v: bool) -> Result<()> {
        Ok(())
    }
    fn on_int(&mut self, _v: i64) -> Result<()> {
        Ok(())
    }
    fn on_uint(&mut self, _v: u64) -> Result<()> {
        Ok(())
    }
    fn on_float(&mut self, _v: f64) -> Result<()> {
        Ok(())
    }
    fn on_bignumber(&mut self, _v: BigNumber) -> Result<()> {
        Ok(())
    }
    fn on_string(&mut self, _v: &str) -> Result<()> {
        Ok(())
    }
    fn on_begin_array(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_begin_object(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_end_container(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_end_data(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A no-op [`Visitor`], useful for exercising the decoder's structural
/// validation alone (the fuzz targets drive the decoder this way).
#[derive(Default)]
pub struct NullVisitor;

impl Visitor for NullVisitor {}

/// Single-pass structural decoder, driven by callbacks.
pub struct Decoder<'a> {
    parser: Parser<'a>,
    limits: Limits,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_limits(input, Limits::default())
    }

    pub fn with_limits(input: &'a [u8], limits: Limits) -> Self {
        Decoder {
            parser: Parser::with_limits(input, limits.clone()),
            limits,
        }
    }

    /// Run the scan to completion, driving `visitor`.
    ///
    /// Returns the number of input bytes consumed. Record definitions are
    /// recognized and expanded but not forwarded to the visitor as objects
    /// themselves (they have no value until instantiated); record
    /// instances are forwarded as an ordinary `on_begin_object` /
    /// key+value / `on_end_container` sequence.
    pub fn run(&mut self, visitor: &mut dyn Visitor) -> Result<usize> {
        if self.parser.input().len() > self.limits.max_document_size {
            return Err(trace(Error::MaxDocumentSizeExceeded {
                limit: self.limits.max_document_size,
            }));
        }
        let mut depth = DepthStack::new();
        let mut records: Vec<Vec<String>> = Vec::new();
        // Stack of (definition keys, next key index, values collected) for
        // record instances currently being expanded.
        let mut record_instance: Option<(Vec<String>, usize)> = None;
        let mut record_definition: Option<Vec<String>> = None;
        // One entry per currently-open object, holding the keys seen so far.
        // Only populated when `reject_duplicate_keys` is enabled.
        let mut object_keys: Vec<Vec<String>> = Vec::new();

        loop {
            let offset = self.parser.position();
            let item = match self.parser.next() {
                Some(item) => item,
                None => break,
            };
            let elem = item.map_err(trace)?;

            if let Some(keys) = record_definition.as_mut() {
                match elem {
                    Element::String(s) => {
                        keys.push(s.to_string());
                        continue;
                    }
                    Element::ContainerEnd => {
                        records.push(record_definition.take().unwrap());
                        continue;
                    }
                    _ => {
                        return Err(trace(Error::InvalidData {
                            byte_offset: offset,
                            reason: "record definition must contain only string keys",
                        }))
                    }
                }
            }

            if let Some((keys, next)) = record_instance.as_mut() {
                if matches!(elem, Element::ContainerEnd) {
                    // Pad missing trailing values with null.
                    while *next < keys.len() {
                        visitor.on_string(&keys[*next]).map_err(trace)?;
                        visitor.on_null().map_err(trace)?;
                        *next += 1;
                    }
                    visitor.on_end_container().map_err(trace)?;
                    depth.pop(offset).map_err(trace)?;
                    if self.limits.reject_duplicate_keys {
                        object_keys.pop();
                    }
                    record_instance = None;
                    continue;
                }
                if *next >= keys.len() {
                    return Err(trace(Error::InvalidData {
                        byte_offset: offset,
                        reason: "record instance has more values than its definition has keys",
                    }));
                }
                let key = keys[*next].clone();
                *next += 1;
                visitor.on_string(&key).map_err(trace)?;
                depth.toggle_object_expectation();
                self.dispatch_value(elem, offset, visitor, &mut depth, &mut object_keys)?;
                continue;
            }

            match elem {
                Element::RecordDefinitionBegin => {
                    record_definition = Some(Vec::new());
                }
                Element::RecordInstanceBegin(index) => {
                    let keys = records.get(index as usize).ok_or(Error::InvalidData {
                        byte_offset: offset,
                        reason: "record instance references an undefined record",
                    })?;
                    visitor.on_begin_object().map_err(trace)?;
                    depth
                        .push(ContainerKind::Object { expect_value: false }, self.limits.max_depth, offset)
                        .map_err(trace)?;
                    if self.limits.reject_duplicate_keys {
                        object_keys.push(Vec::new());
                    }
                    record_instance = Some((keys.clone(), 0));
                }
                _ => self.dispatch_value(elem, offset, visitor, &mut depth, &mut object_keys)?,
            }
        }

        if !depth.is_empty() {
            return Err(trace(Error::UnclosedContainers {
                byte_offset: self.parser.position(),
                depth: depth.depth(),
            }));
        }
        if record_definition.is_some() {
            return Err(trace(Error::UnclosedContainers {
                byte_offset: self.parser.position(),
                depth: 1,
            }));
        }

        let consumed = self.parser.position();
        if self.limits.reject_trailing_bytes && consumed != self.parser.input().len() {
            return Err(trace(Error::TrailingBytes { byte_offset: consumed }));
        }
        visitor.on_end_data().map_err(trace)?;
        Ok(consumed)
    }

    /// Dispatch a single value-position element, enforcing object
    /// name/value alternation and container depth.
    fn dispatch_value(
        &mut self,
        elem: Element<'a>,
        offset: usize,
        visitor: &mut dyn Visitor,
        depth: &mut DepthStack,
        object_keys: &mut Vec<Vec<String>>,
    ) -> Result<()> {
        // Enforce name/value alternation for the current object, if any.
        let mut is_name = false;
        if let Some(ContainerKind::Object { expect_value }) = depth.top() {
            let is_string = matches!(elem, Element::String(_));
            let is_end = matches!(elem, Element::ContainerEnd);
            if !expect_value && !is_string && !is_end {
                return Err(trace(Error::ExpectedObjectName { byte_offset: offset }));
            }
            if expect_value && is_end {
                return Err(trace(Error::ExpectedObjectValue { byte_offset: offset }));
            }
            is_name = !expect_value && is_string;
        }

        if is_name {
            if let Element::String(s) = elem {
                if self.limits.reject_duplicate_keys {
                    if let Some(seen) = object_keys.last_mut() {
                        if seen.iter().any(|k| k == s) {
                            return Err(trace(Error::DuplicateObjectName {
                                byte_offset: offset,
                                key: s.to_string(),
                            }));
                        }
                        seen.push(s.to_string());
                    }
                }
            }
        }

        match elem {
            Element::Null => {
                visitor.on_null().map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::Bool(v) => {
                visitor.on_bool(v).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::UInt(v) => {
                visitor.on_uint(v).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::Int(v) => {
                visitor.on_int(v).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::Float32(v) => {
                visitor.on_float(v as f64).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::Float64(v) => {
                visitor.on_float(v).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::BigNumber(v) => {
                visitor.on_bignumber(v).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::String(s) => {
                visitor.on_string(s).map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::ArrayBegin => {
                visitor.on_begin_array().map_err(trace)?;
                depth
                    .push(ContainerKind::Array, self.limits.max_depth, offset)
                    .map_err(trace)?;
            }
            Element::ObjectBegin => {
                visitor.on_begin_object().map_err(trace)?;
                depth
                    .push(ContainerKind::Object { expect_value: false }, self.limits.max_depth, offset)
                    .map_err(trace)?;
                if self.limits.reject_duplicate_keys {
                    object_keys.push(Vec::new());
                }
            }
            Element::TypedArrayBegin(_kind) => {
                visitor.on_begin_array().map_err(trace)?;
                depth
                    .push(ContainerKind::Array, self.limits.max_depth, offset)
                    .map_err(trace)?;
            }
            Element::ContainerEnd => {
                let kind = depth.pop(offset).map_err(trace)?;
                if let ContainerKind::Object { expect_value } = kind {
                    if expect_value {
                        return Err(trace(Error::ExpectedObjectValue { byte_offset: offset }));
                    }
                    if self.limits.reject_duplicate_keys {
                        object_keys.pop();
                    }
                }
                visitor.on_end_container().map_err(trace)?;
                depth.toggle_object_expectation();
            }
            Element::RecordDefinitionBegin | Element::RecordInstanceBegin(_) => unreachable!(
                "record begin markers are handled by the caller before dispatch_value is called"
            ),
        }
        Ok(())
    }
}

/// Build a [`Value`] tree from one document, the way [`NullVisitor`]
/// exercises the decoder's structure alone: a `Visitor` that accumulates
/// into an owned tree instead of discarding or forwarding events.
///
/// One open array/object at a time is tracked as a `Frame`; closing a
/// container pops its frame and attaches the finished value to its
/// parent, or becomes the completed root if none remains.
enum Frame {
    Array(Vec<Value>),
    Object(Vec<(String, Value)>, Option<String>),
}

#[derive(Default)]
struct TreeVisitor {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl TreeVisitor {
    fn push_value(&mut self, v: Value) -> Result<()> {
        match self.stack.last_mut() {
            None => self.root = Some(v),
            Some(Frame::Array(items)) => items.push(v),
            Some(Frame::Object(entries, pending_key)) => match pending_key.take() {
                Some(key) => entries.push((key, v)),
                None => {
                    let key = match v {
                        Value::String(s) => s,
                        _ => unreachable!("Decoder::run only sends strings in name position"),
                    };
                    *pending_key = Some(key);
                }
            },
        }
        Ok(())
    }
}

impl Visitor for TreeVisitor {
    fn on_null(&mut self) -> Result<()> {
        self.push_value(Value::Null)
    }
    fn on_bool(&mut self, v: bool) -> Result<()> {
        self.push_value(Value::Bool(v))
    }
    fn on_int(&mut self, v: i64) -> Result<()> {
        self.push_value(Value::Int(Integer::from(v)))
    }
    fn on_uint(&mut self, v: u64) -> Result<()> {
        self.push_value(Value::Int(Integer::from(v)))
    }
    fn on_float(&mut self, v: f64) -> Result<()> {
        self.push_value(Value::Float(v))
    }
    fn on_bignumber(&mut self, v: BigNumber) -> Result<()> {
        self.push_value(Value::BigNumber(v))
    }
    fn on_string(&mut self, v: &str) -> Result<()> {
        self.push_value(Value::String(v.to_string()))
    }
    fn on_begin_array(&mut self) -> Result<()> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }
    fn on_begin_object(&mut self) -> Result<()> {
        self.stack.push(Frame::Object(Vec::new(), None));
        Ok(())
    }
    fn on_end_container(&mut self) -> Result<()> {
        let finished = match self.stack.pop() {
            Some(Frame::Array(items)) => Value::Array(items),
            Some(Frame::Object(entries, _)) => Value::Object(entries),
            None => {
                return Err(trace(Error::UnbalancedContainers {
                    byte_offset: 0,
                }))
            }
        };
        self.push_value(finished)
    }
}

/// Decode a complete document into an owned [`Value`] tree.
pub fn decode_value(input: &[u8]) -> Result<Value> {
    decode_value_with_limits(input, Limits::default())
}

/// Decode a complete document into an owned [`Value`] tree, under custom
/// [`Limits`].
pub fn decode_value_with_limits(input: &[u8], limits: Limits) -> Result<Value> {
    let mut tree = TreeVisitor::default();
    Decoder::with_limits(input, limits).run(&mut tree)?;
    tree.root
        .ok_or(Error::Incomplete { byte_offset: input.len() })
}

#[cfg(test)]
mod test {
    use super::*;

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

    #[test]
    fn literal_scenario_3_object() {
        let input = [0xB8u8, 0x66, b'a', 0xB5, 0x66, b'b', 0xB3, 0xB6];
        let mut rec = Recorder::default();
        let consumed = Decoder::new(&input).run(&mut rec).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(
            rec.0,
            vec!["{", "str(a)", "bool(true)", "str(b)", "null", "}"]
        );
    }

    #[test]
    fn literal_scenario_7_duplicate_keys_rejected_by_default() {
        let input = [0xB8u8, 0x66, b'k', 0xB3, 0x66, b'k', 0xB3, 0xB6];
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::new(&input).run(&mut rec),
            Err(Error::DuplicateObjectName { .. })
        ));
    }

    #[test]
    fn duplicate_keys_allowed_when_policy_disabled() {
        let input = [0xB8u8, 0x66, b'k', 0xB3, 0x66, b'k', 0xB3, 0xB6];
        let limits = Limits {
            reject_duplicate_keys: false,
            ..Limits::default()
        };
        let mut rec = Recorder::default();
        Decoder::with_limits(&input, limits).run(&mut rec).unwrap();
    }

    #[test]
    fn trailing_bytes_rejected_by_default() {
        let input = [0xB3u8, 0xB3];
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::new(&input).run(&mut rec),
            Err(Error::TrailingBytes { .. })
        ));
    }

    #[test]
    fn unclosed_container_rejected() {
        let input = [0xB7u8, 0xB3];
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::new(&input).run(&mut rec),
            Err(Error::UnclosedContainers { .. })
        ));
    }

    #[test]
    fn unbalanced_container_rejected() {
        let input = [0xB6u8];
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::new(&input).run(&mut rec),
            Err(Error::UnbalancedContainers { .. })
        ));
    }

    #[test]
    fn object_expecting_name_rejects_non_string() {
        let input = [0xB8u8, 0xB3, 0xB6];
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::new(&input).run(&mut rec),
            Err(Error::ExpectedObjectName { .. })
        ));
    }

    #[test]
    fn object_ending_mid_value_rejected() {
        let input = [0xB8u8, 0x66, b'a', 0xB6];
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::new(&input).run(&mut rec),
            Err(Error::ExpectedObjectValue { .. })
        ));
    }

    #[test]
    fn depth_limit_enforced() {
        let mut input = vec![0xB7u8; 2];
        input.push(0xB3);
        let limits = Limits {
            max_depth: 1,
            ..Limits::default()
        };
        let mut rec = Recorder::default();
        assert!(matches!(
            Decoder::with_limits(&input, limits).run(&mut rec),
            Err(Error::DepthExceeded { .. })
        ));
    }

    #[test]
    fn typed_array_decodes_as_array() {
        let mut input = vec![0xF5u8]; // UInt8 typed array
        crate::varint::uleb128_encode(2, &mut input);
        input.extend_from_slice(&[7, 8]);
        let mut rec = Recorder::default();
        Decoder::new(&input).run(&mut rec).unwrap();
        assert_eq!(rec.0, vec!["[", "uint(7)", "uint(8)", "}"]);
    }

    #[test]
    fn decode_value_builds_nested_tree() {
        // {"a": [1, true, null]}
        let input = [
            0xB8u8, 0x66, b'a', 0xB7, 0x01, 0xB5, 0xB3, 0xB6, 0xB6,
        ];
        let v = decode_value(&input).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj[0].0, "a");
        let arr = obj[0].1.as_array().unwrap();
        assert_eq!(arr[0].as_int().unwrap().as_u64(), Some(1));
        assert_eq!(arr[1].as_bool(), Some(true));
        assert!(arr[2].is_null());
    }

    #[test]
    fn decode_value_scalar_document() {
        let input = [0xB4u8];
        let v = decode_value(&input).unwrap();
        assert_eq!(v.as_bool(), Some(false));
    }

    #[test]
    fn record_instance_pads_missing_values_with_null() {
        // Record definition: ["a", "b"]
        let mut input = vec![0xB9u8, 0x66, b'a', 0x66, b'b', 0xB6];
        // Record instance referencing definition 0, with only one value.
        input.push(0xBA);
        crate::varint::uleb128_encode(0, &mut input);
        input.push(0xB5); // true
        input.push(0xB6);
        let mut rec = Recorder::default();
        Decoder::new(&input).run(&mut rec).unwrap();
        assert_eq!(
            rec.0,
            vec!["{", "str(a)", "bool(true)", "str(b)", "null", "}"]
        );
    }
}
