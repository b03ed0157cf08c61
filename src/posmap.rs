//! Random-access decoder: scans a document once into a flat array of
//! typed entries, then answers navigation queries by indexing instead of
//! re-parsing.

use crate::bignum::BigNumber;
use crate::depth::{ContainerKind, DepthStack};
use crate::element::{Element, Parser};
use crate::error::{trace, Error, Result};
use crate::limits::Limits;

/// Which value kind a position-map [`Entry`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Null,
    False,
    True,
    Int,
    UInt,
    Float,
    BigNumber,
    String,
    Array,
    Object,
}

/// An entry's value, chosen by its [`Kind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    None,
    Int(i64),
    UInt(u64),
    Float(f64),
    BigNumber(BigNumber),
    /// Offset and length of a string's bytes within the scanned input.
    Str { offset: u32, len: u32 },
    /// Index of the first child entry, and the number of direct children
    /// (for objects, counted per key/value pair slot, so it's even).
    Container { first_child: u32, child_count: u32 },
}

/// One fixed-size record in the flat position map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
    pub kind: Kind,
    /// Entries occupied by this value and its descendants; 1 for scalars.
    pub subtree_size: u32,
    pub payload: Payload,
}

/// A record definition's keys, stored as a contiguous run of `String`
/// entries starting at `first_key_index`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct RecordDef {
    first_key_index: u32,
    key_count: u32,
}

/// A single open container frame during the scan.
struct Frame {
    entry_index: usize,
    child_count: u32,
}

/// The result of a single-pass scan: a flat, depth-first pre-order array
/// of entries plus a navigation index, zero-copy over `input` for
/// strings.
pub struct PosMap<'a> {
    input: &'a [u8],
    entries: Vec<Entry>,
    records: Vec<RecordDef>,
    root: usize,
}

impl<'a> PosMap<'a> {
    /// Scan `input` into a position map, applying `limits`.
    pub fn scan(input: &'a [u8], limits: Limits) -> Result<PosMap<'a>> {
        if input.len() > limits.max_document_size {
            return Err(trace(Error::MaxDocumentSizeExceeded {
                limit: limits.max_document_size,
            }));
        }
        let mut scanner = Scanner {
            parser: Parser::with_limits(input, limits.clone()),
            input,
            limits,
            entries: Vec::new(),
            records: Vec::new(),
            depth: DepthStack::new(),
            frames: Vec::new(),
            root: None,
            object_keys: Vec::new(),
        };
        scanner.run()?;
        Ok(PosMap {
            input,
            entries: scanner.entries,
            records: scanner.records,
            root: scanner.root.unwrap_or(0),
        })
    }

    /// Index of the document's top-level value (after any record
    /// definitions).
    pub fn root(&self) -> usize {
        self.root
    }

    /// Number of entries in the map.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// `O(1)` lookup by entry index.
    pub fn get(&self, i: usize) -> Option<&Entry> {
        self.entries.get(i)
    }

    /// The `k`-th direct child of a container entry, `O(k)` amortized
    /// (`O(1)` for arrays of scalars since each subtree size is 1).
    pub fn get_child(&self, container: usize, k: usize) -> Option<usize> {
        let entry = self.entries.get(container)?;
        let Payload::Container { first_child, child_count } = entry.payload else {
            return None;
        };
        if k as u32 >= child_count {
            return None;
        }
        let mut idx = first_child as usize;
        let mut remaining = k;
        while remaining > 0 {
            idx += self.entries[idx].subtree_size as usize;
            remaining -= 1;
        }
        Some(idx)
    }

    /// Borrow a string entry's bytes as `&str`.
    pub fn get_string(&self, i: usize) -> Option<&'a str> {
        let entry = self.entries.get(i)?;
        let Payload::Str { offset, len } = entry.payload else {
            return None;
        };
        std::str::from_utf8(&self.input[offset as usize..offset as usize + len as usize]).ok()
    }

    /// Walk an object's key/value pairs in order, returning the value
    /// entry index for the first key that byte-compares equal to `key`.
    pub fn find_key(&self, object: usize, key: &str) -> Option<usize> {
        let entry = self.entries.get(object)?;
        let Payload::Container { first_child, child_count } = entry.payload else {
            return None;
        };
        let mut idx = first_child as usize;
        let mut i = 0;
        while i < child_count {
            if self.get_string(idx) == Some(key) {
                let value_idx = idx + self.entries[idx].subtree_size as usize;
                return Some(value_idx);
            }
            idx += self.entries[idx].subtree_size as usize;
            idx += self.entries[idx].subtree_size as usize;
            i += 2;
        }
        None
    }

    fn scalar_children(&self, container: usize) -> Option<(usize, usize)> {
        let entry = self.entries.get(container)?;
        let Payload::Container { first_child, child_count } = entry.payload else {
            return None;
        };
        Some((first_child as usize, child_count as usize))
    }

    /// Fill `out` with an array's scalar children widened to `i64`.
    /// Lossy: floats truncate toward zero, big numbers take the low 8
    /// bytes of their magnitude times `10^exponent`.
    pub fn decode_i64_array(&self, container: usize, out: &mut Vec<i64>) -> Result<()> {
        let (first, count) = self
            .scalar_children(container)
            .ok_or(Error::InvalidData { byte_offset: 0, reason: "not a container" })?;
        out.clear();
        out.reserve(count);
        let mut idx = first;
        for _ in 0..count {
            let e = &self.entries[idx];
            out.push(match e.payload {
                Payload::Int(v) => v,
                Payload::UInt(v) => v as i64,
                Payload::Float(v) => v as i64,
                Payload::BigNumber(b) => (b.sign as i64) * (b.significand as i64) * 10i64.pow(b.exponent.clamp(0, 18) as u32),
                Payload::None if e.kind == Kind::False => 0,
                Payload::None if e.kind == Kind::True => 1,
                _ => return Err(Error::InvalidData { byte_offset: 0, reason: "non-scalar element in typed extraction" }),
            });
            idx += e.subtree_size as usize;
        }
        Ok(())
    }

    /// Fill `out` with an array's scalar children widened to `u64`.
    pub fn decode_u64_array(&self, container: usize, out: &mut Vec<u64>) -> Result<()> {
        let mut tmp = Vec::new();
        self.decode_i64_array(container, &mut tmp)?;
        out.clear();
        out.extend(tmp.into_iter().map(|v| v as u64));
        Ok(())
    }

    /// Fill `out` with an array's scalar children widened to `f64`.
    pub fn decode_double_array(&self, container: usize, out: &mut Vec<f64>) -> Result<()> {
        let (first, count) = self
            .scalar_children(container)
            .ok_or(Error::InvalidData { byte_offset: 0, reason: "not a container" })?;
        out.clear();
        out.reserve(count);
        let mut idx = first;
        for _ in 0..count {
            let e = &self.entries[idx];
            out.push(match e.payload {
                Payload::Int(v) => v as f64,
                Payload::UInt(v) => v as f64,
                Payload::Float(v) => v,
                Payload::BigNumber(b) => b.to_f64(),
                Payload::None if e.kind == Kind::False => 0.0,
                Payload::None if e.kind == Kind::True => 1.0,
                _ => return Err(Error::InvalidData { byte_offset: 0, reason: "non-scalar element in typed extraction" }),
            });
            idx += e.subtree_size as usize;
        }
        Ok(())
    }

    /// Fill `out` with an array's boolean children.
    pub fn decode_bool_array(&self, container: usize, out: &mut Vec<bool>) -> Result<()> {
        let (first, count) = self
            .scalar_children(container)
            .ok_or(Error::InvalidData { byte_offset: 0, reason: "not a container" })?;
        out.clear();
        out.reserve(count);
        let mut idx = first;
        for _ in 0..count {
            let e = &self.entries[idx];
            out.push(match e.kind {
                Kind::True => true,
                Kind::False => false,
                Kind::Int => matches!(e.payload, Payload::Int(v) if v != 0),
                Kind::UInt => matches!(e.payload, Payload::UInt(v) if v != 0),
                _ => return Err(Error::InvalidData { byte_offset: 0, reason: "non-boolean element in typed extraction" }),
            });
            idx += e.subtree_size as usize;
        }
        Ok(())
    }

    /// Fill `out` with an array's string children.
    pub fn decode_string_array(&self, container: usize, out: &mut Vec<&'a str>) -> Result<()> {
        let (first, count) = self
            .scalar_children(container)
            .ok_or(Error::InvalidData { byte_offset: 0, reason: "not a container" })?;
        out.clear();
        out.reserve(count);
        let mut idx = first;
        for _ in 0..count {
            out.push(
                self.get_string(idx)
                    .ok_or(Error::InvalidData { byte_offset: 0, reason: "non-string element in typed extraction" })?,
            );
            idx += self.entries[idx].subtree_size as usize;
        }
        Ok(())
    }
}

/// Scratch state for a single [`PosMap::scan`] call.
struct Scanner<'a> {
    parser: Parser<'a>,
    input: &'a [u8],
    limits: Limits,
    entries: Vec<Entry>,
    records: Vec<RecordDef>,
    depth: DepthStack,
    frames: Vec<Frame>,
    root: Option<usize>,
    /// Only populated when `reject_duplicate_keys` is enabled.
    object_keys: Vec<Vec<String>>,
}

impl<'a> Scanner<'a> {
    fn str_offset_len(&self, s: &'a str) -> (u32, u32) {
        let offset = s.as_ptr() as usize - self.input.as_ptr() as usize;
        (offset as u32, s.len() as u32)
    }

    fn push_entry(&mut self, kind: Kind, subtree_size: u32, payload: Payload) -> usize {
        let idx = self.entries.len();
        self.entries.push(Entry { kind, subtree_size, payload });
        if self.root.is_none() && self.frames.is_empty() {
            self.root = Some(idx);
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.child_count += 1;
        }
        idx
    }

    fn run(&mut self) -> Result<()> {
        let mut record_definition: Option<Vec<usize>> = None;
        let mut record_instance: Option<(Vec<(u32, u32)>, usize)> = None;

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
                        let (o, l) = self.str_offset_len(s);
                        let idx = self.entries.len();
                        self.entries.push(Entry {
                            kind: Kind::String,
                            subtree_size: 1,
                            payload: Payload::Str { offset: o, len: l },
                        });
                        keys.push(idx);
                        continue;
                    }
                    Element::ContainerEnd => {
                        if self.records.len() >= self.limits.max_record_defs {
                            return Err(trace(Error::TooManyKeys { byte_offset: offset }));
                        }
                        let keys = record_definition.take().unwrap();
                        let first_key_index = keys.first().copied().unwrap_or(self.entries.len()) as u32;
                        self.records.push(RecordDef { first_key_index, key_count: keys.len() as u32 });
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
                    while *next < keys.len() {
                        let (o, l) = keys[*next];
                        self.push_entry(Kind::String, 1, Payload::Str { offset: o, len: l });
                        self.push_entry(Kind::Null, 1, Payload::None);
                        *next += 1;
                    }
                    self.finish_container(offset)?;
                    record_instance = None;
                    continue;
                }
                if *next >= keys.len() {
                    return Err(trace(Error::InvalidData {
                        byte_offset: offset,
                        reason: "record instance has more values than its definition has keys",
                    }));
                }
                let (o, l) = keys[*next];
                *next += 1;
                self.push_entry(Kind::String, 1, Payload::Str { offset: o, len: l });
                self.depth.toggle_object_expectation();
                self.append_value(elem, offset)?;
                continue;
            }

            match elem {
                Element::RecordDefinitionBegin => {
                    record_definition = Some(Vec::new());
                }
                Element::RecordInstanceBegin(index) => {
                    let def = *self
                        .records
                        .get(index as usize)
                        .ok_or(Error::InvalidData { byte_offset: offset, reason: "record instance references an undefined record" })?;
                    let key_pairs: Vec<(u32, u32)> = (0..def.key_count)
                        .map(|i| {
                            let e = &self.entries[(def.first_key_index + i) as usize];
                            match e.payload {
                                Payload::Str { offset, len } => (offset, len),
                                _ => unreachable!("record definition keys are always strings"),
                            }
                        })
                        .collect();
                    self.open_container(Kind::Object, ContainerKind::Object { expect_value: false }, offset)?;
                    record_instance = Some((key_pairs, 0));
                }
                _ => self.append_value(elem, offset)?,
            }
        }

        if !self.depth.is_empty() {
            return Err(trace(Error::UnclosedContainers {
                byte_offset: self.parser.position(),
                depth: self.depth.depth(),
            }));
        }
        if record_definition.is_some() {
            return Err(trace(Error::UnclosedContainers { byte_offset: self.parser.position(), depth: 1 }));
        }

        let consumed = self.parser.position();
        if self.limits.reject_trailing_bytes && consumed != self.input.len() {
            return Err(trace(Error::TrailingBytes { byte_offset: consumed }));
        }
        Ok(())
    }

    fn open_container(&mut self, kind: Kind, container_kind: ContainerKind, offset: usize) -> Result<usize> {
        let idx = self.push_entry(kind, 0, Payload::Container { first_child: 0, child_count: 0 });
        self.depth.push(container_kind, self.limits.max_depth, offset).map_err(trace)?;
        self.frames.push(Frame { entry_index: idx, child_count: 0 });
        if self.limits.reject_duplicate_keys && matches!(container_kind, ContainerKind::Object { .. }) {
            self.object_keys.push(Vec::new());
        }
        Ok(idx)
    }

    fn finish_container(&mut self, offset: usize) -> Result<()> {
        let kind = self.depth.pop(offset).map_err(trace)?;
        if let ContainerKind::Object { expect_value } = kind {
            if expect_value {
                return Err(trace(Error::ExpectedObjectValue { byte_offset: offset }));
            }
            if self.limits.reject_duplicate_keys {
                self.object_keys.pop();
            }
        }
        let frame = self.frames.pop().expect("frame stack matches depth stack");
        let first_child = frame.entry_index + 1;
        let subtree_size = (self.entries.len() - frame.entry_index) as u32;
        let entry = &mut self.entries[frame.entry_index];
        entry.subtree_size = subtree_size;
        entry.payload = Payload::Container { first_child: first_child as u32, child_count: frame.child_count };
        self.depth.toggle_object_expectation();
        Ok(())
    }

    /// Append a value-position element, enforcing object name/value
    /// alternation and container depth, mirroring
    /// [`crate::decode::Decoder::dispatch_value`].
    fn append_value(&mut self, elem: Element<'a>, offset: usize) -> Result<()> {
        let mut is_name = false;
        if let Some(ContainerKind::Object { expect_value }) = self.depth.top() {
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
                    if let Some(seen) = self.object_keys.last_mut() {
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
                self.push_entry(Kind::Null, 1, Payload::None);
                self.depth.toggle_object_expectation();
            }
            Element::Bool(false) => {
                self.push_entry(Kind::False, 1, Payload::None);
                self.depth.toggle_object_expectation();
            }
            Element::Bool(true) => {
                self.push_entry(Kind::True, 1, Payload::None);
                self.depth.toggle_object_expectation();
            }
            Element::UInt(v) => {
                self.push_entry(Kind::UInt, 1, Payload::UInt(v));
                self.depth.toggle_object_expectation();
            }
            Element::Int(v) => {
                self.push_entry(Kind::Int, 1, Payload::Int(v));
                self.depth.toggle_object_expectation();
            }
            Element::Float32(v) => {
                self.push_entry(Kind::Float, 1, Payload::Float(v as f64));
                self.depth.toggle_object_expectation();
            }
            Element::Float64(v) => {
                self.push_entry(Kind::Float, 1, Payload::Float(v));
                self.depth.toggle_object_expectation();
            }
            Element::BigNumber(v) => {
                self.push_entry(Kind::BigNumber, 1, Payload::BigNumber(v));
                self.depth.toggle_object_expectation();
            }
            Element::String(s) => {
                let (o, l) = self.str_offset_len(s);
                self.push_entry(Kind::String, 1, Payload::Str { offset: o, len: l });
                self.depth.toggle_object_expectation();
            }
            Element::ArrayBegin | Element::TypedArrayBegin(_) => {
                self.open_container(Kind::Array, ContainerKind::Array, offset)?;
            }
            Element::ObjectBegin => {
                self.open_container(Kind::Object, ContainerKind::Object { expect_value: false }, offset)?;
            }
            Element::ContainerEnd => {
                self.finish_container(offset)?;
            }
            Element::RecordDefinitionBegin | Element::RecordInstanceBegin(_) => {
                unreachable!("record begin markers are handled by the caller before append_value is called")
            }
        }
        Ok(())
    }
}
