//! Owned and borrowed tree representations of a decoded BONJSON document.

use crate::bignum::BigNumber;
use crate::integer::Integer;

/// An owned BONJSON value tree.
///
/// Objects preserve document order rather than sorting by key: BONJSON
/// explicitly leaves canonical key ordering out of scope, so nothing here
/// should assume or enforce one.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(Integer),
    Float(f64),
    BigNumber(BigNumber),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(v.as_f64()),
            Value::BigNumber(v) => Some(v.to_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Look up a key in an object value by linear scan. Returns `None` for
    /// non-object values or a missing key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Borrow this value as a [`ValueRef`].
    pub fn as_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Null => ValueRef::Null,
            Value::Bool(v) => ValueRef::Bool(*v),
            Value::Int(v) => ValueRef::Int(*v),
            Value::Float(v) => ValueRef::Float(*v),
            Value::BigNumber(v) => ValueRef::BigNumber(*v),
            Value::String(v) => ValueRef::String(v.as_str()),
            Value::Array(v) => ValueRef::Array(v),
            Value::Object(v) => ValueRef::Object(v),
        }
    }
}

macro_rules! impl_from_int {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(Integer::from(v))
            }
        }
    };
}

impl_from_int!(u8);
impl_from_int!(u16);
impl_from_int!(u32);
impl_from_int!(u64);
impl_from_int!(i8);
impl_from_int!(i16);
impl_from_int!(i32);
impl_from_int!(i64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A borrowed BONJSON value tree, zero-copy over the decoder's input
/// buffer for strings.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueRef<'a> {
    Null,
    Bool(bool),
    Int(Integer),
    Float(f64),
    BigNumber(BigNumber),
    String(&'a str),
    Array(&'a [Value]),
    Object(&'a [(String, Value)]),
}

impl<'a> ValueRef<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, ValueRef::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ValueRef::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            ValueRef::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_owned(&self) -> Value {
        match self {
            ValueRef::Null => Value::Null,
            ValueRef::Bool(v) => Value::Bool(*v),
            ValueRef::Int(v) => Value::Int(*v),
            ValueRef::Float(v) => Value::Float(*v),
            ValueRef::BigNumber(v) => Value::BigNumber(*v),
            ValueRef::String(v) => Value::String(v.to_string()),
            ValueRef::Array(v) => Value::Array((*v).to_vec()),
            ValueRef::Object(v) => Value::Object((*v).to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_get_finds_key_preserving_order() {
        let v = Value::Object(vec![
            ("b".to_string(), Value::from(1u32)),
            ("a".to_string(), Value::from(2u32)),
        ]);
        assert_eq!(v.get("a").and_then(Value::as_int).unwrap().as_u64(), Some(2));
        assert_eq!(
            v.as_object().unwrap()[0].0,
            "b",
            "insertion order must survive, not sorted order"
        );
    }

    #[test]
    fn as_f64_widens_int_and_bignum() {
        assert_eq!(Value::from(5i64).as_f64(), Some(5.0));
        assert_eq!(
            Value::BigNumber(BigNumber::new(1, 5, 1)).as_f64(),
            Some(50.0)
        );
    }

    #[test]
    fn as_ref_round_trips() {
        let v = Value::String("hi".to_string());
        assert_eq!(v.as_ref().as_str(), Some("hi"));
        assert_eq!(v.as_ref().to_owned(), v);
    }
}
