//! BONJSON: a binary wire format semantically equivalent to JSON, encoded
//! as a compact, type-tagged byte stream.
//!
//! Two decoders are provided over the same tag dispatch
//! ([`element::Parser`]): a callback-driven streaming [`decode::Decoder`]
//! and a random-access [`posmap::PosMap`] that materializes a flat index
//! of every value in one scan. [`encode::Encoder`] builds documents.

mod bignum;
mod depth;
mod element;
mod error;
mod integer;
mod limits;
mod simd;
mod tag;
mod value;
mod varint;

pub mod decode;
pub mod encode;
pub mod posmap;

pub use bignum::BigNumber;
pub use decode::{decode_value, decode_value_with_limits, Decoder, NullVisitor, Visitor};
pub use encode::Encoder;
pub use error::{Error, Result};
pub use integer::Integer;
pub use limits::Limits;
pub use posmap::PosMap;
pub use value::{Value, ValueRef};
