//! # CBOR Object Library
//!
//! An incremental CBOR (Concise Binary Object Representation) decoder and
//! encoder for a small dynamic object model.
//!
//! ## Features
//! - Full support for the definite-length forms of CBOR major types 0-7
//! - Resumable decoding: input may arrive in chunks of any size and the
//!   [`Decoder`] picks up exactly where it stopped, including inside nested
//!   arrays and maps
//! - Integers over the whole 64-bit range of both major types 0 and 1
//! - Tags and simple values kept as standalone items
//! - Minimal-width headers on encode, into growable or fixed-capacity sinks
//! - `serde` support for [`Value`], so trees convert to and from other
//!   self-describing formats
//!
//! Indefinite-length items are not supported and fail to decode with
//! [`CborError::InvalidMinor`]. There are no floating point values: major
//! type 7 items with a 2, 4 or 8 byte argument decode as wide simple values.
//!
//! ## Example
//! ```rust
//! use cbor_object::{Map, Value, from_slice, to_vec};
//!
//! let mut map = Map::new(2);
//! map.insert("name", "Alice");
//! map.insert("age", 30);
//!
//! let encoded = to_vec(&Value::Map(map)).unwrap();
//! assert_eq!(encoded[0], 0xa2);
//!
//! let decoded = from_slice(&encoded).unwrap();
//! assert_eq!(decoded.as_map().unwrap().get("age"), Some(&Value::Int(30)));
//! ```

mod decoder;
mod encoder;
pub mod error;
mod input;
mod output;
pub mod value;

pub use decoder::{Decoder, DecoderState};
pub use encoder::Encoder;
pub use error::{CborError, Result};
pub use input::Input;
pub use output::{Output, OutputDynamic, OutputStatic};
pub use value::{Array, Map, Text, Value, ValueType};

// CBOR major types
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

// Simple values
pub(crate) const FALSE: u8 = 20;
pub(crate) const TRUE: u8 = 21;
pub(crate) const NULL: u8 = 22;
pub(crate) const UNDEFINED: u8 = 23;

pub(crate) fn major_type_name(major: u8) -> &'static str {
    match major {
        MAJOR_UNSIGNED => "integer",
        MAJOR_NEGATIVE => "negative integer",
        MAJOR_BYTES => "bytes",
        MAJOR_TEXT => "string",
        MAJOR_ARRAY => "array",
        MAJOR_MAP => "map",
        MAJOR_TAG => "tag",
        _ => "special",
    }
}

/// Encodes a value tree into a new buffer.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(OutputDynamic::new());
    encoder.write_value(value)?;
    Ok(encoder.into_inner().into_vec())
}

/// Decodes exactly one complete item from `slice`.
///
/// Trailing bytes after the item fail with [`CborError::MultipleTopLevel`]
/// when they start another item.
pub fn from_slice(slice: &[u8]) -> Result<Value> {
    Decoder::new().run(&mut Input::new(slice))
}
