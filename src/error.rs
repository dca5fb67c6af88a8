use thiserror::Error;

use crate::value::ValueType;

/// Errors reported by the decoder, the encoder and the fixed-capacity sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CborError {
    #[error("invalid {} type: minor value {minor}", major_name(.major))]
    InvalidMinor { major: u8, minor: u8 },

    #[error("value too large: {0}")]
    ValueTooLarge(&'static str),

    #[error("invalid map key type: expected string, found {0}")]
    InvalidMapKey(ValueType),

    #[error("multiple cbor objects when decoding")]
    MultipleTopLevel,

    #[error("cbor decode ended with unterminated structures")]
    UnterminatedStructure,

    #[error("cbor decoded nothing")]
    DecodedNothing,

    #[error("buffer overflow: capacity {capacity}, requested {requested}")]
    CapacityExceeded { capacity: usize, requested: usize },

    #[error("invalid cbor value: {0}")]
    InvalidValue(String),

    #[error("decoder already failed and cannot be reused")]
    Poisoned,

    #[error("cbor object was already decoded")]
    AlreadyDecoded,

    #[error("nesting deeper than the limit of {0}")]
    DepthLimitExceeded(usize),
}

impl CborError {
    /// Returns true for the two end-of-input conditions that leave a
    /// decoder usable: supplying more bytes and running again may succeed.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            CborError::DecodedNothing | CborError::UnterminatedStructure
        )
    }
}

fn major_name(major: &u8) -> &'static str {
    crate::major_type_name(*major)
}

pub type Result<T> = std::result::Result<T, CborError>;
