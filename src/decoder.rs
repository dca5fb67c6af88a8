use tracing::{debug, trace};

use crate::error::{CborError, Result};
use crate::input::Input;
use crate::value::{Array, Map, Text, Value};
use crate::{
    FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_UNSIGNED, NULL, TRUE, UNDEFINED,
};

/// What the decoder is waiting for next.
///
/// Every state except `Type` and `Error` needs a known number of bytes
/// before it can make progress; the decoder never consumes part of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Awaiting a one-byte item header.
    Type,
    PosInt,
    NegInt,
    BytesSize,
    BytesData,
    StringSize,
    StringData,
    Array,
    Map,
    Tag,
    Special,
    BoolFalse,
    BoolTrue,
    Null,
    Undefined,
    ExtraPosInt,
    ExtraNegInt,
    ExtraTag,
    ExtraSpecial,
    /// A format error was reported; the decoder cannot continue.
    Error,
}

// An array or map that has been opened but has not yet received all of its
// declared children. Maps hold their pending key until its value arrives.
#[derive(Debug)]
enum Frame {
    Array(Array),
    Map {
        map: Map,
        key: Option<Text>,
        received: u32,
    },
}

impl Frame {
    fn expects_key(&self) -> bool {
        matches!(self, Frame::Map { key: None, .. })
    }

    /// Adds a completed item; returns true once the structure is full.
    fn accept(&mut self, value: Value) -> Result<bool> {
        match self {
            Frame::Array(array) => {
                array.push(value);
                Ok(array.is_complete())
            }
            Frame::Map { map, key, received } => match key.take() {
                Some(k) => {
                    map.insert(k, value);
                    *received += 1;
                    Ok(*received >= map.declared_size())
                }
                None => match value {
                    Value::String(text) => {
                        *key = Some(text);
                        Ok(false)
                    }
                    other => Err(CborError::InvalidMapKey(other.value_type())),
                },
            },
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::Array(array) => Value::Array(array),
            Frame::Map { map, .. } => Value::Map(map),
        }
    }
}

/// Incremental decoder producing one [`Value`] tree.
///
/// The decoder consumes as many complete items as the [`Input`] holds and
/// keeps all of its progress, including open arrays and maps, between
/// calls. Input can therefore arrive in chunks of any size: call
/// [`poll`](Decoder::poll) again with a cursor over the bytes that were not
/// consumed yet plus whatever has arrived since.
///
/// ```
/// use cbor_object::{Decoder, Input, Value};
///
/// let encoded = [0x82, 0x01, 0x19, 0x01, 0xf4];
/// let mut decoder = Decoder::new();
///
/// let mut input = Input::new(&encoded[..3]);
/// assert_eq!(decoder.poll(&mut input).unwrap(), None);
/// let consumed = input.position();
///
/// let mut input = Input::new(&encoded[consumed..]);
/// let value = decoder.poll(&mut input).unwrap().unwrap();
/// assert_eq!(value, Value::from(vec![Value::from(1), Value::from(500)]));
/// ```
#[derive(Debug)]
pub struct Decoder {
    state: DecoderState,
    // Bytes the current state needs: an argument width (0 = inline minor)
    // or a data length for BytesData/StringData.
    length: usize,
    minor: u8,
    stack: Vec<Frame>,
    max_depth: Option<usize>,
    result: Option<Value>,
    finished: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            state: DecoderState::Type,
            length: 0,
            minor: 0,
            stack: Vec::new(),
            max_depth: None,
            result: None,
            finished: false,
        }
    }

    /// A decoder that refuses to open more than `max_depth` nested arrays
    /// and maps, failing with [`CborError::DepthLimitExceeded`].
    ///
    /// Decoding itself never recurses, but code walking the resulting tree
    /// (encoding, comparing, formatting) does.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Decoder {
            max_depth: Some(max_depth),
            ..Self::new()
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_failed(&self) -> bool {
        self.state == DecoderState::Error
    }

    /// Number of arrays and maps currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Consumes the available bytes and returns the top-level value once it
    /// is complete, or `None` if more input is needed.
    pub fn poll(&mut self, input: &mut Input<'_>) -> Result<Option<Value>> {
        if self.state == DecoderState::Error {
            return Err(CborError::Poisoned);
        }
        if let Err(e) = self.drain(input) {
            debug!(state = ?self.state, depth = self.stack.len(), "cbor decode failed: {e}");
            self.state = DecoderState::Error;
            return Err(e);
        }
        match self.result.take() {
            Some(value) => {
                self.finished = true;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Consumes the available bytes and returns the decoded value.
    ///
    /// Running out of input fails with [`CborError::DecodedNothing`] or
    /// [`CborError::UnterminatedStructure`]. Neither is fatal: the decoder
    /// keeps its progress and can be run again with more bytes. Once the
    /// value has been returned, running again fails with
    /// [`CborError::AlreadyDecoded`].
    pub fn run(&mut self, input: &mut Input<'_>) -> Result<Value> {
        match self.poll(input)? {
            Some(value) => Ok(value),
            None if self.finished => Err(CborError::AlreadyDecoded),
            None if self.stack.is_empty() => Err(CborError::DecodedNothing),
            None => Err(CborError::UnterminatedStructure),
        }
    }

    fn drain(&mut self, input: &mut Input<'_>) -> Result<()> {
        loop {
            if self.state == DecoderState::Type {
                if !input.has_bytes(1) {
                    return Ok(());
                }
                self.decode_type(input.read_u8())?;
            } else {
                if !input.has_bytes(self.length) {
                    return Ok(());
                }
                if let Some(value) = self.decode_payload(input)? {
                    self.put_decoded_value(value)?;
                }
            }
        }
    }

    fn decode_type(&mut self, header: u8) -> Result<()> {
        let major = header >> 5;
        self.minor = header & 0x1f;

        let (state, length) = match major {
            MAJOR_UNSIGNED => {
                self.argument_state(major, DecoderState::PosInt, DecoderState::ExtraPosInt)?
            }
            MAJOR_NEGATIVE => {
                self.argument_state(major, DecoderState::NegInt, DecoderState::ExtraNegInt)?
            }
            MAJOR_BYTES => self.data_state(major, DecoderState::BytesSize, DecoderState::BytesData)?,
            MAJOR_TEXT => {
                self.data_state(major, DecoderState::StringSize, DecoderState::StringData)?
            }
            MAJOR_ARRAY => self.size_state(major, DecoderState::Array)?,
            MAJOR_MAP => self.size_state(major, DecoderState::Map)?,
            MAJOR_TAG => self.argument_state(major, DecoderState::Tag, DecoderState::ExtraTag)?,
            _ => match self.minor {
                FALSE => (DecoderState::BoolFalse, 0),
                TRUE => (DecoderState::BoolTrue, 0),
                NULL => (DecoderState::Null, 0),
                UNDEFINED => (DecoderState::Undefined, 0),
                _ => self.argument_state(major, DecoderState::Special, DecoderState::ExtraSpecial)?,
            },
        };
        trace!(major, minor = self.minor, ?state, length, "decoded header");

        self.state = state;
        self.length = length;
        Ok(())
    }

    /// Width in bytes of the argument announced by the minor value.
    fn argument_width(&self, major: u8) -> Result<usize> {
        match self.minor {
            0..=23 => Ok(0),
            24 => Ok(1),
            25 => Ok(2),
            26 => Ok(4),
            27 => Ok(8),
            minor => Err(CborError::InvalidMinor { major, minor }),
        }
    }

    // Integers, tags and simple values: an 8-byte argument selects the
    // widened state.
    fn argument_state(
        &self,
        major: u8,
        narrow: DecoderState,
        wide: DecoderState,
    ) -> Result<(DecoderState, usize)> {
        let width = self.argument_width(major)?;
        Ok((if width == 8 { wide } else { narrow }, width))
    }

    // Byte and text strings: an inline length goes straight to the data.
    fn data_state(
        &self,
        major: u8,
        size: DecoderState,
        data: DecoderState,
    ) -> Result<(DecoderState, usize)> {
        match self.argument_width(major)? {
            0 => Ok((data, self.minor as usize)),
            8 => Err(CborError::ValueTooLarge(if major == MAJOR_BYTES {
                "byte string with 8-byte length"
            } else {
                "text string with 8-byte length"
            })),
            width => Ok((size, width)),
        }
    }

    fn size_state(&self, major: u8, state: DecoderState) -> Result<(DecoderState, usize)> {
        match self.argument_width(major)? {
            8 => Err(CborError::ValueTooLarge(if major == MAJOR_ARRAY {
                "array with 8-byte size"
            } else {
                "map with 8-byte size"
            })),
            width => Ok((state, width)),
        }
    }

    fn read_argument(&self, input: &mut Input<'_>) -> u64 {
        match self.length {
            0 => self.minor as u64,
            1 => input.read_u8() as u64,
            2 => input.read_u16() as u64,
            4 => input.read_u32() as u64,
            _ => input.read_u64(),
        }
    }

    // Runs the step of the current state once its bytes are available.
    // Size states only move on to their data state and yield nothing.
    fn decode_payload(&mut self, input: &mut Input<'_>) -> Result<Option<Value>> {
        let value = match self.state {
            DecoderState::Type | DecoderState::Error => return Ok(None),
            DecoderState::BytesSize | DecoderState::StringSize => {
                let size = self.read_argument(input);
                self.length = usize::try_from(size)
                    .map_err(|_| CborError::ValueTooLarge("string length exceeds address space"))?;
                self.state = if self.state == DecoderState::BytesSize {
                    DecoderState::BytesData
                } else {
                    DecoderState::StringData
                };
                return Ok(None);
            }
            DecoderState::PosInt | DecoderState::ExtraPosInt => {
                Value::from(self.read_argument(input))
            }
            DecoderState::NegInt | DecoderState::ExtraNegInt => {
                Value::from_negative(self.read_argument(input))?
            }
            DecoderState::BytesData => Value::Bytes(input.read_bytes(self.length).to_vec()),
            DecoderState::StringData => Value::String(Text::from(input.read_bytes(self.length))),
            DecoderState::Array => Value::array(self.read_argument(input) as u32),
            DecoderState::Map => Value::map(self.read_argument(input) as u32),
            DecoderState::Tag => Value::Tag(self.read_argument(input) as u32),
            DecoderState::ExtraTag => Value::ExtraTag(self.read_argument(input)),
            DecoderState::Special => Value::Special(self.read_argument(input) as u32),
            DecoderState::ExtraSpecial => Value::ExtraSpecial(self.read_argument(input)),
            DecoderState::BoolFalse => Value::Bool(false),
            DecoderState::BoolTrue => Value::Bool(true),
            DecoderState::Null => Value::Null,
            DecoderState::Undefined => Value::Undefined,
        };
        self.state = DecoderState::Type;
        Ok(Some(value))
    }

    fn put_decoded_value(&mut self, value: Value) -> Result<()> {
        match self.stack.last() {
            None if self.result.is_some() || self.finished => {
                return Err(CborError::MultipleTopLevel);
            }
            Some(frame) if frame.expects_key() && !value.is_string() => {
                return Err(CborError::InvalidMapKey(value.value_type()));
            }
            _ => {}
        }

        let opens = match &value {
            Value::Array(array) => array.declared_size() > 0,
            Value::Map(map) => map.declared_size() > 0,
            _ => false,
        };
        if let Some(max_depth) = self.max_depth.filter(|&max| opens && self.stack.len() >= max) {
            return Err(CborError::DepthLimitExceeded(max_depth));
        }

        match value {
            Value::Array(array) if array.declared_size() > 0 => {
                self.stack.push(Frame::Array(array));
                Ok(())
            }
            Value::Map(map) if map.declared_size() > 0 => {
                self.stack.push(Frame::Map {
                    map,
                    key: None,
                    received: 0,
                });
                Ok(())
            }
            value => self.complete(value),
        }
    }

    // Hands a finished item to the innermost open structure. Structures
    // that fill up are closed and handed to their own parent in turn.
    fn complete(&mut self, mut value: Value) -> Result<()> {
        loop {
            let Some(mut frame) = self.stack.pop() else {
                self.result = Some(value);
                return Ok(());
            };
            if !frame.accept(value)? {
                self.stack.push(frame);
                return Ok(());
            }
            value = frame.into_value();
            trace!(depth = self.stack.len(), "structure complete");
        }
    }
}
