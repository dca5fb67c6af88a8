use tracing::trace;

use crate::error::{CborError, Result};
use crate::output::Output;
use crate::value::Value;
use crate::{
    FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG,
    MAJOR_TEXT, MAJOR_UNSIGNED, NULL, TRUE, UNDEFINED,
};

/// Writes CBOR items to an [`Output`], always using the shortest header.
///
/// Structures are written header first; the caller supplies the children.
/// [`write_value`](Encoder::write_value) does this for a whole tree.
#[derive(Debug)]
pub struct Encoder<O: Output> {
    output: O,
}

impl<O: Output> Encoder<O> {
    pub fn new(output: O) -> Self {
        Encoder { output }
    }

    pub fn into_inner(self) -> O {
        self.output
    }

    pub fn get_ref(&self) -> &O {
        &self.output
    }

    /// Writes a header for `major` carrying `value` in the minimal width.
    pub fn write_type_value(&mut self, major: u8, value: u64) -> Result<()> {
        if value < 24 {
            self.output.put_byte((major << 5) | value as u8)
        } else if value < 256 {
            self.output.put_bytes(&[(major << 5) | 24, value as u8])
        } else if value < 65536 {
            self.output.put_byte((major << 5) | 25)?;
            self.output.put_bytes(&(value as u16).to_be_bytes())
        } else if value < 4294967296 {
            self.output.put_byte((major << 5) | 26)?;
            self.output.put_bytes(&(value as u32).to_be_bytes())
        } else {
            self.output.put_byte((major << 5) | 27)?;
            self.output.put_bytes(&value.to_be_bytes())
        }
    }

    pub fn write_int(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            self.write_type_value(MAJOR_UNSIGNED, value as u64)
        } else {
            self.write_type_value(MAJOR_NEGATIVE, (-1 - value) as u64)
        }
    }

    pub fn write_uint(&mut self, value: u64) -> Result<()> {
        self.write_type_value(MAJOR_UNSIGNED, value)
    }

    /// Writes a sign and magnitude integer covering the full 64-bit range of
    /// both major types 0 and 1.
    pub fn write_extra_int(&mut self, negative: bool, magnitude: u64) -> Result<()> {
        if !negative {
            return self.write_type_value(MAJOR_UNSIGNED, magnitude);
        }
        match magnitude.checked_sub(1) {
            Some(argument) => self.write_type_value(MAJOR_NEGATIVE, argument),
            None => Err(CborError::InvalidValue(
                "negative integer with zero magnitude".to_string(),
            )),
        }
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.write_type_value(MAJOR_BYTES, data.len() as u64)?;
        self.output.put_bytes(data)
    }

    /// Writes a text string. The bytes are written as given, without any
    /// UTF-8 validation.
    pub fn write_string(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        let text = text.as_ref();
        self.write_type_value(MAJOR_TEXT, text.len() as u64)?;
        self.output.put_bytes(text)
    }

    pub fn write_array(&mut self, len: u64) -> Result<()> {
        self.write_type_value(MAJOR_ARRAY, len)
    }

    /// Writes a map header; `len` counts key/value pairs.
    pub fn write_map(&mut self, len: u64) -> Result<()> {
        self.write_type_value(MAJOR_MAP, len)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        let val = if value { TRUE } else { FALSE };
        self.output.put_byte((MAJOR_SIMPLE << 5) | val)
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.output.put_byte((MAJOR_SIMPLE << 5) | NULL)
    }

    pub fn write_undefined(&mut self) -> Result<()> {
        self.output.put_byte((MAJOR_SIMPLE << 5) | UNDEFINED)
    }

    pub fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.write_type_value(MAJOR_TAG, tag)
    }

    /// Writes a simple value. Codes 20 to 23 go through the one-byte form
    /// since their inline encodings are false, true, null and undefined.
    pub fn write_special(&mut self, code: u64) -> Result<()> {
        if (FALSE as u64..=UNDEFINED as u64).contains(&code) {
            return self.output.put_bytes(&[(MAJOR_SIMPLE << 5) | 24, code as u8]);
        }
        self.write_type_value(MAJOR_SIMPLE, code)
    }

    /// Writes a whole value tree depth first. Structures are written with
    /// the number of children they actually hold.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.write_null(),
            Value::Undefined => self.write_undefined(),
            Value::Bool(b) => self.write_bool(*b),
            Value::Int(i) => self.write_int(*i),
            Value::ExtraInt {
                negative,
                magnitude,
            } => self.write_extra_int(*negative, *magnitude),
            Value::Bytes(data) => self.write_bytes(data),
            Value::String(text) => self.write_string(text),
            Value::Array(array) => {
                self.write_array(array.len() as u64)?;
                for item in array {
                    self.write_value(item)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                self.write_map(map.len() as u64)?;
                for (key, value) in map {
                    self.write_string(key)?;
                    self.write_value(value)?;
                }
                Ok(())
            }
            Value::Tag(tag) => self.write_tag(*tag as u64),
            Value::ExtraTag(tag) => self.write_tag(*tag),
            Value::Special(code) => self.write_special(*code as u64),
            Value::ExtraSpecial(code) => self.write_special(*code),
        }
    }

    /// Writes `value` if present; an absent value writes nothing.
    pub fn write_optional(&mut self, value: Option<&Value>) -> Result<()> {
        match value {
            Some(value) => self.write_value(value),
            None => {
                trace!("skipping absent value");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputDynamic, OutputStatic};
    use crate::value::Map;

    fn encoded(write: impl FnOnce(&mut Encoder<Vec<u8>>) -> Result<()>) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        write(&mut encoder).unwrap();
        encoder.into_inner()
    }

    #[test]
    fn test_minimal_widths() {
        assert_eq!(encoded(|e| e.write_uint(23)), vec![0x17]);
        assert_eq!(encoded(|e| e.write_uint(24)), vec![0x18, 0x18]);
        assert_eq!(encoded(|e| e.write_uint(255)), vec![0x18, 0xff]);
        assert_eq!(encoded(|e| e.write_uint(256)), vec![0x19, 0x01, 0x00]);
        assert_eq!(encoded(|e| e.write_uint(65535)), vec![0x19, 0xff, 0xff]);
        assert_eq!(
            encoded(|e| e.write_uint(65536)),
            vec![0x1a, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(
            encoded(|e| e.write_uint(4294967295)),
            vec![0x1a, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(
            encoded(|e| e.write_uint(4294967296)),
            vec![0x1b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_negative_integers() {
        assert_eq!(encoded(|e| e.write_int(-1)), vec![0x20]);
        assert_eq!(encoded(|e| e.write_int(-24)), vec![0x37]);
        assert_eq!(encoded(|e| e.write_int(-25)), vec![0x38, 0x18]);
        assert_eq!(encoded(|e| e.write_int(-1000)), vec![0x39, 0x03, 0xe7]);
        assert_eq!(
            encoded(|e| e.write_int(i64::MIN)),
            vec![0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_extra_int() {
        assert_eq!(
            encoded(|e| e.write_extra_int(false, u64::MAX)),
            vec![0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(
            encoded(|e| e.write_extra_int(true, u64::MAX)),
            vec![0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]
        );
        assert_eq!(encoded(|e| e.write_extra_int(true, 1)), vec![0x20]);

        let mut encoder = Encoder::new(Vec::new());
        assert!(matches!(
            encoder.write_extra_int(true, 0),
            Err(CborError::InvalidValue(_))
        ));
        assert!(encoder.get_ref().is_empty());
    }

    #[test]
    fn test_simple_values() {
        assert_eq!(encoded(|e| e.write_bool(false)), vec![0xf4]);
        assert_eq!(encoded(|e| e.write_bool(true)), vec![0xf5]);
        assert_eq!(encoded(|e| e.write_null()), vec![0xf6]);
        assert_eq!(encoded(|e| e.write_undefined()), vec![0xf7]);
        assert_eq!(encoded(|e| e.write_special(16)), vec![0xf0]);
        assert_eq!(encoded(|e| e.write_special(20)), vec![0xf8, 0x14]);
        assert_eq!(encoded(|e| e.write_special(23)), vec![0xf8, 0x17]);
        assert_eq!(encoded(|e| e.write_special(24)), vec![0xf8, 0x18]);
        assert_eq!(encoded(|e| e.write_special(255)), vec![0xf8, 0xff]);
        assert_eq!(encoded(|e| e.write_special(256)), vec![0xf9, 0x01, 0x00]);
    }

    #[test]
    fn test_tags() {
        assert_eq!(encoded(|e| e.write_tag(1)), vec![0xc1]);
        assert_eq!(encoded(|e| e.write_tag(32)), vec![0xd8, 0x20]);
        assert_eq!(
            encoded(|e| e.write_value(&Value::ExtraTag(1 << 32))),
            vec![0xdb, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(encoded(|e| e.write_string("")), vec![0x60]);
        assert_eq!(
            encoded(|e| e.write_string("IETF")),
            vec![0x64, 0x49, 0x45, 0x54, 0x46]
        );
        assert_eq!(
            encoded(|e| e.write_bytes(&[1, 2, 3, 4])),
            vec![0x44, 0x01, 0x02, 0x03, 0x04]
        );

        let long = vec![0xaa; 300];
        let out = encoded(|e| e.write_bytes(&long));
        assert_eq!(&out[..3], &[0x59, 0x01, 0x2c]);
        assert_eq!(out.len(), 303);
    }

    #[test]
    fn test_write_value_uses_actual_counts() {
        // Declared sizes are ignored when writing
        let mut array = crate::value::Array::new(5);
        array.push(1);
        let mut map = Map::new(3);
        map.insert("b", 2);
        map.insert("a", array);

        // {"a": [1], "b": 2}
        assert_eq!(
            encoded(|e| e.write_value(&Value::Map(map))),
            vec![0xa2, 0x61, 0x61, 0x81, 0x01, 0x61, 0x62, 0x02]
        );
    }

    #[test]
    fn test_write_optional() {
        assert_eq!(encoded(|e| e.write_optional(None)), Vec::<u8>::new());
        assert_eq!(
            encoded(|e| e.write_optional(Some(&Value::Null))),
            vec![0xf6]
        );
    }

    #[test]
    fn test_static_output_overflow() {
        let mut encoder = Encoder::new(OutputStatic::new(4));
        encoder.write_uint(1).unwrap();
        assert_eq!(
            encoder.write_string("abcd"),
            Err(CborError::CapacityExceeded {
                capacity: 4,
                requested: 6
            })
        );
        assert_eq!(encoder.get_ref().data(), &[0x01, 0x64]);
    }

    #[test]
    fn test_dynamic_output_grows() {
        let mut encoder = Encoder::new(OutputDynamic::with_capacity(2));
        encoder.write_value(&Value::from("hello world")).unwrap();
        let out = encoder.into_inner();
        assert_eq!(out.size(), 12);
        assert_eq!(out.capacity(), 16);
    }

    #[test]
    fn test_encode_through_mut_ref() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_int(-2).unwrap();
        Encoder::new(&mut buf).write_bool(true).unwrap();
        assert_eq!(buf, vec![0x21, 0xf5]);
    }
}
