use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
    ser::{SerializeMap, SerializeSeq},
};
use std::borrow::{Borrow, Cow};
use std::collections::{BTreeMap, btree_map};
use std::fmt;
use std::mem;
use std::ops::Deref;
use std::str::Utf8Error;

use crate::error::{CborError, Result};

/// Discriminant of a [`Value`], used for inspection and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Undefined,
    Bool,
    Int,
    ExtraInt,
    Bytes,
    String,
    Array,
    Map,
    Tag,
    ExtraTag,
    Special,
    ExtraSpecial,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Undefined => "undefined",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::ExtraInt => "extra int",
            ValueType::Bytes => "bytes",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Map => "map",
            ValueType::Tag => "tag",
            ValueType::ExtraTag => "extra tag",
            ValueType::Special => "special",
            ValueType::ExtraSpecial => "extra special",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte-backed text. Decoded strings are kept as raw bytes and never
/// validated as UTF-8; [`to_str`](Text::to_str) checks on demand.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Text(Vec<u8>);

impl Text {
    pub fn new() -> Self {
        Text(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_str(&self) -> std::result::Result<&str, Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_str() {
            Ok(s) => fmt::Debug::fmt(s, f),
            Err(_) => f.debug_tuple("Text").field(&self.0).finish(),
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text(s.as_bytes().to_vec())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text(s.into_bytes())
    }
}

impl From<&[u8]> for Text {
    fn from(bytes: &[u8]) -> Self {
        Text(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Text {
    fn from(bytes: Vec<u8>) -> Self {
        Text(bytes)
    }
}

impl AsRef<[u8]> for Text {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Lets maps be queried with `&str`/`&[u8]` keys.
impl Borrow<[u8]> for Text {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Ordered children plus the item count announced by the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Array {
    items: Vec<Value>,
    declared_size: u32,
}

impl Array {
    /// An empty array expecting `declared_size` children.
    pub fn new(declared_size: u32) -> Self {
        Array {
            items: Vec::new(),
            declared_size,
        }
    }

    pub fn declared_size(&self) -> u32 {
        self.declared_size
    }

    /// True once the number of children has reached the declared size.
    pub fn is_complete(&self) -> bool {
        self.items.len() >= self.declared_size as usize
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn into_vec(mut self) -> Vec<Value> {
        mem::take(&mut self.items)
    }
}

impl Drop for Array {
    fn drop(&mut self) {
        if self.items.iter().any(Value::is_container) {
            drop_nested(mem::take(&mut self.items));
        }
    }
}

impl Deref for Array {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.items
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        let declared_size = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Array {
            items,
            declared_size,
        }
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        mem::take(&mut self.items).into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// String-keyed entries ordered by key, plus the entry count announced by
/// the header. Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    entries: BTreeMap<Text, Value>,
    declared_size: u32,
}

impl Map {
    /// An empty map expecting `declared_size` entries.
    pub fn new(declared_size: u32) -> Self {
        Map {
            entries: BTreeMap::new(),
            declared_size,
        }
    }

    pub fn declared_size(&self) -> u32 {
        self.declared_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<Text>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Value> {
        self.entries.get(key.as_ref())
    }

    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut Value> {
        self.entries.get_mut(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.entries.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Text, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, Text, Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> btree_map::Values<'_, Text, Value> {
        self.entries.values()
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        if self.entries.values().any(Value::is_container) {
            drop_nested(mem::take(&mut self.entries).into_values().collect());
        }
    }
}

// Drops a tree with a worklist instead of one stack frame per nesting level.
// Containers are emptied before they go out of scope, so their own `Drop`
// finds nothing left to walk.
fn drop_nested(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(mut array) => pending.append(&mut array.items),
            Value::Map(mut map) => pending.extend(mem::take(&mut map.entries).into_values()),
            _ => {}
        }
    }
}

impl From<BTreeMap<Text, Value>> for Map {
    fn from(entries: BTreeMap<Text, Value>) -> Self {
        let declared_size = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        Map {
            entries,
            declared_size,
        }
    }
}

impl<K: Into<Text>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Map::from(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}

impl IntoIterator for Map {
    type Item = (Text, Value);
    type IntoIter = btree_map::IntoIter<Text, Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        mem::take(&mut self.entries).into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a Text, &'a Value);
    type IntoIter = btree_map::Iter<'a, Text, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Dynamic CBOR value: every item the decoder can produce and the encoder
/// can write.
///
/// Integers outside the `i64` range are carried as `ExtraInt` with an
/// explicit sign; tags and simple values read from an 8-byte argument are
/// carried in the `Extra*` variants.
///
/// # Example
/// ```
/// use cbor_object::{Map, Value, from_slice, to_vec};
///
/// let mut map = Map::new(2);
/// map.insert("name", "Alice");
/// map.insert("age", 30);
/// let value = Value::Map(map);
///
/// let bytes = to_vec(&value).unwrap();
/// let decoded = from_slice(&bytes).unwrap();
/// assert_eq!(value, decoded);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    /// Integer whose magnitude does not fit `i64`. A negative value is
    /// `-magnitude`.
    ExtraInt { negative: bool, magnitude: u64 },
    Bytes(Vec<u8>),
    String(Text),
    Array(Array),
    Map(Map),
    Tag(u32),
    /// Tag read from an 8-byte argument. The encoder writes the shortest
    /// form, so a number that fits `u32` decodes back as `Tag`; build tags
    /// with [`Value::tag`] to get the variant a round trip preserves.
    ExtraTag(u64),
    Special(u32),
    /// Simple value read from an 8-byte argument. Like `ExtraTag`, a code
    /// that fits `u32` comes back as `Special`; see [`Value::special`].
    ExtraSpecial(u64),
}

impl Value {
    /// An empty array expecting `declared_size` children.
    pub fn array(declared_size: u32) -> Value {
        Value::Array(Array::new(declared_size))
    }

    /// An empty map expecting `declared_size` entries.
    pub fn map(declared_size: u32) -> Value {
        Value::Map(Map::new(declared_size))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(bytes.into())
    }

    pub fn string(text: impl Into<Text>) -> Value {
        Value::String(text.into())
    }

    /// Builds an integer from sign and magnitude, using `Int` whenever the
    /// value fits `i64`.
    ///
    /// Fails for a negative sign with zero magnitude.
    pub fn extra_int(negative: bool, magnitude: u64) -> Result<Value> {
        if !negative {
            return Ok(Value::from(magnitude));
        }
        match magnitude.checked_sub(1) {
            Some(argument) => Value::from_negative(argument),
            None => Err(CborError::InvalidValue(
                "negative integer with zero magnitude".to_string(),
            )),
        }
    }

    /// The integer `-1 - argument`, as carried by a major type 1 item.
    pub(crate) fn from_negative(argument: u64) -> Result<Value> {
        if argument <= i64::MAX as u64 {
            return Ok(Value::Int(-1 - argument as i64));
        }
        argument
            .checked_add(1)
            .map(|magnitude| Value::ExtraInt {
                negative: true,
                magnitude,
            })
            .ok_or(CborError::ValueTooLarge("negative integer -2^64"))
    }

    pub fn tag(tag: u64) -> Value {
        match u32::try_from(tag) {
            Ok(tag) => Value::Tag(tag),
            Err(_) => Value::ExtraTag(tag),
        }
    }

    pub fn special(code: u64) -> Value {
        match u32::try_from(code) {
            Ok(code) => Value::Special(code),
            Err(_) => Value::ExtraSpecial(code),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Undefined => ValueType::Undefined,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::ExtraInt { .. } => ValueType::ExtraInt,
            Value::Bytes(_) => ValueType::Bytes,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
            Value::Tag(_) => ValueType::Tag,
            Value::ExtraTag(_) => ValueType::ExtraTag,
            Value::Special(_) => ValueType::Special,
            Value::ExtraSpecial(_) => ValueType::ExtraSpecial,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_extra_int(&self) -> bool {
        matches!(self, Value::ExtraInt { .. })
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_))
    }

    /// True for both `Tag` and `ExtraTag`.
    pub fn is_tag(&self) -> bool {
        matches!(self, Value::Tag(_) | Value::ExtraTag(_))
    }

    /// True for both `Special` and `ExtraSpecial`.
    pub fn is_special(&self) -> bool {
        matches!(self, Value::Special(_) | Value::ExtraSpecial(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns `(negative, magnitude)` for an `ExtraInt`.
    pub fn as_extra_int(&self) -> Option<(bool, u64)> {
        match self {
            Value::ExtraInt {
                negative,
                magnitude,
            } => Some((*negative, *magnitude)),
            _ => None,
        }
    }

    /// Any integer, widened so that `ExtraInt` values fit as well.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i as i128),
            Value::ExtraInt {
                negative: true,
                magnitude,
            } => Some(-(*magnitude as i128)),
            Value::ExtraInt {
                negative: false,
                magnitude,
            } => Some(*magnitude as i128),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Value::String(t) => Some(t),
            _ => None,
        }
    }

    /// The string as `&str`, if this is a string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_text().and_then(|t| t.to_str().ok())
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<u64> {
        match self {
            Value::Tag(t) => Some(*t as u64),
            Value::ExtraTag(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_special(&self) -> Option<u64> {
        match self {
            Value::Special(s) => Some(*s as u64),
            Value::ExtraSpecial(s) => Some(*s),
            _ => None,
        }
    }

    /// The header count of an array or map.
    pub fn declared_size(&self) -> Option<u32> {
        match self {
            Value::Array(a) => Some(a.declared_size()),
            Value::Map(m) => Some(m.declared_size()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Int(u as i64)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::ExtraInt {
                negative: false,
                magnitude: u,
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Text> for Value {
    fn from(t: Text) -> Self {
        Value::String(t)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items.into())
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

// Diagnostic notation in the style of RFC 8949 section 8.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::ExtraInt {
                negative: true,
                magnitude,
            } => write!(f, "-{magnitude}"),
            Value::ExtraInt {
                negative: false,
                magnitude,
            } => write!(f, "{magnitude}"),
            Value::Bytes(b) => {
                f.write_str("h'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            Value::String(t) => write!(f, "{:?}", t.to_string_lossy()),
            Value::Array(a) => {
                f.write_str("[")?;
                for (i, item) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (key, value)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {value}", key.to_string_lossy())?;
                }
                f.write_str("}")
            }
            Value::Tag(t) => write!(f, "tag({t})"),
            Value::ExtraTag(t) => write!(f, "tag({t})"),
            Value::Special(s) => write!(f, "simple({s})"),
            Value::ExtraSpecial(s) => write!(f, "simple({s})"),
        }
    }
}

impl Serialize for Text {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.to_str() {
            Ok(s) => serializer.serialize_str(s),
            Err(_) => serde_bytes::Bytes::new(&self.0).serialize(serializer),
        }
    }
}

/// `Null` serializes as none and `Undefined` as unit. Deserializing maps
/// both back to `Null`, so formats that keep unit distinct still lose
/// `Undefined` on the way back.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Undefined => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::ExtraInt {
                negative: true,
                magnitude,
            } => serializer.serialize_i128(-(*magnitude as i128)),
            Value::ExtraInt {
                negative: false,
                magnitude,
            } => serializer.serialize_u64(*magnitude),
            Value::Bytes(b) => serde_bytes::Bytes::new(b).serialize(serializer),
            Value::String(t) => t.serialize(serializer),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for item in a {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (key, value) in m {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Tag(t) => serializer.serialize_newtype_struct("Tag", &(*t as u64)),
            Value::ExtraTag(t) => serializer.serialize_newtype_struct("Tag", t),
            Value::Special(s) => serializer.serialize_newtype_struct("Special", &(*s as u64)),
            Value::ExtraSpecial(s) => serializer.serialize_newtype_struct("Special", s),
        }
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TextVisitor;

        impl<'de> Visitor<'de> for TextVisitor {
            type Value = Text;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string map key")
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Text, E> {
                Ok(Text::from(value))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Text, E> {
                Ok(Text::from(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Text, E> {
                Ok(Text::from(value))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Text, E> {
                Ok(Text::from(value))
            }
        }

        deserializer.deserialize_str(TextVisitor)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any value without floating point numbers")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Int(value))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_i128<E>(self, value: i128) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                let magnitude = u64::try_from(value.unsigned_abs())
                    .map_err(|_| E::custom(format!("integer {value} out of range")))?;
                Value::extra_int(value < 0, magnitude).map_err(E::custom)
            }

            fn visit_u128<E>(self, value: u128) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(Value::from)
                    .map_err(|_| E::custom(format!("integer {value} out of range")))
            }

            fn visit_f64<E>(self, _value: f64) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                Err(E::custom("floating point values are not supported"))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::string(value))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::string(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Value, E> {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<V>(self, mut visitor: V) -> std::result::Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec.into()))
            }

            fn visit_map<V>(self, mut visitor: V) -> std::result::Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut entries = BTreeMap::new();
                let mut received: u32 = 0;
                while let Some((key, value)) = visitor.next_entry::<Text, Value>()? {
                    entries.insert(key, value);
                    received = received.saturating_add(1);
                }
                Ok(Value::Map(Map {
                    entries,
                    declared_size: received,
                }))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
