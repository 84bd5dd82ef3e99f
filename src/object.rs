use indexmap::IndexMap;
use std::fmt;

use crate::error::Error;
use crate::Result;

/// `(object_number, generation)`. Object number 0 is reserved for the free-list head.
pub type ObjectId = (u32, u16);

/// Whether a PDF string literal was written in `(...)` or `<...>` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// A PDF primitive value. Pattern matching over this enum drives the parser, the
/// serializer and the resolver; there is no inheritance between cases (a `Stream`
/// embeds a `Dictionary`, it does not subtype it).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn enum_variant(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            other => Err(Error::ObjectType { expected: "Boolean", found: other.enum_variant() }),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            // Some malformed producers write `/Length 12.0` — tolerate a whole-valued real.
            Object::Real(r) if r.fract() == 0.0 => Ok(*r as i64),
            other => Err(Error::ObjectType { expected: "Integer", found: other.enum_variant() }),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Real(r) => Ok(*r),
            Object::Integer(i) => Ok(*i as f64),
            other => Err(Error::ObjectType { expected: "Real", found: other.enum_variant() }),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            other => Err(Error::ObjectType { expected: "Name", found: other.enum_variant() }),
        }
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            other => Err(Error::ObjectType { expected: "String", found: other.enum_variant() }),
        }
    }

    pub fn as_array(&self) -> Result<&[Object]> {
        match self {
            Object::Array(a) => Ok(a),
            other => Err(Error::ObjectType { expected: "Array", found: other.enum_variant() }),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            other => Err(Error::ObjectType { expected: "Array", found: other.enum_variant() }),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            other => Err(Error::ObjectType { expected: "Dictionary", found: other.enum_variant() }),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            other => Err(Error::ObjectType { expected: "Dictionary", found: other.enum_variant() }),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            other => Err(Error::ObjectType { expected: "Stream", found: other.enum_variant() }),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            other => Err(Error::ObjectType { expected: "Stream", found: other.enum_variant() }),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            other => Err(Error::ObjectType { expected: "Reference", found: other.enum_variant() }),
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}
impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}
impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(v)
    }
}
impl From<ObjectId> for Object {
    fn from(v: ObjectId) -> Self {
        Object::Reference(v)
    }
}
impl From<Dictionary> for Object {
    fn from(v: Dictionary) -> Self {
        Object::Dictionary(v)
    }
}
impl From<Stream> for Object {
    fn from(v: Stream) -> Self {
        Object::Stream(v)
    }
}
impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}

/// A name -> value mapping with insertion order preserved and last-write-wins on
/// duplicate keys, as required for PDF dictionaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

/// Dictionary keys are raw PDF name bytes, not UTF-8 text, so they serialize
/// as a sequence of `(key, value)` pairs rather than a map: a format like JSON
/// that requires string object keys would otherwise reject them outright.
#[cfg(feature = "serde")]
impl serde::Serialize for Dictionary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.0.iter().collect::<Vec<_>>(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Dictionary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pairs: Vec<(Vec<u8>, Object)> = serde::Deserialize::deserialize(deserializer)?;
        Ok(Dictionary(pairs.into_iter().collect()))
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        // IndexMap::insert already overwrites an existing key's value while keeping
        // its original position, which is "last-wins" for the value but not for
        // order; PDF dictionaries only require the former.
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0.get(key).ok_or(Error::ObjectType { expected: "present key", found: "missing key" })
    }

    pub fn get_opt(&self, key: &[u8]) -> Option<&Object> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn has_type(&self, type_name: &[u8]) -> bool {
        matches!(self.get_opt(b"Type"), Some(Object::Name(n)) if n == type_name)
    }

    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Object)> {
        self.0.iter().map(|(k, v)| (k.as_slice(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&[u8], &mut Object)> {
        self.0.iter_mut().map(|(k, v)| (k.as_slice(), v))
    }
}

/// A stream object: a dictionary plus a raw byte payload. `/Length` must match
/// `content.len()` after decryption but before filter decoding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
    /// Set while the payload has not yet been sliced out of the source buffer
    /// (deferred because `/Length` was itself an unresolved reference).
    pub start_position: Option<usize>,
    /// Whether this stream's content has already passed through `Crypter::decrypt`.
    pub(crate) decrypted: bool,
}

impl Stream {
    pub fn new(dict: Dictionary, content: Vec<u8>) -> Self {
        let mut dict = dict;
        dict.set("Length", Object::Integer(content.len() as i64));
        Stream { dict, content, start_position: None, decrypted: false }
    }

    pub fn with_position(dict: Dictionary, position: usize) -> Self {
        Stream { dict, content: Vec::new(), start_position: Some(position), decrypted: false }
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.dict.set("Length", Object::Integer(content.len() as i64));
        self.content = content;
        self.start_position = None;
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.enum_variant())
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn object_graph_round_trips_through_json() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Count", Object::Integer(3));
        dict.set("Kids", Object::Array(vec![Object::Reference((2, 0)), Object::Reference((3, 0))]));
        let stream = Object::Stream(Stream::new(Dictionary::new(), b"payload".to_vec()));

        let original = Object::Array(vec![Object::Dictionary(dict), stream]);
        let json = serde_json::to_string(&original).unwrap();
        let restored: Object = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
