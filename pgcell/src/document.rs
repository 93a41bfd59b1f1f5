//! Json document decoding.
//!
//! Both `json` and `jsonb` text output are plain RFC 8259 json, parsed with
//! `serde_json`. Objects keep the position of the first occurrence of a key
//! and the value of its last occurrence.
use std::{collections::HashMap, fmt};

use serde::{
    Deserialize, Deserializer,
    de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor},
};

use crate::{
    common::{ByteStr, span},
    config::Nesting,
    decode::DecodeError,
};

/// Keys count before [`Object`] builds a lookup index.
const INDEX_THRESHOLD: usize = 16;

/// Decoded json value.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    /// Number without fraction and exponent that fit in `i64`.
    Int(i64),
    Float(f64),
    String(ByteStr),
    Array(Vec<Document>),
    Object(Object),
}

/// Ordered json object with unique keys.
///
/// Equality ignores key order.
#[derive(Clone, Default)]
pub struct Object {
    entries: Vec<(ByteStr, Document)>,
    index: Option<HashMap<ByteStr, usize>>,
}

/// Decode a json text payload with default limits.
///
/// ```
/// use pgcell::{document::{Document, decode_document}};
///
/// let doc = decode_document(&r#"{"foo":"bar","foo":3.14}"#.into()).unwrap();
/// let Document::Object(obj) = doc else { unreachable!() };
/// assert_eq!(obj.len(), 1);
/// assert_eq!(obj.get("foo"), Some(&Document::Float(3.14)));
/// ```
pub fn decode_document(raw: &ByteStr) -> Result<Document, DecodeError> {
    parse(raw, &mut Nesting::default())
}

pub(crate) fn parse(raw: &ByteStr, nest: &mut Nesting) -> Result<Document, DecodeError> {
    span!("document", len = raw.len());

    let mut exceeded = None;
    let mut de = serde_json::Deserializer::from_slice(raw.as_bytes());

    let result = Seed { nest, exceeded: &mut exceeded }
        .deserialize(&mut de)
        .and_then(|document|de.end().map(|()|document));

    result.map_err(|err|{
        let offset = offset(raw.as_bytes(), &err);
        match exceeded {
            Some(limit) => limit.at(offset),
            None => DecodeError::syntax(offset, reason(&err)),
        }
    })
}

/// Byte offset of the last byte read when `err` was detected.
fn offset(raw: &[u8], err: &serde_json::Error) -> usize {
    let line_start: usize = raw
        .split_inclusive(|e|*e == b'\n')
        .take(err.line().saturating_sub(1))
        .map(<[u8]>::len)
        .sum();
    (line_start + err.column().saturating_sub(1)).min(raw.len().saturating_sub(1))
}

/// Error message without the line and column suffix.
fn reason(err: &serde_json::Error) -> String {
    let message = err.to_string();
    match message.rsplit_once(" at line ") {
        Some((reason, _)) => reason.to_owned(),
        None => message,
    }
}

/// Document visitor tracking nesting depth.
struct Seed<'a> {
    nest: &'a mut Nesting,
    exceeded: &'a mut Option<DecodeError>,
}

impl Seed<'_> {
    fn child(&mut self) -> Seed<'_> {
        Seed { nest: &mut *self.nest, exceeded: &mut *self.exceeded }
    }

    fn enter<E: de::Error>(&mut self) -> Result<(), E> {
        self.nest.enter(0).map_err(|err|{
            let e = E::custom(&err);
            *self.exceeded = Some(err);
            e
        })
    }
}

impl<'de> DeserializeSeed<'de> for Seed<'_> {
    type Value = Document;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for Seed<'_> {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any valid json value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Document, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        match i64::try_from(v) {
            Ok(v) => Ok(Document::Int(v)),
            Err(_) => Ok(Document::Float(v as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Ok(Document::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::String(ByteStr::copy_from_str(v)))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::String(v.into()))
    }

    fn visit_seq<A>(mut self, mut seq: A) -> Result<Document, A::Error>
    where
        A: SeqAccess<'de>,
    {
        self.enter::<A::Error>()?;

        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(self.child())? {
            items.push(item);
        }

        self.nest.leave();
        Ok(Document::Array(items))
    }

    fn visit_map<A>(mut self, mut map: A) -> Result<Document, A::Error>
    where
        A: MapAccess<'de>,
    {
        self.enter::<A::Error>()?;

        let mut object = Object::default();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(self.child())?;
            object.insert(key.into(), value);
        }

        self.nest.leave();
        Ok(Document::Object(object))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut nest = Nesting::default();
        let mut exceeded = None;
        Seed { nest: &mut nest, exceeded: &mut exceeded }.deserialize(deserializer)
    }
}

impl Document {
    /// Returns json type name.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Returns `true` if document is json `null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns number as `f64`, integer included.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Document]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Lookup object member, returns [`None`] if document is not an object.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object()?.get(key)
    }
}

impl Object {
    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if object contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup value by key.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.position(key).map(|i|&self.entries[i].1)
    }

    /// Returns `true` if object contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert a member.
    ///
    /// Existing key keeps its position and the value is replaced, the
    /// previous value is returned.
    pub fn insert(&mut self, key: ByteStr, value: Document) -> Option<Document> {
        if let Some(i) = self.position(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }

        if let Some(index) = &mut self.index {
            index.insert(key.clone(), self.entries.len());
        }
        self.entries.push((key, value));

        if self.index.is_none() && self.entries.len() > INDEX_THRESHOLD {
            let index = self.entries.iter().enumerate().map(|(i, (k, _))|(k.clone(), i)).collect();
            self.index = Some(index);
        }

        None
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Document)> {
        self.entries.iter().map(|(k, v)|(k.as_str(), v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(k, _)|k.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        match &self.index {
            Some(index) => index.get(key).copied(),
            None => self.entries.iter().position(|(k, _)|k == key),
        }
    }
}

impl IntoIterator for Object {
    type Item = (ByteStr, Document);

    type IntoIter = std::vec::IntoIter<(ByteStr, Document)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<ByteStr>> FromIterator<(K, Document)> for Object {
    fn from_iter<T: IntoIterator<Item = (K, Document)>>(iter: T) -> Self {
        let mut object = Object::default();
        for (k, v) in iter {
            object.insert(k.into(), v);
        }
        object
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)|other.get(k) == Some(v))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Compact json text.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Self::Float(n) if n.is_finite() => write!(f, "{n:?}"),
            // not representable in json
            Self::Float(_) => f.write_str("null"),
            Self::String(s) => write_str(f, s),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(object) => {
                f.write_str("{")?;
                for (i, (k, v)) in object.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write_str(f, k)?;
                    write!(f, ":{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_str(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c < ' ' => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl serde::Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (k, v) in object.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Config;

    fn decode(raw: &'static str) -> Result<Document, DecodeError> {
        decode_document(&ByteStr::from_static(raw))
    }

    fn object(doc: Document) -> Object {
        match doc {
            Document::Object(object) => object,
            other => panic!("expected object, found {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys() {
        let obj = object(decode(r#"{"foo":"bar","foo":3.14}"#).unwrap());
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get("foo"), Some(&Document::Float(3.14)));

        let obj = object(decode(r#"{"a":1,"b":2,"a":3}"#).unwrap());
        assert_eq!(obj.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(obj.get("a"), Some(&Document::Int(3)));
    }

    #[test]
    fn scalar_members() {
        let obj = object(decode(r#"{"ok": false, "none": null}"#).unwrap());
        assert_eq!(obj.get("ok"), Some(&Document::Bool(false)));
        assert!(obj.contains_key("none"));
        assert_eq!(obj.get("none"), Some(&Document::Null));
    }

    #[test]
    fn empty_containers() {
        assert!(object(decode("{}").unwrap()).is_empty());
        assert_eq!(decode(" [ ] ").unwrap(), Document::Array(vec![]));
    }

    #[test]
    fn numbers() {
        assert_eq!(decode("42").unwrap(), Document::Int(42));
        assert_eq!(decode("-0").unwrap().as_f64(), Some(0.0));
        assert_eq!(decode("9223372036854775807").unwrap(), Document::Int(i64::MAX));
        assert_eq!(decode("9223372036854775808").unwrap(), Document::Float(9223372036854775808.0));
        assert_eq!(decode("1.5e2").unwrap(), Document::Float(150.0));
        assert_eq!(decode("1E2").unwrap(), Document::Float(100.0));
        assert_eq!(decode("92233720368547758070").unwrap(), Document::Float(92233720368547758070.0));
        for bad in ["01", "1.", ".5", "-", "1e", "+1"] {
            assert!(decode(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn strings() {
        assert_eq!(decode(r#""plain""#).unwrap(), Document::String("plain".into()));
        assert_eq!(
            decode(r#""a\"b\\c\/d\né😀""#).unwrap(),
            Document::String("a\"b\\c/d\né😀".into())
        );
        assert!(decode(r#""\ud83d""#).is_err());
        assert!(decode(r#""\x""#).is_err());
        assert!(decode("\"a\u{1}\"").is_err());
    }

    #[test]
    fn syntax_offsets() {
        let err = decode(r#"{"a":1,}"#).unwrap_err();
        assert!(matches!(err, DecodeError::DocumentSyntax { offset: 7, .. }));

        let err = decode("[1,2").unwrap_err();
        assert!(matches!(err, DecodeError::DocumentSyntax { offset: 3, .. }));

        let err = decode("[1] x").unwrap_err();
        assert!(matches!(err, DecodeError::DocumentSyntax { offset: 4, .. }));

        let err = decode("trux").unwrap_err();
        assert!(matches!(err, DecodeError::DocumentSyntax { offset: 3, .. }));

        let err = decode("{\n  \"a\": 1,\n}").unwrap_err();
        assert!(matches!(err, DecodeError::DocumentSyntax { offset: 12, .. }));

        assert!(decode("").is_err());
        assert!(decode("[1 2]").is_err());
    }

    #[test]
    fn syntax_reason_has_no_position() {
        let err = decode("[1] x").unwrap_err();
        let DecodeError::DocumentSyntax { reason, .. } = err else { unreachable!() };
        assert_eq!(reason, "trailing characters");
    }

    #[test]
    fn deserialize_from_serde_json() {
        let doc: Document = serde_json::from_str(r#"{"b":[1,2.5],"a":null,"b":"x"}"#).unwrap();
        let obj = object(doc);
        assert_eq!(obj.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(obj.get("b"), Some(&Document::String("x".into())));
        assert_eq!(obj.get("a"), Some(&Document::Null));
    }

    #[test]
    fn order_insensitive_equality() {
        let a = decode(r#"{"x":1,"y":[true,null]}"#).unwrap();
        let b = decode(r#"{"y":[true,null],"x":1}"#).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, decode(r#"{"x":1}"#).unwrap());
    }

    #[test]
    fn large_object_index() {
        let mut object = Object::default();
        for i in 0..40 {
            object.insert(format!("k{i}").into(), Document::Int(i));
        }
        object.insert("k3".into(), Document::Null);
        assert_eq!(object.len(), 40);
        assert_eq!(object.get("k3"), Some(&Document::Null));
        assert_eq!(object.get("k39"), Some(&Document::Int(39)));
        assert_eq!(object.keys().nth(3), Some("k3"));
    }

    #[test]
    fn display_is_json() {
        let doc = decode(r#"{ "a" : [1, 2.5, "q\""], "b": {} }"#).unwrap();
        assert_eq!(doc.to_string(), r#"{"a":[1,2.5,"q\""],"b":{}}"#);
    }

    #[test]
    fn depth_limit() {
        let mut nest = Nesting::new(&Config::default().max_depth(2));
        let err = parse(&"[[[1]]]".into(), &mut nest).unwrap_err();
        assert!(matches!(err, DecodeError::Limit { offset: 2, .. }));
    }
}
