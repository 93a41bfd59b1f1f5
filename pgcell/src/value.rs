//! Decoded postgres value.
use bytes::Bytes;
use std::fmt::{self, Write};

use crate::{common::ByteStr, document::Document, record::Record};

/// A decoded cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(ByteStr),
    /// `bytea`.
    Bytes(Bytes),
    /// Composite value.
    Record(Record),
    /// Array value, nested for multi dimensional array.
    Array(Vec<Value>),
    /// `json` or `jsonb` value.
    Document(Document),
}

impl Value {
    /// Returns name of the variant, used in error message.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytea",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Document(_) => "json",
        }
    }

    /// Returns `true` if value is `NULL`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Render value in postgres text output format.
    ///
    /// Decoding the rendered text with the same type yields an equal value.
    ///
    /// ```
    /// use pgcell::{Value, Record};
    ///
    /// let record = Record::from_pairs([("grade", Value::Text("A b".into())), ("distrib", Value::Null)]);
    /// assert_eq!(Value::Record(record).literal().to_string(), r#"("A b",)"#);
    ///
    /// let array = Value::Array(vec![Value::Text("x,y".into()), Value::Null]);
    /// assert_eq!(array.literal().to_string(), r#"{"x,y",NULL}"#);
    /// ```
    pub fn literal(&self) -> Literal<'_> {
        Literal(self)
    }
}

/// [`Display`][fmt::Display] implementation returned by [`Value::literal`].
pub struct Literal<'a>(&'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("NULL"),
            value => render(value, f),
        }
    }
}

fn render<W: Write>(value: &Value, f: &mut W) -> fmt::Result {
    match value {
        Value::Null => Ok(()),
        Value::Bool(true) => f.write_str("t"),
        Value::Bool(false) => f.write_str("f"),
        Value::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
        Value::Float(n) if n.is_nan() => f.write_str("NaN"),
        Value::Float(n) if n.is_infinite() => {
            f.write_str(if n.is_sign_positive() { "Infinity" } else { "-Infinity" })
        }
        Value::Float(n) => write!(f, "{n:?}"),
        Value::Text(s) => f.write_str(s),
        Value::Bytes(b) => {
            f.write_str("\\x")?;
            b.iter().try_for_each(|e|write!(f, "{e:02x}"))
        }
        Value::Document(d) => write!(f, "{d}"),
        Value::Array(items) => {
            f.write_char('{')?;
            for (i, item) in items.iter().enumerate() {
                if i != 0 {
                    f.write_char(',')?;
                }
                match item {
                    Value::Null => f.write_str("NULL")?,
                    Value::Array(_) => render(item, f)?,
                    item => {
                        let mut buf = String::new();
                        render(item, &mut buf)?;
                        array_element(&buf, f)?;
                    }
                }
            }
            f.write_char('}')
        }
        Value::Record(record) => {
            f.write_char('(')?;
            for (i, item) in record.values().iter().enumerate() {
                if i != 0 {
                    f.write_char(',')?;
                }
                if item.is_null() {
                    continue;
                }
                let mut buf = String::new();
                render(item, &mut buf)?;
                record_field(&buf, f)?;
            }
            f.write_char(')')
        }
    }
}

/// Quote with backslash escapes when required by array input.
fn array_element<W: Write>(text: &str, f: &mut W) -> fmt::Result {
    let quote = text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text.bytes().any(|e|matches!(e, b'{' | b'}' | b',' | b'"' | b'\\') || e.is_ascii_whitespace());

    if !quote {
        return f.write_str(text);
    }

    f.write_char('"')?;
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

/// Quote with doubled quote and backslash when required by record input.
fn record_field<W: Write>(text: &str, f: &mut W) -> fmt::Result {
    let quote = text.is_empty()
        || text.bytes().any(|e|matches!(e, b'(' | b')' | b',' | b'"' | b'\\') || e.is_ascii_whitespace());

    if !quote {
        return f.write_str(text);
    }

    f.write_char('"')?;
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char(c)?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Self::Document(value)
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::{Serialize, ser::SerializeSeq};

        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bytes(b) => serializer.serialize_bytes(b),
            Self::Record(r) => r.serialize(serializer),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Document(d) => d.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{
        descriptor::{Field, ScalarKind, TypeDescriptor},
        postgres::oid,
    };

    fn roundtrip(ty: &TypeDescriptor, value: Value) {
        let text = value.literal().to_string();
        assert_eq!(ty.decode_text(text.clone()).unwrap(), value, "{text}");
    }

    #[test]
    fn scalar_literals() {
        assert_eq!(Value::Bool(true).literal().to_string(), "t");
        assert_eq!(Value::Float(f64::NEG_INFINITY).literal().to_string(), "-Infinity");
        assert_eq!(Value::Float(0.25).literal().to_string(), "0.25");
        assert_eq!(Value::Bytes(Bytes::from_static(b"\x01\xff")).literal().to_string(), "\\x01ff");
        assert_eq!(Value::Null.literal().to_string(), "NULL");
    }

    #[test]
    fn array_roundtrip() {
        let text = Arc::new(TypeDescriptor::scalar(oid::TEXT, "text", ScalarKind::Text));
        let ty = TypeDescriptor::array(oid::TEXT_ARRAY, "_text", text);
        roundtrip(&ty, Value::Array(vec![
            Value::Array(vec![Value::Text("a b".into()), Value::Text("".into())]),
            Value::Array(vec![Value::Text("null".into()), Value::Null]),
            Value::Array(vec![Value::Text("q\"\\".into()), Value::Text("{x}".into())]),
        ]));
    }

    #[test]
    fn record_roundtrip() {
        let int8 = Arc::new(TypeDescriptor::scalar(oid::INT8, "int8", ScalarKind::Int));
        let text = Arc::new(TypeDescriptor::scalar(oid::TEXT, "text", ScalarKind::Text));
        let ints = Arc::new(TypeDescriptor::array(oid::INT8_ARRAY, "_int8", int8.clone()));
        let inner = Arc::new(TypeDescriptor::composite(0, "inner", [Field::new("t", text.clone())]));
        let ty = TypeDescriptor::composite(0, "outer", [
            Field::new("id", int8),
            Field::new("name", text),
            Field::new("ids", ints),
            Field::new("inner", inner),
        ]);

        roundtrip(&ty, Value::Record(Record::from_pairs([
            ("id", Value::Int(-1)),
            ("name", Value::Text("(a, \"b\")\\".into())),
            ("ids", Value::Array(vec![Value::Int(1), Value::Null])),
            ("inner", Value::Record(Record::from_pairs([("t", Value::Text("x,y".into()))]))),
        ])));

        roundtrip(&ty, Value::Record(Record::from_pairs([
            ("id", Value::Null),
            ("name", Value::Text("".into())),
            ("ids", Value::Array(vec![])),
            ("inner", Value::Null),
        ])));
    }

    #[test]
    fn array_of_records_roundtrip() {
        let text = Arc::new(TypeDescriptor::scalar(oid::TEXT, "text", ScalarKind::Text));
        let float8 = Arc::new(TypeDescriptor::scalar(oid::FLOAT8, "float8", ScalarKind::Float));
        let item = Arc::new(TypeDescriptor::composite(0, "item", [
            Field::new("grade", text),
            Field::new("distrib", float8),
        ]));
        let ty = TypeDescriptor::array(0, "_item", item);
        let record = |g: &'static str, d: f64| {
            Value::Record(Record::from_pairs([("grade", Value::Text(g.into())), ("distrib", Value::Float(d))]))
        };
        roundtrip(&ty, Value::Array(vec![record("A", 0.1), record("B c", 1e300), Value::Null]));
    }
}
