use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Decode, DecodeError, Value,
    decode::mismatch,
    document::Document,
    postgres::{Oid, PgType, oid},
};

/// Decode postgres json value using [`serde`].
///
/// ```
/// use pgcell::{Registry, Cell, postgres::oid, types::Json};
///
/// let cell = Cell::text(oid::JSONB, r#"{"id":4,"tags":["a","b"]}"#);
/// let Json(value) = Registry::new().decode_as::<Json<serde_json::Value>>(&cell).unwrap();
/// assert_eq!(value["tags"][1], "b");
/// ```
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T> PgType for Json<T> {
    /// jsonb, Binary JSON
    const OID: Oid = oid::JSONB;
}

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Document(doc) => Ok(Self(serde_json::from_value(doc.into())?)),
            Value::Null => Err(DecodeError::Null),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl Decode for serde_json::Value {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Document(doc) => Ok(doc.into()),
            Value::Null => Err(DecodeError::Null),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Null => Self::Null,
            Document::Bool(b) => Self::Bool(b),
            Document::Int(i) => Self::Number(i.into()),
            // non finite float is not representable
            Document::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            Document::String(s) => Self::String(String::from(s.as_str())),
            Document::Array(items) => Self::Array(items.into_iter().map(Into::into).collect()),
            Document::Object(obj) => Self::Object(
                obj.into_iter()
                    .map(|(key, value)|(String::from(key.as_str()), value.into()))
                    .collect(),
            ),
        }
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(T::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use super::*;
    use crate::document::decode_document;

    fn doc(raw: &'static str) -> Value {
        Value::Document(decode_document(&raw.into()).unwrap())
    }

    #[test]
    fn deserialize() {
        let Json(map) = Json::<BTreeMap<String, Vec<i32>>>::decode(doc(r#"{"b":[1,2],"a":[]}"#)).unwrap();
        assert_eq!(map["b"], [1, 2]);
        assert!(map["a"].is_empty());

        let Json(value) = Json::<serde_json::Value>::decode(doc(r#"{"foo":"bar","foo":3.14}"#)).unwrap();
        assert_eq!(value, serde_json::json!({ "foo": 3.14 }));
    }

    #[test]
    fn errors() {
        assert!(matches!(Json::<Vec<i32>>::decode(doc(r#"{"a":1}"#)), Err(DecodeError::Json(_))));
        assert!(matches!(Json::<Vec<i32>>::decode(Value::Null), Err(DecodeError::Null)));
        assert!(matches!(
            serde_json::Value::decode(Value::Int(1)),
            Err(DecodeError::TypeMismatch { expected: "json", found: "integer" })
        ));
    }
}
