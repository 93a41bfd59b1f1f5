//! Typed extraction from decoded values.
//!
//! - [`Decode`]
//! - [`DecodeError`]
use bytes::Bytes;

use crate::{common::ByteStr, document::Document, record::Record, value::Value};

mod error;

pub use error::{DecodeError, Limit};

/// A type that can be constructed from [`Value`].
pub trait Decode: Sized {
    /// Try decode self from value.
    fn decode(value: Value) -> Result<Self, DecodeError>;
}

impl Decode for Value {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            value => T::decode(value).map(Some),
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::decode).collect(),
            Value::Null => Err(DecodeError::Null),
            other => Err(mismatch("array", &other)),
        }
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &Value) -> DecodeError {
    DecodeError::TypeMismatch { expected, found: found.kind_name() }
}

macro_rules! decode {
    ($ty:ty, $expected:literal, $($pat:pat => $body:expr),* $(,)?) => {
        impl Decode for $ty {
            fn decode(value: Value) -> Result<Self, DecodeError> {
                match value {
                    $($pat => $body,)*
                    Value::Null => Err(DecodeError::Null),
                    other => Err(mismatch($expected, &other)),
                }
            }
        }
    };
}

macro_rules! int {
    ($ty:ty, $expected:literal) => {
        decode!($ty, $expected, Value::Int(i) => <$ty>::try_from(i).map_err(|_|DecodeError::TypeMismatch {
            expected: $expected,
            found: "out of range integer",
        }));
    };
}

decode!(bool, "boolean", Value::Bool(b) => Ok(b));
decode!(i64, "integer", Value::Int(i) => Ok(i));
int!(i32, "int4");
int!(i16, "int2");
decode!(f64, "float", Value::Float(f) => Ok(f), Value::Int(i) => Ok(i as f64));
decode!(f32, "float", Value::Float(f) => Ok(f as f32), Value::Int(i) => Ok(i as f32));
decode!(String, "text", Value::Text(s) => Ok(String::from(s.as_str())));
decode!(ByteStr, "text", Value::Text(s) => Ok(s));
decode!(Bytes, "bytea", Value::Bytes(b) => Ok(b));
decode!(Record, "record", Value::Record(r) => Ok(r));
decode!(Document, "json", Value::Document(d) => Ok(d));

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scalars() {
        assert!(bool::decode(Value::Bool(true)).unwrap());
        assert_eq!(i16::decode(Value::Int(-3)).unwrap(), -3);
        assert_eq!(f64::decode(Value::Int(2)).unwrap(), 2.0);
        assert_eq!(String::decode(Value::Text("x".into())).unwrap(), "x");
        assert!(matches!(i16::decode(Value::Int(70000)), Err(DecodeError::TypeMismatch { expected: "int2", .. })));
        assert!(matches!(bool::decode(Value::Int(1)), Err(DecodeError::TypeMismatch { found: "integer", .. })));
        assert!(matches!(String::decode(Value::Null), Err(DecodeError::Null)));
    }

    #[test]
    fn containers() {
        let value = Value::Array(vec![Value::Int(1), Value::Null]);
        assert_eq!(Vec::<Option<i32>>::decode(value.clone()).unwrap(), [Some(1), None]);
        assert!(Vec::<i32>::decode(value).is_err());
        assert_eq!(Option::<Vec<i32>>::decode(Value::Null).unwrap(), None);
    }
}
