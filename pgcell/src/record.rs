//! Composite value operation.
//!
//! - [`Record`]
//! - [`FromRecord`]
//! - [`Index`]
use std::{fmt, sync::Arc};

use crate::{
    common::ByteStr,
    decode::{Decode, DecodeError},
    value::Value,
};

/// Decoded composite value.
///
/// Field names are shared with the type descriptor, equality compares names
/// and values in order.
#[derive(Clone, PartialEq)]
pub struct Record {
    names: Arc<[ByteStr]>,
    values: Vec<Value>,
}

impl Default for Record {
    fn default() -> Self {
        Self { names: Arc::from(Vec::new()), values: Vec::new() }
    }
}

impl Record {
    pub(crate) fn new(names: Arc<[ByteStr]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len(), "record names and values length mismatch");
        Self { names, values }
    }

    /// Create record from ordered `(name, value)` pairs.
    pub fn from_pairs<K: Into<ByteStr>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        let (names, values): (Vec<ByteStr>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)|(k.into(), v))
            .unzip();
        Self { names: names.into(), values }
    }

    /// Returns `true` if record contains no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns field names in declaration order.
    pub fn names(&self) -> &[ByteStr] {
        &self.names
    }

    /// Returns field values in declaration order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume self into field values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterate `(name, value)` pairs.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.names.iter().map(ByteStr::as_str).zip(&self.values)
    }

    /// Get field by name or position.
    pub fn get<I: Index>(&self, idx: I) -> Option<&Value> {
        let i = idx.position(&self.names).ok()?;
        self.values.get(i)
    }

    /// Try get and decode field.
    pub fn try_get<I: Index, D: Decode>(&self, idx: I) -> Result<D, DecodeError> {
        let i = idx.position(&self.names)?;
        D::decode(self.values[i].clone())
    }

    /// Try take and decode field, leaving [`Value::Null`] in its place.
    pub fn try_take<I: Index, D: Decode>(&mut self, idx: I) -> Result<D, DecodeError> {
        let i = idx.position(&self.names)?;
        D::decode(std::mem::take(&mut self.values[i]))
    }

    /// Try decode type using [`FromRecord`] implementation.
    pub fn decode<D: FromRecord>(self) -> Result<D, DecodeError> {
        D::from_record(self)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl serde::Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ===== Traits =====

/// Type that can be constructed from a record.
pub trait FromRecord: Sized {
    /// Construct self from record.
    fn from_record(record: Record) -> Result<Self, DecodeError>;
}

impl FromRecord for Record {
    fn from_record(record: Record) -> Result<Self, DecodeError> {
        Ok(record)
    }
}

impl FromRecord for () {
    fn from_record(_: Record) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! from_record_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRecord for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_record(mut record: Record) -> Result<Self, DecodeError> {
                Ok((
                    $(record.try_take::<usize, $t>($i)?),*,
                ))
            }
        }
    };
}

from_record_tuple!(T0 0);
from_record_tuple!(T0 0, T1 1);
from_record_tuple!(T0 0, T1 1, T2 2);
from_record_tuple!(T0 0, T1 1, T2 2, T3 3);

/// Type that can be used for indexing record field.
pub trait Index: Sized + sealed::Sealed {
    /// Returns field position.
    fn position(self, names: &[ByteStr]) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, names: &[ByteStr]) -> Result<usize, DecodeError> {
        match self < names.len() {
            true => Ok(self),
            false => Err(DecodeError::IndexOutOfBounds(self)),
        }
    }
}

impl Index for &str {
    fn position(self, names: &[ByteStr]) -> Result<usize, DecodeError> {
        names
            .iter()
            .position(|e|e == self)
            .ok_or_else(||DecodeError::FieldNotFound(String::from(self).into()))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}
