//! Raw result cell.
use bytes::Bytes;
use std::fmt;

use crate::{
    ext::FmtExt,
    postgres::{Format, Oid, PgType},
};

/// Undecoded result value, as received from a `DataRow` message.
#[derive(Clone)]
pub struct Cell {
    oid: Oid,
    format: Format,
    value: Option<Bytes>,
}

impl Cell {
    /// Create new cell, [`None`] value is `NULL`.
    pub fn new(oid: Oid, format: Format, value: Option<Bytes>) -> Self {
        Self { oid, format, value }
    }

    /// Text format cell.
    pub fn text(oid: Oid, value: impl Into<Bytes>) -> Self {
        Self::new(oid, Format::Text, Some(value.into()))
    }

    /// Binary format cell.
    pub fn binary(oid: Oid, value: impl Into<Bytes>) -> Self {
        Self::new(oid, Format::Binary, Some(value.into()))
    }

    /// `NULL` cell.
    pub fn null(oid: Oid) -> Self {
        Self::new(oid, Format::Text, None)
    }

    /// Cell typed after [`PgType::OID`].
    pub fn of<T: PgType + ?Sized>(format: Format, value: impl Into<Bytes>) -> Self {
        Self::new(T::OID, format, Some(value.into()))
    }

    /// Returns cell type [`Oid`].
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns cell [`Format`].
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Return `true` if value is NULL.
    pub const fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the raw value.
    ///
    /// Returns [`None`] if value is `NULL`.
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Consume self into the raw value.
    pub fn into_value(self) -> Option<Bytes> {
        self.value
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Cell");
        dbg.field("oid", &self.oid);
        dbg.field("format", &self.format);
        match &self.value {
            Some(value) => dbg.field("value", &value.lossy()),
            None => dbg.field("value", &format_args!("NULL")),
        };
        dbg.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::oid;

    #[test]
    fn constructors() {
        let cell = Cell::of::<i32>(Format::Binary, &b"\0\0\0\x01"[..]);
        assert_eq!(cell.oid(), oid::INT4);
        assert_eq!(cell.format(), Format::Binary);
        assert!(Cell::null(oid::TEXT).is_null());
        assert_eq!(
            format!("{:?}", Cell::text(oid::TEXT, "a\x01")),
            "Cell { oid: 25, format: Text, value: b\"a\\x1\" }"
        );
    }
}
