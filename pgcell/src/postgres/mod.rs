//! Postgres type metadata.
//!
//! - [`Oid`] and [`PgType`]
//! - [`oid`] constants of the built-in types
//! - [`Format`], the wire transmission format
mod pg_type;
mod pg_format;

pub use pg_type::{Oid, PgType, oid};
pub use pg_format::Format;

pub(crate) use pg_type::{BUILTINS, UNKNOWN, BuiltinKind, binary_is_opaque};
