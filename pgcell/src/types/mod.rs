//! Type integration with external types
//!
//! Implementation [`Decode`][d] and [`PgType`][p] for external types.
//!
//! Available for:
//!
//! - [`serde`]'s [`Deserialize`][sd] and [`Serialize`][ss] via [`Json`], requires `json` feature
//! - [`time`][::time]'s [`Date`][td], [`Time`][tt], [`PrimitiveDateTime`][tp], [`UtcDateTime`][tu],
//!   requires `time` feature
//!
//! [d]: crate::Decode
//! [p]: crate::postgres::PgType
//! [sd]: serde::Deserialize
//! [ss]: serde::Serialize
//! [td]: ::time::Date
//! [tt]: ::time::Time
//! [tp]: ::time::PrimitiveDateTime
//! [tu]: ::time::UtcDateTime

#[cfg(feature = "json")]
mod json;
#[cfg(feature = "json")]
pub use json::Json;

#[cfg(feature = "time")]
mod time;
