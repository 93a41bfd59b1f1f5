//! Postgres result value decoding
//!
//! Turns raw cell payloads, as received in a `DataRow` message, into
//! [`Value`]s. Composite, array and json types are decoded recursively
//! following their registered [`TypeDescriptor`][td].
//!
//! # Examples
//!
//! Composite array:
//!
//! ```
//! use pgcell::{Cell, Record, Registry, Value};
//!
//! # fn app() -> pgcell::Result<()> {
//! let registry = Registry::new();
//! registry.register_composite("grade_distrib", 16400, [("grade", "bpchar"), ("distrib", "float8")])?;
//! registry.register_array("_grade_distrib", 16401, "grade_distrib")?;
//!
//! let cell = Cell::text(16401, r#"{"(A,0.1)","(B,0.2)"}"#);
//! let grades = registry.decode_as::<Vec<Record>>(&cell)?;
//!
//! assert_eq!(grades.len(), 2);
//! assert_eq!(grades[1].get("grade"), Some(&Value::Text("B".into())));
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```
//!
//! Typed rows:
//!
//! ```
//! use pgcell::{Cell, Registry, postgres::oid};
//!
//! # fn app() -> pgcell::Result<()> {
//! let registry = Registry::new();
//! registry.register_composite("pair", 16500, [("id", "int4"), ("name", "text")])?;
//!
//! let value = registry.decode(&Cell::text(16500, "(4,\"foo bar\")"))?;
//! let (id, name) = value.as_record().cloned().unwrap().decode::<(i32, String)>()?;
//!
//! assert_eq!(id, 4);
//! assert_eq!(name, "foo bar");
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```
//!
//! [td]: descriptor::TypeDescriptor

extern crate self as pgcell;

pub mod common;
mod ext;

// Protocol
pub mod postgres;
pub mod config;

// Decoding
pub mod decode;
pub mod descriptor;
pub mod scan;
pub mod composite;
pub mod array;
pub mod document;
mod binary;

// Values
pub mod value;
pub mod record;
mod cell;

// Integration
pub mod registry;
pub mod types;

mod error;


pub use common::ByteStr;
pub use config::Config;
pub use decode::{Decode, DecodeError};
pub use document::Document;
pub use value::Value;
pub use record::{Record, FromRecord};
pub use cell::Cell;
pub use postgres::Format;
pub use registry::Registry;
pub use error::{Error, ErrorKind, Result};

#[cfg(feature = "macros")]
pub use pgcell_macros::{FromRecord, Decode};
