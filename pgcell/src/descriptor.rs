//! Type metadata consumed by the decoders.
//!
//! A [`TypeDescriptor`] is built once per type, shared behind [`Arc`], and
//! never mutated afterwards.
use bytes::Bytes;
use std::sync::Arc;

use crate::{
    Config,
    array,
    binary,
    common::{ByteStr, span},
    composite,
    config::Nesting,
    decode::DecodeError,
    document,
    postgres::{Format, Oid},
    scan::{self, Token},
    value::Value,
};

/// Postgres type description.
#[derive(Debug)]
pub struct TypeDescriptor {
    oid: Oid,
    name: ByteStr,
    kind: TypeKind,
}

/// Kind of a type, decides which decoder a payload is dispatched to.
#[derive(Debug)]
pub enum TypeKind {
    Scalar(ScalarKind),
    Composite(Composite),
    Array(Array),
    Document(DocumentKind),
}

/// Scalar decoding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `t` or `f`.
    Bool,
    /// Integer that fit in `i64`.
    Int,
    /// Floating point, including `NaN` and `Infinity`.
    Float,
    /// Arbitrary precision number, integral value decoded as integer.
    Numeric,
    /// Verbatim text.
    Text,
    /// Binary string in hex or escape format.
    Bytea,
}

/// Json flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `json`, stored as text.
    Json,
    /// `jsonb`, binary format prefixed with a version byte.
    Jsonb,
}

/// Composite type fields.
#[derive(Debug)]
pub struct Composite {
    fields: Box<[Field]>,
    names: Arc<[ByteStr]>,
}

/// Composite type field.
#[derive(Debug, Clone)]
pub struct Field {
    name: ByteStr,
    ty: Arc<TypeDescriptor>,
}

/// Array type element.
#[derive(Debug)]
pub struct Array {
    element: Arc<TypeDescriptor>,
    delimiter: u8,
}

impl TypeDescriptor {
    /// Create scalar type.
    pub fn scalar(oid: Oid, name: impl Into<ByteStr>, kind: ScalarKind) -> Self {
        Self { oid, name: name.into(), kind: TypeKind::Scalar(kind) }
    }

    /// Create json type.
    pub fn document(oid: Oid, name: impl Into<ByteStr>, kind: DocumentKind) -> Self {
        Self { oid, name: name.into(), kind: TypeKind::Document(kind) }
    }

    /// Create composite type, fields order is preserved.
    pub fn composite(oid: Oid, name: impl Into<ByteStr>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self { oid, name: name.into(), kind: TypeKind::Composite(Composite::new(fields)) }
    }

    /// Create array type with `,` delimiter.
    pub fn array(oid: Oid, name: impl Into<ByteStr>, element: Arc<TypeDescriptor>) -> Self {
        Self::array_delimited(oid, name, element, b',')
    }

    /// Create array type with custom delimiter, for example `box` uses `;`.
    pub fn array_delimited(oid: Oid, name: impl Into<ByteStr>, element: Arc<TypeDescriptor>, delimiter: u8) -> Self {
        Self { oid, name: name.into(), kind: TypeKind::Array(Array::new(element, delimiter)) }
    }

    /// Returns type [`Oid`].
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns type kind.
    pub const fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Returns `true` for composite and array type.
    ///
    /// Only these types require registration.
    pub const fn is_dynamic(&self) -> bool {
        matches!(self.kind, TypeKind::Composite(_) | TypeKind::Array(_))
    }

    /// Decode text format payload with default [`Config`].
    ///
    /// ```
    /// use pgcell::{Value, descriptor::{ScalarKind, TypeDescriptor}};
    ///
    /// let int4 = TypeDescriptor::scalar(23, "int4", ScalarKind::Int);
    /// assert_eq!(int4.decode_text("420").unwrap(), Value::Int(420));
    /// ```
    pub fn decode_text(&self, raw: impl Into<ByteStr>) -> Result<Value, DecodeError> {
        let raw = raw.into();
        let config = Config::default();
        config.check_payload(raw.len())?;
        self.text(&raw, &mut Nesting::new(&config))
    }

    /// Decode payload in the given format.
    pub fn decode(&self, format: Format, raw: Bytes, config: &Config) -> Result<Value, DecodeError> {
        span!("decode", ty = self.name.as_str(), len = raw.len());
        config.check_payload(raw.len())?;
        let mut nest = Nesting::new(config);
        match format {
            Format::Text => self.text(&ByteStr::from_utf8(raw)?, &mut nest),
            Format::Binary => binary::decode(raw, self, &mut nest),
        }
    }

    /// Dispatch a complete text payload.
    pub(crate) fn text(&self, raw: &ByteStr, nest: &mut Nesting) -> Result<Value, DecodeError> {
        match &self.kind {
            TypeKind::Scalar(kind) => scan::scan(&Token::whole(raw.clone()), *kind),
            TypeKind::Composite(c) => composite::parse(raw, c, nest).map(Value::Record),
            TypeKind::Array(a) => array::parse(raw, a, nest).map(Value::Array),
            TypeKind::Document(_) => document::parse(raw, nest).map(Value::Document),
        }
    }

    /// Dispatch a token split out of a composite or array.
    pub(crate) fn token(&self, token: &Token, nest: &mut Nesting) -> Result<Value, DecodeError> {
        if token.is_null() {
            return Ok(Value::Null);
        }
        match &self.kind {
            TypeKind::Scalar(kind) => scan::scan(token, *kind),
            _ => self.text(token.text(), nest).map_err(|e|token.locate(e)),
        }
    }
}

impl Composite {
    /// Create composite fields, order is preserved.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        let fields: Box<[Field]> = fields.into_iter().collect();
        let names = fields.iter().map(|e|e.name.clone()).collect();
        Self { fields, names }
    }

    /// Returns the declared fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns field names, shared with every decoded [`Record`][crate::Record].
    pub fn names(&self) -> &Arc<[ByteStr]> {
        &self.names
    }
}

impl Field {
    /// Create new field.
    pub fn new(name: impl Into<ByteStr>, ty: Arc<TypeDescriptor>) -> Self {
        Self { name: name.into(), ty }
    }

    /// Returns field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns field type.
    pub fn ty(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }
}

impl Array {
    /// Create array element description.
    pub fn new(element: Arc<TypeDescriptor>, delimiter: u8) -> Self {
        Self { element, delimiter }
    }

    /// Returns element type.
    pub fn element(&self) -> &Arc<TypeDescriptor> {
        &self.element
    }

    /// Returns element delimiter.
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl ScalarKind {
    /// Returns name used in error message.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Bytea => "bytea",
        }
    }
}
