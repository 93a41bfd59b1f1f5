use std::{borrow::Cow, fmt, str::Utf8Error, string::FromUtf8Error};

/// An error when decoding a value.
///
/// Positional variants carry a byte offset into the original cell payload.
pub enum DecodeError {
    /// Scalar token does not follow the grammar of its type.
    MalformedLiteral {
        /// Name of the expected type.
        kind: &'static str,
        offset: usize,
        /// The offending token.
        literal: String,
    },
    /// Composite field count does not match the declared fields.
    ArityMismatch {
        expected: usize,
        found: usize,
        offset: usize,
    },
    /// Sibling items of an array do not share depth or dimensions.
    IrregularArrayShape {
        offset: usize,
        reason: &'static str,
    },
    /// Json document is not well formed.
    DocumentSyntax {
        offset: usize,
        reason: Cow<'static,str>,
    },
    /// A configured limit is exceeded.
    Limit {
        offset: usize,
        limit: Limit,
    },
    /// Postgres return non utf8 string.
    Utf8(Utf8Error),
    /// Value is null.
    Null,
    /// Decoded value is not the requested rust type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Field requested not found.
    FieldNotFound(Cow<'static,str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Failed to deserialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::error::Error),
    /// Failed to parse date or time literal.
    #[cfg(feature = "time")]
    Time(time::error::Parse),
}

/// Limit exceeded by [`DecodeError::Limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Maximum nesting depth.
    Depth(usize),
    /// Maximum payload size.
    Payload(usize),
}

impl DecodeError {
    pub(crate) fn malformed(kind: &'static str, offset: usize, literal: impl Into<String>) -> Self {
        Self::MalformedLiteral { kind, offset, literal: literal.into() }
    }

    pub(crate) fn syntax(offset: usize, reason: impl Into<Cow<'static,str>>) -> Self {
        Self::DocumentSyntax { offset, reason: reason.into() }
    }

    /// Returns the byte offset in the payload where decoding failed.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::MalformedLiteral { offset, .. }
            | Self::ArityMismatch { offset, .. }
            | Self::IrregularArrayShape { offset, .. }
            | Self::DocumentSyntax { offset, .. }
            | Self::Limit { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    fn offset_mut(&mut self) -> Option<&mut usize> {
        match self {
            Self::MalformedLiteral { offset, .. }
            | Self::ArityMismatch { offset, .. }
            | Self::IrregularArrayShape { offset, .. }
            | Self::DocumentSyntax { offset, .. } => Some(offset),
            // payload limit is reported against the cell, not a position
            Self::Limit { offset, limit: Limit::Depth(_) } => Some(offset),
            _ => None,
        }
    }

    /// Offset relative to a sub payload starting at `base`.
    pub(crate) fn shift(mut self, base: usize) -> Self {
        if let Some(offset) = self.offset_mut() {
            *offset += base;
        }
        self
    }

    /// Collapse offset to `offset`, for sub payload that is not a verbatim slice.
    pub(crate) fn at(mut self, at: usize) -> Self {
        if let Some(offset) = self.offset_mut() {
            *offset = at;
        }
        self
    }
}

impl std::error::Error for DecodeError { }

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::MalformedLiteral { kind, offset, literal } => {
                write!(f, "malformed {kind} literal {literal:?} at offset {offset}")
            }
            Self::ArityMismatch { expected, found, offset } => {
                write!(f, "expected {expected} fields, found {found} at offset {offset}")
            }
            Self::IrregularArrayShape { offset, reason } => {
                write!(f, "irregular array shape at offset {offset}: {reason}")
            }
            Self::DocumentSyntax { offset, reason } => {
                write!(f, "json syntax error at offset {offset}: {reason}")
            }
            Self::Limit { offset, limit: Limit::Depth(max) } => {
                write!(f, "nesting deeper than {max} at offset {offset}")
            }
            Self::Limit { limit: Limit::Payload(max), .. } => {
                write!(f, "payload larger than {max} bytes")
            }
            Self::Utf8(e) => write!(f, "{e}"),
            Self::Null => write!(f, "unexpected NULL value"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::FieldNotFound(name) => write!(f, "field not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
            #[cfg(feature = "time")]
            Self::Time(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for DecodeError {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

from!(<Utf8Error>e => Self::Utf8(e));
from!(<FromUtf8Error>e => Self::Utf8(e.utf8_error()));
#[cfg(feature = "json")]
from!(<serde_json::error::Error>e => Self::Json(e));
#[cfg(feature = "time")]
from!(<time::error::Parse>e => Self::Time(e));

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn offsets_follow_sub_payload() {
        let err = DecodeError::malformed("int", 2, "x").shift(10);
        assert_eq!(err.offset(), Some(12));
        let err = err.at(4);
        assert_eq!(err.offset(), Some(4));
        assert_eq!(DecodeError::Null.shift(3).offset(), None);
    }

    #[test]
    fn payload_limit_is_not_shifted() {
        let err = DecodeError::Limit { offset: 8, limit: Limit::Payload(8) }.shift(100);
        assert_eq!(err.offset(), Some(8));
    }

    #[test]
    fn display() {
        let err = DecodeError::ArityMismatch { expected: 2, found: 3, offset: 7 };
        assert_eq!(err.to_string(), "failed to decode value, expected 2 fields, found 3 at offset 7");
    }
}
