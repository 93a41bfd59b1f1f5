//! Literal scanner.
//!
//! Turns one scalar token of a text payload into a [`Value`]. Tokens come
//! either from a whole cell or from the composite and array splitters, which
//! already removed quoting and escapes.
use bytes::Bytes;

use crate::{
    common::ByteStr,
    decode::DecodeError,
    descriptor::ScalarKind,
    value::Value,
};

const SNIPPET_LEN: usize = 64;

/// A scalar token of a text payload.
#[derive(Debug, Clone)]
pub struct Token {
    text: ByteStr,
    offset: usize,
    verbatim: bool,
    quoted: bool,
    null: bool,
}

impl Token {
    /// Token spanning a whole payload.
    pub fn whole(raw: ByteStr) -> Self {
        Self { text: raw, offset: 0, verbatim: true, quoted: false, null: false }
    }

    /// Token that is a slice of the payload, `offset` is where `text` starts.
    pub(crate) fn verbatim(raw: &ByteStr, text: &str, offset: usize, quoted: bool) -> Self {
        Self { text: raw.slice_ref(text), offset, verbatim: true, quoted, null: false }
    }

    /// Token whose text is rebuilt from an escaped source, `offset` is where the source starts.
    pub(crate) fn unescaped(text: Vec<u8>, offset: usize, quoted: bool) -> Result<Self, DecodeError> {
        let text = ByteStr::from(String::from_utf8(text)?);
        Ok(Self { text, offset, verbatim: false, quoted, null: false })
    }

    /// The null marker.
    pub(crate) fn null(offset: usize) -> Self {
        Self { text: ByteStr::default(), offset, verbatim: true, quoted: false, null: true }
    }

    /// Returns token text, without quoting and escapes.
    pub fn text(&self) -> &ByteStr {
        &self.text
    }

    /// Returns token position in the payload.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` if token was quoted.
    pub const fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Returns `true` if token is the null marker.
    pub const fn is_null(&self) -> bool {
        self.null
    }

    /// Move an error of a nested decode into payload coordinate.
    pub(crate) fn locate(&self, err: DecodeError) -> DecodeError {
        match self.verbatim {
            true => err.shift(self.offset),
            false => err.at(self.offset),
        }
    }

    fn malformed(&self, kind: ScalarKind) -> DecodeError {
        DecodeError::malformed(kind.name(), self.offset, snippet(&self.text))
    }
}

/// Scan a token as the given scalar kind.
///
/// The null marker scans to [`Value::Null`] for every kind. Numeric kinds
/// ignore surrounding ascii whitespace.
///
/// ```
/// use pgcell::{Value, descriptor::ScalarKind, scan::{Token, scan}};
///
/// let token = Token::whole(" 0.25".into());
/// assert_eq!(scan(&token, ScalarKind::Float).unwrap(), Value::Float(0.25));
/// ```
pub fn scan(token: &Token, kind: ScalarKind) -> Result<Value, DecodeError> {
    if token.null {
        return Ok(Value::Null);
    }

    let text = token.text.as_str();

    match kind {
        ScalarKind::Text => Ok(Value::Text(token.text.clone())),
        ScalarKind::Bool => match text {
            "t" => Ok(Value::Bool(true)),
            "f" => Ok(Value::Bool(false)),
            _ => Err(token.malformed(kind)),
        },
        ScalarKind::Int => {
            let t = text.trim_ascii();
            if !is_integer(t) {
                return Err(token.malformed(kind));
            }
            t.parse().map(Value::Int).map_err(|_|token.malformed(kind))
        }
        ScalarKind::Float => {
            let t = text.trim_ascii();
            if let Some(f) = special_float(t) {
                return Ok(Value::Float(f));
            }
            if !is_decimal(t) {
                return Err(token.malformed(kind));
            }
            t.parse().map(Value::Float).map_err(|_|token.malformed(kind))
        }
        ScalarKind::Numeric => {
            let t = text.trim_ascii();
            if let Some(f) = special_float(t) {
                return Ok(Value::Float(f));
            }
            number(t).ok_or_else(||token.malformed(kind))
        }
        ScalarKind::Bytea => bytea(text).map(Value::Bytes).ok_or_else(||token.malformed(kind)),
    }
}

/// Integral literal to [`Value::Int`], falling back to [`Value::Float`]
/// outside `i64`. Fractional literal to [`Value::Float`].
pub(crate) fn number(t: &str) -> Option<Value> {
    if is_integer(t) {
        return match t.parse::<i64>() {
            Ok(ok) => Some(Value::Int(ok)),
            Err(_) => t.parse().ok().map(Value::Float),
        };
    }
    if is_decimal(t) {
        return t.parse().ok().map(Value::Float);
    }
    None
}

fn special_float(t: &str) -> Option<f64> {
    match t {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn digits(b: &[u8], mut i: usize) -> usize {
    while b.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

/// `-?\d+`
fn is_integer(t: &str) -> bool {
    let b = t.as_bytes();
    let start = usize::from(b.first() == Some(&b'-'));
    let end = digits(b, start);
    end > start && end == b.len()
}

/// `-?\d+(\.\d+)?([eE][+-]?\d+)?`
fn is_decimal(t: &str) -> bool {
    let b = t.as_bytes();
    let start = usize::from(b.first() == Some(&b'-'));
    let mut i = digits(b, start);
    if i == start {
        return false;
    }
    if b.get(i) == Some(&b'.') {
        let end = digits(b, i + 1);
        if end == i + 1 {
            return false;
        }
        i = end;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let end = digits(b, i);
        if end == i {
            return false;
        }
        i = end;
    }
    i == b.len()
}

/// `bytea` output in hex (`\x0a0b`) or legacy escape format.
fn bytea(text: &str) -> Option<Bytes> {
    let b = text.as_bytes();

    if let Some(hex) = b.strip_prefix(b"\\x") {
        let hex: Vec<u8> = hex.iter().copied().filter(|e|!e.is_ascii_whitespace()).collect();
        if hex.len() % 2 != 0 {
            return None;
        }
        return hex
            .chunks_exact(2)
            .map(|e|Some(nibble(e[0])? << 4 | nibble(e[1])?))
            .collect::<Option<Vec<u8>>>()
            .map(Bytes::from);
    }

    let mut out = Vec::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        match (b[i], b.get(i + 1)) {
            (b'\\', Some(b'\\')) => {
                out.push(b'\\');
                i += 2;
            }
            (b'\\', _) => {
                let oct = b.get(i + 1..i + 4)?;
                if !oct.iter().all(|e|(b'0'..=b'7').contains(e)) {
                    return None;
                }
                let n = oct.iter().fold(0u16, |acc, e|acc * 8 + u16::from(e - b'0'));
                out.push(u8::try_from(n).ok()?);
                i += 4;
            }
            (c, _) => {
                out.push(c);
                i += 1;
            }
        }
    }
    Some(Bytes::from(out))
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Truncated token for error message.
pub(crate) fn snippet(text: &str) -> String {
    if text.len() <= SNIPPET_LEN {
        return text.to_owned();
    }
    let mut end = SNIPPET_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod test {
    use super::*;

    fn tok(s: &'static str) -> Token {
        Token::whole(ByteStr::from_static(s))
    }

    #[test]
    fn null_for_every_kind() {
        for kind in [ScalarKind::Bool, ScalarKind::Int, ScalarKind::Float, ScalarKind::Text] {
            assert_eq!(scan(&Token::null(3), kind).unwrap(), Value::Null);
        }
    }

    #[test]
    fn integers() {
        assert_eq!(scan(&tok("42"), ScalarKind::Int).unwrap(), Value::Int(42));
        assert_eq!(scan(&tok(" -7 "), ScalarKind::Int).unwrap(), Value::Int(-7));
        assert!(scan(&tok("4.2"), ScalarKind::Int).is_err());
        assert!(scan(&tok("+4"), ScalarKind::Int).is_err());
        assert!(scan(&tok("99999999999999999999"), ScalarKind::Int).is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(scan(&tok("0.25"), ScalarKind::Float).unwrap(), Value::Float(0.25));
        assert_eq!(scan(&tok("1e+300"), ScalarKind::Float).unwrap(), Value::Float(1e300));
        assert_eq!(scan(&tok("-Infinity"), ScalarKind::Float).unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(scan(&tok("NaN"), ScalarKind::Float).unwrap(), Value::Float(f) if f.is_nan()));
        for bad in ["1.", ".5", "1e", "0x10", "inf", ""] {
            let err = scan(&tok(bad), ScalarKind::Float).unwrap_err();
            assert!(matches!(err, DecodeError::MalformedLiteral { kind: "float", offset: 0, .. }), "{bad}");
        }
    }

    #[test]
    fn numerics() {
        assert_eq!(scan(&tok("12"), ScalarKind::Numeric).unwrap(), Value::Int(12));
        assert_eq!(scan(&tok("12.50"), ScalarKind::Numeric).unwrap(), Value::Float(12.5));
        assert_eq!(
            scan(&tok("123456789012345678901234"), ScalarKind::Numeric).unwrap(),
            Value::Float(123456789012345678901234.0)
        );
    }

    #[test]
    fn booleans_are_case_sensitive() {
        assert_eq!(scan(&tok("t"), ScalarKind::Bool).unwrap(), Value::Bool(true));
        assert_eq!(scan(&tok("f"), ScalarKind::Bool).unwrap(), Value::Bool(false));
        assert!(scan(&tok("T"), ScalarKind::Bool).is_err());
        assert!(scan(&tok("true"), ScalarKind::Bool).is_err());
    }

    #[test]
    fn text_is_verbatim() {
        assert_eq!(scan(&tok(" NULL "), ScalarKind::Text).unwrap(), Value::Text(" NULL ".into()));
    }

    #[test]
    fn bytea_formats() {
        assert_eq!(
            scan(&tok("\\xdeadBEEF"), ScalarKind::Bytea).unwrap(),
            Value::Bytes(Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]))
        );
        assert_eq!(
            scan(&tok("a\\\\b\\001"), ScalarKind::Bytea).unwrap(),
            Value::Bytes(Bytes::from_static(b"a\\b\x01"))
        );
        assert!(scan(&tok("\\xabc"), ScalarKind::Bytea).is_err());
        assert!(scan(&tok("\\9"), ScalarKind::Bytea).is_err());
    }

    #[test]
    fn long_snippet_is_truncated() {
        let long = "x".repeat(100);
        assert_eq!(snippet(&long).len(), SNIPPET_LEN + 3);
    }
}
