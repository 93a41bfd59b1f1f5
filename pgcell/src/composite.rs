//! Composite (row) type decoding.
//!
//! Text format is `(field,field,...)`. An empty unquoted field is null. A
//! field may be quoted, in whole or in part, inside quotes `""` is a literal
//! quote. A backslash escapes the next character anywhere.
//!
//! <https://www.postgresql.org/docs/current/rowtypes.html#ROWTYPES-IO-SYNTAX>
use crate::{
    common::{ByteStr, span, verbose},
    config::Nesting,
    decode::DecodeError,
    descriptor::{Composite, Field},
    record::Record,
    scan::{Token, snippet},
};

const KIND: &str = "record";

/// Decode a composite text payload with default limits.
///
/// ```
/// use std::sync::Arc;
/// use pgcell::{Value, composite::decode_composite, descriptor::*};
///
/// let char = Arc::new(TypeDescriptor::scalar(1042, "bpchar", ScalarKind::Text));
/// let float8 = Arc::new(TypeDescriptor::scalar(701, "float8", ScalarKind::Float));
/// let fields = [Field::new("grade", char), Field::new("distrib", float8)];
///
/// let record = decode_composite(&"(\"A\", 0.25)".into(), &fields).unwrap();
/// assert_eq!(record.get("grade"), Some(&Value::Text("A".into())));
/// assert_eq!(record.get("distrib"), Some(&Value::Float(0.25)));
/// ```
pub fn decode_composite(raw: &ByteStr, fields: &[Field]) -> Result<Record, DecodeError> {
    parse(raw, &Composite::new(fields.iter().cloned()), &mut Nesting::default())
}

pub(crate) fn parse(raw: &ByteStr, composite: &Composite, nest: &mut Nesting) -> Result<Record, DecodeError> {
    span!("composite", fields = composite.fields().len());

    let b = raw.as_bytes();
    let mut i = skip_ws(b, 0);

    if b.get(i) != Some(&b'(') {
        return Err(DecodeError::malformed(KIND, i, snippet(raw)));
    }
    nest.enter(i)?;
    i += 1;

    let tokens = if b.get(i) == Some(&b')') && composite.fields().is_empty() {
        i += 1;
        vec![]
    } else {
        split(raw, &mut i)?
    };

    let end = skip_ws(b, i);
    if end != b.len() {
        return Err(DecodeError::malformed(KIND, end, "junk after right parenthesis"));
    }

    let fields = composite.fields();
    if tokens.len() != fields.len() {
        let offset = match tokens.get(fields.len()) {
            Some(extra) => extra.offset(),
            None => i.saturating_sub(1),
        };
        return Err(DecodeError::ArityMismatch { expected: fields.len(), found: tokens.len(), offset });
    }

    let values = tokens
        .iter()
        .zip(fields)
        .map(|(token, field)|field.ty().token(token, nest))
        .collect::<Result<Vec<_>, _>>()?;

    verbose!("decoded {} fields", values.len());
    nest.leave();

    Ok(Record::new(composite.names().clone(), values))
}

/// Split fields after the opening parenthesis, `i` ends after the closing one.
fn split(raw: &ByteStr, i: &mut usize) -> Result<Vec<Token>, DecodeError> {
    let s = raw.as_str();
    let b = s.as_bytes();
    let mut tokens = vec![];

    loop {
        let start = *i;
        let mut buf = Vec::new();
        let mut toggles = 0usize;
        let mut in_quotes = false;
        let mut edited = false;

        loop {
            let Some(&c) = b.get(*i) else {
                return Err(DecodeError::malformed(KIND, start, "unexpected end of input"));
            };
            match c {
                b'"' if in_quotes && b.get(*i + 1) == Some(&b'"') => {
                    buf.push(b'"');
                    edited = true;
                    *i += 2;
                }
                b'"' => {
                    in_quotes = !in_quotes;
                    toggles += 1;
                    *i += 1;
                }
                b'\\' => {
                    let Some(&next) = b.get(*i + 1) else {
                        return Err(DecodeError::malformed(KIND, *i, "unexpected end of input"));
                    };
                    buf.push(next);
                    edited = true;
                    *i += 2;
                }
                b',' | b')' if !in_quotes => break,
                _ => {
                    buf.push(c);
                    *i += 1;
                }
            }
        }

        let end = *i;
        let token = match toggles {
            0 if end == start => Token::null(start),
            0 if !edited => Token::verbatim(raw, &s[start..end], start, false),
            2 if !edited && b[start] == b'"' && b[end - 1] == b'"' => {
                Token::verbatim(raw, &s[start + 1..end - 1], start + 1, true)
            }
            n => Token::unescaped(buf, start, n > 0)?,
        };
        tokens.push(token);

        let delim = b[*i];
        *i += 1;
        if delim == b')' {
            return Ok(tokens);
        }
    }
}

fn skip_ws(b: &[u8], mut i: usize) -> usize {
    while b.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{descriptor::{ScalarKind, TypeDescriptor}, postgres::oid, value::Value};

    fn scalar(oid: u32, kind: ScalarKind) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::scalar(oid, "scalar", kind))
    }

    fn grade_distrib() -> Vec<Field> {
        vec![
            Field::new("grade", scalar(oid::BPCHAR, ScalarKind::Text)),
            Field::new("distrib", scalar(oid::FLOAT8, ScalarKind::Float)),
        ]
    }

    fn decode(raw: &'static str, fields: &[Field]) -> Result<Record, DecodeError> {
        decode_composite(&ByteStr::from_static(raw), fields)
    }

    #[test]
    fn order_preserving() {
        let record = decode("(\"A\", 0.25)", &grade_distrib()).unwrap();
        let expect = Record::from_pairs([
            ("grade", Value::Text("A".into())),
            ("distrib", Value::Float(0.25)),
        ]);
        assert_eq!(record, expect);
        assert_eq!(record.names().iter().map(|e|e.as_str()).collect::<Vec<_>>(), ["grade", "distrib"]);
    }

    #[test]
    fn empty_field_is_null() {
        let record = decode("(,1)", &grade_distrib()).unwrap();
        assert_eq!(record.get(0usize), Some(&Value::Null));
        assert_eq!(record.get(1usize), Some(&Value::Float(1.0)));

        let record = decode("(\"\",1)", &grade_distrib()).unwrap();
        assert_eq!(record.get(0usize), Some(&Value::Text("".into())));
    }

    #[test]
    fn quoting_rules() {
        let text = scalar(oid::TEXT, ScalarKind::Text);
        let fields = [Field::new("a", text.clone()), Field::new("b", text)];
        let record = decode(r#"("a,""b"")","c\\d\)e")"#, &fields).unwrap();
        assert_eq!(record.get(0usize), Some(&Value::Text("a,\"b\")".into())));
        assert_eq!(record.get(1usize), Some(&Value::Text("c\\d)e".into())));

        let record = decode(r#"(x"y,z"w,)"#, &fields).unwrap();
        assert_eq!(record.get(0usize), Some(&Value::Text("xy,zw".into())));
        assert_eq!(record.get(1usize), Some(&Value::Null));
    }

    #[test]
    fn arity_mismatch() {
        let err = decode("(A,0.1,9)", &grade_distrib()).unwrap_err();
        assert!(matches!(err, DecodeError::ArityMismatch { expected: 2, found: 3, offset: 7 }));

        let err = decode("(A)", &grade_distrib()).unwrap_err();
        assert!(matches!(err, DecodeError::ArityMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn zero_fields() {
        assert_eq!(decode("()", &[]).unwrap().len(), 0);
        assert!(decode("(1)", &[]).is_err());
    }

    #[test]
    fn malformed_field_offset() {
        let err = decode("(A, zero)", &grade_distrib()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedLiteral { kind: "float", offset: 3, .. }));
    }

    #[test]
    fn malformed_payload() {
        assert!(matches!(decode("A,1", &grade_distrib()), Err(DecodeError::MalformedLiteral { offset: 0, .. })));
        assert!(matches!(decode("(A,1", &grade_distrib()), Err(DecodeError::MalformedLiteral { .. })));
        assert!(matches!(decode("(A,1) x", &grade_distrib()), Err(DecodeError::MalformedLiteral { offset: 6, .. })));
    }

    #[test]
    fn nested_composite() {
        let inner = Arc::new(TypeDescriptor::composite(0, "inner", grade_distrib()));
        let fields = [Field::new("id", scalar(oid::INT4, ScalarKind::Int)), Field::new("inner", inner)];
        let record = decode(r#"(1,"(""B"",0.5)")"#, &fields).unwrap();
        let Some(Value::Record(inner)) = record.get("inner") else { panic!("expected record") };
        assert_eq!(inner.get("grade"), Some(&Value::Text("B".into())));

        let err = decode(r#"(1,"(B,x)")"#, &fields).unwrap_err();
        // verbatim quoted field, inner offset is kept
        assert_eq!(err.offset(), Some(4 + 3));
    }
}
