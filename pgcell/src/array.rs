//! Array type decoding.
//!
//! Text format is `{item,item,...}` where an item is a nested `{...}` or a
//! leaf element. Unquoted `NULL` in any case is null, quoted elements use
//! backslash escapes. The server may prefix the value with its bounds, as in
//! `[0:1]={a,b}`, which is skipped.
//!
//! <https://www.postgresql.org/docs/current/arrays.html#ARRAYS-IO>
use crate::{
    common::{ByteStr, span, verbose},
    config::Nesting,
    decode::DecodeError,
    descriptor::{Array, TypeDescriptor},
    scan::Token,
    value::Value,
};

const KIND: &str = "array";

/// Decode an array text payload with `,` delimiter and default limits.
///
/// The result mirrors the bracket nesting of the payload.
///
/// ```
/// use pgcell::{Value, array::decode_array, descriptor::*};
///
/// let int4 = TypeDescriptor::scalar(23, "int4", ScalarKind::Int);
/// let values = decode_array(&"{{1,2},{3,4}}".into(), &int4).unwrap();
/// assert_eq!(values[1], Value::Array(vec![Value::Int(3), Value::Int(4)]));
/// ```
pub fn decode_array(raw: &ByteStr, element: &TypeDescriptor) -> Result<Vec<Value>, DecodeError> {
    parse_with(raw, element, b',', &mut Nesting::default())
}

pub(crate) fn parse(raw: &ByteStr, array: &Array, nest: &mut Nesting) -> Result<Vec<Value>, DecodeError> {
    parse_with(raw, array.element(), array.delimiter(), nest)
}

fn parse_with(
    raw: &ByteStr,
    element: &TypeDescriptor,
    delim: u8,
    nest: &mut Nesting,
) -> Result<Vec<Value>, DecodeError> {
    span!("array", element = element.name());

    let mut parser = Parser { raw, b: raw.as_bytes(), i: 0, element, delim };

    parser.skip_ws();
    if parser.peek() == Some(b'[') {
        parser.bounds()?;
        parser.skip_ws();
    }

    if parser.peek() != Some(b'{') {
        return Err(DecodeError::malformed(KIND, parser.i, "expected left brace"));
    }

    let (values, _dims) = parser.level(nest)?;

    parser.skip_ws();
    if parser.i != parser.b.len() {
        return Err(DecodeError::malformed(KIND, parser.i, "junk after closing right brace"));
    }

    verbose!("decoded array with dimensions {:?}", _dims);

    Ok(values)
}

struct Parser<'a> {
    raw: &'a ByteStr,
    b: &'a [u8],
    i: usize,
    element: &'a TypeDescriptor,
    delim: u8,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.b.get(self.i).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|e|e.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    /// Skip `[lo:hi][lo:hi]...=`.
    fn bounds(&mut self) -> Result<(), DecodeError> {
        while self.peek() == Some(b'[') {
            let open = self.i;
            self.i += 1;
            let mut colon = false;
            loop {
                match self.peek() {
                    Some(b']') => break,
                    Some(b':') if !colon => colon = true,
                    Some(b'-' | b'+' | b'0'..=b'9') => {}
                    _ => return Err(DecodeError::malformed(KIND, open, "invalid array dimension")),
                }
                self.i += 1;
            }
            self.i += 1;
            self.skip_ws();
        }

        if self.peek() != Some(b'=') {
            return Err(DecodeError::malformed(KIND, self.i, "missing \"=\" after array dimensions"));
        }
        self.i += 1;
        Ok(())
    }

    /// Parse one `{...}` level, returns its items and the dimensions below it.
    fn level(&mut self, nest: &mut Nesting) -> Result<(Vec<Value>, Vec<usize>), DecodeError> {
        nest.enter(self.i)?;
        self.i += 1;

        let mut items = vec![];
        let mut inner: Option<Vec<usize>> = None;

        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.i += 1;
            nest.leave();
            return Ok((items, vec![0]));
        }

        loop {
            self.skip_ws();
            let at = self.i;

            let (value, dims) = match self.peek() {
                Some(b'{') => {
                    let (values, dims) = self.level(nest)?;
                    (Value::Array(values), dims)
                }
                _ => (self.leaf(nest)?, vec![]),
            };

            match &inner {
                None => inner = Some(dims),
                Some(expect) if expect.len() != dims.len() => {
                    return Err(DecodeError::IrregularArrayShape { offset: at, reason: "inconsistent nesting depth" });
                }
                Some(expect) if *expect != dims => {
                    return Err(DecodeError::IrregularArrayShape { offset: at, reason: "sub-arrays with mismatched dimensions" });
                }
                Some(_) => {}
            }
            items.push(value);

            self.skip_ws();
            match self.peek() {
                Some(b'}') => {
                    self.i += 1;
                    break;
                }
                Some(c) if c == self.delim => self.i += 1,
                Some(_) => return Err(DecodeError::malformed(KIND, self.i, "expected delimiter or right brace")),
                None => return Err(DecodeError::malformed(KIND, self.i, "unexpected end of input")),
            }
        }

        nest.leave();

        let mut dims = vec![items.len()];
        dims.extend(inner.unwrap_or_default());
        Ok((items, dims))
    }

    fn leaf(&mut self, nest: &mut Nesting) -> Result<Value, DecodeError> {
        let token = match self.peek() {
            Some(b'"') => self.quoted()?,
            _ => self.unquoted()?,
        };
        self.element.token(&token, nest)
    }

    fn quoted(&mut self) -> Result<Token, DecodeError> {
        let start = self.i;
        self.i += 1;

        let mut buf = vec![];
        let mut edited = false;

        loop {
            match self.peek() {
                None => return Err(DecodeError::malformed(KIND, start, "unterminated quoted element")),
                Some(b'"') => {
                    self.i += 1;
                    break;
                }
                Some(b'\\') => {
                    let Some(&next) = self.b.get(self.i + 1) else {
                        return Err(DecodeError::malformed(KIND, self.i, "unexpected end of input"));
                    };
                    buf.push(next);
                    edited = true;
                    self.i += 2;
                }
                Some(c) => {
                    buf.push(c);
                    self.i += 1;
                }
            }
        }

        match edited {
            true => Token::unescaped(buf, start, true),
            false => Ok(Token::verbatim(self.raw, &self.raw[start + 1..self.i - 1], start + 1, true)),
        }
    }

    fn unquoted(&mut self) -> Result<Token, DecodeError> {
        let start = self.i;

        let mut buf = vec![];
        let mut edited = false;
        // trailing whitespace is dropped, escaped whitespace is kept
        let mut keep = 0;
        let mut end = start;

        loop {
            match self.peek() {
                None => return Err(DecodeError::malformed(KIND, self.i, "unexpected end of input")),
                Some(c) if c == self.delim || c == b'}' => break,
                Some(b'{' | b'"') => {
                    return Err(DecodeError::malformed(KIND, self.i, "unexpected character in element"));
                }
                Some(b'\\') => {
                    let Some(&next) = self.b.get(self.i + 1) else {
                        return Err(DecodeError::malformed(KIND, self.i, "unexpected end of input"));
                    };
                    buf.push(next);
                    keep = buf.len();
                    edited = true;
                    self.i += 2;
                }
                Some(c) => {
                    buf.push(c);
                    self.i += 1;
                    if !c.is_ascii_whitespace() {
                        keep = buf.len();
                        end = self.i;
                    }
                }
            }
        }

        if buf.is_empty() {
            return Err(DecodeError::malformed(KIND, start, "empty element"));
        }

        if edited {
            buf.truncate(keep);
            return Token::unescaped(buf, start, false);
        }

        let text = &self.raw[start..end];
        match text.eq_ignore_ascii_case("NULL") {
            true => Ok(Token::null(start)),
            false => Ok(Token::verbatim(self.raw, text, start, false)),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{
        Config,
        descriptor::{Field, ScalarKind},
        postgres::oid,
        record::Record,
    };

    fn int4() -> TypeDescriptor {
        TypeDescriptor::scalar(oid::INT4, "int4", ScalarKind::Int)
    }

    fn text() -> TypeDescriptor {
        TypeDescriptor::scalar(oid::TEXT, "text", ScalarKind::Text)
    }

    fn decode(raw: &'static str, element: &TypeDescriptor) -> Result<Vec<Value>, DecodeError> {
        decode_array(&ByteStr::from_static(raw), element)
    }

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn nested_rows() {
        let values = decode("{{1,2,3},{4,5,6},{7,8,9}}", &int4()).unwrap();
        assert_eq!(values, [ints(&[1, 2, 3]), ints(&[4, 5, 6]), ints(&[7, 8, 9])]);
    }

    #[test]
    fn empty_array() {
        assert!(decode("{}", &int4()).unwrap().is_empty());
        assert!(decode(" { } ", &int4()).unwrap().is_empty());
    }

    #[test]
    fn null_elements() {
        let values = decode(r#"{NULL,"NULL",null, NuLl }"#, &text()).unwrap();
        assert_eq!(values, [Value::Null, Value::Text("NULL".into()), Value::Null, Value::Null]);
    }

    #[test]
    fn quoted_elements() {
        let values = decode(r#"{"a\"b","c\\d"," x ",""}"#, &text()).unwrap();
        assert_eq!(
            values,
            [
                Value::Text("a\"b".into()),
                Value::Text("c\\d".into()),
                Value::Text(" x ".into()),
                Value::Text("".into()),
            ]
        );
    }

    #[test]
    fn unquoted_whitespace() {
        assert_eq!(decode("{ 1 ,\t2 }", &int4()).unwrap(), [Value::Int(1), Value::Int(2)]);
        assert_eq!(decode("{a b , c\\ }", &text()).unwrap(), [Value::Text("a b".into()), Value::Text("c ".into())]);
    }

    #[test]
    fn irregular_shape() {
        let err = decode("{{1,2},{3}}", &int4()).unwrap_err();
        assert!(matches!(err, DecodeError::IrregularArrayShape { offset: 7, .. }));

        let err = decode("{1,{2}}", &int4()).unwrap_err();
        assert!(matches!(err, DecodeError::IrregularArrayShape { offset: 3, reason: "inconsistent nesting depth" }));
    }

    #[test]
    fn dimension_decoration() {
        assert_eq!(decode("[1:2]={1,2}", &int4()).unwrap(), [Value::Int(1), Value::Int(2)]);
        assert_eq!(decode("[0:1][1:1]={{1},{2}}", &int4()).unwrap(), [ints(&[1]), ints(&[2])]);
        assert!(decode("[1:2]{1,2}", &int4()).is_err());
        assert!(decode("[a:2]={1,2}", &int4()).is_err());
    }

    #[test]
    fn box_delimiter() {
        let boxes = Array::new(Arc::new(TypeDescriptor::scalar(oid::BOX, "box", ScalarKind::Text)), b';');
        let values = parse(&"{(1,1),(0,0);(2,2),(1,1)}".into(), &boxes, &mut Nesting::default()).unwrap();
        assert_eq!(values, [Value::Text("(1,1),(0,0)".into()), Value::Text("(2,2),(1,1)".into())]);
    }

    #[test]
    fn composite_elements() {
        let char = Arc::new(TypeDescriptor::scalar(oid::BPCHAR, "bpchar", ScalarKind::Text));
        let float8 = Arc::new(TypeDescriptor::scalar(oid::FLOAT8, "float8", ScalarKind::Float));
        let item = TypeDescriptor::composite(0, "item", [Field::new("grade", char), Field::new("distrib", float8)]);

        let values = decode(r#"{"(A,0.1)","(B,0.2)","(C,0.3)","(\"D\",0.4)"}"#, &item).unwrap();
        assert_eq!(values.len(), 4);
        for (value, (grade, distrib)) in values.iter().zip([("A", 0.1), ("B", 0.2), ("C", 0.3), ("D", 0.4)]) {
            let expect = Record::from_pairs([("grade", Value::Text(grade.into())), ("distrib", Value::Float(distrib))]);
            assert_eq!(value, &Value::Record(expect));
        }

        // offset of `x` in the payload
        let err = decode(r#"{"(A,x)"}"#, &item).unwrap_err();
        assert_eq!(err.offset(), Some(5));
    }

    #[test]
    fn malformed_offsets() {
        let err = decode("{1,x}", &int4()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedLiteral { kind: "integer", offset: 3, .. }));

        assert!(matches!(decode("{1} x", &int4()), Err(DecodeError::MalformedLiteral { offset: 4, .. })));
        assert!(matches!(decode("1,2", &int4()), Err(DecodeError::MalformedLiteral { offset: 0, .. })));
        assert!(matches!(decode("{1,,2}", &int4()), Err(DecodeError::MalformedLiteral { offset: 3, .. })));
        assert!(decode("{1,2", &int4()).is_err());
        assert!(decode(r#"{"1}"#, &int4()).is_err());
    }

    #[test]
    fn depth_limit() {
        let array = Array::new(Arc::new(int4()), b',');
        let mut nest = Nesting::new(&Config::default().max_depth(1));
        let err = parse(&"{{1}}".into(), &array, &mut nest).unwrap_err();
        assert!(matches!(err, DecodeError::Limit { offset: 1, .. }));
    }
}
