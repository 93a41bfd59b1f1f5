//! Binary format decoding.
//!
//! <https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-FORMAT-CODES>
use bytes::{Buf, Bytes};

use crate::{
    common::{ByteStr, span},
    config::Nesting,
    decode::DecodeError,
    descriptor::{Composite, DocumentKind, ScalarKind, TypeDescriptor, TypeKind},
    document,
    ext::BytesExt,
    postgres::{binary_is_opaque, oid},
    record::Record,
    scan,
    value::Value,
};

const KIND: &str = "binary";

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const JSONB_VERSION: u8 = 1;

/// Server limit of array dimensions.
const MAXDIM: usize = 6;

pub(crate) fn decode(raw: Bytes, ty: &TypeDescriptor, nest: &mut Nesting) -> Result<Value, DecodeError> {
    span!("binary", ty = ty.name(), len = raw.len());

    match ty.kind() {
        TypeKind::Scalar(kind) => scalar(raw, ty, *kind),
        TypeKind::Document(kind) => json(raw, *kind, nest).map(Value::Document),
        TypeKind::Array(array) => self::array(Reader::new(raw), array.element(), nest),
        TypeKind::Composite(composite) => self::composite(Reader::new(raw), composite, nest).map(Value::Record),
    }
}

/// Buffer that remembers how much has been consumed.
struct Reader {
    buf: Bytes,
    total: usize,
}

macro_rules! read {
    ($self:ident.$get:ident, $what:literal) => {
        match $self.buf.$get() {
            Ok(ok) => ok,
            Err(_) => return Err($self.truncated($what)),
        }
    };
}

impl Reader {
    fn new(buf: Bytes) -> Self {
        Self { total: buf.len(), buf }
    }

    fn offset(&self) -> usize {
        self.total - self.buf.len()
    }

    fn truncated(&self, what: &str) -> DecodeError {
        DecodeError::malformed(KIND, self.offset(), format!("truncated {what}"))
    }

    fn i16(&mut self) -> Result<i16, DecodeError> {
        Ok(read!(self.try_get_i16, "int2"))
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(read!(self.try_get_u16, "uint2"))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(read!(self.try_get_i32, "int4"))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(read!(self.try_get_u32, "oid"))
    }

    /// Length prefixed value, [`None`] for `-1`.
    fn value(&mut self) -> Result<Option<(usize, Bytes)>, DecodeError> {
        let len = self.i32()?;
        if len == -1 {
            return Ok(None);
        }
        let Ok(len) = usize::try_from(len) else {
            return Err(DecodeError::malformed(KIND, self.offset() - 4, format!("invalid length {len}")));
        };
        let at = self.offset();
        match self.buf.try_split_to(len) {
            Some(bytes) => Ok(Some((at, bytes))),
            None => Err(self.truncated("value")),
        }
    }

    fn finish(&self) -> Result<(), DecodeError> {
        match self.buf.is_empty() {
            true => Ok(()),
            false => Err(DecodeError::malformed(KIND, self.offset(), "trailing bytes")),
        }
    }
}

fn scalar(mut raw: Bytes, ty: &TypeDescriptor, kind: ScalarKind) -> Result<Value, DecodeError> {
    let invalid = |raw: &Bytes| {
        DecodeError::malformed(kind.name(), 0, format!("invalid {} byte length {}", ty.name(), raw.len()))
    };

    let value = match kind {
        ScalarKind::Bool => match raw[..] {
            [b] => Value::Bool(b != 0),
            _ => return Err(invalid(&raw)),
        },
        ScalarKind::Int => match raw.len() {
            2 => Value::Int(raw.get_i16().into()),
            4 if ty.oid() == oid::OID => Value::Int(raw.get_u32().into()),
            4 => Value::Int(raw.get_i32().into()),
            8 => Value::Int(raw.get_i64()),
            _ => return Err(invalid(&raw)),
        },
        ScalarKind::Float => match raw.len() {
            4 => Value::Float(raw.get_f32().into()),
            8 => Value::Float(raw.get_f64()),
            _ => return Err(invalid(&raw)),
        },
        ScalarKind::Numeric => numeric(Reader::new(raw))?,
        ScalarKind::Bytea => Value::Bytes(raw),
        ScalarKind::Text => match ty.oid() {
            oid::UUID => match raw.len() {
                16 => Value::Text(uuid(&raw).into()),
                _ => return Err(invalid(&raw)),
            },
            opaque if binary_is_opaque(opaque) => {
                return Err(DecodeError::malformed(KIND, 0, format!("binary format of {} is not supported", ty.name())));
            }
            _ => Value::Text(ByteStr::from_utf8(raw)?),
        },
    };

    Ok(value)
}

/// `ndigits, weight, sign, dscale` followed by base 10000 digits.
fn numeric(mut r: Reader) -> Result<Value, DecodeError> {
    let ndigits = r.u16()?;
    let weight = r.i16()?;
    let sign = r.u16()?;
    let dscale = r.u16()?;

    match sign {
        NUMERIC_NAN => return Ok(Value::Float(f64::NAN)),
        NUMERIC_PINF => return Ok(Value::Float(f64::INFINITY)),
        NUMERIC_NINF => return Ok(Value::Float(f64::NEG_INFINITY)),
        0 | NUMERIC_NEG => {}
        _ => return Err(DecodeError::malformed(KIND, 4, format!("invalid numeric sign {sign:#x}"))),
    }

    let mut digits = Vec::with_capacity(ndigits.into());
    for _ in 0..ndigits {
        let digit = r.i16()?;
        if !(0..10000).contains(&digit) {
            return Err(DecodeError::malformed(KIND, r.offset() - 2, format!("invalid numeric digit {digit}")));
        }
        digits.push(digit);
    }
    r.finish()?;

    let digit = |i: i32| usize::try_from(i).ok().and_then(|i|digits.get(i)).copied().unwrap_or(0);

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }

    let weight = i32::from(weight);
    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(itoa::Buffer::new().format(digit(0)));
        for i in 1..=weight {
            text.push_str(&format!("{:04}", digit(i)));
        }
    }

    if dscale > 0 {
        text.push('.');
        let start = text.len();
        for j in 1..=i32::from(dscale.div_ceil(4)) {
            text.push_str(&format!("{:04}", digit(weight + j)));
        }
        text.truncate(start + usize::from(dscale));
    }

    scan::number(&text).ok_or_else(||DecodeError::malformed(KIND, 0, text))
}

fn uuid(b: &[u8]) -> String {
    let mut out = String::with_capacity(36);
    for (i, byte) in b.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn json(mut raw: Bytes, kind: DocumentKind, nest: &mut Nesting) -> Result<document::Document, DecodeError> {
    let base = match kind {
        DocumentKind::Json => 0,
        DocumentKind::Jsonb => {
            match raw.first().copied() {
                Some(JSONB_VERSION) => raw.advance(1),
                Some(v) => return Err(DecodeError::malformed("jsonb", 0, format!("unsupported jsonb version {v}"))),
                None => return Err(DecodeError::malformed("jsonb", 0, "missing jsonb version")),
            }
            1
        }
    };
    let text = ByteStr::from_utf8(raw)?;
    document::parse(&text, nest).map_err(|e|e.shift(base))
}

/// `ndim, flags, element oid, (len, lower bound) * ndim` followed by elements.
fn array(mut r: Reader, element: &TypeDescriptor, nest: &mut Nesting) -> Result<Value, DecodeError> {
    let ndim = r.i32()?;
    let _flags = r.i32()?;
    let _oid = r.u32()?;

    let ndim = match usize::try_from(ndim) {
        Ok(ndim) if ndim <= MAXDIM => ndim,
        _ => return Err(DecodeError::malformed(KIND, 0, format!("invalid array dimensions {ndim}"))),
    };

    if ndim == 0 {
        r.finish()?;
        return Ok(Value::Array(vec![]));
    }

    let mut dims = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        let at = r.offset();
        let len = r.i32()?;
        let _lower = r.i32()?;
        match usize::try_from(len) {
            Ok(len) => dims.push(len),
            Err(_) => return Err(DecodeError::malformed(KIND, at, format!("invalid array length {len}"))),
        }
    }

    for _ in 0..ndim {
        nest.enter(r.offset())?;
    }

    let count = dims.iter().try_fold(1usize, |acc, e|acc.checked_mul(*e));
    let Some(count) = count else {
        return Err(DecodeError::malformed(KIND, 0, "array too large"));
    };

    // each element carries at least its length
    let mut leaves = Vec::with_capacity(count.min(r.buf.remaining() / 4));
    for _ in 0..count {
        let leaf = match r.value()? {
            None => Value::Null,
            Some((at, bytes)) => decode(bytes, element, nest).map_err(|e|e.shift(at))?,
        };
        leaves.push(leaf);
    }
    r.finish()?;

    for _ in 0..ndim {
        nest.leave();
    }

    let mut leaves = leaves.into_iter();
    Ok(Value::Array(reshape(&mut leaves, &dims)))
}

fn reshape(leaves: &mut impl Iterator<Item = Value>, dims: &[usize]) -> Vec<Value> {
    match dims {
        [] => vec![],
        [len] => leaves.take(*len).collect(),
        [len, rest @ ..] => (0..*len).map(|_|Value::Array(reshape(leaves, rest))).collect(),
    }
}

/// `count` followed by `(oid, value)` per field.
fn composite(mut r: Reader, composite: &Composite, nest: &mut Nesting) -> Result<Record, DecodeError> {
    nest.enter(0)?;

    let fields = composite.fields();
    let count = r.i32()?;
    if usize::try_from(count).ok() != Some(fields.len()) {
        return Err(DecodeError::ArityMismatch {
            expected: fields.len(),
            found: usize::try_from(count).unwrap_or(0),
            offset: 0,
        });
    }

    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let _oid = r.u32()?;
        let value = match r.value()? {
            None => Value::Null,
            Some((at, bytes)) => decode(bytes, field.ty(), nest).map_err(|e|e.shift(at))?,
        };
        values.push(value);
    }
    r.finish()?;

    nest.leave();
    Ok(Record::new(composite.names().clone(), values))
}
