use time::{
    Date, PrimitiveDateTime, Time, UtcDateTime, UtcOffset,
    format_description::{BorrowedFormatItem as I, Component as C, modifier},
};

use crate::{
    Decode, DecodeError, Value,
    common::ByteStr,
    decode::mismatch,
    postgres::{Oid, PgType, oid},
};

impl PgType for Date {
    /// calendar date
    const OID: Oid = oid::DATE;
}

impl PgType for Time {
    /// time of day
    const OID: Oid = oid::TIME;
}

impl PgType for PrimitiveDateTime {
    /// date and time
    const OID: Oid = oid::TIMESTAMP;
}

impl PgType for UtcDateTime {
    /// date and time with timezone
    const OID: Oid = oid::TIMESTAMPTZ;
}

const SUBSECOND: I<'_> = I::Optional(&I::Compound(&[
    I::Literal(b"."),
    I::Component(C::Subsecond(modifier::Subsecond::default())),
]));

const DATE: &[I<'_>] = &[
    I::Component(C::Year(modifier::Year::default())),
    I::Literal(b"-"),
    I::Component(C::Month(modifier::Month::default())),
    I::Literal(b"-"),
    I::Component(C::Day(modifier::Day::default())),
];

const TIME: &[I<'_>] = &[
    I::Component(C::Hour(modifier::Hour::default())),
    I::Literal(b":"),
    I::Component(C::Minute(modifier::Minute::default())),
    I::Literal(b":"),
    I::Component(C::Second(modifier::Second::default())),
    SUBSECOND,
];

const DATETIME: &[I<'_>] = &[I::Compound(DATE), I::Literal(b" "), I::Compound(TIME)];

/// Temporal types are decoded from text, binary format is rejected earlier.
fn text(value: Value, expected: &'static str) -> Result<ByteStr, DecodeError> {
    match value {
        Value::Text(text) => Ok(text),
        Value::Null => Err(DecodeError::Null),
        other => Err(mismatch(expected, &other)),
    }
}

impl Decode for Date {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        Ok(Date::parse(&text(value, "date")?, DATE)?)
    }
}

impl Decode for Time {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        Ok(Time::parse(&text(value, "time")?, TIME)?)
    }
}

impl Decode for PrimitiveDateTime {
    fn decode(value: Value) -> Result<Self, DecodeError> {
        Ok(PrimitiveDateTime::parse(&text(value, "timestamp")?, DATETIME)?)
    }
}

impl Decode for UtcDateTime {
    /// Postgres print timestamptz in session timezone, offset is `+HH`,
    /// `+HH:MM` or `+HH:MM:SS`.
    fn decode(value: Value) -> Result<Self, DecodeError> {
        let text = text(value, "timestamptz")?;
        let malformed = || DecodeError::malformed("timestamptz", 0, text.as_str());

        // date part contains `-` as well
        let at = match text.get(10..).and_then(|time|time.rfind(['+', '-'])) {
            Some(at) => at + 10,
            None => return Err(malformed()),
        };
        let (datetime, offset) = text.split_at(at);
        let offset = parse_offset(offset).ok_or_else(malformed)?;
        let local = PrimitiveDateTime::parse(datetime, DATETIME)?;
        let utc = local.assume_offset(offset).to_offset(UtcOffset::UTC);
        Ok(UtcDateTime::new(utc.date(), utc.time()))
    }
}

fn parse_offset(offset: &str) -> Option<UtcOffset> {
    let (sign, rest) = match offset.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };

    let mut hms = [0i8; 3];
    let mut parts = rest.split(':');
    for (slot, part) in hms.iter_mut().zip(parts.by_ref()) {
        if part.len() != 2 {
            return None;
        }
        *slot = sign * part.parse::<i8>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }

    UtcOffset::from_hms(hms[0], hms[1], hms[2]).ok()
}
