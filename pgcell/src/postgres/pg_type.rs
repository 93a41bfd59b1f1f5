use bytes::Bytes;

use crate::{
    common::ByteStr,
    descriptor::{DocumentKind, ScalarKind},
    document::Document,
    record::Record,
};

/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

/// A type that have corresponding postgred oid.
pub trait PgType {
    const OID: Oid;
}

/// Oid of built-in types.
///
/// <https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat>
pub mod oid {
    use super::Oid;

    pub const BOOL: Oid = 16;
    pub const BYTEA: Oid = 17;
    pub const CHAR: Oid = 18;
    pub const NAME: Oid = 19;
    pub const INT8: Oid = 20;
    pub const INT2: Oid = 21;
    pub const INT4: Oid = 23;
    pub const TEXT: Oid = 25;
    pub const REGPROC: Oid = 24;
    pub const OID: Oid = 26;
    pub const TID: Oid = 27;
    pub const XID: Oid = 28;
    pub const CID: Oid = 29;
    pub const JSON: Oid = 114;
    pub const XML: Oid = 142;
    pub const POINT: Oid = 600;
    pub const LSEG: Oid = 601;
    pub const PATH: Oid = 602;
    pub const BOX: Oid = 603;
    pub const POLYGON: Oid = 604;
    pub const LINE: Oid = 628;
    pub const CIDR: Oid = 650;
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;
    pub const UNKNOWN: Oid = 705;
    pub const CIRCLE: Oid = 718;
    pub const MACADDR8: Oid = 774;
    pub const MONEY: Oid = 790;
    pub const MACADDR: Oid = 829;
    pub const INET: Oid = 869;
    pub const BPCHAR: Oid = 1042;
    pub const VARCHAR: Oid = 1043;
    pub const DATE: Oid = 1082;
    pub const TIME: Oid = 1083;
    pub const TIMESTAMP: Oid = 1114;
    pub const TIMESTAMPTZ: Oid = 1184;
    pub const INTERVAL: Oid = 1186;
    pub const TIMETZ: Oid = 1266;
    pub const BIT: Oid = 1560;
    pub const VARBIT: Oid = 1562;
    pub const NUMERIC: Oid = 1700;
    pub const REGCLASS: Oid = 2205;
    pub const REGTYPE: Oid = 2206;
    pub const UUID: Oid = 2950;
    pub const PG_LSN: Oid = 3220;
    pub const TSVECTOR: Oid = 3614;
    pub const TSQUERY: Oid = 3615;
    pub const JSONB: Oid = 3802;
    pub const INT4RANGE: Oid = 3904;
    pub const NUMRANGE: Oid = 3906;
    pub const TSRANGE: Oid = 3908;
    pub const TSTZRANGE: Oid = 3910;
    pub const DATERANGE: Oid = 3912;
    pub const INT8RANGE: Oid = 3926;
    pub const JSONPATH: Oid = 4072;
    pub const INT4MULTIRANGE: Oid = 4451;
    pub const NUMMULTIRANGE: Oid = 4532;
    pub const TSMULTIRANGE: Oid = 4533;
    pub const TSTZMULTIRANGE: Oid = 4534;
    pub const DATEMULTIRANGE: Oid = 4535;
    pub const INT8MULTIRANGE: Oid = 4536;
    pub const XID8: Oid = 5069;

    pub const XML_ARRAY: Oid = 143;
    pub const JSON_ARRAY: Oid = 199;
    pub const XID8_ARRAY: Oid = 271;
    pub const LINE_ARRAY: Oid = 629;
    pub const CIDR_ARRAY: Oid = 651;
    pub const CIRCLE_ARRAY: Oid = 719;
    pub const MACADDR8_ARRAY: Oid = 775;
    pub const MONEY_ARRAY: Oid = 791;
    pub const BOOL_ARRAY: Oid = 1000;
    pub const BYTEA_ARRAY: Oid = 1001;
    pub const CHAR_ARRAY: Oid = 1002;
    pub const NAME_ARRAY: Oid = 1003;
    pub const INT2_ARRAY: Oid = 1005;
    pub const INT4_ARRAY: Oid = 1007;
    pub const REGPROC_ARRAY: Oid = 1008;
    pub const TEXT_ARRAY: Oid = 1009;
    pub const TID_ARRAY: Oid = 1010;
    pub const XID_ARRAY: Oid = 1011;
    pub const CID_ARRAY: Oid = 1012;
    pub const BPCHAR_ARRAY: Oid = 1014;
    pub const VARCHAR_ARRAY: Oid = 1015;
    pub const INT8_ARRAY: Oid = 1016;
    pub const POINT_ARRAY: Oid = 1017;
    pub const LSEG_ARRAY: Oid = 1018;
    pub const PATH_ARRAY: Oid = 1019;
    pub const BOX_ARRAY: Oid = 1020;
    pub const FLOAT4_ARRAY: Oid = 1021;
    pub const FLOAT8_ARRAY: Oid = 1022;
    pub const POLYGON_ARRAY: Oid = 1027;
    pub const OID_ARRAY: Oid = 1028;
    pub const MACADDR_ARRAY: Oid = 1040;
    pub const INET_ARRAY: Oid = 1041;
    pub const TIMESTAMP_ARRAY: Oid = 1115;
    pub const DATE_ARRAY: Oid = 1182;
    pub const TIME_ARRAY: Oid = 1183;
    pub const TIMESTAMPTZ_ARRAY: Oid = 1185;
    pub const INTERVAL_ARRAY: Oid = 1187;
    pub const NUMERIC_ARRAY: Oid = 1231;
    pub const TIMETZ_ARRAY: Oid = 1270;
    pub const BIT_ARRAY: Oid = 1561;
    pub const VARBIT_ARRAY: Oid = 1563;
    pub const REGCLASS_ARRAY: Oid = 2210;
    pub const REGTYPE_ARRAY: Oid = 2211;
    pub const UUID_ARRAY: Oid = 2951;
    pub const PG_LSN_ARRAY: Oid = 3221;
    pub const TSVECTOR_ARRAY: Oid = 3643;
    pub const TSQUERY_ARRAY: Oid = 3645;
    pub const JSONB_ARRAY: Oid = 3807;
    pub const INT4RANGE_ARRAY: Oid = 3905;
    pub const NUMRANGE_ARRAY: Oid = 3907;
    pub const TSRANGE_ARRAY: Oid = 3909;
    pub const TSTZRANGE_ARRAY: Oid = 3911;
    pub const DATERANGE_ARRAY: Oid = 3913;
    pub const INT8RANGE_ARRAY: Oid = 3927;
    pub const JSONPATH_ARRAY: Oid = 4073;
    pub const INT4MULTIRANGE_ARRAY: Oid = 6150;
    pub const NUMMULTIRANGE_ARRAY: Oid = 6151;
    pub const TSMULTIRANGE_ARRAY: Oid = 6152;
    pub const TSTZMULTIRANGE_ARRAY: Oid = 6153;
    pub const DATEMULTIRANGE_ARRAY: Oid = 6155;
    pub const INT8MULTIRANGE_ARRAY: Oid = 6157;
}

/// Built-in types whose binary format is not their utf8 text.
pub(crate) const fn binary_is_opaque(ty: Oid) -> bool {
    use oid::*;
    matches!(
        ty,
        TID | XID | CID | XID8 | REGPROC | REGCLASS | REGTYPE | PG_LSN
            | POINT | LSEG | PATH | BOX | POLYGON | LINE | CIRCLE
            | CIDR | INET | MACADDR | MACADDR8 | MONEY | BIT | VARBIT
            | DATE | TIME | TIMETZ | TIMESTAMP | TIMESTAMPTZ | INTERVAL
            | INT4RANGE | NUMRANGE | TSRANGE | TSTZRANGE | DATERANGE | INT8RANGE
            | INT4MULTIRANGE | NUMMULTIRANGE | TSMULTIRANGE | TSTZMULTIRANGE
            | DATEMULTIRANGE | INT8MULTIRANGE | TSVECTOR | TSQUERY | JSONPATH
    )
}

macro_rules! oid {
    ($ty:ty, $oid:expr $(, $doc:literal)? ) => {
        impl PgType for $ty {
            $(#[doc = $doc])?
            const OID: Oid = $oid;
        }
    };
}

oid!(bool, oid::BOOL);
oid!(i64, oid::INT8, "`int8` ~18 digit integer, 8-byte storage");
oid!(i16, oid::INT2, "`int2` -32 thousand to 32 thousand, 2-byte storage");
oid!(i32, oid::INT4, "`int4` -2 billion to 2 billion integer, 4-byte storage");
oid!(str, oid::TEXT, "`text` variable-length string, no limit specified");
oid!(String, oid::TEXT, "`text` variable-length string, no limit specified");
oid!(ByteStr, oid::TEXT, "`text` variable-length string, no limit specified");
oid!(f32, oid::FLOAT4, "`float4` single-precision floating point number, 4-byte storage");
oid!(f64, oid::FLOAT8, "`float8` double-precision floating point number, 8-byte storage");
oid!(Bytes, oid::BYTEA, "`bytea` variable-length string, binary values escaped");
oid!(Document, oid::JSONB, "`jsonb` Binary JSON");
oid!(Record, 2249, "`record` pseudo-type representing any composite type");

/// Built-in type entry.
pub(crate) struct Builtin {
    pub oid: Oid,
    pub name: &'static str,
    pub kind: BuiltinKind,
    /// Oid of the array type whose element is this type.
    pub array: Oid,
    /// Alternative spellings accepted by name lookup.
    pub aliases: &'static [&'static str],
}

pub(crate) enum BuiltinKind {
    Scalar(ScalarKind),
    Document(DocumentKind),
}

macro_rules! builtin {
    ($oid:ident, $name:literal, $kind:expr, $array:ident $(, $alias:literal)*) => {
        Builtin {
            oid: oid::$oid,
            name: $name,
            kind: $kind,
            array: oid::$array,
            aliases: &[$($alias),*],
        }
    };
}

use BuiltinKind::{Document as D, Scalar as S};

pub(crate) static BUILTINS: &[Builtin] = &[
    builtin!(BOOL, "bool", S(ScalarKind::Bool), BOOL_ARRAY, "boolean"),
    builtin!(BYTEA, "bytea", S(ScalarKind::Bytea), BYTEA_ARRAY),
    builtin!(CHAR, "char", S(ScalarKind::Text), CHAR_ARRAY, "\"char\""),
    builtin!(NAME, "name", S(ScalarKind::Text), NAME_ARRAY),
    builtin!(INT8, "int8", S(ScalarKind::Int), INT8_ARRAY, "bigint"),
    builtin!(INT2, "int2", S(ScalarKind::Int), INT2_ARRAY, "smallint"),
    builtin!(INT4, "int4", S(ScalarKind::Int), INT4_ARRAY, "integer", "int"),
    builtin!(REGPROC, "regproc", S(ScalarKind::Text), REGPROC_ARRAY),
    builtin!(TEXT, "text", S(ScalarKind::Text), TEXT_ARRAY),
    builtin!(OID, "oid", S(ScalarKind::Int), OID_ARRAY),
    builtin!(TID, "tid", S(ScalarKind::Text), TID_ARRAY),
    builtin!(XID, "xid", S(ScalarKind::Text), XID_ARRAY),
    builtin!(CID, "cid", S(ScalarKind::Text), CID_ARRAY),
    builtin!(JSON, "json", D(DocumentKind::Json), JSON_ARRAY),
    builtin!(XML, "xml", S(ScalarKind::Text), XML_ARRAY),
    builtin!(XID8, "xid8", S(ScalarKind::Text), XID8_ARRAY),
    builtin!(POINT, "point", S(ScalarKind::Text), POINT_ARRAY),
    builtin!(LSEG, "lseg", S(ScalarKind::Text), LSEG_ARRAY),
    builtin!(PATH, "path", S(ScalarKind::Text), PATH_ARRAY),
    builtin!(BOX, "box", S(ScalarKind::Text), BOX_ARRAY),
    builtin!(POLYGON, "polygon", S(ScalarKind::Text), POLYGON_ARRAY),
    builtin!(LINE, "line", S(ScalarKind::Text), LINE_ARRAY),
    builtin!(CIDR, "cidr", S(ScalarKind::Text), CIDR_ARRAY),
    builtin!(FLOAT4, "float4", S(ScalarKind::Float), FLOAT4_ARRAY, "real"),
    builtin!(FLOAT8, "float8", S(ScalarKind::Float), FLOAT8_ARRAY, "double precision"),
    builtin!(CIRCLE, "circle", S(ScalarKind::Text), CIRCLE_ARRAY),
    builtin!(MACADDR8, "macaddr8", S(ScalarKind::Text), MACADDR8_ARRAY),
    builtin!(MONEY, "money", S(ScalarKind::Text), MONEY_ARRAY),
    builtin!(MACADDR, "macaddr", S(ScalarKind::Text), MACADDR_ARRAY),
    builtin!(INET, "inet", S(ScalarKind::Text), INET_ARRAY),
    builtin!(BPCHAR, "bpchar", S(ScalarKind::Text), BPCHAR_ARRAY, "character", "char(1)"),
    builtin!(VARCHAR, "varchar", S(ScalarKind::Text), VARCHAR_ARRAY, "character varying"),
    builtin!(DATE, "date", S(ScalarKind::Text), DATE_ARRAY),
    builtin!(TIME, "time", S(ScalarKind::Text), TIME_ARRAY, "time without time zone"),
    builtin!(TIMESTAMP, "timestamp", S(ScalarKind::Text), TIMESTAMP_ARRAY, "timestamp without time zone"),
    builtin!(TIMESTAMPTZ, "timestamptz", S(ScalarKind::Text), TIMESTAMPTZ_ARRAY, "timestamp with time zone"),
    builtin!(INTERVAL, "interval", S(ScalarKind::Text), INTERVAL_ARRAY),
    builtin!(TIMETZ, "timetz", S(ScalarKind::Text), TIMETZ_ARRAY, "time with time zone"),
    builtin!(BIT, "bit", S(ScalarKind::Text), BIT_ARRAY),
    builtin!(VARBIT, "varbit", S(ScalarKind::Text), VARBIT_ARRAY, "bit varying"),
    builtin!(NUMERIC, "numeric", S(ScalarKind::Numeric), NUMERIC_ARRAY, "decimal"),
    builtin!(REGCLASS, "regclass", S(ScalarKind::Text), REGCLASS_ARRAY),
    builtin!(REGTYPE, "regtype", S(ScalarKind::Text), REGTYPE_ARRAY),
    builtin!(UUID, "uuid", S(ScalarKind::Text), UUID_ARRAY),
    builtin!(PG_LSN, "pg_lsn", S(ScalarKind::Text), PG_LSN_ARRAY),
    builtin!(TSVECTOR, "tsvector", S(ScalarKind::Text), TSVECTOR_ARRAY),
    builtin!(TSQUERY, "tsquery", S(ScalarKind::Text), TSQUERY_ARRAY),
    builtin!(JSONB, "jsonb", D(DocumentKind::Jsonb), JSONB_ARRAY),
    builtin!(INT4RANGE, "int4range", S(ScalarKind::Text), INT4RANGE_ARRAY),
    builtin!(NUMRANGE, "numrange", S(ScalarKind::Text), NUMRANGE_ARRAY),
    builtin!(TSRANGE, "tsrange", S(ScalarKind::Text), TSRANGE_ARRAY),
    builtin!(TSTZRANGE, "tstzrange", S(ScalarKind::Text), TSTZRANGE_ARRAY),
    builtin!(DATERANGE, "daterange", S(ScalarKind::Text), DATERANGE_ARRAY),
    builtin!(INT8RANGE, "int8range", S(ScalarKind::Text), INT8RANGE_ARRAY),
    builtin!(JSONPATH, "jsonpath", S(ScalarKind::Text), JSONPATH_ARRAY),
    builtin!(INT4MULTIRANGE, "int4multirange", S(ScalarKind::Text), INT4MULTIRANGE_ARRAY),
    builtin!(NUMMULTIRANGE, "nummultirange", S(ScalarKind::Text), NUMMULTIRANGE_ARRAY),
    builtin!(TSMULTIRANGE, "tsmultirange", S(ScalarKind::Text), TSMULTIRANGE_ARRAY),
    builtin!(TSTZMULTIRANGE, "tstzmultirange", S(ScalarKind::Text), TSTZMULTIRANGE_ARRAY),
    builtin!(DATEMULTIRANGE, "datemultirange", S(ScalarKind::Text), DATEMULTIRANGE_ARRAY),
    builtin!(INT8MULTIRANGE, "int8multirange", S(ScalarKind::Text), INT8MULTIRANGE_ARRAY),
];

/// `unknown` has no array type.
pub(crate) static UNKNOWN: Builtin = Builtin {
    oid: oid::UNKNOWN,
    name: "unknown",
    kind: BuiltinKind::Scalar(ScalarKind::Text),
    array: 0,
    aliases: &[],
};
