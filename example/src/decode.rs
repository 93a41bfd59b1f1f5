use pgcell::{Cell, Decode, Format, Registry, Result, postgres::oid};
use time::{PrimitiveDateTime, UtcDateTime};

#[derive(Decode)]
struct MyId(i32);

#[derive(Decode)]
struct SomeId<T>(T);

pub fn main() -> Result<()> {
    let registry = Registry::new();

    let my_id: MyId = registry.decode_as(&Cell::text(oid::INT4, "420"))?;
    assert_eq!(my_id.0, 420);

    let some_id: SomeId<i64> = registry.decode_as(&Cell::binary(oid::INT8, 420i64.to_be_bytes().to_vec()))?;
    assert_eq!(some_id.0, 420);

    let null: Option<String> = registry.decode_as(&Cell::null(oid::TEXT))?;
    assert!(null.is_none());

    // `time`

    let local: PrimitiveDateTime = registry.decode_as(&Cell::text(oid::TIMESTAMP, "2024-03-05 13:45:07.25"))?;
    let utc: UtcDateTime = registry.decode_as(&Cell::text(oid::TIMESTAMPTZ, "2024-03-05 20:45:07.25+07"))?;
    assert_eq!((local.date(), local.time()), (utc.date(), utc.time()));

    let err = registry
        .decode(&Cell::new(oid::TIMESTAMP, Format::Binary, Some(vec![0u8; 8].into())))
        .unwrap_err();
    tracing::info!("{err}");

    Ok(())
}
