use pgcell::{Cell, Document, Registry, Result, postgres::{Format, oid}, types::Json};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Foo {
    id: i32,
    tags: Vec<String>,
}

pub fn main() -> Result<()> {
    let registry = Registry::new();

    // duplicate key keeps the last value
    let doc: Document = registry.decode_as(&Cell::text(oid::JSON, r#"{"foo":"bar","foo":3.14}"#))?;
    assert_eq!(doc.to_string(), r#"{"foo":3.14}"#);

    let cell = Cell::new(oid::JSONB, Format::Binary, Some(r#"{"id":420,"tags":["a"]}"#.into()));
    let err = registry.decode(&cell).unwrap_err();
    tracing::info!("{err}");

    let cell = Cell::binary(oid::JSONB, &b"\x01{\"id\":420,\"tags\":[\"a\"]}"[..]);
    let Json(foo) = registry.decode_as::<Json<Foo>>(&cell)?;
    assert_eq!(foo, Foo { id: 420, tags: vec!["a".into()] });

    let value: serde_json::Value = registry.decode_as(&Cell::text(oid::JSONB, "[1, 2.5, null]"))?;
    assert_eq!(value, serde_json::json!([1, 2.5, null]));

    Ok(())
}
