use pgcell::{Cell, FromRecord, Registry, Result, Value};

#[derive(Debug, FromRecord)]
struct GradeDistrib {
    grade: String,
    distrib: f64,
}

#[derive(Debug, FromRecord)]
struct OnHand {
    #[record("item")]
    inventory: InventoryItem,
    count: i32,
}

#[derive(Debug, FromRecord)]
struct InventoryItem(String, i32, f64);

pub fn main() -> Result<()> {
    let registry = Registry::new();

    registry.register_composite("grade_distrib", 16400, [("grade", "bpchar"), ("distrib", "float8")])?;

    let value = registry.decode(&Cell::text(16400, "(\"A\", 0.25)"))?;
    assert_eq!(value.literal().to_string(), "(A,0.25)");

    let grade = registry.decode_as::<GradeDistrib>(&Cell::text(16400, "(B,0.5)"))?;
    assert_eq!(grade.grade, "B");
    assert_eq!(grade.distrib, 0.5);

    // nested composite, quoted field is a composite literal itself
    registry.register_composite(
        "inventory_item",
        16410,
        [("name", "text"), ("supplier_id", "integer"), ("price", "numeric")],
    )?;
    registry.register_composite("on_hand", 16420, [("item", "inventory_item"), ("count", "int4")])?;

    let on_hand = registry.decode_as::<OnHand>(&Cell::text(16420, r#"("(""fuzzy dice"",42,1.99)",1000)"#))?;
    assert_eq!(on_hand.inventory.0, "fuzzy dice");
    assert_eq!(on_hand.inventory.1, 42);
    assert_eq!(on_hand.inventory.2, 1.99);
    assert_eq!(on_hand.count, 1000);

    // empty unquoted field is NULL
    let value = registry.decode(&Cell::text(16400, "(,)"))?;
    let record = value.as_record().unwrap();
    assert_eq!(record.get("grade"), Some(&Value::Null));

    let err = registry.decode(&Cell::text(16400, "(A,0.25,x)")).unwrap_err();
    tracing::info!("{err}");

    Ok(())
}
