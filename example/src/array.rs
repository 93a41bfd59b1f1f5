use pgcell::{Cell, Record, Registry, Result, Value, postgres::oid};

pub fn main() -> Result<()> {
    let registry = Registry::new();

    let matrix: Vec<Vec<i32>> = registry.decode_as(&Cell::text(oid::INT4_ARRAY, "{{1,2,3},{4,5,6},{7,8,9}}"))?;
    assert_eq!(matrix[2], [7, 8, 9]);

    let texts: Vec<Option<String>> = registry.decode_as(&Cell::text(oid::TEXT_ARRAY, r#"{a,NULL,"NULL","b\"c"}"#))?;
    assert_eq!(texts, [Some("a".into()), None, Some("NULL".into()), Some("b\"c".into())]);

    // explicit bounds are accepted and discarded
    let value = registry.decode(&Cell::text(oid::INT4_ARRAY, "[0:1]={5,6}"))?;
    assert_eq!(value, Value::Array(vec![Value::Int(5), Value::Int(6)]));

    let boxes = registry.decode(&Cell::text(oid::BOX_ARRAY, "{(1,1),(0,0);(2,2),(1,1)}"))?;
    assert_eq!(boxes.as_array().map(<[Value]>::len), Some(2));

    registry.register_composite("grade_distrib", 16400, [("grade", "bpchar"), ("distrib", "float8")])?;
    registry.register_array("_grade_distrib", 16401, "grade_distrib")?;

    let grades: Vec<Record> =
        registry.decode_as(&Cell::text(16401, r#"{"(A,0.1)","(B,0.2)","(C,0.3)","(D,0.4)"}"#))?;
    assert_eq!(grades.len(), 4);
    assert_eq!(grades[3].get("distrib"), Some(&Value::Float(0.4)));

    let err = registry.decode(&Cell::text(oid::INT4_ARRAY, "{{1,2},{3}}")).unwrap_err();
    tracing::info!("{err}");

    Ok(())
}
