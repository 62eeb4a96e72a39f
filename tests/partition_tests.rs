//! Partition construction and row access.

use shardtab_core::prelude::*;

#[test]
fn test_unequal_columns_rejected() {
    let err = Partition::build(vec![
        Column::from_i64s("a", vec![1, 2, 3]),
        Column::from_strs("b", vec!["x", "y"]),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));
}

#[test]
fn test_duplicate_names_rejected() {
    let err = Partition::build(vec![
        Column::from_i64s("a", vec![1]),
        Column::from_i64s("a", vec![2]),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));
}

#[test]
fn test_row_out_of_bounds() {
    let p = Partition::build(vec![Column::from_i64s("a", vec![1, 2])]).unwrap();
    assert!(p.row(1).is_ok());
    assert_eq!(
        p.row(2).unwrap_err(),
        Error::IndexOutOfBounds { index: 2, len: 2 }
    );
    assert!(matches!(p.take(&[0, 5]), Err(Error::IndexOutOfBounds { index: 5, .. })));
}

#[test]
fn test_nulls_round_through_builder() {
    let field = Field::new("n", DataType::Float64, true);
    let mut b = ColumnBuilder::new(field);
    b.push(ValueRef::F64(1.5)).unwrap();
    b.push_null().unwrap();
    let col = b.finish();
    assert_eq!(col.null_count(), 1);

    let p = Partition::build(vec![col]).unwrap();
    let row = p.row(1).unwrap();
    assert_eq!(row.get(0).unwrap(), ValueRef::Null);
    assert_eq!(row.get_f64(0).unwrap(), None);
    assert_eq!(row.to_scalars(), vec![Scalar::Null]);
}

#[test]
fn test_builder_enforces_field() {
    let mut b = ColumnBuilder::new(Field::new("a", DataType::Int64, false));
    assert!(matches!(
        b.push(ValueRef::Str("x")),
        Err(Error::TypeMismatch {
            expected: DataType::Int64,
            found: DataType::Utf8,
            ..
        })
    ));
    assert!(matches!(b.push_null(), Err(Error::NullViolation(_))));
    assert!(b.is_empty());
}

#[test]
fn test_lookup_by_name() {
    let p = Partition::build(vec![
        Column::from_i64s("id", vec![7]),
        Column::from_bools("ok", vec![true]),
    ])
    .unwrap();
    let row = p.row(0).unwrap();
    assert_eq!(row.get_by_name("ok").unwrap(), ValueRef::Bool(true));
    assert_eq!(
        row.get_by_name("nope").unwrap_err(),
        Error::ColumnNotFound("nope".into())
    );
    assert!(p.column_by_name("id").is_some());
}
