//! Local selection semantics on a DistributedTable.


use shardtab_core::config::ContextConfig;
use shardtab_core::partition::Partition;
use shardtab_core::schema::{DataType, Field, Schema};
use shardtab_exec::{DistributedContext, DistributedTable, ExecError};
use shardtab_io::{CsvSource, MemorySource};
use shardtab_operators::ComparePredicate;
use test_data_gen::{column_i64, int_partition, temp_dir, write_file};

fn with_context<F: FnOnce(&DistributedContext)>(f: F) {
    let mut ctx = DistributedContext::init(ContextConfig::default()).expect("init");
    f(&ctx);
    ctx.finalize().expect("finalize");
}

#[test]
fn test_result_is_ordered_subsequence() {
    with_context(|ctx| {
        let values = [7, 3, 9, 1, 8, 2, 6];
        let table =
            DistributedTable::from_source(ctx, &MemorySource::new("t", int_partition(&values)))
                .unwrap();
        let out = table.select(|row| Ok(row.get_i64(0)? > Some(4))).unwrap();

        assert_eq!(column_i64(out.partition(), 0), vec![7, 9, 8, 6]);
        // Original positions strictly increase.
        let pos = column_i64(out.partition(), 1);
        assert!(pos.windows(2).all(|w| w[0] < w[1]));
        assert!(out.num_rows() <= table.num_rows());
    });
}

#[test]
fn test_always_true_is_identity() {
    with_context(|ctx| {
        let table =
            DistributedTable::from_source(ctx, &MemorySource::new("t", int_partition(&[1, 2, 3])))
                .unwrap();
        let out = table.select(|_| Ok(true)).unwrap();
        assert_eq!(out.partition(), table.partition());
        assert_eq!(out.schema(), table.schema());
    });
}

#[test]
fn test_always_false_keeps_schema() {
    with_context(|ctx| {
        let table =
            DistributedTable::from_source(ctx, &MemorySource::new("t", int_partition(&[1, 2, 3])))
                .unwrap();
        let out = table.select(|_| Ok(false)).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.num_columns(), 2);
        assert_eq!(out.schema(), table.schema());
        assert_eq!(out.partition().schema(), *table.schema());
    });
}

#[test]
fn test_select_is_idempotent() {
    with_context(|ctx| {
        let table = DistributedTable::from_source(
            ctx,
            &MemorySource::new("t", int_partition(&[5, 1, 5, 2, 9, 5])),
        )
        .unwrap();
        let pred = ComparePredicate::parse("a >= 5").unwrap();
        let once = table.select_with(&pred).unwrap();
        let twice = once.select_with(&pred).unwrap();
        assert_eq!(once.partition(), twice.partition());
    });
}

#[test]
fn test_first_column_equals_four_from_csv() {
    let dir = temp_dir("select-csv");
    let path = dir.join("a.csv");
    write_file(&path, "a,b\n1,x\n2,y\n3,z\n4,u\n4,v\n");

    with_context(|ctx| {
        let table = DistributedTable::from_source(ctx, &CsvSource::new(&path)).unwrap();
        let out = table.select_with(&ComparePredicate::parse("$0 == 4").unwrap()).unwrap();

        assert_eq!(out.num_rows(), 2);
        assert_eq!(column_i64(out.partition(), 0), vec![4, 4]);
        let tags: Vec<String> = out
            .rows()
            .map(|r| r.get_str(1).unwrap().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["u", "v"]);

        // Source table untouched.
        assert_eq!(column_i64(table.partition(), 0), vec![1, 2, 3, 4, 4]);
    });
}

#[test]
fn test_empty_partition_selects_empty() {
    let schema = Schema::new(vec![
        Field::new("a", DataType::Int64, false),
        Field::new("s", DataType::Utf8, true),
    ]);
    with_context(|ctx| {
        let table = DistributedTable::from_source(
            ctx,
            &MemorySource::new("empty", Partition::empty(&schema)),
        )
        .unwrap();
        let out = table
            .select(|_| Err(shardtab_core::Error::Predicate("never called".into())))
            .unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(*out.schema(), schema);
    });
}

#[test]
fn test_predicate_error_aborts_whole_select() {
    with_context(|ctx| {
        let table = DistributedTable::from_source(
            ctx,
            &MemorySource::new("t", int_partition(&[10, 20, 30, 40])),
        )
        .unwrap();
        // Row 2 reads a column the table does not have.
        let err = table
            .select(|row| {
                let col = if row.index() == 2 { 99 } else { 0 };
                Ok(!row.get(col)?.is_null())
            })
            .unwrap_err();

        match err {
            ExecError::PredicateEvaluation { row, source } => {
                assert_eq!(row, 2);
                assert_eq!(
                    source,
                    shardtab_core::Error::ColumnIndexOutOfRange {
                        index: 99,
                        num_columns: 2
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(table.num_rows(), 4);
    });
}

#[test]
fn test_type_mismatch_in_predicate_reports_row() {
    with_context(|ctx| {
        let table =
            DistributedTable::from_source(ctx, &MemorySource::new("t", int_partition(&[1, 2])))
                .unwrap();
        let err = table
            .select(|row| Ok(row.get_str(0)? == Some("1")))
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::PredicateEvaluation {
                row: 0,
                source: shardtab_core::Error::TypeMismatch { .. }
            }
        ));
    });
}

#[test]
fn test_compare_predicate_on_unknown_column_fails() {
    with_context(|ctx| {
        let table =
            DistributedTable::from_source(ctx, &MemorySource::new("t", int_partition(&[1])))
                .unwrap();
        let err = table
            .select_with(&ComparePredicate::parse("missing == 1").unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::PredicateEvaluation {
                row: 0,
                source: shardtab_core::Error::ColumnNotFound(_)
            }
        ));
    });
}

#[test]
fn test_print_renders_selected_rows() {
    with_context(|ctx| {
        let table = DistributedTable::from_source(
            ctx,
            &MemorySource::new("t", int_partition(&[4, 1, 4])),
        )
        .unwrap();
        let out = table.select(|row| Ok(row.get_i64(0)? == Some(4))).unwrap();

        let mut buf = Vec::new();
        out.print_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("a:int64 | pos:int64\n"));
        assert!(text.ends_with("(2 rows)\n"));

        let mut head = Vec::new();
        out.print_head_to(&mut head, 1).unwrap();
        assert!(String::from_utf8(head).unwrap().contains("... 1 more rows"));
    });
}
