//! CSV ingestion: row-range sharding, schema agreement, malformed input.


use std::sync::Arc;
use std::thread;
use std::time::Duration;

use shardtab_comm::{LocalHub, Rendezvous};
use shardtab_core::config::ContextConfig;
use shardtab_core::id::Rank;
use shardtab_core::schema::{DataType, Field, Schema};
use shardtab_exec::{DistributedContext, DistributedTable, ExecError};
use shardtab_io::{CsvReadOptions, CsvSource, TableSource};
use test_data_gen::{column_i64, temp_dir, write_file, write_people_csv};

#[test]
fn test_shards_concatenate_to_whole_file() {
    let dir = temp_dir("csv-shards");
    let path = dir.join("people.csv");
    write_people_csv(&path, 10);
    let source = CsvSource::new(&path);

    for world_size in 1..=4 {
        let mut ids = Vec::new();
        let mut schemas = Vec::new();
        for rank in 0..world_size {
            let shard = source.load_shard(Rank::new(rank), world_size).unwrap();
            ids.extend(column_i64(&shard, 0));
            schemas.push(shard.schema());
        }
        assert_eq!(ids, (0..10).collect::<Vec<i64>>(), "world_size {world_size}");
        assert!(schemas.windows(2).all(|w| w[0] == w[1]));
    }
}

#[test]
fn test_inferred_schema() {
    let dir = temp_dir("csv-schema");
    let path = dir.join("people.csv");
    write_people_csv(&path, 4);

    let shard = CsvSource::new(&path).load_shard(Rank::new(0), 1).unwrap();
    let expected = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("score", DataType::Float64, false),
        Field::new("flag", DataType::Boolean, false),
    ]);
    assert_eq!(shard.schema(), expected);
}

#[test]
fn test_every_rank_sees_schema_even_when_empty() {
    let dir = temp_dir("csv-empty-shard");
    let path = dir.join("two.csv");
    write_file(&path, "a,b\n1,x\n2,y\n");

    let hub = LocalHub::new();
    let world_size = 3;
    let handles: Vec<_> = (0..world_size)
        .map(|_| {
            let ep: Arc<dyn Rendezvous> = Arc::new(hub.endpoint());
            let path = path.clone();
            thread::spawn(move || {
                let cfg = ContextConfig::default()
                    .with_world_size(world_size)
                    .with_join_timeout(Duration::from_secs(10));
                let mut ctx = DistributedContext::init_with(ep, cfg).unwrap();
                let out = {
                    let table =
                        DistributedTable::from_source(&ctx, &CsvSource::new(&path)).unwrap();
                    (table.num_rows(), table.schema().clone())
                };
                ctx.finalize().unwrap();
                out
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().map(|(n, _)| n).sum::<usize>(), 2);
    assert!(results.iter().any(|(n, _)| *n == 0));
    assert!(results.windows(2).all(|w| w[0].1 == w[1].1));
    assert_eq!(results[0].1.len(), 2);
}

#[test]
fn test_ragged_csv_is_ingestion_error() {
    let dir = temp_dir("csv-ragged");
    let path = dir.join("bad.csv");
    write_file(&path, "a,b\n1,2\n3\n");

    let mut ctx = DistributedContext::init(ContextConfig::default()).unwrap();
    let err = DistributedTable::from_source(&ctx, &CsvSource::new(&path)).unwrap_err();
    match err {
        ExecError::Ingestion { location, error } => {
            assert!(location.ends_with("bad.csv"));
            assert!(matches!(error, shardtab_io::Error::Csv(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    ctx.finalize().unwrap();
}

#[test]
fn test_missing_file_is_ingestion_error() {
    let dir = temp_dir("csv-missing");
    let mut ctx = DistributedContext::init(ContextConfig::default()).unwrap();
    let err = DistributedTable::from_source(&ctx, &CsvSource::new(dir.join("nope.csv")))
        .unwrap_err();
    assert!(matches!(
        err,
        ExecError::Ingestion {
            error: shardtab_io::Error::Io(_),
            ..
        }
    ));
    ctx.finalize().unwrap();
}

#[test]
fn test_explicit_schema_rejects_bad_cell() {
    let dir = temp_dir("csv-explicit");
    let path = dir.join("typed.csv");
    write_file(&path, "a\n1\n2\nthree\n");

    let schema = Schema::new(vec![Field::new("a", DataType::Int64, false)]);
    let source = CsvSource::with_options(&path, CsvReadOptions::default().with_schema(schema));
    assert!(source.schema().is_some());

    let mut ctx = DistributedContext::init(ContextConfig::default()).unwrap();
    let err = DistributedTable::from_source(&ctx, &source).unwrap_err();
    assert!(matches!(
        err,
        ExecError::Ingestion {
            error: shardtab_io::Error::Parse { line: 4, .. },
            ..
        }
    ));
    ctx.finalize().unwrap();
}

#[test]
fn test_headerless_with_delimiter() {
    let dir = temp_dir("csv-headerless");
    let path = dir.join("semi.csv");
    write_file(&path, "4;a\n1;b\n4;c\n");

    let options = CsvReadOptions::default()
        .with_header(false)
        .with_delimiter(b';');
    let shard = CsvSource::with_options(&path, options)
        .load_shard(Rank::new(0), 1)
        .unwrap();
    assert_eq!(shard.num_rows(), 3);
    assert_eq!(column_i64(&shard, 0), vec![4, 1, 4]);
    assert_eq!(shard.columns()[1].name(), "c1");
}
