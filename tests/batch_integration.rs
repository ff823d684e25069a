//! Integration tests for batch execution.
//!
//! The in-memory scenarios always run. The live scenarios need a cluster:
//!
//! ```text
//! CQLSHIM_TEST_URL=jdbc:cassandra://127.0.0.1:9042/system cargo test -- --ignored
//! ```

mod common;

use std::sync::Arc;

use common::{InMemoryTable, literal_insert, select_each};
use cqlshim::prelude::*;
use cqlshim::query::{BatchError, FailureKind};
use pretty_assertions::assert_eq;

const ROWS: i32 = MAX_ASYNC_QUERIES as i32 + 200;

fn statement(table: &Arc<InMemoryTable>) -> CassandraStatement<InMemoryTable> {
    CassandraStatement::new(BatchExecutor::new(Arc::clone(table)))
}

fn mixed_inserts(n: i32) -> String {
    (0..n)
        .map(|i| {
            if i % 100 == 0 {
                format!("INSERT INTO testcollection (k,L,m) VALUES( {i},[1, 3, 12345],1);")
            } else {
                format!("{};", literal_insert(i))
            }
        })
        .collect()
}

#[tokio::test]
async fn test_queued_inserts_then_split_select() {
    let table = Arc::new(InMemoryTable::default());
    let mut statement = statement(&table);

    for i in 0..ROWS {
        statement.add_batch(literal_insert(i));
    }
    let result = statement.execute_batch().await.unwrap();

    assert_eq!(result.len(), ROWS as usize);
    assert!(result.all_succeeded());
    assert_eq!(table.len(), ROWS as usize);
    assert_eq!(table.peak_in_flight(), MAX_ASYNC_QUERIES);

    let rows = statement.execute_query(&select_each(ROWS)).await.unwrap();
    assert_eq!(rows.len(), ROWS as usize);

    let mut ids: Vec<i32> = rows.rows().map(|r| r.get_int("k").unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..ROWS).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_split_statement_text() {
    let table = Arc::new(InMemoryTable::default());
    let statement = statement(&table);

    let text: String = (0..ROWS).map(|i| format!("{};", literal_insert(i))).collect();
    let result = statement.execute(&text).await.unwrap();
    assert_eq!(result.counts(), vec![Some(1); ROWS as usize]);

    let rows = statement.execute_query(&select_each(ROWS)).await.unwrap();
    let ids: Vec<i32> = rows.rows().map(|r| r.get_int("k").unwrap()).collect();
    assert_eq!(ids, (0..ROWS).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_prepared_batch_leaves_unset_columns() {
    let table = Arc::new(InMemoryTable::default());
    let mut insert = PreparedBatch::new(
        BatchExecutor::new(Arc::clone(&table)),
        "INSERT INTO testcollection (k,L,M) VALUES(?,?,?)",
    );

    for i in 0..ROWS {
        insert.set(1, i).unwrap();
        insert.set(2, vec![1i64, 3, 12345]).unwrap();
        insert.add_batch();
    }
    let result = insert.execute_batch().await.unwrap();

    assert_eq!(result.len(), ROWS as usize);
    assert_eq!(table.keys(), (0..ROWS).collect::<Vec<_>>());

    let (list, map) = table.get(7).unwrap();
    assert_eq!(list, Value::List(vec![Value::BigInt(1), Value::BigInt(3), Value::BigInt(12345)]));
    assert_eq!(map, Value::Null);
}

#[tokio::test]
async fn test_small_prepared_batches() {
    let table = Arc::new(InMemoryTable::default());
    let executor = BatchExecutor::new(Arc::clone(&table));

    for size in [10, 1] {
        let mut insert = PreparedBatch::new(
            executor.clone(),
            "INSERT INTO testcollection (k,L) VALUES(?,?)",
        );
        for i in 0..size {
            insert.set(1, i).unwrap();
            insert.set(2, vec![1i64, 3, 12345]).unwrap();
            insert.add_batch();
        }
        let result = insert.execute_batch().await.unwrap();
        assert_eq!(result.len(), size as usize);
    }

    assert_eq!(table.len(), 10);
}

#[tokio::test]
async fn test_mixed_invalid_statements_abort_batch() {
    let table = Arc::new(InMemoryTable::default());
    let statement = statement(&table);

    let err = statement.execute(&mixed_inserts(ROWS)).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.failed_index(), Some(0));
    assert!(matches!(
        &err,
        ScyllaError::Batch(BatchError::Transient { failure, .. })
            if failure.kind == FailureKind::Permanent
    ));
    // The failure sits in the first window; the second is never dispatched.
    assert_eq!(table.dispatched(), MAX_ASYNC_QUERIES);
}

#[tokio::test]
async fn test_mixed_invalid_statements_collected() {
    let table = Arc::new(InMemoryTable::default());
    let config = ExecutorConfig::default().with_failure_policy(FailurePolicy::CollectOutcomes);
    let statement = CassandraStatement::new(BatchExecutor::with_config(Arc::clone(&table), config));

    let result = statement.execute(&mixed_inserts(ROWS)).await.unwrap();

    let failed: Vec<usize> = result.failures().map(|(i, _)| i).collect();
    assert_eq!(failed, (0..ROWS as usize).step_by(100).collect::<Vec<_>>());
    assert_eq!(table.len(), ROWS as usize - failed.len());
}

#[tokio::test]
async fn test_trailing_comments_are_not_dispatched() {
    let table = Arc::new(InMemoryTable::default());
    let statement = statement(&table);

    let mut text: String = (0..10).map(|i| format!("{};", literal_insert(i))).collect();
    text.push_str("\n-- it's done\n/* $ */");

    let result = statement.execute(&text).await.unwrap();
    assert_eq!(result.len(), 10);
    assert_eq!(table.dispatched(), 10);
    assert_eq!(table.len(), 10);
}

#[tokio::test]
async fn test_empty_batch_dispatches_nothing() {
    let table = Arc::new(InMemoryTable::default());
    let mut statement = statement(&table);

    assert!(statement.execute_batch().await.unwrap().is_empty());
    assert!(statement.execute("").await.unwrap().is_empty());
    assert!(statement.execute_query(" ; ").await.unwrap().is_empty());
    assert_eq!(table.dispatched(), 0);
}

#[tokio::test]
async fn test_windowing_is_deterministic() {
    for _ in 0..2 {
        let table = Arc::new(InMemoryTable::default());
        let executor = BatchExecutor::new(Arc::clone(&table));
        let batch: Batch = (0..ROWS).map(literal_insert).collect();

        let (_, stats) = executor.execute_with_stats(&batch, 500).await.unwrap();
        assert_eq!(stats.windows, 3);
        assert_eq!(stats.dispatched, ROWS as usize);
        assert_eq!(table.peak_in_flight(), 500);
    }
}

// ==================== Live cluster ====================

const KEYSPACE: &str = "cqlshim_batch_test";

async fn live_pool() -> Option<ScyllaPool> {
    let url = std::env::var("CQLSHIM_TEST_URL").ok()?;
    let pool = ScyllaPool::from_url(&url).await.expect("connect");

    let conn = pool.get();
    conn.drop_keyspace_if_exists(KEYSPACE).await.expect("drop keyspace");
    conn.execute_raw(&format!(
        "CREATE KEYSPACE {KEYSPACE} WITH replication = {{ 'class' : 'SimpleStrategy', 'replication_factor' : 1 }}"
    ))
    .await
    .expect("create keyspace");
    pool.use_keyspace(KEYSPACE).await.expect("use keyspace");
    conn.execute_raw(
        "CREATE TABLE testcollection (k int PRIMARY KEY, L list<bigint>, M map<double, boolean>, S set<text>)",
    )
    .await
    .expect("create table");

    Some(pool)
}

#[tokio::test]
#[ignore = "requires a running cluster (CQLSHIM_TEST_URL)"]
async fn test_live_batch_and_split_select() {
    let Some(pool) = live_pool().await else {
        return;
    };
    let mut statement = pool.create_statement();

    for i in 0..ROWS {
        statement.add_batch(literal_insert(i));
    }
    let result = statement.execute_batch().await.unwrap();
    assert_eq!(result.len(), ROWS as usize);

    let rows = statement.execute_query(&select_each(ROWS)).await.unwrap();
    assert_eq!(rows.columns(), &["k", "l", "m", "s"]);
    let mut ids: Vec<i32> = rows.rows().map(|r| r.get_int("k").unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..ROWS).collect::<Vec<_>>());
    assert_eq!(pool.stats().cached_statements, 0);
}

#[tokio::test]
#[ignore = "requires a running cluster (CQLSHIM_TEST_URL)"]
async fn test_live_prepared_batch() {
    let Some(pool) = live_pool().await else {
        return;
    };
    let mut insert = pool
        .prepare_batch("INSERT INTO testcollection (k,L,M) VALUES(?,?,?)")
        .await
        .unwrap();

    for i in 0..ROWS {
        insert.set(1, i).unwrap();
        insert.set(2, vec![1i64, 3, 12345]).unwrap();
        insert.add_batch();
    }
    assert_eq!(insert.execute_batch().await.unwrap().len(), ROWS as usize);
    assert_eq!(pool.stats().cached_statements, 1);
}

#[tokio::test]
#[ignore = "requires a running cluster (CQLSHIM_TEST_URL)"]
async fn test_live_mixed_invalid_batch_is_transient() {
    let Some(pool) = live_pool().await else {
        return;
    };
    let statement = pool.create_statement();

    let err = statement.execute(&mixed_inserts(ROWS)).await.unwrap_err();
    assert!(err.is_retryable());
}
