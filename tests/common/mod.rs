//! An in-memory `testcollection` table speaking just enough CQL for the
//! batch scenarios.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cqlshim::query::{
    ResultSet, Statement, StatementFailure, StatementOutcome, StatementSession, Value,
};
use parking_lot::Mutex;

/// `CREATE TABLE testcollection (k int PRIMARY KEY, L list<bigint>, M map<double, boolean>)`
#[derive(Default)]
pub struct InMemoryTable {
    rows: Mutex<BTreeMap<i32, (Value, Value)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    dispatched: AtomicUsize,
}

impl InMemoryTable {
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn keys(&self) -> Vec<i32> {
        self.rows.lock().keys().copied().collect()
    }

    pub fn get(&self, k: i32) -> Option<(Value, Value)> {
        self.rows.lock().get(&k).cloned()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn apply(&self, statement: &Statement) -> Result<u64, StatementFailure> {
        let cql = statement.cql().trim();
        let upper = cql.to_uppercase();

        if upper.starts_with("TRUNCATE") {
            self.rows.lock().clear();
            return Ok(1);
        }
        if !upper.starts_with("INSERT INTO TESTCOLLECTION") {
            return Err(StatementFailure::permanent(format!("unsupported statement: {cql}")));
        }

        let (k, list, map) = match statement.params() {
            Some(params) => {
                let values = params.values();
                let k = values.first().and_then(|v| v.as_i32().ok());
                let list = values.get(1).cloned().unwrap_or(Value::Unset);
                let map = values.get(2).cloned().unwrap_or(Value::Unset);
                (k, list, map)
            }
            None => parse_literal_insert(cql)?,
        };

        let k = k.ok_or_else(|| StatementFailure::permanent("missing partition key k"))?;
        if !matches!(map, Value::Unset | Value::Null | Value::Map(_)) {
            return Err(StatementFailure::permanent(
                "Invalid map literal for m of type map<double, boolean>",
            ));
        }

        let mut rows = self.rows.lock();
        let row = rows.entry(k).or_insert((Value::Null, Value::Null));
        if list != Value::Unset {
            row.0 = list;
        }
        if map != Value::Unset {
            row.1 = map;
        }
        Ok(1)
    }

    fn select(&self, statement: &Statement) -> Result<ResultSet, StatementFailure> {
        let cql = statement.cql();
        let k: i32 = cql
            .to_lowercase()
            .rsplit_once("where k =")
            .and_then(|(_, k)| k.trim().parse().ok())
            .ok_or_else(|| StatementFailure::permanent(format!("unsupported query: {cql}")))?;

        let rows = self
            .get(k)
            .map(|(l, m)| vec![vec![Value::Int(k), l, m]])
            .unwrap_or_default();
        Ok(ResultSet::new(
            vec!["k".to_string(), "l".to_string(), "m".to_string()],
            rows,
        ))
    }
}

/// `INSERT INTO testcollection (k,L[,m]) VALUES( k,[..][,m])`
fn parse_literal_insert(cql: &str) -> Result<(Option<i32>, Value, Value), StatementFailure> {
    let (columns, values) = cql
        .split_once("VALUES(")
        .ok_or_else(|| StatementFailure::permanent(format!("line 1: no viable alternative: {cql}")))?;

    let k = values.split(',').next().and_then(|k| k.trim().parse().ok());
    let list = values
        .split_once('[')
        .and_then(|(_, rest)| rest.split_once(']'))
        .map(|(items, _)| {
            Value::List(
                items
                    .split(',')
                    .filter_map(|i| i.trim().parse::<i64>().ok())
                    .map(Value::BigInt)
                    .collect(),
            )
        })
        .unwrap_or(Value::Unset);

    let has_map = columns.to_lowercase().contains(",m)");
    let map = if has_map {
        let raw = values.rsplit(',').next().unwrap_or_default();
        Value::Text(raw.trim().trim_end_matches(')').to_string())
    } else {
        Value::Unset
    };

    Ok((k, list, map))
}

#[async_trait]
impl StatementSession for InMemoryTable {
    async fn submit(&self, statement: &Statement) -> StatementOutcome {
        self.enter().await;
        self.apply(statement).into()
    }

    async fn fetch(&self, statement: &Statement) -> Result<ResultSet, StatementFailure> {
        self.enter().await;
        self.select(statement)
    }
}

pub fn literal_insert(k: i32) -> String {
    format!("INSERT INTO testcollection (k,L) VALUES( {k},[1, 3, 12345])")
}

pub fn select_each(n: i32) -> String {
    (0..n)
        .map(|k| format!("SELECT * FROM testcollection where k = {k};"))
        .collect()
}
