use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::value::GraphValue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient: the connection was dropped or never came up. Callers may
    /// retry later; the adapter reconnects on next use.
    #[error("Graph store unavailable, retry later: {0}")]
    Unavailable(String),

    /// The store rejected the statement (syntax, constraint violation, ...).
    #[error("Graph statement rejected: {0}")]
    Client(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// One parameterized query plus the result columns it projects.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub params: BTreeMap<String, GraphValue>,
    pub returns: Vec<String>,
}

impl Statement {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: BTreeMap::new(),
            returns: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<GraphValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn returns(mut self, columns: &[&str]) -> Self {
        self.returns = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// One result row, keyed by the statement's return columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(pub BTreeMap<String, GraphValue>);

impl Record {
    pub fn get(&self, key: &str) -> Option<&GraphValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(GraphValue::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<GraphValue>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<GraphValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Statement execution against the graph. Each call is one transaction; the
/// implementation never retries internally.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run_write(&self, statement: Statement) -> Result<Vec<Record>, StoreError>;

    async fn run_read(&self, statement: Statement) -> Result<Vec<Record>, StoreError>;
}
