use std::sync::Arc;

use async_trait::async_trait;
use factgraph_common::{Sleeper, TokioSleeper};
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Query};
use tracing::debug;

use crate::bolt::{from_bolt, to_bolt};
use crate::reconnect::{ConnectionStatus, Connector, Reconnector, RetryPolicy};
use crate::store::{GraphStore, Record, Statement, StoreError};
use crate::value::GraphValue;

/// Opens a verified Bolt connection pool.
pub struct Neo4jConnector {
    uri: String,
    user: String,
    password: String,
}

#[async_trait]
impl Connector for Neo4jConnector {
    type Handle = Graph;

    async fn connect(&self) -> Result<Graph, StoreError> {
        let config = ConfigBuilder::default()
            .uri(self.uri.as_str())
            .user(self.user.as_str())
            .password(self.password.as_str())
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(|e| StoreError::Client(format!("invalid Neo4j config: {e}")))?;
        let graph = Graph::connect(config).await.map_err(classify)?;

        // The pool connects lazily; force one round trip so a bad address or
        // bad credentials surface here.
        let mut stream = graph.execute(query("RETURN 1 AS ok")).await.map_err(classify)?;
        stream.next().await.map_err(classify)?;
        Ok(graph)
    }
}

/// Neo4j-backed [`GraphStore`]. Cheap to clone; clones share one connection
/// and one retry budget.
#[derive(Clone)]
pub struct GraphClient {
    inner: Arc<Reconnector<Neo4jConnector>>,
}

impl GraphClient {
    /// Build a client that connects on first use.
    pub fn new(
        uri: &str,
        user: &str,
        password: &str,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let connector = Neo4jConnector {
            uri: uri.to_string(),
            user: user.to_string(),
            password: password.to_string(),
        };
        Self {
            inner: Arc::new(Reconnector::new(connector, policy, sleeper)),
        }
    }

    /// Connect to Neo4j with the given credentials and the default retry
    /// policy, failing if no connection can be made.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, StoreError> {
        let client = Self::new(uri, user, password, RetryPolicy::default(), Arc::new(TokioSleeper));
        client.inner.acquire().await?;
        Ok(client)
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.status().await
    }

    /// Reset the retry budget and connect again.
    pub async fn reconnect(&self) -> Result<(), StoreError> {
        self.inner.reconnect().await.map(|_| ())
    }

    async fn run(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
        let lease = self.inner.acquire().await?;
        let columns = statement.returns.clone();
        debug!(cypher = %statement.cypher, params = statement.params.len(), "Running statement");

        let result = execute(&lease.handle, to_query(&statement), &columns).await;
        if let Err(e) = &result {
            if e.is_unavailable() {
                self.inner.invalidate(lease.generation).await;
            }
        }
        result
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn run_write(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
        self.run(statement).await
    }

    async fn run_read(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
        self.run(statement).await
    }
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(query(&statement.cypher), |q, (k, v)| q.param(k, to_bolt(v)))
}

async fn execute(graph: &Graph, q: Query, columns: &[String]) -> Result<Vec<Record>, StoreError> {
    let mut stream = graph.execute(q).await.map_err(classify)?;
    let mut records = Vec::new();
    while let Some(row) = stream.next().await.map_err(classify)? {
        let mut record = Record::default();
        for col in columns {
            let value = row
                .get::<BoltType>(col)
                .map(from_bolt)
                .unwrap_or(GraphValue::Null);
            record.insert(col.as_str(), value);
        }
        records.push(record);
    }
    Ok(records)
}

/// Split driver errors into "connection is gone" and everything else.
/// Other transient server errors (deadlocks, lock timeouts) leave the
/// connection usable and surface as client errors.
fn classify(err: neo4rs::Error) -> StoreError {
    let message = err.to_string();
    match err {
        neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
            StoreError::Unavailable(message)
        }
        _ if is_connection_loss(&message) => StoreError::Unavailable(message),
        _ => StoreError::Client(message),
    }
}

fn is_connection_loss(message: &str) -> bool {
    [
        "ServiceUnavailable",
        "DatabaseUnavailable",
        "connection reset",
        "broken pipe",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}
