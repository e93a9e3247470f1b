pub mod client;
pub mod merge;
pub mod migrate;
pub mod reader;
pub mod reconnect;
pub mod schema;
pub mod store;
pub mod value;
pub mod writer;

mod bolt;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use merge::{MergeClause, PostMerge, SatelliteKind};
pub use reader::{GraphReader, Subgraph, SubgraphLink, SubgraphNode, SummaryVerdict};
pub use reconnect::{ConnectionStatus, Connector, Lease, Reconnector, RetryPolicy};
pub use schema::{NodeLabel, RelType};
pub use store::{GraphStore, Record, Statement, StoreError};
pub use value::GraphValue;
pub use writer::GraphWriter;
