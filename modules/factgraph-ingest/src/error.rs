use factgraph_graph::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Extraction failed: {0}")]
    Extraction(anyhow::Error),
}
