pub mod batch;
pub mod deps;
pub mod error;
pub mod extractor;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batch::{prepare_dataset_items, Batcher};
pub use deps::{graph_client, IngestDeps};
pub use error::IngestError;
pub use extractor::{Extraction, FactExtractor, LlmExtractor};
pub use pipeline::{derive_verdict, temp_id, IngestPipeline, ItemStage};
