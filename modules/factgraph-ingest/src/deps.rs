use std::sync::Arc;
use std::time::Duration;

use ai_client::Groq;
use factgraph_common::{Config, Sleeper, TokioSleeper};
use factgraph_graph::{GraphClient, GraphReader, GraphStore, GraphWriter, RetryPolicy};
use typed_builder::TypedBuilder;

use crate::batch::Batcher;
use crate::extractor::{FactExtractor, LlmExtractor};
use crate::pipeline::IngestPipeline;

/// Shared dependency container for ingestion and read-back.
///
/// Holds the long-lived handles every entry point needs. Binaries build one
/// from [`Config`]; tests build one from doubles.
#[derive(Clone, TypedBuilder)]
pub struct IngestDeps {
    pub store: Arc<dyn GraphStore>,
    pub extractor: Arc<dyn FactExtractor>,
    #[builder(default = Arc::new(TokioSleeper))]
    pub sleeper: Arc<dyn Sleeper>,
    #[builder(default = 3)]
    pub batch_size: usize,
    #[builder(default = Duration::from_millis(1000))]
    pub batch_pause: Duration,
}

impl IngestDeps {
    /// Production wiring: Neo4j through `client`, Groq for extraction.
    pub fn from_config(config: &Config, client: GraphClient) -> Self {
        let model = Groq::new(&config.groq_api_key, &config.llm_model)
            .with_base_url(&config.groq_base_url);
        Self::builder()
            .store(Arc::new(client))
            .extractor(Arc::new(LlmExtractor::new(model)))
            .batch_size(config.batch_size)
            .batch_pause(config.batch_pause)
            .build()
    }

    pub fn writer(&self) -> GraphWriter {
        GraphWriter::new(self.store.clone())
    }

    pub fn reader(&self) -> GraphReader {
        GraphReader::new(self.store.clone())
    }

    pub fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::new(self.extractor.clone(), self.writer())
    }

    pub fn batcher(&self) -> Batcher {
        Batcher::new(
            self.pipeline(),
            self.sleeper.clone(),
            self.batch_size,
            self.batch_pause,
        )
    }
}

/// Lazily-connecting Neo4j client with the configured retry policy.
pub fn graph_client(config: &Config) -> GraphClient {
    let policy = RetryPolicy {
        max_attempts: config.neo4j_connect_attempts,
        delay: config.neo4j_retry_delay,
    };
    GraphClient::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
        policy,
        Arc::new(TokioSleeper),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockExtractor, MockStore, RecordingSleeper};
    use factgraph_common::RawItem;

    #[tokio::test]
    async fn builder_wires_doubles_through_every_entry_point() {
        let store = Arc::new(MockStore::new());
        let sleeper = Arc::new(RecordingSleeper::default());
        let deps = IngestDeps::builder()
            .store(store.clone())
            .extractor(Arc::new(MockExtractor::new()))
            .sleeper(sleeper.clone())
            .batch_size(1)
            .build();

        let items: Vec<RawItem> = (0..3)
            .map(|i| RawItem::new().with("id", i).with("text", format!("t{i}")))
            .collect();
        let report = deps.batcher().ingest_batch(&items).await;

        assert_eq!(report.succeeded, 3);
        assert_eq!(store.write_count(), 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(1000); 2]);

        assert!(deps.writer().update_verdict("0", "True", None).await.unwrap());
        assert!(deps.reader().fetch_summary_and_verdict("0").await.unwrap().is_none());
        assert_eq!(store.read_count(), 1);
    }
}
