use std::sync::Arc;

use factgraph_common::MANUAL_UPDATE_SOURCE;
use tracing::{info, warn};

use crate::merge::{verdict_update, PostMerge};
use crate::store::{GraphStore, Record, StoreError};

/// Write side of the post graph.
#[derive(Clone)]
pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Run the merge for one post. `Ok(true)` only when the store echoes the
    /// post's id back.
    pub async fn merge_post(&self, plan: &PostMerge) -> Result<bool, StoreError> {
        let records = self.store.run_write(plan.statement()).await?;
        let confirmed = echoes_id(&records, plan.post_id());
        if !confirmed {
            warn!(post_id = plan.post_id(), "Post merge returned no confirmation");
        }
        Ok(confirmed)
    }

    /// Attach a verdict to an existing post. `Ok(false)` when no such post
    /// exists. The source defaults to "ManualUpdate".
    pub async fn update_verdict(
        &self,
        post_id: &str,
        verdict: &str,
        source: Option<&str>,
    ) -> Result<bool, StoreError> {
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(MANUAL_UPDATE_SOURCE);
        let records = self
            .store
            .run_write(verdict_update(post_id, verdict, source))
            .await?;

        let found = echoes_id(&records, post_id);
        if found {
            info!(post_id, verdict, source, "Verdict updated");
        }
        Ok(found)
    }
}

fn echoes_id(records: &[Record], post_id: &str) -> bool {
    records
        .first()
        .and_then(|r| r.get_str("postId"))
        .is_some_and(|id| id == post_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Statement;
    use crate::value::GraphValue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes `$postId` unless the id is in `missing`.
    #[derive(Default)]
    struct EchoStore {
        missing: Vec<String>,
        seen: Mutex<Vec<Statement>>,
    }

    #[async_trait]
    impl GraphStore for EchoStore {
        async fn run_write(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
            let id = statement.params.get("postId").and_then(GraphValue::as_str).map(str::to_string);
            self.seen.lock().unwrap().push(statement);
            match id {
                Some(id) if !self.missing.contains(&id) => Ok(vec![Record::from_iter([("postId", id)])]),
                _ => Ok(vec![]),
            }
        }

        async fn run_read(&self, _statement: Statement) -> Result<Vec<Record>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn merge_is_confirmed_by_echoed_id() {
        let writer = GraphWriter::new(Arc::new(EchoStore::default()));
        assert!(writer.merge_post(&PostMerge::new("p1", "hi")).await.unwrap());
    }

    #[tokio::test]
    async fn empty_result_is_unconfirmed() {
        let store = EchoStore {
            missing: vec!["p1".into()],
            ..Default::default()
        };
        let writer = GraphWriter::new(Arc::new(store));
        assert!(!writer.merge_post(&PostMerge::new("p1", "hi")).await.unwrap());
    }

    #[tokio::test]
    async fn verdict_update_defaults_source() {
        let store = Arc::new(EchoStore::default());
        let writer = GraphWriter::new(store.clone());

        assert!(writer.update_verdict("p1", "False", None).await.unwrap());
        let seen = store.seen.lock().unwrap();
        assert_eq!(seen[0].params["verdictSource"], GraphValue::from("ManualUpdate"));
    }

    #[tokio::test]
    async fn verdict_update_on_missing_post_is_false() {
        let store = EchoStore {
            missing: vec!["ghost".into()],
            ..Default::default()
        };
        let writer = GraphWriter::new(Arc::new(store));
        assert!(!writer.update_verdict("ghost", "True", Some("Snopes")).await.unwrap());
    }
}
