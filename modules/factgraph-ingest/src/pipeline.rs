use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use factgraph_common::{
    clean_text, extract_hashtags, extract_mentions, normalize_timestamp, ProcessOutcome, RawItem,
    DATASET_LABEL_SOURCE,
};
use factgraph_graph::{GraphWriter, PostMerge, SatelliteKind};

use crate::error::IngestError;
use crate::extractor::{Extraction, FactExtractor};

pub const MISSING_TEXT_MESSAGE: &str = "Input data is missing a valid text field.";
pub const UNCONFIRMED_MESSAGE: &str = "Graph insertion could not be confirmed.";
const UNKNOWN_ID: &str = "unknown_id";

/// Where an item is in its trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Pending,
    Extracting,
    Merging,
    Success,
    Error,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStage::Pending => "pending",
            ItemStage::Extracting => "extracting",
            ItemStage::Merging => "merging",
            ItemStage::Success => "success",
            ItemStage::Error => "error",
        };
        f.write_str(s)
    }
}

/// Turns one raw item into one merged post.
#[derive(Clone)]
pub struct IngestPipeline {
    extractor: Arc<dyn FactExtractor>,
    writer: GraphWriter,
}

impl IngestPipeline {
    pub fn new(extractor: Arc<dyn FactExtractor>, writer: GraphWriter) -> Self {
        Self { extractor, writer }
    }

    /// Normalize, extract, and merge one item.
    ///
    /// Input defects (no usable text) and unconfirmed writes come back as
    /// error-status outcomes. Store failures are returned as `Err`.
    pub async fn process_item(&self, item: &RawItem) -> Result<ProcessOutcome, IngestError> {
        let Some(raw_text) = item.text() else {
            let id = item.id().unwrap_or_else(|| UNKNOWN_ID.to_string());
            warn!(post_id = %id, "Skipping item without a usable text field");
            return Ok(ProcessOutcome::error(id, MISSING_TEXT_MESSAGE));
        };

        let text = clean_text(raw_text);
        let post_id = item.id().unwrap_or_else(|| temp_id(&text));
        stage(&post_id, ItemStage::Pending);

        stage(&post_id, ItemStage::Extracting);
        let extraction = self
            .extractor
            .extract(&text)
            .await
            .map_err(IngestError::Extraction)?;

        stage(&post_id, ItemStage::Merging);
        let plan = build_merge(&post_id, &text, item, extraction);
        let confirmed = self.writer.merge_post(&plan).await.inspect_err(|e| {
            stage(&post_id, ItemStage::Error);
            warn!(post_id = %post_id, error = %e, "Post merge failed");
        })?;

        if confirmed {
            stage(&post_id, ItemStage::Success);
            info!(post_id = %post_id, "Post ingested");
            Ok(ProcessOutcome::success(post_id))
        } else {
            stage(&post_id, ItemStage::Error);
            Ok(ProcessOutcome::error(post_id, UNCONFIRMED_MESSAGE))
        }
    }
}

fn stage(post_id: &str, stage: ItemStage) {
    debug!(post_id, %stage, "Item stage");
}

fn build_merge(post_id: &str, text: &str, item: &RawItem, extraction: Extraction) -> PostMerge {
    PostMerge::new(post_id, text)
        .summary(extraction.summary)
        .author(item.author())
        .timestamp(item.date().and_then(normalize_timestamp))
        .verdict(item.label().and_then(derive_verdict), DATASET_LABEL_SOURCE)
        .satellites(SatelliteKind::Claim, extraction.claims)
        .satellites(SatelliteKind::Entity, extraction.entities)
        .satellites(SatelliteKind::Keyword, extraction.keywords)
        .satellites(SatelliteKind::Hashtag, extract_hashtags(text))
        .satellites(SatelliteKind::Mention, extract_mentions(text))
}

/// Map a source label to a verdict. "true" wins over "false" when both occur.
pub fn derive_verdict(label: &str) -> Option<String> {
    let lower = label.to_lowercase();
    if lower.contains("true") {
        Some("True".to_string())
    } else if lower.contains("false") {
        Some("False".to_string())
    } else {
        None
    }
}

/// Content-derived id for items that carry none. Identical text yields the
/// same id.
pub fn temp_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("temp_id_{}", &hex::encode(digest)[..16])
}
