use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names checked, in order, for an item's primary text.
pub const TEXT_FIELDS: [&str; 4] = ["text", "claim", "input", "inputs_pretokenized"];
/// Field names checked, in order, for a source-provided fact-check label.
pub const LABEL_FIELDS: [&str; 2] = ["label", "targets_pretokenized"];

pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const DATASET_LABEL_SOURCE: &str = "DatasetLabel";
pub const MANUAL_UPDATE_SOURCE: &str = "ManualUpdate";

/// One inbound text item: a loosely-shaped JSON object (social post, claim,
/// or dataset row). Accessors apply the field fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawItem(pub Map<String, Value>);

impl RawItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// First non-empty string among [`TEXT_FIELDS`].
    pub fn text(&self) -> Option<&str> {
        TEXT_FIELDS.iter().find_map(|k| self.non_empty_str(k))
    }

    /// Caller-supplied id. Strings are used verbatim, numbers are rendered.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn author(&self) -> Option<&str> {
        self.non_empty_str("author")
    }

    pub fn date(&self) -> Option<&str> {
        self.non_empty_str("date")
    }

    pub fn label(&self) -> Option<&str> {
        LABEL_FIELDS.iter().find_map(|k| self.0.get(*k)?.as_str())
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Success,
    Error,
}

/// Per-item result of the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub post_id: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProcessOutcome {
    pub fn success(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            status: ItemStatus::Success,
            message: None,
        }
    }

    pub fn error(post_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            status: ItemStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Success
    }
}

/// Aggregate result of a batched ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub sample_succeeded_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> RawItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_falls_back_through_known_fields() {
        assert_eq!(item(json!({"text": "a", "claim": "b"})).text(), Some("a"));
        assert_eq!(item(json!({"claim": "b", "input": "c"})).text(), Some("b"));
        assert_eq!(item(json!({"input": "c"})).text(), Some("c"));
        assert_eq!(
            item(json!({"inputs_pretokenized": "d"})).text(),
            Some("d")
        );
    }

    #[test]
    fn non_string_or_empty_text_is_missing() {
        assert_eq!(item(json!({"text": 5})).text(), None);
        assert_eq!(item(json!({"text": ""})).text(), None);
        assert_eq!(item(json!({"id": "x"})).text(), None);
    }

    #[test]
    fn numeric_ids_are_rendered() {
        assert_eq!(item(json!({"id": 17})).id().as_deref(), Some("17"));
        assert_eq!(item(json!({"id": "p-1"})).id().as_deref(), Some("p-1"));
        assert_eq!(item(json!({"id": null})).id(), None);
    }

    #[test]
    fn label_reads_dataset_target_column() {
        let it = item(json!({"targets_pretokenized": "false"}));
        assert_eq!(it.label(), Some("false"));
    }

    #[test]
    fn outcome_serializes_camel_case_without_empty_message() {
        let v = serde_json::to_value(ProcessOutcome::success("p1")).unwrap();
        assert_eq!(v, json!({"postId": "p1", "status": "success"}));

        let report = BatchReport {
            total_items: 2,
            succeeded: 1,
            failed: 1,
            sample_succeeded_ids: vec!["p1".into()],
        };
        let v = serde_json::to_value(report).unwrap();
        assert_eq!(v["totalItems"], 2);
        assert_eq!(v["sampleSucceededIds"], json!(["p1"]));
    }
}
