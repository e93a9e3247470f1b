// Test doubles for the ingest pipeline.
//
// One per seam:
// - MockStore (GraphStore): records statements, echoes $postId
// - MockExtractor (FactExtractor): text-keyed canned results, failures, panics
// - ScriptedChatModel (ChatModel): one canned reply or error
// - RecordingSleeper (Sleeper): records pauses instead of waiting

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_client::ChatModel;
use anyhow::{bail, Result};
use async_trait::async_trait;

use factgraph_common::Sleeper;
use factgraph_graph::{GraphStore, GraphValue, Record, Statement, StoreError};

use crate::extractor::{Extraction, FactExtractor};

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory statement sink. Writes answer with one `postId` record echoing
/// the `$postId` parameter; reads answer with the queued records.
#[derive(Default)]
pub struct MockStore {
    writes: Mutex<Vec<Statement>>,
    reads: Mutex<Vec<Statement>>,
    read_records: Vec<Record>,
    fail_with: Option<StoreError>,
    unconfirmed: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement fails with `err`.
    pub fn failing(mut self, err: StoreError) -> Self {
        self.fail_with = Some(err);
        self
    }

    /// Writes succeed but return no records.
    pub fn without_confirmation(mut self) -> Self {
        self.unconfirmed = true;
        self
    }

    pub fn with_read_records(mut self, records: Vec<Record>) -> Self {
        self.read_records = records;
        self
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    pub fn last_write(&self) -> Option<Statement> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GraphStore for MockStore {
    async fn run_write(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        let post_id = statement.params.get("postId").and_then(GraphValue::as_str).map(str::to_string);
        self.writes.lock().unwrap().push(statement);
        match post_id {
            Some(id) if !self.unconfirmed => Ok(vec![Record::from_iter([("postId", id)])]),
            _ => Ok(vec![]),
        }
    }

    async fn run_read(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        self.reads.lock().unwrap().push(statement);
        Ok(self.read_records.clone())
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Text-keyed extractor. Unregistered texts get an empty [`Extraction`].
/// Clones share the call counter.
#[derive(Clone, Default)]
pub struct MockExtractor {
    results: HashMap<String, Extraction>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    calls: Arc<AtomicUsize>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_text(mut self, text: &str, extraction: Extraction) -> Self {
        self.results.insert(text.to_string(), extraction);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn panicking_on(mut self, text: &str) -> Self {
        self.panicking.insert(text.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FactExtractor for MockExtractor {
    async fn extract(&self, text: &str) -> Result<Extraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panicking.contains(text) {
            panic!("MockExtractor: scripted panic for {text:?}");
        }
        if self.failing.contains(text) {
            bail!("MockExtractor: scripted failure for {text:?}");
        }
        Ok(self.results.get(text).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// ScriptedChatModel
// ---------------------------------------------------------------------------

/// Answers every prompt with the same reply (or error) and remembers the
/// last prompt it saw.
#[derive(Clone)]
pub struct ScriptedChatModel {
    reply: std::result::Result<String, String>,
    last_prompt: Arc<Mutex<Option<(String, String)>>>,
}

impl ScriptedChatModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            last_prompt: Arc::default(),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            last_prompt: Arc::default(),
        }
    }

    /// `(system, user)` of the most recent call.
    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        *self.last_prompt.lock().unwrap() = Some((system.to_string(), user.to_string()));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => bail!("{e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
