//! Classifier interface and wire types
//!
//! A [`Classifier`] sees one window at a time and returns chunk-local
//! fragment descriptors; it never sees the whole document and never
//! assigns ids or resolves overlaps. Two implementations ship:
//! [`RemoteClassifier`] calls a chat-completions endpoint, and
//! [`HeuristicClassifier`] is the deterministic offline fallback behind
//! `--mock`. Both produce the same [`ChunkClassification`] shape and feed
//! the same builder/merge path.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window::Window;

pub mod heuristic;
pub mod prompt;
pub mod remote;

pub use heuristic::HeuristicClassifier;
pub use prompt::SchemaContext;
pub use remote::RemoteClassifier;

/// Record-type string descriptors default to when the classifier omits one.
pub const SCHEMA_TYPE_FRAGMENT: &str = "Fragment";

/// Errors from one classifier call. All of these are recovered per window:
/// the window contributes no fragments and the run continues.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("cannot reach classifier endpoint at {0}")]
    Connect(String),

    #[error("classifier call failed: {0}")]
    Transport(String),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier response is not a JSON object: {0}")]
    Parse(String),
}

/// One fragment proposal, offsets relative to the chunk it came from.
///
/// Every field is optional on the wire; an absent offset deserializes to
/// `None` so the descriptor still reaches the builder, which drops it as
/// malformed and records the drop rather than guessing a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDescriptor {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub schema_id: String,
    #[serde(default = "default_schema_type")]
    pub schema_type: String,
    #[serde(default)]
    pub entity_refs: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub acts: Vec<String>,
    /// Chunk-local `[start, end]` ranges where the cause of this fragment
    /// was stated. Resolved to fragment ids after the merge pass.
    #[serde(default)]
    pub causal_spans: Vec<Vec<i64>>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub rationale: String,
}

fn default_schema_type() -> String {
    SCHEMA_TYPE_FRAGMENT.to_string()
}

impl FragmentDescriptor {
    pub fn new(start: i64, end: i64, schema_id: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            schema_id: schema_id.into(),
            schema_type: default_schema_type(),
            entity_refs: Vec::new(),
            actors: Vec::new(),
            acts: Vec::new(),
            causal_spans: Vec::new(),
            confidence: 0.0,
            rationale: String::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_entity_refs(mut self, entity_refs: Vec<String>) -> Self {
        self.entity_refs = entity_refs;
        self
    }

    pub fn with_causal_span(mut self, start: i64, end: i64) -> Self {
        self.causal_spans.push(vec![start, end]);
        self
    }
}

/// A lower-probability alternative reading of some chunk range. Parsed and
/// carried for future use; nothing downstream materializes these today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub schema_id: String,
    #[serde(default)]
    pub prob: f64,
}

/// Everything a classifier reported for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkClassification {
    pub fragments: Vec<FragmentDescriptor>,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Default, Deserialize)]
struct RawClassification {
    #[serde(default)]
    fragments: Vec<serde_json::Value>,
    #[serde(default)]
    alternatives: Vec<serde_json::Value>,
}

impl ChunkClassification {
    /// Parse classifier output text into the wire shape.
    ///
    /// Accepts a bare JSON object, a fenced ```json block, or prose
    /// containing one object. List entries that do not deserialize are
    /// skipped; a missing list is empty. Returns `None` when no JSON
    /// object can be recovered at all.
    pub fn parse(text: &str) -> Option<Self> {
        let value = extract_json(text)?;
        let raw: RawClassification = serde_json::from_value(value).ok()?;

        let fragments = raw
            .fragments
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<FragmentDescriptor>(item) {
                Ok(descriptor) => Some(descriptor),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping undeserializable fragment entry");
                    None
                }
            })
            .collect();

        let alternatives = raw
            .alternatives
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Alternative>(item).ok())
            .collect();

        Some(Self {
            fragments,
            alternatives,
        })
    }
}

/// Extract a JSON object from possibly-wrapped model output.
///
/// Tries three strategies in order:
/// 1. Direct parse of the trimmed text
/// 2. Content of a ```json (or bare ```) fenced block
/// 3. Substring from the first `{` to the last `}`
fn extract_json(response: &str) -> Option<serde_json::Value> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(content[..end].trim()) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    let first = trimmed.find('{')?;
    let last = trimmed.rfind('}')?;
    if first < last {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&trimmed[first..=last]) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    None
}

/// A window classifier.
///
/// Implementations must be safe to call once per window, sequentially, in
/// document order. Offsets in the returned descriptors are relative to
/// `window.text`.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Variant name for logs and run metadata.
    fn name(&self) -> &str;

    /// Receive the run directory before the first window is classified.
    /// Variants that keep a per-call transcript open it here; the default
    /// does nothing.
    fn begin_run(&self, _run_dir: &Path) {}

    async fn classify(
        &self,
        context: &SchemaContext,
        window: &Window<'_>,
    ) -> Result<ChunkClassification, ClassifierError>;
}

/// Test classifier driven by a fixed per-window script.
#[derive(Debug, Default)]
pub struct MockClassifier {
    responses: HashMap<usize, ChunkClassification>,
    failures: HashSet<usize>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for the window at `window_index`. Unscripted
    /// windows classify to an empty result.
    pub fn with_response(mut self, window_index: usize, classification: ChunkClassification) -> Self {
        self.responses.insert(window_index, classification);
        self
    }

    /// Script a transport failure for the window at `window_index`.
    pub fn with_failure(mut self, window_index: usize) -> Self {
        self.failures.insert(window_index);
        self
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn classify(
        &self,
        _context: &SchemaContext,
        window: &Window<'_>,
    ) -> Result<ChunkClassification, ClassifierError> {
        if self.failures.contains(&window.index) {
            return Err(ClassifierError::Transport(format!(
                "scripted failure for window {}",
                window.index
            )));
        }
        Ok(self.responses.get(&window.index).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::schema::SchemaId;
    use crate::window::plan_windows;

    #[test]
    fn parses_bare_json_object() {
        let parsed = ChunkClassification::parse(
            r#"{"fragments": [{"start": 0, "end": 12, "schema_id": "Definition", "confidence": 0.8}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.fragments.len(), 1);
        assert_eq!(parsed.fragments[0].schema_id, "Definition");
        assert_eq!(parsed.fragments[0].schema_type, "Fragment");
        assert!(parsed.alternatives.is_empty());
    }

    #[test]
    fn parses_fenced_json_block() {
        let response = "Here is the annotation:\n```json\n{\"fragments\": [{\"start\": 3, \"end\": 9, \"schema_id\": \"Example\"}]}\n```\nDone.";
        let parsed = ChunkClassification::parse(response).unwrap();
        assert_eq!(parsed.fragments.len(), 1);
        assert_eq!(parsed.fragments[0].start, Some(3));
    }

    #[test]
    fn parses_embedded_object_without_fence() {
        let response = "Sure! {\"fragments\": [], \"alternatives\": [{\"start\": 1, \"end\": 4, \"schema_id\": \"Principle\", \"prob\": 0.3}]} hope that helps";
        let parsed = ChunkClassification::parse(response).unwrap();
        assert!(parsed.fragments.is_empty());
        assert_eq!(parsed.alternatives.len(), 1);
        assert_eq!(parsed.alternatives[0].prob, 0.3);
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(ChunkClassification::parse("[1, 2, 3]").is_none());
        assert!(ChunkClassification::parse("not json at all").is_none());
        assert!(ChunkClassification::parse("").is_none());
    }

    #[test]
    fn skips_undeserializable_entries_keeps_rest() {
        let parsed = ChunkClassification::parse(
            r#"{"fragments": [{"start": "three", "end": 9}, {"start": 10, "end": 20, "schema_id": "Algorithm"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.fragments.len(), 1);
        assert_eq!(parsed.fragments[0].schema_id, "Algorithm");
    }

    #[test]
    fn missing_offsets_parse_as_none() {
        let parsed = ChunkClassification::parse(
            r#"{"fragments": [{"schema_id": "Definition"}, {"end": 5, "schema_id": "Definition"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.fragments[0].start, None);
        assert_eq!(parsed.fragments[0].end, None);
        assert_eq!(parsed.fragments[1].start, None);
        assert_eq!(parsed.fragments[1].end, Some(5));
    }

    #[tokio::test]
    async fn mock_replays_scripted_response() {
        let document = Document::new("alpha beta gamma");
        let windows = plan_windows(&document, 100, 0).unwrap();
        let context = SchemaContext::new(&[SchemaId::Definition]);

        let classifier = MockClassifier::new().with_response(
            0,
            ChunkClassification {
                fragments: vec![FragmentDescriptor::new(0, 5, "Definition").with_confidence(0.7)],
                alternatives: vec![],
            },
        );

        let result = classifier.classify(&context, &windows[0]).await.unwrap();
        assert_eq!(result.fragments.len(), 1);
        assert_eq!(result.fragments[0].confidence, 0.7);
    }

    #[tokio::test]
    async fn mock_scripted_failure_is_transport_error() {
        let document = Document::new("alpha beta gamma");
        let windows = plan_windows(&document, 100, 0).unwrap();
        let context = SchemaContext::new(&[SchemaId::Definition]);

        let classifier = MockClassifier::new().with_failure(0);
        let err = classifier.classify(&context, &windows[0]).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Transport(_)));
    }

    #[tokio::test]
    async fn mock_unscripted_window_is_empty() {
        let document = Document::new("alpha beta gamma");
        let windows = plan_windows(&document, 100, 0).unwrap();
        let context = SchemaContext::new(&[SchemaId::Definition]);

        let result = MockClassifier::new()
            .classify(&context, &windows[0])
            .await
            .unwrap();
        assert!(result.fragments.is_empty());
    }
}
