//! Run identity and metadata
//!
//! A run is identified by a content hash over everything that determines
//! its output: the document text, the serialized active schema list, the
//! model name, the temperature, and the token budget, hashed in that
//! sequence. Identical inputs land in the same output directory, so
//! reruns are idempotent. Window and overlap sizing intentionally stay
//! out of the key; they are recorded in metadata only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::SchemaId;

pub mod output;

/// Length of the run-key prefix used as the run directory name.
pub const RUN_DIR_KEY_CHARS: usize = 12;

/// Compute the run key: 32 lowercase hex digits.
pub fn run_key(
    document_text: &str,
    active_schemas: &[SchemaId],
    model: &str,
    temperature: f64,
    max_tokens: u32,
) -> String {
    let schemas =
        serde_json::to_string(active_schemas).expect("schema list serialization cannot fail");

    let mut hasher = Sha256::new();
    hasher.update(document_text.as_bytes());
    hasher.update(schemas.as_bytes());
    hasher.update(model.as_bytes());
    hasher.update(temperature.to_string().as_bytes());
    hasher.update(max_tokens.to_string().as_bytes());

    let digest = hasher.finalize();
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}

/// Directory a run with this key writes into.
pub fn run_dir(out_dir: &Path, key: &str) -> PathBuf {
    out_dir.join(&key[..RUN_DIR_KEY_CHARS])
}

/// File layout inside one run directory.
#[derive(Debug, Clone)]
pub struct RunPaths {
    dir: PathBuf,
}

impl RunPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fragments(&self) -> PathBuf {
        self.dir.join("fragments.jsonl")
    }

    pub fn annotated(&self) -> PathBuf {
        self.dir.join("annotated.md")
    }

    pub fn metadata(&self) -> PathBuf {
        self.dir.join("run.json")
    }

    pub fn error_log(&self) -> PathBuf {
        self.dir.join("errors.log")
    }

    pub fn call_transcript(&self) -> PathBuf {
        self.dir.join("llm_calls.jsonl")
    }
}

/// Contents of `run.json`. Field declaration order is the wire order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub input_file: String,
    pub active_schemas: Vec<SchemaId>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub window_chars: usize,
    pub overlap_chars: usize,
    pub mock: bool,
    pub fragments_count: usize,
    pub run_dir: String,
    pub run_id: String,
    /// Wall-clock completion time, epoch seconds.
    pub ts: i64,
}
