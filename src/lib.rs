//! Lamina: Semantic Document Fragmentation Engine
//!
//! Splits a document into overlapping windows, classifies each window into
//! typed fragments against a schema registry, then merges duplicate spans
//! across windows and links causal references. Runs are idempotent:
//! identical input and settings produce the same run directory, fragment
//! ids and outputs.
//!
//! # Core Concepts
//!
//! - **Windows**: bounded, overlapping character ranges sent to a classifier
//! - **Fragments**: classified spans with schema tag, confidence and cross-references
//! - **Runs**: content-addressed output directories derived from input + settings
//!
//! # Example
//!
//! ```
//! use lamina::Span;
//!
//! let a = Span::new(10, 50);
//! let b = Span::new(15, 55);
//! assert!(a.iou(b) > 0.66);
//! ```

pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod fragment;
pub mod pipeline;
pub mod run;
pub mod schema;
pub mod span;
pub mod window;

pub use classify::{
    ChunkClassification, Classifier, ClassifierError, FragmentDescriptor, HeuristicClassifier,
    MockClassifier, RemoteClassifier, SchemaContext,
};
pub use config::{default_config_path, ConfigError, ConfigFile, Settings};
pub use document::{Document, DocumentError};
pub use error::{CollectedError, ErrorCollector, LaminaError};
pub use fragment::{
    build_fragments, fragment_id, link_causals, merge_fragments, Fragment, FragmentRecord,
    DEFAULT_IOU_THRESHOLD,
};
pub use pipeline::{Pipeline, RunOutcome};
pub use run::output::{annotate_document, write_outputs, OutputError};
pub use run::{run_dir, run_key, RunMeta, RunPaths};
pub use schema::{parse_active_set, SchemaId};
pub use span::Span;
pub use window::{plan_windows, Window, WindowError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
