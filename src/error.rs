//! Error taxonomy and the per-run error collector
//!
//! Failures fall into two tiers. Fatal ones (bad run parameters, an
//! unreadable source, a failed output write) abort the run and surface as
//! [`LaminaError`]. Recoverable ones (a classifier call that failed for one
//! window, a malformed descriptor) are recorded in the [`ErrorCollector`]
//! and the run continues; the collector is written to `errors.log` at the
//! end so a completed run still enumerates everything it skipped.

use thiserror::Error;

use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::run::output::OutputError;
use crate::window::WindowError;

/// Fatal errors surfaced at the crate seam.
#[derive(Debug, Error)]
pub enum LaminaError {
    /// Invalid run parameters. Raised before any window is classified.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Reading the source document or preparing the run directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing one of the run output files failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl LaminaError {
    /// Process exit code for the CLI: configuration failures exit 1,
    /// I/O and output failures exit 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaminaError::Configuration(_) => 1,
            LaminaError::Io(_) | LaminaError::Output(_) => 2,
        }
    }
}

impl From<WindowError> for LaminaError {
    fn from(err: WindowError) -> Self {
        LaminaError::Configuration(err.to_string())
    }
}

impl From<ConfigError> for LaminaError {
    fn from(err: ConfigError) -> Self {
        LaminaError::Configuration(err.to_string())
    }
}

impl From<DocumentError> for LaminaError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Io(io) => LaminaError::Io(io),
            DocumentError::UnsupportedFormat(_) => LaminaError::Configuration(err.to_string()),
        }
    }
}

/// One recovered failure, pinned to the window it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedError {
    /// Zero-based index of the window being processed.
    pub window_index: usize,
    /// Absolute character offset of that window's start.
    pub window_offset: usize,
    pub message: String,
}

impl CollectedError {
    /// Render as one `errors.log` line.
    pub fn to_line(&self) -> String {
        format!(
            "[window {} offset {}] {}",
            self.window_index, self.window_offset, self.message
        )
    }
}

/// Collector for errors a run recovers from instead of aborting.
///
/// Threaded through the pipeline as an explicit value; a completed run
/// always emits whatever fragments survived plus this list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorCollector {
    entries: Vec<CollectedError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, window_index: usize, window_offset: usize, message: impl Into<String>) {
        self.entries.push(CollectedError {
            window_index,
            window_offset,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[CollectedError] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
