//! Source document handling
//!
//! All offsets in the engine are **character** offsets, not byte offsets:
//! spans must survive round-trips through classifiers that count characters.
//! `Document` owns the text plus a char-to-byte index so slicing by
//! character range stays O(1) on the hot paths.

use std::path::Path;
use thiserror::Error;

/// Errors from loading a source document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported input format '.{0}' (plain-text formats only)")]
    UnsupportedFormat(String),
}

/// An in-memory source document addressed by character offsets.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    /// Byte offset of each character, plus a trailing sentinel at `text.len()`.
    /// `None` for pure-ASCII text where bytes and characters coincide.
    char_index: Option<Vec<usize>>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_index = if text.is_ascii() {
            None
        } else {
            let mut index: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
            index.push(text.len());
            Some(index)
        };
        Self { text, char_index }
    }

    /// Read a document from disk.
    ///
    /// `.txt`, `.md`, `.rst` and unknown extensions are treated as UTF-8
    /// text; line endings are normalized to `\n` so character offsets do
    /// not depend on the platform that produced the file. PDF input is
    /// rejected here; extraction belongs to an upstream tool.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ext == "pdf" {
            return Err(DocumentError::UnsupportedFormat(ext));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(raw.replace("\r\n", "\n").replace('\r', "\n")))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Document length in characters.
    pub fn char_len(&self) -> usize {
        match &self.char_index {
            Some(index) => index.len() - 1,
            None => self.text.len(),
        }
    }

    /// Byte offset of the character at `char_offset`.
    ///
    /// `char_offset` may equal `char_len()` (the end sentinel). Anything
    /// beyond that is a caller bug and panics.
    pub fn byte_offset(&self, char_offset: usize) -> usize {
        match &self.char_index {
            Some(index) => index[char_offset],
            None => char_offset,
        }
    }

    /// Slice by character range. Offsets must satisfy
    /// `start <= end <= char_len()`; the fragment builder validates every
    /// descriptor before slicing.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[self.byte_offset(start)..self.byte_offset(end)]
    }
}
