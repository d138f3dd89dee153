//! Window planning
//!
//! Splits a document into overlapping, fixed-width windows for per-window
//! classification. Parameters are validated before the first window is
//! produced; a violated constraint never yields a partial plan.

use crate::document::Document;
use thiserror::Error;

/// Invalid windowing parameters.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window_chars must be > 0")]
    ZeroWindow,

    #[error("0 <= overlap_chars < window_chars required (got overlap {overlap}, window {window})")]
    OverlapTooLarge { overlap: usize, window: usize },
}

/// One classifier-sized slice of the document.
///
/// Transient: windows scope a single classifier call and translate the
/// call's chunk-local offsets back to absolute ones. They are never
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct Window<'d> {
    /// Position of this window in the scan, starting at 0.
    pub index: usize,
    /// Absolute character offset of the first character.
    pub start: usize,
    /// Absolute character offset one past the last character.
    pub end: usize,
    /// The document slice covered by `[start, end)`.
    pub text: &'d str,
}

impl Window<'_> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Plan the full window sequence for `document`.
///
/// Each window after the first starts `window_chars - overlap_chars` after
/// the previous one; the final window is clipped so its `end` equals the
/// document length. An empty document yields no windows.
pub fn plan_windows<'d>(
    document: &'d Document,
    window_chars: usize,
    overlap_chars: usize,
) -> Result<Vec<Window<'d>>, WindowError> {
    if window_chars == 0 {
        return Err(WindowError::ZeroWindow);
    }
    if overlap_chars >= window_chars {
        return Err(WindowError::OverlapTooLarge {
            overlap: overlap_chars,
            window: window_chars,
        });
    }

    let n = document.char_len();
    let mut windows = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while start < n {
        let end = n.min(start + window_chars);
        windows.push(Window {
            index,
            start,
            end,
            text: document.slice(start, end),
        });
        if end == n {
            break;
        }
        start = end - overlap_chars;
        index += 1;
    }
    Ok(windows)
}
