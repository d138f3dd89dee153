//! Run output files
//!
//! Everything a run leaves behind is written here, once, after the merge
//! barrier: the fragment stream, an annotated copy of the source, run
//! metadata, and the error log when anything was recovered. Annotation
//! markers are HTML comments, so the annotated copy renders like the
//! original; stripping the markers restores the source byte for byte.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::Document;
use crate::error::ErrorCollector;
use crate::fragment::Fragment;
use crate::run::{RunMeta, RunPaths};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write all output files for a completed run.
pub fn write_outputs(
    paths: &RunPaths,
    document: &Document,
    fragments: &[Fragment],
    meta: &RunMeta,
    errors: &ErrorCollector,
) -> Result<(), OutputError> {
    write_file(&paths.fragments(), &render_fragments(fragments)?)?;
    write_file(&paths.annotated(), &annotate_document(document, fragments))?;

    let mut meta_json = serde_json::to_string_pretty(meta)?;
    meta_json.push('\n');
    write_file(&paths.metadata(), &meta_json)?;

    if !errors.is_empty() {
        write_file(&paths.error_log(), &render_error_log(errors))?;
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), OutputError> {
    fs::write(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn render_fragments(fragments: &[Fragment]) -> Result<String, OutputError> {
    let mut out = String::new();
    for fragment in fragments {
        out.push_str(&serde_json::to_string(&fragment.record())?);
        out.push('\n');
    }
    Ok(out)
}

fn render_error_log(errors: &ErrorCollector) -> String {
    let mut out = String::new();
    for entry in errors.entries() {
        out.push_str(&entry.to_line());
        out.push('\n');
    }
    out
}

/// Produce the annotated copy of the document.
///
/// Each fragment contributes a start and an end marker at its character
/// bounds. Markers are inserted in descending `(position, is_start)` order,
/// end before start at equal positions, so earlier insertions never shift
/// the offsets of later ones and a start marker lands before the end
/// marker it meets.
pub fn annotate_document(document: &Document, fragments: &[Fragment]) -> String {
    let mut markers: Vec<(usize, u8, String)> = Vec::with_capacity(fragments.len() * 2);
    for fragment in fragments {
        markers.push((
            fragment.start_char,
            0,
            format!(
                "<!-- FRAG id={} schema={} conf={:.2} start={} end={} -->",
                fragment.id,
                fragment.schema_id,
                fragment.confidence,
                fragment.start_char,
                fragment.end_char
            ),
        ));
        markers.push((
            fragment.end_char,
            1,
            format!("<!-- /FRAG id={} -->", fragment.id),
        ));
    }

    markers.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

    let mut annotated = document.text().to_string();
    for (position, _, tag) in markers {
        annotated.insert_str(document.byte_offset(position), &tag);
    }
    annotated
}
