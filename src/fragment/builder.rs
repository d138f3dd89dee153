//! Descriptor validation and fragment construction
//!
//! Converts chunk-local classifier descriptors into absolute-offset
//! fragments. The document text is authoritative: a fragment's `text` is
//! always re-sliced from the source at its validated span, never taken
//! from classifier output. Descriptors with missing offsets, invalid
//! spans or unknown schemas are dropped one at a time, logged, and
//! recorded in the error collector; one bad descriptor never discards
//! its window.

use crate::classify::ChunkClassification;
use crate::document::Document;
use crate::error::ErrorCollector;
use crate::fragment::{fragment_id, Fragment, Provenance};
use crate::schema::SchemaId;
use crate::span::Span;
use crate::window::Window;

/// Longest rationale kept on a fragment, in characters.
pub const MAX_RATIONALE_CHARS: usize = 300;

/// Build absolute-offset fragments from one window's classification.
pub fn build_fragments(
    classification: &ChunkClassification,
    window: &Window<'_>,
    document: &Document,
    errors: &mut ErrorCollector,
) -> Vec<Fragment> {
    let doc_len = document.char_len() as i64;
    let base = window.start as i64;
    let mut fragments = Vec::new();

    for descriptor in &classification.fragments {
        let (Some(local_start), Some(local_end)) = (descriptor.start, descriptor.end) else {
            let message = "descriptor dropped: missing start/end offsets".to_string();
            tracing::warn!(window = window.index, "{message}");
            errors.record(window.index, window.start, message);
            continue;
        };
        let abs_start = base + local_start;
        let abs_end = base + local_end;

        if abs_start < 0 || abs_end > doc_len || abs_end <= abs_start {
            let message = format!(
                "descriptor dropped: invalid span [{abs_start}, {abs_end}) for document length {doc_len}"
            );
            tracing::warn!(window = window.index, "{message}");
            errors.record(window.index, window.start, message);
            continue;
        }

        let schema_id = match SchemaId::parse(&descriptor.schema_id) {
            Some(schema) => schema,
            None => {
                let message = format!(
                    "descriptor dropped: unknown schema '{}'",
                    descriptor.schema_id
                );
                tracing::warn!(window = window.index, "{message}");
                errors.record(window.index, window.start, message);
                continue;
            }
        };

        let start_char = abs_start as usize;
        let end_char = abs_end as usize;
        let text = document.slice(start_char, end_char).to_string();

        let pending_causals = translate_causal_spans(descriptor, base, doc_len, window.index);

        fragments.push(Fragment {
            id: fragment_id(start_char, end_char, schema_id, &text),
            start_char,
            end_char,
            text,
            schema_id,
            schema_type: descriptor.schema_type.clone(),
            entity_refs: descriptor.entity_refs.clone(),
            actors: descriptor.actors.clone(),
            acts: descriptor.acts.clone(),
            causals: Vec::new(),
            confidence: descriptor.confidence.clamp(0.0, 1.0),
            rationale: descriptor.rationale.chars().take(MAX_RATIONALE_CHARS).collect(),
            overlaps: Vec::new(),
            provenance: Provenance {
                window_index: window.index,
                window_start: window.start,
                window_end: window.end,
                pending_causals,
            },
        });
    }

    fragments
}

/// Translate chunk-local causal spans to absolute offsets, dropping empty
/// spans, spans outside the document, and entries too short to be a pair.
fn translate_causal_spans(
    descriptor: &crate::classify::FragmentDescriptor,
    base: i64,
    doc_len: i64,
    window_index: usize,
) -> Vec<Span> {
    let mut spans = Vec::new();
    for entry in &descriptor.causal_spans {
        let (local_start, local_end) = match entry.as_slice() {
            [start, end, ..] => (*start, *end),
            _ => {
                tracing::debug!(window = window_index, "causal span entry too short, skipped");
                continue;
            }
        };
        let abs_start = base + local_start;
        let abs_end = base + local_end;
        if abs_start < 0 || abs_end > doc_len || abs_end <= abs_start {
            tracing::debug!(
                window = window_index,
                "causal span [{abs_start}, {abs_end}) invalid, skipped"
            );
            continue;
        }
        spans.push(Span::new(abs_start as usize, abs_end as usize));
    }
    spans
}
