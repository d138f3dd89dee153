//! Causal cross-referencing
//!
//! Classifiers report where a fragment's cause was stated as raw character
//! ranges; only after the merge pass settles which fragments exist can
//! those ranges be resolved to ids. A fragment `g` counts as a cause of
//! `f` when `g` ends at or before `f` starts and `g`'s span overlaps one
//! of `f`'s pending cause ranges strongly enough. The ordering constraint
//! makes forward and circular references impossible.

use crate::fragment::Fragment;
use crate::span::Span;

/// Minimum IoU (exclusive) between a pending cause range and a candidate
/// fragment's span for the reference to hold.
pub const CAUSAL_LINK_MIN_IOU: f64 = 0.2;

/// Resolve pending causal spans into `causals` id lists, in place.
///
/// Ids are deduplicated and sorted lexicographically; fragments with no
/// pending spans get an empty list.
pub fn link_causals(fragments: &mut [Fragment]) {
    let index: Vec<(String, Span)> = fragments
        .iter()
        .map(|g| (g.id.clone(), g.span()))
        .collect();

    for (i, fragment) in fragments.iter_mut().enumerate() {
        let mut causes: Vec<String> = Vec::new();
        for pending in &fragment.provenance.pending_causals {
            for (j, (id, span)) in index.iter().enumerate() {
                if j == i {
                    continue;
                }
                if span.end <= fragment.start_char && pending.iou(*span) > CAUSAL_LINK_MIN_IOU {
                    causes.push(id.clone());
                }
            }
        }
        causes.sort();
        causes.dedup();
        fragment.causals = causes;
    }
}
