//! Merge/dedup engine
//!
//! Overlapping windows report the same content twice; this pass reconciles
//! the stream into one fragment per distinct piece of content. Two
//! fragments of the same schema are duplicates when their spans'
//! intersection-over-union reaches the threshold; the higher-confidence
//! one wins. The output holds no same-schema pair at or above the
//! threshold and is sorted by span, which makes the pass idempotent:
//! merging merged output changes nothing.

use std::collections::HashSet;

use crate::fragment::Fragment;

/// IoU at or above which two same-schema fragments are duplicates.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.66;

/// Deduplicate a fragment stream.
///
/// Candidates are processed in `(start_char, end_char)` order against an
/// accepted list; the first sufficiently-overlapping accepted fragment of
/// the same schema absorbs the candidate. A candidate with strictly higher
/// confidence supersedes the accepted fragment's content and id; the
/// superseded id is recorded in `overlaps`, as is the absorbed candidate's
/// id in the keep case. Equal confidence keeps the earlier-accepted
/// fragment.
pub fn merge_fragments(mut fragments: Vec<Fragment>, iou_threshold: f64) -> Vec<Fragment> {
    fragments.sort_by_key(|f| (f.start_char, f.end_char));

    let mut accepted: Vec<Fragment> = Vec::with_capacity(fragments.len());
    'candidates: for fragment in fragments {
        for i in 0..accepted.len() {
            if accepted[i].schema_id == fragment.schema_id
                && accepted[i].span().iou(fragment.span()) >= iou_threshold
            {
                let moved = absorb(&mut accepted[i], fragment);
                if moved {
                    restore_accept_invariant(&mut accepted, i, iou_threshold);
                }
                continue 'candidates;
            }
        }
        accepted.push(fragment);
    }

    for fragment in &mut accepted {
        let own_id = fragment.id.clone();
        let mut seen = HashSet::new();
        fragment
            .overlaps
            .retain(|id| *id != own_id && seen.insert(id.clone()));
    }

    accepted.sort_by_key(|f| (f.start_char, f.end_char));
    accepted
}

/// Fold a duplicate into its accepted counterpart. Returns true when the
/// accepted fragment's span changed (a supersede), which can put it at or
/// above the threshold against another accepted fragment.
fn absorb(kept: &mut Fragment, mut duplicate: Fragment) -> bool {
    let accumulated = std::mem::take(&mut duplicate.overlaps);
    let moved;

    if duplicate.confidence > kept.confidence {
        moved = kept.start_char != duplicate.start_char || kept.end_char != duplicate.end_char;
        let superseded = std::mem::replace(&mut kept.id, duplicate.id);
        kept.start_char = duplicate.start_char;
        kept.end_char = duplicate.end_char;
        kept.text = duplicate.text;
        if !duplicate.entity_refs.is_empty() {
            kept.entity_refs = duplicate.entity_refs;
        }
        if !duplicate.actors.is_empty() {
            kept.actors = duplicate.actors;
        }
        if !duplicate.acts.is_empty() {
            kept.acts = duplicate.acts;
        }
        kept.confidence = duplicate.confidence;
        if !duplicate.rationale.is_empty() {
            kept.rationale = duplicate.rationale;
        }
        kept.overlaps.push(superseded);
    } else {
        moved = false;
        kept.overlaps.push(duplicate.id);
    }

    kept.overlaps.extend(accumulated);
    moved
}

/// Re-establish the no-duplicates-among-accepted invariant around index
/// `start_at` after a supersede moved its span. Later-accepted conflicts
/// fold into the earlier-accepted fragment under the same confidence rule.
fn restore_accept_invariant(accepted: &mut Vec<Fragment>, start_at: usize, iou_threshold: f64) {
    let mut i = start_at;
    loop {
        let conflict = (0..accepted.len()).find(|&j| {
            j != i
                && accepted[j].schema_id == accepted[i].schema_id
                && accepted[j].span().iou(accepted[i].span()) >= iou_threshold
        });
        let Some(j) = conflict else { return };

        let (keep_idx, fold_idx) = if i < j { (i, j) } else { (j, i) };
        let folded = accepted.remove(fold_idx);
        absorb(&mut accepted[keep_idx], folded);
        i = keep_idx;
    }
}
