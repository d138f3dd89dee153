//! Fragment records
//!
//! A fragment is a contiguous character span of the source document tagged
//! with one schema. Identity is derived from content: the id hashes the
//! span, the schema wire name, and the covered text, so identical inputs
//! produce identical ids across runs and a fragment that is superseded
//! during merge changes id along with its content.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::SchemaId;
use crate::span::Span;

pub mod builder;
pub mod causal;
pub mod merge;

pub use builder::build_fragments;
pub use causal::link_causals;
pub use merge::{merge_fragments, DEFAULT_IOU_THRESHOLD};

/// Content-derived fragment id: `f_` plus 24 lowercase hex digits over
/// `(start, end, schema wire name, text)`.
pub fn fragment_id(start_char: usize, end_char: usize, schema_id: SchemaId, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{start_char}:{end_char}:{}", schema_id.as_str()).as_bytes());
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(12).map(|b| format!("{b:02x}")).collect();
    format!("f_{hex}")
}

/// Where a fragment came from. Kept for post-merge causal resolution and
/// diagnostics; never exported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    /// Zero-based index of the originating window.
    pub window_index: usize,
    /// Absolute bounds of the originating window.
    pub window_start: usize,
    pub window_end: usize,
    /// Absolute cause ranges awaiting resolution into fragment ids.
    pub pending_causals: Vec<Span>,
}

/// One schema-tagged span of the document, in absolute character offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: String,
    pub start_char: usize,
    pub end_char: usize,
    pub text: String,
    pub schema_id: SchemaId,
    pub schema_type: String,
    pub entity_refs: Vec<String>,
    pub actors: Vec<String>,
    pub acts: Vec<String>,
    /// Ids of fragments whose spans were found to state this fragment's
    /// cause. Filled by the causal linker, after merge.
    pub causals: Vec<String>,
    pub confidence: f64,
    pub rationale: String,
    /// Ids of fragments this one was found to duplicate during merge,
    /// including the superseded id when a higher-confidence duplicate
    /// replaced this fragment's content.
    pub overlaps: Vec<String>,
    pub provenance: Provenance,
}

impl Fragment {
    pub fn span(&self) -> Span {
        Span::new(self.start_char, self.end_char)
    }

    /// Export view of this fragment.
    pub fn record(&self) -> FragmentRecord {
        FragmentRecord {
            id: self.id.clone(),
            start_char: self.start_char,
            end_char: self.end_char,
            text: self.text.clone(),
            schema_id: self.schema_id,
            schema_type: self.schema_type.clone(),
            entity_refs: self.entity_refs.clone(),
            actors: self.actors.clone(),
            acts: self.acts.clone(),
            causals: self.causals.clone(),
            confidence: (self.confidence * 1000.0).round() / 1000.0,
            rationale: self.rationale.clone(),
            overlaps: self.overlaps.clone(),
        }
    }
}

/// Serialized fragment as written to `fragments.jsonl`.
///
/// Field declaration order is the wire contract: records serialize with
/// keys in exactly this sequence, and confidence is rounded to three
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentRecord {
    pub id: String,
    pub start_char: usize,
    pub end_char: usize,
    pub text: String,
    pub schema_id: SchemaId,
    pub schema_type: String,
    pub entity_refs: Vec<String>,
    pub actors: Vec<String>,
    pub acts: Vec<String>,
    pub causals: Vec<String>,
    pub confidence: f64,
    pub rationale: String,
    pub overlaps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fragment() -> Fragment {
        let text = "Ontology — a formal specification of a conceptualization.".to_string();
        Fragment {
            id: fragment_id(10, 68, SchemaId::Definition, &text),
            start_char: 10,
            end_char: 68,
            text,
            schema_id: SchemaId::Definition,
            schema_type: "Fragment".to_string(),
            entity_refs: vec!["Ontology".to_string()],
            actors: vec![],
            acts: vec![],
            causals: vec![],
            confidence: 0.8765,
            rationale: "explicit definition".to_string(),
            overlaps: vec![],
            provenance: Provenance::default(),
        }
    }

    #[test]
    fn id_is_stable_and_well_formed() {
        let a = fragment_id(10, 68, SchemaId::Definition, "some text");
        let b = fragment_id(10, 68, SchemaId::Definition, "some text");
        assert_eq!(a, b);
        assert!(a.starts_with("f_"));
        assert_eq!(a.len(), 26);
        assert!(a[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn id_depends_on_every_input() {
        let base = fragment_id(10, 68, SchemaId::Definition, "some text");
        assert_ne!(base, fragment_id(11, 68, SchemaId::Definition, "some text"));
        assert_ne!(base, fragment_id(10, 69, SchemaId::Definition, "some text"));
        assert_ne!(base, fragment_id(10, 68, SchemaId::Example, "some text"));
        assert_ne!(base, fragment_id(10, 68, SchemaId::Definition, "other text"));
    }

    #[test]
    fn record_rounds_confidence_to_three_decimals() {
        let record = sample_fragment().record();
        assert_eq!(record.confidence, 0.877);
    }

    #[test]
    fn record_serializes_fields_in_wire_order() {
        let json = serde_json::to_string(&sample_fragment().record()).unwrap();
        let expected = [
            "\"id\"",
            "\"start_char\"",
            "\"end_char\"",
            "\"text\"",
            "\"schema_id\"",
            "\"schema_type\"",
            "\"entity_refs\"",
            "\"actors\"",
            "\"acts\"",
            "\"causals\"",
            "\"confidence\"",
            "\"rationale\"",
            "\"overlaps\"",
        ];
        let mut last = 0;
        for key in expected {
            let pos = json[last..]
                .find(key)
                .unwrap_or_else(|| panic!("{key} missing or out of order"));
            last += pos + key.len();
        }
    }

    #[test]
    fn record_uses_schema_wire_name() {
        let json = serde_json::to_string(&sample_fragment().record()).unwrap();
        assert!(json.contains("\"schema_id\":\"Definition\""));

        let mut fragment = sample_fragment();
        fragment.schema_id = SchemaId::CausalRelation;
        let json = serde_json::to_string(&fragment.record()).unwrap();
        assert!(json.contains("\"schema_id\":\"Causal Relation\""));
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = sample_fragment().record();
        let json = serde_json::to_string(&record).unwrap();
        let back: FragmentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
