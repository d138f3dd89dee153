//! Prompt assembly for the remote classifier
//!
//! The system prompt is fixed for a run: segmentation ground rules, the
//! active schema roster with one-line extraction instructions, and the
//! response JSON shape. The user prompt carries one chunk plus its
//! absolute base offset so the model knows its coordinates are local.

use crate::schema::SchemaId;

const GROUND_RULES: &str = "\
You perform SEMANTIC segmentation of technical text into typed fragments.
Rules:
- Only emit fragments that instantiate one of the schemas listed below.
- Headings and list markers are hints; boundaries follow meaning, not markup.
- A fragment must be minimally sufficient to instantiate its schema.
- When a reading is ambiguous, put the weaker readings in \"alternatives\".
- Respond with JSON ONLY. No commentary outside the JSON.";

const RESPONSE_SHAPE: &str = r#"Response JSON shape:
{
  "fragments": [
    {
      "start": 0,
      "end": 0,
      "schema_id": "<one of the schemas above>",
      "schema_type": "Fragment",
      "entity_refs": ["..."],
      "actors": ["..."],
      "acts": ["..."],
      "causal_spans": [[0, 0]],
      "confidence": 0.0,
      "rationale": "<= 300 chars"
    }
  ],
  "alternatives": [
    {"start": 0, "end": 0, "schema_id": "...", "prob": 0.0}
  ]
}
"start"/"end" and "causal_spans" are character offsets relative to THIS chunk,
half-open. "causal_spans" marks where the cause of the fragment is stated."#;

/// Active schema set plus the system prompt rendered from it, built once
/// per run and shared across windows.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    active: Vec<SchemaId>,
    system_prompt: String,
}

impl SchemaContext {
    pub fn new(active: &[SchemaId]) -> Self {
        Self {
            active: active.to_vec(),
            system_prompt: build_system_prompt(active),
        }
    }

    pub fn active(&self) -> &[SchemaId] {
        &self.active
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

fn build_system_prompt(active: &[SchemaId]) -> String {
    let mut prompt = String::from(GROUND_RULES);
    prompt.push_str("\n\nAvailable schemas:\n");
    for schema in active {
        prompt.push_str(&format!(
            "* {} ({}): {}\n",
            schema.as_str(),
            schema.display_name(),
            schema.instruction()
        ));
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}

/// Render the per-window user prompt.
///
/// `offset` is the chunk's absolute start in the document; it is stated in
/// the preamble so transcripts stay interpretable, but the model is asked
/// for chunk-local coordinates.
pub fn build_user_prompt(chunk_text: &str, offset: usize) -> String {
    format!(
        "Annotate the following chunk. Offsets in your answer are relative to \
this chunk; its absolute base offset in the document is {offset}.\n\
Return JSON strictly matching the shape above.\n\
```\n{chunk_text}\n```"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_only_active_schemas() {
        let context = SchemaContext::new(&[SchemaId::Definition, SchemaId::CausalRelation]);
        let prompt = context.system_prompt();

        assert!(prompt.contains("* Definition"));
        assert!(prompt.contains("* Causal Relation"));
        assert!(!prompt.contains("* Table Analysis"));
        assert!(prompt.contains("Response JSON shape"));
    }

    #[test]
    fn system_prompt_carries_extraction_instructions() {
        let context = SchemaContext::new(&[SchemaId::CodeSnippet]);
        assert!(context
            .system_prompt()
            .contains(SchemaId::CodeSnippet.instruction()));
    }

    #[test]
    fn user_prompt_embeds_offset_and_chunk() {
        let prompt = build_user_prompt("Ontology — a formal model.", 5400);
        assert!(prompt.contains("base offset in the document is 5400"));
        assert!(prompt.contains("Ontology — a formal model."));
        assert!(prompt.starts_with("Annotate the following chunk."));
    }

    #[test]
    fn full_registry_renders_every_wire_name() {
        let context = SchemaContext::new(&SchemaId::ALL);
        for schema in SchemaId::ALL {
            assert!(context.system_prompt().contains(schema.as_str()));
        }
    }
}
