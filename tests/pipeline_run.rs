//! End-to-end runs over scripted and heuristic classifiers
//!
//! Exercises the full pipeline surface: window planning, classification,
//! cross-window merge, causal resolution and the files a run leaves
//! behind.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{classification, descriptor, read_jsonl, settings};
use lamina::{
    fragment_id, Document, FragmentDescriptor, HeuristicClassifier, MockClassifier, Pipeline,
    SchemaId,
};

#[tokio::test]
async fn overlapping_windows_merge_into_the_higher_confidence_fragment() {
    let dir = tempfile::tempdir().unwrap();
    let text = "0123456789abcdefghij0123456789abcdefghij";
    let document = Document::new(text);

    // windows [0,20) and [15,35) both see the region around char 15;
    // their spans [14,20) and [15,20) overlap with IoU 5/6
    let classifier = MockClassifier::new()
        .with_response(
            0,
            classification(vec![descriptor(14, 20, "Definition", 0.6)]),
        )
        .with_response(
            1,
            classification(vec![descriptor(0, 5, "Definition", 0.8)]),
        );

    let pipeline = Pipeline::new(settings(dir.path(), 20, 5), Arc::new(classifier));
    let outcome = pipeline
        .run(Path::new("input.md"), &document)
        .await
        .unwrap();
    assert_eq!(outcome.fragments, 1);

    let records = read_jsonl(&outcome.run_dir.join("fragments.jsonl"));
    assert_eq!(records.len(), 1);
    let winner = &records[0];
    let winner_id = fragment_id(15, 20, SchemaId::Definition, &text[15..20]);
    let loser_id = fragment_id(14, 20, SchemaId::Definition, &text[14..20]);
    assert_eq!(winner["id"], serde_json::json!(winner_id));
    assert_eq!(winner["start_char"], 15);
    assert_eq!(winner["end_char"], 20);
    assert_eq!(winner["confidence"], 0.8);
    assert_eq!(winner["text"], serde_json::json!("fghij"));
    assert_eq!(winner["overlaps"], serde_json::json!([loser_id]));
}

#[tokio::test]
async fn causal_spans_resolve_to_earlier_fragment_ids() {
    let dir = tempfile::tempdir().unwrap();
    let text = "0123456789abcdefghij0123456789abcdefghij";
    let document = Document::new(text);

    let cause = descriptor(0, 10, "Definition", 0.9);
    let effect = descriptor(20, 30, "Causal Relation", 0.8).with_causal_span(0, 10);
    let classifier =
        MockClassifier::new().with_response(0, classification(vec![cause, effect]));

    let pipeline = Pipeline::new(settings(dir.path(), 100, 10), Arc::new(classifier));
    let outcome = pipeline
        .run(Path::new("input.md"), &document)
        .await
        .unwrap();
    assert_eq!(outcome.fragments, 2);

    let records = read_jsonl(&outcome.run_dir.join("fragments.jsonl"));
    let cause_id = fragment_id(0, 10, SchemaId::Definition, &text[0..10]);
    let effect_record = records
        .iter()
        .find(|r| r["schema_id"] == serde_json::json!("Causal Relation"))
        .expect("causal fragment present");
    assert_eq!(effect_record["causals"], serde_json::json!([cause_id]));

    let cause_record = records
        .iter()
        .find(|r| r["id"] == serde_json::json!(cause_id))
        .expect("cause fragment present");
    assert_eq!(cause_record["causals"], serde_json::json!([]));
}

#[tokio::test]
async fn scripted_failures_surface_in_the_error_log_only() {
    let dir = tempfile::tempdir().unwrap();
    let document = Document::new("0123456789abcdefghij0123456789abcdefghij");
    let classifier = MockClassifier::new()
        .with_response(
            0,
            classification(vec![descriptor(0, 10, "Example", 0.7)]),
        )
        .with_failure(2);

    let pipeline = Pipeline::new(settings(dir.path(), 20, 5), Arc::new(classifier));
    let outcome = pipeline
        .run(Path::new("input.md"), &document)
        .await
        .unwrap();

    assert_eq!(outcome.fragments, 1);
    assert_eq!(outcome.recovered_errors, 1);
    let log = std::fs::read_to_string(outcome.run_dir.join("errors.log")).unwrap();
    assert!(log.contains("[window 2 offset 30] classifier call failed"));

    // the surviving fragment is untouched by the failure
    let records = read_jsonl(&outcome.run_dir.join("fragments.jsonl"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["schema_id"], serde_json::json!("Example"));
}

#[tokio::test]
async fn heuristic_mock_run_fragments_real_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let document = Document::new(
        "# Обзор\n\nПлексус — движок серии событий\n\n- первый пункт списка\n- второй пункт списка\n\n```rust\nlet answer = 42;\n```\n",
    );

    let pipeline = Pipeline::new(
        settings(dir.path(), 6000, 600),
        Arc::new(HeuristicClassifier::new()),
    );
    let outcome = pipeline
        .run(Path::new("doc.md"), &document)
        .await
        .unwrap();
    assert!(outcome.fragments >= 3);

    let records = read_jsonl(&outcome.run_dir.join("fragments.jsonl"));
    let schemas: Vec<&str> = records
        .iter()
        .filter_map(|r| r["schema_id"].as_str())
        .collect();
    assert!(schemas.contains(&"Code Snippet"));
    assert!(schemas.contains(&"Enumeration"));
    assert!(schemas.contains(&"Definition"));

    for record in &records {
        let id = record["id"].as_str().unwrap();
        assert!(id.starts_with("f_"));
        assert_eq!(id.len(), 26);
        assert!(id[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        // spans index characters, so they stay within the char length
        let end = record["end_char"].as_i64().unwrap();
        assert!(end <= document.char_len() as i64);
    }
}

#[tokio::test]
async fn descriptor_without_offsets_is_rejected_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let document = Document::new("0123456789abcdefghij0123456789abcdefghij");

    // a missing start in window 1 (base 15) must not be read as a
    // position inside the window
    let broken = FragmentDescriptor {
        start: None,
        ..descriptor(0, 5, "Definition", 0.9)
    };
    let classifier = MockClassifier::new().with_response(1, classification(vec![broken]));

    let pipeline = Pipeline::new(settings(dir.path(), 20, 5), Arc::new(classifier));
    let outcome = pipeline
        .run(Path::new("input.md"), &document)
        .await
        .unwrap();

    assert_eq!(outcome.fragments, 0);
    assert_eq!(outcome.recovered_errors, 1);
    assert_eq!(read_jsonl(&outcome.run_dir.join("fragments.jsonl")).len(), 0);
    let log = std::fs::read_to_string(outcome.run_dir.join("errors.log")).unwrap();
    assert!(log.contains("[window 1 offset 15] descriptor dropped: missing start/end offsets"));
}
