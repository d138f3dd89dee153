//! Shared helpers for end-to-end run tests
//!
//! Builds scripted classifications and run settings against a temp
//! output directory, and reads back the JSONL files a run writes.

use std::path::Path;

use lamina::{ChunkClassification, FragmentDescriptor, Settings};

/// Mock-mode settings writing under `out_dir`.
pub fn settings(out_dir: &Path, window_chars: usize, overlap_chars: usize) -> Settings {
    Settings {
        window_chars,
        overlap_chars,
        out_dir: out_dir.to_path_buf(),
        mock: true,
        ..Settings::default()
    }
}

pub fn classification(descriptors: Vec<FragmentDescriptor>) -> ChunkClassification {
    ChunkClassification {
        fragments: descriptors,
        alternatives: Vec::new(),
    }
}

pub fn descriptor(start: i64, end: i64, schema: &str, confidence: f64) -> FragmentDescriptor {
    FragmentDescriptor::new(start, end, schema).with_confidence(confidence)
}

/// Parse a JSONL file into one value per line.
pub fn read_jsonl(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .expect("readable jsonl file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSON line"))
        .collect()
}
