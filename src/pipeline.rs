//! End-to-end run orchestration
//!
//! A run takes one document through window planning, per-window
//! classification, fragment building, merge, causal linking and output
//! writing. Classifier failures on individual windows are collected and
//! reported, never fatal; the run directory is derived from the run key,
//! so repeating a run with identical inputs lands in the same place with
//! the same ids.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::classify::prompt::SchemaContext;
use crate::classify::Classifier;
use crate::config::Settings;
use crate::document::Document;
use crate::error::{ErrorCollector, LaminaError};
use crate::fragment::{
    build_fragments, link_causals, merge_fragments, Fragment, DEFAULT_IOU_THRESHOLD,
};
use crate::run::output::write_outputs;
use crate::run::{run_dir, run_key, RunMeta, RunPaths};
use crate::window::plan_windows;

pub struct Pipeline {
    settings: Settings,
    classifier: Arc<dyn Classifier>,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub fragments: usize,
    pub recovered_errors: usize,
}

impl Pipeline {
    pub fn new(settings: Settings, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            settings,
            classifier,
        }
    }

    pub async fn run(&self, input: &Path, document: &Document) -> Result<RunOutcome, LaminaError> {
        let key = run_key(
            document.text(),
            &self.settings.active_schemas,
            &self.settings.model,
            self.settings.temperature,
            self.settings.max_tokens,
        );
        let paths = RunPaths::new(run_dir(&self.settings.out_dir, &key));
        std::fs::create_dir_all(paths.dir())?;

        let windows = plan_windows(
            document,
            self.settings.window_chars,
            self.settings.overlap_chars,
        )?;
        tracing::info!(
            run_id = %key,
            windows = windows.len(),
            chars = document.char_len(),
            classifier = self.classifier.name(),
            "starting run"
        );

        self.classifier.begin_run(paths.dir());
        let context = SchemaContext::new(&self.settings.active_schemas);
        let mut errors = ErrorCollector::new();
        let mut raw: Vec<Fragment> = Vec::new();

        for window in &windows {
            tracing::info!(
                window = window.index + 1,
                total = windows.len(),
                offset = window.start,
                "classifying window"
            );
            match self.classifier.classify(&context, window).await {
                Ok(classification) => {
                    raw.extend(build_fragments(&classification, window, document, &mut errors));
                }
                Err(err) => {
                    tracing::warn!(
                        window = window.index,
                        error = %err,
                        "window classification failed"
                    );
                    errors.record(
                        window.index,
                        window.start,
                        format!("classifier call failed: {err}"),
                    );
                }
            }
        }

        let mut fragments = merge_fragments(raw, DEFAULT_IOU_THRESHOLD);
        link_causals(&mut fragments);

        let meta = RunMeta {
            input_file: display_path(input),
            active_schemas: self.settings.active_schemas.clone(),
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            window_chars: self.settings.window_chars,
            overlap_chars: self.settings.overlap_chars,
            mock: self.settings.mock,
            fragments_count: fragments.len(),
            run_dir: display_path(paths.dir()),
            run_id: key.clone(),
            ts: Utc::now().timestamp(),
        };
        write_outputs(&paths, document, &fragments, &meta, &errors)?;

        tracing::info!(
            fragments = fragments.len(),
            recovered_errors = errors.len(),
            dir = %paths.dir().display(),
            "run complete"
        );

        Ok(RunOutcome {
            run_id: key,
            run_dir: paths.dir().to_path_buf(),
            fragments: fragments.len(),
            recovered_errors: errors.len(),
        })
    }
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
