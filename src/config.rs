//! Run settings and the optional config file
//!
//! Settings resolve in three layers: built-in defaults, then an optional
//! YAML (fallback JSON) config file, then CLI flags. The file carries
//! `active_schemas`, an `llm` section and a `windows` section, all
//! optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::schema::{parse_active_set, SchemaId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path} as YAML or JSON: {detail}")]
    Unparseable { path: PathBuf, detail: String },
    #[error("active schema set is empty")]
    EmptyActiveSet,
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Schemas the classifier may emit.
    pub active_schemas: Vec<SchemaId>,
    /// Chat model name for the remote classifier.
    pub model: String,
    /// Sampling temperature, omitted on the wire for gpt-5 models.
    pub temperature: f64,
    /// Completion token cap per window.
    pub max_tokens: u32,
    /// Window length in characters.
    pub window_chars: usize,
    /// Overlap between consecutive windows in characters.
    pub overlap_chars: usize,
    /// Parent directory for run directories.
    pub out_dir: PathBuf,
    /// Use the offline heuristic classifier instead of the remote model.
    pub mock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_schemas: SchemaId::DEFAULT_ACTIVE.to_vec(),
            model: "gpt-5-pro".to_string(),
            temperature: 0.2,
            max_tokens: 1800,
            window_chars: 6000,
            overlap_chars: 600,
            out_dir: PathBuf::from("out"),
            mock: false,
        }
    }
}

impl Settings {
    /// A run cannot proceed without at least one active schema.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_schemas.is_empty() {
            return Err(ConfigError::EmptyActiveSet);
        }
        Ok(())
    }
}

/// Config file shape. Absent keys leave the current settings untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub active_schemas: Option<Vec<String>>,
    #[serde(default)]
    pub llm: Option<LlmSection>,
    #[serde(default)]
    pub windows: Option<WindowsSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowsSection {
    #[serde(default)]
    pub window_chars: Option<usize>,
    #[serde(default)]
    pub overlap_chars: Option<usize>,
}

impl ConfigFile {
    /// Parse a config file, trying YAML first and JSON second. An empty
    /// file is an empty overlay.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_yaml::from_str(&text) {
            Ok(parsed) => Ok(parsed),
            Err(yaml_err) => {
                serde_json::from_str(&text).map_err(|json_err| ConfigError::Unparseable {
                    path: path.to_path_buf(),
                    detail: format!("{yaml_err}; as JSON: {json_err}"),
                })
            }
        }
    }

    /// Overlay the file's values onto `settings`. Unknown schema names
    /// are warned about and dropped.
    pub fn apply(self, settings: &mut Settings) {
        if let Some(names) = self.active_schemas {
            settings.active_schemas = parse_active_set(&names);
        }
        if let Some(llm) = self.llm {
            if let Some(model) = llm.model {
                settings.model = model;
            }
            if let Some(temperature) = llm.temperature {
                settings.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                settings.max_tokens = max_tokens;
            }
        }
        if let Some(windows) = self.windows {
            if let Some(window_chars) = windows.window_chars {
                settings.window_chars = window_chars;
            }
            if let Some(overlap_chars) = windows.overlap_chars {
                settings.overlap_chars = overlap_chars;
            }
        }
    }
}

/// Platform config file location, `<config dir>/lamina/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lamina").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_cover_a_full_run() {
        let settings = Settings::default();
        assert_eq!(settings.model, "gpt-5-pro");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.max_tokens, 1800);
        assert_eq!(settings.window_chars, 6000);
        assert_eq!(settings.overlap_chars, 600);
        assert_eq!(settings.out_dir, PathBuf::from("out"));
        assert!(!settings.mock);
        assert_eq!(settings.active_schemas, SchemaId::DEFAULT_ACTIVE.to_vec());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn comparison_is_opt_in_not_default() {
        let settings = Settings::default();
        assert!(!settings.active_schemas.contains(&SchemaId::Comparison));

        let mut settings = Settings::default();
        settings.active_schemas = parse_active_set(&["Comparison".to_string()]);
        assert_eq!(settings.active_schemas, vec![SchemaId::Comparison]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn yaml_overlay_touches_only_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "config.yaml",
            "active_schemas:\n  - Definition\n  - Causal Relation\nllm:\n  model: gpt-4o\nwindows:\n  overlap_chars: 150\n",
        );

        let mut settings = Settings::default();
        ConfigFile::load(&path).unwrap().apply(&mut settings);

        assert_eq!(
            settings.active_schemas,
            vec![SchemaId::Definition, SchemaId::CausalRelation]
        );
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.overlap_chars, 150);
        // untouched keys keep their defaults
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.max_tokens, 1800);
        assert_eq!(settings.window_chars, 6000);
    }

    #[test]
    fn json_config_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "config.json",
            r#"{"llm": {"temperature": 0.7, "max_tokens": 900}}"#,
        );

        let mut settings = Settings::default();
        ConfigFile::load(&path).unwrap().apply(&mut settings);
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 900);
        assert_eq!(settings.model, "gpt-5-pro");
    }

    #[test]
    fn empty_file_is_an_empty_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", "  \n");

        let mut settings = Settings::default();
        ConfigFile::load(&path).unwrap().apply(&mut settings);
        assert_eq!(settings.model, "gpt-5-pro");
        assert_eq!(settings.active_schemas, SchemaId::DEFAULT_ACTIVE.to_vec());
    }

    #[test]
    fn garbage_reports_both_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", "{broken: [unterminated\n");

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Unparseable { .. }));
        assert!(err.to_string().contains("as JSON"));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn unknown_schema_names_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "config.yaml",
            "active_schemas:\n  - Definition\n  - Bogus Schema\n",
        );

        let mut settings = Settings::default();
        ConfigFile::load(&path).unwrap().apply(&mut settings);
        assert_eq!(settings.active_schemas, vec![SchemaId::Definition]);
    }

    #[test]
    fn empty_active_set_fails_validation() {
        let mut settings = Settings::default();
        settings.active_schemas.clear();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::EmptyActiveSet)
        ));
    }

    #[test]
    fn default_config_path_is_under_the_platform_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(Path::new("lamina").join("config.yaml")));
        }
    }
}
