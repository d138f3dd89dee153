//! Remote chat-model classifier
//!
//! Calls a chat-completions endpoint once per window: system prompt =
//! schema context, user prompt = chunk preamble + chunk text. The bearer
//! token comes from `OPENAI_API_KEY` and the endpoint can be overridden
//! with `OPENAI_BASE_URL`. Every HTTP-successful call is appended to the
//! run's `llm_calls.jsonl` transcript, parse failures included; transcript
//! write failures are logged and never fail a window.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::classify::prompt::{build_user_prompt, SchemaContext};
use crate::classify::{ChunkClassification, Classifier, ClassifierError};
use crate::run::RunPaths;
use crate::window::Window;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 300;
/// Longest raw response kept in a transcript line, in characters.
const RESPONSE_SNIPPET_CHARS: usize = 20_000;
const ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Classifier backed by a remote chat-completions endpoint.
#[derive(Debug)]
pub struct RemoteClassifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    transcript: Mutex<Option<PathBuf>>,
}

impl RemoteClassifier {
    /// Build a client from `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    /// A missing or empty key fails before any window is classified.
    pub fn from_env(
        model: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Self, ClassifierError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ClassifierError::MissingApiKey)?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(api_key, base_url, model, temperature, max_tokens))
    }

    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
            transcript: Mutex::new(None),
        }
    }

    /// gpt-5 family models reject a sampling temperature; omit it for them.
    fn sampling_temperature(&self) -> Option<f64> {
        if self.model.starts_with("gpt-5") {
            tracing::debug!(model = %self.model, "model takes no sampling temperature, omitting");
            None
        } else {
            Some(self.temperature)
        }
    }

    fn append_transcript(
        &self,
        window: &Window<'_>,
        system_chars: usize,
        user_chars: usize,
        response: &str,
        parse_ok: bool,
        latency: Duration,
    ) {
        let path = match self.transcript.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(path) = path else { return };

        let record = serde_json::json!({
            "ts": chrono::Utc::now().timestamp(),
            "latency_ms": latency.as_millis() as u64,
            "model": self.model,
            "window_index": window.index,
            "offset": window.start,
            "system_chars": system_chars,
            "user_chars": user_chars,
            "response": truncate_chars(response, RESPONSE_SNIPPET_CHARS),
            "parse_ok": parse_ok,
        });

        let mut line = record.to_string();
        line.push('\n');
        let result = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            tracing::warn!(error = %err, "could not append to call transcript");
        }
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    fn begin_run(&self, run_dir: &Path) {
        if let Ok(mut guard) = self.transcript.lock() {
            *guard = Some(RunPaths::new(run_dir).call_transcript());
        }
    }

    async fn classify(
        &self,
        context: &SchemaContext,
        window: &Window<'_>,
    ) -> Result<ChunkClassification, ClassifierError> {
        let system = context.system_prompt();
        let user = build_user_prompt(window.text, window.start);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.sampling_temperature(),
            max_tokens: self.max_tokens,
        };

        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() {
                    ClassifierError::Connect(self.base_url.clone())
                } else if err.is_timeout() {
                    ClassifierError::Transport(format!(
                        "request timed out after {REQUEST_TIMEOUT_SECS}s"
                    ))
                } else {
                    ClassifierError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_CHARS),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|err| ClassifierError::Parse(format!("malformed completion payload: {err}")))?;
        let latency = started.elapsed();

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let parsed = ChunkClassification::parse(&content);
        self.append_transcript(
            window,
            system.chars().count(),
            user.chars().count(),
            &content,
            parsed.is_some(),
            latency,
        );

        parsed.ok_or_else(|| {
            ClassifierError::Parse(format!(
                "no JSON object in response: {}",
                truncate_chars(&content, 200)
            ))
        })
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
