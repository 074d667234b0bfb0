use crate::recognition::entry::{parse_entries, RecognitionEntry};
use crate::recognition::error::RecognitionError;
use crate::settings::{RecognitionSettings, ServiceProvider};
use crate::sketch::bindings::bindings_to_json;
use crate::sketch::snapshot::ImagePayload;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Request/parse boundary to an external recognition backend.
///
/// Implementations must not touch session state; interpreting the entries is
/// the caller's job.
pub trait RecognitionService {
    fn solve(
        &self,
        image: &ImagePayload,
        bindings: &BTreeMap<String, String>,
    ) -> Result<Vec<RecognitionEntry>, RecognitionError>;
}

pub struct HttpRecognitionClient {
    http: Client,
    provider: ServiceProvider,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpRecognitionClient {
    /// Reads the credential from the environment variable named in
    /// `settings`, failing with [`RecognitionError::Configuration`] when it is
    /// absent so the condition surfaces at startup.
    pub fn from_settings(settings: &RecognitionSettings) -> Result<Self, RecognitionError> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            RecognitionError::Configuration(format!(
                "environment variable {} is not set",
                settings.api_key_env
            ))
        })?;
        Self::new(settings, api_key)
    }

    pub fn new(
        settings: &RecognitionSettings,
        api_key: impl Into<String>,
    ) -> Result<Self, RecognitionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RecognitionError::Configuration(
                "service credential is empty".into(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds.max(1)))
            .user_agent("maths-notes recognizer")
            .build()
            .map_err(|err| RecognitionError::Configuration(format!("build http client: {err}")))?;
        Ok(Self {
            http,
            provider: settings.provider,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    pub fn provider(&self) -> ServiceProvider {
        self.provider
    }

    pub fn request_url(&self) -> String {
        match self.provider {
            ServiceProvider::Gemini => {
                format!("{}/models/{}:generateContent", self.endpoint, self.model)
            }
            ServiceProvider::Direct => self.endpoint.clone(),
        }
    }

    pub fn request_body(&self, image: &ImagePayload, bindings: &BTreeMap<String, String>) -> Value {
        match self.provider {
            ServiceProvider::Gemini => json!({
                "contents": [{
                    "parts": [
                        { "text": build_prompt(bindings) },
                        {
                            "inline_data": {
                                "mime_type": image.mime_type(),
                                "data": image.to_base64(),
                            }
                        }
                    ]
                }],
                "generationConfig": { "responseMimeType": "application/json" }
            }),
            ServiceProvider::Direct => json!({
                "image": image.to_data_url(),
                "bindings": bindings,
            }),
        }
    }

    fn send(&self, body: &Value) -> Result<String, RecognitionError> {
        let request = self.http.post(self.request_url()).json(body);
        let request = match self.provider {
            ServiceProvider::Gemini => request.header("x-goog-api-key", &self.api_key),
            ServiceProvider::Direct => request.bearer_auth(&self.api_key),
        };
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RecognitionError::Service(format!(
                "service returned {status}: {}",
                truncate_for_log(&text)
            )));
        }
        Ok(text)
    }
}

impl RecognitionService for HttpRecognitionClient {
    fn solve(
        &self,
        image: &ImagePayload,
        bindings: &BTreeMap<String, String>,
    ) -> Result<Vec<RecognitionEntry>, RecognitionError> {
        let started = Instant::now();
        let (width, height) = image.dimensions();
        debug!(
            width,
            height,
            png_bytes = image.bytes().len(),
            bindings = bindings.len(),
            "sending recognition request"
        );

        let body = self.send(&self.request_body(image, bindings))?;
        let answer = match self.provider {
            ServiceProvider::Gemini => extract_answer_text(&body)?,
            ServiceProvider::Direct => body,
        };
        let entries = parse_entries(&answer).map_err(|err| {
            warn!(raw = %answer, "recognition answer failed validation: {err}");
            err
        })?;

        info!(
            entries = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recognition round trip complete"
        );
        Ok(entries)
    }
}

pub fn build_prompt(bindings: &BTreeMap<String, String>) -> String {
    let variables = bindings_to_json(bindings);
    format!(
        "Analyze this image of handwritten mathematics and calculate every expression, \
         equation or diagram it contains. Known variables: {variables}. Substitute these \
         values wherever the symbols appear. Respond with only a JSON array of objects \
         with the keys \"expr\" (the expression as written), \"result\" (the computed \
         answer as a string) and \"assign\" (true only when the expression assigns a \
         value to a variable, in which case \"expr\" is the variable name)."
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

/// Pulls the model's answer text out of a `generateContent` envelope.
fn extract_answer_text(body: &str) -> Result<String, RecognitionError> {
    let envelope: GenerateContentResponse = serde_json::from_str(body).map_err(|err| {
        RecognitionError::parse(format!("invalid generateContent envelope: {err}"), body)
    })?;

    if let Some(reason) = envelope
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(RecognitionError::Service(format!(
            "request was blocked by the service: {reason}"
        )));
    }

    let text: String = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(RecognitionError::Service(
            "service response contained no answer text".into(),
        ));
    }
    Ok(text)
}

fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 256;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
