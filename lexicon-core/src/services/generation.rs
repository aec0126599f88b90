use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::{thread_rng, Rng};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::model::credential::Credential;
use crate::model::entry::{VocabKind, VocabularyEntry};
use crate::model::filter::{GenerationFilter, KindSelection};
use crate::services::generation_types::{GeneratedPayload, GenerationError};
use crate::services::vocabulary_store::VocabularyStore;

const ERROR_SNIPPET_LEN: usize = 400;

/// Remote capability that creates new entries for a filter and persists
/// them, reporting how many were new.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, filter: &GenerationFilter, credential: &Credential) -> Result<usize, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    DeepSeek,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self, GenerationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "deepseek" => Ok(Provider::DeepSeek),
            other => Err(GenerationError::new(format!("Unsupported provider: {other}"))),
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAi => "https://api.openai.com",
            Provider::DeepSeek => "https://api.deepseek.com",
        }
    }

    fn endpoint(&self, base_url: Option<&str>, model: &str) -> String {
        let base = base_url.unwrap_or(self.default_base_url()).trim_end_matches('/');
        match self {
            Provider::Gemini => format!("{base}/v1beta/models/{model}:generateContent"),
            Provider::OpenAi | Provider::DeepSeek => format!("{base}/v1/chat/completions"),
        }
    }

    fn authorize(&self, req: RequestBuilder, api_key: &str) -> RequestBuilder {
        match self {
            Provider::Gemini => req.header("x-goog-api-key", api_key),
            Provider::OpenAi | Provider::DeepSeek => req.bearer_auth(api_key),
        }
    }

    fn request_body(&self, model: &str, prompt: &str) -> Value {
        match self {
            Provider::Gemini => json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "temperature": 0.9
                }
            }),
            Provider::OpenAi | Provider::DeepSeek => json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": "You are an English vocabulary author for TOEIC learners. Answer with JSON only." },
                    { "role": "user", "content": prompt }
                ],
                "response_format": { "type": "json_object" },
                "temperature": 0.9
            }),
        }
    }

    fn extract_text<'a>(&self, body: &'a Value) -> Option<&'a str> {
        match self {
            Provider::Gemini => body
                .get("candidates")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("content"))
                .and_then(|c| c.get("parts"))
                .and_then(|p| p.get(0))
                .and_then(|p| p.get("text"))
                .and_then(|t| t.as_str()),
            Provider::OpenAi | Provider::DeepSeek => body
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str()),
        }
    }
}

/// Generation over an LLM HTTP API. Retries transient failures itself;
/// callers see one outcome per call.
pub struct HttpGenerationClient {
    http: Client,
    provider: Provider,
    config: GenerationConfig,
    store: Arc<dyn VocabularyStore>,
}

struct AttemptError {
    message: String,
    retryable: bool,
}

impl HttpGenerationClient {
    pub fn new(config: GenerationConfig, store: Arc<dyn VocabularyStore>) -> Result<Self, GenerationError> {
        let provider = Provider::parse(&config.provider)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::new(e.to_string()))?;

        Ok(Self {
            http,
            provider,
            config,
            store,
        })
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let endpoint = self
            .provider
            .endpoint(self.config.base_url.as_deref(), &self.config.model);
        let body = self.provider.request_body(&self.config.model, prompt);
        let max_retries = self.config.max_retries;
        let mut last_err = String::new();

        // first try plus up to max_retries retries
        for attempt in 0..=max_retries {
            match self.attempt(&endpoint, api_key, &body).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_err = e.message;
                    if !e.retryable || attempt >= max_retries {
                        break;
                    }
                    let delay = backoff(self.config.base_delay_ms, attempt);
                    warn!("[generation] attempt {} failed ({last_err}); retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(GenerationError::new(last_err))
    }

    async fn attempt(&self, endpoint: &str, api_key: &str, body: &Value) -> Result<String, AttemptError> {
        let req = self.provider.authorize(self.http.post(endpoint), api_key).json(body);

        let resp = req.send().await.map_err(|err| AttemptError {
            message: describe_transport_error(&err, self.config.timeout_secs),
            retryable: true,
        })?;

        let status = resp.status();

        // read as text first so an error body is not lost to a JSON failure
        let text = resp.text().await.map_err(|err| AttemptError {
            message: describe_transport_error(&err, self.config.timeout_secs),
            retryable: true,
        })?;

        if !status.is_success() {
            return Err(AttemptError {
                message: extract_error_message(status, &text),
                retryable: should_retry_http(status),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|_| AttemptError {
            message: "Invalid JSON from provider".into(),
            retryable: true,
        })?;

        self.provider
            .extract_text(&json)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| AttemptError {
                message: "Invalid provider response: missing generated text".into(),
                retryable: true,
            })
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, filter: &GenerationFilter, credential: &Credential) -> Result<usize, GenerationError> {
        let api_key = credential
            .secret()
            .ok_or_else(|| GenerationError::new("API key is not set"))?;

        let prompt = build_prompt(filter, self.config.items_per_batch);
        debug!("[generation] requesting {} items from {:?}", self.config.items_per_batch, self.provider);

        let text = self.request(api_key, &prompt).await?;
        let entries = parse_generated(&text, filter)?;
        let offered = entries.len();

        let added = self
            .store
            .insert_if_new(entries)
            .await
            .map_err(|e| GenerationError::new(e.to_string()))?;

        info!("[generation] {added} of {offered} generated items were new");
        Ok(added)
    }
}

fn backoff(base_delay_ms: u64, attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let factor = 2_u64.saturating_pow(attempt as u32);
    Duration::from_millis(base_delay_ms.saturating_mul(factor) + jitter)
}

fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn describe_transport_error(err: &reqwest::Error, timeout_secs: u64) -> String {
    if err.is_timeout() {
        format!("request timed out after {timeout_secs}s")
    } else {
        err.to_string()
    }
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
    }

    let trimmed = body_text.trim();
    let snippet: String = if trimmed.chars().count() > ERROR_SNIPPET_LEN {
        let cut: String = trimmed.chars().take(ERROR_SNIPPET_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    };

    format!("HTTP {}: {}", status.as_u16(), snippet)
}

fn build_prompt(filter: &GenerationFilter, count: u32) -> String {
    let mut p = String::new();

    p.push_str(&format!(
        "Create {count} distinct English vocabulary items useful for the TOEIC test.\n"
    ));

    match filter.kind {
        KindSelection::Word => p.push_str("Every item must be a single word (type \"word\").\n"),
        KindSelection::Idiom => p.push_str("Every item must be an idiom or set phrase (type \"idiom\").\n"),
        KindSelection::Both => p.push_str("Mix single words (type \"word\") and idioms (type \"idiom\").\n"),
    }

    if !filter.level.is_all() {
        p.push_str(&format!("Target level: {}.\n", filter.level));
    }
    if !filter.category.is_all() {
        p.push_str(&format!("Topic category: {}.\n", filter.category));
    }

    p.push_str(
        "Answer with a JSON object {\"vocabulary\": [...]} where each item has the fields \
         \"term\", \"type\", \"definition\", \"example\", \"level\" and \"category\".",
    );

    p
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // drop the info string ("json") on the opening fence line
    let body = match rest.split_once('\n') {
        Some((_, b)) => b,
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Turns model output into entries. Items that are not usable objects are
/// skipped; a response with no usable items at all is an error.
fn parse_generated(text: &str, filter: &GenerationFilter) -> Result<Vec<VocabularyEntry>, GenerationError> {
    let payload: GeneratedPayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::new(format!("Malformed generation response: {e}")))?;

    let items = payload.into_items();
    let offered = items.len();
    let mut entries = Vec::with_capacity(offered);

    for (i, item) in items.into_iter().enumerate() {
        let Value::Object(raw) = item else {
            warn!("[generation] item {i} is not an object; skipped");
            continue;
        };

        let kind = filter.kind.fixed_kind().unwrap_or_else(|| {
            raw.get("type")
                .or_else(|| raw.get("kind"))
                .and_then(|v| v.as_str())
                .and_then(VocabKind::parse)
                .unwrap_or_default()
        });

        match VocabularyEntry::from_raw(raw, kind) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!("[generation] item {i} skipped: {reason}"),
        }
    }

    if entries.is_empty() && offered > 0 {
        return Err(GenerationError::new("Malformed generation response: no usable items"));
    }

    Ok(entries)
}
