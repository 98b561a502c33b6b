use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, RepodocError, Result};

/// Opaque text-in/text-out generation call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RepodocError::Other("GEMINI_API_KEY environment variable is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::from_message(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("{} - {}", status, text);
            return Err(match status {
                StatusCode::SERVICE_UNAVAILABLE => GenerationError::Overloaded(message),
                StatusCode::TOO_MANY_REQUESTS => GenerationError::QuotaExceeded(message),
                _ => GenerationError::from_message(message),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::InvalidResponse("response contained no text".to_string()));
        }
        Ok(text)
    }
}

/// Waits between attempts. Swappable so tests do not sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Produces the random part of a backoff delay.
pub type JitterSource = Arc<dyn Fn(Duration) -> Duration + Send + Sync>;

fn random_jitter() -> JitterSource {
    Arc::new(|max: Duration| Duration::from_millis(fastrand::u64(0..=max.as_millis() as u64)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// `2^attempt * base_delay + jitter`, `attempt` counting failed calls so far.
    pub fn backoff(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).saturating_add(jitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp(GenerationError),
}

/// Attempt bookkeeping for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
    last_error: Option<GenerationError>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&GenerationError> {
        self.last_error.as_ref()
    }

    /// Record a failed call and decide what happens next.
    pub fn on_failure(&mut self, policy: &RetryPolicy, error: GenerationError, jitter: Duration) -> RetryDecision {
        self.attempts += 1;

        if !error.is_transient() {
            return RetryDecision::GiveUp(error);
        }

        if self.attempts < policy.max_attempts {
            let delay = policy.backoff(self.attempts, jitter);
            self.last_error = Some(error);
            RetryDecision::Retry { delay }
        } else {
            let last_error = error.to_string();
            self.last_error = Some(error);
            RetryDecision::GiveUp(GenerationError::RetryExhausted {
                attempts: self.attempts,
                last_error,
            })
        }
    }
}

/// Calls a `TextGenerator`, retrying overload failures with exponential backoff.
pub struct GenerationInvoker {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    jitter: JitterSource,
}

impl GenerationInvoker {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self {
            generator,
            policy,
            sleeper: Arc::new(TokioSleeper),
            jitter: random_jitter(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_jitter(mut self, jitter: JitterSource) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn invoke(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let mut state = RetryState::new();
        loop {
            let error = match self.generator.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(error) => error,
            };

            let jitter = (self.jitter)(self.policy.max_jitter);
            match state.on_failure(&self.policy, error, jitter) {
                RetryDecision::Retry { delay } => {
                    warn!(
                        attempt = state.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Generation service overloaded, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::GiveUp(error) => return Err(error),
            }
        }
    }
}
