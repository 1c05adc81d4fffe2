//! Core `TextGenerator` trait and `ApiBackend` implementation.
//!
//! `ApiBackend` calls a Gemini-style `models/{model}:generateContent` REST
//! endpoint. All connection details come from configuration and the selected
//! [`BackendCandidate`](crate::pipeline::selector::BackendCandidate); nothing
//! is hardcoded beyond the API path.

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use thiserror::Error;

use crate::pipeline::selector::BackendCandidate;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Errors that can occur while constructing or calling a model backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The API key is empty or not a legal HTTP header value.
    #[error("API key is not usable as a credential")]
    InvalidCredential,

    /// The configured base URL does not parse.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("model request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// The model refused the prompt on safety grounds.
    #[error("model blocked the request: {0}")]
    Blocked(String),

    /// The model returned a response with no usable text content.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for prompt-in, free-text-out generation.
///
/// Implementors must be `Send + Sync` so a single backend handle can serve
/// concurrent requests (e.g. behind `Arc<dyn TextGenerator>`).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// ApiBackend
// ---------------------------------------------------------------------------

/// Calls a Gemini-style `generateContent` endpoint over REST.
///
/// Construction validates everything that can be validated offline — the
/// base URL must parse and the API key must form a legal header value — so
/// that backend selection can treat `try_new` as a fallible attempt and
/// move on to the next candidate.
pub struct ApiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: HeaderValue,
    candidate: BackendCandidate,
}

impl ApiBackend {
    /// Attempt to construct a backend for one candidate configuration.
    pub fn try_new(
        candidate: BackendCandidate,
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(BackendError::InvalidCredential);
        }
        let api_key = HeaderValue::from_str(key).map_err(|_| BackendError::InvalidCredential)?;

        let base = reqwest::Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        let endpoint = base
            .join(&format!("/v1beta/models/{}:generateContent", candidate.model))
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            candidate,
        })
    }

    /// Identifier of the model this backend was constructed for.
    pub fn model(&self) -> &str {
        self.candidate.model
    }
}

#[async_trait]
impl TextGenerator for ApiBackend {
    /// Send `prompt` to the configured endpoint and return the first
    /// candidate's text content.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature":     self.candidate.temperature,
                "topK":            self.candidate.top_k,
                "topP":            self.candidate.top_p,
                "maxOutputTokens": self.candidate.max_output_tokens
            },
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT",        "threshold": self.candidate.safety_threshold },
                { "category": "HARM_CATEGORY_HATE_SPEECH",       "threshold": self.candidate.safety_threshold },
                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": self.candidate.safety_threshold },
                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": self.candidate.safety_threshold }
            ]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.clone())
            .json(&body)
            .send()
            .await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        // A safety refusal carries a block reason instead of candidates.
        if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
            return Err(BackendError::Blocked(reason.to_string()));
        }
        if json["candidates"][0]["finishReason"].as_str() == Some("SAFETY") {
            return Err(BackendError::Blocked("SAFETY".to_string()));
        }

        let text = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(BackendError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::selector::CANDIDATES;

    fn make_backend(api_key: &str) -> Result<ApiBackend, BackendError> {
        ApiBackend::try_new(
            CANDIDATES[0],
            api_key,
            "https://generativelanguage.googleapis.com",
            10,
        )
    }

    #[test]
    fn try_new_accepts_real_api_key() {
        let backend = make_backend("test-key-1234").expect("construction");
        assert_eq!(backend.model(), CANDIDATES[0].model);
    }

    #[test]
    fn try_new_rejects_empty_api_key() {
        assert!(matches!(
            make_backend(""),
            Err(BackendError::InvalidCredential)
        ));
        assert!(matches!(
            make_backend("   "),
            Err(BackendError::InvalidCredential)
        ));
    }

    #[test]
    fn try_new_rejects_key_with_control_characters() {
        assert!(matches!(
            make_backend("bad\nkey"),
            Err(BackendError::InvalidCredential)
        ));
    }

    #[test]
    fn try_new_rejects_unparseable_base_url() {
        let result = ApiBackend::try_new(CANDIDATES[0], "key", "not a url", 10);
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn endpoint_includes_model_path() {
        let backend = make_backend("test-key").unwrap();
        assert!(backend.endpoint.contains(":generateContent"));
        assert!(backend.endpoint.contains(CANDIDATES[0].model));
    }

    /// Verify that `ApiBackend` is object-safe (usable as `dyn TextGenerator`).
    #[test]
    fn backend_is_object_safe() {
        let backend: Box<dyn TextGenerator> = Box::new(make_backend("test-key").unwrap());
        drop(backend);
    }
}
