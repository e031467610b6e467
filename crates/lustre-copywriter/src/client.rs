//! HTTP client for an OpenAI-compatible chat completions API.
//!
//! Used by the admin product form to draft short product descriptions.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::CopywriterError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, DescriptionRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are an expert copywriter specializing in luxury Japanese-inspired \
     art and design. You write elegant, concise product descriptions.";

/// Client for the chat completions endpoint.
///
/// Use [`CopywriterClient::new`] for production or
/// [`CopywriterClient::with_base_url`] to point at a mock server in tests.
pub struct CopywriterClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl CopywriterClient {
    /// Creates a client pointed at the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`CopywriterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, CopywriterError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL such as `http://host/v1`.
    ///
    /// # Errors
    ///
    /// Returns [`CopywriterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`CopywriterError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, CopywriterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("lustre/0.1 (copywriter)")
            .build()?;

        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            base_url.trim_end_matches('/')
        ))
        .map_err(|e| CopywriterError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Drafts a description of at most ~40 words and returns the trimmed text.
    ///
    /// # Errors
    ///
    /// - [`CopywriterError::Http`] on network failure.
    /// - [`CopywriterError::ApiError`] on a non-2xx response.
    /// - [`CopywriterError::Deserialize`] if the body is not a completions response.
    /// - [`CopywriterError::EmptyCompletion`] if the model returned no text.
    pub async fn generate_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<String, CopywriterError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(request),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(&text).unwrap_or_else(|| text.clone());
            tracing::warn!(status = status.as_u16(), %message, "completions request failed");
            return Err(CopywriterError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| CopywriterError::Deserialize {
                context: format!("chat completion (model={})", self.model),
                source: e,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(CopywriterError::EmptyCompletion)
    }
}

fn build_prompt(request: &DescriptionRequest) -> String {
    format!(
        "You are a senior copywriter for \"Lustre\", an ultra-luxury Japanese-inspired ukiyo-e art print brand.\n\
         Write a compelling, sophisticated, and concise product description (max 40 words) for a product.\n\
         \n\
         Product Name: {}\n\
         Category: {}\n\
         Keywords/Vibe: {}\n\
         \n\
         Tone: Minimalist, poetic, exclusive, high-end, inspired by traditional Japanese aesthetics.\n\
         Do not include the product name in the description if possible, focus on the feeling and quality.",
        request.name.trim(),
        request.category.trim(),
        request.keywords.trim(),
    )
}

/// Extracts `error.message` from an OpenAI-style error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
