use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Shown to callers when no API key is configured
pub const SETUP_GUIDE: &str =
    "AI features are not configured. Set LLM_API_KEY (or DONOR_MATCH__LLM__API_KEY) and restart the service.";

/// Errors that can occur when calling the language model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

/// Client for an OpenAI-compatible chat completion endpoint
///
/// Every call asks the model for a JSON object and parses the reply.
pub struct LlmClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl LlmClient {
    /// Create a new client. An empty API key counts as unconfigured.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a system + user prompt and parse the reply as JSON
    pub async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        tracing::debug!("Calling LLM {} at {}", self.model, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("LLM call failed: {} - {}", status, body);
            return Err(LlmError::ApiError(format!("Model call failed: {}", status)));
        }

        let json: Value = response.json().await?;

        let content = json
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| LlmError::ApiError("Missing choices[0].message.content".into()))?;

        extract_json(content)
    }
}

/// Parse a model reply that should contain one JSON object.
///
/// Tolerates markdown code fences and prose around the object.
pub fn extract_json(text: &str) -> Result<Value, LlmError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(value) = serde_json::from_str::<Value>(unfenced) {
        return Ok(value);
    }

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&unfenced[start..=end])
            .map_err(|e| LlmError::InvalidJson(e.to_string())),
        _ => Err(LlmError::InvalidJson(format!(
            "no JSON object in model reply ({} chars)",
            text.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str, key: Option<&str>) -> LlmClient {
        LlmClient::new(url.to_string(), key.map(String::from), "test-model".to_string(), 5).unwrap()
    }

    #[test]
    fn test_extract_json_plain_and_fenced() {
        let plain = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(plain["a"], 1);

        let fenced = extract_json("```json\n{\"a\": 2}\n```").unwrap();
        assert_eq!(fenced["a"], 2);

        let prose = extract_json("Sure! Here you go: {\"a\": 3} Hope that helps.").unwrap();
        assert_eq!(prose["a"], 3);
    }

    #[test]
    fn test_extract_json_rejects_garbage() {
        assert!(matches!(extract_json("no json here"), Err(LlmError::InvalidJson(_))));
        assert!(matches!(extract_json("{ broken"), Err(LlmError::InvalidJson(_))));
    }

    #[test]
    fn test_empty_key_is_unconfigured() {
        assert!(!client_for("http://localhost", Some("  ")).is_configured());
        assert!(!client_for("http://localhost", None).is_configured());
        assert!(client_for("http://localhost", Some("k")).is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_client_does_not_call_out() {
        let client = client_for("http://127.0.0.1:9", None);
        let result = client.complete_json("sys", "prompt").await;
        assert!(matches!(result, Err(LlmError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_complete_json_parses_model_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"```json\n{\"rankedDonorIds\":[\"d2\",\"d1\"]}\n```"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("secret"));
        let value = client.complete_json("sys", "prompt").await.unwrap();

        assert_eq!(value["rankedDonorIds"][0], "d2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_json_invalid_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"I cannot help with that."}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("secret"));
        let result = client.complete_json("sys", "prompt").await;

        assert!(matches!(result, Err(LlmError::InvalidJson(_))));
    }

    #[tokio::test]
    async fn test_complete_json_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("secret"));
        let result = client.complete_json("sys", "prompt").await;

        assert!(matches!(result, Err(LlmError::ApiError(_))));
    }
}
