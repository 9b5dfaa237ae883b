//! OpenAI-compatible chat completions client.
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ChatModel, LlmError};
use crate::config::ChatConfig;

pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(cfg: &ChatConfig, api_key: &str) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::RequestFailed("missing API key".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| LlmError::RequestFailed(format!("invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("client build failed: {e}")))?;

        let endpoint = format!("{}/v1/chat/completions", cfg.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

impl ChatModel for OpenAiChat {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            // All prompts in this pipeline require a JSON object back
            response_format: json!({"type": "json_object"}),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LlmError::RequestFailed(format!("{status}: {text}")));
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| LlmError::RequestFailed(format!("parse failed: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::RequestFailed("no choices in response".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: serde_json::Value,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        let cfg = ChatConfig::default();
        assert!(OpenAiChat::new(&cfg, "").is_err());
    }

    #[test]
    fn test_endpoint_built_from_base_url() {
        let mut cfg = ChatConfig::default();
        cfg.base_url = "https://example.test/".to_string();
        let chat = OpenAiChat::new(&cfg, "key").unwrap();
        assert_eq!(chat.endpoint, "https://example.test/v1/chat/completions");
        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.temperature, 0.0);
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"labels\": [\"bug\"]}"}}
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content,
            "{\"labels\": [\"bug\"]}"
        );
    }
}
