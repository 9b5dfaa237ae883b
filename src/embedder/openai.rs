//! OpenAI-compatible embeddings client.
//!
//! Blocking reqwest client against `POST {base}/v1/embeddings`. Transient
//! failures (429 / 5xx / transport errors) are retried with exponential
//! backoff; oversized inputs are submitted in fixed-size sub-batches.
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{Embedder, EmbedderError};
use crate::config::EmbeddingConfig;

const REQUEST_BATCH_SIZE: usize = 100;
const MAX_RETRIES: usize = 5;

pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(cfg: &EmbeddingConfig, api_key: &str) -> Result<Self, EmbedderError> {
        if api_key.trim().is_empty() {
            return Err(EmbedderError::RequestFailed("missing API key".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| EmbedderError::RequestFailed(format!("invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbedderError::RequestFailed(format!("client build failed: {e}")))?;

        let endpoint = format!("{}/v1/embeddings", cfg.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: cfg.model.clone(),
            dimensions: cfg.dimensions,
        })
    }

    fn embed_request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
            };
            let response = self.client.post(&self.endpoint).json(&request).send();

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp.json().map_err(|e| {
                            EmbedderError::InvalidResponse(format!("parse failed: {e}"))
                        })?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(EmbedderError::InvalidResponse(format!(
                                "{} embeddings returned for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        return Ok(parsed
                            .data
                            .into_iter()
                            .map(|entry| entry.embedding)
                            .collect());
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < MAX_RETRIES {
                        attempt += 1;
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(EmbedderError::RequestFailed(format!("{status}: {body}")));
                }
                Err(err) => {
                    if is_retryable(&err) && attempt + 1 < MAX_RETRIES {
                        attempt += 1;
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(EmbedderError::RequestFailed(err.to_string()));
                }
            }
        }
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_batch(&[text]).map(|mut v| v.remove(0))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(REQUEST_BATCH_SIZE) {
            all.extend(self.embed_request(batch)?);
        }
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_request() || err.is_decode()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_entries_sorted_by_index() {
        let json = r#"{
            "data": [
                {"embedding": [0.3], "index": 2},
                {"embedding": [0.1], "index": 0},
                {"embedding": [0.2], "index": 1}
            ]
        }"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        parsed.data.sort_by_key(|entry| entry.index);
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|e| e.embedding).collect();
        assert_eq!(vectors, vec![vec![0.1], vec![0.2], vec![0.3]]);
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let cfg = EmbeddingConfig::default();
        assert!(OpenAiEmbedder::new(&cfg, "  ").is_err());
    }

    #[test]
    fn test_endpoint_built_from_base_url() {
        let mut cfg = EmbeddingConfig::default();
        cfg.base_url = "https://example.test/".to_string();
        let embedder = OpenAiEmbedder::new(&cfg, "key").unwrap();
        assert_eq!(embedder.endpoint, "https://example.test/v1/embeddings");
        assert_eq!(embedder.dimensions(), 1536);
    }

    #[test]
    fn test_retry_backoff_caps() {
        assert_eq!(retry_backoff(1), Duration::from_millis(1000));
        assert_eq!(retry_backoff(2), Duration::from_millis(2000));
        assert_eq!(retry_backoff(5), retry_backoff(12));
    }
}
