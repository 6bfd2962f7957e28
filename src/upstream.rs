//! HTTP client for one OpenAI-compatible backend.
//!
//! Exposes the three operations the rest of the proxy needs: list models,
//! create a chat completion, and create a streaming chat completion. The
//! streaming variant parses the backend's SSE `data:` lines into typed chunks
//! and ends on the `[DONE]` sentinel.

use crate::config::BackendConfig;
use crate::error::{ProxyError, Result};
use crate::translate::openai_types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatErrorResponse,
    ModelsResponse,
};

use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use tracing::debug;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, config: &BackendConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Fetch the backend's model listing as a flat list of IDs.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.url("/models");
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProxyError::provider(format!("Failed to fetch models: {e}")))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::provider(format!(
                "Backend returned status {status} when fetching models: {body}"
            )));
        }

        let parsed: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ProxyError::provider(format!("Failed to parse models response: {e}")))?;

        Ok(parsed.data.into_iter().map(|m| m.id).collect())
    }

    /// Issue a non-streaming chat completion.
    pub async fn chat_completion(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = self.url("/chat/completions");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| ProxyError::provider(format!("Request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::provider(format!("Failed to read response body: {e}")))?;

        debug!(status, body_len = body.len(), "backend response");

        if status >= 400 {
            return Err(backend_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProxyError::translation(format!(
                "Failed to parse backend response: {e}. Body: {}",
                truncate(&body, 300)
            ))
        })
    }

    /// Issue a streaming chat completion and return the parsed chunk stream.
    ///
    /// A transport error mid-stream surfaces as one `Err` item, after which
    /// the stream ends.
    pub async fn chat_completion_stream(&self, req: &ChatCompletionRequest) -> Result<ChunkStream> {
        let url = self.url("/chat/completions");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| ProxyError::provider(format!("Streaming request failed: {e}")))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(backend_error(status, &body));
        }

        let byte_stream = response.bytes_stream();

        let chunk_stream = async_stream::stream! {
            let mut buffer = String::new();

            tokio::pin!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        yield Err(ProxyError::provider(format!("Byte stream error: {e}")));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim().to_string();
                    buffer = buffer[newline_pos + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    // SSE lines start with "data: "
                    let data = if let Some(stripped) = line.strip_prefix("data: ") {
                        stripped.trim()
                    } else if let Some(stripped) = line.strip_prefix("data:") {
                        stripped.trim()
                    } else {
                        continue;
                    };

                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<ChatCompletionChunk>(data) {
                        Ok(chunk) => yield Ok(chunk),
                        Err(e) => {
                            debug!(error = %e, "skipping unparseable stream chunk");
                        }
                    }
                }
            }
        };

        Ok(Box::pin(chunk_stream))
    }
}

fn backend_error(status: u16, body: &str) -> ProxyError {
    if let Ok(err) = serde_json::from_str::<ChatErrorResponse>(body) {
        return ProxyError::provider(format!(
            "Backend returned status {status}: {}",
            err.error.message
        ));
    }
    ProxyError::provider(format!(
        "Backend returned status {status}: {}",
        truncate(body, 500)
    ))
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        &s[..max]
    }
}
