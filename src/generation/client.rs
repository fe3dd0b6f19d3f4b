//! HTTP client for an Ollama-compatible generation service.

use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::{CoreError, CoreResult};
use crate::generation::stream::{text_field, ChunkAssembler};

/// One turn in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Client for `POST /api/generate`, `POST /api/chat`, and the
/// `GET /api/tags` availability probe.
///
/// The configured timeout bounds the time to response headers; once the
/// service starts answering, body and stream reads run unbounded. Requests
/// are never retried here — retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl GenerationClient {
    pub fn new(config: &GenerationConfig) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Network(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One-shot completion of a raw prompt.
    pub async fn generate(&self, prompt: &str) -> CoreResult<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let response = self.post(&self.endpoint("/api/generate"), &body).await?;
        self.read_text(response).await
    }

    /// One-shot completion of a chat conversation.
    pub async fn chat(&self, messages: &[ChatMessage]) -> CoreResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };
        let response = self.post(&self.endpoint("/api/chat"), &body).await?;
        self.read_text(response).await
    }

    /// Streamed completion of a raw prompt. `on_chunk` is invoked once per
    /// extracted text fragment; the full concatenation is returned.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        on_chunk: impl FnMut(&str),
    ) -> CoreResult<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };
        let response = self.post(&self.endpoint("/api/generate"), &body).await?;
        self.consume_stream(response, on_chunk).await
    }

    /// Streamed completion of a chat conversation.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        on_chunk: impl FnMut(&str),
    ) -> CoreResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };
        let response = self.post(&self.endpoint("/api/chat"), &body).await?;
        self.consume_stream(response, on_chunk).await
    }

    /// `true` iff `GET /api/tags` answers with a success status inside the
    /// probe timeout. Never errors.
    pub async fn is_available(&self) -> bool {
        let url = self.endpoint("/api/tags");
        match tokio::time::timeout(self.probe_timeout, self.http.get(&url).send()).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(err)) => {
                debug!("generation service unreachable: {err}");
                false
            }
            Err(_) => {
                debug!("generation service probe timed out");
                false
            }
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: Serialize>(&self, url: &str, body: &T) -> CoreResult<reqwest::Response> {
        let pending = self.http.post(url).json(body).send();
        let response = tokio::time::timeout(self.timeout, pending)
            .await
            .map_err(|_| CoreError::Timeout {
                millis: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| CoreError::Network(format!("requesting {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CoreError::Network(format!(
                "generation service returned {status}: {detail}"
            )));
        }
        Ok(response)
    }

    async fn read_text(&self, response: reqwest::Response) -> CoreResult<String> {
        let record: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CoreError::Network(format!("reading generation response: {e}")))?;
        Ok(text_field(&record).unwrap_or_default())
    }

    async fn consume_stream(
        &self,
        response: reqwest::Response,
        mut on_chunk: impl FnMut(&str),
    ) -> CoreResult<String> {
        let mut assembler = ChunkAssembler::new();
        let mut full = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| CoreError::Network(format!("reading generation stream: {e}")))?;
            for fragment in assembler.push(&String::from_utf8_lossy(&chunk)) {
                on_chunk(&fragment);
                full.push_str(&fragment);
            }
            if assembler.is_done() {
                break;
            }
        }
        if let Some(tail) = assembler.finish() {
            on_chunk(&tail);
            full.push_str(&tail);
        }
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_base(base_url: &str) -> GenerationClient {
        let config = GenerationConfig {
            base_url: base_url.to_string(),
            ..GenerationConfig::default()
        };
        GenerationClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_cleanly_with_trailing_slash() {
        let client = client_with_base("http://localhost:11434/");
        assert_eq!(
            client.endpoint("/api/generate"),
            "http://localhost:11434/api/generate"
        );
        assert_eq!(client.endpoint("/api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn test_client_carries_configured_model() {
        let client = GenerationClient::new(&GenerationConfig::default()).unwrap();
        assert_eq!(client.model(), "gemma3:4b");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "hello");
        assert_eq!(ChatMessage::system("ctx").role, "system");
    }
}
