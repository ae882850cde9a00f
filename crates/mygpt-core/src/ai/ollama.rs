use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{FragmentSink, GenerationBackend};
use crate::error::BackendError;
use crate::message::{MessageData, MessageRole};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a MessageData> for ChatTurn<'a> {
    fn from(msg: &'a MessageData) -> Self {
        let role = match msg.role() {
            MessageRole::User => "user",
            MessageRole::Bot => "assistant",
        };
        Self {
            role,
            content: msg.text(),
        }
    }
}

/// One line of a streamed `/api/chat` response
#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

/// Decoded content of one response line
#[derive(Debug, PartialEq, Eq)]
struct ChunkOutcome {
    fragment: Option<String>,
    done: bool,
}

fn decode_chunk(line: &str) -> Result<ChunkOutcome, BackendError> {
    let chunk: ChatChunk = serde_json::from_str(line)?;

    if let Some(error) = chunk.error {
        return Err(BackendError::Server(error));
    }

    let fragment = chunk
        .message
        .map(|m| m.content)
        .filter(|content| !content.is_empty());

    Ok(ChunkOutcome {
        fragment,
        done: chunk.done,
    })
}

/// Splits a byte stream into newline-terminated lines. A chunk boundary may
/// fall anywhere, including inside a multi-byte character.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Whatever is left once the stream has ended
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let rest = String::from_utf8_lossy(&rest).trim().to_string();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        let model_names: Vec<String> = models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect();

        Ok(model_names)
    }

    /// Feed one decoded line to the sink. Returns true when the reply is over.
    fn forward_line(line: &str, sink: &FragmentSink) -> Result<bool, BackendError> {
        let outcome = decode_chunk(line)?;
        if let Some(fragment) = outcome.fragment {
            if !sink.push(fragment) {
                debug!("fragment receiver dropped, stopping stream");
                return Ok(true);
            }
        }
        Ok(outcome.done)
    }
}

impl GenerationBackend for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        history: &[MessageData],
        sink: &FragmentSink,
    ) -> Result<(), BackendError> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            model,
            messages: history.iter().map(ChatTurn::from).collect(),
            stream: true,
        };

        info!(model, turns = history.len(), "requesting chat completion");

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for line in lines.push(&chunk) {
                if Self::forward_line(&line, sink)? {
                    return Ok(());
                }
            }
        }

        if let Some(line) = lines.finish() {
            Self::forward_line(&line, sink)?;
        }

        Ok(())
    }
}
