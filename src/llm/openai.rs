//! OpenAI-compatible streaming chat-completions client.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{LanguageModel, ReplyChunk, ReplyStream};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Streams completions from an OpenAI-compatible `/chat/completions` endpoint.
///
/// Every yielded chunk holds the reply accumulated so far.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> anyhow::Result<ReplyStream> {
        if cancel.is_cancelled() {
            anyhow::bail!("Model request cancelled");
        }

        let body = ChatRequest {
            model: &self.model,
            stream: true,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let mut source = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .eventsource()
            .map_err(|e| anyhow::anyhow!("Failed to open completion stream: {}", e))?;

        let stream: ReplyStream = Box::pin(async_stream::try_stream! {
            let mut accumulated = String::new();
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data.trim() == "[DONE]" {
                            break;
                        }
                        let chunk: ChatCompletionChunk = serde_json::from_str(&message.data)?;
                        if let Some(delta) = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content)
                        {
                            accumulated.push_str(&delta);
                        }
                        yield ReplyChunk::new(accumulated.clone());
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        source.close();
                        Err::<(), _>(anyhow::anyhow!("Completion stream failed: {}", e))?;
                    }
                }
            }
            source.close();
        });

        Ok(stream)
    }
}
