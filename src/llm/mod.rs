//! Language model boundary.
//!
//! A model turns a prompt into a finite stream of reply chunks. Each chunk
//! carries the latest accumulated (or partial) text; the agent keeps the last
//! non-blank one as the reply for that step.

mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

pub use openai::OpenAiClient;

/// One element of a streamed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyChunk {
    pub content: String,
}

impl ReplyChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Lazily produced reply chunks.
pub type ReplyStream = BoxStream<'static, anyhow::Result<ReplyChunk>>;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Start generating a reply for `prompt`.
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> anyhow::Result<ReplyStream>;
}

/// Fold step keeping the most recent non-blank chunk.
///
/// A blank chunk never replaces content seen earlier.
pub fn retain_last_non_blank(current: Option<String>, chunk: ReplyChunk) -> Option<String> {
    if chunk.content.trim().is_empty() {
        current
    } else {
        Some(chunk.content)
    }
}
