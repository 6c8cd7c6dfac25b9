//! In-memory retriever ranking chunks by term overlap (non-persistent).

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::{DocumentSource, Retriever};

/// Longest chunk kept before a paragraph is split.
const MAX_CHUNK_CHARS: usize = 1000;

pub struct InMemoryRetriever {
    chunks: RwLock<Vec<String>>,
    http: reqwest::Client,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
            http: reqwest::Client::new(),
        }
    }

    async fn load(&self, source: DocumentSource) -> anyhow::Result<String> {
        match source {
            DocumentSource::Text { text } => Ok(text),
            DocumentSource::Url { url } | DocumentSource::Link(url) => {
                tracing::info!("Fetching document from {}", url);
                let response = self.http.get(&url).send().await?.error_for_status()?;
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response.bytes().await?;
                document_text(body.to_vec(), content_type.as_deref()).await
            }
        }
    }
}

fn is_pdf(bytes: &[u8], content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("application/pdf"))
        || bytes.starts_with(b"%PDF")
}

/// Decode a fetched document body. PDFs are parsed off the async runtime.
async fn document_text(bytes: Vec<u8>, content_type: Option<&str>) -> anyhow::Result<String> {
    if !is_pdf(&bytes, content_type) {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    tracing::debug!(bytes = bytes.len(), "Extracting text from PDF");
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| anyhow::anyhow!("PDF extraction aborted: {}", e))?
        .map_err(|e| anyhow::anyhow!("Failed to extract PDF text: {}", e))
}

impl Default for InMemoryRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn retrieve_similar(
        &self,
        query: &str,
        amount: usize,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<String>> {
        if cancel.is_cancelled() {
            anyhow::bail!("Retrieval cancelled");
        }

        let query_terms = terms(query);
        if query_terms.is_empty() || amount == 0 {
            return Ok(Vec::new());
        }

        let chunks = self.chunks.read().await;
        let mut scored: Vec<(usize, &String)> = chunks
            .iter()
            .map(|chunk| {
                let chunk_terms = terms(chunk);
                (query_terms.intersection(&chunk_terms).count(), chunk)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        // stable: ties keep ingestion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(amount)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }

    async fn ingest(&self, source: DocumentSource) -> anyhow::Result<usize> {
        let text = self.load(source).await?;
        let new_chunks = split_into_chunks(&text, MAX_CHUNK_CHARS);
        let count = new_chunks.len();
        *self.chunks.write().await = new_chunks;
        tracing::info!(chunks = count, "Replaced retrieval collection");
        Ok(count)
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Split on blank lines, then break paragraphs longer than `max_chars` at word boundaries.
fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let normalized = text.replace("\r\n", "\n");

    for paragraph in normalized.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if paragraph.chars().count() <= max_chars {
            chunks.push(paragraph.to_string());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let extra = if current.is_empty() { 0 } else { 1 };
            if !current.is_empty() && current.chars().count() + extra + word.chars().count() > max_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
    }

    chunks
}
