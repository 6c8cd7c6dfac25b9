//! Context retrieval boundary.
//!
//! The agent only needs ranked text snippets for a query; how documents are
//! stored and ranked is up to the implementation.

mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub use memory::InMemoryRetriever;

/// Where an ingested document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DocumentSource {
    /// Plain text supplied inline.
    Text { text: String },
    /// A document fetched over HTTP. PDFs have their text extracted.
    Url { url: String },
    /// A bare JSON string, treated as a URL.
    Link(String),
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `amount` snippets relevant to `query`, best first.
    async fn retrieve_similar(
        &self,
        query: &str,
        amount: usize,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<String>>;

    /// Replace the backing collection with the chunks of `source`.
    /// Returns the number of chunks stored.
    async fn ingest(&self, source: DocumentSource) -> anyhow::Result<usize>;
}

/// Join snippets into a single context block.
pub fn join_snippets(snippets: &[String]) -> String {
    snippets.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_source_accepts_text_or_url() {
        let text: DocumentSource = serde_json::from_str(r#"{"text":"manual"}"#).expect("text");
        assert_eq!(text, DocumentSource::Text { text: "manual".to_string() });

        let url: DocumentSource =
            serde_json::from_str(r#"{"url":"https://example.com/m.txt"}"#).expect("url");
        assert_eq!(
            url,
            DocumentSource::Url {
                url: "https://example.com/m.txt".to_string()
            }
        );
    }

    #[test]
    fn document_source_accepts_bare_url_string() {
        let link: DocumentSource =
            serde_json::from_str(r#""https://example.com/manual.pdf""#).expect("bare string");
        assert_eq!(
            link,
            DocumentSource::Link("https://example.com/manual.pdf".to_string())
        );
    }

    #[test]
    fn snippets_are_separated_by_blank_lines() {
        let joined = join_snippets(&["a".to_string(), "b".to_string()]);
        assert_eq!(joined, "a\n\nb");
        assert_eq!(join_snippets(&[]), "");
    }
}
