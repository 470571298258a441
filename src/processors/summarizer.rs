//! Article summarization with a remote backend and a local fallback.
//!
//! The backend is an explicit two-branch strategy chosen at construction:
//! remote chat-completion API or the local leading-sentence heuristic. Any
//! remote failure degrades that single call to the heuristic — summarization
//! never raises to its caller.

use tracing::{debug, warn};

use crate::error::Result;
use crate::processors::api::ChatClient;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that creates concise, informative summaries of news articles.";

/// Maximum input characters forwarded to the remote backend.
const MAX_REMOTE_INPUT_CHARS: usize = 4000;

/// Backend choice, fixed at construction.
pub enum SummarizerBackend {
    Remote(ChatClient),
    Heuristic,
}

pub struct ArticleSummarizer {
    backend: SummarizerBackend,
}

impl ArticleSummarizer {
    pub fn new(backend: SummarizerBackend) -> Self {
        Self { backend }
    }

    /// Remote backend from the environment, degrading to the heuristic with
    /// a warning when no credential is configured.
    pub fn remote() -> Self {
        match ChatClient::from_env() {
            Some(client) => Self::new(SummarizerBackend::Remote(client)),
            None => {
                warn!("No API credential configured; summarizer falling back to heuristic backend");
                Self::new(SummarizerBackend::Heuristic)
            }
        }
    }

    pub fn heuristic() -> Self {
        Self::new(SummarizerBackend::Heuristic)
    }

    /// Summarize one text to roughly `max_length` characters.
    pub async fn summarize(&self, text: &str, max_length: usize) -> String {
        match &self.backend {
            SummarizerBackend::Remote(client) => {
                match summarize_remote(client, text, max_length).await {
                    Ok(summary) => {
                        debug!(chars = summary.len(), "Remote summary generated");
                        summary
                    }
                    Err(e) => {
                        warn!(error = %e, "Remote summarization failed; using heuristic fallback");
                        leading_sentences(text, max_length)
                    }
                }
            }
            SummarizerBackend::Heuristic => leading_sentences(text, max_length),
        }
    }

    /// Summarize each text independently, preserving order.
    pub async fn summarize_batch(&self, texts: &[String], max_length: usize) -> Vec<String> {
        let mut summaries = Vec::with_capacity(texts.len());
        for text in texts {
            summaries.push(self.summarize(text, max_length).await);
        }
        summaries
    }
}

async fn summarize_remote(
    client: &ChatClient,
    text: &str,
    max_length: usize,
) -> Result<String> {
    let excerpt: String = text.chars().take(MAX_REMOTE_INPUT_CHARS).collect();
    let prompt = format!(
        "Please provide a concise summary of the following article in about \
         {max_length} characters. Focus on the key points and main takeaways:\n\n\
         {excerpt}\n\nSummary:"
    );
    // Rough token-to-character ratio.
    let max_tokens = (max_length / 3).max(1) as u32;
    client
        .complete_with_backoff(SYSTEM_PROMPT, &prompt, max_tokens, 0.3)
        .await
}

/// Fallback summarization: leading sentences concatenated while the running
/// summary stays under the character budget.
pub fn leading_sentences(text: &str, max_length: usize) -> String {
    let mut summary = String::new();
    for sentence in text.split(". ") {
        if summary.len() + sentence.len() < max_length {
            summary.push_str(sentence);
            summary.push_str(". ");
        } else {
            break;
        }
    }
    summary.trim().to_string()
}
