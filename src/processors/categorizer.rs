//! Article categorization with a remote backend and a keyword fallback.
//!
//! Candidates are scored rather than picked outright so callers can inspect
//! confidence. The keyword heuristic scores each candidate category by the
//! keywords of its set present in the lower-cased text (base 0.1, +0.2 per
//! keyword, capped at 1.0) and normalizes the scores to sum to 1. The remote
//! backend asks the chat API for a single category name and maps it back
//! onto the candidate list. Either way the final choice is the argmax, ties
//! broken by the first-listed candidate.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::error::Result;
use crate::processors::api::ChatClient;

const SYSTEM_PROMPT: &str = "You are a precise news article classifier. \
     Always respond with exactly one category name from the provided list.";

/// Maximum input characters forwarded to the remote backend.
const MAX_REMOTE_INPUT_CHARS: usize = 2000;

/// Keyword sets for the stock categories. Unknown categories fall back to
/// their own name as the single keyword.
static CATEGORY_KEYWORDS: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        map.insert(
            "tech",
            &["technology", "ai", "software", "computer", "digital", "startup", "app"][..],
        );
        map.insert(
            "finance",
            &["money", "bank", "stock", "investment", "market", "economy", "business"][..],
        );
        map.insert(
            "health",
            &["health", "medical", "doctor", "disease", "treatment", "medicine"][..],
        );
        map.insert(
            "politics",
            &["government", "election", "policy", "president", "congress", "political"][..],
        );
        map.insert(
            "sports",
            &["sport", "game", "team", "player", "championship", "league"][..],
        );
        map.insert(
            "science",
            &["research", "study", "scientific", "discovery", "experiment"][..],
        );
        map.insert(
            "entertainment",
            &["movie", "music", "celebrity", "entertainment", "film", "show"][..],
        );
        map
    });

/// The stock candidate list used when the configuration supplies none.
pub fn default_categories() -> Vec<String> {
    [
        "tech",
        "finance",
        "health",
        "politics",
        "sports",
        "entertainment",
        "science",
        "business",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Keyword-overlap confidence scores, normalized to sum to 1.0.
///
/// Candidate order is preserved so argmax ties resolve to the first-listed
/// category.
pub fn keyword_scores(text: &str, categories: &[String]) -> Vec<(String, f64)> {
    let text_lower = text.to_lowercase();

    let mut scores: Vec<(String, f64)> = categories
        .iter()
        .map(|category| {
            let lower = category.to_lowercase();
            let mut score: f64 = 0.1;
            match CATEGORY_KEYWORDS.get(lower.as_str()) {
                Some(keywords) => {
                    for keyword in *keywords {
                        if text_lower.contains(keyword) {
                            score += 0.2;
                        }
                    }
                }
                None => {
                    if text_lower.contains(&lower) {
                        score += 0.2;
                    }
                }
            }
            (category.clone(), score.min(1.0))
        })
        .collect();

    let total: f64 = scores.iter().map(|(_, s)| s).sum();
    if total > 0.0 {
        for (_, score) in &mut scores {
            *score /= total;
        }
    }
    scores
}

/// The argmax category; ties go to the earliest entry.
pub fn best_category(scores: &[(String, f64)]) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for (category, score) in scores {
        match best {
            Some((_, best_score)) if *score <= best_score => {}
            _ => best = Some((category, *score)),
        }
    }
    best.map(|(category, _)| category.to_string())
}

/// Backend choice, fixed at construction.
pub enum CategorizerBackend {
    Remote(ChatClient),
    Heuristic,
}

pub struct ArticleCategorizer {
    backend: CategorizerBackend,
    categories: Vec<String>,
}

impl ArticleCategorizer {
    pub fn new(backend: CategorizerBackend, categories: Option<Vec<String>>) -> Self {
        Self {
            backend,
            categories: categories.unwrap_or_else(default_categories),
        }
    }

    /// Remote backend from the environment, degrading to the heuristic with
    /// a warning when no credential is configured.
    pub fn remote(categories: Option<Vec<String>>) -> Self {
        match ChatClient::from_env() {
            Some(client) => Self::new(CategorizerBackend::Remote(client), categories),
            None => {
                warn!(
                    "No API credential configured; categorizer falling back to heuristic backend"
                );
                Self::new(CategorizerBackend::Heuristic, categories)
            }
        }
    }

    pub fn heuristic(categories: Option<Vec<String>>) -> Self {
        Self::new(CategorizerBackend::Heuristic, categories)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Confidence scores for `text` across the configured candidates.
    pub async fn scores(&self, text: &str) -> Vec<(String, f64)> {
        match &self.backend {
            CategorizerBackend::Remote(client) => {
                match remote_scores(client, text, &self.categories).await {
                    Ok(scores) => scores,
                    Err(e) => {
                        warn!(error = %e, "Remote categorization failed; using keyword fallback");
                        keyword_scores(text, &self.categories)
                    }
                }
            }
            CategorizerBackend::Heuristic => keyword_scores(text, &self.categories),
        }
    }

    /// Categorize one text: the argmax over [`Self::scores`].
    pub async fn categorize(&self, text: &str) -> Option<String> {
        let scores = self.scores(text).await;
        let best = best_category(&scores);
        debug!(category = best.as_deref().unwrap_or("none"), "Categorized text");
        best
    }

    /// Categorize each text independently, preserving order.
    pub async fn categorize_batch(&self, texts: &[String]) -> Vec<Option<String>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.categorize(text).await);
        }
        results
    }
}

async fn remote_scores(
    client: &ChatClient,
    text: &str,
    categories: &[String],
) -> Result<Vec<(String, f64)>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    let list = categories.join(", ");
    let excerpt: String = text.chars().take(MAX_REMOTE_INPUT_CHARS).collect();
    let prompt = format!(
        "Classify the following article into ONE of these categories: {list}\n\n\
         Article: {excerpt}\n\n\
         Instructions:\n\
         1. Choose the MOST appropriate category from the list above\n\
         2. Return only the category name, nothing else\n\
         3. If unsure, choose the closest match\n\n\
         Category:"
    );

    let answer = client
        .complete_with_backoff(SYSTEM_PROMPT, &prompt, 50, 0.1)
        .await?
        .to_lowercase();

    let mut scores: Vec<(String, f64)> =
        categories.iter().map(|c| (c.clone(), 0.1)).collect();
    let matched = categories.iter().position(|category| {
        let lower = category.to_lowercase();
        answer.contains(&lower) || lower.contains(answer.trim())
    });
    match matched {
        Some(index) => scores[index].1 = 0.9,
        // The model answered off-list; fall back to the first candidate
        // with reduced confidence.
        None => scores[0].1 = 0.5,
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_scores_sum_to_one_and_are_non_negative() {
        let categories = candidates(&["tech", "finance", "health", "sports"]);
        let scores = keyword_scores(
            "New AI software startup raises money from a bank",
            &categories,
        );

        let total: f64 = scores.iter().map(|(_, s)| s).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(scores.iter().all(|(_, s)| *s >= 0.0));
    }

    #[test]
    fn test_keyword_scores_pick_dominant_category() {
        let categories = candidates(&["sports", "tech"]);
        let scores = keyword_scores(
            "AI software and computer technology for every startup app",
            &categories,
        );
        assert_eq!(best_category(&scores).as_deref(), Some("tech"));
    }

    #[test]
    fn test_keyword_scores_tie_breaks_to_first_listed() {
        let categories = candidates(&["health", "sports"]);
        let scores = keyword_scores("nothing relevant whatsoever", &categories);
        // All base scores: a tie, resolved to the first candidate.
        assert_eq!(best_category(&scores).as_deref(), Some("health"));
    }

    #[test]
    fn test_unknown_category_uses_its_own_name_as_keyword() {
        let categories = candidates(&["gardening", "tech"]);
        let scores = keyword_scores("a gardening column about soil", &categories);
        assert_eq!(best_category(&scores).as_deref(), Some("gardening"));
    }

    #[test]
    fn test_best_category_empty_scores() {
        assert!(best_category(&[]).is_none());
    }

    #[tokio::test]
    async fn test_heuristic_categorize() {
        let categorizer = ArticleCategorizer::heuristic(Some(candidates(&["tech", "sports"])));
        let category = categorizer
            .categorize("the championship game thrilled every player in the league")
            .await;
        assert_eq!(category.as_deref(), Some("sports"));
    }

    #[tokio::test]
    async fn test_remote_answer_mapped_onto_candidates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "Science"}}]}"#,
            )
            .create_async()
            .await;

        let client = ChatClient::new(server.url(), "key", "gpt-3.5-turbo");
        let categorizer = ArticleCategorizer::new(
            CategorizerBackend::Remote(client),
            Some(candidates(&["tech", "science"])),
        );

        let scores = categorizer.scores("a study of experiments").await;
        assert_eq!(scores[0], ("tech".to_string(), 0.1));
        assert_eq!(scores[1], ("science".to_string(), 0.9));
        assert_eq!(
            categorizer.categorize("a study of experiments").await.as_deref(),
            Some("science")
        );
    }

    #[tokio::test]
    async fn test_remote_off_list_answer_scores_first_candidate() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "underwater basket weaving"}}]}"#,
            )
            .create_async()
            .await;

        let client = ChatClient::new(server.url(), "key", "gpt-3.5-turbo");
        let categorizer = ArticleCategorizer::new(
            CategorizerBackend::Remote(client),
            Some(candidates(&["tech", "science"])),
        );

        let scores = categorizer.scores("whatever").await;
        assert_eq!(scores[0], ("tech".to_string(), 0.5));
    }

    #[tokio::test]
    async fn test_remote_failure_degrades_to_keyword_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(500)
            .with_body("down")
            .expect_at_least(1)
            .create_async()
            .await;

        let client = ChatClient::new(server.url(), "key", "gpt-3.5-turbo")
            .with_retry(0, std::time::Duration::from_millis(1));
        let categorizer = ArticleCategorizer::new(
            CategorizerBackend::Remote(client),
            Some(candidates(&["tech", "sports"])),
        );

        let scores = categorizer.scores("software and ai and apps").await;
        let total: f64 = scores.iter().map(|(_, s)| s).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(best_category(&scores).as_deref(), Some("tech"));
    }
}
