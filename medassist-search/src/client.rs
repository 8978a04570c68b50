//! DuckDuckGo instant-answer client.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::format::{SearchHit, format_results};

/// DuckDuckGo instant-answer endpoint.
pub const DUCKDUCKGO_API: &str = "https://api.duckduckgo.com/";

/// Web search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned per query.
    pub max_results: usize,
    /// API endpoint.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 3, base_url: DUCKDUCKGO_API.to_string(), timeout_secs: 15 }
    }
}

/// Supplementary web search.
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    base_url: String,
}

impl WebSearch {
    /// Create a client from settings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Request`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, base_url: config.base_url.clone() })
    }

    /// Up to `max_results` hits for `query`.
    ///
    /// Never fails: errors are logged and yield an empty vector.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        match self.try_search(query, max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "web search failed");
                Vec::new()
            }
        }
    }

    /// Like [`search`](Self::search) but surfaces failures.
    pub async fn try_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if max_results == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let payload: Value =
            serde_json::from_str(&text).map_err(|e| SearchError::Decode(e.to_string()))?;

        let mut hits = parse_instant_answer(&payload);
        dedupe_by_url(&mut hits);
        hits.truncate(max_results);
        debug!(hit_count = hits.len(), "web search completed");
        Ok(hits)
    }

    /// Search and render the hits with [`format_results`].
    pub async fn search_and_format(&self, query: &str, max_results: usize) -> String {
        format_results(&self.search(query, max_results).await)
    }
}

/// Collect the abstract, direct results, and related topics, in that order.
fn parse_instant_answer(payload: &Value) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    let abstract_text = payload.get("AbstractText").and_then(Value::as_str).unwrap_or("");
    let abstract_url = payload.get("AbstractURL").and_then(Value::as_str).unwrap_or("");
    if !abstract_text.is_empty() && !abstract_url.is_empty() {
        let heading = payload.get("Heading").and_then(Value::as_str).unwrap_or("");
        let title = if heading.is_empty() { title_of(abstract_text) } else { heading };
        hits.push(SearchHit {
            title: title.to_string(),
            body: abstract_text.to_string(),
            url: abstract_url.to_string(),
        });
    }

    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = payload.get(key).and_then(Value::as_array) {
            collect_topics(items, &mut hits);
        }
    }

    hits
}

/// Topics may be nested one level under `Topics` groups.
fn collect_topics(items: &[Value], hits: &mut Vec<SearchHit>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(Value::as_array) {
            collect_topics(topics, hits);
            continue;
        }
        let text = item.get("Text").and_then(Value::as_str).unwrap_or("");
        let url = item.get("FirstURL").and_then(Value::as_str).unwrap_or("");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        hits.push(SearchHit {
            title: title_of(text).to_string(),
            body: text.to_string(),
            url: url.to_string(),
        });
    }
}

fn title_of(text: &str) -> &str {
    text.split(" - ").next().unwrap_or(text)
}

fn dedupe_by_url(hits: &mut Vec<SearchHit>) {
    let mut seen = HashSet::new();
    hits.retain(|hit| seen.insert(hit.url.clone()));
}
