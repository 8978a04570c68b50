//! Error types for web search.

use thiserror::Error;

/// Failures while querying the search API.
///
/// [`WebSearch::search`](crate::WebSearch::search) logs these and returns
/// no results; [`WebSearch::try_search`](crate::WebSearch::try_search)
/// surfaces them.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request could not be sent or timed out.
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("search API returned status {0}")]
    Status(u16),

    /// The response body was not the expected JSON.
    #[error("failed to decode search response: {0}")]
    Decode(String),
}
