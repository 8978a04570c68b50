//! # medassist-search
//!
//! Optional web search that supplements knowledge-base answers.
//!
//! [`WebSearch`] queries the DuckDuckGo instant-answer API and returns
//! [`SearchHit`]s; [`format_results`] renders them for a prompt, or the
//! [`NO_RESULTS`] placeholder when there are none. Search failures never
//! reach the caller of [`WebSearch::search`]; they are logged and treated as
//! "no results".
//!
//! ```rust,no_run
//! use medassist_search::{SearchConfig, WebSearch};
//!
//! # async fn run() -> Result<(), medassist_search::SearchError> {
//! let search = WebSearch::new(&SearchConfig::default())?;
//! let text = search.search_and_format("flu symptoms", 3).await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod format;

pub use client::{DUCKDUCKGO_API, SearchConfig, WebSearch};
pub use error::SearchError;
pub use format::{NO_RESULTS, SearchHit, format_results, is_empty_sentinel};
