//! Search hits and their prompt rendering.

use serde::{Deserialize, Serialize};

/// Returned by [`format_results`] when there is nothing to show.
pub const NO_RESULTS: &str = "No search results found.";

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Snippet describing the page.
    pub body: String,
    /// Page URL.
    pub url: String,
}

/// Render hits as numbered result blocks separated by blank lines.
///
/// ```
/// use medassist_search::{SearchHit, format_results};
///
/// let hits = vec![SearchHit { title: "T".into(), body: "B".into(), url: "U".into() }];
/// assert_eq!(format_results(&hits), "[Result 1]\nTitle: T\nDescription: B\nURL: U");
/// ```
pub fn format_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[Result {}]\nTitle: {}\nDescription: {}\nURL: {}",
                i + 1,
                hit.title,
                hit.body,
                hit.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether `text` is the [`NO_RESULTS`] placeholder.
pub fn is_empty_sentinel(text: &str) -> bool {
    text == NO_RESULTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hits_render_sentinel() {
        let text = format_results(&[]);
        assert_eq!(text, "No search results found.");
        assert!(is_empty_sentinel(&text));
    }

    #[test]
    fn numbers_and_separates_results() {
        let hit = |n: &str| SearchHit {
            title: format!("Title {n}"),
            body: format!("Body {n}"),
            url: format!("https://example.org/{n}"),
        };
        let text = format_results(&[hit("a"), hit("b")]);
        assert_eq!(
            text,
            "[Result 1]\nTitle: Title a\nDescription: Body a\nURL: https://example.org/a\n\n\
             [Result 2]\nTitle: Title b\nDescription: Body b\nURL: https://example.org/b"
        );
        assert!(!is_empty_sentinel(&text));
    }
}
