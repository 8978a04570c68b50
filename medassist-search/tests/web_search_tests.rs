//! Tests for the web search client against a mock server.

use medassist_search::{NO_RESULTS, SearchConfig, WebSearch};
use mockito::{Matcher, Server};
use serde_json::json;

fn client(base_url: &str) -> WebSearch {
    WebSearch::new(&SearchConfig { base_url: base_url.to_string(), ..SearchConfig::default() })
        .unwrap()
}

fn payload() -> String {
    json!({
        "Heading": "Influenza",
        "AbstractText": "Influenza is a contagious respiratory illness.",
        "AbstractURL": "https://en.wikipedia.org/wiki/Influenza",
        "RelatedTopics": [
            {"Text": "Flu vaccine - yearly shot", "FirstURL": "https://duckduckgo.com/Flu_vaccine"},
            {"Text": "Common cold - viral infection", "FirstURL": "https://duckduckgo.com/Common_cold"},
            {"Text": "Fever - body temperature", "FirstURL": "https://duckduckgo.com/Fever"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn returns_at_most_max_results_in_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "flu symptoms".into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
        ]))
        .with_status(200)
        .with_body(payload())
        .create_async()
        .await;

    let hits = client(&format!("{}/", server.url())).search("flu symptoms", 3).await;

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].title, "Influenza");
    assert_eq!(hits[1].title, "Flu vaccine");
    assert_eq!(hits[2].url, "https://duckduckgo.com/Common_cold");
    mock.assert_async().await;
}

#[tokio::test]
async fn formats_hits_for_the_prompt() {
    let mut server = Server::new_async().await;
    server.mock("GET", Matcher::Any).with_status(200).with_body(payload()).create_async().await;

    let text = client(&server.url()).search_and_format("flu", 1).await;
    assert_eq!(
        text,
        "[Result 1]\nTitle: Influenza\nDescription: Influenza is a contagious respiratory illness.\n\
         URL: https://en.wikipedia.org/wiki/Influenza"
    );
}

#[tokio::test]
async fn server_error_degrades_to_no_results() {
    let mut server = Server::new_async().await;
    server.mock("GET", Matcher::Any).with_status(500).create_async().await;

    let search = client(&server.url());
    assert!(search.search("anything", 3).await.is_empty());
    assert_eq!(search.search_and_format("anything", 3).await, NO_RESULTS);
    assert!(search.try_search("anything", 3).await.is_err());
}

#[tokio::test]
async fn malformed_body_degrades_to_no_results() {
    let mut server = Server::new_async().await;
    server.mock("GET", Matcher::Any).with_status(200).with_body("<html>").create_async().await;

    assert!(client(&server.url()).search("anything", 3).await.is_empty());
}

#[tokio::test]
async fn zero_max_results_skips_the_request() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    assert!(client(&server.url()).search("flu", 0).await.is_empty());
    mock.assert_async().await;
}
