//! Wikipedia lookup: search titles, then fetch their intro extracts

use super::{send_checked, truncate_output, Tool, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const TOP_K: usize = 10;
const MAX_CHARS: usize = 4_000;

pub struct WikipediaTool {
    client: Client,
}

impl WikipediaTool {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let limit = TOP_K.to_string();
        let request = self.client.get(ENDPOINT).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let response: SearchResponse = send_checked("wiki", request).await?.json().await?;
        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn fetch_extracts(&self, titles: &[String]) -> Result<Vec<Page>, ToolError> {
        let joined = titles.join("|");
        let limit = TOP_K.to_string();
        let request = self.client.get(ENDPOINT).query(&[
            ("action", "query"),
            ("prop", "extracts"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("exlimit", limit.as_str()),
            ("redirects", "1"),
            ("titles", joined.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let response: ExtractResponse = send_checked("wiki", request).await?.json().await?;
        Ok(response.query.map(|q| q.pages).unwrap_or_default())
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &'static str {
        "wiki"
    }

    fn description(&self) -> String {
        "Use for background and encyclopedic information on drugs or conditions".to_string()
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let titles = self.search_titles(query).await?;
        if titles.is_empty() {
            return Ok("No good Wikipedia Search Result was found".to_string());
        }
        let pages = self.fetch_extracts(&titles).await?;
        Ok(format_pages(&titles, &pages))
    }
}

/// Pages in search-rank order, skipping any without an extract
fn format_pages(titles: &[String], pages: &[Page]) -> String {
    let summaries: Vec<String> = titles
        .iter()
        .filter_map(|title| pages.iter().find(|p| &p.title == title))
        .filter_map(|page| {
            page.extract
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(|extract| format!("Page: {}\nSummary: {}", page.title, extract))
        })
        .collect();

    if summaries.is_empty() {
        return "No good Wikipedia Search Result was found".to_string();
    }
    truncate_output(&summaries.join("\n\n"), MAX_CHARS)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_pages_keeps_search_rank() {
        let titles = vec!["Amlodipine".to_string(), "Ibuprofen".to_string()];
        let response: ExtractResponse = serde_json::from_value(json!({
            "query": {"pages": [
                {"pageid": 2, "title": "Ibuprofen", "extract": "Ibuprofen is an NSAID."},
                {"pageid": 1, "title": "Amlodipine", "extract": "Amlodipine treats hypertension.\n"}
            ]}
        }))
        .unwrap();
        let pages = response.query.unwrap().pages;

        assert_eq!(
            format_pages(&titles, &pages),
            "Page: Amlodipine\nSummary: Amlodipine treats hypertension.\n\n\
             Page: Ibuprofen\nSummary: Ibuprofen is an NSAID."
        );
    }

    #[test]
    fn test_format_pages_caps_length() {
        let titles = vec!["Long".to_string()];
        let pages = vec![Page {
            title: "Long".to_string(),
            extract: Some("x".repeat(10_000)),
        }];
        let text = format_pages(&titles, &pages);
        assert!(text.chars().count() <= MAX_CHARS + "\n[truncated]".len());
        assert!(text.ends_with("[truncated]"));
    }

    #[test]
    fn test_search_response_without_hits() {
        let response: SearchResponse =
            serde_json::from_value(json!({"batchcomplete": true})).unwrap();
        assert!(response.query.is_none());
    }
}
