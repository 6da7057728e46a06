//! Google Programmable Search (Custom Search JSON API)

use super::{send_checked, Tool, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
/// The API caps `num` at 10
const MAX_RESULTS: u8 = 10;

pub struct GoogleSearchTool {
    client: Client,
    api_key: String,
    cse_id: String,
}

impl GoogleSearchTool {
    pub fn new(client: Client, api_key: String, cse_id: String) -> Self {
        Self {
            client,
            api_key,
            cse_id,
        }
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &'static str {
        "google_search"
    }

    fn description(&self) -> String {
        "Use for searching the web for drug safety, symptoms, and health advice".to_string()
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let num = MAX_RESULTS.to_string();
        let request = self.client.get(ENDPOINT).query(&[
            ("key", self.api_key.as_str()),
            ("cx", self.cse_id.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ]);

        let response: SearchResponse = send_checked("google_search", request)
            .await?
            .json()
            .await?;
        Ok(format_results(&response))
    }
}

fn format_results(response: &SearchResponse) -> String {
    let snippets: Vec<String> = response
        .items
        .iter()
        .filter_map(|item| {
            item.snippet
                .as_ref()
                .map(|snippet| format!("{} ({})\n{}", item.title, item.link, snippet.trim()))
        })
        .collect();

    if snippets.is_empty() {
        "No good Google Search Result was found".to_string()
    } else {
        snippets.join("\n\n")
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Absent when the search has no hits
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}
