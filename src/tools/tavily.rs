//! Tavily search, tuned for recent web content

use super::{send_checked, Tool, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const ENDPOINT: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

pub struct TavilyTool {
    client: Client,
    api_key: String,
}

impl TavilyTool {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl Tool for TavilyTool {
    fn name(&self) -> &'static str {
        "tavily"
    }

    fn description(&self) -> String {
        "Use for summarizing recent web results about drug guidance and health risks.".to_string()
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let request = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": query,
                "max_results": MAX_RESULTS,
                "search_depth": "basic",
                "topic": "general",
                "include_answer": true,
            }));

        let response: TavilyResponse = send_checked("tavily", request).await?.json().await?;
        Ok(format_results(&response))
    }
}

fn format_results(response: &TavilyResponse) -> String {
    let mut parts = Vec::new();

    if let Some(answer) = response.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        parts.push(format!("Answer: {}", answer.trim()));
    }

    for result in &response.results {
        parts.push(format!(
            "{} ({})\n{}",
            result.title,
            result.url,
            result.content.trim()
        ));
    }

    if parts.is_empty() {
        "No recent web results found".to_string()
    } else {
        parts.join("\n\n")
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}
