//! Serper.dev Google search

use super::{send_checked, Tool, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const ENDPOINT: &str = "https://google.serper.dev/search";
const MAX_RESULTS: usize = 10;

pub struct SerperTool {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SerperTool {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl Tool for SerperTool {
    fn name(&self) -> &'static str {
        "serper"
    }

    fn description(&self) -> String {
        "Useful for general medical and drug related search queries".to_string()
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": MAX_RESULTS }));

        let response: SerperResponse = send_checked("serper", request).await?.json().await?;
        Ok(format_results(&response))
    }
}

fn format_results(response: &SerperResponse) -> String {
    let mut snippets = Vec::new();

    if let Some(answer_box) = &response.answer_box {
        if let Some(answer) = answer_box.answer.as_ref().or(answer_box.snippet.as_ref()) {
            snippets.push(answer.clone());
        }
    }

    if let Some(graph) = &response.knowledge_graph {
        if let Some(description) = &graph.description {
            match &graph.title {
                Some(title) => snippets.push(format!("{title}: {description}")),
                None => snippets.push(description.clone()),
            }
        }
    }

    for result in response.organic.iter().take(MAX_RESULTS) {
        if let Some(snippet) = &result.snippet {
            snippets.push(format!("{} ({})\n{}", result.title, result.link, snippet));
        }
    }

    if snippets.is_empty() {
        "No good Google Search Result was found".to_string()
    } else {
        snippets.join("\n\n")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraph {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}
