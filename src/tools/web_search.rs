use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use super::{ToolContext, ToolDefinition, ToolResult};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct WebSearchInput {
    #[schemars(description = "The search query to look up on the web.")]
    query: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchHit {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

async fn web_search_impl(context: ToolContext, input: serde_json::Value) -> ToolResult {
    let input: WebSearchInput = serde_json::from_value(input)?;
    if input.query.trim().is_empty() {
        return Err("query must not be empty".into());
    }

    let api_key = context
        .search
        .api_key
        .as_deref()
        .ok_or("TAVILY_API_KEY environment variable not set")?;

    let response = context
        .http
        .post(format!("{}/search", context.search.base_url))
        .bearer_auth(api_key)
        .json(&SearchRequest {
            query: &input.query,
            max_results: context.search.max_results,
        })
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Search error: {} - {}", status, body).into());
    }

    let body: SearchResponse = response.json().await?;
    serde_json::to_string(&body.results).map_err(|e| e.into())
}

pub(crate) fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "web_search",
        description: "Search the web for current information. Returns the top results with their title, URL and a content snippet.",
        input_schema: serde_json::to_value(schema_for!(WebSearchInput))
            .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
        handler: |context, input| Box::pin(web_search_impl(context, input)),
    }
}
