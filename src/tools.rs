use crate::config::SearchConfig;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

mod web_search;

pub(crate) type ToolResult = Result<String, Box<dyn std::error::Error + Send + Sync>>;

type ToolHandler =
    fn(ToolContext, serde_json::Value) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Shared resources handed to every tool invocation.
#[derive(Debug, Clone)]
pub(crate) struct ToolContext {
    pub(crate) http: Client,
    pub(crate) search: SearchConfig,
}

pub(crate) struct ToolDefinition {
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    pub(crate) input_schema: serde_json::Value,
    pub(crate) handler: ToolHandler,
}

pub(crate) fn get_tools(allow_search: bool) -> Vec<ToolDefinition> {
    let mut tools = Vec::new();
    if allow_search {
        tools.push(web_search::definition());
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_tool_only_when_allowed() {
        assert!(get_tools(false).is_empty());

        let tools = get_tools(true);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "web_search");
        assert_eq!(tools[0].input_schema["properties"]["query"]["type"], "string");
    }
}
