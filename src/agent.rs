use crate::ai_sdk::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ToolCall, ToolDefinitionApi,
    conversation_message,
};
use crate::config::{Config, ProviderEndpoint};
use crate::error::AgentError;
use crate::protocol::{AgentRequest, ModelProvider};
use crate::tools::{ToolContext, ToolDefinition, get_tools};
use reqwest::Client;

/// Upper bound on model calls for one request.
const MAX_STEPS: usize = 25;

pub struct Agent {
    client: Client,
    provider: ModelProvider,
    endpoint: ProviderEndpoint,
    model: String,
    system_prompt: Option<String>,
    tools: Vec<ToolDefinition>,
    tool_context: ToolContext,
}

impl Agent {
    pub fn new(client: Client, config: &Config, request: &AgentRequest) -> Self {
        let system_prompt = Some(request.system_prompt.trim())
            .filter(|prompt| !prompt.is_empty())
            .map(str::to_string);

        Self {
            tool_context: ToolContext {
                http: client.clone(),
                search: config.search.clone(),
            },
            client,
            provider: request.model_provider,
            endpoint: config.provider(request.model_provider).clone(),
            model: request.model_name.clone(),
            system_prompt,
            tools: get_tools(request.allow_search),
        }
    }

    pub(crate) async fn run_inference(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<ChatCompletionResponse, AgentError> {
        let api_key = self
            .endpoint
            .api_key
            .as_deref()
            .ok_or(AgentError::MissingCredential(self.provider))?;

        let tools_api: Vec<ToolDefinitionApi> = self
            .tools
            .iter()
            .map(|t| ToolDefinitionApi::function(t.name, t.description, t.input_schema.clone()))
            .collect();

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: conversation.to_vec(),
            tools: tools_api,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(AgentError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    pub(crate) async fn execute_tool(&self, call: &ToolCall) -> ChatMessage {
        let tool_def = self.tools.iter().find(|t| t.name == call.function.name);

        let content = match tool_def {
            Some(tool) => match serde_json::from_str(&call.function.arguments) {
                Ok(input) => match (tool.handler)(self.tool_context.clone(), input).await {
                    Ok(result) => result,
                    Err(e) => format!("Error: {}", e),
                },
                Err(e) => format!("Error: invalid tool arguments: {}", e),
            },
            None => "Error: tool not found".to_string(),
        };

        ChatMessage::tool_result(call.id.clone(), content)
    }

    /// Runs the tool loop over `messages` and returns the final assistant text.
    pub async fn run(&self, messages: &[String]) -> Result<String, AgentError> {
        let mut conversation: Vec<ChatMessage> = self
            .system_prompt
            .iter()
            .map(ChatMessage::system)
            .chain(messages.iter().map(ChatMessage::user))
            .collect();

        for step in 1..=MAX_STEPS {
            let response = self.run_inference(&conversation).await?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(AgentError::NoChoices)?;
            tracing::debug!(
                id = %response.id,
                step,
                finish_reason = ?choice.finish_reason,
                "model responded"
            );

            let message = choice.message;
            conversation.push(conversation_message(&message));

            if message.tool_calls.is_empty() {
                return message
                    .content
                    .filter(|text| !text.trim().is_empty())
                    .ok_or(AgentError::EmptyReply);
            }

            for call in &message.tool_calls {
                tracing::info!(tool = %call.function.name, "executing tool");
                conversation.push(self.execute_tool(call).await);
            }
        }

        Err(AgentError::StepLimit(MAX_STEPS))
    }
}
