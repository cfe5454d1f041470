use crate::error::ChatError;
use crate::protocol::AgentRequest;
use crate::response::extract_display_text;
use reqwest::{Client as HttpClient, StatusCode};

pub struct ClientConfig {
    pub backend_url: String,
}

/// Posts chat requests to the agent endpoint and normalizes its replies.
#[derive(Clone)]
pub struct AgentClient {
    backend_url: String,
    http: HttpClient,
}

impl AgentClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            backend_url: normalize_backend_url(&config.backend_url),
            http: HttpClient::new(),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Sends one request and returns the text to display.
    pub async fn ask(&self, request: &AgentRequest) -> Result<String, ChatError> {
        let response = self
            .http
            .post(&self.backend_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(%status, "agent endpoint returned non-200 status");
            return Err(ChatError::Unreachable { status });
        }

        let body: serde_json::Value = response.json().await?;
        extract_display_text(body).map_err(|err| ChatError::Agent(err.0))
    }
}

fn normalize_backend_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ModelProvider;
    use serde_json::json;

    fn request() -> AgentRequest {
        AgentRequest {
            model_name: "gpt-4o-mini".to_string(),
            model_provider: ModelProvider::OpenAi,
            system_prompt: String::new(),
            messages: vec!["hello".to_string()],
            allow_search: true,
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> AgentClient {
        AgentClient::new(ClientConfig {
            backend_url: format!("{}/chat/", server.url()),
        })
    }

    #[tokio::test]
    async fn posts_wire_payload_and_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::Json(json!({
                "model_name": "gpt-4o-mini",
                "model_provider": "OpenAI",
                "system_prompt": "",
                "messages": ["hello"],
                "allow_search": true
            })))
            .with_status(200)
            .with_body(json!({"response": "hi there"}).to_string())
            .create_async()
            .await;

        let text = client_for(&server).ask(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn error_payload_becomes_agent_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(json!({"error": "Invalid model name"}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).ask(&request()).await.unwrap_err();
        assert!(matches!(err, ChatError::Agent(ref message) if message == "Invalid model name"));
    }

    #[tokio::test]
    async fn any_non_200_status_is_unreachable() {
        for status in [201, 404, 500, 502] {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("POST", "/chat")
                .with_status(status)
                .with_body(json!({"response": "should not be shown"}).to_string())
                .create_async()
                .await;

            let err = client_for(&server).ask(&request()).await.unwrap_err();
            assert!(matches!(err, ChatError::Unreachable { .. }), "status {status}");
            assert_eq!(err.to_string(), "❌ Error: Backend not reachable");
        }
    }

    #[tokio::test]
    async fn connection_failure_is_request_error() {
        let client = AgentClient::new(ClientConfig {
            backend_url: "http://127.0.0.1:9/chat".to_string(),
        });

        let err = client.ask(&request()).await.unwrap_err();
        assert!(matches!(err, ChatError::Request(_)));
        assert!(err.to_string().starts_with("Request failed: "));
    }

    #[tokio::test]
    async fn undecodable_body_is_request_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = client_for(&server).ask(&request()).await.unwrap_err();
        assert!(matches!(err, ChatError::Request(_)));
    }

    #[test]
    fn backend_url_loses_trailing_slash() {
        let client = AgentClient::new(ClientConfig {
            backend_url: " https://example.com/chat/ ".to_string(),
        });
        assert_eq!(client.backend_url(), "https://example.com/chat");
    }
}
