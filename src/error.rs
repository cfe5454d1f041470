use crate::protocol::ModelProvider;
use reqwest::StatusCode;
use thiserror::Error;

/// Failures while running an agent against a model provider.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no API key configured for {0}")]
    MissingCredential(ModelProvider),

    #[error("API error: {status} - {body}")]
    Api { status: StatusCode, body: String },

    #[error("request to model provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned no choices")]
    NoChoices,

    #[error("model returned an empty reply")]
    EmptyReply,

    #[error("agent stopped after {0} steps without a final answer")]
    StepLimit(usize),
}

/// Outcome of a failed chat request, as shown to the user.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("⚠️ {0}")]
    Agent(String),

    #[error("❌ Error: Backend not reachable")]
    Unreachable { status: StatusCode },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_message_ignores_status() {
        let not_found = ChatError::Unreachable {
            status: StatusCode::NOT_FOUND,
        };
        let server_error = ChatError::Unreachable {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(not_found.to_string(), server_error.to_string());
        assert_eq!(not_found.to_string(), "❌ Error: Backend not reachable");
    }

    #[test]
    fn agent_error_is_shown_verbatim() {
        let err = ChatError::Agent("Invalid model name".to_string());
        assert_eq!(err.to_string(), "⚠️ Invalid model name");
    }

    #[test]
    fn missing_credential_names_provider() {
        let err = AgentError::MissingCredential(ModelProvider::OpenAi);
        assert_eq!(err.to_string(), "no API key configured for OpenAI");
    }
}
