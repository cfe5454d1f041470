use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Models the agent endpoint accepts, regardless of provider.
pub const ALLOWED_MODEL_NAMES: &[&str] = &[
    "llama3-70b-8192",
    "mixtral-8x7b-32768",
    "llama-3.3-70b-versatile",
    "gpt-4o-mini",
];

pub const INVALID_MODEL_MESSAGE: &str = "Invalid model name. Kindly select a valid AI model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelProvider {
    Groq,
    #[serde(rename = "OpenAI")]
    OpenAi,
}

impl ModelProvider {
    pub const ALL: [ModelProvider; 2] = [ModelProvider::Groq, ModelProvider::OpenAi];

    /// Models offered in the form for this provider.
    pub fn models(self) -> &'static [&'static str] {
        match self {
            ModelProvider::Groq => &["llama-3.3-70b-versatile", "mixtral-8x7b-32768"],
            ModelProvider::OpenAi => &["gpt-4o-mini"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelProvider::Groq => "Groq",
            ModelProvider::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model provider `{0}`, expected `Groq` or `OpenAI`")]
pub struct UnknownProvider(pub String);

impl FromStr for ModelProvider {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ModelProvider::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownProvider(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub model_name: String,
    pub model_provider: ModelProvider,
    pub system_prompt: String,
    pub messages: Vec<String>,
    pub allow_search: bool,
}

impl AgentRequest {
    pub fn is_allowed_model(&self) -> bool {
        ALLOWED_MODEL_NAMES.contains(&self.model_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_request_uses_wire_field_names() {
        let request = AgentRequest {
            model_name: "llama-3.3-70b-versatile".to_string(),
            model_provider: ModelProvider::Groq,
            system_prompt: "Act as an AI chatbot who is smart and friendly".to_string(),
            messages: vec!["What is 2+2?".to_string()],
            allow_search: false,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model_name": "llama-3.3-70b-versatile",
                "model_provider": "Groq",
                "system_prompt": "Act as an AI chatbot who is smart and friendly",
                "messages": ["What is 2+2?"],
                "allow_search": false
            })
        );
    }

    #[test]
    fn openai_provider_keeps_vendor_spelling() {
        let value = serde_json::to_value(ModelProvider::OpenAi).unwrap();
        assert_eq!(value, json!("OpenAI"));

        let parsed: ModelProvider = serde_json::from_value(json!("OpenAI")).unwrap();
        assert_eq!(parsed, ModelProvider::OpenAi);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let result = serde_json::from_value::<AgentRequest>(json!({
            "model_name": "gpt-4o-mini",
            "model_provider": "Anthropic",
            "system_prompt": "",
            "messages": ["hi"],
            "allow_search": false
        }));
        assert!(result.is_err());

        let err = "Anthropic".parse::<ModelProvider>().unwrap_err();
        assert_eq!(err, UnknownProvider("Anthropic".to_string()));
    }

    #[test]
    fn provider_parse_ignores_case() {
        assert_eq!("groq".parse::<ModelProvider>().unwrap(), ModelProvider::Groq);
        assert_eq!("openai".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAi);
    }

    #[test]
    fn form_models_are_all_allowed() {
        for provider in ModelProvider::ALL {
            for model in provider.models() {
                assert!(ALLOWED_MODEL_NAMES.contains(model), "{model} not allowed");
            }
        }
    }
}
