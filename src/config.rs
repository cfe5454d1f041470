use crate::protocol::ModelProvider;

pub const DEFAULT_BACKEND_URL: &str = "https://chatbot-backend-3zui.onrender.com/chat";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const SEARCH_MAX_RESULTS: u32 = 2;

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_results: u32,
}

/// Settings the agent endpoint needs, read once at startup.
///
/// Credentials are not checked here; a missing key only fails the request
/// that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq: ProviderEndpoint,
    pub openai: ProviderEndpoint,
    pub search: SearchConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            groq: ProviderEndpoint {
                base_url: env_or("GROQ_BASE_URL", GROQ_BASE_URL),
                api_key: env_opt("GROQ_API_KEY"),
            },
            openai: ProviderEndpoint {
                base_url: env_or("OPENAI_BASE_URL", OPENAI_BASE_URL),
                api_key: env_opt("OPENAI_API_KEY"),
            },
            search: SearchConfig {
                base_url: env_or("TAVILY_BASE_URL", TAVILY_BASE_URL),
                api_key: env_opt("TAVILY_API_KEY"),
                max_results: SEARCH_MAX_RESULTS,
            },
        }
    }

    pub fn provider(&self, provider: ModelProvider) -> &ProviderEndpoint {
        match provider {
            ModelProvider::Groq => &self.groq,
            ModelProvider::OpenAi => &self.openai,
        }
    }

    /// Points every upstream at one base URL, for tests against a mock server.
    #[cfg(test)]
    pub fn for_base_url(base_url: &str) -> Self {
        let endpoint = ProviderEndpoint {
            base_url: base_url.to_string(),
            api_key: Some("test-key".to_string()),
        };
        Self {
            groq: endpoint.clone(),
            openai: endpoint,
            search: SearchConfig {
                base_url: base_url.to_string(),
                api_key: Some("tvly-test".to_string()),
                max_results: SEARCH_MAX_RESULTS,
            },
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key)
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.to_string())
}
