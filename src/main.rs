mod agent;
mod ai_sdk;
mod client;
mod config;
mod error;
mod protocol;
mod response;
mod server;
mod tools;
mod ui;

use clap::{Parser, Subcommand};
use client::{AgentClient, ClientConfig};
use config::{Config, DEFAULT_BACKEND_URL, DEFAULT_LISTEN};
use protocol::{AgentRequest, ModelProvider};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Chat with hosted LLM agents, optionally backed by web search")]
struct Cli {
    /// Agent endpoint used by `chat` and `ask`.
    #[arg(long, global = true, env = "BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the agent endpoint.
    Serve {
        #[arg(long, env = "AGENT_LISTEN", default_value = DEFAULT_LISTEN)]
        listen: String,
    },
    /// Open the chat form (default).
    Chat,
    /// Send a single query and print the agent's reply.
    Ask {
        #[arg(long, default_value = "Groq")]
        provider: ModelProvider,
        /// Defaults to the provider's first model.
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value = "")]
        system_prompt: String,
        /// Let the agent search the web.
        #[arg(long)]
        search: bool,
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let backend_url = cli.backend_url;
    let command = cli.command.unwrap_or(Command::Chat);

    init_tracing(match command {
        Command::Serve { .. } => "info",
        Command::Ask { .. } => "warn",
        // Log lines would tear the inline form.
        Command::Chat => "off",
    });

    match command {
        Command::Serve { listen } => {
            server::run(server::ServerConfig { listen }, Config::from_env()).await
        }
        Command::Chat => {
            let client = AgentClient::new(ClientConfig { backend_url });
            tokio::task::block_in_place(|| ui::run_tui(client))
        }
        Command::Ask {
            provider,
            model,
            system_prompt,
            search,
            query,
        } => {
            let client = AgentClient::new(ClientConfig { backend_url });
            let request = AgentRequest {
                model_name: model.unwrap_or_else(|| provider.models()[0].to_string()),
                model_provider: provider,
                system_prompt,
                messages: vec![query],
                allow_search: search,
            };
            let text = client.ask(&request).await?;
            println!("{}", text);
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_parses_provider_and_flags() {
        let cli = Cli::try_parse_from([
            "agent-chat",
            "ask",
            "--provider",
            "openai",
            "--search",
            "--backend-url",
            "http://localhost:8000/chat",
            "What is 2+2?",
        ])
        .unwrap();

        assert_eq!(cli.backend_url, "http://localhost:8000/chat");
        match cli.command {
            Some(Command::Ask {
                provider,
                model,
                search,
                query,
                ..
            }) => {
                assert_eq!(provider, ModelProvider::OpenAi);
                assert_eq!(model, None);
                assert!(search);
                assert_eq!(query, "What is 2+2?");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn chat_takes_backend_url_flag() {
        let cli = Cli::try_parse_from([
            "agent-chat",
            "chat",
            "--backend-url",
            "http://localhost:8000/chat",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::Chat)));
        assert_eq!(cli.backend_url, "http://localhost:8000/chat");
    }

    #[test]
    fn no_subcommand_uses_env_or_default_backend() {
        let cli = Cli::try_parse_from(["agent-chat"]).unwrap();

        let expected =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        assert!(cli.command.is_none());
        assert_eq!(cli.backend_url, expected);
    }

    #[test]
    fn ask_rejects_unknown_provider() {
        let result = Cli::try_parse_from(["agent-chat", "ask", "--provider", "Mistral", "hi"]);
        assert!(result.is_err());
    }
}
