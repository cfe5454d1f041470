use crate::agent::Agent;
use crate::config::Config;
use crate::protocol::{AgentRequest, ErrorPayload, INVALID_MODEL_MESSAGE};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Client;
use std::error::Error;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct ServerConfig {
    pub listen: String,
}

struct ServerState {
    http: Client,
    config: Config,
}

type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub async fn run(server: ServerConfig, config: Config) -> ServerResult<()> {
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&server.listen).await?;
    tracing::info!("agent endpoint listening on http://{}/chat", server.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(config: Config) -> Router {
    let state = Arc::new(ServerState {
        http: Client::new(),
        config,
    });

    Router::new()
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("rejected chat request: {}", rejection.body_text());
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorPayload::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    tracing::info!(
        model = %request.model_name,
        provider = %request.model_provider,
        allow_search = request.allow_search,
        "chat request"
    );

    if !request.is_allowed_model() {
        return Json(ErrorPayload::new(INVALID_MODEL_MESSAGE)).into_response();
    }

    let agent = Agent::new(state.http.clone(), &state.config, &request);
    match agent.run(&request.messages).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => {
            tracing::error!("agent failed: {}", err);
            (StatusCode::BAD_GATEWAY, Json(ErrorPayload::new(err.to_string()))).into_response()
        }
    }
}
