//! Axum server for the chat endpoint

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use cascade_core::{FallbackRouter, GatewayConfig, OrchestrationResult};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::protocol::{
    ChatReply, HealthReport, INVALID_REQUEST, ProviderStatus, parse_chat_request,
};

/// Shared, read-only state for all handlers
pub struct AppState {
    pub router: FallbackRouter,
    /// Shown to users when every provider failed
    pub failure_message: String,
}

/// Build the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<ChatReply>) {
    let Some(prompt) = parse_chat_request(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatReply::message(INVALID_REQUEST)),
        );
    };

    match state.router.route(&prompt).await {
        OrchestrationResult::Success { text, provider } => {
            (StatusCode::OK, Json(ChatReply::answered(text, provider)))
        }
        OrchestrationResult::AllFailed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatReply::message(state.failure_message.clone())),
        ),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let providers = state
        .router
        .providers()
        .iter()
        .map(|p| ProviderStatus {
            name: p.name().to_string(),
            enabled: p.is_enabled(),
        })
        .collect();

    Json(HealthReport {
        status: "ok".to_string(),
        providers,
    })
}

/// Gateway bound to a configured address
pub struct GatewayServer {
    state: Arc<AppState>,
    bind: String,
}

impl GatewayServer {
    pub fn new(router: FallbackRouter, config: &GatewayConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                router,
                failure_message: config.failure_message.clone(),
            }),
            bind: config.bind.clone(),
        }
    }

    /// Override the bind address
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.bind)
            .await
            .with_context(|| format!("Failed to bind gateway to {}", self.bind))?;
        let addr = listener.local_addr().context("Failed to read bound address")?;

        let enabled = self
            .state
            .router
            .providers()
            .iter()
            .filter(|p| p.is_enabled())
            .count();
        if enabled == 0 {
            warn!("No provider has an API key; every chat request will fail");
        }
        info!(
            "Gateway listening on http://{} ({} of {} providers enabled)",
            addr,
            enabled,
            self.state.router.len()
        );

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("Gateway server error")?;

        info!("Gateway stopped");
        Ok(())
    }
}
