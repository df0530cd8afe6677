//! Gateway HTTP server: Axum-based JSON API

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use shuttle_core::{ChatReply, ChatRequest, ChatService, ProviderError};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::protocol::{ApiError, ProvidersResponse, SwitchRequest, SwitchResponse};

/// Shared state for all handlers
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<ChatService>,
}

/// The gateway server
pub struct GatewayServer {
    state: GatewayState,
    bind: SocketAddr,
}

impl GatewayServer {
    /// Create a new gateway server
    pub fn new(bind: SocketAddr, service: Arc<ChatService>) -> Self {
        Self {
            state: GatewayState { service },
            bind,
        }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/chat", post(chat_handler))
            .route("/health", get(health_handler))
            .route("/providers", get(providers_handler))
            .route("/provider", put(switch_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind)
            .await
            .with_context(|| format!("Failed to bind gateway to {}", self.bind))?;
        info!(
            "Gateway listening on {} (provider: {})",
            self.bind,
            self.state.service.resolver().current_provider()
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Gateway stopped");
        Ok(())
    }

    /// Start the server in the background, returning a handle
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

// ── HTTP Handlers ──

async fn chat_handler(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    debug!(
        "POST /chat: {} messages, provider override: {:?}",
        request.messages.len(),
        request.provider
    );

    match state.service.chat(request).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            warn!("Chat request failed: {}", e);
            Err(e.into())
        }
    }
}

async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(state.service.status())
}

async fn providers_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(ProvidersResponse {
        providers: state.service.providers(),
        active: state.service.resolver().current_provider(),
    })
}

async fn switch_handler(
    State(state): State<GatewayState>,
    payload: Result<Json<SwitchRequest>, JsonRejection>,
) -> Result<Json<SwitchResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    match state.service.switch_provider(&request.provider) {
        Ok(provider) => Ok(Json(SwitchResponse { provider })),
        // The caller named a provider that cannot serve requests
        Err(e @ (ProviderError::UnknownProvider { .. } | ProviderError::NotConfigured { .. })) => {
            Err(ApiError::bad_request(e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use shuttle_core::{EchoProvider, ProviderEnv};
    use tower::ServiceExt;

    fn test_server() -> GatewayServer {
        let service = ChatService::from_env(ProviderEnv::default());
        service
            .registry()
            .register(EchoProvider::IDENTIFIER, |_| Ok(Box::new(EchoProvider::new())));
        GatewayServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(service))
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_reports_default_provider() {
        let server = test_server();
        let (status, body) = send(server.router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "provider": "groq"}));
    }

    #[tokio::test]
    async fn test_chat_with_echo_provider() {
        let server = test_server();
        let (status, body) = send(
            server.router(),
            "POST",
            "/chat",
            Some(json!({
                "messages": [{"role": "user", "content": "Two colour check please"}],
                "provider": "echo"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["reply"].as_str().unwrap().starts_with("```json"));
        assert_eq!(body["structured"]["question"], "Two colour check please");
    }

    #[tokio::test]
    async fn test_chat_unconfigured_default_is_500() {
        let server = test_server();
        let (status, body) = send(
            server.router(),
            "POST",
            "/chat",
            Some(json!({"messages": [{"role": "user", "content": "hi"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_chat_unknown_provider_is_500() {
        let server = test_server();
        let (status, body) = send(
            server.router(),
            "POST",
            "/chat",
            Some(json!({
                "messages": [{"role": "user", "content": "hi"}],
                "provider": "bogus"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Unknown provider 'bogus'"));
    }

    #[tokio::test]
    async fn test_chat_malformed_body_is_400() {
        let server = test_server();
        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_switch_provider_visible_in_health() {
        let server = test_server();
        let (status, body) = send(
            server.router(),
            "PUT",
            "/provider",
            Some(json!({"provider": "ECHO"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"provider": "echo"}));

        let (_, body) = send(server.router(), "GET", "/health", None).await;
        assert_eq!(body["provider"], "echo");

        // Default now serves chat without an override
        let (status, _) = send(
            server.router(),
            "POST",
            "/chat",
            Some(json!({"messages": [{"role": "user", "content": "hi"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_switch_unknown_provider_is_400() {
        let server = test_server();
        let (status, body) = send(
            server.router(),
            "PUT",
            "/provider",
            Some(json!({"provider": "bogus"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("bogus"));

        let (_, body) = send(server.router(), "GET", "/health", None).await;
        assert_eq!(body["provider"], "groq");
    }

    #[tokio::test]
    async fn test_providers_listing() {
        let server = test_server();
        let (status, body) = send(server.router(), "GET", "/providers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], "groq");
        let names: Vec<&str> = body["providers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["anthropic", "echo", "groq", "openai", "openrouter"]);
        let echo = &body["providers"][1];
        assert_eq!(echo["configured"], true);
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let server = test_server();
        let shutdown = CancellationToken::new();
        let handle = server.spawn(shutdown.clone());
        shutdown.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
