//! HTTP trigger for sync cycles.
//!
//! `POST /api/sync` runs one full cycle per request and answers with the
//! aggregate result. Requests must carry the configured `x-api-key`.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::SyncResultOf;
use crate::sync::{Orchestrator, orchestrator_from_config};

/// Builds a fresh orchestrator (and so a fresh row cache) for each request.
pub type CycleFactory = Arc<dyn Fn() -> SyncResultOf<Orchestrator> + Send + Sync>;

pub const API_KEY_HEADER: &str = "x-api-key";

/// State shared across handlers.
#[derive(Clone)]
pub struct TriggerServer {
    api_key: Arc<str>,
    production: bool,
    factory: CycleFactory,
}

impl TriggerServer {
    pub fn new(api_key: impl Into<Arc<str>>, production: bool, factory: CycleFactory) -> Self {
        Self {
            api_key: api_key.into(),
            production,
            factory,
        }
    }

    /// Server whose cycles are wired from `config` on every request.
    pub fn from_config(config: &Config) -> SyncResultOf<Self> {
        config.validate_for_server()?;
        let api_key = config.server.api_key.clone().unwrap_or_default();
        let cycle_config = Arc::new(config.clone());
        let factory: CycleFactory = Arc::new(move || orchestrator_from_config(&cycle_config));
        Ok(Self::new(api_key, config.server.production, factory))
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|key| !self.api_key.is_empty() && key == &*self.api_key)
    }
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn trigger_sync(State(state): State<TriggerServer>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        warn!("Rejected sync trigger without a valid API key");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    let outcome = match (state.factory)() {
        Ok(orchestrator) => orchestrator.run().await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => Json(json!({
            "status": "success",
            "timestamp": Utc::now().to_rfc3339(),
            "result": result,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Sync cycle could not run");
            let mut body = json!({
                "status": "error",
                "message": e.to_string(),
                "code": e.kind(),
            });
            if !state.production {
                body["detail"] = json!(format!("{:?}", e));
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

pub fn build_router(state: TriggerServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/sync", post(trigger_sync))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve in the background.
///
/// Returns a sender that stops the server and the bound address.
pub async fn start_server(
    state: TriggerServer,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Sync trigger listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Sync trigger shutting down");
            })
            .await
        {
            error!("Sync trigger server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
