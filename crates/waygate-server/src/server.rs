//! Axum router and HTTP entry point.
//!
//! Routes:
//! - `GET /code?number=…` — issue a pairing code for the given phone number
//! - `GET /` — landing page (`main.html` from the static dir)
//! - `GET /health` — liveness + connection state
//! - fallback — static assets via `ServeDir`
//!
//! `/code` error mapping is fixed wire contract:
//! - missing/empty number → `400 {"code":"Enter Number!"}`
//! - no live connection → `500 {"code":"Service Unavailable"}`
//! - anything else → `500 {"code":"Error Generating Code"}`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{error, info};
use waygate_core::errors::GatewayError;
use waygate_runtime::GatewayService;

use crate::config::ServerConfig;

/// Served when `main.html` is missing from the static dir.
const FALLBACK_PAGE: &str = "<!doctype html><html><body>\
<h1>Waygate</h1><p>Pairing endpoint: <code>GET /code?number=&lt;phone&gt;</code></p>\
</body></html>";

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle core behind `/code` and `/health`.
    pub gateway: Arc<dyn GatewayService>,
    /// When the server started.
    pub start_time: Instant,
    /// Directory holding `main.html` and other static assets.
    pub static_dir: PathBuf,
}

impl AppState {
    /// State for a gateway serving assets out of `static_dir`.
    pub fn new(gateway: Arc<dyn GatewayService>, static_dir: PathBuf) -> Self {
        Self {
            gateway,
            start_time: Instant::now(),
            static_dir,
        }
    }
}

/// Build the Axum router with all routes.
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(state.static_dir.clone());
    Router::new()
        .route("/", get(index_handler))
        .route("/code", get(code_handler))
        .route("/health", get(health_handler))
        .fallback_service(assets)
        .with_state(state)
}

/// Bind and serve until the token is cancelled.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "http server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CodeQuery {
    number: Option<String>,
}

#[derive(Serialize)]
struct CodeResponse {
    code: String,
}

/// GET /code
async fn code_handler(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Response {
    let number = query.number.unwrap_or_default();
    match state.gateway.request_pairing_code(&number).await {
        Ok(code) => {
            info!("pairing code issued");
            (StatusCode::OK, Json(CodeResponse { code })).into_response()
        }
        Err(GatewayError::InvalidInput(_)) => code_error(StatusCode::BAD_REQUEST, "Enter Number!"),
        Err(GatewayError::Unavailable(reason)) => {
            info!(%reason, "pairing request rejected, gateway unavailable");
            code_error(StatusCode::INTERNAL_SERVER_ERROR, "Service Unavailable")
        }
        Err(e) => {
            error!(error = %e, "pairing code generation failed");
            code_error(StatusCode::INTERNAL_SERVER_ERROR, "Error Generating Code")
        }
    }
}

fn code_error(status: StatusCode, body: &str) -> Response {
    (
        status,
        Json(CodeResponse {
            code: body.to_owned(),
        }),
    )
        .into_response()
}

/// GET /
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let page = state.static_dir.join("main.html");
    match tokio::fs::read_to_string(&page).await {
        Ok(html) => Html(html),
        Err(_) => Html(FALLBACK_PAGE.to_owned()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connection: String,
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        connection: state.gateway.connection_state().to_string(),
    })
}
