//! HTTP server mode for REST access to the tools

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::tools::{list_tools, ToolDispatcher};

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router serving tool calls through `dispatcher`
pub fn router(dispatcher: ToolDispatcher) -> Router {
    // Allow all origins for local automation front ends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(tools))
        .route("/tools/:name", post(call_tool))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Start the HTTP server
pub async fn serve(dispatcher: ToolDispatcher, port: u16) -> Result<()> {
    let app = router(dispatcher);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// List tool definitions
async fn tools() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success(json!({ "tools": list_tools() }))),
    )
}

/// Invoke one tool; the body is the arguments object
async fn call_tool(
    State(dispatcher): State<ToolDispatcher>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let arguments = body.map_or_else(|| json!({}), |Json(v)| v);
    if !arguments.is_object() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("arguments must be a JSON object")),
        )
            .into_response();
    }

    let output = dispatcher.call(&name, &arguments).await;
    if output.is_error {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<()>::error(output.text)),
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            Json(ApiResponse::success(json!({ "text": output.text }))),
        )
            .into_response()
    }
}
