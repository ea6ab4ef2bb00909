use axum::response::{IntoResponse, Response};
use http::header;

use crate::error::AppError;

/// Static welcome text.
pub async fn welcome() -> &'static str {
    "Welcome! Use /op with query params."
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    let body = sonic_rs::to_string(&sonic_rs::json!({ "status": "ok" }))
        .unwrap_or_else(|_| r#"{"status":"ok"}"#.to_string());

    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Turns a handler panic into the generic error page.
pub fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
