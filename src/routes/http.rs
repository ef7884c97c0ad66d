// GET handlers: report, version

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use tracing::error;

use super::AppState;
use crate::models::Report;

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /: samples every monitor and returns the report. A serialization failure is
/// reported in the body's `error` field instead of as a transport error.
pub(super) async fn report_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.monitor.report().await;
    let body = serde_json::to_string(&report).unwrap_or_else(|e| {
        error!(error = %e, "Unable to serialize report");
        serde_json::to_string(&Report::from_error(e.to_string())).unwrap_or_default()
    });
    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
