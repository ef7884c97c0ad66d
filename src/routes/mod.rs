// HTTP routes: the sampled report and build identity

mod http;

use axum::{Router, http::HeaderValue, routing::get};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::monitor::SystemMonitor;

const ANY: &str = "*";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) monitor: Arc<SystemMonitor>,
}

pub fn app(monitor: Arc<SystemMonitor>, cors: Option<&CorsConfig>) -> anyhow::Result<Router> {
    let state = AppState { monitor };
    let router = Router::new()
        .route("/", get(http::report_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .with_state(state);
    Ok(match cors {
        Some(cors) => router.layer(cors_layer(cors)?),
        None => router,
    })
}

fn cors_layer(cors: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let origin = if cors.origin == ANY {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(HeaderValue::from_str(&cors.origin)?)
    };
    let methods = if cors.methods == ANY {
        AllowMethods::any()
    } else {
        let methods = split_list(&cors.methods)
            .map(|m| m.parse())
            .collect::<Result<Vec<axum::http::Method>, _>>()?;
        AllowMethods::list(methods)
    };
    let headers = if cors.headers == ANY {
        AllowHeaders::any()
    } else {
        let headers = split_list(&cors.headers)
            .map(|h| h.parse())
            .collect::<Result<Vec<axum::http::HeaderName>, _>>()?;
        AllowHeaders::list(headers)
    };
    tracing::info!(origin = %cors.origin, methods = %cors.methods, headers = %cors.headers, "CORS enabled");
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
