use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, main_lib::AppState};

mod attributes;

const USAGE: &str = "\
Ticker Info

GET /{asset_class}/{instrument_id}

  asset_class               acao | fii | stock | etf | cripto
  info_names                comma separated attribute names (default: whole catalog)
  source                    all (default) or a single source name
  code                      trading symbol, for cripto slugs
  should_use_cache          read and update the 24h cache (default: true)
  should_clear_cached_data  drop this instrument's cache entry first
  should_delete_all_cache   drop the whole cache of the asset class first

GET /healthz
";

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(usage))
        .route("/healthz", get(healthz))
        .merge(attributes::router())
        .with_state(state)
        .layer(cors)
        .layer(timeout_layer(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

pub async fn healthz() -> &'static str {
    "ok"
}

async fn usage() -> &'static str {
    USAGE
}
