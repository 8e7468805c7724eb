use std::sync::Arc;

use crate::config::Config;
use tickerinfo_core::attributes::{AttributeService, AttributeServiceTrait};
use tickerinfo_market_data::{default_providers, EngineConfig, ResolutionEngine};
use tickerinfo_storage_file::FileCacheRepository;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub attribute_service: Arc<dyn AttributeServiceTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("TI_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    tokio::fs::create_dir_all(&config.cache_dir).await?;
    tracing::info!("Cache directory in use: {}", config.cache_dir.display());

    let providers = default_providers(config.provider_timeout);
    tracing::info!("Registered {} attribute sources", providers.len());
    let engine = Arc::new(ResolutionEngine::new(
        providers,
        EngineConfig {
            provider_timeout: config.provider_timeout,
            ..EngineConfig::default()
        },
    ));
    let cache = Arc::new(FileCacheRepository::new(config.cache_dir.clone()));
    let attribute_service: Arc<dyn AttributeServiceTrait> =
        Arc::new(AttributeService::new(engine, cache));

    Ok(Arc::new(AppState { attribute_service }))
}
