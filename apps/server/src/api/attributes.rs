use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tickerinfo_core::attributes::AttributeRequest;
use tickerinfo_market_data::{catalog, provider::text::parse_truthy, AssetClass, OrderedRecord};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Debug, Default, Deserialize)]
struct AttributeQuery {
    should_use_cache: Option<String>,
    should_clear_cached_data: Option<String>,
    should_delete_all_cache: Option<String>,
    source: Option<String>,
    info_names: Option<String>,
    code: Option<String>,
}

impl AttributeQuery {
    fn flag(raw: &Option<String>, default: bool) -> bool {
        raw.as_deref().map(parse_truthy).unwrap_or(default)
    }

    fn info_names(&self) -> Vec<&str> {
        self.info_names
            .as_deref()
            .map(|names| names.split(',').collect())
            .unwrap_or_default()
    }

    fn symbol(&self) -> Option<String> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
    }
}

/// Resolves the requested attributes of one instrument.
async fn get_attributes(
    State(state): State<Arc<AppState>>,
    Path((asset_class, instrument_id)): Path<(String, String)>,
    Query(query): Query<AttributeQuery>,
) -> ApiResult<Json<OrderedRecord>> {
    let asset_class: AssetClass = asset_class.parse()?;
    let attributes = catalog::parse_attributes(asset_class, &query.info_names())?;
    let source = catalog::parse_source(asset_class, query.source.as_deref())?;

    let request = AttributeRequest::new(asset_class, &instrument_id, attributes)
        .with_source(source)
        .with_symbol(query.symbol())
        .with_cache_directives(
            AttributeQuery::flag(&query.should_use_cache, true),
            AttributeQuery::flag(&query.should_clear_cached_data, false),
            AttributeQuery::flag(&query.should_delete_all_cache, false),
        );
    tracing::debug!("Attribute request: {:?}", request);

    let lookup = state.attribute_service.get_attributes(request).await?;
    tracing::info!(
        "Served {} attributes for {} '{}' (persisted: {})",
        lookup.record.len(),
        lookup.asset_class,
        lookup.instrument_id,
        lookup.persisted
    );
    Ok(Json(lookup.record))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/{asset_class}/{instrument_id}", get(get_attributes))
}
