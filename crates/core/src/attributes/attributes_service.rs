use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::attributes::attributes_model::{AttributeLookup, AttributeRequest, Resolution};
use crate::attributes::attributes_traits::{AttributeCacheStore, AttributeServiceTrait};
use crate::errors::{Error, Result};
use tickerinfo_market_data::{
    Attribute, AttributeRecord, FetchContext, ResolutionEngine, SourcePreference,
};

/// Answers attribute lookups from the cache first and the resolution engine
/// for whatever the cache lacks.
pub struct AttributeService {
    engine: Arc<ResolutionEngine>,
    cache: Arc<dyn AttributeCacheStore>,
}

impl AttributeService {
    pub fn new(engine: Arc<ResolutionEngine>, cache: Arc<dyn AttributeCacheStore>) -> Self {
        Self { engine, cache }
    }

    /// Completes `requested` for the instrument in `ctx`.
    ///
    /// Without the cache this is a plain engine call that never asks for a
    /// write. With it, only the attributes the cached record lacks go to the
    /// engine; a cached record that is already complete is returned without
    /// calling any source. A cache that cannot be read counts as empty.
    pub async fn resolve(
        &self,
        ctx: &mut FetchContext,
        can_use_cache: bool,
        requested: &[Attribute],
        source: SourcePreference,
    ) -> Resolution {
        if !can_use_cache {
            let record = self.engine.resolve(ctx, source, requested).await;
            return Resolution {
                should_persist: false,
                record,
            };
        }

        let cached = match self.cache.read(ctx.asset_class(), ctx.instrument_id()) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    "Failed to read cache for {} '{}': {}",
                    ctx.asset_class(),
                    ctx.instrument_id(),
                    e
                );
                None
            }
        };

        let remaining = match &cached {
            Some(record) => record.missing(requested),
            None => requested.to_vec(),
        };

        if remaining.is_empty() {
            debug!(
                "Cache hit for {} '{}', no source called",
                ctx.asset_class(),
                ctx.instrument_id()
            );
            return Resolution {
                should_persist: false,
                record: cached.unwrap_or_default(),
            };
        }

        debug!(
            "{} of {} attributes missing from cache for '{}'",
            remaining.len(),
            requested.len(),
            ctx.instrument_id()
        );

        let fresh = self.engine.resolve(ctx, source, &remaining).await;
        let should_persist = !fresh.is_empty();

        let mut record = cached.unwrap_or_default();
        record.merge(fresh);

        Resolution {
            should_persist,
            record,
        }
    }

    /// Writes `record` back, reporting whether it was stored.
    fn persist(&self, request: &AttributeRequest, record: &AttributeRecord) -> bool {
        match self
            .cache
            .write(request.asset_class, &request.instrument_id, record)
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to write cache for {} '{}': {}",
                    request.asset_class, request.instrument_id, e
                );
                false
            }
        }
    }
}

#[async_trait]
impl AttributeServiceTrait for AttributeService {
    async fn get_attributes(&self, request: AttributeRequest) -> Result<AttributeLookup> {
        debug!(
            "Lookup {} '{}' source={} use_cache={} clear={} delete_all={} attributes={:?}",
            request.asset_class,
            request.instrument_id,
            request.source,
            request.use_cache,
            request.clear_cached_data,
            request.delete_all_cache,
            request.attributes
        );

        if request.delete_all_cache {
            self.cache.clear_all(request.asset_class)?;
            info!("Cache deleted for {}", request.asset_class);
        } else if request.clear_cached_data {
            self.cache
                .clear_one(request.asset_class, &request.instrument_id)?;
            info!(
                "Cache cleared for {} '{}'",
                request.asset_class, request.instrument_id
            );
        }

        let can_use_cache = request.can_use_cache();
        let mut ctx = FetchContext::new(request.asset_class, request.instrument_id.clone())
            .with_symbol(request.symbol.clone());

        let resolution = self
            .resolve(&mut ctx, can_use_cache, &request.attributes, request.source)
            .await;

        let record = resolution.record.project(&request.attributes);
        if record.is_empty() {
            return Err(Error::NoDataFound {
                asset_class: request.asset_class,
                instrument_id: request.instrument_id,
            });
        }

        let persisted =
            can_use_cache && resolution.should_persist && self.persist(&request, &resolution.record);

        Ok(AttributeLookup {
            asset_class: request.asset_class,
            instrument_id: request.instrument_id,
            record,
            persisted,
        })
    }
}
