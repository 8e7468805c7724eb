//! Request-scoped state shared by every adapter call of one resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::AssetClass;

/// Everything an adapter needs to know about the instrument being resolved,
/// plus a page memo shared across the adapters of a single resolution.
///
/// Created by the caller for one request and dropped afterwards; nothing in
/// here outlives the resolution. When one source already downloaded a page
/// another source also parses (the CVM lookup reads the Investidor10 company
/// page, for instance), the second source reuses it instead of fetching again.
#[derive(Debug, Clone)]
pub struct FetchContext {
    asset_class: AssetClass,
    instrument_id: String,
    symbol: Option<String>,
    pages: HashMap<String, Arc<str>>,
}

impl FetchContext {
    /// `instrument_id` is expected to be normalized already
    /// (see [`AssetClass::normalize_id`]).
    pub fn new(asset_class: AssetClass, instrument_id: impl Into<String>) -> Self {
        Self {
            asset_class,
            instrument_id: instrument_id.into(),
            symbol: None,
            pages: HashMap::new(),
        }
    }

    /// Sets the trading symbol (e.g. `BTC` for the `bitcoin` slug).
    pub fn with_symbol(mut self, symbol: Option<String>) -> Self {
        self.symbol = symbol
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    /// Trading symbol, falling back to the upper-cased identifier.
    pub fn symbol(&self) -> String {
        self.symbol
            .clone()
            .unwrap_or_else(|| self.instrument_id.to_uppercase())
    }

    pub fn cached_page(&self, url: &str) -> Option<Arc<str>> {
        self.pages.get(url).cloned()
    }

    pub fn remember_page(&mut self, url: impl Into<String>, body: Arc<str>) {
        self.pages.insert(url.into(), body);
    }

    pub fn cached_page_count(&self) -> usize {
        self.pages.len()
    }
}
