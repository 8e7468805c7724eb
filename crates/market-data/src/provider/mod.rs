//! Attribute provider abstractions and implementations.
//!
//! This module contains:
//! - The `AttributeProvider` trait that all source adapters implement
//! - Provider capabilities
//! - The request-scoped `FetchContext` and the shared `PageClient`
//! - Text and JSON extraction helpers
//! - Concrete adapters (StockAnalysis, Investidor10, Fundamentus, CVM,
//!   BM&FBovespa, FIIs, Funds Explorer, Binance, CoinMarketCap)
//!
//! # Architecture
//!
//! Adapters are thin: they download one or more pages through the
//! [`PageClient`], then map every requested [`Attribute`] to a value with a
//! `match`. Parsing lives in plain functions over `&str` so it can be tested
//! against fixture snippets without the network.

mod capabilities;
mod context;
mod http;
pub(crate) mod json;
pub mod text;
mod traits;

pub mod binance;
pub mod bmfbovespa;
pub mod coinmarketcap;
pub mod cvm;
pub mod fiis;
pub mod fundamentus;
pub mod fundsexplorer;
pub mod investidor10;
pub mod stockanalysis;

use std::sync::Arc;
use std::time::Duration;

use crate::models::{Attribute, AttributeRecord, AttributeValue};

// Re-exports
pub use capabilities::ProviderCapabilities;
pub use context::FetchContext;
pub use http::PageClient;
pub use traits::AttributeProvider;

/// Builds a record holding one key per requested attribute.
pub(crate) fn record_from(
    attributes: &[Attribute],
    mut extract: impl FnMut(Attribute) -> AttributeValue,
) -> AttributeRecord {
    attributes
        .iter()
        .map(|attribute| (*attribute, extract(*attribute)))
        .collect()
}

/// A record of nulls, for sources that cannot resolve anything requested.
pub(crate) fn unresolved(attributes: &[Attribute]) -> AttributeRecord {
    record_from(attributes, |_| AttributeValue::Null)
}

/// Every built-in adapter, sharing one HTTP client.
pub fn default_providers(http_timeout: Duration) -> Vec<Arc<dyn AttributeProvider>> {
    let http = PageClient::new(http_timeout);
    vec![
        Arc::new(stockanalysis::StockAnalysisProvider::new(http.clone())),
        Arc::new(investidor10::Investidor10Provider::new(http.clone())),
        Arc::new(fundamentus::FundamentusProvider::new(http.clone())),
        Arc::new(cvm::CvmProvider::new(http.clone())),
        Arc::new(bmfbovespa::BmfBovespaProvider::new(http.clone())),
        Arc::new(fiis::FiisProvider::new(http.clone())),
        Arc::new(fundsexplorer::FundsExplorerProvider::new(http.clone())),
        Arc::new(binance::BinanceProvider::new(http.clone())),
        Arc::new(coinmarketcap::CoinMarketCapProvider::new(http)),
    ]
}
