//! Ticker Info Market Data Crate
//!
//! This crate resolves financial attributes (price, dividend yield, sector,
//! vacancy, ...) for listed instruments by scraping public data sources.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Five asset classes: Brazilian shares and REITs, US stocks and ETFs, crypto
//! - Nine sources: StockAnalysis, Investidor10, Fundamentus, CVM,
//!   BM&FBovespa, FIIs, Funds Explorer, Binance, CoinMarketCap
//! - A per-asset-class catalog of valid attributes and ranked sources
//! - Cascading resolution with timeouts and circuit breaking
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Request Layer   | --> |    Catalog       |  (validates names, ranks sources)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | ResolutionEngine |  (ranked cascade, early stop)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Provider      |  (StockAnalysis, Fundamentus, etc.)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | AttributeRecord  |  (partial, mergeable)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`AssetClass`] - The class an instrument belongs to
//! - [`Attribute`] - Closed set of attribute names
//! - [`AttributeRecord`] - Partial attribute/value mapping with null-safe merge
//! - [`SourcePreference`] - Full cascade or one concrete source
//! - [`FetchContext`] - Request-scoped state shared by adapters

pub mod catalog;
pub mod engine;
pub mod errors;
pub mod models;
pub mod provider;

// Re-export all public types from models
pub use models::{
    AssetClass, Attribute, AttributeRecord, AttributeValue, OrderedRecord, SourceId,
    SourcePreference,
};

pub use errors::{CatalogError, ProviderError, RetryClass};

// Re-export provider types
pub use provider::binance::BinanceProvider;
pub use provider::bmfbovespa::BmfBovespaProvider;
pub use provider::coinmarketcap::CoinMarketCapProvider;
pub use provider::cvm::CvmProvider;
pub use provider::fiis::FiisProvider;
pub use provider::fundamentus::FundamentusProvider;
pub use provider::fundsexplorer::FundsExplorerProvider;
pub use provider::investidor10::Investidor10Provider;
pub use provider::stockanalysis::StockAnalysisProvider;
pub use provider::{
    default_providers, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

// Re-export engine types
pub use engine::{
    AttemptOutcome, CircuitBreaker, CircuitBreakerConfig, CircuitState, EngineConfig,
    FetchDiagnostics, ProviderAttempt, ResolutionEngine, SkipReason,
};
