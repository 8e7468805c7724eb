//! Investidor10 API payloads.

use serde::Deserialize;
use serde_json::Value;

/// One bar of the yearly dividends chart
/// (`/api/.../dividendos/chart/{id}/{days}/ano`).
#[derive(Debug, Clone, Deserialize)]
pub struct YearlyDividend {
    pub created_at: i32,
    pub price: f64,
}

/// One daily quote of a crypto asset (`/api/criptomoedas/cotacoes/...`).
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoQuote {
    /// `dd/mm/YYYY`
    pub created_at: String,
    pub brl_price: Value,
}
