//! Investidor10 adapter.
//!
//! Investidor10 covers every asset class, each with its own page layout, so
//! the parsing for each class lives in its own submodule:
//!
//! | Asset class | Page                        | Extra payloads              |
//! |-------------|-----------------------------|-----------------------------|
//! | `stock`     | `/stock/{t}` (`mainTicker`) | yearly dividends            |
//! | `etf`       | `/etfs-global/{t}`          | yearly dividends            |
//! | `acao`      | `/acoes/{t}`                | yearly dividends, profits   |
//! | `fii`       | `/fiis/{t}`                 | none                        |
//! | `cripto`    | `/criptomoedas/{slug}`      | one year of daily quotes    |
//!
//! Extra payloads are only downloaded when a requested attribute needs them.

mod acao;
mod crypto;
mod etf;
mod fii;
mod models;
mod stock;

use async_trait::async_trait;
use chrono::{Datelike, Local};
use serde_json::Value;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, SourceId};
use crate::provider::text::{cleaned_between, mean, text_to_number, NumberFormat};
use crate::provider::{AttributeProvider, FetchContext, PageClient, ProviderCapabilities};

use models::YearlyDividend;

const SOURCE: SourceId = SourceId::Investidor10;
const BASE_URL: &str = "https://investidor10.com.br";

/// Headers for the HTML pages. Shared with the CVM adapter, which reads the
/// CNPJ from the same share page.
pub(crate) const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Referer", "https://investidor10.com.br/"),
    ("Upgrade-Insecure-Requests", "1"),
];

const API_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Referer", "https://investidor10.com.br/"),
    ("X-Requested-With", "XMLHttpRequest"),
];

/// Markup removed before a labelled value is parsed.
const VALUE_WRAPPERS: &[&str] = &["&nbsp;"];

pub struct Investidor10Provider {
    http: PageClient,
}

impl Investidor10Provider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

/// Page of a Brazilian share.
pub(crate) fn share_page_url(ticker: &str) -> String {
    format!("{BASE_URL}/acoes/{}", urlencoding::encode(ticker))
}

/// CNPJ printed on a share page.
pub(crate) fn parse_cnpj(page: &str) -> Option<String> {
    cleaned_between(page, "CNPJ:", "</tr>", &[])
}

/// Page of a Brazilian real estate fund.
pub(crate) fn fund_page_url(ticker: &str) -> String {
    format!("{BASE_URL}/fiis/{}", urlencoding::encode(&ticker.to_lowercase()))
}

/// CNPJ printed in a fund page's basic data.
pub(crate) fn parse_fund_cnpj(page: &str) -> Option<String> {
    labelled(page, "CNPJ", "</div>")
}

/// Text between `label` and `end`, without markup.
fn labelled(page: &str, label: &str, end: &str) -> Option<String> {
    cleaned_between(page, label, end, VALUE_WRAPPERS)
}

fn labelled_number(page: &str, label: &str, end: &str, format: NumberFormat) -> Option<f64> {
    labelled(page, label, end).and_then(|text| text_to_number(&text, format))
}

fn needs_dividends(attributes: &[Attribute]) -> bool {
    attributes
        .iter()
        .any(|a| matches!(a, Attribute::AvgAnnualDividends | Attribute::LatestsDividends))
}

fn current_year() -> i32 {
    Local::now().year()
}

/// Mean of the yearly totals.
fn average_dividends(dividends: &[YearlyDividend]) -> Option<f64> {
    let totals: Vec<f64> = dividends.iter().map(|d| d.price).collect();
    mean(&totals)
}

/// Mean of the yearly totals of closed years only.
fn average_closed_years(dividends: &[YearlyDividend], current_year: i32) -> Option<f64> {
    let totals: Vec<f64> = dividends
        .iter()
        .filter(|d| d.created_at != current_year)
        .map(|d| d.price)
        .collect();
    mean(&totals)
}

/// Total paid in the current year, falling back to the previous one when the
/// current year has nothing yet.
fn latest_dividends(dividends: &[YearlyDividend], current_year: i32) -> Option<f64> {
    let paid_in = |year: i32| {
        dividends
            .iter()
            .find(|d| d.created_at == year)
            .map(|d| d.price)
            .filter(|price| *price != 0.0)
    };
    paid_in(current_year).or_else(|| paid_in(current_year - 1))
}

/// Downloads a yearly dividends chart. Entries that do not look like
/// `{created_at, price}` are skipped.
async fn fetch_dividends(
    http: &PageClient,
    ctx: &mut FetchContext,
    url: &str,
) -> Result<Vec<YearlyDividend>, ProviderError> {
    let payload: Value = http.get_json(ctx, SOURCE, url, API_HEADERS).await?;
    Ok(parse_dividends(payload))
}

fn parse_dividends(payload: Value) -> Vec<YearlyDividend> {
    match payload {
        Value::Array(rows) => rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl AttributeProvider for Investidor10Provider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: AssetClass::ALL,
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        match ctx.asset_class() {
            AssetClass::Stock => stock::fetch(&self.http, ctx, attributes).await,
            AssetClass::Etf => etf::fetch(&self.http, ctx, attributes).await,
            AssetClass::BrStock => acao::fetch(&self.http, ctx, attributes).await,
            AssetClass::BrReit => fii::fetch(&self.http, ctx, attributes).await,
            AssetClass::Crypto => crypto::fetch(&self.http, ctx, attributes).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dividends(rows: &[(i32, f64)]) -> Vec<YearlyDividend> {
        rows.iter()
            .map(|(year, price)| YearlyDividend {
                created_at: *year,
                price: *price,
            })
            .collect()
    }

    #[test]
    fn latest_dividends_fall_back_to_previous_year() {
        let paid = dividends(&[(2023, 1.0), (2024, 2.0)]);
        assert_eq!(latest_dividends(&paid, 2024), Some(2.0));
        assert_eq!(latest_dividends(&paid, 2025), Some(2.0));
        assert_eq!(latest_dividends(&paid, 2027), None);
    }

    #[test]
    fn closed_year_average_skips_current_year() {
        let paid = dividends(&[(2023, 1.0), (2024, 3.0), (2025, 0.5)]);
        assert_eq!(average_closed_years(&paid, 2025), Some(2.0));
        assert_eq!(average_dividends(&paid), Some(1.5));
        assert_eq!(average_dividends(&[]), None);
    }

    #[test]
    fn malformed_dividend_rows_are_skipped() {
        let payload = serde_json::json!([
            {"created_at": 2023, "price": 1.25},
            {"created_at": "soon", "price": 2.0},
            {"price": 3.0}
        ]);
        let parsed = parse_dividends(payload);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].created_at, 2023);
        assert!(parse_dividends(serde_json::json!({})).is_empty());
    }

    #[test]
    fn cnpj_from_share_page() {
        let page = "<tr><td>CNPJ:</td><td class='value'>33.000.167/0001-01</td></tr>";
        assert_eq!(parse_cnpj(page).as_deref(), Some("33.000.167/0001-01"));
        assert_eq!(parse_cnpj("<table></table>"), None);
    }

    #[test]
    fn share_url_keeps_ticker() {
        assert_eq!(share_page_url("PETR4"), "https://investidor10.com.br/acoes/PETR4");
    }
}
