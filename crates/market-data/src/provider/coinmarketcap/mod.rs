//! CoinMarketCap adapter.
//!
//! Descriptive fields are read from the JSON state embedded in the currency
//! page. Price statistics come from the last 200 daily quotes of the
//! historical data API, fetched only when one of them is requested.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, AttributeValue, SourceId};
use crate::provider::json::number;
use crate::provider::text::{
    cleaned_between, mayer_multiple, mean, substring_between, text_to_number, NumberFormat,
};
use crate::provider::{
    record_from, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::CoinMarketCap;
const PAGE_URL: &str = "https://coinmarketcap.com/pt-br/currencies/";
const HISTORY_URL: &str = "https://api.coinmarketcap.com/data-api/v3.1/cryptocurrency/historical";
/// CoinMarketCap's id for BRL.
const CONVERT_TO_BRL: u32 = 2783;
const HISTORY_DAYS: i64 = 200;

const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Referer", "https://coinmarketcap.com/pt-br/"),
];

const API_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Origin", "https://coinmarketcap.com"),
    ("Referer", "https://coinmarketcap.com/"),
    ("platform", "web"),
];

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    data: HistoryData,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(default)]
    quotes: Vec<DailyQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyQuote {
    time_close: String,
    quote: QuoteValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteValues {
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
}

/// Daily quote series, oldest first.
#[derive(Debug, Default)]
pub(crate) struct History {
    closes: Vec<f64>,
    volumes: Vec<f64>,
    last_market_cap: Option<f64>,
}

impl History {
    fn from_quotes(mut quotes: Vec<DailyQuote>) -> Self {
        // ISO-8601 timestamps sort lexicographically.
        quotes.sort_by(|a, b| a.time_close.cmp(&b.time_close));
        Self {
            closes: quotes.iter().map(|q| q.quote.close).collect(),
            volumes: quotes.iter().filter_map(|q| q.quote.volume).collect(),
            last_market_cap: quotes.last().and_then(|q| q.quote.market_cap),
        }
    }
}

pub struct CoinMarketCapProvider {
    http: PageClient,
}

impl CoinMarketCapProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

fn needs_history(attributes: &[Attribute]) -> bool {
    attributes.iter().any(|a| {
        matches!(
            a,
            Attribute::AvgPrice
                | Attribute::Liquidity
                | Attribute::MarketValue
                | Attribute::Max52Weeks
                | Attribute::MayerMultiple
                | Attribute::Min52Weeks
                | Attribute::Price
        )
    })
}

/// Sum of the APRs Binance offers on its flexible earn product, as listed in
/// the page's `earnList`.
pub(crate) fn binance_flexible_apr(page: &str) -> Option<f64> {
    let raw = substring_between(page, "\"earnList\":", "\"upcoming\"")?;
    let earn_list: Value = serde_json::from_str(raw.trim_end_matches(',')).ok()?;

    let product = earn_list.as_array()?.iter().find(|earn| {
        earn.pointer("/provider/name").and_then(Value::as_str) == Some("Binance")
            && earn.get("subType").and_then(Value::as_str) == Some("earn_flexi")
    })?;

    match product.get("apr")? {
        Value::Array(rates) => Some(rates.iter().filter_map(Value::as_f64).sum()),
        other => number(other, NumberFormat::Us),
    }
}

fn page_number(page: &str, key: &str) -> AttributeValue {
    substring_between(page, key, ",")
        .and_then(|text| text_to_number(&text, NumberFormat::Us))
        .into()
}

pub(crate) fn extract(page: &str, history: &History, attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    match attribute {
        AvgPrice => mean(&history.closes).into(),
        Dy => binance_flexible_apr(page).into(),
        InitialDate => substring_between(page, "\"dateAdded\":\"", "\"").into(),
        Link => cleaned_between(page, "\"website\":[", "]", &["\""])
            .and_then(|sites| sites.split(',').next().map(|site| site.trim().to_string()))
            .into(),
        Liquidity => mean(&history.volumes).into(),
        MarketValue => history.last_market_cap.into(),
        Max52Weeks => history.closes.iter().copied().reduce(f64::max).into(),
        MayerMultiple => mayer_multiple(&history.closes, history.closes.len()).into(),
        Min52Weeks => history.closes.iter().copied().reduce(f64::min).into(),
        Name => substring_between(page, "\"slug\":\"", "\"").into(),
        Price => history.closes.last().copied().into(),
        Sector => substring_between(page, "\"category\":\"", "\"").into(),
        TotalIssuedShares => substring_between(page, "\"totalSupply\":{", "},")
            .map(|supply| page_number(&supply, "\"value\":"))
            .unwrap_or(AttributeValue::Null),
        Variation12m => page_number(page, "\"priceChangePercentage1y\":"),
        Variation30d => page_number(page, "\"priceChangePercentage30d\":"),
        _ => AttributeValue::Null,
    }
}

#[async_trait]
impl AttributeProvider for CoinMarketCapProvider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::Crypto],
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        if ctx.asset_class() != AssetClass::Crypto {
            return Err(ProviderError::Unsupported {
                source_id: SOURCE,
                asset_class: ctx.asset_class(),
            });
        }

        let url = format!("{PAGE_URL}{}/", urlencoding::encode(ctx.instrument_id()));
        let page = self.http.get_text(ctx, SOURCE, &url, HEADERS).await?;

        let history = match substring_between(&page, "\"id\":", ",") {
            Some(id) if needs_history(attributes) => {
                let now = Utc::now();
                let start = now - Duration::days(HISTORY_DAYS);
                let url = format!(
                    "{HISTORY_URL}?id={id}&convertId={CONVERT_TO_BRL}&timeStart={}&timeEnd={}&interval=1d",
                    start.timestamp(),
                    now.timestamp()
                );
                let response: HistoryResponse =
                    self.http.get_json(ctx, SOURCE, &url, API_HEADERS).await?;
                History::from_quotes(response.data.quotes)
            }
            _ => History::default(),
        };
        debug!(
            "CoinMarketCap: {} daily quotes for {}",
            history.closes.len(),
            ctx.instrument_id()
        );

        Ok(record_from(attributes, |a| extract(&page, &history, a)))
    }
}
