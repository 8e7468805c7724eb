//! US stocks: the page embeds the whole ticker as a `mainTicker` JSON object.

use serde_json::Value;

use super::models::YearlyDividend;
use super::{
    average_dividends, current_year, fetch_dividends, latest_dividends, needs_dividends, BASE_URL,
    HEADERS, SOURCE,
};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::json::{at, number, number_at, text, text_at};
use crate::provider::text::{remove_type_from_name, substring_between, NumberFormat};
use crate::provider::{record_from, FetchContext, PageClient};

/// Parses the `var mainTicker = {...};` assignment.
pub(super) fn parse_main_ticker(page: &str) -> Result<Value, ProviderError> {
    let raw = substring_between(page, "var mainTicker =", "var ")
        .ok_or_else(|| ProviderError::parse(SOURCE, "mainTicker not found"))?;
    serde_json::from_str(raw.trim_end_matches(';'))
        .map_err(|e| ProviderError::parse(SOURCE, format!("Invalid mainTicker JSON: {e}")))
}

/// Entry of `items` with the greatest ISO timestamp under `key`.
fn most_recent<'a>(items: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    items?
        .as_array()?
        .iter()
        .max_by(|a, b| a.get(key).and_then(Value::as_str).cmp(&b.get(key).and_then(Value::as_str)))
}

pub(super) fn extract(
    ticker: &Value,
    dividends: &[YearlyDividend],
    current_year: i32,
    attribute: Attribute,
) -> AttributeValue {
    use Attribute::*;

    let balance = most_recent(ticker.get("balances"), "reference_date");
    let from_balance = |path: &[&str]| match balance {
        Some(balance) => number_at(balance, path, NumberFormat::Us),
        None => AttributeValue::Null,
    };

    match attribute {
        Actuation => text_at(ticker, &["industry", "name"]),
        AssetsValue => from_balance(&["total_assets"]),
        AvgAnnualDividends => average_dividends(dividends).into(),
        CagrProfit => from_balance(&["growth_net_profit_last_5_years"]),
        CagrRevenue => from_balance(&["growth_net_revenue_last_5_years"]),
        Debit => from_balance(&["long_term_debt"]),
        Dy => from_balance(&["dy"]),
        Ebit => from_balance(&["ebit"]),
        EquityValue => from_balance(&["total_equity"]),
        GrossMargin => from_balance(&["gross_margin"]),
        InitialDate => text_at(ticker, &["start_year_on_stock_exchange"]),
        LatestsDividends => latest_dividends(dividends, current_year).into(),
        Liquidity => from_balance(&["volume_avg"]),
        MarketValue => from_balance(&["market_cap"]),
        Name => at(ticker, &["company_name"])
            .and_then(text)
            .map(|name| remove_type_from_name(&name))
            .into(),
        NetMargin => from_balance(&["net_margin"]),
        NetProfit => from_balance(&["net_income"]),
        NetRevenue => from_balance(&["revenue"]),
        Payout => from_balance(&["api_info", "common_size_ratios", "dividend_payout_ratio"]),
        Pl => from_balance(&["pl"]),
        Price => most_recent(ticker.get("quotations"), "date")
            .and_then(|quote| quote.get("price"))
            .and_then(|price| number(price, NumberFormat::Us))
            .into(),
        Pvp => from_balance(&["pvp"]),
        Roe => from_balance(&["roe"]),
        Roic => from_balance(&["roic"]),
        Sector => text_at(ticker, &["industry", "sector", "name"]),
        TotalIssuedShares => from_balance(&["shares_outstanding"]),
        Type => text_at(ticker, &["type"]),
        Variation12m => from_balance(&["variation_year"]),
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let url = format!("{BASE_URL}/stock/{}", urlencoding::encode(ctx.instrument_id()));
    let page = http.get_text(ctx, SOURCE, &url, HEADERS).await?;
    let ticker = parse_main_ticker(&page)?;

    let dividends: Vec<YearlyDividend> = match at(&ticker, &["id"]).and_then(text) {
        Some(id) if needs_dividends(attributes) => {
            let url = format!("{BASE_URL}/api/stock/dividendos/chart/{id}/3650/ano");
            fetch_dividends(http, ctx, &url).await?
        }
        _ => Vec::new(),
    };

    let year = current_year();
    Ok(record_from(attributes, |a| extract(&ticker, &dividends, year, a)))
}
