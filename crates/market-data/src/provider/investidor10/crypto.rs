//! Crypto assets. Price statistics come from the one-year quote history.

use chrono::NaiveDate;

use super::models::CryptoQuote;
use super::{labelled, labelled_number, API_HEADERS, BASE_URL, HEADERS, SOURCE};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::json::number;
use crate::provider::text::{mayer_multiple, mean, substring_between, NumberFormat};
use crate::provider::{record_from, FetchContext, PageClient};

fn needs_history(attributes: &[Attribute]) -> bool {
    attributes.iter().any(|a| {
        matches!(
            a,
            Attribute::AvgPrice
                | Attribute::Max52Weeks
                | Attribute::Min52Weeks
                | Attribute::MayerMultiple
                | Attribute::Price
        )
    })
}

/// Prices ordered from oldest to newest. Quotes with an unreadable date or
/// price are dropped.
pub(super) fn closing_prices(quotes: &[CryptoQuote]) -> Vec<f64> {
    let mut dated: Vec<(NaiveDate, f64)> = quotes
        .iter()
        .filter_map(|quote| {
            let date = NaiveDate::parse_from_str(&quote.created_at, "%d/%m/%Y").ok()?;
            let price = number(&quote.brl_price, NumberFormat::Us)?;
            Some((date, price))
        })
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated.into_iter().map(|(_, price)| price).collect()
}

pub(super) fn extract(page: &str, prices: &[f64], attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    match attribute {
        AvgPrice => mean(prices).into(),
        Max52Weeks => prices.iter().copied().reduce(f64::max).into(),
        MayerMultiple => mayer_multiple(prices, prices.len()).into(),
        Min52Weeks => prices.iter().copied().reduce(f64::min).into(),
        Name => labelled(page, "<h1>", "</h1>").into(),
        Price => prices.last().copied().into(),
        Sector => labelled(page, "<span class=\"label label-default\">", "</span>").into(),
        Variation12m => {
            labelled_number(page, "VARIAÇÃO (12M)</span>", "</span>", NumberFormat::Us).into()
        }
        Variation30d => labelled_number(page, ">30</div>", "</div>", NumberFormat::Us).into(),
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let url = format!(
        "{BASE_URL}/criptomoedas/{}",
        urlencoding::encode(ctx.instrument_id())
    );
    let page = http.get_text(ctx, SOURCE, &url, HEADERS).await?;

    let prices = match substring_between(&page, "cryptoId\" value=\"", "\"") {
        Some(id) if needs_history(attributes) => {
            let url = format!("{BASE_URL}/api/criptomoedas/cotacoes/{id}/365/dollar");
            let quotes: Vec<CryptoQuote> = http.get_json(ctx, SOURCE, &url, API_HEADERS).await?;
            closing_prices(&quotes)
        }
        _ => Vec::new(),
    };

    Ok(record_from(attributes, |a| extract(&page, &prices, a)))
}
