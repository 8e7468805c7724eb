//! US ETFs: the fund page plus the daily price history API.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::{amount_between, data_block, number_between, BASE_URL, HEADERS, SOURCE};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::text::{mean, remove_type_from_name, substring_between};
use crate::provider::{record_from, FetchContext, PageClient};

/// Trailing window for the average price.
const AVERAGE_WINDOW: usize = 200;

/// `{"data": [[timestamp, close], ...]}`, oldest first.
#[derive(Debug, Default, Deserialize)]
pub(super) struct PriceHistory {
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl PriceHistory {
    fn closes(&self) -> Vec<f64> {
        self.data
            .iter()
            .filter_map(|point| point.get(1).and_then(Value::as_f64))
            .collect()
    }

    fn average_close(&self) -> Option<f64> {
        let closes = self.closes();
        let start = closes.len().saturating_sub(AVERAGE_WINDOW);
        mean(&closes[start..])
    }
}

fn needs_history(attributes: &[Attribute]) -> bool {
    attributes.contains(&Attribute::AvgPrice)
}

/// Amount of the most recent row of the page's dividend table.
fn newest_dividend(data: &str) -> Option<f64> {
    let table = substring_between(data, "dividendTable:[", "],")?;
    table
        .split("},")
        .filter_map(|row| {
            let date = substring_between(row, "dt:\"", "\"")?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
            let amount = number_between(row.trim_end_matches('}'), "amt:", ",")?;
            Some((date, amount))
        })
        .max_by_key(|(date, _)| *date)
        .map(|(_, amount)| amount)
}

fn price(data: &str) -> Option<f64> {
    number_between(data, "cl:", ",")
}

fn assets_under_management(data: &str) -> Option<f64> {
    amount_between(data, "aum:\"$", "\"")
}

fn shares_outstanding(data: &str) -> Option<f64> {
    amount_between(data, "sharesOut:\"", "\"")
}

/// Net asset value per share.
fn equity_price(data: &str) -> Option<f64> {
    let shares = shares_outstanding(data)?;
    (shares != 0.0).then_some(assets_under_management(data)? / shares)
}

fn sector(data: &str) -> Option<String> {
    let parts: Vec<String> = [
        substring_between(data, "\"Asset Class\",\"", "\""),
        substring_between(data, "\"Category\",\"", "\""),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

pub(super) fn extract(data: &str, history: &PriceHistory, attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    match attribute {
        Actuation => substring_between(data, "\"Index Tracked\",\"", "\"").into(),
        AvgAnnualDividends => number_between(data, "dps:\"$", "\"").into(),
        AvgPrice => history.average_close().into(),
        Beta => number_between(data, "beta:\"", "\"").into(),
        Dy => number_between(data, "dividendYield:\"", "%\"").into(),
        EquityPrice => equity_price(data).into(),
        EquityValue => assets_under_management(data).into(),
        InitialDate => substring_between(data, "inception:\"", "\"").into(),
        LatestsDividends => newest_dividend(data).into(),
        Link => substring_between(data, "etf_website:\"", "\",").into(),
        Liquidity => number_between(data, "v:", ",").into(),
        ManagementFee => number_between(data, "expenseRatio:\"", "%\"").into(),
        Max52Weeks => number_between(data, "h52:", ",").into(),
        Min52Weeks => number_between(data, "l52:", ",").into(),
        Name => substring_between(data, "info:{", "},")
            .and_then(|info| substring_between(&info, "name:\"", "\""))
            .map(|name| remove_type_from_name(&name))
            .into(),
        Payout => number_between(data, "payoutRatio:\"", "%\"").into(),
        Pl => number_between(data, "peRatio:\"", "\"").into(),
        Price => price(data).into(),
        Pvp => price(data)
            .zip(equity_price(data))
            .filter(|(_, nav)| *nav != 0.0)
            .map(|(price, nav)| price / nav)
            .into(),
        Sector => sector(data).into(),
        TotalIssuedShares => shares_outstanding(data).into(),
        Type => "ETF".into(),
        Variation12m => number_between(data, "ch1y:\"", "\"").into(),
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let ticker = urlencoding::encode(&ctx.instrument_id().to_lowercase()).into_owned();

    let page = http
        .get_text(ctx, SOURCE, &format!("{BASE_URL}/etf/{ticker}"), HEADERS)
        .await?;
    let data = data_block(&page, "news:")?;

    let history = if needs_history(attributes) {
        let url = format!("{BASE_URL}/api/symbol/e/{ticker}/history?type=chart");
        http.get_json(ctx, SOURCE, &url, HEADERS).await?
    } else {
        PriceHistory::default()
    };

    Ok(record_from(attributes, |a| extract(&data, &history, a)))
}
