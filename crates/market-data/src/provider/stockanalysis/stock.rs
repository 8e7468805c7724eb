//! US stocks: the overview page plus the statistics page.

use super::{amount_between, data_block, number_between, BASE_URL, HEADERS, SOURCE};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::text::substring_between;
use crate::provider::{record_from, FetchContext, PageClient};

/// Data blocks of the two pages a stock is read from.
pub(super) struct StockPages {
    pub ticker: String,
    pub overview: String,
    pub statistics: String,
}

impl StockPages {
    fn stat(&self, label: &str, end: &str) -> Option<f64> {
        number_between(&self.statistics, &format!("{label}\",value:\""), end)
    }

    fn stat_amount(&self, label: &str, end: &str) -> Option<f64> {
        amount_between(&self.statistics, &format!("{label}\",value:\""), end)
    }

    fn dividend_per_share(&self) -> Option<f64> {
        number_between(&self.statistics, "Dividend Per Share\",value:\"$", "\"")
    }

    fn net_income(&self) -> Option<f64> {
        amount_between(&self.overview, "netIncome:\"", "\"")
    }

    /// Total assets implied by net income and return on assets.
    fn assets(&self) -> Option<f64> {
        let roa = self.stat("ROA)", "%")?;
        let net_income = self.net_income()?;
        (roa != 0.0).then(|| net_income / (roa / 100.0))
    }
}

pub(super) fn extract(pages: &StockPages, attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    let overview = pages.overview.as_str();
    match attribute {
        Actuation => substring_between(overview, "Industry\",v:\"", "\"").into(),
        AssetsValue => pages.assets().into(),
        AvgAnnualDividends => pages.dividend_per_share().into(),
        AvgPrice => pages.stat("200-Day Moving Average", "\"").into(),
        Beta => pages.stat("Beta (5Y)", "\"").into(),
        Debit => pages.stat_amount("Debt", "\"").into(),
        Dy => pages.stat("Dividend Yield", "%").into(),
        Ebit => pages.stat_amount("EBIT", "\"").into(),
        EnterpriseValue => pages.stat_amount("Enterprise Value", "\",").into(),
        GrossMargin => pages.stat("Gross Margin", "%").into(),
        InitialDate => substring_between(overview, "inception:\"", "\"").into(),
        LatestsDividends => pages.dividend_per_share().map(|dps| dps / 12.0).into(),
        Link => format!("{BASE_URL}/stocks/{}/company/", pages.ticker.to_lowercase()).into(),
        Liquidity => pages.stat_amount("Average Volume (20 Days)", "\"").into(),
        MarketValue => pages.stat_amount("Market Cap", "\"").into(),
        Max52Weeks => number_between(overview, "h52:", ",").into(),
        Min52Weeks => number_between(overview, "l52:", ",").into(),
        Name => substring_between(overview, "nameFull:\"", "\"").into(),
        NetMargin => pages.stat("Operating Margin", "%").into(),
        NetProfit => pages.net_income().into(),
        NetRevenue => amount_between(overview, "revenue:\"", "\"").into(),
        Payout => pages.stat("Payout Ratio", "%").into(),
        Pl => number_between(overview, "peRatio:\"", "\"").into(),
        Price => number_between(overview, "cl:", ",").into(),
        Roe => pages.stat("ROE)", "%").into(),
        Roic => pages.stat("ROIC)", "%").into(),
        Sector => substring_between(overview, "Sector\",v:\"", "\",").into(),
        TotalIssuedShares => amount_between(overview, "sharesOut:\"", "\"").into(),
        Type => "STOCK".into(),
        Variation12m => pages.stat("52-Week Price Change", "%").into(),
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let ticker = ctx.instrument_id().to_lowercase();
    let base = format!("{BASE_URL}/stocks/{}", urlencoding::encode(&ticker));

    let overview_page = http.get_text(ctx, SOURCE, &base, HEADERS).await?;
    let overview = data_block(&overview_page, "news:")?;

    let statistics_page = http
        .get_text(ctx, SOURCE, &format!("{base}/statistics"), HEADERS)
        .await?;
    let statistics = data_block(&statistics_page, ";")?;

    let pages = StockPages {
        ticker,
        overview,
        statistics,
    };
    Ok(record_from(attributes, |a| extract(&pages, a)))
}
