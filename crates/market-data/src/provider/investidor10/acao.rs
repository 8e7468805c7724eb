//! Brazilian shares.
//!
//! Indicator cards are located by the tooltip text that precedes each value,
//! which is stable across page redesigns in a way the CSS classes are not.

use std::collections::BTreeMap;

use serde_json::Value;

use super::models::YearlyDividend;
use super::{
    average_closed_years, current_year, fetch_dividends, labelled, labelled_number,
    latest_dividends, needs_dividends, share_page_url, API_HEADERS, BASE_URL, HEADERS, SOURCE,
};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::json::number;
use crate::provider::text::{substring_between, text_to_number, NumberFormat};
use crate::provider::{record_from, FetchContext, PageClient};

const CAGR_PROFIT: &str = "período equivalente de cinco anos atrás.&lt;/p&gt;\"></i></span>";
const CAGR_REVENUE: &str = "período de cinco anos atrás.&lt;/p&gt;\"></i></span>";
const GROSS_MARGIN: &str = "lucro bruto / receita líquida&lt;/b&gt;&lt;/p&gt;\"></i></span>";
const NET_MARGIN: &str =
    "lucro líquido / receita líquida&lt;/b&gt;&lt;br&gt;&lt;/p&gt;\"></i></span>";
const PAYOUT: &str = "prov. pagos / lucro líquido&lt;/b&gt;&lt;/p&gt;\"></i></span>";
const ROE: &str = "lucro líquido / patrimônio líquido&lt;/b&gt;&lt;/p&gt;\"></i></span>";
const ROIC: &str = "EBIT / capital investido&lt;/b&gt;&lt;/p&gt;\"></i></span>";

/// Years of net profit reported by `latest_net_profit`.
const NET_PROFIT_YEARS: usize = 5;

/// Values in the "company info" table: `label</span>` followed by a
/// `detail-value` div.
fn detail_value(page: &str, label: &str) -> AttributeValue {
    substring_between(page, &format!("{label}</span>"), "</span>")
        .and_then(|cell| substring_between(&cell, "detail-value\">", "</div>"))
        .and_then(|text| text_to_number(&text, NumberFormat::Brazilian))
        .into()
}

fn indicator(page: &str, label: &str) -> AttributeValue {
    labelled_number(page, label, "</span>", NumberFormat::Brazilian).into()
}

/// Net profit of the most recent years in the `cotacao-lucro` payload,
/// which is keyed by year (`{"2023": {"net_profit": ...}, ...}`). Keys that
/// are not years are ignored.
fn latest_net_profit(history: &Value) -> BTreeMap<String, f64> {
    let Some(rows) = history.as_object() else {
        return BTreeMap::new();
    };

    let mut years: Vec<u32> = rows
        .keys()
        .filter(|key| !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|key| key.parse().ok())
        .collect();
    years.sort_unstable();

    years
        .iter()
        .skip(years.len().saturating_sub(NET_PROFIT_YEARS))
        .filter_map(|year| {
            let key = year.to_string();
            let profit = rows
                .get(&key)
                .and_then(|row| row.get("net_profit"))
                .and_then(|value| number(value, NumberFormat::Us))?;
            Some((key, profit))
        })
        .collect()
}

pub(super) fn extract(
    page: &str,
    dividends: &[YearlyDividend],
    net_profit: &BTreeMap<String, f64>,
    current_year: i32,
    attribute: Attribute,
) -> AttributeValue {
    use Attribute::*;

    match attribute {
        AssetsValue => detail_value(page, "Ativos"),
        AvgAnnualDividends => average_closed_years(dividends, current_year).into(),
        CagrProfit => indicator(page, CAGR_PROFIT),
        CagrRevenue => indicator(page, CAGR_REVENUE),
        Debit => detail_value(page, "Dívida Líquida"),
        Dy => indicator(page, "DY</span>"),
        EnterpriseValue => detail_value(page, "Valor de firma"),
        EquityValue => detail_value(page, "Patrimônio Líquido"),
        GrossMargin => indicator(page, GROSS_MARGIN),
        LatestsDividends => latest_dividends(dividends, current_year).into(),
        LatestNetProfit => net_profit.clone().into(),
        Liquidity => detail_value(page, "Liquidez Média Diária"),
        MarketValue => detail_value(page, "Valor de mercado"),
        Name => labelled(page, "name-company\">", "<").into(),
        NetMargin => indicator(page, NET_MARGIN),
        Payout => indicator(page, PAYOUT),
        Pl => indicator(page, "P/L</span>"),
        Price => indicator(page, "Cotação</span>"),
        Pvp => indicator(page, "P/VP</span>"),
        Roe => indicator(page, ROE),
        Roic => indicator(page, ROIC),
        Sector => labelled(page, "Segmento</span>", "</span>").into(),
        TotalIssuedShares => detail_value(page, "Nº total de papeis"),
        Variation12m => indicator(page, "VARIAÇÃO (12M)</span>"),
        Variation30d => labelled_number(page, ">30</div>", "</div>", NumberFormat::Brazilian).into(),
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let url = share_page_url(ctx.instrument_id());
    let page = http.get_text(ctx, SOURCE, &url, HEADERS).await?;

    let dividends = if needs_dividends(attributes) {
        let url = format!(
            "{BASE_URL}/api/dividendos/chart/{}/3650/ano",
            urlencoding::encode(ctx.instrument_id())
        );
        fetch_dividends(http, ctx, &url).await?
    } else {
        Vec::new()
    };

    let net_profit = if attributes.contains(&Attribute::LatestNetProfit) {
        let url = format!(
            "{BASE_URL}/api/cotacao-lucro/{}/adjusted",
            urlencoding::encode(ctx.instrument_id())
        );
        let history: Value = http.get_json(ctx, SOURCE, &url, API_HEADERS).await?;
        latest_net_profit(&history)
    } else {
        BTreeMap::new()
    };

    let year = current_year();
    Ok(record_from(attributes, |a| {
        extract(&page, &dividends, &net_profit, year, a)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <h2 class="name-company">PETROBRAS</h2>
        <div class="_card cotacao"><span title="Cotação">Cotação</span><div class="_card-body"><span class="value">R$ 38,25</span></div></div>
        <div class="cell"><span class="d-flex">P/L</span><div class="value d-flex"><span>4,12</span></div></div>
        <div class="cell"><span>ROE<i data-content="&lt;p&gt;&lt;b&gt;lucro líquido / patrimônio líquido&lt;/b&gt;&lt;/p&gt;"></i></span><div class="value"><span>28,40%</span></div></div>
        <div class="cell"><span class="title">Valor de mercado</span><div class="detail-value">R$ 498.312.000.000</div></span></div>
        <div class="cell"><span class="title">Segmento</span><a href="/setores/petroleo"><span>Petróleo, Gás e Biocombustíveis</span></a></div>
        <div class="_card"><div>30</div><div>-2,5%</div></div>
        <table><tr><td>CNPJ:</td><td class='value'>33.000.167/0001-01</td></tr></table>
    "#;

    #[test]
    fn reads_indicator_cards() {
        let record = record_from(
            &[
                Attribute::Name,
                Attribute::Price,
                Attribute::Pl,
                Attribute::Roe,
                Attribute::Debit,
            ],
            |a| extract(PAGE, &[], &BTreeMap::new(), 2024, a),
        );

        assert_eq!(record.get(Attribute::Name), Some(&"PETROBRAS".into()));
        assert_eq!(record.get(Attribute::Price), Some(&38.25.into()));
        assert_eq!(record.get(Attribute::Pl), Some(&4.12.into()));
        assert_eq!(record.get(Attribute::Roe), Some(&28.4.into()));
        assert_eq!(record.get(Attribute::Debit), Some(&AttributeValue::Null));
    }

    #[test]
    fn reads_detail_table_and_thirty_day_variation() {
        assert_eq!(
            extract(PAGE, &[], &BTreeMap::new(), 2024, Attribute::MarketValue),
            AttributeValue::from(498_312_000_000.0)
        );
        assert_eq!(
            extract(PAGE, &[], &BTreeMap::new(), 2024, Attribute::Variation30d),
            AttributeValue::from(-2.5)
        );
    }

    #[test]
    fn average_dividends_skip_the_running_year() {
        let dividends = vec![
            YearlyDividend { created_at: 2022, price: 4.0 },
            YearlyDividend { created_at: 2023, price: 6.0 },
            YearlyDividend { created_at: 2024, price: 1.0 },
        ];
        assert_eq!(
            extract(PAGE, &dividends, &BTreeMap::new(), 2024, Attribute::AvgAnnualDividends),
            AttributeValue::from(5.0)
        );
        assert_eq!(
            extract(PAGE, &dividends, &BTreeMap::new(), 2024, Attribute::LatestsDividends),
            AttributeValue::from(1.0)
        );
    }

    #[test]
    fn net_profit_keeps_the_last_five_years() {
        let history = serde_json::json!({
            "2018": {"net_profit": 1.0},
            "2019": {"net_profit": 2.0},
            "2020": {"net_profit": 3.0},
            "2021": {"net_profit": "4"},
            "2022": {"net_profit": 5.0},
            "2023": {"net_profit": 6.0},
            "ultimos_12_meses": {"net_profit": 7.0}
        });

        let profits = latest_net_profit(&history);
        assert_eq!(
            profits.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["2019", "2020", "2021", "2022", "2023"]
        );
        assert_eq!(profits["2021"], 4.0);

        assert_eq!(
            extract(PAGE, &[], &profits, 2024, Attribute::LatestNetProfit),
            AttributeValue::Series(profits.clone())
        );
        assert_eq!(
            extract(PAGE, &[], &BTreeMap::new(), 2024, Attribute::LatestNetProfit),
            AttributeValue::Null
        );
        assert!(latest_net_profit(&serde_json::json!([])).is_empty());
    }
}
