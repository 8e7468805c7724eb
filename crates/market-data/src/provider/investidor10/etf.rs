//! US ETFs.

use super::models::YearlyDividend;
use super::{
    average_dividends, current_year, fetch_dividends, labelled, labelled_number, latest_dividends,
    needs_dividends, BASE_URL, HEADERS, SOURCE,
};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::text::{
    multiply_by_unit, remove_type_from_name, substring_between, NumberFormat,
};
use crate::provider::{record_from, FetchContext, PageClient};

pub(super) fn extract(
    page: &str,
    dividends: &[YearlyDividend],
    current_year: i32,
    attribute: Attribute,
) -> AttributeValue {
    use Attribute::*;

    match attribute {
        AssetsValue => labelled(page, "Capitalização</span>", "</span>")
            .and_then(|text| multiply_by_unit(&text, NumberFormat::Brazilian))
            .into(),
        AvgAnnualDividends => average_dividends(dividends).into(),
        Dy => labelled_number(page, "DY</span>", "</span>", NumberFormat::Us).into(),
        LatestsDividends => latest_dividends(dividends, current_year).into(),
        Name => labelled(page, "name-company\">", "<")
            .map(|name| remove_type_from_name(&name))
            .into(),
        Price => labelled_number(page, "<span class=\"value\">US$", "</span>", NumberFormat::Us)
            .into(),
        Type => "ETF".into(),
        Variation12m => {
            labelled_number(page, "VARIAÇÃO (12M)</span>", "</span>", NumberFormat::Us).into()
        }
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let url = format!(
        "{BASE_URL}/etfs-global/{}",
        urlencoding::encode(&ctx.instrument_id().to_lowercase())
    );
    let page = http.get_text(ctx, SOURCE, &url, HEADERS).await?;

    let dividends = match substring_between(&page, "etfId\" value=\"", "\"") {
        Some(id) if needs_dividends(attributes) => {
            let url = format!("{BASE_URL}/api/etfs/dividendos/chart/{id}/1825/ano");
            fetch_dividends(http, ctx, &url).await?
        }
        _ => Vec::new(),
    };

    let year = current_year();
    Ok(record_from(attributes, |a| extract(&page, &dividends, year, a)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <input type="hidden" id="etfId" value="312">
        <h2 class="name-company">Vanguard S&amp;P 500 ETF</h2>
        <div class="_card cotacao"><span class="value">US$ 1,234.50</span></div>
        <div class="_card dy"><span title="DY">DY</span><div class="_card-body"><span>1.25%</span></div></div>
        <div class="_card"><span>VARIAÇÃO (12M)</span><div class="_card-body"><span>-3.10%</span></div></div>
        <div class="_card"><span>Capitalização</span><div class="_card-body"><span>US$ 1,2 Bilhões</span></div></div>
    "#;

    #[test]
    fn reads_etf_cards() {
        let record = record_from(
            &[
                Attribute::Name,
                Attribute::Price,
                Attribute::Variation12m,
                Attribute::Type,
                Attribute::Beta,
            ],
            |a| extract(PAGE, &[], 2024, a),
        );

        assert_eq!(record.get(Attribute::Name), Some(&"VANGUARD S&P 500".into()));
        assert_eq!(record.get(Attribute::Price), Some(&1234.5.into()));
        assert_eq!(record.get(Attribute::Variation12m), Some(&(-3.1).into()));
        assert_eq!(record.get(Attribute::Type), Some(&"ETF".into()));
        assert_eq!(record.get(Attribute::Beta), Some(&AttributeValue::Null));
    }

    #[test]
    fn capitalization_uses_magnitude_words() {
        assert_eq!(
            extract(PAGE, &[], 2024, Attribute::AssetsValue),
            AttributeValue::from(1.2e9)
        );
    }

    #[test]
    fn etf_id_is_read_from_hidden_input() {
        assert_eq!(
            substring_between(PAGE, "etfId\" value=\"", "\"").as_deref(),
            Some("312")
        );
    }
}
