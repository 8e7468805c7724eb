//! Brazilian real estate funds.

use super::{fund_page_url, labelled, labelled_number, parse_fund_cnpj, HEADERS, SOURCE};
use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, AttributeValue};
use crate::provider::fiis::FNET_URL;
use crate::provider::text::{multiply_by_unit, substring_between, NumberFormat};
use crate::provider::{record_from, FetchContext, PageClient};

/// Rows of the "basic data" table end where the next cell starts.
const CELL_END: &str = "<div class='cell'>";

fn cell_text(page: &str, label: &str) -> AttributeValue {
    labelled(page, label, CELL_END).into()
}

fn cell_number(page: &str, label: &str) -> AttributeValue {
    labelled_number(page, label, CELL_END, NumberFormat::Brazilian).into()
}

fn card_number(page: &str, label: &str) -> AttributeValue {
    labelled_number(page, label, "</span>", NumberFormat::Brazilian).into()
}

fn card_with_unit(page: &str, label: &str) -> AttributeValue {
    labelled(page, label, "</span>")
        .and_then(|text| multiply_by_unit(&text, NumberFormat::Brazilian))
        .into()
}

/// Number of property cards in the portfolio section.
fn count_properties(page: &str) -> Option<f64> {
    let section = substring_between(page, "Lista de Imóveis", "</section>")?;
    Some(section.matches("card-propertie").count() as f64)
}

pub(super) fn extract(page: &str, attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    match attribute {
        Dy => card_number(page, "DY (12M)</span>"),
        EquityPrice => cell_number(page, "VAL. PATRIMONIAL P/ COTA"),
        LatestDividend => labelled_number(page, "ÚLTIMO RENDIMENTO", "</div>", NumberFormat::Brazilian)
            .into(),
        LatestsDividends => substring_between(page, "YIELD 12 MESES", "</div>")
            .and_then(|block| labelled_number(&block, "amount\">", "</span>", NumberFormat::Brazilian))
            .into(),
        Link => parse_fund_cnpj(page)
            .map(|cnpj| format!("{FNET_URL}{cnpj}#"))
            .into(),
        Liquidity => card_with_unit(page, "title=\"Liquidez Diária\">Liquidez Diária</span>"),
        Management => cell_text(page, "TIPO DE GESTÃO"),
        Name => cell_text(page, "Razão Social"),
        NetEquityValue => card_with_unit(page, "VALOR PATRIMONIAL</span>"),
        Price => card_number(page, "Cotação</span>"),
        Pvp => card_number(page, "title=\"P/VP\">P/VP</span>"),
        Segment => cell_text(page, "SEGMENTO"),
        TargetPublic => cell_text(page, "PÚBLICO-ALVO"),
        Term => cell_text(page, "PRAZO DE DURAÇÃO"),
        TotalIssuedShares => cell_number(page, "COTAS EMITIDAS"),
        TotalRealState => count_properties(page).into(),
        Type => cell_text(page, "TIPO DE FUNDO"),
        Vacancy => cell_number(page, "VACÂNCIA"),
        Variation12m => card_number(page, "title=\"Variação (12M)\">VARIAÇÃO (12M)</span>"),
        Variation30d => labelled_number(page, ">30</div>", "</div>", NumberFormat::Brazilian).into(),
        _ => AttributeValue::Null,
    }
}

pub(super) async fn fetch(
    http: &PageClient,
    ctx: &mut FetchContext,
    attributes: &[Attribute],
) -> Result<AttributeRecord, ProviderError> {
    let url = fund_page_url(ctx.instrument_id());
    let page = http.get_text(ctx, SOURCE, &url, HEADERS).await?;

    Ok(record_from(attributes, |a| extract(&page, a)))
}
