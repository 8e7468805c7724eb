//! Fundamentus adapter.
//!
//! Scrapes the `detalhes.php` indicator table for Brazilian shares and REITs
//! and, when an average-based attribute is requested, the quote history
//! (`amline/cot_hist.php`, a JSON array of `[timestamp, price]` pairs).

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, AttributeValue, SourceId};
use crate::provider::text::{
    cleaned_between, mayer_multiple, mean, substring_between, text_to_number, NumberFormat,
};
use crate::provider::{
    record_from, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::Fundamentus;
const DETAILS_URL: &str = "https://fundamentus.com.br/detalhes.php?papel=";
const HISTORY_URL: &str = "https://www.fundamentus.com.br/amline/cot_hist.php?papel=";
const NOT_FOUND_MARKER: &str = "Nenhum papel encontrado";
const CVM_LINK: &str = "https://www.rad.cvm.gov.br/ENET/frmConsultaExternaCVM.aspx";

/// Trailing window used for the average price and the Mayer multiple.
const AVERAGE_WINDOW: usize = 200;

pub(crate) const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Referer", "https://fundamentus.com.br/index.php"),
];

pub struct FundamentusProvider {
    http: PageClient,
}

impl FundamentusProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

pub(crate) fn details_url(ticker: &str) -> String {
    format!("{DETAILS_URL}{}", urlencoding::encode(ticker))
}

/// CNPJ of a fund, taken from the details page's FNET documents link.
pub(crate) fn parse_fund_cnpj(page: &str) -> Option<String> {
    if page.contains(NOT_FOUND_MARKER) {
        return None;
    }
    substring_between(page, "abrirGerenciadorDocumentosCVM?cnpjFundo=", "\">Pesquisar Documentos")
        .map(|cnpj| cnpj.replace('#', ""))
        .filter(|cnpj| !cnpj.is_empty())
}

fn needs_history(attributes: &[Attribute]) -> bool {
    attributes
        .iter()
        .any(|a| matches!(a, Attribute::AvgPrice | Attribute::MayerMultiple))
}

/// Closing prices from the history payload, oldest first.
pub(crate) fn parse_history(payload: &Value) -> Vec<f64> {
    payload
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get(1).and_then(Value::as_f64))
                .collect()
        })
        .unwrap_or_default()
}

/// Value cell that follows a label cell.
fn value_after(page: &str, label: &str) -> Option<String> {
    cleaned_between(page, label, "</span>", &[])
}

fn number_after(page: &str, label: &str) -> AttributeValue {
    value_after(page, label)
        .and_then(|v| text_to_number(&v, NumberFormat::Brazilian))
        .into()
}

fn history_stats(prices: &[f64], attribute: Attribute) -> AttributeValue {
    let start = prices.len().saturating_sub(AVERAGE_WINDOW);
    match attribute {
        Attribute::AvgPrice => mean(&prices[start..]).into(),
        Attribute::MayerMultiple => mayer_multiple(prices, AVERAGE_WINDOW).into(),
        _ => AttributeValue::Null,
    }
}

/// Extraction for Brazilian shares.
pub(crate) fn extract_share(page: &str, prices: &[f64], attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    match attribute {
        AssetsValue => number_after(page, "Ativo</span>"),
        AvgPrice | MayerMultiple => history_stats(prices, attribute),
        Debit => number_after(page, "Dív. Líquida</span>"),
        Dy => number_after(page, "Div. Yield</span>"),
        Ebit => number_after(page, ">EBIT</span>"),
        EnterpriseValue => number_after(page, "Valor da firma</span>"),
        EquityValue => number_after(page, "Patrim. Líq</span>"),
        GrossMargin => number_after(page, "Marg. Bruta</span>"),
        Link => CVM_LINK.into(),
        Liquidity => number_after(page, "Vol $ méd (2m)</span>"),
        MarketValue => number_after(page, "Valor de mercado</span>"),
        Max52Weeks => number_after(page, "Max 52 sem</span>"),
        Min52Weeks => number_after(page, "Min 52 sem</span>"),
        Name => {
            // "PETROBRAS PN": the share type is listed separately and dropped.
            let name = value_after(page, "Empresa</span>");
            let kind = value_after(page, "Tipo</span>");
            name.map(|n| match kind {
                Some(k) => n.replace(&k, "").trim().to_string(),
                None => n,
            })
            .filter(|n| !n.is_empty())
            .into()
        }
        NetMargin => number_after(page, "Marg. Líquida</span>"),
        NetProfit => number_after(page, "Lucro Líquido</span>"),
        NetRevenue => {
            if page.contains("Receita Líquida</span>") {
                number_after(page, "Receita Líquida</span>")
            } else {
                // Banks publish services revenue and financial intermediation
                // separately.
                let services = value_after(page, "Rec Serviços</span>")
                    .and_then(|v| text_to_number(&v, NumberFormat::Brazilian));
                let financial = value_after(page, "Result Int Financ</span>")
                    .and_then(|v| text_to_number(&v, NumberFormat::Brazilian));
                match (services, financial) {
                    (None, None) => AttributeValue::Null,
                    (s, f) => (s.unwrap_or(0.0) + f.unwrap_or(0.0)).into(),
                }
            }
        }
        Pl => number_after(page, "P/L</span>"),
        Price => number_after(page, "Cotação</span>"),
        Pvp => number_after(page, "P/VP</span>"),
        Roe => number_after(page, "ROE</span>"),
        Roic => number_after(page, "ROIC</span>"),
        Sector => cleaned_between(page, "Subsetor</span>", "</a>", &[]).into(),
        TotalIssuedShares => number_after(page, "Nro. Ações</span>"),
        Variation12m => number_after(page, "12 meses</span>"),
        Variation30d => number_after(page, "30 dias</span>"),
        _ => AttributeValue::Null,
    }
}

/// Extraction for Brazilian REITs.
pub(crate) fn extract_reit(page: &str, prices: &[f64], attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    match attribute {
        AssetsValue => number_after(page, ">Ativos</span>"),
        AvgPrice | MayerMultiple => history_stats(prices, attribute),
        CashValue => substring_between(page, "Caixa'", "]")
            .map(|raw| raw.replace(", data : [", ""))
            .and_then(|raw| text_to_number(&raw, NumberFormat::Us))
            .into(),
        Dy => number_after(page, "Div. Yield</span>"),
        EquityPrice => number_after(page, "VP/Cota</span>"),
        Ffoy => number_after(page, "FFO Yield</span>"),
        LatestDividend => number_after(page, "Dividendo/cota</span>"),
        Link => substring_between(page, "<a target=\"_blank\" href=\"", "\">Pesquisar")
            .map(|link| link.replace('#', ""))
            .into(),
        Liquidity => number_after(page, "Vol $ méd (2m)</span>"),
        Management => value_after(page, "Gestão</span>").into(),
        MarketValue => number_after(page, "Valor de mercado</span>"),
        Max52Weeks => number_after(page, "Max 52 sem</span>"),
        Min52Weeks => number_after(page, "Min 52 sem</span>"),
        Name => value_after(page, "Nome</span>").into(),
        NetEquityValue => number_after(page, "Patrim Líquido</span>"),
        Price => number_after(page, "Cotação</span>"),
        Pvp => number_after(page, "P/VP</span>"),
        Segment => value_after(page, "Mandato</span>").into(),
        TotalIssuedShares => number_after(page, "Nro. Cotas</span>"),
        TotalRealState => number_after(page, "Qtd imóveis</span>"),
        Vacancy => value_after(page, "Vacância Média</span>")
            .map(|v| v.replace('-', ""))
            .and_then(|v| text_to_number(&v, NumberFormat::Brazilian))
            .into(),
        Variation12m => number_after(page, "12 meses</span>"),
        Variation30d => number_after(page, "Mês</span>"),
        _ => AttributeValue::Null,
    }
}

#[async_trait]
impl AttributeProvider for FundamentusProvider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::BrStock, AssetClass::BrReit],
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        let class = ctx.asset_class();
        if !self.capabilities().supports(class) {
            return Err(ProviderError::Unsupported {
                source_id: SOURCE,
                asset_class: class,
            });
        }

        let ticker = urlencoding::encode(ctx.instrument_id()).into_owned();
        let page = self
            .http
            .get_text(ctx, SOURCE, &details_url(ctx.instrument_id()), HEADERS)
            .await?;

        if page.contains(NOT_FOUND_MARKER) {
            return Err(ProviderError::NoData {
                source_id: SOURCE,
                instrument_id: ctx.instrument_id().to_string(),
            });
        }

        let prices = if needs_history(attributes) {
            let payload: Value = self
                .http
                .get_json(ctx, SOURCE, &format!("{HISTORY_URL}{ticker}"), HEADERS)
                .await?;
            parse_history(&payload)
        } else {
            Vec::new()
        };
        debug!("Fundamentus: {} historical prices for {}", prices.len(), ticker);

        Ok(match class {
            AssetClass::BrReit => record_from(attributes, |a| extract_reit(&page, &prices, a)),
            _ => record_from(attributes, |a| extract_share(&page, &prices, a)),
        })
    }
}
