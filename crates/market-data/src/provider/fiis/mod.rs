//! FIIs adapter.
//!
//! fiis.com.br embeds the fund's indicators as a JSON object assigned to
//! `dataLayer_content`; everything lives under `pagePostTerms.meta`. Funds
//! Explorer publishes the same payload, so its adapter reuses this parsing.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, AttributeValue, SourceId};
use crate::provider::json::{at, number_at, text, text_at};
use crate::provider::text::{substring_between, NumberFormat};
use crate::provider::{
    record_from, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::Fiis;
const BASE_URL: &str = "https://fiis.com.br/";
pub(crate) const FNET_URL: &str =
    "https://fnet.bmfbovespa.com.br/fnet/publico/abrirGerenciadorDocumentosCVM?cnpjFundo=";

/// Meta key holding the trailing dividends on fiis.com.br.
const LATESTS_DIVIDENDS_KEY: &str = "currentsumdividends";

pub(crate) const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Origin", "https://fiis.com.br"),
    ("Referer", "https://fiis.com.br/lupa-de-fiis/"),
];

pub struct FiisProvider {
    http: PageClient,
}

impl FiisProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

/// Page of a fund on fiis.com.br.
pub(crate) fn page_url(ticker: &str) -> String {
    format!("{BASE_URL}{}/", urlencoding::encode(&ticker.to_lowercase()))
}

/// CNPJ embedded in the page's JSON, with escaped slashes restored.
pub(crate) fn parse_cnpj(page: &str) -> Option<String> {
    substring_between(page, "cnpj\":\"", "\"").map(|cnpj| cnpj.replace('\\', ""))
}

/// Pulls `pagePostTerms` out of the page's `dataLayer_content` assignment.
pub(crate) fn parse_terms(page: &str, source_id: SourceId) -> Result<Value, ProviderError> {
    let raw = substring_between(page, "var dataLayer_content", "dataLayer.push")
        .ok_or_else(|| ProviderError::parse(source_id, "dataLayer_content not found"))?;
    let json = raw.trim_matches(|c: char| c == ';' || c == '=' || c == ' ');

    let mut payload: Value = serde_json::from_str(json)
        .map_err(|e| ProviderError::parse(source_id, format!("Invalid dataLayer JSON: {e}")))?;

    match payload.get_mut("pagePostTerms") {
        Some(terms) => Ok(terms.take()),
        None => Err(ProviderError::parse(source_id, "pagePostTerms missing")),
    }
}

pub(crate) fn extract(terms: &Value, attribute: Attribute) -> AttributeValue {
    extract_terms(terms, LATESTS_DIVIDENDS_KEY, attribute)
}

/// Maps `pagePostTerms` to an attribute. Sites publishing this payload only
/// disagree on where the trailing dividends live.
pub(crate) fn extract_terms(
    terms: &Value,
    latests_dividends_key: &str,
    attribute: Attribute,
) -> AttributeValue {
    use Attribute::*;

    let meta_number = |key: &str| number_at(terms, &["meta", key], NumberFormat::Brazilian);
    let meta_text = |key: &str| text_at(terms, &["meta", key]);

    match attribute {
        Actuation => at(terms, &["category"]).and_then(text).into(),
        CashValue => meta_number("valor_caixa"),
        Dy => meta_number("dy"),
        EquityPrice => meta_number("valorpatrimonialcota"),
        InitialDate => meta_text("firstdate"),
        LatestDividend => meta_number("lastdividend"),
        LatestsDividends => meta_number(latests_dividends_key),
        Link => at(terms, &["meta", "cnpj"])
            .and_then(text)
            .map(|cnpj| format!("{FNET_URL}{}#", cnpj.replace('\\', "")))
            .into(),
        Liquidity => meta_number("liquidezmediadiaria"),
        Management => meta_text("gestao"),
        MarketValue => meta_number("valormercado"),
        Max52Weeks => meta_number("max_52_semanas"),
        Min52Weeks => meta_number("min_52_semanas"),
        Name => meta_text("name"),
        NetEquityValue => meta_number("patrimonio"),
        Price => meta_number("valor"),
        Pvp => meta_number("pvp"),
        Segment => meta_text("segmento_ambima"),
        TargetPublic => meta_text("publicoalvo"),
        Term => meta_text("prazoduracao"),
        TotalIssuedShares => meta_number("numero_cotas"),
        TotalRealState => meta_number("assets_number"),
        Type => meta_text("setor_atuacao"),
        Vacancy => meta_number("vacancia"),
        Variation12m => meta_number("valorizacao_12_meses"),
        Variation30d => meta_number("valorizacao_mes"),
        _ => AttributeValue::Null,
    }
}

#[async_trait]
impl AttributeProvider for FiisProvider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::BrReit],
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        if ctx.asset_class() != AssetClass::BrReit {
            return Err(ProviderError::Unsupported {
                source_id: SOURCE,
                asset_class: ctx.asset_class(),
            });
        }

        let url = page_url(ctx.instrument_id());
        let page = self.http.get_text(ctx, SOURCE, &url, HEADERS).await?;
        let terms = parse_terms(&page, SOURCE)?;

        Ok(record_from(attributes, |a| extract(&terms, a)))
    }
}
