//! BM&FBovespa (FNET) adapter.
//!
//! Real estate funds file structured reports with B3's FNET system. Three of
//! them are read here:
//!
//! | Filing                       | Used for                                    |
//! |------------------------------|---------------------------------------------|
//! | monthly report (IME)         | balance sheet lines, fund details, `type`   |
//! | quarterly report (ITE)       | number of properties, mortgages and stocks  |
//! | distributions (RA), 1 year   | `latest_dividend`, `latests_dividends`      |
//!
//! FNET is searched by CNPJ. The CNPJ is read from the fund's page on
//! Fundamentus, FIIs or Investidor10, in that order, through the shared
//! context, so those adapters reuse the page later in the cascade. Filings are
//! only downloaded when a requested attribute needs them. Documents come back
//! base64 encoded.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Datelike, Local, NaiveDate};
use serde_json::Value;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, AttributeValue, SourceId};
use crate::provider::fiis::{self, FNET_URL};
use crate::provider::investidor10;
use crate::provider::json::{at, text};
use crate::provider::text::{cleaned_between, substring_between, text_to_number, NumberFormat};
use crate::provider::{
    fundamentus, record_from, unresolved, AttributeProvider, FetchContext, PageClient,
    ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::BmfBovespa;
const FNET_BASE: &str = "https://fnet.bmfbovespa.com.br/fnet/publico";

const HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json, text/javascript, */*; q=0.01"),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    (
        "Referer",
        "https://fnet.bmfbovespa.com.br/fnet/publico/abrirGerenciadorDocumentosCVM",
    ),
    ("X-Requested-With", "XMLHttpRequest"),
];

const MORTGAGE_LINES: &[&str] = &[
    "Certificados de Dep&oacute;sitos de Valores Mobili&aacute;rios",
    "Notas Promiss&oacute;rias",
    "Notas Comerciais",
    "CRI\" (se FIAGRO, Certificado de Receb&iacute;veis do Agroneg&oacute;cio \"CRA\")",
    "Hipotec&aacute;rias",
    "LCI\" (se FIAGRO, Letras de Cr&eacute;dito do Agroneg&oacute;cio \"LCA\")",
    "LIG)",
];

const STOCKS_FUND_OTHERS_LINES: &[&str] = &[
    "A&ccedil;&otilde;es",
    "Deb&ecirc;ntures",
    "certificados de desdobramentos",
    "FIA)",
    "FIP)",
    "FII)",
    "FIDC)",
    "Outras cotas de Fundos de Investimento",
    "A&ccedil;&otilde;es de Sociedades cujo &uacute;nico prop&oacute;sito se enquadra entre as atividades permitidas aos FII",
    "Cotas de Sociedades que se enquadre entre as atividades permitidas aos FII",
    "CEPAC)",
    "Outros Valores Mobili&aacute;rios",
];

const REAL_STATE_LINE: &str = "Direitos reais sobre bens im&oacute;veis ";

/// FNET filings read by this adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Filing {
    MonthlyReport,
    QuarterlyReport,
    Distributions,
}

impl Filing {
    /// The filing an attribute is read from. `link` needs only the CNPJ.
    fn for_attribute(attribute: Attribute) -> Option<Filing> {
        use Attribute::*;

        match attribute {
            AssetsValue
            | CashValue
            | DebitByRealStateAcquisition
            | DebitBySecuritizationReceivablesAcquisition
            | EquityPrice
            | InitialDate
            | Management
            | Name
            | NetEquityValue
            | Segment
            | TargetPublic
            | Term
            | TotalIssuedShares
            | TotalMortgageValue
            | TotalRealStateValue
            | TotalStocksFundOthersValue
            | Type => Some(Filing::MonthlyReport),
            TotalMortgage | TotalRealState | TotalStocksFundOthers => {
                Some(Filing::QuarterlyReport)
            }
            LatestDividend | LatestsDividends => Some(Filing::Distributions),
            _ => None,
        }
    }

    fn needed_by(self, attributes: &[Attribute]) -> bool {
        attributes
            .iter()
            .any(|a| Filing::for_attribute(*a) == Some(self))
    }

    /// `(d, idCategoriaDocumento, idTipoDocumento, page size)` of the search.
    fn search_params(self) -> (u8, u8, u8, u8) {
        match self {
            Filing::MonthlyReport => (3, 6, 40, 10),
            Filing::QuarterlyReport => (4, 6, 45, 10),
            Filing::Distributions => (5, 14, 41, 25),
        }
    }

    /// Search for this filing. Reports are limited to the latest reference
    /// date; distributions to the year ending `today`.
    fn search_url(self, cnpj: &str, today: NaiveDate) -> String {
        let (d, category, kind, limit) = self.search_params();
        let range = match self {
            Filing::Distributions => format!(
                "&dataInicial={day:02}%2F{month:02}%2F{from}&dataFinal={day:02}%2F{month:02}%2F{to}",
                day = today.day(),
                month = today.month(),
                from = today.year() - 1,
                to = today.year(),
            ),
            _ => "&ultimaDataReferencia=true".to_string(),
        };

        format!(
            "{FNET_BASE}/pesquisarGerenciadorDocumentosDados?d={d}&s=0&l={limit}\
             &o%5B0%5D%5BdataEntrega%5D=desc&tipoFundo=1&idCategoriaDocumento={category}\
             &idTipoDocumento={kind}&idEspecieDocumento=0&situacao=A&cnpj={cnpj}\
             &cnpjFundo={cnpj}&isSession=false{range}"
        )
    }
}

/// Filings downloaded for one fetch. Absent documents leave their attributes
/// unresolved.
#[derive(Debug, Default)]
struct Filings {
    monthly: Option<String>,
    quarterly: Option<String>,
    /// Amount per unit keyed by payment date.
    distributions: BTreeMap<NaiveDate, f64>,
}

pub struct BmfBovespaProvider {
    http: PageClient,
}

impl BmfBovespaProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }

    /// Finds the fund's CNPJ on the first site that prints it.
    async fn find_cnpj(&self, ctx: &mut FetchContext) -> Option<String> {
        type Lookup = (
            &'static str,
            String,
            &'static [(&'static str, &'static str)],
            fn(&str) -> Option<String>,
        );

        let ticker = ctx.instrument_id().to_string();
        let lookups: [Lookup; 3] = [
            (
                "Fundamentus",
                fundamentus::details_url(&ticker),
                fundamentus::HEADERS,
                fundamentus::parse_fund_cnpj,
            ),
            (
                "FIIs",
                fiis::page_url(&ticker),
                fiis::HEADERS,
                fiis::parse_cnpj,
            ),
            (
                "Investidor10",
                investidor10::fund_page_url(&ticker),
                investidor10::HEADERS,
                investidor10::parse_fund_cnpj,
            ),
        ];

        for (site, url, headers, parse) in lookups {
            match self.http.get_text(ctx, SOURCE, &url, headers).await {
                Ok(page) => match parse(&page).and_then(|cnpj| normalize_cnpj(&cnpj)) {
                    Some(cnpj) => return Some(cnpj),
                    None => debug!("BM&FBovespa: no CNPJ for {} on {}", ticker, site),
                },
                Err(e) => debug!("BM&FBovespa: CNPJ lookup on {} failed: {}", site, e),
            }
        }
        None
    }

    /// Ids of the matching documents, newest first.
    async fn search(
        &self,
        ctx: &mut FetchContext,
        cnpj: &str,
        filing: Filing,
    ) -> Result<Vec<String>, ProviderError> {
        let url = filing.search_url(cnpj, Local::now().date_naive());
        let payload: Value = self.http.get_json(ctx, SOURCE, &url, HEADERS).await?;
        let ids = parse_document_ids(&payload);
        debug!("BM&FBovespa: {} {:?} documents for {}", ids.len(), filing, cnpj);
        Ok(ids)
    }

    async fn document(&self, ctx: &mut FetchContext, id: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{FNET_BASE}/exibirDocumento?id={}&cvm=true",
            urlencoding::encode(id)
        );
        let body = self.http.get_text(ctx, SOURCE, &url, HEADERS).await?;
        decode_document(&body)
    }

    /// The most recent document of a report filing.
    async fn latest_report(
        &self,
        ctx: &mut FetchContext,
        cnpj: &str,
        filing: Filing,
    ) -> Result<Option<String>, ProviderError> {
        let ids = self.search(ctx, cnpj, filing).await?;
        match ids.first() {
            Some(id) => Ok(Some(self.document(ctx, id).await?)),
            None => Ok(None),
        }
    }

    async fn distributions(
        &self,
        ctx: &mut FetchContext,
        cnpj: &str,
    ) -> Result<BTreeMap<NaiveDate, f64>, ProviderError> {
        let mut paid = BTreeMap::new();
        for id in self.search(ctx, cnpj, Filing::Distributions).await? {
            let document = self.document(ctx, &id).await?;
            if let Some((date, amount)) = parse_distribution(&document) {
                paid.insert(date, amount);
            }
        }
        Ok(paid)
    }
}

/// Keeps only the digits of a CNPJ; FNET expects the bare number.
fn normalize_cnpj(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

fn parse_document_ids(payload: &Value) -> Vec<String> {
    at(payload, &["data"])
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(|row| row.get("id").and_then(text)).collect())
        .unwrap_or_default()
}

/// FNET answers with the document's HTML base64 encoded, sometimes as a JSON
/// string.
fn decode_document(body: &str) -> Result<String, ProviderError> {
    let encoded: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"')
        .collect();
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| ProviderError::parse(SOURCE, format!("Invalid document encoding: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Payment date and amount per unit of a distribution notice.
fn parse_distribution(document: &str) -> Option<(NaiveDate, f64)> {
    let date = cleaned_between(document, "Data do pagamento", "</span>", &[])?;
    let date = NaiveDate::parse_from_str(&date, "%d/%m/%Y").ok()?;
    let amount = cleaned_between(document, "Valor do provento (R$/unidade)", "</span>", &[])
        .and_then(|v| text_to_number(&v, NumberFormat::Brazilian))?;
    Some((date, amount))
}

/// Text of a report line, with every HTML entity decoded.
fn line_text(document: &str, label: &str) -> Option<String> {
    cleaned_between(document, label, "</span>", &[])
        .map(|text| htmlescape::decode_html(&text).unwrap_or(text))
}

fn line_number(document: &str, label: &str) -> Option<f64> {
    cleaned_between(document, label, "</span>", &[])
        .and_then(|text| text_to_number(&text, NumberFormat::Brazilian))
}

/// Sum of the report lines present; `None` when none of them is.
fn sum_of_lines(document: &str, labels: &[&str]) -> Option<f64> {
    labels
        .iter()
        .filter_map(|label| line_number(document, label))
        .fold(None, |total, value| Some(total.unwrap_or(0.0) + value))
}

fn total_mortgage_value(monthly: &str) -> Option<f64> {
    sum_of_lines(monthly, MORTGAGE_LINES)
}

fn total_stocks_fund_others_value(monthly: &str) -> Option<f64> {
    sum_of_lines(monthly, STOCKS_FUND_OTHERS_LINES)
}

fn total_real_state_value(monthly: &str) -> Option<f64> {
    line_number(monthly, REAL_STATE_LINE)
}

/// Classifies the fund by where most of its assets are. Ties go to the
/// earlier of `Outro`, `Papel`, `Tijolo`.
fn fund_type(monthly: &str) -> Option<&'static str> {
    [
        ("Outro", total_stocks_fund_others_value(monthly)),
        ("Papel", total_mortgage_value(monthly)),
        ("Tijolo", total_real_state_value(monthly)),
    ]
    .into_iter()
    .filter_map(|(kind, value)| value.map(|v| (kind, v)))
    .fold(None, |best: Option<(&'static str, f64)>, (kind, value)| match best {
        Some((_, top)) if top >= value => best,
        _ => Some((kind, value)),
    })
    .map(|(kind, _)| kind)
}

/// Table rows in a section of the quarterly report, minus the section's
/// header rows.
fn section_rows(quarterly: &str, start: &str, end: &str, header_rows: usize) -> Option<usize> {
    let section = substring_between(quarterly, start, end)?;
    Some(section.matches("</tr>").count().saturating_sub(header_rows))
}

fn total_mortgage(quarterly: &str) -> Option<f64> {
    section_rows(quarterly, " 1.2.2", "1.2.6", 8).map(|rows| rows as f64)
}

/// Properties with a listed area plus the rows of the land section.
fn total_real_state(quarterly: &str) -> Option<f64> {
    let with_area = quarterly.matches("&Aacute;rea (m2):").count();
    section_rows(quarterly, "1.1.1", ">1.1.2<", 2).map(|rows| (with_area + rows) as f64)
}

fn total_stocks_fund_others(quarterly: &str) -> Option<f64> {
    let securities = section_rows(quarterly, " 1.2.1", " 1.2.2", 2)?;
    let others = section_rows(quarterly, " 1.2.6", ">1.3<", 16)?;
    Some((securities + others) as f64)
}

fn extract(filings: &Filings, cnpj: &str, attribute: Attribute) -> AttributeValue {
    use Attribute::*;

    if attribute == Link {
        return format!("{FNET_URL}{cnpj}#").into();
    }
    if matches!(attribute, LatestDividend | LatestsDividends) {
        let paid = &filings.distributions;
        return match attribute {
            LatestDividend => paid.last_key_value().map(|(_, amount)| *amount).into(),
            _ if paid.is_empty() => AttributeValue::Null,
            _ => paid.values().sum::<f64>().into(),
        };
    }
    if let Some(quarterly) = filings.quarterly.as_deref() {
        match attribute {
            TotalMortgage => return total_mortgage(quarterly).into(),
            TotalRealState => return total_real_state(quarterly).into(),
            TotalStocksFundOthers => return total_stocks_fund_others(quarterly).into(),
            _ => {}
        }
    }
    let Some(monthly) = filings.monthly.as_deref() else {
        return AttributeValue::Null;
    };

    match attribute {
        AssetsValue => line_number(monthly, "Ativo &ndash; R$").into(),
        CashValue => line_number(
            monthly,
            "Total mantido para as Necessidades de Liquidez (art. 46, &sect; &uacute;nico, ICVM 472/08) </b>",
        )
        .into(),
        DebitByRealStateAcquisition => line_number(
            monthly,
            "Obriga&ccedil;&otilde;es por aquisi&ccedil;&atilde;o de im&oacute;veis",
        )
        .into(),
        DebitBySecuritizationReceivablesAcquisition => line_number(
            monthly,
            "Obriga&ccedil;&otilde;es por securitiza&ccedil;&atilde;o de receb&iacute;veis",
        )
        .into(),
        EquityPrice => line_number(monthly, "Valor Patrimonial das Cotas &ndash; R$").into(),
        InitialDate => line_text(monthly, "doc de Funcionamento:").into(),
        Management => line_text(monthly, "Tipo de Gest&atilde;o:").into(),
        Name => line_text(monthly, "Nome do Fundo/Classe: </span>").into(),
        NetEquityValue => line_number(monthly, "Patrim&ocirc;nio L&iacute;quido &ndash; R$").into(),
        Segment => line_text(monthly, "Segmento de Atua&ccedil;&atilde;o:").into(),
        TargetPublic => line_text(monthly, "P&uacute;blico Alvo: </span>").into(),
        Term => line_text(monthly, ">Prazo de Dura&ccedil;&atilde;o: </span>").into(),
        TotalIssuedShares => line_number(monthly, "Quantidade de cotas emitidas: </span>").into(),
        TotalMortgageValue => total_mortgage_value(monthly).into(),
        TotalRealStateValue => total_real_state_value(monthly).into(),
        TotalStocksFundOthersValue => total_stocks_fund_others_value(monthly).into(),
        Type => fund_type(monthly).into(),
        _ => AttributeValue::Null,
    }
}

#[async_trait]
impl AttributeProvider for BmfBovespaProvider {
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
        let resolvable = attributes
            .iter()
            .any(|a| *a == Attribute::Link || Filing::for_attribute(*a).is_some());
        if !resolvable {
            return Ok(unresolved(attributes));
        }

        let cnpj = self.find_cnpj(ctx).await.ok_or_else(|| ProviderError::NoData {
            source_id: SOURCE,
            instrument_id: ctx.instrument_id().to_string(),
        })?;
        debug!("BM&FBovespa: {} has CNPJ {}", ctx.instrument_id(), cnpj);

        let mut filings = Filings::default();
        if Filing::MonthlyReport.needed_by(attributes) {
            filings.monthly = self.latest_report(ctx, &cnpj, Filing::MonthlyReport).await?;
        }
        if Filing::QuarterlyReport.needed_by(attributes) {
            filings.quarterly = self.latest_report(ctx, &cnpj, Filing::QuarterlyReport).await?;
        }
        if Filing::Distributions.needed_by(attributes) {
            filings.distributions = self.distributions(ctx, &cnpj).await?;
        }

        Ok(record_from(attributes, |a| extract(&filings, &cnpj, a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    const MONTHLY: &str = r##"
        <table>
        <tr><td><span class="titulo-dado">Nome do Fundo/Classe: </span></td><td><span class="dado-cabecalho">FUNDO DE INVESTIMENTO IMOBILI&Aacute;RIO MAXI RENDA</span></td></tr>
        <tr><td><b>Data de In&iacute;cio doc de Funcionamento:</b></td><td><span class="dado-cabecalho">22/11/2011</span></td></tr>
        <tr><td><b>P&uacute;blico Alvo: </span></b></td><td><span class="dado-cabecalho">Investidores em Geral</span></td></tr>
        <tr><td><b>Segmento de Atua&ccedil;&atilde;o:</b></td><td><span class="dado-cabecalho">T&iacute;tulos e Val. Mob.</span></td></tr>
        <tr><td><b>Tipo de Gest&atilde;o:</b></td><td><span class="dado-cabecalho">Ativa</span></td></tr>
        <tr><td><b>Quantidade de cotas emitidas: </span></b></td><td><span class="dado-valores">1.000.000</span></td></tr>
        <tr><td><b>Ativo &ndash; R$</b></td><td><span class="dado-valores">3.500.000,00</span></td></tr>
        <tr><td><b>Patrim&ocirc;nio L&iacute;quido &ndash; R$</b></td><td><span class="dado-valores">3.200.000,00</span></td></tr>
        <tr><td><b>Valor Patrimonial das Cotas &ndash; R$</b></td><td><span class="dado-valores">3,20</span></td></tr>
        <tr><td><b>Direitos reais sobre bens im&oacute;veis </b></td><td><span class="dado-valores">500.000,00</span></td></tr>
        <tr><td><b>A&ccedil;&otilde;es</b></td><td><span class="dado-valores">100.000,00</span></td></tr>
        <tr><td><b>Deb&ecirc;ntures</b></td><td><span class="dado-valores">50.000,00</span></td></tr>
        <tr><td><b>CRI" (se FIAGRO, Certificado de Receb&iacute;veis do Agroneg&oacute;cio "CRA")</b></td><td><span class="dado-valores">2.000.000,00</span></td></tr>
        <tr><td><b>LCI" (se FIAGRO, Letras de Cr&eacute;dito do Agroneg&oacute;cio "LCA")</b></td><td><span class="dado-valores">250.000,00</span></td></tr>
        <tr><td><b>Obriga&ccedil;&otilde;es por aquisi&ccedil;&atilde;o de im&oacute;veis</b></td><td><span class="dado-valores">0,00</span></td></tr>
        </table>
    "##;

    fn monthly_filings(document: &str) -> Filings {
        Filings {
            monthly: Some(document.to_string()),
            ..Filings::default()
        }
    }

    fn rows(count: usize) -> String {
        "<tr><td>x</td></tr>".repeat(count)
    }

    #[test]
    fn monthly_report_lines() {
        let filings = monthly_filings(MONTHLY);
        let record = record_from(
            &[
                Attribute::Name,
                Attribute::InitialDate,
                Attribute::TargetPublic,
                Attribute::Segment,
                Attribute::Management,
                Attribute::TotalIssuedShares,
                Attribute::AssetsValue,
                Attribute::NetEquityValue,
                Attribute::EquityPrice,
                Attribute::DebitByRealStateAcquisition,
                Attribute::DebitBySecuritizationReceivablesAcquisition,
            ],
            |a| extract(&filings, "97521225000125", a),
        );

        assert_eq!(
            record.get(Attribute::Name),
            Some(&"FUNDO DE INVESTIMENTO IMOBILIÁRIO MAXI RENDA".into())
        );
        assert_eq!(record.get(Attribute::InitialDate), Some(&"22/11/2011".into()));
        assert_eq!(
            record.get(Attribute::TargetPublic),
            Some(&"Investidores em Geral".into())
        );
        assert_eq!(record.get(Attribute::Segment), Some(&"Títulos e Val. Mob.".into()));
        assert_eq!(record.get(Attribute::Management), Some(&"Ativa".into()));
        assert_eq!(record.get(Attribute::TotalIssuedShares), Some(&1_000_000.0.into()));
        assert_eq!(record.get(Attribute::AssetsValue), Some(&3_500_000.0.into()));
        assert_eq!(record.get(Attribute::NetEquityValue), Some(&3_200_000.0.into()));
        assert_eq!(record.get(Attribute::EquityPrice), Some(&3.2.into()));
        assert_eq!(record.get(Attribute::DebitByRealStateAcquisition), Some(&0.0.into()));
        assert_eq!(
            record.get(Attribute::DebitBySecuritizationReceivablesAcquisition),
            Some(&AttributeValue::Null)
        );
    }

    #[test]
    fn asset_totals_and_type_follow_the_largest_group() {
        let filings = monthly_filings(MONTHLY);
        let value = |a| extract(&filings, "1", a);

        assert_eq!(value(Attribute::TotalMortgageValue), AttributeValue::from(2_250_000.0));
        assert_eq!(value(Attribute::TotalStocksFundOthersValue), AttributeValue::from(150_000.0));
        assert_eq!(value(Attribute::TotalRealStateValue), AttributeValue::from(500_000.0));
        assert_eq!(value(Attribute::Type), AttributeValue::from("Papel"));
    }

    #[test]
    fn type_ties_prefer_the_first_group() {
        let document = r#"
            <tr><td><b>A&ccedil;&otilde;es</b></td><td><span>10,00</span></td></tr>
            <tr><td><b>Direitos reais sobre bens im&oacute;veis </b></td><td><span>10,00</span></td></tr>
        "#;
        assert_eq!(fund_type(document), Some("Outro"));
        assert_eq!(fund_type("<table></table>"), None);
    }

    #[test]
    fn quarterly_report_counts_rows_past_the_headers() {
        let quarterly = format!(
            "<table>\
             <tr><td>1.1.1</td></tr>{land}\
             <tr><td>&Aacute;rea (m2): 1.200</td></tr>\
             <tr><td>1.1.2</td></tr>\
             <tr><td> 1.2.1</td></tr>{securities}\
             <tr><td> 1.2.2</td></tr>{mortgages}\
             <tr><td> 1.2.6</td></tr>{others}\
             <tr><td>1.3</td></tr>\
             </table>",
            land = rows(3),
            securities = rows(4),
            mortgages = rows(10),
            others = rows(17),
        );
        let filings = Filings {
            quarterly: Some(quarterly),
            ..Filings::default()
        };

        assert_eq!(extract(&filings, "1", Attribute::TotalRealState), AttributeValue::from(4.0));
        assert_eq!(extract(&filings, "1", Attribute::TotalMortgage), AttributeValue::from(3.0));
        assert_eq!(
            extract(&filings, "1", Attribute::TotalStocksFundOthers),
            AttributeValue::from(5.0)
        );
    }

    #[test]
    fn distributions_give_latest_and_total() {
        let notice = |date: &str, amount: &str| {
            format!(
                "<table><tr><td>Data do pagamento</td><td><span class=\"dado-valores\">{date}</span></td></tr>\
                 <tr><td>Valor do provento (R$/unidade)</td><td><span class=\"dado-valores\">{amount}</span></td></tr></table>"
            )
        };

        let mut distributions = BTreeMap::new();
        for document in [
            notice("14/03/2024", "0,11"),
            notice("15/12/2023", "0,12"),
            notice("14/02/2024", "0,10"),
        ] {
            let (date, amount) = parse_distribution(&document).unwrap();
            distributions.insert(date, amount);
        }
        assert_eq!(parse_distribution("<table></table>"), None);

        let filings = Filings {
            distributions,
            ..Filings::default()
        };
        assert_eq!(extract(&filings, "1", Attribute::LatestDividend), AttributeValue::from(0.11));
        match extract(&filings, "1", Attribute::LatestsDividends) {
            AttributeValue::Number(total) => assert!((total - 0.33).abs() < 1e-9),
            other => panic!("unexpected total {other:?}"),
        }

        let empty = Filings::default();
        assert_eq!(extract(&empty, "1", Attribute::LatestsDividends), AttributeValue::Null);
    }

    #[test]
    fn link_needs_only_the_cnpj() {
        let empty = Filings::default();
        assert_eq!(
            extract(&empty, "97521225000125", Attribute::Link),
            AttributeValue::from(format!("{FNET_URL}97521225000125#"))
        );
        assert_eq!(extract(&empty, "97521225000125", Attribute::Name), AttributeValue::Null);
    }

    #[test]
    fn only_the_needed_filings_are_downloaded() {
        assert!(Filing::MonthlyReport.needed_by(&[Attribute::Price, Attribute::Type]));
        assert!(!Filing::QuarterlyReport.needed_by(&[Attribute::Type]));
        assert!(Filing::Distributions.needed_by(&[Attribute::LatestsDividends]));
        assert_eq!(Filing::for_attribute(Attribute::Link), None);
        assert_eq!(Filing::for_attribute(Attribute::Vacancy), None);
    }

    #[test]
    fn search_urls_carry_the_filing_and_period() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let monthly = Filing::MonthlyReport.search_url("97521225000125", today);
        assert!(monthly.starts_with(&format!("{FNET_BASE}/pesquisarGerenciadorDocumentosDados?d=3&")));
        assert!(monthly.contains("&idCategoriaDocumento=6&idTipoDocumento=40&"));
        assert!(monthly.contains("&cnpj=97521225000125&cnpjFundo=97521225000125&"));
        assert!(monthly.ends_with("&ultimaDataReferencia=true"));

        let paid = Filing::Distributions.search_url("97521225000125", today);
        assert!(paid.contains("?d=5&s=0&l=25&"));
        assert!(paid.ends_with("&dataInicial=05%2F03%2F2023&dataFinal=05%2F03%2F2024"));
    }

    #[test]
    fn documents_are_base64_and_ids_come_from_search_data() {
        let encoded = format!("\"{}\"", BASE64.encode("<html>Ativo &ndash; R$</html>"));
        assert_eq!(decode_document(&encoded).unwrap(), "<html>Ativo &ndash; R$</html>");
        assert!(matches!(
            decode_document("not base64!"),
            Err(ProviderError::Parse { .. })
        ));

        let payload = serde_json::json!({"data": [{"id": 512345}, {"id": "512300"}, {"x": 1}]});
        assert_eq!(parse_document_ids(&payload), vec!["512345", "512300"]);
        assert!(parse_document_ids(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn cnpj_is_reduced_to_digits() {
        assert_eq!(normalize_cnpj("97.521.225/0001-25").as_deref(), Some("97521225000125"));
        assert_eq!(normalize_cnpj(" - "), None);
    }

    #[tokio::test]
    async fn nothing_is_fetched_for_attributes_filings_do_not_carry() {
        let provider = BmfBovespaProvider::new(PageClient::default());
        let mut ctx = FetchContext::new(AssetClass::BrReit, "MXRF11");

        let record = provider
            .fetch(&mut ctx, &[Attribute::Price, Attribute::Vacancy])
            .await
            .unwrap();

        assert_eq!(record.get(Attribute::Price), Some(&AttributeValue::Null));
        assert_eq!(ctx.cached_page_count(), 0);
    }
}
