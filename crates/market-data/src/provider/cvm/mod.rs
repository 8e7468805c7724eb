//! CVM adapter.
//!
//! The CVM registry is searched by CNPJ, which is read from the company's
//! Investidor10 page. That page is fetched through the shared context, so an
//! Investidor10 call later in the same cascade parses it without downloading
//! it again. The only attribute CVM resolves is the filings `link`.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, AttributeValue, SourceId};
use crate::provider::investidor10::{self, share_page_url};
use crate::provider::text::substring_between;
use crate::provider::{
    record_from, unresolved, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::Cvm;
const SEARCH_URL: &str =
    "https://cvmweb.cvm.gov.br/SWB/Sistemas/SCW/CPublica/CiaAb/ResultBuscaParticCiaAb.aspx";
const FILINGS_URL: &str =
    "https://www.rad.cvm.gov.br/ENET/frmConsultaExternaCVM.aspx?tipoconsulta=CVM&codigoCVM=";
const CODE_START: &str = "dlCiasCdCVM$_ctl1$Linkbutton5&#39;,&#39;&#39;)\">";

const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
];

pub struct CvmProvider {
    http: PageClient,
}

impl CvmProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

/// CVM code from the registry search result.
pub(crate) fn parse_cvm_code(page: &str) -> Option<String> {
    substring_between(page, CODE_START, "</a>")
}

pub(crate) fn extract(cvm_code: &str, attribute: Attribute) -> AttributeValue {
    match attribute {
        Attribute::Link => format!("{FILINGS_URL}{cvm_code}").into(),
        _ => AttributeValue::Null,
    }
}

#[async_trait]
impl AttributeProvider for CvmProvider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::BrStock],
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        if ctx.asset_class() != AssetClass::BrStock {
            return Err(ProviderError::Unsupported {
                source_id: SOURCE,
                asset_class: ctx.asset_class(),
            });
        }
        if !attributes.contains(&Attribute::Link) {
            return Ok(unresolved(attributes));
        }

        let company_url = share_page_url(ctx.instrument_id());
        let company_page = self
            .http
            .get_text(ctx, SOURCE, &company_url, investidor10::HEADERS)
            .await?;
        let cnpj = investidor10::parse_cnpj(&company_page).ok_or_else(|| ProviderError::NoData {
            source_id: SOURCE,
            instrument_id: ctx.instrument_id().to_string(),
        })?;
        debug!("CVM: {} has CNPJ {}", ctx.instrument_id(), cnpj);

        let url = format!(
            "{SEARCH_URL}?CNPJNome={}&TipoConsult=C",
            urlencoding::encode(&cnpj)
        );
        let result_page = self.http.get_text(ctx, SOURCE, &url, HEADERS).await?;
        let code = parse_cvm_code(&result_page)
            .ok_or_else(|| ProviderError::parse(SOURCE, "CVM code not found in search result"))?;

        Ok(record_from(attributes, |a| extract(&code, a)))
    }
}
