//! Funds Explorer adapter.
//!
//! Funds Explorer embeds the same `dataLayer_content` payload as fiis.com.br,
//! except that the trailing dividends are published as `dividendos_12_meses`.
//! It is only consulted when a request names it explicitly.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, SourceId};
use crate::provider::fiis::{extract_terms, parse_terms};
use crate::provider::{
    record_from, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::FundsExplorer;
const BASE_URL: &str = "https://www.fundsexplorer.com.br/funds/";
const LATESTS_DIVIDENDS_KEY: &str = "dividendos_12_meses";

const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("DNT", "1"),
    ("Upgrade-Insecure-Requests", "1"),
];

pub struct FundsExplorerProvider {
    http: PageClient,
}

impl FundsExplorerProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AttributeProvider for FundsExplorerProvider {
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

        let url = format!(
            "{BASE_URL}{}",
            urlencoding::encode(&ctx.instrument_id().to_lowercase())
        );
        let page = self.http.get_text(ctx, SOURCE, &url, HEADERS).await?;
        let terms = parse_terms(&page, SOURCE)?;

        Ok(record_from(attributes, |a| {
            extract_terms(&terms, LATESTS_DIVIDENDS_KEY, a)
        }))
    }
}
