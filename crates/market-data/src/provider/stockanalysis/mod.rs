//! StockAnalysis adapter for US stocks and ETFs.
//!
//! stockanalysis.com is a SvelteKit site: the figures shown on a page are
//! serialized as a JavaScript object literal inside a `Promise.all([...])`
//! call. Values are located by their key (`peRatio:"`) or, for the statistics
//! tables, by their row label (`Beta (5Y)",value:"`).

mod etf;
mod stock;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, SourceId};
use crate::provider::text::{multiply_by_unit, substring_between, text_to_number, NumberFormat};
use crate::provider::{AttributeProvider, FetchContext, PageClient, ProviderCapabilities};

const SOURCE: SourceId = SourceId::StockAnalysis;
const BASE_URL: &str = "https://stockanalysis.com";

const HEADERS: &[(&str, &str)] = &[
    ("Accept", crate::provider::http::ACCEPT_HTML),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Cache-Control", "no-cache"),
    ("Referer", "https://stockanalysis.com/"),
];

/// Start of the serialized page data.
const DATA_START: &str = "Promise.all([";

pub struct StockAnalysisProvider {
    http: PageClient,
}

impl StockAnalysisProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

/// The serialized data block of a page, up to `end`.
fn data_block(page: &str, end: &str) -> Result<String, ProviderError> {
    substring_between(page, DATA_START, end)
        .ok_or_else(|| ProviderError::parse(SOURCE, "page data block not found"))
}

fn number_between(data: &str, start: &str, end: &str) -> Option<f64> {
    substring_between(data, start, end).and_then(|text| text_to_number(&text, NumberFormat::Us))
}

/// Like [`number_between`], accepting magnitude suffixes (`3.2B`).
fn amount_between(data: &str, start: &str, end: &str) -> Option<f64> {
    substring_between(data, start, end).and_then(|text| multiply_by_unit(&text, NumberFormat::Us))
}

#[async_trait]
impl AttributeProvider for StockAnalysisProvider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::Stock, AssetClass::Etf],
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        match ctx.asset_class() {
            AssetClass::Stock => stock::fetch(&self.http, ctx, attributes).await,
            AssetClass::Etf => etf::fetch(&self.http, ctx, attributes).await,
            other => Err(ProviderError::Unsupported {
                source_id: SOURCE,
                asset_class: other,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_block_is_required() {
        let page = r#"<script>Promise.all([{type:"data",data:{cl:12.5,}}]);news:[]</script>"#;
        assert!(data_block(page, "news:").is_ok_and(|data| data.contains("cl:12.5")));
        assert!(matches!(
            data_block("<html></html>", "news:"),
            Err(ProviderError::Parse { .. })
        ));
    }

    #[test]
    fn amounts_accept_suffixes() {
        let data = r#"marketCap:"3.45T",revenue:"391.04B",sharesOut:"15.12B""#;
        assert_eq!(amount_between(data, "marketCap:\"", "\""), Some(3.45e12));
        assert_eq!(number_between(data, "marketCap:\"", "\""), None);
    }
}
