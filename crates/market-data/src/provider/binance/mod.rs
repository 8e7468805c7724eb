//! Binance adapter.
//!
//! Binance only knows about yield: the flexible savings APY (`dy`) and the
//! expected payout for one unit held (`latests_dividends`), from which the
//! weekly payout (`latest_dividend`) is derived. Products are keyed by the
//! trading symbol, not the slug.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::models::{AssetClass, Attribute, AttributeRecord, AttributeValue, SourceId};
use crate::provider::json::{at, number};
use crate::provider::text::NumberFormat;
use crate::provider::{
    record_from, unresolved, AttributeProvider, FetchContext, PageClient, ProviderCapabilities,
};

const SOURCE: SourceId = SourceId::Binance;
const PRODUCT_LIST_URL: &str =
    "https://www.binance.com/bapi/earn/v3/friendly/finance-earn/calculator/product/list";
const CALCULATOR_URL: &str =
    "https://www.binance.com/bapi/earn/v2/friendly/finance-earn/calculator/calculate";

/// Weeks per year, for turning the annual payout into a weekly one.
const WEEKS_PER_YEAR: f64 = 52.1428652;

const HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", crate::provider::http::ACCEPT_LANGUAGE),
    ("Content-Type", "application/json"),
    ("clienttype", "web"),
    ("lang", "en"),
    ("Referer", "https://www.binance.com/en/earn/apr-calculator"),
];

pub struct BinanceProvider {
    http: PageClient,
}

impl BinanceProvider {
    pub fn new(http: PageClient) -> Self {
        Self { http }
    }
}

fn round_8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

/// APY of the first flexible product, as a percentage.
pub(crate) fn parse_apy(payload: &Value) -> Option<f64> {
    let product = at(payload, &["data", "savingFlexibleProduct"])?.as_array()?.first()?;
    number(product.get("apy")?, NumberFormat::Us).map(|apy| apy * 100.0)
}

/// Payout of the shortest estimate in the calculator response.
pub(crate) fn parse_payout(payload: &Value) -> Option<f64> {
    let estimate = at(payload, &["data", "estimatedEarningsForm"])?
        .as_array()?
        .iter()
        .filter_map(|form| Some((form.get("duration")?.as_f64()?, form)))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, form)| form)?;
    number(estimate.get("amountList")?, NumberFormat::Us)
}

pub(crate) fn extract(
    apy: Option<f64>,
    payout: Option<f64>,
    attribute: Attribute,
) -> AttributeValue {
    match attribute {
        Attribute::Dy => apy.into(),
        Attribute::LatestsDividends => payout.map(round_8).into(),
        Attribute::LatestDividend => payout
            .map(|annual| round_8((1.0 + annual).powf(1.0 / WEEKS_PER_YEAR) - 1.0))
            .into(),
        _ => AttributeValue::Null,
    }
}

#[async_trait]
impl AttributeProvider for BinanceProvider {
    fn id(&self) -> SourceId {
        SOURCE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::Crypto],
        }
    }

    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError> {
        if ctx.asset_class() != AssetClass::Crypto {
            return Err(ProviderError::Unsupported {
                source_id: SOURCE,
                asset_class: ctx.asset_class(),
            });
        }

        let wants_apy = attributes.contains(&Attribute::Dy);
        let wants_payout = attributes
            .iter()
            .any(|a| matches!(a, Attribute::LatestDividend | Attribute::LatestsDividends));
        if !wants_apy && !wants_payout {
            return Ok(unresolved(attributes));
        }

        let code = urlencoding::encode(&ctx.symbol()).into_owned();

        let apy = if wants_apy {
            let url = format!("{PRODUCT_LIST_URL}?asset={code}&type=Flexible");
            let payload: Value = self.http.get_json(ctx, SOURCE, &url, HEADERS).await?;
            parse_apy(&payload)
        } else {
            None
        };

        let payout = if wants_payout {
            let url = format!(
                "{CALCULATOR_URL}?productId={code}001&amount=1&productType=LENDING_FLEXIBLE&autoTransfer=true"
            );
            let payload: Value = self.http.get_json(ctx, SOURCE, &url, HEADERS).await?;
            parse_payout(&payload)
        } else {
            None
        };

        Ok(record_from(attributes, |a| extract(apy, payout, a)))
    }
}
