//! Static per-asset-class configuration: which attributes a class exposes and
//! which sources are consulted, in rank order, when the request asks for all.

use crate::errors::CatalogError;
use crate::models::{AssetClass, Attribute, SourceId, SourcePreference};

use Attribute::*;

const STOCK_ATTRIBUTES: &[Attribute] = &[
    Actuation,
    AssetsValue,
    AvgAnnualDividends,
    AvgPrice,
    Beta,
    CagrProfit,
    CagrRevenue,
    Debit,
    Dy,
    Ebit,
    EnterpriseValue,
    EquityPrice,
    EquityValue,
    GrossMargin,
    InitialDate,
    LatestsDividends,
    Link,
    Liquidity,
    ManagementFee,
    MarketValue,
    Max52Weeks,
    Min52Weeks,
    Name,
    NetMargin,
    NetProfit,
    NetRevenue,
    Payout,
    Pl,
    Price,
    Pvp,
    Roe,
    Roic,
    Sector,
    TotalIssuedShares,
    Type,
    Variation12m,
    Variation30d,
];

const BR_STOCK_ATTRIBUTES: &[Attribute] = &[
    AssetsValue,
    AvgAnnualDividends,
    AvgPrice,
    CagrProfit,
    CagrRevenue,
    Debit,
    Dy,
    Ebit,
    EnterpriseValue,
    EquityValue,
    GrossMargin,
    LatestsDividends,
    LatestNetProfit,
    Link,
    Liquidity,
    MarketValue,
    Max52Weeks,
    MayerMultiple,
    Min52Weeks,
    Name,
    NetMargin,
    NetProfit,
    NetRevenue,
    Payout,
    Pl,
    Price,
    Pvp,
    Roe,
    Roic,
    Sector,
    TotalIssuedShares,
    Variation12m,
    Variation30d,
];

const BR_REIT_ATTRIBUTES: &[Attribute] = &[
    Actuation,
    AssetsValue,
    AvgPrice,
    CashValue,
    DebitByRealStateAcquisition,
    DebitBySecuritizationReceivablesAcquisition,
    Dy,
    EquityPrice,
    Ffoy,
    InitialDate,
    LatestDividend,
    LatestsDividends,
    Link,
    Liquidity,
    Management,
    MarketValue,
    Max52Weeks,
    MayerMultiple,
    Min52Weeks,
    Name,
    NetEquityValue,
    Price,
    Pvp,
    Segment,
    TargetPublic,
    Term,
    TotalIssuedShares,
    TotalMortgageValue,
    TotalMortgage,
    TotalRealStateValue,
    TotalRealState,
    TotalStocksFundOthersValue,
    TotalStocksFundOthers,
    Type,
    Vacancy,
    Variation12m,
    Variation30d,
];

const CRYPTO_ATTRIBUTES: &[Attribute] = &[
    AvgPrice,
    Dy,
    InitialDate,
    LatestDividend,
    LatestsDividends,
    Link,
    Liquidity,
    MarketValue,
    Max52Weeks,
    MayerMultiple,
    Min52Weeks,
    Name,
    Price,
    Sector,
    TotalIssuedShares,
    Variation12m,
    Variation30d,
];

/// Every attribute valid for `class`, in catalog order.
pub fn attributes(class: AssetClass) -> &'static [Attribute] {
    match class {
        AssetClass::Stock | AssetClass::Etf => STOCK_ATTRIBUTES,
        AssetClass::BrStock => BR_STOCK_ATTRIBUTES,
        AssetClass::BrReit => BR_REIT_ATTRIBUTES,
        AssetClass::Crypto => CRYPTO_ATTRIBUTES,
    }
}

/// Sources walked by an `All` resolution, highest rank first.
pub fn ranked_sources(class: AssetClass) -> &'static [SourceId] {
    match class {
        AssetClass::Stock | AssetClass::Etf => &[SourceId::StockAnalysis, SourceId::Investidor10],
        AssetClass::BrStock => &[SourceId::Cvm, SourceId::Fundamentus, SourceId::Investidor10],
        AssetClass::BrReit => &[
            SourceId::BmfBovespa,
            SourceId::Fundamentus,
            SourceId::Fiis,
            SourceId::Investidor10,
        ],
        AssetClass::Crypto => &[
            SourceId::Binance,
            SourceId::CoinMarketCap,
            SourceId::Investidor10,
        ],
    }
}

/// Sources a request may name explicitly but that never join the cascade.
fn unranked_sources(class: AssetClass) -> &'static [SourceId] {
    match class {
        AssetClass::BrReit => &[SourceId::FundsExplorer],
        _ => &[],
    }
}

/// True when `source` may be requested for `class`, ranked or not.
pub fn supports_source(class: AssetClass, source: SourceId) -> bool {
    ranked_sources(class).contains(&source) || unranked_sources(class).contains(&source)
}

pub fn supports_attribute(class: AssetClass, attribute: Attribute) -> bool {
    attributes(class).contains(&attribute)
}

/// Parses requested attribute names for `class`.
///
/// Blank entries are ignored and duplicates keep their first position. When
/// nothing remains the whole catalog is returned. Any unknown name, or a name
/// outside the class's catalog, fails the whole request.
pub fn parse_attributes<S: AsRef<str>>(
    class: AssetClass,
    names: &[S],
) -> Result<Vec<Attribute>, CatalogError> {
    let mut parsed: Vec<Attribute> = Vec::with_capacity(names.len());

    for raw in names {
        let name = raw.as_ref().trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        let attribute: Attribute = name.parse()?;
        if !supports_attribute(class, attribute) {
            return Err(CatalogError::AttributeNotInCatalog {
                asset_class: class,
                attribute,
            });
        }
        if !parsed.contains(&attribute) {
            parsed.push(attribute);
        }
    }

    if parsed.is_empty() {
        return Ok(attributes(class).to_vec());
    }
    Ok(parsed)
}

/// Parses the `source` parameter for `class`. Blank or `all` means the full
/// cascade.
pub fn parse_source(class: AssetClass, raw: Option<&str>) -> Result<SourcePreference, CatalogError> {
    let name = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    if name.is_empty() || name == SourcePreference::ALL_WIRE_NAME {
        return Ok(SourcePreference::All);
    }

    let source: SourceId = name.parse()?;
    if !supports_source(class, source) {
        return Err(CatalogError::SourceNotRanked {
            asset_class: class,
            source_id: source,
        });
    }
    Ok(SourcePreference::Only(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_sizes_match_each_class() {
        assert_eq!(attributes(AssetClass::Stock).len(), 37);
        assert_eq!(attributes(AssetClass::Etf).len(), 37);
        assert_eq!(attributes(AssetClass::BrStock).len(), 33);
        assert_eq!(attributes(AssetClass::BrReit).len(), 37);
        assert_eq!(attributes(AssetClass::Crypto).len(), 17);
    }

    #[test]
    fn catalogs_have_no_duplicates() {
        for class in AssetClass::ALL {
            let mut names: Vec<_> = attributes(*class).to_vec();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), attributes(*class).len(), "{class}");
        }
    }

    #[test]
    fn every_attribute_belongs_to_some_catalog() {
        for attribute in Attribute::ALL {
            assert!(
                AssetClass::ALL
                    .iter()
                    .any(|class| supports_attribute(*class, *attribute)),
                "{attribute} is unreachable"
            );
        }
    }

    #[test]
    fn parse_attributes_dedupes_and_keeps_order() {
        let parsed =
            parse_attributes(AssetClass::BrReit, &["pvp", " PRICE ", "pvp", "", "dy"]).unwrap();
        assert_eq!(parsed, vec![Pvp, Price, Dy]);
    }

    #[test]
    fn parse_attributes_empty_means_full_catalog() {
        let none: [&str; 0] = [];
        assert_eq!(
            parse_attributes(AssetClass::Crypto, &none).unwrap(),
            CRYPTO_ATTRIBUTES.to_vec()
        );
        assert_eq!(
            parse_attributes(AssetClass::Crypto, &["", " "]).unwrap(),
            CRYPTO_ATTRIBUTES.to_vec()
        );
    }

    #[test]
    fn parse_attributes_rejects_unknown_and_out_of_class_names() {
        assert!(matches!(
            parse_attributes(AssetClass::Stock, &["price", "bogus"]),
            Err(CatalogError::UnknownAttribute(name)) if name == "bogus"
        ));
        assert!(matches!(
            parse_attributes(AssetClass::Crypto, &["vacancy"]),
            Err(CatalogError::AttributeNotInCatalog { attribute: Vacancy, .. })
        ));
    }

    #[test]
    fn parse_source_handles_all_and_concrete_sources() {
        assert_eq!(
            parse_source(AssetClass::BrReit, None).unwrap(),
            SourcePreference::All
        );
        assert_eq!(
            parse_source(AssetClass::BrReit, Some(" ALL ")).unwrap(),
            SourcePreference::All
        );
        assert_eq!(
            parse_source(AssetClass::BrStock, Some("cvm")).unwrap(),
            SourcePreference::Only(SourceId::Cvm)
        );
    }

    #[test]
    fn parse_source_rejects_sources_outside_the_class() {
        assert!(matches!(
            parse_source(AssetClass::Stock, Some("binance")),
            Err(CatalogError::SourceNotRanked { source_id: SourceId::Binance, .. })
        ));
        assert!(matches!(
            parse_source(AssetClass::Stock, Some("yahoo")),
            Err(CatalogError::UnknownSource(_))
        ));
    }

    #[test]
    fn unranked_sources_are_selectable_but_not_cascaded() {
        assert_eq!(
            parse_source(AssetClass::BrReit, Some("fundsexplorer")).unwrap(),
            SourcePreference::Only(SourceId::FundsExplorer)
        );
        assert!(!ranked_sources(AssetClass::BrReit).contains(&SourceId::FundsExplorer));
        assert!(matches!(
            parse_source(AssetClass::BrStock, Some("fundsexplorer")),
            Err(CatalogError::SourceNotRanked { .. })
        ));
    }

    #[test]
    fn filings_come_first_for_reits() {
        assert_eq!(ranked_sources(AssetClass::BrReit).first(), Some(&SourceId::BmfBovespa));
    }

    #[test]
    fn investidor10_is_the_last_resort_everywhere() {
        for class in AssetClass::ALL {
            assert_eq!(ranked_sources(*class).last(), Some(&SourceId::Investidor10));
        }
    }
}
