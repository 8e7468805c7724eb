use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Asset classes served, each with its own catalog and cache store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetClass {
    /// Brazilian listed company shares ("ações").
    #[serde(rename = "acao")]
    BrStock,
    /// Brazilian real estate investment funds ("FIIs").
    #[serde(rename = "fii")]
    BrReit,
    #[serde(rename = "stock")]
    Stock,
    #[serde(rename = "etf")]
    Etf,
    #[serde(rename = "cripto")]
    Crypto,
}

impl AssetClass {
    pub const ALL: &'static [AssetClass] = &[
        AssetClass::BrStock,
        AssetClass::BrReit,
        AssetClass::Stock,
        AssetClass::Etf,
        AssetClass::Crypto,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AssetClass::BrStock => "acao",
            AssetClass::BrReit => "fii",
            AssetClass::Stock => "stock",
            AssetClass::Etf => "etf",
            AssetClass::Crypto => "cripto",
        }
    }

    /// Normalizes a raw instrument identifier for this class.
    ///
    /// Tickers are upper-cased; crypto identifiers are lower-cased slugs
    /// (e.g. `bitcoin`).
    pub fn normalize_id(self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            AssetClass::Crypto => trimmed.to_lowercase(),
            _ => trimmed.to_uppercase(),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        AssetClass::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == lowered)
            .ok_or_else(|| CatalogError::UnknownAssetClass(s.to_string()))
    }
}

/// A concrete external data source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    StockAnalysis,
    Investidor10,
    Fundamentus,
    Cvm,
    Fiis,
    BmfBovespa,
    FundsExplorer,
    Binance,
    CoinMarketCap,
}

impl SourceId {
    pub const ALL: &'static [SourceId] = &[
        SourceId::StockAnalysis,
        SourceId::Investidor10,
        SourceId::Fundamentus,
        SourceId::Cvm,
        SourceId::Fiis,
        SourceId::BmfBovespa,
        SourceId::FundsExplorer,
        SourceId::Binance,
        SourceId::CoinMarketCap,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SourceId::StockAnalysis => "stockanalysis",
            SourceId::Investidor10 => "investidor10",
            SourceId::Fundamentus => "fundamentus",
            SourceId::Cvm => "cvm",
            SourceId::Fiis => "fiis",
            SourceId::BmfBovespa => "bmfbovespa",
            SourceId::FundsExplorer => "fundsexplorer",
            SourceId::Binance => "binance",
            SourceId::CoinMarketCap => "coinmarketcap",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        SourceId::ALL
            .iter()
            .copied()
            .find(|source| source.as_str() == lowered)
            .ok_or_else(|| CatalogError::UnknownSource(s.to_string()))
    }
}

/// Which sources a resolution may consult.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourcePreference {
    /// Walk the asset class's ranked cascade.
    #[default]
    All,
    /// Call exactly this source, once.
    Only(SourceId),
}

impl SourcePreference {
    pub const ALL_WIRE_NAME: &'static str = "all";
}

impl fmt::Display for SourcePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcePreference::All => f.write_str(Self::ALL_WIRE_NAME),
            SourcePreference::Only(source) => source.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_class_parses_route_names() {
        assert_eq!("FII".parse::<AssetClass>().unwrap(), AssetClass::BrReit);
        assert_eq!("cripto".parse::<AssetClass>().unwrap(), AssetClass::Crypto);
        assert!(matches!(
            "bond".parse::<AssetClass>(),
            Err(CatalogError::UnknownAssetClass(_))
        ));
    }

    #[test]
    fn ids_are_normalized_per_class() {
        assert_eq!(AssetClass::BrStock.normalize_id(" petr4 "), "PETR4");
        assert_eq!(AssetClass::Crypto.normalize_id("Bitcoin"), "bitcoin");
    }

    #[test]
    fn source_round_trips_through_wire_name() {
        for source in SourceId::ALL {
            assert_eq!(source.as_str().parse::<SourceId>().unwrap(), *source);
        }
        assert_eq!(
            serde_json::to_string(&SourceId::CoinMarketCap).unwrap(),
            "\"coinmarketcap\""
        );
        assert_eq!(
            serde_json::to_string(&SourceId::BmfBovespa).unwrap(),
            "\"bmfbovespa\""
        );
    }
}
