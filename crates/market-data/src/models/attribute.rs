//! The closed set of attribute names any asset class can request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CatalogError;

macro_rules! attributes {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// A named financial metric.
        ///
        /// The wire name (e.g. `"max_52_weeks"`) is what clients send in
        /// `info_names` and what appears as a key in responses and cache rows.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Attribute {
            $($variant),+
        }

        impl Attribute {
            /// Every attribute, in declaration order.
            pub const ALL: &'static [Attribute] = &[$(Attribute::$variant),+];

            /// The wire name of this attribute.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Attribute::$variant => $wire),+
                }
            }
        }

        impl FromStr for Attribute {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Attribute::$variant),)+
                    other => Err(CatalogError::UnknownAttribute(other.to_string())),
                }
            }
        }
    };
}

attributes! {
    Actuation => "actuation",
    AssetsValue => "assets_value",
    AvgAnnualDividends => "avg_annual_dividends",
    AvgPrice => "avg_price",
    Beta => "beta",
    CagrProfit => "cagr_profit",
    CagrRevenue => "cagr_revenue",
    CashValue => "cash_value",
    Debit => "debit",
    DebitByRealStateAcquisition => "debit_by_real_state_acquisition",
    DebitBySecuritizationReceivablesAcquisition => "debit_by_securitization_receivables_acquisition",
    Dy => "dy",
    Ebit => "ebit",
    EnterpriseValue => "enterprise_value",
    EquityPrice => "equity_price",
    EquityValue => "equity_value",
    Ffoy => "ffoy",
    GrossMargin => "gross_margin",
    InitialDate => "initial_date",
    LatestDividend => "latest_dividend",
    LatestsDividends => "latests_dividends",
    LatestNetProfit => "latest_net_profit",
    Link => "link",
    Liquidity => "liquidity",
    Management => "management",
    ManagementFee => "management_fee",
    MarketValue => "market_value",
    Max52Weeks => "max_52_weeks",
    MayerMultiple => "mayer_multiple",
    Min52Weeks => "min_52_weeks",
    Name => "name",
    NetEquityValue => "net_equity_value",
    NetMargin => "net_margin",
    NetProfit => "net_profit",
    NetRevenue => "net_revenue",
    Payout => "payout",
    Pl => "pl",
    Price => "price",
    Pvp => "pvp",
    Roe => "roe",
    Roic => "roic",
    Sector => "sector",
    Segment => "segment",
    TargetPublic => "target_public",
    Term => "term",
    TotalIssuedShares => "total_issued_shares",
    TotalMortgage => "total_mortgage",
    TotalMortgageValue => "total_mortgage_value",
    TotalRealState => "total_real_state",
    TotalRealStateValue => "total_real_state_value",
    TotalStocksFundOthers => "total_stocks_fund_others",
    TotalStocksFundOthersValue => "total_stocks_fund_others_value",
    Type => "type",
    Vacancy => "vacancy",
    Variation12m => "variation_12m",
    Variation30d => "variation_30d",
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
