//! Provider capabilities.
//!
//! This module defines the structure describing what an attribute provider
//! can serve.

use crate::models::AssetClass;

/// Describes the capabilities of an attribute provider.
///
/// Used by the engine to skip providers that cannot serve the asset class
/// being resolved.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Asset classes this provider knows how to scrape.
    pub asset_classes: &'static [AssetClass],
}

impl ProviderCapabilities {
    pub fn supports(&self, class: AssetClass) -> bool {
        self.asset_classes.contains(&class)
    }
}
