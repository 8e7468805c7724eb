//! Attribute provider trait definitions.
//!
//! This module defines the core `AttributeProvider` trait that every source
//! adapter implements.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::{Attribute, AttributeRecord, SourceId};

use super::capabilities::ProviderCapabilities;
use super::context::FetchContext;

/// Trait for attribute providers.
///
/// Implement this trait to add support for a new data source. The engine
/// uses the provider's capabilities and the catalog's ranking to decide when
/// to call it.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tickerinfo_market_data::provider::{AttributeProvider, FetchContext, ProviderCapabilities};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl AttributeProvider for MyProvider {
///     fn id(&self) -> SourceId {
///         SourceId::Fiis
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             asset_classes: &[AssetClass::BrReit],
///         }
///     }
///
///     async fn fetch(
///         &self,
///         ctx: &mut FetchContext,
///         attributes: &[Attribute],
///     ) -> Result<AttributeRecord, ProviderError> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait AttributeProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Used for logging, circuit breaker tracking and `source=` selection.
    fn id(&self) -> SourceId;

    /// Describes which asset classes this provider can serve.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch the requested attributes for the instrument in `ctx`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The request-scoped context (asset class, identifier, page memo)
    /// * `attributes` - The attributes still missing, in request order
    ///
    /// # Returns
    ///
    /// A record with one key per requested attribute the provider recognizes;
    /// values it could not resolve are [`AttributeValue::Null`]. Failing to
    /// reach or parse the source is a `ProviderError`.
    ///
    /// [`AttributeValue::Null`]: crate::models::AttributeValue::Null
    async fn fetch(
        &self,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
    ) -> Result<AttributeRecord, ProviderError>;
}
