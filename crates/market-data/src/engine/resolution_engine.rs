//! Attribute resolution across ranked sources.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::timeout;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::diagnostics::{FetchDiagnostics, SkipReason};
use crate::catalog;
use crate::errors::{ProviderError, RetryClass};
use crate::models::{Attribute, AttributeRecord, SourceId, SourcePreference};
use crate::provider::{AttributeProvider, FetchContext};

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Upper bound for a single adapter call.
    pub provider_timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Resolves attributes by walking an asset class's ranked sources.
///
/// Sources are called one after the other, each with the attributes that are
/// still absent or null. The walk stops as soon as every requested attribute
/// is resolved. A source that fails, times out, is skipped or answers with
/// nulls only contributes nothing; resolution itself never fails.
pub struct ResolutionEngine {
    providers: HashMap<SourceId, Arc<dyn AttributeProvider>>,
    circuit_breaker: CircuitBreaker,
    config: EngineConfig,
}

impl ResolutionEngine {
    pub fn new(providers: Vec<Arc<dyn AttributeProvider>>, config: EngineConfig) -> Self {
        let mut by_id: HashMap<SourceId, Arc<dyn AttributeProvider>> = HashMap::new();
        for provider in providers {
            if by_id.insert(provider.id(), provider.clone()).is_some() {
                warn!(
                    "Provider '{}' registered twice, keeping the last one",
                    provider.id()
                );
            }
        }

        Self {
            providers: by_id,
            circuit_breaker: CircuitBreaker::with_config(config.circuit_breaker.clone()),
            config,
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Resolve `requested` for the instrument in `ctx`.
    ///
    /// With [`SourcePreference::All`] the asset class's ranked sources are
    /// consulted in order; with [`SourcePreference::Only`] exactly one call is
    /// made and its answer is returned as is. The result only ever holds
    /// requested attributes and may be partial or empty.
    pub async fn resolve(
        &self,
        ctx: &mut FetchContext,
        preference: SourcePreference,
        requested: &[Attribute],
    ) -> AttributeRecord {
        let (record, diagnostics) = self
            .resolve_with_diagnostics(ctx, preference, requested)
            .await;

        info!(
            "Resolved {}/{} attributes for {} '{}' ({}): {}",
            requested.iter().filter(|a| record.is_resolved(**a)).count(),
            requested.len(),
            ctx.asset_class(),
            ctx.instrument_id(),
            preference,
            diagnostics.summary()
        );
        record
    }

    /// Same as [`resolve`](Self::resolve), also reporting what each source did.
    pub async fn resolve_with_diagnostics(
        &self,
        ctx: &mut FetchContext,
        preference: SourcePreference,
        requested: &[Attribute],
    ) -> (AttributeRecord, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();
        let mut combined = AttributeRecord::new();

        if requested.is_empty() {
            return (combined, diagnostics);
        }

        match preference {
            SourcePreference::Only(source) => {
                if let Some(record) = self.call(source, ctx, requested, &mut diagnostics).await {
                    combined = record;
                }
            }
            SourcePreference::All => {
                let mut remaining = requested.to_vec();

                for &source in catalog::ranked_sources(ctx.asset_class()) {
                    if remaining.is_empty() {
                        break;
                    }
                    if let Some(record) =
                        self.call(source, ctx, &remaining, &mut diagnostics).await
                    {
                        combined.merge(record);
                        remaining = combined.missing(requested);
                    }
                }
            }
        }

        (combined, diagnostics)
    }

    /// One guarded adapter call. `None` means the source contributes nothing.
    async fn call(
        &self,
        source: SourceId,
        ctx: &mut FetchContext,
        attributes: &[Attribute],
        diagnostics: &mut FetchDiagnostics,
    ) -> Option<AttributeRecord> {
        let Some(provider) = self.providers.get(&source) else {
            debug!("No provider registered for '{}', skipping", source);
            diagnostics.record_skip(source, SkipReason::NotRegistered);
            return None;
        };

        if !provider.capabilities().supports(ctx.asset_class()) {
            debug!("Provider '{}' does not serve {}, skipping", source, ctx.asset_class());
            diagnostics.record_skip(source, SkipReason::AssetClassNotSupported);
            return None;
        }

        if !self.circuit_breaker.is_allowed(source) {
            debug!("Circuit breaker open for provider '{}', skipping", source);
            diagnostics.record_skip(source, SkipReason::CircuitBreakerOpen);
            return None;
        }

        debug!(
            "Fetching {} attributes for '{}' from '{}'",
            attributes.len(),
            ctx.instrument_id(),
            source
        );

        let result = match timeout(self.config.provider_timeout, provider.fetch(ctx, attributes)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(source)),
        };

        match result {
            Ok(record) => {
                self.circuit_breaker.record_success(source);
                let record = record.restricted_to(attributes);
                let resolved = attributes.iter().filter(|a| record.is_resolved(**a)).count();
                diagnostics.record_success(source, resolved);
                Some(record)
            }
            Err(e) => {
                match e.retry_class() {
                    RetryClass::FailoverWithPenalty => {
                        self.circuit_breaker.record_failure(source);
                        warn!(
                            "Provider '{}' failed with {}, recorded circuit breaker failure",
                            source, e
                        );
                    }
                    RetryClass::NextProvider => {
                        debug!("Provider '{}' failed with {}, trying next provider", source, e);
                    }
                }
                diagnostics.record_error(source, e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::diagnostics::AttemptOutcome;
    use crate::engine::CircuitState;
    use crate::models::{AssetClass, AttributeValue};
    use crate::provider::ProviderCapabilities;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Behavior {
        /// Answers every requested attribute, null when not in the table.
        Answer(Vec<(Attribute, AttributeValue)>),
        /// Returns the whole table whatever was requested.
        Overshare(Vec<(Attribute, AttributeValue)>),
        Fail,
        Hang,
    }

    struct MockProvider {
        id: SourceId,
        classes: &'static [AssetClass],
        behavior: Behavior,
        call_count: AtomicUsize,
        requests: Mutex<Vec<Vec<Attribute>>>,
    }

    impl MockProvider {
        fn new(id: SourceId, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                classes: AssetClass::ALL,
                behavior,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn serving(id: SourceId, classes: &'static [AssetClass], behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                classes,
                behavior,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> Vec<Attribute> {
            self.requests.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl AttributeProvider for MockProvider {
        fn id(&self) -> SourceId {
            self.id
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                asset_classes: self.classes,
            }
        }

        async fn fetch(
            &self,
            _ctx: &mut FetchContext,
            attributes: &[Attribute],
        ) -> Result<AttributeRecord, ProviderError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(attributes.to_vec());

            match &self.behavior {
                Behavior::Answer(table) => Ok(attributes
                    .iter()
                    .map(|a| {
                        let value = table
                            .iter()
                            .find(|(key, _)| key == a)
                            .map(|(_, v)| v.clone())
                            .unwrap_or(AttributeValue::Null);
                        (*a, value)
                    })
                    .collect()),
                Behavior::Overshare(table) => Ok(table.iter().cloned().collect()),
                Behavior::Fail => Err(ProviderError::transport(self.id, "HTTP 503")),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok(AttributeRecord::new())
                }
            }
        }
    }

    fn engine(providers: Vec<Arc<MockProvider>>) -> ResolutionEngine {
        engine_with(providers, EngineConfig::default())
    }

    fn engine_with(providers: Vec<Arc<MockProvider>>, config: EngineConfig) -> ResolutionEngine {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn AttributeProvider>)
            .collect();
        ResolutionEngine::new(providers, config)
    }

    fn stock_ctx() -> FetchContext {
        FetchContext::new(AssetClass::Stock, "ACME")
    }

    const PRICE_AND_NAME: &[Attribute] = &[Attribute::Price, Attribute::Name];

    #[tokio::test]
    async fn test_cascade_fills_gaps_from_next_source() {
        let first = MockProvider::new(
            SourceId::StockAnalysis,
            Behavior::Answer(vec![(Attribute::Price, 10.5.into())]),
        );
        let second = MockProvider::new(
            SourceId::Investidor10,
            Behavior::Answer(vec![(Attribute::Name, "ACME".into())]),
        );
        let engine = engine(vec![first.clone(), second.clone()]);

        let record = engine
            .resolve(&mut stock_ctx(), SourcePreference::All, PRICE_AND_NAME)
            .await;

        assert_eq!(record.get(Attribute::Price), Some(&10.5.into()));
        assert_eq!(record.get(Attribute::Name), Some(&"ACME".into()));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(second.last_request(), vec![Attribute::Name]);
    }

    #[tokio::test]
    async fn test_cascade_stops_once_complete() {
        let first = MockProvider::new(
            SourceId::StockAnalysis,
            Behavior::Answer(vec![
                (Attribute::Price, 10.5.into()),
                (Attribute::Name, "ACME".into()),
            ]),
        );
        let second = MockProvider::new(SourceId::Investidor10, Behavior::Fail);
        let engine = engine(vec![first.clone(), second.clone()]);

        let (record, diagnostics) = engine
            .resolve_with_diagnostics(&mut stock_ctx(), SourcePreference::All, PRICE_AND_NAME)
            .await;

        assert!(record.is_complete_for(PRICE_AND_NAME));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert_eq!(diagnostics.called(), vec![SourceId::StockAnalysis]);
    }

    #[tokio::test]
    async fn test_failure_contributes_nothing() {
        let first = MockProvider::new(SourceId::StockAnalysis, Behavior::Fail);
        let second = MockProvider::new(
            SourceId::Investidor10,
            Behavior::Answer(vec![(Attribute::Price, 7.0.into())]),
        );
        let engine = engine(vec![first, second.clone()]);

        let (record, diagnostics) = engine
            .resolve_with_diagnostics(&mut stock_ctx(), SourcePreference::All, PRICE_AND_NAME)
            .await;

        assert_eq!(second.last_request(), PRICE_AND_NAME.to_vec());
        assert_eq!(record.get(Attribute::Price), Some(&7.0.into()));
        assert_eq!(record.get(Attribute::Name), Some(&AttributeValue::Null));
        assert_eq!(
            diagnostics.errors(),
            vec![(SourceId::StockAnalysis, "Transport error: stockanalysis - HTTP 503")]
        );
    }

    #[tokio::test]
    async fn test_hanging_source_times_out() {
        let first = MockProvider::new(SourceId::StockAnalysis, Behavior::Hang);
        let second = MockProvider::new(
            SourceId::Investidor10,
            Behavior::Answer(vec![(Attribute::Price, 1.0.into())]),
        );
        let config = EngineConfig {
            provider_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let engine = engine_with(vec![first, second], config);

        let (record, diagnostics) = engine
            .resolve_with_diagnostics(&mut stock_ctx(), SourcePreference::All, &[Attribute::Price])
            .await;

        assert_eq!(record.get(Attribute::Price), Some(&1.0.into()));
        assert_eq!(
            diagnostics.errors(),
            vec![(SourceId::StockAnalysis, "Timeout: stockanalysis")]
        );
    }

    #[tokio::test]
    async fn test_concrete_source_is_called_once() {
        let first = MockProvider::new(
            SourceId::StockAnalysis,
            Behavior::Answer(vec![(Attribute::Name, "ACME".into())]),
        );
        let second = MockProvider::new(
            SourceId::Investidor10,
            Behavior::Answer(vec![(Attribute::Price, 10.5.into())]),
        );
        let engine = engine(vec![first.clone(), second.clone()]);

        let record = engine
            .resolve(
                &mut stock_ctx(),
                SourcePreference::Only(SourceId::Investidor10),
                PRICE_AND_NAME,
            )
            .await;

        assert_eq!(first.calls(), 0);
        assert_eq!(second.calls(), 1);
        assert_eq!(record.get(Attribute::Price), Some(&10.5.into()));
        assert_eq!(record.get(Attribute::Name), Some(&AttributeValue::Null));
    }

    #[tokio::test]
    async fn test_failing_concrete_source_yields_empty_record() {
        let only = MockProvider::new(SourceId::Investidor10, Behavior::Fail);
        let engine = engine(vec![only]);

        let record = engine
            .resolve(
                &mut stock_ctx(),
                SourcePreference::Only(SourceId::Investidor10),
                PRICE_AND_NAME,
            )
            .await;

        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_result_is_restricted_to_requested_attributes() {
        let oversharing = MockProvider::new(
            SourceId::StockAnalysis,
            Behavior::Overshare(vec![
                (Attribute::Price, 3.0.into()),
                (Attribute::Dy, 6.0.into()),
            ]),
        );
        let engine = engine(vec![oversharing]);

        let record = engine
            .resolve(&mut stock_ctx(), SourcePreference::All, &[Attribute::Price])
            .await;

        assert_eq!(record.len(), 1);
        assert_eq!(record.get(Attribute::Dy), None);
    }

    #[tokio::test]
    async fn test_unregistered_and_unsupported_sources_are_skipped() {
        let stock_only = MockProvider::serving(
            SourceId::StockAnalysis,
            &[AssetClass::Stock],
            Behavior::Answer(vec![(Attribute::Price, 1.0.into())]),
        );
        let engine = engine(vec![stock_only.clone()]);

        let mut ctx = FetchContext::new(AssetClass::Etf, "IVV");
        let (record, diagnostics) = engine
            .resolve_with_diagnostics(&mut ctx, SourcePreference::All, &[Attribute::Price])
            .await;

        assert!(record.is_empty());
        assert_eq!(stock_only.calls(), 0);
        assert_eq!(
            diagnostics.skip_reasons(),
            vec![
                (SourceId::StockAnalysis, &SkipReason::AssetClassNotSupported),
                (SourceId::Investidor10, &SkipReason::NotRegistered),
            ]
        );
    }

    #[tokio::test]
    async fn test_open_circuit_skips_source_on_later_requests() {
        let flaky = MockProvider::new(SourceId::StockAnalysis, Behavior::Fail);
        let config = EngineConfig {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let engine = engine_with(vec![flaky.clone()], config);

        engine
            .resolve(&mut stock_ctx(), SourcePreference::All, &[Attribute::Price])
            .await;
        assert_eq!(
            engine.circuit_breaker().state(SourceId::StockAnalysis),
            CircuitState::Open
        );

        let (_, diagnostics) = engine
            .resolve_with_diagnostics(&mut stock_ctx(), SourcePreference::All, &[Attribute::Price])
            .await;
        assert_eq!(flaky.calls(), 1);
        assert_eq!(
            diagnostics.attempts[0].outcome,
            AttemptOutcome::Skipped(SkipReason::CircuitBreakerOpen)
        );
    }

    #[tokio::test]
    async fn test_nothing_requested_calls_nothing() {
        let first = MockProvider::new(SourceId::StockAnalysis, Behavior::Fail);
        let engine = engine(vec![first.clone()]);

        let record = engine
            .resolve(&mut stock_ctx(), SourcePreference::All, &[])
            .await;

        assert!(record.is_empty());
        assert_eq!(first.calls(), 0);
    }
}
