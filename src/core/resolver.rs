//! Ordered fallback over rate sources.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::currency::CurrencyRateProvider;
use super::error::{FailureReason, ProviderFailure, ResolveError};
use super::rate::{CurrencyCode, CurrencyPair, ProviderResult, Rate, RateSourceProvider};

/// Resolves rates into a single target currency by asking each provider in
/// turn and returning the first success.
///
/// Holds no mutable state, so one instance can serve concurrent callers.
/// Dropping a pending [`RateResolver::resolve`] future aborts the in-flight
/// provider request and skips the rest of the chain.
pub struct RateResolver {
    target: CurrencyCode,
    providers: Vec<Arc<dyn RateSourceProvider>>,
}

impl RateResolver {
    pub fn new(target: CurrencyCode, providers: Vec<Arc<dyn RateSourceProvider>>) -> Self {
        Self { target, providers }
    }

    pub fn target(&self) -> &CurrencyCode {
        &self.target
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    #[instrument(name = "ResolveRate", skip(self), fields(target = %self.target))]
    pub async fn resolve(&self, from: &str, to: &str) -> Result<Rate, ResolveError> {
        let from: CurrencyCode = from.parse()?;
        let to: CurrencyCode = to.parse()?;

        if from == to {
            return Ok(Rate::ONE);
        }

        if to != self.target {
            return Err(ResolveError::UnsupportedPair {
                from,
                to,
                target: self.target.clone(),
            });
        }

        let pair = CurrencyPair::new(from, to);
        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            debug!(provider = provider.id(), %pair, "Trying rate provider");
            let reason = match provider.fetch(&pair).await {
                ProviderResult::Success(rate) => {
                    info!(provider = provider.id(), %pair, %rate, "Resolved rate");
                    return Ok(rate);
                }
                ProviderResult::NotFound => FailureReason::NotFound,
                ProviderResult::Error(e) => FailureReason::Error(e),
            };

            warn!(
                provider = provider.id(),
                %pair,
                reason = %reason,
                "Rate provider failed, trying next"
            );
            failures.push(ProviderFailure {
                source: provider.id().to_string(),
                reason,
            });
        }

        Err(ResolveError::RateUnavailable {
            currency: pair.from,
            failures,
        })
    }
}

#[async_trait]
impl CurrencyRateProvider for RateResolver {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Rate, ResolveError> {
        self.resolve(from, to).await
    }
}
