pub mod aggregator;
pub mod central_bank;
pub mod scrape;
pub mod util;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::core::config::{AppConfig, ProvidersConfig};
use crate::core::rate::{CurrencyCode, RateSourceProvider};
use crate::core::resolver::RateResolver;
use aggregator::AggregatorJsonProvider;
use central_bank::CentralBankXmlProvider;
use scrape::ScrapeHtmlProvider;

/// Builds the enabled sources in priority order: central bank, aggregator, scrape.
pub fn build_chain(config: &ProvidersConfig) -> Result<Vec<Arc<dyn RateSourceProvider>>> {
    let mut chain: Vec<Arc<dyn RateSourceProvider>> = Vec::new();

    let central_bank = config.central_bank.clone().unwrap_or_default();
    if central_bank.fetch.enabled {
        chain.push(Arc::new(CentralBankXmlProvider::new(central_bank)?));
    }

    let aggregator = config.aggregator.clone().unwrap_or_default();
    if aggregator.fetch.enabled {
        chain.push(Arc::new(AggregatorJsonProvider::new(aggregator)?));
    }

    let scrape = config.scrape.clone().unwrap_or_default();
    if scrape.fetch.enabled {
        chain.push(Arc::new(ScrapeHtmlProvider::new(scrape)?));
    }

    debug!(
        providers = ?chain.iter().map(|p| p.id()).collect::<Vec<_>>(),
        "Built rate provider chain"
    );
    Ok(chain)
}

pub fn build_resolver(config: &AppConfig) -> Result<RateResolver> {
    let target: CurrencyCode = config
        .currency
        .parse()
        .with_context(|| format!("Invalid target currency in config: {}", config.currency))?;
    Ok(RateResolver::new(target, build_chain(&config.providers)?))
}
