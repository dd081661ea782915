use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::util::{build_client, fetch_text};
use crate::core::config::AggregatorProviderConfig;
use crate::core::error::{FetchError, ParseError};
use crate::core::rate::{CurrencyPair, ProviderResult, RateSourceProvider, RawQuote};

pub const AGGREGATOR_ID: &str = "aggregator";

/// Flat JSON object keyed by uppercase currency code, e.g.
/// `{"USD": {"satis": "41.1520", ...}, ...}`.
pub struct AggregatorJsonProvider {
    config: AggregatorProviderConfig,
    client: reqwest::Client,
}

impl AggregatorJsonProvider {
    pub fn new(config: AggregatorProviderConfig) -> Result<Self> {
        let client =
            build_client(&config.fetch).context("Failed to build aggregator HTTP client")?;
        Ok(Self { config, client })
    }

    fn parse(&self, body: &str, code: &str) -> Result<Option<RawQuote>, ParseError> {
        let document: Value = serde_json::from_str(body)
            .map_err(|e| ParseError::Malformed(format!("invalid JSON: {e}")))?;
        let root = document
            .as_object()
            .ok_or_else(|| ParseError::Malformed("expected a JSON object".to_string()))?;

        let Some(entry) = root.get(code) else {
            return Ok(None);
        };

        let field = &self.config.sell_field;
        let raw = entry
            .get(field)
            .ok_or_else(|| ParseError::MissingField(format!("{code}.{field}")))?
            .as_str()
            .ok_or_else(|| ParseError::Malformed(format!("{code}.{field} is not a string")))?;

        Ok(Some(RawQuote::new(raw, 1, AGGREGATOR_ID)))
    }
}

#[async_trait]
impl RateSourceProvider for AggregatorJsonProvider {
    fn id(&self) -> &str {
        AGGREGATOR_ID
    }

    #[instrument(name = "AggregatorFetch", skip(self), fields(pair = %pair))]
    async fn fetch(&self, pair: &CurrencyPair) -> ProviderResult {
        let body = match fetch_text(&self.client, &self.config.url, &self.config.fetch).await {
            Ok(body) => body,
            Err(e) => return ProviderResult::Error(e),
        };

        match self.parse(&body, pair.from.as_str()) {
            Ok(Some(quote)) => {
                debug!(raw = %quote.raw, "Parsed aggregator quote");
                quote.normalize().map_err(FetchError::from).into()
            }
            Ok(None) => ProviderResult::NotFound,
            Err(e) => ProviderResult::Error(e.into()),
        }
    }
}
