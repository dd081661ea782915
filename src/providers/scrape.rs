use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};

use super::util::{build_client, fetch_text};
use crate::core::config::ScrapeProviderConfig;
use crate::core::error::FetchError;
use crate::core::rate::{CurrencyPair, ProviderResult, RateSourceProvider, RawQuote};

pub const SCRAPE_ID: &str = "scrape";

/// Last resort: pulls the price out of a quote page's HTML attribute.
pub struct ScrapeHtmlProvider {
    config: ScrapeProviderConfig,
    client: reqwest::Client,
    pattern: Regex,
}

impl ScrapeHtmlProvider {
    pub fn new(config: ScrapeProviderConfig) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r#"{}="(?<value>[\d.]+)""#,
            regex::escape(&config.attribute)
        ))
        .with_context(|| format!("Invalid scrape attribute: {}", config.attribute))?;
        let client = build_client(&config.fetch).context("Failed to build scrape HTTP client")?;
        Ok(Self {
            config,
            client,
            pattern,
        })
    }

    fn page_url(&self, pair: &CurrencyPair) -> String {
        self.config
            .url_template
            .replace("{from}", pair.from.as_str())
            .replace("{to}", pair.to.as_str())
    }

    fn extract(&self, html: &str) -> Option<RawQuote> {
        self.pattern
            .captures(html)
            .and_then(|caps| caps.name("value"))
            .map(|m| RawQuote::new(m.as_str(), 1, SCRAPE_ID))
    }
}

#[async_trait]
impl RateSourceProvider for ScrapeHtmlProvider {
    fn id(&self) -> &str {
        SCRAPE_ID
    }

    #[instrument(name = "ScrapeFetch", skip(self), fields(pair = %pair))]
    async fn fetch(&self, pair: &CurrencyPair) -> ProviderResult {
        let url = self.page_url(pair);
        let html = match fetch_text(&self.client, &url, &self.config.fetch).await {
            Ok(html) => html,
            Err(e) => return ProviderResult::Error(e),
        };

        match self.extract(&html) {
            Some(quote) => {
                debug!(raw = %quote.raw, "Scraped quote");
                quote.normalize().map_err(FetchError::from).into()
            }
            None => ProviderResult::NotFound,
        }
    }
}
