//! Currency conversion abstractions

use async_trait::async_trait;

use super::error::ResolveError;
use super::rate::Rate;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Rate, ResolveError>;
}
