//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod normalize;
pub mod rate;
pub mod resolver;

// Re-export main types for cleaner imports
pub use currency::CurrencyRateProvider;
pub use error::{FailureReason, FetchError, ParseError, ProviderFailure, ResolveError};
pub use normalize::normalize;
pub use rate::{CurrencyCode, CurrencyPair, ProviderResult, Rate, RateSourceProvider, RawQuote};
pub use resolver::RateResolver;
