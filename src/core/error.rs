//! Error taxonomy for rate resolution

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use super::rate::CurrencyCode;

/// A response arrived but the expected value was absent or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty rate text")]
    Empty,

    #[error("not a period-separated decimal: '{0}'")]
    NotNumeric(String),

    #[error("rate must be positive, got {0}")]
    NonPositive(Decimal),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure of a single provider attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Only transport failures are worth another attempt against the same source.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Transport(format!("request timed out: {err}"))
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Why a provider did not produce a rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NotFound,
    Error(FetchError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::Error(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub source: String,
    pub reason: FailureReason,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Outcome that crosses the resolver boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid currency code: '{0}'")]
    InvalidCurrency(String),

    #[error("unsupported pair {from}/{to}: only conversion into {target} is supported")]
    UnsupportedPair {
        from: CurrencyCode,
        to: CurrencyCode,
        target: CurrencyCode,
    },

    #[error("rate unavailable for {currency}: {}", join_failures(.failures))]
    RateUnavailable {
        currency: CurrencyCode,
        failures: Vec<ProviderFailure>,
    },
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_unavailable_lists_failures_in_order() {
        let err = ResolveError::RateUnavailable {
            currency: "USD".parse().unwrap(),
            failures: vec![
                ProviderFailure {
                    source: "central_bank".to_string(),
                    reason: FailureReason::NotFound,
                },
                ProviderFailure {
                    source: "aggregator".to_string(),
                    reason: FailureReason::Error(FetchError::Transport(
                        "connection refused".to_string(),
                    )),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "rate unavailable for USD: central_bank: not found; aggregator: transport error: connection refused"
        );
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(FetchError::Transport("reset".to_string()).is_retryable());
        assert!(!FetchError::Parse(ParseError::Empty).is_retryable());
    }
}
