use crate::core::config::FetchSettings;
use crate::core::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation while it fails with a retryable [`FetchError`]
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the last error
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries || !err.is_retryable() {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Builds the HTTP client a provider owns, with its bounded request timeout.
pub fn build_client(settings: &FetchSettings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("fintrack/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
}

/// GETs `url` and returns the body. Non-success statuses are transport failures.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    settings: &FetchSettings,
) -> Result<String, FetchError> {
    with_retry(
        || async move {
            debug!("Requesting {}", url);
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Transport(format!("HTTP error: {status} for {url}")));
            }
            Ok(response.text().await?)
        },
        settings.retries,
        settings.retry_delay_ms,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ParseError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retries_transport_errors_until_exhausted() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Transport("reset".to_string()))
            },
            2,
            1,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parse_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Parse(ParseError::Empty))
            },
            3,
            1,
        )
        .await;

        assert_eq!(result, Err(FetchError::Parse(ParseError::Empty)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_text_maps_status_to_transport_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let settings = FetchSettings::default();
        let client = build_client(&settings).unwrap();
        let url = format!("{}/rates", mock_server.uri());
        let result = fetch_text(&client, &url, &settings).await;

        assert_eq!(
            result,
            Err(FetchError::Transport(format!(
                "HTTP error: 503 Service Unavailable for {url}"
            )))
        );
    }

    #[tokio::test]
    async fn test_fetch_text_recovers_on_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let settings = FetchSettings {
            retries: 1,
            retry_delay_ms: 1,
            ..FetchSettings::default()
        };
        let client = build_client(&settings).unwrap();
        let body = fetch_text(&client, &format!("{}/rates", mock_server.uri()), &settings)
            .await
            .unwrap();

        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_fetch_text_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let settings = FetchSettings {
            timeout_secs: 1,
            ..FetchSettings::default()
        };
        let client = build_client(&settings).unwrap();
        let result = fetch_text(&client, &format!("{}/slow", mock_server.uri()), &settings).await;

        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
