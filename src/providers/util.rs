use anyhow::{Error, anyhow};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempts made after the first failure.
pub const DEFAULT_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Retries an async operation, sleeping `delay_ms` between attempts.
///
/// Runs at most `1 + retries` times and returns the last error once the
/// attempts are used up.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, retries: usize, delay_ms: u64) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Error> + Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err.into());
                }
                debug!("Attempt {}/{} failed: {}. Retrying...", attempt, retries, err);
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// GET `url`, retrying transport failures and 5xx responses.
///
/// Client errors come back as-is so callers can report the status.
pub async fn send_with_retry(
    client: &reqwest::Client,
    url: &str,
    retries: usize,
    delay_ms: u64,
) -> Result<reqwest::Response, Error> {
    with_retry(
        || async {
            let response = client.get(url).send().await?;
            if response.status().is_server_error() {
                warn!(status = %response.status(), url, "Server error");
                return Err(anyhow!("HTTP error: {}", response.status()));
            }
            Ok::<_, Error>(response)
        },
        retries,
        delay_ms,
    )
    .await
}
