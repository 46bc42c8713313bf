//! Outbound HTTP with the aggregator's timeout / retry policy

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::provider::ProviderError;

/// Timeout and retry budget applied to every outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first one
    pub retries: u32,
    /// Delay before retry `n` is `backoff * n`
    pub backoff: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            retries: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RequestPolicy {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn build_client(&self, source: &'static str) -> Result<Client, ProviderError> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vyfinance-swap-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Client {
                source_name: source,
                message: e.to_string(),
            })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient_error(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

/// Send a request, retrying connect/timeout failures, 429 and 5xx up to
/// `policy.retries` times. Any other status is handed back to the caller.
pub(crate) async fn send_with_retries<F>(
    source: &'static str,
    url: &str,
    policy: &RequestPolicy,
    build: F,
) -> Result<Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt: u32 = 0;
    loop {
        tracing::debug!("{} GET {} (attempt {})", source, url, attempt + 1);

        let failure = match build().send().await {
            Ok(response) if !is_transient_status(response.status()) => return Ok(response),
            Ok(response) => ProviderError::Status {
                source_name: source,
                url: url.to_string(),
                status: response.status().as_u16(),
            },
            Err(e) if is_transient_error(&e) => ProviderError::Http {
                source_name: source,
                url: url.to_string(),
                message: e.to_string(),
            },
            Err(e) => {
                return Err(ProviderError::Http {
                    source_name: source,
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        };

        if attempt >= policy.retries {
            return Err(failure);
        }
        attempt += 1;
        tracing::warn!("{} - retrying ({}/{})", failure, attempt, policy.retries);
        tokio::time::sleep(policy.backoff * attempt).await;
    }
}

/// Decode a JSON body, mapping non-success statuses to [`ProviderError::Status`]
pub(crate) async fn json_body<T: serde::de::DeserializeOwned>(
    source: &'static str,
    url: &str,
    response: Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            source_name: source,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|e| ProviderError::Decode {
        source_name: source,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_retries_transient_status_until_budget_exhausted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let policy =
            RequestPolicy::new(Duration::from_secs(2), 2).with_backoff(Duration::from_millis(1));
        let client = policy.build_client("test").unwrap();
        let url = format!("{}/flaky", server.url());

        let err = send_with_retries("test", &url, &policy, || client.get(&url))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let mut server = Server::new_async().await;
        let unavailable = server
            .mock("GET", "/recovering")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/recovering")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let policy =
            RequestPolicy::new(Duration::from_secs(2), 3).with_backoff(Duration::from_millis(1));
        let client = policy.build_client("test").unwrap();
        let url = format!("{}/recovering", server.url());

        let response = send_with_retries("test", &url, &policy, || client.get(&url))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        unavailable.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let policy = RequestPolicy::new(Duration::from_secs(2), 3);
        let client = policy.build_client("test").unwrap();
        let url = format!("{}/missing", server.url());

        let response = send_with_retries("test", &url, &policy, || client.get(&url))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        mock.assert_async().await;
    }
}
