use crate::error::{Result, ScanError};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!(
                "Spotter/{} (https://github.com/trapdoorsec/spotter)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

/// Single-attempt page fetcher. No retries, no backoff.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::new(&FetcherConfig {
            timeout_secs,
            ..FetcherConfig::default()
        })
    }

    /// Fetch a page body. Any non-2xx status is an error.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ScanError::StatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(
            "Fetched {} ({} bytes in {:?})",
            url,
            body.len(),
            start.elapsed()
        );

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spot/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>hello</body></html>"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let body = fetcher
            .fetch(&format!("{}/spot/index.html", mock_server.uri()))
            .await
            .unwrap();

        assert!(body.contains("hello"));
    }

    #[tokio::test]
    async fn test_fetch_status_error_is_single_attempt() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::StatusError { status: 503, .. }));
        assert!(err.is_branch_local());
    }

    #[tokio::test]
    async fn test_fetch_network_error() {
        let fetcher = Fetcher::with_timeout(1).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/nothing").await.unwrap_err();

        assert!(matches!(err, ScanError::HttpError(_)));
        assert!(err.is_branch_local());
    }
}
