//! Downloading target URLs.
//!
//! The [`Fetcher`] trait is the seam between the pipeline and the network.
//! [`HttpFetcher`] is the production implementation on top of `reqwest`;
//! tests can substitute their own.

use crate::config::FetchConfig;
use crate::error::{FetchError, FetchErrorKind, Result};
use crate::types::FetchResult;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::time::{Duration, Instant};

/// Trait for downloading one URL
///
/// Implementations never fail past this boundary: every problem is turned
/// into a [`FetchError`] inside the returned [`FetchResult`], together with
/// the time spent.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` in full
    ///
    /// `timeout_cap`, when given, shortens the implementation's own timeout
    /// (used to keep the whole run inside its time budget).
    async fn fetch(&self, url: &str, timeout_cap: Option<Duration>) -> FetchResult;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Fetcher for `http`, `https` and `file` URLs
///
/// Remote URLs go through a shared `reqwest` client and follow its default
/// redirect policy. `file://` URLs are read from disk and are allowed even
/// when remote fetching is switched off.
pub struct HttpFetcher {
    client: reqwest::Client,
    allow_remote: bool,
    timeout: Duration,
    max_response_bytes: Option<u64>,
}

impl HttpFetcher {
    /// Build a fetcher from the fetch settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            allow_remote: config.allow_remote,
            timeout: config.timeout,
            max_response_bytes: config.max_response_bytes,
        })
    }

    async fn download(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Bytes, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| {
            FetchError::new(
                FetchErrorKind::InvalidUrl,
                format!("invalid URL '{}': {}", url, e),
            )
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            "file" => return self.read_local(&parsed).await,
            other => {
                return Err(FetchError::new(
                    FetchErrorKind::InvalidUrl,
                    format!("unsupported URL scheme '{}' in '{}'", other, url),
                ));
            }
        }

        if !self.allow_remote {
            return Err(FetchError::new(
                FetchErrorKind::Disabled,
                format!(
                    "remote fetching is disabled (fetch.allow_remote = false), refusing '{}'",
                    url
                ),
            ));
        }

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::Status(status.as_u16()),
                format!("HTTP request failed: {} for '{}'", status, url),
            ));
        }

        if let (Some(limit), Some(declared)) = (self.max_response_bytes, response.content_length())
            && declared > limit
        {
            return Err(too_large(url, declared, limit));
        }

        self.read_body(url, response).await
    }

    async fn read_body(
        &self,
        url: &str,
        mut response: reqwest::Response,
    ) -> std::result::Result<Bytes, FetchError> {
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?
        {
            body.extend_from_slice(&chunk);
            if let Some(limit) = self.max_response_bytes
                && body.len() as u64 > limit
            {
                return Err(too_large(url, body.len() as u64, limit));
            }
        }
        Ok(body.freeze())
    }

    async fn read_local(&self, url: &url::Url) -> std::result::Result<Bytes, FetchError> {
        let path = url.to_file_path().map_err(|()| {
            FetchError::new(
                FetchErrorKind::InvalidUrl,
                format!("'{}' does not name a local file", url),
            )
        })?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            FetchError::new(
                FetchErrorKind::Request,
                format!("failed to open '{}': {}", path.display(), e),
            )
        })?;

        if let Some(limit) = self.max_response_bytes
            && data.len() as u64 > limit
        {
            return Err(too_large(url.as_str(), data.len() as u64, limit));
        }

        Ok(Bytes::from(data))
    }
}

fn too_large(url: &str, size: u64, limit: u64) -> FetchError {
    FetchError::new(
        FetchErrorKind::TooLarge,
        format!(
            "response from '{}' is larger than the {} byte limit ({} bytes)",
            url, limit, size
        ),
    )
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout_cap: Option<Duration>) -> FetchResult {
        let timeout = timeout_cap.map_or(self.timeout, |cap| cap.min(self.timeout));

        let start = Instant::now();
        let outcome = self.download(url, timeout).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &outcome {
            Ok(body) => {
                tracing::debug!(url, bytes = body.len(), elapsed_ms, "fetched");
            }
            Err(e) => {
                tracing::warn!(url, kind = ?e.kind, error = %e, elapsed_ms, "fetch failed");
            }
        }

        FetchResult {
            elapsed_ms,
            outcome,
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(config: FetchConfig) -> HttpFetcher {
        HttpFetcher::new(&config).unwrap()
    }

    async fn serve(path_str: &str, template: ResponseTemplate) -> (MockServer, String) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(path_str))
            .respond_with(template)
            .mount(&server)
            .await;
        let url = format!("{}{}", server.uri(), path_str);
        (server, url)
    }

    #[tokio::test]
    async fn fetches_body_and_measures_time() {
        let body = b"\x89PNG\r\n\x1a\nrest-of-image".to_vec();
        let (_server, url) = serve(
            "/img.png",
            ResponseTemplate::new(200).set_body_bytes(body.clone()),
        )
        .await;

        let result = fetcher(FetchConfig::default()).fetch(&url, None).await;

        assert!(result.is_success());
        assert_eq!(result.bytes().unwrap().as_ref(), body.as_slice());
        assert!(result.elapsed_ms >= 0.0);
    }

    #[tokio::test]
    async fn http_error_status_is_a_failure() {
        let (_server, url) = serve(
            "/missing.jpg",
            ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"),
        )
        .await;

        let result = fetcher(FetchConfig::default()).fetch(&url, None).await;

        let err = result.error().unwrap();
        assert_eq!(err.kind, FetchErrorKind::Status(404));
        assert!(err.message.contains("404"));
    }

    #[tokio::test]
    async fn connection_refused_is_reported() {
        // Grab a free port, then close it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{}/img.jpg", port);
        let result = fetcher(FetchConfig::default()).fetch(&url, None).await;

        let err = result.error().unwrap();
        assert_eq!(err.kind, FetchErrorKind::Connect);
        assert!(!err.message.is_empty());
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let (_server, url) = serve(
            "/slow.jpg",
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF])
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let result = fetcher(config).fetch(&url, None).await;

        assert_eq!(result.error().unwrap().kind, FetchErrorKind::Timeout);
    }

    #[tokio::test]
    async fn timeout_cap_shortens_configured_timeout() {
        let (_server, url) = serve(
            "/slow.jpg",
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF])
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let result = fetcher(FetchConfig::default())
            .fetch(&url, Some(Duration::from_millis(200)))
            .await;

        assert_eq!(result.error().unwrap().kind, FetchErrorKind::Timeout);
        assert!(result.elapsed_ms < 5000.0);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let (_server, url) = serve(
            "/big.jpg",
            ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]),
        )
        .await;

        let config = FetchConfig {
            max_response_bytes: Some(1024),
            ..Default::default()
        };
        let result = fetcher(config).fetch(&url, None).await;

        assert_eq!(result.error().unwrap().kind, FetchErrorKind::TooLarge);
    }

    #[tokio::test]
    async fn remote_fetch_can_be_disabled() {
        let config = FetchConfig {
            allow_remote: false,
            ..Default::default()
        };
        let result = fetcher(config)
            .fetch("https://example.invalid/a.png", None)
            .await;

        assert_eq!(result.error().unwrap().kind, FetchErrorKind::Disabled);
    }

    #[tokio::test]
    async fn local_files_are_read_even_when_remote_is_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("local.gif");
        std::fs::write(&file, b"GIF89a....").unwrap();
        let url = url::Url::from_file_path(&file).unwrap();

        let config = FetchConfig {
            allow_remote: false,
            ..Default::default()
        };
        let result = fetcher(config).fetch(url.as_str(), None).await;

        assert_eq!(result.bytes().unwrap().as_ref(), b"GIF89a....");
    }

    #[tokio::test]
    async fn bad_urls_are_rejected() {
        let f = fetcher(FetchConfig::default());

        let result = f.fetch("not a url", None).await;
        assert_eq!(result.error().unwrap().kind, FetchErrorKind::InvalidUrl);

        let result = f.fetch("ftp://example.com/a.png", None).await;
        assert_eq!(result.error().unwrap().kind, FetchErrorKind::InvalidUrl);
    }
}
