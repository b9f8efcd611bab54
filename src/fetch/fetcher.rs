//! HTTP fetcher implementation
//!
//! This module handles the single GET request behind each fetch:
//! - Building the shared HTTP client from configuration
//! - Rejecting empty or malformed URLs before any network activity
//! - Bounding the request by the caller's deadline and cancellation token
//! - Classifying transport failures into [`FetchError`] variants

use crate::config::HttpSettings;
use crate::fetch::FetchContext;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Anything that can retrieve the content behind a URL
///
/// Implementations must turn every per-URL failure into a [`FetchError`]
/// and should honor `ctx` promptly, typically by running their work through
/// [`FetchContext::within`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the response body
    async fn fetch(&self, ctx: &FetchContext, url: &str) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from HTTP settings and wraps it
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(settings)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Issues one GET request for `url`
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Empty, unparsable or non-HTTP URL | `InvalidUrl`, no request sent |
    /// | Context deadline passes | `Timeout` |
    /// | Context token cancelled | `Canceled` |
    /// | Status other than 200 | `BadStatus`, body drained and discarded |
    /// | DNS, connect, TLS or body-read failure | `Transport` |
    async fn fetch(&self, ctx: &FetchContext, url: &str) -> Result<String, FetchError> {
        let target = validate_url(url)?;

        ctx.within(async {
            let response = self
                .client
                .get(target)
                .send()
                .await
                .map_err(classify_reqwest_error)?;

            let status = response.status();
            if status != StatusCode::OK {
                // Drain so the connection can be reused
                let _ = response.bytes().await;
                return Err(FetchError::BadStatus {
                    url: url.to_string(),
                    status_code: status.as_u16(),
                });
            }

            response.text().await.map_err(classify_reqwest_error)
        })
        .await
    }
}

/// Builds an HTTP client with proper configuration
///
/// No overall request timeout is set on the client; every request is bounded
/// by the deadline of its [`FetchContext`] instead.
///
/// # Example
///
/// ```no_run
/// use sumi_fetch::config::HttpSettings;
/// use sumi_fetch::fetch::build_http_client;
///
/// let client = build_http_client(&HttpSettings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
        .redirect(Policy::limited(settings.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Parses `url` and checks that it can be fetched over HTTP
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    if url.trim().is_empty() {
        return Err(invalid("empty URL".to_string()));
    }

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(parsed)
}

/// Maps a `reqwest` error onto the fetch error taxonomy
fn classify_reqwest_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::transport(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchErrorKind;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&HttpSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.com/").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/path?q=1").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_bad_input() {
        for url in ["", "   ", "not a url", "ftp://example.com/file", "mailto:a@b.com"] {
            let err = validate_url(url).unwrap_err();
            assert_eq!(err.kind(), FetchErrorKind::InvalidUrl, "url: {:?}", url);
        }
    }

    #[test]
    fn test_invalid_url_error_keeps_original_url() {
        match validate_url("not a url") {
            Err(FetchError::InvalidUrl { url, .. }) => assert_eq!(url, "not a url"),
            other => panic!("expected InvalidUrl, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_url_fails_without_request() {
        let fetcher = HttpFetcher::from_settings(&HttpSettings::default()).unwrap();
        let err = fetcher
            .fetch(&FetchContext::background(), "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::InvalidUrl);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop a listener so the port is very likely closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = HttpFetcher::from_settings(&HttpSettings::default()).unwrap();
        let ctx = FetchContext::with_timeout(Duration::from_secs(5));
        let err = fetcher
            .fetch(&ctx, &format!("http://127.0.0.1:{}/", port))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_truncated_body_after_ok_is_transport_error() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        // Promises 100 bytes, sends 5, then closes the connection
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .unwrap();
        });

        let fetcher = HttpFetcher::from_settings(&HttpSettings::default()).unwrap();
        let ctx = FetchContext::with_timeout(Duration::from_secs(5));
        let err = fetcher
            .fetch(&ctx, &format!("http://127.0.0.1:{}/", port))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::Transport);
        server.join().unwrap();
    }
}
