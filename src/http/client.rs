//! HTTP client setup and middleware configuration.
//!
//! Every request goes through [`TracingMiddleware`], so request spans show up
//! in whatever `tracing` subscriber the application installs.
//!
//! ```rust
//! use cloudnet_dl::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, USER_AGENT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "cloudnet-dl/0.1".parse()?);
//!
//! let config = HttpClientConfig {
//!     headers: Some(headers),
//!     ..HttpClientConfig::default()
//! };
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
    /// Bound on establishing a connection.
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            headers: None,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Creates an HTTP client with middleware configuration.
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut inner_client_builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .build();

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, USER_AGENT};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_create_http_client_with_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("test-agent"));

        let config = HttpClientConfig {
            headers: Some(headers),
            ..HttpClientConfig::default()
        };

        assert!(create_http_client(config).is_ok());
    }

    #[test]
    fn test_create_http_client_with_proxy() {
        let config = HttpClientConfig {
            proxy: Some(Proxy::http("http://proxy.example.com:8080").unwrap()),
            ..HttpClientConfig::default()
        };

        assert!(create_http_client(config).is_ok());
    }
}
