use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, ClientBuilder,
};
use std::time::Duration;

use crate::config::BalancerConfig;

use super::errors::BalancerError;

/// SDK identification headers attached to every outbound request.
const HEADER_SDK_VERSION: HeaderName = HeaderName::from_static("x-ttm-sdk-version");
const HEADER_SDK_PRODUCT: HeaderName = HeaderName::from_static("x-ttm-sdk-product");
const HEADER_SDK_DEBUG: HeaderName = HeaderName::from_static("x-ttm-sdk-debug");
const HEADER_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

const SDK_PRODUCT: &str = "RUST";

/// Longest response excerpt carried inside an [`BalancerError::HttpError`].
const ERROR_BODY_EXCERPT: usize = 256;

/// Thin wrapper over a pooled `reqwest` client.
///
/// Owns the SDK headers and the error mapping; timeouts are supplied per
/// request because probes carry a 5 s abort deadline while client RPC calls
/// have no deadline at this layer.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds the client with the SDK headers derived from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BalancerError::ConnectionFailed`] if the underlying client
    /// fails to build, and [`BalancerError::InvalidRequest`] if the supplied
    /// API key is not a valid header value.
    pub fn new(config: &BalancerConfig) -> Result<Self, BalancerError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HEADER_SDK_VERSION, HeaderValue::from_static(env!("CARGO_PKG_VERSION")));
        headers.insert(HEADER_SDK_PRODUCT, HeaderValue::from_static(SDK_PRODUCT));
        headers.insert(
            HEADER_SDK_DEBUG,
            HeaderValue::from_static(if config.verbose { "true" } else { "false" }),
        );
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|_| {
                BalancerError::InvalidRequest("API key is not a valid header value".to_string())
            })?;
            headers.insert(HEADER_API_KEY, value);
        }

        let client = ClientBuilder::new()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                BalancerError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Sends an HTTP POST with a JSON body, returning the raw response bytes.
    ///
    /// # Errors
    ///
    /// - [`BalancerError::Timeout`] if `timeout` elapses
    /// - [`BalancerError::HttpError`] for non-2xx status codes
    /// - [`BalancerError::ConnectionFailed`] for other transport failures
    pub async fn post_json(
        &self,
        url: &str,
        body: Bytes,
        timeout: Option<Duration>,
    ) -> Result<Bytes, BalancerError> {
        let mut request = self.client.post(url).body(body);
        if let Some(deadline) = timeout {
            request = request.timeout(deadline);
        }
        self.execute(request).await
    }

    /// Sends an HTTP GET, returning the raw response bytes.
    ///
    /// # Errors
    ///
    /// Same mapping as [`HttpClient::post_json`].
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Bytes, BalancerError> {
        self.execute(self.client.get(url).timeout(timeout)).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Bytes, BalancerError> {
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(map_transport_error);
        }

        let raw_text = response.text().await.unwrap_or_default();
        let excerpt = if raw_text.len() > ERROR_BODY_EXCERPT {
            let cut = (0..=ERROR_BODY_EXCERPT)
                .rev()
                .find(|i| raw_text.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}... (truncated)", &raw_text[..cut])
        } else {
            raw_text
        };
        Err(BalancerError::HttpError(status.as_u16(), excerpt))
    }
}

fn map_transport_error(error: reqwest::Error) -> BalancerError {
    if error.is_timeout() {
        return BalancerError::Timeout;
    }
    BalancerError::ConnectionFailed(sanitize_network_error(&error))
}

/// Reduces transport errors to fixed messages so endpoint URLs and internal
/// addresses never leak into error strings.
fn sanitize_network_error(error: &reqwest::Error) -> String {
    if error.is_connect() {
        "connection refused or unreachable".to_string()
    } else if error.is_request() {
        "request failed".to_string()
    } else if error.is_body() {
        "response body error".to_string()
    } else if error.is_decode() {
        "response decode error".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else {
        "network error".to_string()
    }
}
