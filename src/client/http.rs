//! Request channel: the service's HTTP API.
//!
//! # Responsibilities
//! - Build a reqwest client for the loopback service (self-signed certificate)
//! - Probe a known path until the service accepts connections
//! - Forward arbitrary requests with Basic auth and JSON bodies

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::client::ClientError;
use crate::config::BridgeConfig;
use crate::discovery::Credentials;
use crate::observability::metrics;
use crate::resilience::Backoff;

/// Optional parts of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Serialized to JSON and sent as the body.
    pub body: Option<Value>,
    /// Query string pairs.
    pub query: Vec<(String, String)>,
    /// Extra headers, added to the JSON defaults.
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// An open request channel.
#[derive(Debug, Clone)]
pub struct RequestChannel {
    client: reqwest::Client,
    base_url: Url,
    username: String,
    token: String,
}

impl RequestChannel {
    /// Build the client. Does not touch the network.
    pub fn open(config: &BridgeConfig, credentials: &Credentials) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .no_proxy();
        if let Some(secs) = config.http.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let scheme = if config.connection.tls { "https" } else { "http" };
        let base_url = Url::parse(&format!(
            "{}://{}:{}",
            scheme, config.connection.host, credentials.port
        ))?;

        Ok(Self {
            client: builder.build()?,
            base_url,
            username: config.connection.username.clone(),
            token: credentials.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET `path` until the service accepts the connection.
    ///
    /// Only refused connections are retried. Any response ends the loop; a
    /// non-success status is logged but still counts as reachable.
    pub async fn probe(&self, path: &str, backoff: &Backoff) -> Result<StatusCode, ClientError> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            metrics::record_connect_attempt("probe");

            match self.request(Method::GET, path, RequestOptions::default()).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        tracing::info!(base_url = %self.base_url, "Connected to request channel");
                    } else {
                        tracing::warn!(
                            base_url = %self.base_url,
                            path,
                            status = %status,
                            "Connected to request channel, but the probe path answered with an unexpected status"
                        );
                    }
                    return Ok(status);
                }
                Err(ClientError::Http(e)) if e.is_connect() => {
                    tracing::warn!(attempt, error = %e, "Cannot connect to request channel, retrying");
                    backoff.wait(attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send `method uri` with Basic auth.
    pub async fn request(&self, method: Method, uri: &str, options: RequestOptions) -> Result<Response, ClientError> {
        let url = self.base_url.join(uri)?;
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.token));

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if !options.headers.is_empty() {
            request = request.headers(options.headers);
        }
        if let Some(body) = options.body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        Ok(request.send().await?)
    }

    /// Send a request and decode a JSON response, failing on non-success status.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        uri: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let response = self.request(method, uri, options).await?.error_for_status()?;
        Ok(response.json().await?)
    }
}
