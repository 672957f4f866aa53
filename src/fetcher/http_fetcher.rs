use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::app::{ApiError, ApiResult};
use crate::fetcher::{ApiConfig, Endpoint, Fetcher, RequestOptions};

pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append the endpoint to the base URL, encoding each segment separately.
    pub fn resolve(&self, endpoint: &Endpoint) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            for segment in endpoint.segments() {
                segments.push(segment);
            }
        }

        if !endpoint.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query_pairs());
        }

        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

fn build_headers(overrides: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in overrides {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "ignoring invalid request header"),
        }
    }

    headers
}

/// Message for a non-success response: the body's `message` field if the body
/// is JSON, the status reason if it is not.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = || format!("API Error: {}", status.as_u16());

    match serde_json::from_slice::<Value>(body) {
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .unwrap_or_else(fallback),
        Err(_) => status
            .canonical_reason()
            .map(String::from)
            .unwrap_or_else(fallback),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn request(&self, endpoint: &Endpoint, options: RequestOptions) -> ApiResult<Value> {
        let url = self.resolve(endpoint)?;
        debug!(method = %options.method, %url, "api request");

        let mut request = self
            .client
            .request(options.method, url)
            .headers(build_headers(&options.headers));

        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = error_message(status, &body);
            debug!(status = status.as_u16(), %message, %endpoint, "api error response");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Parse(format!("{} returned invalid JSON: {}", endpoint, e)))
    }
}
