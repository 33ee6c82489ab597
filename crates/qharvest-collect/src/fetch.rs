//! Thin HTTP GET/POST wrapper shared by every collector.
//!
//! One bounded-timeout request per call, instance-default headers merged
//! under per-call headers (per-call wins on conflict). The client never
//! retries; collectors decide what a failure means for their batch.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::CollectError;

/// HTTP client with default headers and a bounded timeout.
pub struct FetchClient {
    client: reqwest::Client,
    default_headers: Vec<(String, String)>,
}

/// A completed HTTP exchange: status plus the raw body, with best-effort
/// JSON decoding on demand.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Deserialize`] if the body is not valid JSON
    /// for `T`; `context` names the call site in the error.
    pub fn json<T: serde::de::DeserializeOwned>(&self, context: &str) -> Result<T, CollectError> {
        serde_json::from_str(&self.body).map_err(|e| CollectError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

impl FetchClient {
    /// Creates a client with the given timeout and instance-default headers.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, default_headers: &[(&str, &str)]) -> Result<Self, CollectError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            default_headers: default_headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        })
    }

    /// Issues a single GET request.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] on timeout, connection failure, or any
    /// other transport error, and [`CollectError::InvalidHeader`] if a header
    /// cannot be encoded.
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<FetchResponse, CollectError> {
        let headers = self.merge_headers(headers)?;
        let response = self
            .client
            .get(url)
            .query(params)
            .headers(headers)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }

    /// Issues a single POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FetchClient::get`].
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
    ) -> Result<FetchResponse, CollectError> {
        let headers = self.merge_headers(headers)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .headers(headers)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }

    /// Builds the effective header map: defaults first, then per-call values
    /// inserted over them, so per-call headers win on conflict.
    fn merge_headers(&self, extra: &[(&str, &str)]) -> Result<HeaderMap, CollectError> {
        let mut map = HeaderMap::new();
        let defaults = self
            .default_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()));
        for (name, value) in defaults.chain(extra.iter().copied()) {
            let header_name =
                HeaderName::try_from(name).map_err(|e| CollectError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::try_from(value).map_err(|e| CollectError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}
