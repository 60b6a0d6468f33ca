//! Upstream HTTP client shared by both integrations.
//!
//! # Design
//! `HttpClient` holds a base URL, a precomputed credential header and a
//! `Transport`. Request construction (`build_request`) and status
//! classification (`check_status`) are pure functions of their inputs; only
//! `send` touches the transport. One client type serves both
//! integrations; they differ only in the `UpstreamProfile` passed at
//! construction.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::UpstreamProfile;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, RequestOptions};
use crate::transport::{Transport, UreqTransport};

/// Single-attempt JSON client bound to one upstream profile.
#[derive(Debug, Clone)]
pub struct HttpClient<T = UreqTransport> {
    base_url: String,
    auth_header: Option<String>,
    transport: T,
}

impl HttpClient<UreqTransport> {
    /// Client over a fresh blocking `ureq` agent.
    pub fn from_profile(profile: &UpstreamProfile) -> Self {
        Self::new(profile, UreqTransport::new())
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn new(profile: &UpstreamProfile, transport: T) -> Self {
        Self {
            base_url: profile.base_url.trim_end_matches('/').to_string(),
            auth_header: profile.auth.as_ref().map(|auth| auth.header_value()),
            transport,
        }
    }

    pub fn build_request(&self, path: &str, options: &RequestOptions) -> HttpRequest {
        let mut forced = vec![
            ("content-type", "application/json".to_string()),
            ("accept", "application/json".to_string()),
        ];
        if let Some(auth) = &self.auth_header {
            forced.push(("authorization", auth.clone()));
        }

        let mut headers: Vec<(String, String)> = options
            .headers
            .iter()
            .filter(|(name, _)| !forced.iter().any(|(set, _)| name.eq_ignore_ascii_case(set)))
            .cloned()
            .collect();
        headers.extend(forced.into_iter().map(|(name, value)| (name.to_string(), value)));

        HttpRequest {
            method: options.method,
            url: format!("{}{path}", self.base_url),
            headers,
            body: options.body.clone(),
        }
    }

    /// Performs one round-trip and classifies the outcome.
    pub fn request(&self, path: &str, options: &RequestOptions) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(path, options);
        self.send(&request)
    }

    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "upstream request");
        let response = self
            .transport
            .execute(request)
            .map_err(|e| ApiError::NetworkUnavailable {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;
        debug!(status = response.status, url = %request.url, "upstream response");
        check_status(response)
    }

    pub fn get_json<D: DeserializeOwned>(&self, path: &str) -> Result<D, ApiError> {
        let response = self.request(path, &RequestOptions::default())?;
        parse_json(&response)
    }
}

pub fn parse_json<D: DeserializeOwned>(response: &HttpResponse) -> Result<D, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Passes 2xx responses through and turns everything else into
/// `ApiError::RequestFailed` with the most specific message available.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    let status = response.status;
    let status_text = response.status_text;

    let (message, data) = match serde_json::from_str::<Value>(&response.body) {
        Ok(data) => {
            let message = data
                .get("detail")
                .and_then(Value::as_str)
                .filter(|detail| !detail.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status code {status}"));
            (message, data)
        }
        Err(_) => {
            let message = if status_text.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                status_text.clone()
            };
            let data = json!({ "detail": message });
            (message, data)
        }
    };

    Err(ApiError::RequestFailed {
        status,
        status_text,
        data,
        message,
    })
}
