//! The HTTP seam under [`Client`](crate::Client).
//!
//! A [`Transport`] sends one multipart POST and hands back the status and
//! body. It does not interpret either; classification happens in
//! [`classify_response`](crate::classify_response).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

use crate::config::{ApiKey, REQUEST_TIMEOUT};
use crate::errors::{MeditrailError, Result};

pub(crate) const API_KEY_HEADER: &str = "X-API-Key";

/// Everything needed to put one upload on the wire.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    pub url: String,
    pub api_key: ApiKey,
    pub file: FilePart,
    /// Text parts, in order. Only non-blank fields are present.
    pub fields: Vec<(String, String)>,
}

impl MultipartRequest {
    /// Look up a text part by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The `file` part.
#[derive(Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Status and body of whatever the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// No usable response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Sends a multipart POST and returns status + body.
///
/// Implementations must not retry: uploads are not idempotent.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: MultipartRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the fixed 60 second timeout.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| MeditrailError::Config {
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: MultipartRequest) -> std::result::Result<RawResponse, TransportError> {
        let MultipartRequest {
            url,
            api_key,
            file,
            fields,
        } = request;

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;

        let form = fields
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| form.text(name, value));

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key.expose())
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        debug!(%url, status, "received HTTP response");

        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
