use std::path::PathBuf;

use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// All errors that can occur when using the Meditrail SDK.
#[derive(Error, Debug)]
pub enum MeditrailError {
    /// The client could not be constructed (missing API key, bad base URL, ...).
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// The upload path does not name an existing, readable regular file.
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The file exceeds the upload limit. Raised locally, before any request.
    #[error("file too large: {:.2}MB (max: {}MB)", as_mb(.size_bytes), as_mb(.limit_bytes))]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    /// The request was sent (or attempted) and failed remotely or in transit.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An I/O error while reading an already opened file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeditrailError {
    /// The remote error kind, if this error came back from the API or the transport.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind),
            _ => None,
        }
    }

    /// HTTP status attached to the error, when a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(err) => err.status,
            _ => None,
        }
    }

    /// `true` for both the local size check and a server-reported 413.
    pub fn is_file_too_large(&self) -> bool {
        matches!(self, Self::FileTooLarge { .. }) || self.api_kind() == Some(ApiErrorKind::FileTooLarge)
    }
}

/// Classification of a failed call to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// HTTP 400.
    BadRequest,
    /// HTTP 413.
    FileTooLarge,
    /// HTTP 429. Backing off is up to the caller.
    UsageLimitExceeded,
    /// HTTP 500.
    ServerError,
    /// Any status without a dedicated kind.
    Unexpected,
    /// No response was received (connection failure, timeout).
    Network,
    /// A 200 response whose body is not a valid result.
    InvalidResponse,
}

/// An error reported by the API or raised by the transport.
///
/// `detail` is the full human-readable message, e.g.
/// `"Usage limit exceeded: monthly quota reached"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// `None` for [`ApiErrorKind::Network`].
    pub status: Option<u16>,
    pub detail: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            detail: detail.into(),
        }
    }
}

fn as_mb(bytes: &u64) -> f64 {
    *bytes as f64 / BYTES_PER_MB
}

/// A convenience alias for `Result<T, MeditrailError>`.
pub type Result<T> = std::result::Result<T, MeditrailError>;
