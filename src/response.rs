use serde_json::Value;

use crate::errors::{ApiError, ApiErrorKind, MeditrailError, Result};
use crate::models::UploadResult;
use crate::transport::TransportError;

const BODY_EXCERPT_CHARS: usize = 200;

/// Turn a raw HTTP status and body from `/ocr/process` into a result.
///
/// Only 200 is a success. Error bodies that are not JSON are treated as
/// having no `detail` field; the status alone decides the error kind.
///
/// ```
/// use meditrail::{classify_response, ApiErrorKind};
///
/// let err = classify_response(429, r#"{"detail": {"message": "limit"}}"#).unwrap_err();
/// assert_eq!(err.api_kind(), Some(ApiErrorKind::UsageLimitExceeded));
/// assert_eq!(err.to_string(), "Usage limit exceeded: limit");
/// ```
pub fn classify_response(status: u16, body: &str) -> Result<UploadResult> {
    if status == 200 {
        return parse_success(body);
    }

    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let detail = parsed.as_ref().and_then(|b| b.get("detail"));

    let err = match status {
        400 => ApiError::new(
            ApiErrorKind::BadRequest,
            Some(status),
            with_detail("Bad Request", detail.and_then(detail_text)),
        ),
        413 => ApiError::new(ApiErrorKind::FileTooLarge, Some(status), "File too large (max 50MB)"),
        429 => {
            let message = detail
                .filter(|d| d.is_object())
                .and_then(|d| d.get("message"))
                .and_then(detail_text);
            ApiError::new(
                ApiErrorKind::UsageLimitExceeded,
                Some(status),
                with_detail("Usage limit exceeded", message),
            )
        }
        500 => ApiError::new(
            ApiErrorKind::ServerError,
            Some(status),
            with_detail("Internal Server Error", detail.and_then(detail_text)),
        ),
        _ => ApiError::new(
            ApiErrorKind::Unexpected,
            Some(status),
            format!("Unexpected response: {status} - {body}"),
        ),
    };

    Err(err.into())
}

fn parse_success(body: &str) -> Result<UploadResult> {
    serde_json::from_str(body)
        .and_then(UploadResult::from_value)
        .map_err(|err| {
            MeditrailError::from(ApiError::new(
                ApiErrorKind::InvalidResponse,
                Some(200),
                format!("Invalid JSON response: {err}: {}", excerpt(body)),
            ))
        })
}

/// Success bodies carry OCR text; keep only the start in error messages.
fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

pub(crate) fn network_error(err: &TransportError) -> ApiError {
    ApiError::new(ApiErrorKind::Network, None, err.to_string())
}

/// Strings are used verbatim; other non-null values are rendered as JSON.
fn detail_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn with_detail(prefix: &str, detail: Option<String>) -> String {
    match detail {
        Some(detail) => format!("{prefix}: {detail}"),
        None => prefix.to_string(),
    }
}
