//! Mapping of HTTP failures onto store errors

use activation_core::StoreError;
use reqwest::StatusCode;

/// Classify a transport-level failure.
pub(crate) fn from_transport(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout(err.to_string())
    } else if err.is_decode() {
        StoreError::InvalidResponse(err.to_string())
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

/// Classify a non-success response.
pub(crate) fn from_status(status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StoreError::Timeout(message),
        s if s.is_server_error() => StoreError::Unavailable(format!("{}: {}", s.as_u16(), message)),
        s => StoreError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}
