//! Unified error type for the access-and-session layer.
//!
//! Every operation on [`ApiClient`](crate::ApiClient), the session manager and
//! the cart controller returns `Result<T, ApiError>`. Non-2xx responses are
//! normalized here so callers only ever match on one type.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use vitrine_core::{EmailError, QuantityError, RatingError};

use crate::store::StoreError;

/// Errors surfaced by the storefront client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connectivity, timeout, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401 with no usable refresh token, or a 401 on the retried request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The refresh exchange failed; tokens were cleared.
    #[error("Session expired")]
    SessionExpired,

    /// 4xx other than 401.
    #[error("Validation error ({status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Message from the server payload, or `Error <status>`.
        message: String,
    },

    /// 5xx (and any other non-2xx that is not a 4xx).
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the server payload, or `Error <status>`.
        message: String,
    },

    /// A 2xx body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected locally before any request was issued.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cart mutation attempted without a signed-in user.
    #[error("Login required")]
    LoginRequired,

    /// The caller's cancellation token fired.
    #[error("Request cancelled")]
    Cancelled,

    /// Reading or writing the persisted session failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse error classification for UI handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Could not reach the server.
    Network,
    /// Authentication failed or the session ended.
    Authentication,
    /// The server rejected the request (4xx).
    Validation,
    /// The server failed (5xx) or answered with something unreadable.
    Server,
    /// Local failure: input validation, cancellation, storage.
    Client,
}

/// Error body shapes the backend is known to send.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Normalize a non-2xx response.
    ///
    /// The message is the body's `error` field, then `message`, then the
    /// generic `Error <status>` when the body is empty or not JSON.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Error {}", status.as_u16()));

        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized(message)
        } else if status.is_client_error() {
            Self::Validation {
                status: status.as_u16(),
                message,
            }
        } else {
            Self::Server {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Unauthorized(_) | Self::SessionExpired | Self::LoginRequired => {
                ErrorKind::Authentication
            }
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Server { .. } | Self::Decode(_) => ErrorKind::Server,
            Self::InvalidInput(_) | Self::Cancelled | Self::Storage(_) => ErrorKind::Client,
        }
    }

    /// HTTP status, when the error came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text to show the user. Server messages pass through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(message)
            | Self::Validation { message, .. }
            | Self::Server { message, .. }
            | Self::InvalidInput(message) => message.clone(),
            Self::SessionExpired => "Session expired. Please sign in again.".to_string(),
            Self::LoginRequired => "Sign in to use the cart.".to_string(),
            Self::Network(_) => "Could not reach the store. Check your connection.".to_string(),
            Self::Cancelled => "Request cancelled.".to_string(),
            Self::Decode(_) | Self::Storage(_) => "Something went wrong.".to_string(),
        }
    }
}

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<QuantityError> for ApiError {
    fn from(err: QuantityError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias for `ApiError`.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::Rating;

    use super::*;

    #[test]
    fn test_error_field_is_preferred() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Produto não encontrado","message":"ignored"}"#,
        );
        assert_eq!(err.user_message(), "Produto não encontrado");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_message_field_fallback() {
        let err = ApiError::from_response(StatusCode::CONFLICT, r#"{"message":"Email em uso"}"#);
        assert_eq!(err.user_message(), "Email em uso");
    }

    #[test]
    fn test_generic_message_for_unparsable_body() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(
            err,
            ApiError::Server { status: 502, ref message } if message == "Error 502"
        ));
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn test_generic_message_for_empty_body() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, "");
        assert_eq!(err.user_message(), "Error 404");
    }

    #[test]
    fn test_unauthorized_is_authentication() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"error":"Token inválido"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Token inválido"));
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_session_expired_message() {
        assert_eq!(ApiError::SessionExpired.to_string(), "Session expired");
        assert_eq!(ApiError::SessionExpired.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_rating_error_is_local() {
        let err: ApiError = Rating::new(6).map_err(ApiError::from).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Client);
        assert_eq!(err.user_message(), "rating must be between 1 and 5, got 6");
    }
}
