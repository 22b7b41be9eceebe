use actix_web::http::StatusCode;
use thiserror::Error;

/// Terminal failures of a single relay. Every variant keeps the URL that was attempted.
#[derive(Error, Debug)]
pub enum RelayError {
  #[error("invalid target URL '{executed_url}': {reason}")]
  InvalidTarget { executed_url: String, reason: String },

  #[error("failed to read body for '{executed_url}': {reason}")]
  BodyReadFailed { executed_url: String, reason: String },

  #[error("upstream '{executed_url}' unreachable: {reason}")]
  UpstreamUnreachable { executed_url: String, reason: String },

  #[error("streaming response from '{executed_url}' failed: {reason}")]
  StreamingFailure { executed_url: String, reason: String },
}

impl RelayError {
  pub fn executed_url(&self) -> &str {
    match self {
      RelayError::InvalidTarget { executed_url, .. }
      | RelayError::BodyReadFailed { executed_url, .. }
      | RelayError::UpstreamUnreachable { executed_url, .. }
      | RelayError::StreamingFailure { executed_url, .. } => executed_url,
    }
  }

  /// Status sent to the caller when the failure happens before the response head.
  /// `None` once the head has gone out.
  pub fn status_code(&self) -> Option<StatusCode> {
    match self {
      RelayError::InvalidTarget { .. } | RelayError::BodyReadFailed { .. } => Some(StatusCode::INTERNAL_SERVER_ERROR),
      RelayError::UpstreamUnreachable { .. } => Some(StatusCode::BAD_GATEWAY),
      RelayError::StreamingFailure { .. } => None,
    }
  }
}
