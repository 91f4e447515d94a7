//! Errors raised by the hosted backend client.

use reqwest::StatusCode;
use store::BackendError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The magic-link redirect carried an error instead of tokens.
    #[error("{0}")]
    Callback(String),
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session storage: {0}")]
    Storage(String),
}

impl SupabaseError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            SupabaseError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<SupabaseError> for BackendError {
    fn from(err: SupabaseError) -> Self {
        let status = err.status();
        let error = BackendError::new(err.to_string());
        match status {
            Some(status) => error.with_status(status),
            None => error,
        }
    }
}

/// Pass a success response through, turn anything else into [`SupabaseError::Api`].
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Human-readable message from an error response body.
///
/// Auth endpoints answer with `msg` or `error_description`, the REST layer
/// with `message`. Falls back to the status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.to_string())
}
