use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the rules or stream endpoint.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
}

/// A stream record that could not be decoded.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record has no included users")]
    MissingAuthor,
}

/// The webhook rejected a notification or was unreachable.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook returned HTTP {0}")]
    Status(StatusCode),
}
