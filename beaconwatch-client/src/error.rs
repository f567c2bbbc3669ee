use thiserror::Error;

/// Closed taxonomy of per-node request failures.
///
/// Monitors match on these to place a node in exactly one failure bucket;
/// no raw transport error ever crosses the monitor boundary.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("transport error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Unknown(err.to_string())
        }
    }
}
