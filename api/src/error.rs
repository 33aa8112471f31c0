use thiserror::Error;

/// Failure of a single backend call.
///
/// `Display` is the human-readable text a hook stores in its error state.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An authenticated operation was attempted with no stored token.
    /// Raised before any network IO.
    #[error("{0}")]
    MissingToken(&'static str),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request never produced a response (DNS, refused connection, reset).
    #[error("{operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the client's deadline.
    #[error("{operation}: request timed out")]
    Timeout { operation: &'static str },

    /// A 2xx response whose body could not be decoded.
    #[error("{operation}: invalid response body: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },

    /// The owning hook aborted the request before it settled.
    #[error("request cancelled")]
    Cancelled,

    /// The owning hook was disposed; no request was sent.
    #[error("request issued after dispose")]
    Disposed,

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status for server rejections.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled | ApiError::Disposed)
    }
}
