use std::fmt;

/// A failed network step of the preview chain.
///
/// The session absorbs these into its "not a preview" state; they are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, TLS, or timeout failure.
    Transport(String),
    /// Non-success HTTP status.
    Status { url: String, status: u16 },
    /// The response body was not what we expected.
    Decode(String),
    /// The API answered but knows no such document (or not under this ref).
    DocumentNotFound(String),
    /// An endpoint or base URL could not be built.
    InvalidUrl(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(message) => write!(f, "transport error: {}", message),
            FetchError::Status { url, status } => {
                write!(f, "request to {} failed with status {}", url, status)
            }
            FetchError::Decode(message) => write!(f, "decode error: {}", message),
            FetchError::DocumentNotFound(id) => write!(f, "document not found: {}", id),
            FetchError::InvalidUrl(message) => write!(f, "invalid url: {}", message),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
