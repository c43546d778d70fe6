use std::fmt;

use crate::fetch::FetchError;
use crate::node::MaterializeError;
use crate::session::SessionError;

/// Anything that can stop a preview load chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    Fetch(FetchError),
    Materialize(MaterializeError),
    Session(SessionError),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Fetch(err) => write!(f, "preview fetch failed: {}", err),
            PreviewError::Materialize(err) => write!(f, "preview materialization failed: {}", err),
            PreviewError::Session(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PreviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewError::Fetch(err) => Some(err),
            PreviewError::Materialize(err) => Some(err),
            PreviewError::Session(err) => Some(err),
        }
    }
}

impl From<FetchError> for PreviewError {
    fn from(err: FetchError) -> Self {
        PreviewError::Fetch(err)
    }
}

impl From<MaterializeError> for PreviewError {
    fn from(err: MaterializeError) -> Self {
        PreviewError::Materialize(err)
    }
}

impl From<SessionError> for PreviewError {
    fn from(err: SessionError) -> Self {
        PreviewError::Session(err)
    }
}
