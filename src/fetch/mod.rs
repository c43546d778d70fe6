//! Document fetching.
//!
//! The content API is consumed through two traits mirroring its client:
//! a [`ContentApiConnector`] that resolves the repository metadata, and the
//! [`ContentApi`] handle it returns, which carries the preview cookie.
//! [`fetch_preview_document`] drives them in the order the API needs: the
//! cookie has to be in place before the document is requested, or the API
//! answers with the published version instead of the draft.

mod error;
#[cfg(feature = "http")]
mod http;

use async_trait::async_trait;

use crate::document::RawDocument;
use crate::registry::EffectiveConfig;

pub use error::FetchError;
#[cfg(feature = "http")]
pub use http::{HttpConnector, HttpContentApi};

/// Cookie the content API reads the preview ref from.
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Per-request options for a by-id lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// `custom_type.field` pairs whose data is inlined into link fields.
    pub fetch_links: Vec<String>,
    pub lang: Option<String>,
}

impl DocumentQuery {
    pub fn from_config(config: &EffectiveConfig) -> Self {
        DocumentQuery {
            fetch_links: config.fetch_links.clone(),
            lang: Some(config.lang.clone()),
        }
    }
}

#[async_trait]
pub trait ContentApiConnector: Send + Sync {
    /// Resolve repository metadata and return a client for it.
    ///
    /// With a `preview_token` the client carries the preview cookie on every
    /// request it makes, the metadata call included. The cookie belongs to
    /// the returned client only, so concurrent previews never see each
    /// other's ref.
    async fn connect(
        &self,
        repository: &str,
        access_token: Option<&str>,
        preview_token: Option<&str>,
    ) -> Result<Box<dyn ContentApi>, FetchError>;
}

#[async_trait]
pub trait ContentApi: Send + Sync {
    /// `Ok(None)` when the API has no document with that id.
    async fn get_by_id(
        &self,
        id: &str,
        query: &DocumentQuery,
    ) -> Result<Option<RawDocument>, FetchError>;
}

/// Fetch the draft of `document_id` under the preview `token`.
///
/// The cookie is in place before the document is requested. One attempt.
pub async fn fetch_preview_document(
    connector: &dyn ContentApiConnector,
    config: &EffectiveConfig,
    token: &str,
    document_id: &str,
) -> Result<RawDocument, FetchError> {
    let api = connector
        .connect(
            &config.repository_name,
            config.access_token.as_deref(),
            Some(token),
        )
        .await?;
    tracing::debug!(repository = %config.repository_name, document_id, "connected to content api");

    api.get_by_id(document_id, &DocumentQuery::from_config(config))
        .await?
        .ok_or_else(|| FetchError::DocumentNotFound(document_id.to_string()))
}
