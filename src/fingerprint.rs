//! Preview fingerprint: the `token` / `documentId` pair carried by the
//! page address of a preview redirect.

use std::borrow::Cow;

use url::Url;

/// Query parameter carrying the preview ref.
pub const TOKEN_PARAM: &str = "token";
/// Query parameter carrying the previewed document id.
pub const DOCUMENT_ID_PARAM: &str = "documentId";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewFingerprint {
    pub token: Option<String>,
    pub document_id: Option<String>,
}

impl PreviewFingerprint {
    pub fn new(token: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            token: non_empty(&token.into()),
            document_id: non_empty(&document_id.into()),
        }
    }

    /// Read the fingerprint from a parsed page address.
    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    /// Read the fingerprint from a bare query string, with or without the
    /// leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Self {
        let mut fingerprint = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                TOKEN_PARAM if fingerprint.token.is_none() => {
                    fingerprint.token = non_empty(&value);
                }
                DOCUMENT_ID_PARAM if fingerprint.document_id.is_none() => {
                    fingerprint.document_id = non_empty(&value);
                }
                _ => {}
            }
        }
        fingerprint
    }

    /// Parse an absolute page address.
    pub fn parse(address: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(&Url::parse(address)?))
    }

    /// Both halves present.
    pub fn is_valid(&self) -> bool {
        self.token.is_some() && self.document_id.is_some()
    }

    /// The `(token, documentId)` pair when the fingerprint is valid.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.token, &self.document_id) {
            (Some(token), Some(id)) => Some((token.as_str(), id.as_str())),
            _ => None,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
