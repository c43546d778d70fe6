//! Link and path resolution.
//!
//! Callers hand in resolvers in one of two conventions: the legacy
//! `link_resolver` or the newer `path_resolver`. Both are factories that
//! receive a [`ResolverContext`] and return a [`DocumentResolver`]. The pair
//! is collapsed into one [`LinkResolution`] when the effective configuration
//! is built, so nothing downstream branches on the convention again.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::document::RawDocument;

/// Maps a document link to a site path.
pub type DocumentResolver = Arc<dyn Fn(&DocumentLink) -> Option<String> + Send + Sync>;

/// Builds a [`DocumentResolver`] for a given context.
pub type ResolverFactory =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DocumentResolver + Send + Sync>;

/// What a resolver factory is told about where the link lives.
///
/// Path resolution only sets `node`; link fields inside a document also set
/// the field `key` and its raw `value`.
#[derive(Debug, Clone, Copy)]
pub struct ResolverContext<'a> {
    pub node: &'a RawDocument,
    pub key: Option<&'a str>,
    pub value: Option<&'a Value>,
}

impl<'a> ResolverContext<'a> {
    pub fn node(node: &'a RawDocument) -> Self {
        ResolverContext {
            node,
            key: None,
            value: None,
        }
    }

    pub fn field(node: &'a RawDocument, key: &'a str, value: &'a Value) -> Self {
        ResolverContext {
            node,
            key: Some(key),
            value: Some(value),
        }
    }
}

/// Wrap a context-free document resolver as a factory.
pub fn from_fn<F>(resolve: F) -> ResolverFactory
where
    F: Fn(&DocumentLink) -> Option<String> + Send + Sync + 'static,
{
    let resolver: DocumentResolver = Arc::new(resolve);
    Arc::new(move |_ctx: &ResolverContext<'_>| resolver.clone())
}

/// The normalized resolver: exactly one convention per configuration.
#[derive(Clone)]
pub enum LinkResolution {
    PathResolver(ResolverFactory),
    LinkResolver(ResolverFactory),
}

impl LinkResolution {
    /// `path_resolver` wins when both are configured.
    pub fn select(
        path_resolver: Option<ResolverFactory>,
        link_resolver: Option<ResolverFactory>,
    ) -> Option<Self> {
        match (path_resolver, link_resolver) {
            (Some(factory), _) => Some(LinkResolution::PathResolver(factory)),
            (None, Some(factory)) => Some(LinkResolution::LinkResolver(factory)),
            (None, None) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LinkResolution::PathResolver(_) => "pathResolver",
            LinkResolution::LinkResolver(_) => "linkResolver",
        }
    }

    pub fn resolver_for(&self, context: &ResolverContext<'_>) -> DocumentResolver {
        match self {
            LinkResolution::PathResolver(factory) | LinkResolution::LinkResolver(factory) => {
                factory(context)
            }
        }
    }
}

impl fmt::Debug for LinkResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkResolution").field(&self.kind()).finish()
    }
}

/// The link-shaped view of a document or a link field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentLink {
    pub id: Option<String>,
    pub doc_type: Option<String>,
    pub uid: Option<String>,
    pub lang: Option<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub link_type: Option<String>,
    pub is_broken: bool,
}

impl DocumentLink {
    pub fn from_document(document: &RawDocument) -> Self {
        DocumentLink {
            id: Some(document.id.clone()),
            doc_type: Some(document.doc_type.clone()),
            uid: document.uid.clone(),
            lang: document.lang.clone(),
            tags: document.tags.clone(),
            url: document.url.clone(),
            link_type: Some("Document".to_string()),
            is_broken: false,
        }
    }

    /// Read a link field. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Some(DocumentLink {
            id: text("id"),
            doc_type: text("type"),
            uid: text("uid"),
            lang: text("lang"),
            tags: object
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            url: text("url"),
            link_type: text("link_type"),
            is_broken: object
                .get("isBroken")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    pub fn is_document(&self) -> bool {
        self.link_type.as_deref() == Some("Document")
    }
}

/// Resolve a link to a URL: the link's own `url` first, then the resolver,
/// then nothing. Empty strings count as no answer.
pub fn link_url(link: &DocumentLink, resolver: Option<&DocumentResolver>) -> Option<String> {
    if let Some(url) = link.url.as_deref().filter(|url| !url.is_empty()) {
        return Some(url.to_string());
    }
    let resolver = resolver?;
    resolver(link).filter(|path| !path.is_empty())
}

/// Compute the destination path for a previewed document.
pub fn resolve_path(resolution: Option<&LinkResolution>, document: &RawDocument) -> Option<String> {
    let resolution = resolution?;
    let resolver = resolution.resolver_for(&ResolverContext::node(document));
    link_url(&DocumentLink::from_document(document), Some(&resolver))
}
