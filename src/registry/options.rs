use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::resolver::{LinkResolution, ResolverFactory};
use crate::type_paths::type_paths_filename;

use super::{default_type_paths_prefix, ConfigError, ConfigRegistry, DEFAULT_LANG};

/// Overrides the HTML produced for one rich-text block.
///
/// Receives the raw block and the HTML already rendered for its content;
/// returning `None` keeps the default rendering.
pub type HtmlSerializer = Arc<dyn Fn(&Value, &str) -> Option<String> + Send + Sync>;

/// Options supplied by the page that wants previews.
///
/// Anything left unset falls back to what the build step published for the
/// same repository.
#[derive(Clone, Default)]
pub struct PreviewOptions {
    repository_name: String,
    access_token: Option<String>,
    link_resolver: Option<ResolverFactory>,
    path_resolver: Option<ResolverFactory>,
    html_serializer: Option<HtmlSerializer>,
    fetch_links: Option<Vec<String>>,
    lang: Option<String>,
    type_paths_filename_prefix: Option<String>,
}

impl PreviewOptions {
    pub fn new(repository_name: impl Into<String>) -> Self {
        PreviewOptions {
            repository_name: repository_name.into(),
            ..Default::default()
        }
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Legacy resolver convention.
    pub fn link_resolver(mut self, factory: ResolverFactory) -> Self {
        self.link_resolver = Some(factory);
        self
    }

    /// Preferred over `link_resolver` when both are set.
    pub fn path_resolver(mut self, factory: ResolverFactory) -> Self {
        self.path_resolver = Some(factory);
        self
    }

    pub fn html_serializer(mut self, serializer: HtmlSerializer) -> Self {
        self.html_serializer = Some(serializer);
        self
    }

    pub fn fetch_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch_links = Some(links.into_iter().map(Into::into).collect());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn type_paths_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_paths_filename_prefix = Some(prefix.into());
        self
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }
}

impl fmt::Debug for PreviewOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewOptions")
            .field("repository_name", &self.repository_name)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("link_resolver", &self.link_resolver.is_some())
            .field("path_resolver", &self.path_resolver.is_some())
            .field("html_serializer", &self.html_serializer.is_some())
            .field("fetch_links", &self.fetch_links)
            .field("lang", &self.lang)
            .field("type_paths_filename_prefix", &self.type_paths_filename_prefix)
            .finish()
    }
}

/// Caller options overlaid on the published plugin options.
#[derive(Clone)]
pub struct EffectiveConfig {
    pub repository_name: String,
    pub access_token: Option<String>,
    pub fetch_links: Vec<String>,
    pub lang: String,
    pub type_paths_filename_prefix: String,
    pub schemas_digest: String,
    pub registry_version: u64,
    pub resolution: Option<LinkResolution>,
    pub html_serializer: Option<HtmlSerializer>,
}

impl EffectiveConfig {
    /// Look the repository up in `registry` and overlay `options` on it.
    ///
    /// Fails when the repository name is empty or nothing was published
    /// for it; neither is retried.
    pub fn resolve<R>(options: PreviewOptions, registry: &R) -> Result<Self, ConfigError>
    where
        R: ConfigRegistry + ?Sized,
    {
        if options.repository_name.trim().is_empty() {
            return Err(ConfigError::MissingRepositoryName);
        }

        let published = registry
            .lookup(&options.repository_name)?
            .ok_or_else(|| ConfigError::MissingRegistryEntry {
                repository: options.repository_name.clone(),
            })?;
        let plugin = published.data.plugin_options;

        let type_paths_filename_prefix = options
            .type_paths_filename_prefix
            .or(plugin.type_paths_filename_prefix)
            .unwrap_or_else(|| default_type_paths_prefix(&options.repository_name));

        Ok(EffectiveConfig {
            access_token: options.access_token.or(plugin.access_token),
            fetch_links: options.fetch_links.unwrap_or(plugin.fetch_links),
            lang: options
                .lang
                .or(plugin.lang)
                .unwrap_or_else(|| DEFAULT_LANG.to_string()),
            type_paths_filename_prefix,
            schemas_digest: published.data.schemas_digest,
            registry_version: published.version,
            resolution: LinkResolution::select(options.path_resolver, options.link_resolver),
            html_serializer: options.html_serializer,
            repository_name: options.repository_name,
        })
    }

    /// `{prefix}{digest}.json`
    pub fn type_paths_filename(&self) -> String {
        type_paths_filename(&self.type_paths_filename_prefix, &self.schemas_digest)
    }
}

impl fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("repository_name", &self.repository_name)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("fetch_links", &self.fetch_links)
            .field("lang", &self.lang)
            .field("type_paths_filename_prefix", &self.type_paths_filename_prefix)
            .field("schemas_digest", &self.schemas_digest)
            .field("registry_version", &self.registry_version)
            .field("resolution", &self.resolution)
            .field("html_serializer", &self.html_serializer.is_some())
            .finish()
    }
}
