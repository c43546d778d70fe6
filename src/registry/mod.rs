//! Configuration registry: the hand-off between the build step and the
//! preview runtime.
//!
//! The build step publishes one [`RegistryEntry`] per repository (its plugin
//! options plus the digest of the type paths it wrote). A preview session
//! looks the entry up by repository name when it is constructed. The store
//! is passed in explicitly; nothing here is an ambient global.
//!
//! ## Example
//!
//! ```ignore
//! use prismic_preview::{ConfigRegistry, InMemoryRegistry, PluginOptions, RegistryEntry};
//!
//! let registry = InMemoryRegistry::new();
//! registry.publish(RegistryEntry::new(PluginOptions::new("my-repo"), "3f9a…"))?;
//! let entry = registry.lookup("my-repo")?;
//! ```

mod error;
mod in_memory;
mod options;

use serde::{Deserialize, Serialize};

pub use error::{ConfigError, RegistryError};
pub use in_memory::InMemoryRegistry;
pub use options::{EffectiveConfig, HtmlSerializer, PreviewOptions};

/// Fallback content language: every locale.
pub const DEFAULT_LANG: &str = "*";

/// The serializable subset of the build-time plugin options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    pub repository_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_paths_filename_prefix: Option<String>,
}

impl PluginOptions {
    pub fn new(repository_name: impl Into<String>) -> Self {
        PluginOptions {
            repository_name: repository_name.into(),
            ..Default::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_fetch_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch_links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_type_paths_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_paths_filename_prefix = Some(prefix.into());
        self
    }
}

/// What the build step publishes for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub plugin_options: PluginOptions,
    pub schemas_digest: String,
}

impl RegistryEntry {
    pub fn new(plugin_options: PluginOptions, schemas_digest: impl Into<String>) -> Self {
        RegistryEntry {
            plugin_options,
            schemas_digest: schemas_digest.into(),
        }
    }

    pub fn repository_name(&self) -> &str {
        &self.plugin_options.repository_name
    }
}

/// A registry entry plus its publication counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// Keyed by repository name. Lookups are synchronous and never block on I/O.
pub trait ConfigRegistry: Send + Sync {
    /// Get the entry published for a repository.
    fn lookup(&self, repository: &str) -> Result<Option<Versioned<RegistryEntry>>, RegistryError>;

    /// Publish (or republish) an entry. Returns the stored version.
    fn publish(&self, entry: RegistryEntry) -> Result<Versioned<RegistryEntry>, RegistryError>;
}

/// The default type-paths filename prefix for a repository.
pub fn default_type_paths_prefix(repository: &str) -> String {
    format!("prismic-typepaths---{}-", repository)
}
