//! Build-time side of the hand-off: write the type paths under their
//! content-addressed filename and publish the registry entry that points at
//! them.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::registry::{
    default_type_paths_prefix, ConfigRegistry, PluginOptions, RegistryEntry, RegistryError,
    Versioned,
};
use crate::type_paths::{type_paths_filename, TypePaths};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    Serde(String),
    Io(String),
    Registry(RegistryError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Serde(message) => write!(f, "type paths encoding failed: {}", message),
            PublishError::Io(message) => write!(f, "writing type paths failed: {}", message),
            PublishError::Registry(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Serde(err.to_string())
    }
}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        PublishError::Io(err.to_string())
    }
}

impl From<RegistryError> for PublishError {
    fn from(err: RegistryError) -> Self {
        PublishError::Registry(err)
    }
}

/// The type paths of one repository, ready to be written and published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaArtifact {
    plugin_options: PluginOptions,
    digest: String,
    filename: String,
    body: String,
}

impl SchemaArtifact {
    pub fn new(type_paths: &TypePaths, plugin_options: PluginOptions) -> Result<Self, PublishError> {
        let digest = type_paths.digest()?;
        let prefix = plugin_options
            .type_paths_filename_prefix
            .clone()
            .unwrap_or_else(|| default_type_paths_prefix(&plugin_options.repository_name));
        Ok(SchemaArtifact {
            filename: type_paths_filename(&prefix, &digest),
            body: serde_json::to_string(type_paths)?,
            digest,
            plugin_options,
        })
    }

    pub fn repository_name(&self) -> &str {
        &self.plugin_options.repository_name
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// JSON the schema endpoint serves.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn entry(&self) -> RegistryEntry {
        RegistryEntry::new(self.plugin_options.clone(), self.digest.clone())
    }

    /// Write the body to `dir/filename`, creating `dir` if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, PublishError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.body)?;
        info!(path = %path.display(), "wrote type paths");
        Ok(path)
    }

    pub fn publish<R>(&self, registry: &R) -> Result<Versioned<RegistryEntry>, PublishError>
    where
        R: ConfigRegistry + ?Sized,
    {
        let published = registry.publish(self.entry())?;
        info!(
            repository = %self.repository_name(),
            digest = %self.digest,
            version = published.version,
            "published registry entry"
        );
        Ok(published)
    }
}
