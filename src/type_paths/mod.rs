//! Type paths: the schema digest the build step publishes.
//!
//! Each entry maps a field path (`[custom type, "data", field, ...]`) to the
//! node type the build pipeline generated for it. Materializing a preview
//! document with the same descriptor is what keeps preview nodes shaped like
//! the statically-built ones.

mod loader;

use serde::{Deserialize, Serialize};

pub use loader::TypePathsSource;
#[cfg(feature = "http")]
pub use loader::HttpTypePathsLoader;

pub const STRUCTURED_TEXT_TYPE: &str = "PrismicStructuredTextType";
pub const LINK_TYPE: &str = "PrismicLinkType";
pub const IMAGE_TYPE: &str = "PrismicImageType";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePath {
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// How a field is materialized, derived from its type path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    StructuredText,
    Link,
    Image,
    Group,
    Slices,
    Other,
}

impl FieldKind {
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            STRUCTURED_TEXT_TYPE => FieldKind::StructuredText,
            LINK_TYPE => FieldKind::Link,
            IMAGE_TYPE => FieldKind::Image,
            name if name.ends_with("GroupType") => FieldKind::Group,
            name if name.ends_with("SlicesType") => FieldKind::Slices,
            _ => FieldKind::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypePaths(Vec<TypePath>);

impl TypePaths {
    pub fn new(paths: Vec<TypePath>) -> Self {
        TypePaths(paths)
    }

    pub fn push<I, S>(&mut self, path: I, type_name: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.push(TypePath {
            path: path.into_iter().map(Into::into).collect(),
            type_name: type_name.into(),
        });
    }

    pub fn with<I, S>(mut self, path: I, type_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(path, type_name);
        self
    }

    pub fn paths(&self) -> &[TypePath] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The generated type name for a field path.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| {
                entry.path.len() == path.len()
                    && entry
                        .path
                        .iter()
                        .zip(path)
                        .all(|(a, b)| a.as_str() == b.as_ref())
            })
            .map(|entry| entry.type_name.as_str())
    }

    pub fn field_kind<S: AsRef<str>>(&self, path: &[S]) -> FieldKind {
        self.lookup(path)
            .map(FieldKind::from_type_name)
            .unwrap_or(FieldKind::Other)
    }

    /// Hex blake3 hash of the descriptor's JSON encoding.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

/// `{prefix}{digest}.json`
pub fn type_paths_filename(prefix: &str, digest: &str) -> String {
    format!("{}{}.json", prefix, digest)
}
