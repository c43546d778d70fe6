mod case;
mod document;
mod error;
mod fingerprint;
mod publish;
mod slot;

pub mod fetch;
pub mod merge;
pub mod node;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod type_paths;

pub use case::{camel_case, pascal_case};
pub use document::RawDocument;
pub use error::PreviewError;
pub use fetch::{fetch_preview_document, ContentApi, ContentApiConnector, DocumentQuery, FetchError};
pub use fingerprint::PreviewFingerprint;
pub use merge::{merge, MergeOptions, Merger};
pub use node::{
    materialize_document, DocumentMaterializer, MaterializeContext, MaterializeError, Node,
    NodeId, NodeMaterializer, NodeStore,
};
pub use publish::{PublishError, SchemaArtifact};
pub use registry::{
    ConfigError, ConfigRegistry, EffectiveConfig, InMemoryRegistry, PluginOptions,
    PreviewOptions, RegistryEntry, RegistryError, Versioned,
};
pub use resolver::{DocumentLink, LinkResolution, ResolverContext};
pub use session::{
    PreviewData, PreviewDeps, PreviewSession, SessionError, SessionPhase, SessionState,
};
pub use slot::PreviewSlot;
pub use type_paths::{TypePaths, TypePathsSource};
