//! Stub collaborators for driving a session without a network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map};
use tokio::sync::Notify;

use prismic_preview::{
    ConfigRegistry, ContentApi, ContentApiConnector, DocumentQuery, FetchError,
    InMemoryRegistry, MaterializeContext, MaterializeError, Node, NodeId, NodeMaterializer,
    PluginOptions, PreviewDeps, RawDocument, RegistryEntry, TypePaths, TypePathsSource,
};

pub const REPOSITORY: &str = "repo";
pub const DIGEST: &str = "abc123";

pub fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry
        .publish(RegistryEntry::new(PluginOptions::new(REPOSITORY), DIGEST))
        .unwrap();
    registry
}

pub fn blog_post() -> RawDocument {
    RawDocument::new("X1", "blog_post")
        .with_uid("hello")
        .with_data(json!({ "title": "Draft title" }))
}

type Log = Arc<Mutex<Vec<String>>>;

/// Records every call in order; `get_by_id` can be held on a gate.
#[derive(Clone, Default)]
pub struct StubConnector {
    log: Log,
    documents: Arc<HashMap<String, RawDocument>>,
    gate: Option<Arc<Notify>>,
}

impl StubConnector {
    pub fn with_document(document: RawDocument) -> Self {
        let mut documents = HashMap::new();
        documents.insert(document.id.clone(), document);
        StubConnector {
            documents: Arc::new(documents),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("get:")).count()
    }
}

struct StubApi {
    log: Log,
    documents: Arc<HashMap<String, RawDocument>>,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl ContentApiConnector for StubConnector {
    async fn connect(
        &self,
        repository: &str,
        _access_token: Option<&str>,
        preview_token: Option<&str>,
    ) -> Result<Box<dyn ContentApi>, FetchError> {
        self.log.lock().unwrap().push(format!(
            "connect:{}:{}",
            repository,
            preview_token.unwrap_or_default()
        ));
        Ok(Box::new(StubApi {
            log: self.log.clone(),
            documents: self.documents.clone(),
            gate: self.gate.clone(),
        }))
    }
}

#[async_trait]
impl ContentApi for StubApi {
    async fn get_by_id(
        &self,
        id: &str,
        _query: &DocumentQuery,
    ) -> Result<Option<RawDocument>, FetchError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.log.lock().unwrap().push(format!("get:{}", id));
        Ok(self.documents.get(id).cloned())
    }
}

/// Serves one descriptor and remembers which filenames were asked for.
#[derive(Clone, Default)]
pub struct StubTypePaths {
    paths: TypePaths,
    requested: Log,
}

impl StubTypePaths {
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TypePathsSource for StubTypePaths {
    async fn load(&self, filename: &str) -> Result<TypePaths, FetchError> {
        self.requested.lock().unwrap().push(filename.to_string());
        Ok(self.paths.clone())
    }
}

/// Always produces root node `node-1` of internal type `Blog Post`.
#[derive(Debug, Default)]
pub struct StubMaterializer;

impl NodeMaterializer for StubMaterializer {
    fn materialize(
        &self,
        document: &RawDocument,
        context: &mut MaterializeContext<'_>,
    ) -> Result<NodeId, MaterializeError> {
        let mut fields = Map::new();
        fields.insert("title".into(), document.data["title"].clone());
        context.create_node(Node::new("node-1", "Blog Post", fields));
        Ok("node-1".to_string())
    }
}

/// Reports a root id without ever creating the node.
#[derive(Debug, Default)]
pub struct UnstoredRootMaterializer;

impl NodeMaterializer for UnstoredRootMaterializer {
    fn materialize(
        &self,
        _document: &RawDocument,
        _context: &mut MaterializeContext<'_>,
    ) -> Result<NodeId, MaterializeError> {
        Ok("ghost".to_string())
    }
}

pub struct Stubs {
    pub connector: StubConnector,
    pub type_paths: StubTypePaths,
    pub materializer: Arc<dyn NodeMaterializer>,
}

impl Stubs {
    pub fn new(connector: StubConnector) -> Self {
        Stubs {
            connector,
            type_paths: StubTypePaths::default(),
            materializer: Arc::new(StubMaterializer),
        }
    }

    pub fn with_materializer(mut self, materializer: impl NodeMaterializer + 'static) -> Self {
        self.materializer = Arc::new(materializer);
        self
    }

    pub fn deps(&self) -> PreviewDeps {
        PreviewDeps::new(
            Arc::new(self.connector.clone()),
            Arc::new(self.type_paths.clone()),
            self.materializer.clone(),
        )
    }
}
