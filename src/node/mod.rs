//! Nodes: the typed records the build pipeline produces per document.
//!
//! A [`NodeMaterializer`] turns one [`RawDocument`] into a root node (plus any
//! nodes it links to) inside a [`NodeStore`]. The session only relies on the
//! trait contract; [`DocumentMaterializer`] is the stock implementation.

mod document;
mod rich_text;

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::document::RawDocument;
use crate::registry::{EffectiveConfig, HtmlSerializer};
use crate::resolver::LinkResolution;
use crate::type_paths::{FieldKind, TypePaths};

pub use document::{document_node_type, DocumentMaterializer};
pub use rich_text::{as_html, as_text, escape_html};

pub type NodeId = String;

/// Namespace for node ids, so build-time and preview-time ids agree.
const NODE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x8f0e_6a4c_2b1d_5e39_a7c4_91d2_3f60_b8e5);

/// Errors from turning a document into nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    InvalidDocument(String),
    /// The materializer returned an id it never stored.
    MissingRootNode(NodeId),
}

impl fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeError::InvalidDocument(message) => write!(f, "invalid document: {}", message),
            MaterializeError::MissingRootNode(id) => write!(f, "root node {} was not created", id),
        }
    }
}

impl std::error::Error for MaterializeError {}

/// A materialized node: `{ id, internal: { type, contentDigest }, ...fields }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    node_type: String,
    fields: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        let id = id.into();
        let node_type = node_type.into();
        let digest = content_digest(&Value::Object(fields.clone()));
        fields.insert("id".into(), Value::String(id.clone()));
        let mut internal = Map::new();
        internal.insert("type".into(), Value::String(node_type.clone()));
        internal.insert("contentDigest".into(), Value::String(digest));
        fields.insert("internal".into(), Value::Object(internal));
        Node {
            id,
            node_type,
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `internal.type`
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Every node created while materializing one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStore {
    nodes: HashMap<NodeId, Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
}

/// Hex blake3 digest of a JSON value.
pub fn content_digest(value: &Value) -> String {
    blake3::hash(value.to_string().as_bytes()).to_hex().to_string()
}

/// Deterministic node id for an input string.
pub fn create_node_id(input: &str) -> NodeId {
    Uuid::new_v5(&NODE_ID_NAMESPACE, input.as_bytes()).to_string()
}

/// What a materializer may use while building nodes.
pub struct MaterializeContext<'a> {
    pub type_paths: &'a TypePaths,
    pub nodes: &'a mut NodeStore,
    pub resolution: Option<&'a LinkResolution>,
    pub html_serializer: Option<&'a HtmlSerializer>,
}

impl<'a> MaterializeContext<'a> {
    pub fn new(type_paths: &'a TypePaths, nodes: &'a mut NodeStore) -> Self {
        MaterializeContext {
            type_paths,
            nodes,
            resolution: None,
            html_serializer: None,
        }
    }

    pub fn from_config(
        config: &'a EffectiveConfig,
        type_paths: &'a TypePaths,
        nodes: &'a mut NodeStore,
    ) -> Self {
        MaterializeContext {
            type_paths,
            nodes,
            resolution: config.resolution.as_ref(),
            html_serializer: config.html_serializer.as_ref(),
        }
    }

    /// Generated type name for `(custom type, field path)`.
    pub fn type_of<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.type_paths.lookup(path)
    }

    pub fn field_kind<S: AsRef<str>>(&self, path: &[S]) -> FieldKind {
        self.type_paths.field_kind(path)
    }

    pub fn create_node_id(&self, input: &str) -> NodeId {
        create_node_id(input)
    }

    pub fn content_digest(&self, value: &Value) -> String {
        content_digest(value)
    }

    pub fn create_node(&mut self, node: Node) {
        self.nodes.insert(node);
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }
}

/// Turns one document into nodes and returns the root node's id.
///
/// Must be a pure function of the document and the context: materializing
/// the same document twice yields structurally equal nodes.
pub trait NodeMaterializer: Send + Sync {
    fn materialize(
        &self,
        document: &RawDocument,
        context: &mut MaterializeContext<'_>,
    ) -> Result<NodeId, MaterializeError>;
}

/// Run `materializer` on a fresh store and return the root node with it.
pub fn materialize_document(
    materializer: &dyn NodeMaterializer,
    document: &RawDocument,
    type_paths: &TypePaths,
    config: &EffectiveConfig,
) -> Result<(Node, NodeStore), MaterializeError> {
    let mut nodes = NodeStore::new();
    let root_id = {
        let mut context = MaterializeContext::from_config(config, type_paths, &mut nodes);
        materializer.materialize(document, &mut context)?
    };
    let root = nodes
        .get(&root_id)
        .cloned()
        .ok_or(MaterializeError::MissingRootNode(root_id))?;
    Ok((root, nodes))
}
