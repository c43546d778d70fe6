//! Overlay preview nodes onto the statically-built data graph.
//!
//! The static graph decides the shape: every key and every sequence length
//! of the result comes from it. Preview values only replace leaves and feed
//! composites of the same kind. Link fields on preview nodes arrive as
//! `field___NODE` ids and are followed through the bag's node store.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::node::NodeStore;
use crate::session::PreviewData;

/// Suffix the build pipeline gives to link fields holding node ids.
pub const NODE_LINK_SUFFIX: &str = "___NODE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Keys tried in order to pair sequence elements.
    pub identity_keys: Vec<String>,
    /// Upper bound on memoized `(static, preview)` pairs per merge.
    pub memo_limit: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            identity_keys: vec!["id".to_string()],
            memo_limit: 4096,
        }
    }
}

impl MergeOptions {
    pub fn with_identity_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_memo_limit(mut self, limit: usize) -> Self {
        self.memo_limit = limit;
        self
    }
}

/// Merge `preview` into `static_data` with default options.
///
/// Without preview data the static graph comes back unchanged.
pub fn merge(static_data: &Value, preview: Option<&PreviewData>) -> Value {
    Merger::default().merge(static_data, preview)
}

#[derive(Debug, Clone, Default)]
pub struct Merger {
    options: MergeOptions,
}

impl Merger {
    pub fn new(options: MergeOptions) -> Self {
        Merger { options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn merge(&self, static_data: &Value, preview: Option<&PreviewData>) -> Value {
        let Some(preview) = preview else {
            return static_data.clone();
        };
        let bag = preview.to_value();
        self.merge_value(static_data, &bag, Some(preview.nodes()))
    }

    /// Merge a preview sub-graph, following `___NODE` ids through `nodes`.
    pub fn merge_value(
        &self,
        static_data: &Value,
        preview: &Value,
        nodes: Option<&NodeStore>,
    ) -> Value {
        let mut pass = Pass {
            options: &self.options,
            nodes,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        };
        let merged = pass.merge(static_data, Preview::Value(preview));
        debug!(memoized = pass.memo.len(), "merged preview data");
        merged
    }
}

/// A preview-side value: a plain JSON value or a node's field record.
#[derive(Clone, Copy)]
enum Preview<'p> {
    Value(&'p Value),
    Record(&'p Map<String, Value>),
}

impl<'p> Preview<'p> {
    fn address(self) -> usize {
        match self {
            Preview::Value(value) => value as *const Value as usize,
            Preview::Record(record) => record as *const Map<String, Value> as usize,
        }
    }

    fn as_record(self) -> Option<&'p Map<String, Value>> {
        match self {
            Preview::Value(Value::Object(record)) | Preview::Record(record) => Some(record),
            Preview::Value(_) => None,
        }
    }
}

type PairKey = (usize, usize);

/// State for one merge call. Keys are addresses, so nothing outlives it.
struct Pass<'a> {
    options: &'a MergeOptions,
    nodes: Option<&'a NodeStore>,
    memo: HashMap<PairKey, Value>,
    in_progress: HashSet<PairKey>,
}

impl<'a> Pass<'a> {
    fn merge(&mut self, static_value: &Value, preview: Preview<'a>) -> Value {
        if !is_composite(static_value) {
            return match preview {
                Preview::Value(value) if !is_composite(value) => value.clone(),
                _ => static_value.clone(),
            };
        }

        let key = (static_value as *const Value as usize, preview.address());
        if let Some(done) = self.memo.get(&key) {
            return done.clone();
        }
        // A pair already being merged higher up the stack: a cycle.
        if !self.in_progress.insert(key) {
            return static_value.clone();
        }

        let merged = match (static_value, preview) {
            (Value::Object(record), preview) => match preview.as_record() {
                Some(preview_record) => Value::Object(self.merge_record(record, preview_record)),
                None => static_value.clone(),
            },
            (Value::Array(elements), Preview::Value(Value::Array(preview_elements))) => {
                let candidates: Vec<Preview<'a>> =
                    preview_elements.iter().map(Preview::Value).collect();
                Value::Array(self.merge_sequence(elements, &candidates))
            }
            _ => static_value.clone(),
        };

        self.in_progress.remove(&key);
        if self.memo.len() < self.options.memo_limit {
            self.memo.insert(key, merged.clone());
        }
        merged
    }

    fn merge_record(
        &mut self,
        record: &Map<String, Value>,
        preview: &'a Map<String, Value>,
    ) -> Map<String, Value> {
        record
            .iter()
            .map(|(key, value)| {
                let merged = if let Some(candidate) = preview.get(key) {
                    self.merge(value, Preview::Value(candidate))
                } else if let Some(ids) = preview.get(&format!("{}{}", key, NODE_LINK_SUFFIX)) {
                    self.merge_linked(value, ids)
                } else {
                    value.clone()
                };
                (key.clone(), merged)
            })
            .collect()
    }

    /// Feed a static value from the node(s) a `___NODE` field points at.
    fn merge_linked(&mut self, static_value: &Value, ids: &'a Value) -> Value {
        match (static_value, ids) {
            (_, Value::String(id)) => match self.node_record(id) {
                Some(record) => self.merge(static_value, Preview::Record(record)),
                None => static_value.clone(),
            },
            (Value::Array(elements), Value::Array(ids)) => {
                let candidates: Vec<Preview<'a>> = ids
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|id| self.node_record(id))
                    .map(Preview::Record)
                    .collect();
                Value::Array(self.merge_sequence(elements, &candidates))
            }
            _ => static_value.clone(),
        }
    }

    fn node_record(&self, id: &str) -> Option<&'a Map<String, Value>> {
        self.nodes?.get(id).map(|node| node.fields())
    }

    /// Pair by identity where the static element has one, by index otherwise.
    ///
    /// Pairing is one-to-one. The index fallback only takes preview elements
    /// that no static element claims by identity. Unmatched static elements
    /// stay; unmatched preview elements are ignored.
    fn merge_sequence(&mut self, elements: &[Value], candidates: &[Preview<'a>]) -> Vec<Value> {
        let element_ids: Vec<Option<String>> = elements
            .iter()
            .map(|element| element.as_object().and_then(|r| self.identity(r)))
            .collect();
        let candidate_ids: Vec<Option<String>> = candidates
            .iter()
            .map(|candidate| candidate.as_record().and_then(|r| self.identity(r)))
            .collect();

        let mut by_identity: HashMap<&str, usize> = HashMap::new();
        for (index, identity) in candidate_ids.iter().enumerate() {
            if let Some(identity) = identity {
                by_identity.entry(identity.as_str()).or_insert(index);
            }
        }
        let claimed: HashSet<&str> = element_ids.iter().flatten().map(String::as_str).collect();

        let mut consumed = vec![false; candidates.len()];
        let mut partners: Vec<Option<usize>> = vec![None; elements.len()];

        for (slot, identity) in partners.iter_mut().zip(&element_ids) {
            let Some(identity) = identity else { continue };
            if let Some(&index) = by_identity.get(identity.as_str()) {
                if !consumed[index] {
                    consumed[index] = true;
                    *slot = Some(index);
                }
            }
        }

        for (index, (slot, identity)) in partners.iter_mut().zip(&element_ids).enumerate() {
            if identity.is_some() || index >= candidates.len() || consumed[index] {
                continue;
            }
            let free = match &candidate_ids[index] {
                Some(identity) => !claimed.contains(identity.as_str()),
                None => true,
            };
            if free {
                consumed[index] = true;
                *slot = Some(index);
            }
        }

        elements
            .iter()
            .zip(partners)
            .map(|(element, partner)| match partner {
                Some(index) => self.merge(element, candidates[index]),
                None => element.clone(),
            })
            .collect()
    }

    fn identity(&self, record: &Map<String, Value>) -> Option<String> {
        self.options
            .identity_keys
            .iter()
            .filter_map(|key| record.get(key))
            .find(|value| !value.is_null())
            .map(Value::to_string)
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
