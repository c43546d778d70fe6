//! Session state and the reducer that moves it.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::node::{Node, NodeStore};

use super::error::SessionError;

/// The preview bag: `{ camelCase(root type): root node }` plus every node
/// created while materializing, so `___NODE` links can be followed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewData {
    entries: BTreeMap<String, Node>,
    nodes: NodeStore,
}

impl PreviewData {
    pub fn new(key: impl Into<String>, root: Node, mut nodes: NodeStore) -> Self {
        if !nodes.contains(root.id()) {
            nodes.insert(root.clone());
        }
        let mut entries = BTreeMap::new();
        entries.insert(key.into(), root);
        PreviewData { entries, nodes }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Look up any node created during materialization.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The bag as the JSON object a page merges against.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| (key.clone(), node.to_value()))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// Coarse phase of a session, as recorded in its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Undetermined,
    NotPreview,
    Loading,
    Loaded,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Undetermined => "undetermined",
            SessionPhase::NotPreview => "not-preview",
            SessionPhase::Loading => "loading",
            SessionPhase::Loaded => "loaded",
        };
        f.write_str(name)
    }
}

/// The result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub preview_data: PreviewData,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    IsNotPreview,
    IsPreview,
    /// `None` when the load produced nothing usable.
    DocumentLoaded(Option<Loaded>),
    Reset,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::IsNotPreview => "IS_NOT_PREVIEW",
            SessionAction::IsPreview => "IS_PREVIEW",
            SessionAction::DocumentLoaded(_) => "DOCUMENT_LOADED",
            SessionAction::Reset => "RESET",
        }
    }
}

/// What a page sees of its preview session.
///
/// Only [`reduce`] builds non-initial states, so `preview_data` and `path`
/// are set together, and a not-preview state carries nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    is_preview: Option<bool>,
    is_loading: bool,
    preview_data: Option<PreviewData>,
    path: Option<String>,
}

impl SessionState {
    /// `None` until detection has run.
    pub fn is_preview(&self) -> Option<bool> {
        self.is_preview
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn preview_data(&self) -> Option<&PreviewData> {
        self.preview_data.as_ref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.is_preview, self.is_loading) {
            (None, _) => SessionPhase::Undetermined,
            (Some(false), _) => SessionPhase::NotPreview,
            (Some(true), true) => SessionPhase::Loading,
            (Some(true), false) => SessionPhase::Loaded,
        }
    }

    fn not_preview() -> Self {
        SessionState {
            is_preview: Some(false),
            ..Self::default()
        }
    }
}

/// Apply `action` to `state`.
pub fn reduce(state: &SessionState, action: SessionAction) -> Result<SessionState, SessionError> {
    let from = state.phase();
    match (from, action) {
        (_, SessionAction::Reset) => Ok(SessionState::default()),
        (SessionPhase::Undetermined, SessionAction::IsNotPreview) => Ok(SessionState::not_preview()),
        (SessionPhase::Undetermined, SessionAction::IsPreview) => Ok(SessionState {
            is_preview: Some(true),
            is_loading: true,
            ..SessionState::default()
        }),
        (SessionPhase::Loading, SessionAction::DocumentLoaded(Some(loaded))) => Ok(SessionState {
            is_preview: Some(true),
            is_loading: false,
            preview_data: Some(loaded.preview_data),
            path: loaded.path,
        }),
        (SessionPhase::Loading, SessionAction::DocumentLoaded(None))
        | (SessionPhase::Loading, SessionAction::IsNotPreview) => Ok(SessionState::not_preview()),
        (from, action) => Err(SessionError::InvalidTransition {
            from,
            action: action.name(),
        }),
    }
}
