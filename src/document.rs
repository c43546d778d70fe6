use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document as returned by the content API.
///
/// Only the envelope is typed; `data` stays opaque JSON and anything the
/// API adds later is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub alternate_languages: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>) -> Self {
        RawDocument {
            id: id.into(),
            uid: None,
            doc_type: doc_type.into(),
            href: None,
            tags: Vec::new(),
            lang: None,
            first_publication_date: None,
            last_publication_date: None,
            alternate_languages: Vec::new(),
            url: None,
            data: Value::Object(Map::new()),
            extra: Map::new(),
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}
