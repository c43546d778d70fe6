//! The stock materializer: one root node per document, type paths drive
//! how each `data` field is normalized.

use serde_json::{Map, Value};

use crate::case::pascal_case;
use crate::document::RawDocument;
use crate::resolver::{link_url, resolve_path, DocumentLink, ResolverContext};
use crate::type_paths::FieldKind;

use super::rich_text::{as_html, as_text};
use super::{MaterializeContext, MaterializeError, Node, NodeId, NodeMaterializer};

/// `"blog_post"` → `"PrismicBlogPost"`
pub fn document_node_type(doc_type: &str) -> String {
    format!("Prismic{}", pascal_case(doc_type))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMaterializer;

impl DocumentMaterializer {
    pub fn new() -> Self {
        DocumentMaterializer
    }
}

impl NodeMaterializer for DocumentMaterializer {
    fn materialize(
        &self,
        document: &RawDocument,
        context: &mut MaterializeContext<'_>,
    ) -> Result<NodeId, MaterializeError> {
        if document.id.is_empty() || document.doc_type.is_empty() {
            return Err(MaterializeError::InvalidDocument(
                "document id and type are required".into(),
            ));
        }

        let node_type = document_node_type(&document.doc_type);
        let id = context.create_node_id(&format!("{} {}", node_type, document.id));

        let data = match &document.data {
            Value::Object(map) => {
                let mut path = vec![document.doc_type.clone(), "data".to_string()];
                Value::Object(normalize_record(context, document, &mut path, map))
            }
            Value::Null => Value::Object(Map::new()),
            other => {
                return Err(MaterializeError::InvalidDocument(format!(
                    "document {} has non-object data: {}",
                    document.id, other
                )))
            }
        };

        let mut fields = Map::new();
        fields.insert("prismicId".into(), Value::String(document.id.clone()));
        fields.insert("uid".into(), optional(&document.uid));
        fields.insert("type".into(), Value::String(document.doc_type.clone()));
        fields.insert("lang".into(), optional(&document.lang));
        fields.insert(
            "tags".into(),
            Value::Array(document.tags.iter().cloned().map(Value::String).collect()),
        );
        fields.insert("href".into(), optional(&document.href));
        fields.insert(
            "first_publication_date".into(),
            optional(&document.first_publication_date),
        );
        fields.insert(
            "last_publication_date".into(),
            optional(&document.last_publication_date),
        );
        fields.insert(
            "alternate_languages".into(),
            Value::Array(document.alternate_languages.clone()),
        );
        fields.insert(
            "url".into(),
            optional(&resolve_path(context.resolution, document)),
        );
        fields.insert("dataRaw".into(), document.data.clone());
        fields.insert("dataString".into(), Value::String(document.data.to_string()));
        fields.insert("data".into(), data);

        context.create_node(Node::new(id.clone(), node_type, fields));
        Ok(id)
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn normalize_record(
    context: &mut MaterializeContext<'_>,
    document: &RawDocument,
    path: &mut Vec<String>,
    record: &Map<String, Value>,
) -> Map<String, Value> {
    record
        .iter()
        .map(|(key, value)| {
            path.push(key.clone());
            let normalized = normalize_field(context, document, path, key, value);
            path.pop();
            (key.clone(), normalized)
        })
        .collect()
}

fn normalize_elements(
    context: &mut MaterializeContext<'_>,
    document: &RawDocument,
    path: &mut Vec<String>,
    elements: &[Value],
) -> Value {
    Value::Array(
        elements
            .iter()
            .map(|element| match element {
                Value::Object(record) => {
                    Value::Object(normalize_record(context, document, path, record))
                }
                other => other.clone(),
            })
            .collect(),
    )
}

fn normalize_field(
    context: &mut MaterializeContext<'_>,
    document: &RawDocument,
    path: &mut Vec<String>,
    key: &str,
    value: &Value,
) -> Value {
    match (context.field_kind(path.as_slice()), value) {
        (FieldKind::StructuredText, Value::Array(blocks)) => {
            let mut text = Map::new();
            text.insert(
                "html".into(),
                Value::String(as_html(blocks, context.html_serializer)),
            );
            text.insert("text".into(), Value::String(as_text(blocks)));
            text.insert("raw".into(), value.clone());
            Value::Object(text)
        }
        (FieldKind::Link, Value::Object(_)) => normalize_link(context, document, key, value),
        (FieldKind::Group, Value::Array(elements)) => {
            normalize_elements(context, document, path, elements)
        }
        (FieldKind::Slices, Value::Array(slices)) => {
            normalize_slices(context, document, path, slices)
        }
        _ => value.clone(),
    }
}

fn normalize_link(
    context: &mut MaterializeContext<'_>,
    document: &RawDocument,
    key: &str,
    value: &Value,
) -> Value {
    let (Some(link), Some(raw)) = (DocumentLink::from_value(value), value.as_object()) else {
        return value.clone();
    };

    let resolver = context
        .resolution
        .map(|resolution| resolution.resolver_for(&ResolverContext::field(document, key, value)));

    let mut normalized = raw.clone();
    normalized.insert("url".into(), optional(&link_url(&link, resolver.as_ref())));
    normalized.insert("raw".into(), value.clone());

    if let (true, false, Some(id), Some(doc_type)) =
        (link.is_document(), link.is_broken, &link.id, &link.doc_type)
    {
        let linked_type = document_node_type(doc_type);
        let linked_id = context.create_node_id(&format!("{} {}", linked_type, id));

        // Data pulled in through fetchLinks becomes a partial node unless the
        // linked document already has a full one (e.g. a self-reference).
        if let Some(data) = raw.get("data") {
            if !context.has_node(&linked_id) {
                let mut fields = Map::new();
                fields.insert("prismicId".into(), Value::String(id.clone()));
                fields.insert("type".into(), Value::String(doc_type.clone()));
                fields.insert("uid".into(), optional(&link.uid));
                fields.insert("lang".into(), optional(&link.lang));
                fields.insert("data".into(), data.clone());
                context.create_node(Node::new(linked_id.clone(), linked_type, fields));
            }
        }

        normalized.insert("document___NODE".into(), Value::String(linked_id));
    }

    Value::Object(normalized)
}

fn normalize_slices(
    context: &mut MaterializeContext<'_>,
    document: &RawDocument,
    path: &mut Vec<String>,
    slices: &[Value],
) -> Value {
    let slice_path = path.join(".");
    Value::Array(
        slices
            .iter()
            .enumerate()
            .map(|(index, slice)| {
                let Value::Object(record) = slice else {
                    return slice.clone();
                };
                let slice_type = record
                    .get("slice_type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                let mut normalized = record.clone();
                normalized.insert(
                    "id".into(),
                    Value::String(context.create_node_id(&format!(
                        "{} {} {} {}",
                        document.id, slice_path, slice_type, index
                    ))),
                );

                path.push(slice_type);
                if let Some(Value::Object(primary)) = record.get("primary") {
                    path.push("primary".into());
                    let primary = normalize_record(context, document, path, primary);
                    normalized.insert("primary".into(), Value::Object(primary));
                    path.pop();
                }
                if let Some(Value::Array(items)) = record.get("items") {
                    path.push("items".into());
                    let items = normalize_elements(context, document, path, items);
                    normalized.insert("items".into(), items);
                    path.pop();
                }
                path.pop();

                Value::Object(normalized)
            })
            .collect(),
    )
}
