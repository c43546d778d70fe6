//! Merge properties over arbitrary static and preview graphs.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use prismic_preview::{merge, MergeOptions, Merger, Node, NodeStore, PreviewData};

/// Keys at every depth and sequence lengths, with leaves collapsed.
#[derive(Debug, PartialEq)]
enum Shape {
    Leaf,
    Record(Vec<(String, Shape)>),
    Sequence(Vec<Shape>),
}

fn shape(value: &Value) -> Shape {
    match value {
        Value::Object(record) => Shape::Record(
            record
                .iter()
                .map(|(key, value)| (key.clone(), shape(value)))
                .collect(),
        ),
        Value::Array(elements) => Shape::Sequence(elements.iter().map(shape).collect()),
        _ => Shape::Leaf,
    }
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(|n| json!(n)),
        "[a-c]{0,3}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("id|[a-d]", inner, 0..4)
                .prop_map(|record| Value::Object(record.into_iter().collect())),
        ]
    })
}

fn arb_record() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("id|[a-d]", arb_json(), 0..5)
        .prop_map(|record| record.into_iter().collect())
}

proptest! {
    #[test]
    fn absent_preview_returns_static(static_data in arb_json()) {
        prop_assert_eq!(merge(&static_data, None), static_data);
    }

    #[test]
    fn result_has_the_static_shape(static_data in arb_json(), preview in arb_json()) {
        let merged = Merger::default().merge_value(&static_data, &preview, None);
        prop_assert_eq!(shape(&merged), shape(&static_data));
    }

    #[test]
    fn shape_holds_with_a_tiny_memo(static_data in arb_json(), preview in arb_json()) {
        let merger = Merger::new(MergeOptions::default().with_memo_limit(1));
        let merged = merger.merge_value(&static_data, &preview, None);
        prop_assert_eq!(shape(&merged), shape(&static_data));
    }

    #[test]
    fn bag_merge_keeps_page_shape(page in arb_record(), fields in arb_record()) {
        let root = Node::new("n1", "PrismicPage", fields);
        let bag = PreviewData::new("prismicPage", root, NodeStore::new());

        let mut static_data = Map::new();
        static_data.insert("prismicPage".into(), Value::Object(page));
        let static_data = Value::Object(static_data);

        let merged = merge(&static_data, Some(&bag));
        prop_assert_eq!(shape(&merged), shape(&static_data));
    }

    #[test]
    fn self_links_terminate(page in arb_record(), depth in 1usize..6) {
        let mut fields = Map::new();
        fields.insert("next___NODE".into(), json!("n1"));
        let bag = PreviewData::new(
            "prismicPage",
            Node::new("n1", "PrismicPage", fields),
            NodeStore::new(),
        );

        let mut nested = Value::Object(page);
        for _ in 0..depth {
            nested = json!({ "next": nested, "title": "Old" });
        }
        let static_data = json!({ "prismicPage": nested });

        let merged = merge(&static_data, Some(&bag));
        prop_assert_eq!(shape(&merged), shape(&static_data));
    }
}

#[test]
fn scalar_replacement_keeps_zero() {
    let mut fields = Map::new();
    fields.insert("title".into(), json!("New"));
    fields.insert("count".into(), json!(0));
    let bag = PreviewData::new(
        "prismicPage",
        Node::new("n1", "PrismicPage", fields),
        NodeStore::new(),
    );

    let merged = merge(
        &json!({ "prismicPage": { "title": "Old", "count": 0 } }),
        Some(&bag),
    );
    assert_eq!(merged, json!({ "prismicPage": { "title": "New", "count": 0 } }));
}
