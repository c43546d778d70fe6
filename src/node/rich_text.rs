//! Block-level rendering of structured text fields.

use serde_json::Value;

use crate::registry::HtmlSerializer;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn block_type(block: &Value) -> &str {
    block.get("type").and_then(Value::as_str).unwrap_or_default()
}

fn block_text(block: &Value) -> &str {
    block.get("text").and_then(Value::as_str).unwrap_or_default()
}

/// Plain text: block texts joined by a single space.
pub fn as_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .map(block_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn default_block_html(block: &Value, inner: &str) -> String {
    let attr = |key: &str| {
        escape_html(block.get(key).and_then(Value::as_str).unwrap_or_default())
    };

    match block_type(block) {
        "paragraph" => format!("<p>{}</p>", inner),
        "preformatted" => format!("<pre>{}</pre>", inner),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner),
        kind if kind.starts_with("heading") && kind.len() == 8 => {
            let level = &kind[7..];
            format!("<h{level}>{inner}</h{level}>")
        }
        "image" => format!("<img src=\"{}\" alt=\"{}\" />", attr("url"), attr("alt")),
        "embed" => {
            let oembed = block.get("oembed");
            let field = |key: &str| {
                oembed
                    .and_then(|o| o.get(key))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            format!(
                "<div data-oembed=\"{}\" data-oembed-type=\"{}\">{}</div>",
                escape_html(&field("embed_url")),
                escape_html(&field("type")),
                field("html")
            )
        }
        _ => String::new(),
    }
}

fn render_block(block: &Value, serializer: Option<&HtmlSerializer>) -> String {
    let inner = escape_html(block_text(block));
    serializer
        .and_then(|serialize| serialize(block, &inner))
        .unwrap_or_else(|| default_block_html(block, &inner))
}

/// HTML for a structured text field. Consecutive list items are wrapped in
/// `<ul>` / `<ol>`.
pub fn as_html(blocks: &[Value], serializer: Option<&HtmlSerializer>) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block_type(block) {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        out.push_str(&render_block(block, serializer));
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }
    out
}
