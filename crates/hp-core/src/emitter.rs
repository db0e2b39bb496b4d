//! Emitter: `Document` → markup.
//!
//! Writes the tree back out with the classifier's and engine's edits
//! applied. Re-parsing the output yields the same tree.

use crate::model::*;
use petgraph::graph::NodeIndex;

/// HTML elements that must keep an explicit end tag even when empty.
const HTML_CONTAINERS: &[&str] = &[
    "a", "b", "body", "button", "div", "em", "head", "html", "i", "label", "li", "ol", "p",
    "script", "span", "strong", "style", "table", "td", "textarea", "th", "title", "tr", "ul",
];

/// Emit the whole document.
#[must_use]
pub fn emit_document(doc: &Document) -> String {
    let mut out = String::with_capacity(4096);
    for &child in doc.children(doc.root) {
        emit_node(&mut out, doc, child);
    }
    out
}

/// Emit one node and its subtree.
pub fn emit_node(out: &mut String, doc: &Document, idx: NodeIndex) {
    let Some(kind) = doc.kind(idx) else {
        return;
    };
    match kind {
        NodeKind::Root => {
            for &child in doc.children(idx) {
                emit_node(out, doc, child);
            }
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(el.tag.as_str());
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(attr.name.as_str());
                out.push_str("=\"");
                escape_into(out, &attr.value, true);
                out.push('"');
            }
            let children = doc.children(idx);
            if children.is_empty() && !HTML_CONTAINERS.contains(&el.tag.as_str()) {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in children {
                emit_node(out, doc, child);
            }
            out.push_str("</");
            out.push_str(el.tag.as_str());
            out.push('>');
        }
        NodeKind::Text(text) => {
            let raw_text = doc
                .parent(idx)
                .and_then(|p| doc.tag_name(p))
                .is_some_and(|t| t.eq_ignore_ascii_case("script") || t.eq_ignore_ascii_case("style"));
            if raw_text {
                out.push_str(text);
            } else {
                escape_into(out, text, false);
            }
        }
        NodeKind::Markup(markup) => out.push_str(markup),
        NodeKind::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        NodeKind::CData(body) => {
            out.push_str("<![CDATA[");
            out.push_str(body);
            out.push_str("]]>");
        }
        NodeKind::Declaration(decl) => out.push_str(decl),
    }
}

/// Escape markup-significant characters. Quotes only matter in attributes.
fn escape_into(out: &mut String, value: &str, attribute: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
