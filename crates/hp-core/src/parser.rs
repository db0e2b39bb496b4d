//! Parser for SVG / XHTML markup → `Document`.
//!
//! Built on `winnow` 0.7. Handles the subset of XML that plotting backends
//! and page shells emit: prolog and doctype, comments, CDATA sections,
//! elements with single- or double-quoted attributes, self-closing tags,
//! character data and entity references. HTML void elements (`<br>`,
//! `<meta>`, ...) are accepted without a closing tag so a page shell holding
//! the tooltip `div` parses too.

use crate::id::Name;
use crate::model::*;
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Elements that never have a closing tag in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose body is raw text (may contain bare `<`).
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Parse a markup string into a `Document`.
#[must_use = "parsing result should be used"]
pub fn parse_document(input: &str) -> Result<Document, String> {
    let mut doc = Document::new();
    let mut open: Vec<(NodeIndex, Name)> = Vec::new();
    let mut rest = input.strip_prefix('\u{feff}').unwrap_or(input);

    while !rest.is_empty() {
        let parent = open.last().map_or(doc.root, |(idx, _)| *idx);

        if rest.starts_with("<!--") {
            let body = parse_comment
                .parse_next(&mut rest)
                .map_err(|e| format!("Comment parse error: {e}"))?;
            doc.append(parent, NodeKind::Comment(body.to_string()));
        } else if rest.starts_with("<![CDATA[") {
            let body = parse_cdata
                .parse_next(&mut rest)
                .map_err(|e| format!("CDATA parse error: {e}"))?;
            doc.append(parent, NodeKind::CData(body.to_string()));
        } else if rest.starts_with("<?") || rest.starts_with("<!") {
            let decl = parse_declaration
                .parse_next(&mut rest)
                .map_err(|e| format!("Declaration parse error: {e}"))?;
            doc.append(parent, NodeKind::Declaration(decl.to_string()));
        } else if rest.starts_with("</") {
            let name = parse_end_tag
                .parse_next(&mut rest)
                .map_err(|e| format!("End tag parse error: {e}"))?;
            match open.pop() {
                Some((_, expected)) if expected.as_str() == name => {}
                Some((_, expected)) => {
                    return Err(format!(
                        "Mismatched end tag: expected </{}>, found </{name}>",
                        expected.as_str()
                    ));
                }
                None => return Err(format!("Unexpected end tag </{name}>")),
            }
        } else if rest.starts_with('<') {
            let tag = parse_start_tag
                .parse_next(&mut rest)
                .map_err(|e| format!("Start tag parse error: {e}"))?;
            let mut el = Element {
                tag: Name::intern(tag.name),
                attrs: SmallVec::new(),
            };
            for (name, value) in tag.attrs {
                el.set_attr(name, &decode_entities(value));
            }
            let lower = tag.name.to_ascii_lowercase();
            let is_void = VOID_ELEMENTS.contains(&lower.as_str());
            let idx = doc.append(parent, NodeKind::Element(el));
            if !tag.self_closing && !is_void {
                open.push((idx, Name::intern(tag.name)));
                if RAW_TEXT_ELEMENTS.contains(&lower.as_str()) && !rest.starts_with("<![CDATA[") {
                    let close = format!("</{}", tag.name);
                    let body = take_until::<_, _, ContextError>(0.., close.as_str())
                        .parse_next(&mut rest)
                        .map_err(|_| format!("Unclosed element <{}>", tag.name))?;
                    if !body.is_empty() {
                        doc.append(idx, NodeKind::Text(body.to_string()));
                    }
                }
            }
        } else {
            let text = take_till::<_, _, ContextError>(0.., '<')
                .parse_next(&mut rest)
                .map_err(|e| format!("Text parse error: {e}"))?;
            doc.append(parent, NodeKind::Text(decode_entities(text)));
        }
    }

    if let Some((_, name)) = open.last() {
        return Err(format!("Unclosed element <{}>", name.as_str()));
    }

    Ok(doc)
}

/// A start tag before it is inserted into the tree.
#[derive(Debug)]
struct StartTag<'a> {
    name: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
    self_closing: bool,
}

// ─── Low-level parsers ──────────────────────────────────────────────────

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> = multispace0.parse_next(input);
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
    })
    .parse_next(input)
}

fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn parse_attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let name = parse_name.parse_next(input)?;
    skip_space(input);
    if !input.starts_with('=') {
        // Boolean attribute (`<input disabled>`): empty value.
        return Ok((name, ""));
    }
    let _ = '='.parse_next(input)?;
    skip_space(input);
    let value = parse_quoted.parse_next(input)?;
    Ok((name, value))
}

fn parse_start_tag<'a>(input: &mut &'a str) -> ModalResult<StartTag<'a>> {
    let _ = '<'.parse_next(input)?;
    let name = parse_name.parse_next(input)?;
    let mut attrs = Vec::new();
    loop {
        skip_space(input);
        if let Some(after) = input.strip_prefix("/>") {
            *input = after;
            return Ok(StartTag {
                name,
                attrs,
                self_closing: true,
            });
        }
        if let Some(after) = input.strip_prefix('>') {
            *input = after;
            return Ok(StartTag {
                name,
                attrs,
                self_closing: false,
            });
        }
        attrs.push(parse_attribute.parse_next(input)?);
    }
}

fn parse_end_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let _ = "</".parse_next(input)?;
    let name = parse_name.parse_next(input)?;
    skip_space(input);
    let _ = '>'.parse_next(input)?;
    Ok(name)
}

fn parse_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<!--", take_until(0.., "-->"), "-->").parse_next(input)
}

fn parse_cdata<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>").parse_next(input)
}

/// `<?xml ...?>` or `<!DOCTYPE ...>`, returned with its delimiters.
fn parse_declaration<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let start = *input;
    if input.starts_with("<?") {
        let _ = take_until(0.., "?>").parse_next(input)?;
        let _ = "?>".parse_next(input)?;
    } else {
        let _ = "<!".parse_next(input)?;
        // Internal DTD subsets (`[ ... ]`) may contain '>'.
        let _ = take_till(0.., |c: char| c == '>' || c == '[').parse_next(input)?;
        if input.starts_with('[') {
            let _ = take_until(0.., "]").parse_next(input)?;
            let _ = ']'.parse_next(input)?;
            skip_space(input);
        }
        let _ = '>'.parse_next(input)?;
    }
    Ok(&start[..start.len() - input.len()])
}

// ─── Entities ────────────────────────────────────────────────────────────

/// Decode the predefined XML entities and numeric character references.
/// Unknown entities are kept verbatim.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_nested_svg() {
        let doc = parse_document(
            r#"<?xml version="1.0" encoding="utf-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="10pt">
  <g id="axes_1">
    <g id="patch_1"><path d="M 0 0 L 1 1" clip-path='url(#p1)'/></g>
  </g>
</svg>"#,
        )
        .unwrap();
        let svg = doc.document_element().unwrap();
        assert_eq!(doc.tag_name(svg), Some("svg"));
        assert_eq!(doc.attr(svg, "width"), Some("10pt"));
        let patch = doc.get_by_id("patch_1").unwrap();
        let path = doc.element_children(patch).next().unwrap();
        assert_eq!(doc.attr(path, "clip-path"), Some("url(#p1)"));
        assert!(matches!(
            doc.kind(doc.children(doc.root)[0]),
            Some(NodeKind::Declaration(d)) if d.starts_with("<?xml")
        ));
    }

    #[test]
    fn keeps_comments_cdata_and_doctype() {
        let doc = parse_document(
            "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"x.dtd\">\
             <svg><!-- Created with matplotlib --><style><![CDATA[*{stroke-linejoin: round}]]></style></svg>",
        )
        .unwrap();
        let svg = doc.document_element().unwrap();
        let kinds: Vec<_> = doc.children(svg).iter().map(|&c| doc.kind(c).cloned()).collect();
        assert_eq!(
            kinds[0],
            Some(NodeKind::Comment(" Created with matplotlib ".into()))
        );
        let style = doc.children(svg)[1];
        assert_eq!(
            doc.kind(doc.children(style)[0]).cloned(),
            Some(NodeKind::CData("*{stroke-linejoin: round}".into()))
        );
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let doc = parse_document(r#"<p title="a &amp; b">x &lt; y &#65;&#x42; &bogus;</p>"#).unwrap();
        let p = doc.document_element().unwrap();
        assert_eq!(doc.attr(p, "title"), Some("a & b"));
        assert_eq!(doc.text_content(p), "x < y AB &bogus;");
    }

    #[test]
    fn html_void_elements_need_no_close() {
        let doc = parse_document(
            r#"<html><head><meta charset="utf-8"></head><body><div id="tooltip" style="display: none;"></div><br></body></html>"#,
        )
        .unwrap();
        assert!(doc.get_by_id("tooltip").is_some());
    }

    #[test]
    fn script_bodies_are_raw_text() {
        let doc = parse_document("<body><script>if (a < b) { go(); }</script></body>").unwrap();
        let body = doc.document_element().unwrap();
        let script = doc.element_children(body).next().unwrap();
        assert_eq!(doc.text_content(script), "if (a < b) { go(); }");
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = parse_document("<svg><g></svg>").unwrap_err();
        assert!(err.contains("Mismatched end tag"), "{err}");
        let err = parse_document("<svg><g>").unwrap_err();
        assert!(err.contains("Unclosed element"), "{err}");
    }
}
