//! CSS selector subset used to query documents.
//!
//! Supported: type selectors and `*`, `#id`, `.class`, attribute selectors
//! (`[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`, `[a~=v]`), compound
//! selectors, descendant and child (`>`) combinators, and `,` groups.
//!
//! Matching follows `querySelectorAll`: a chain is matched against the
//! node's whole ancestry (not just the part below the query's context node),
//! while results are limited to descendants of the context node.

use crate::model::{Document, Element};
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

// ─── Selector model ──────────────────────────────────────────────────────

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[a]`
    Exists,
    /// `[a=v]`
    Equals,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
    /// `[a~=v]` (whitespace-separated word)
    Includes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttrSelector {
    fn matches(&self, el: &Element) -> bool {
        let Some(actual) = el.attr(&self.name) else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            AttrOp::Substring => !self.value.is_empty() && actual.contains(&self.value),
            AttrOp::Includes => actual.split_whitespace().any(|w| w == self.value),
        }
    }
}

/// A compound selector such as `g#axes_1.active[clip-path]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// `None` means any element (`*` or omitted).
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
    pub attrs: SmallVec<[AttrSelector; 2]>,
}

impl Compound {
    pub fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag
            && !el.tag.as_str().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attr("id") != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|c| el.has_class(c)) && self.attrs.iter().all(|a| a.matches(el))
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }
}

/// How a compound relates to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the parent.
    Child,
}

/// A chain of compounds, left to right. The combinator of part `i` links it
/// to part `i - 1` (ignored for the first part).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<(Combinator, Compound)>,
}

/// A comma-separated selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut rest = input;
        let mut selectors = Vec::new();
        loop {
            skip_space(&mut rest);
            let complex = parse_complex
                .parse_next(&mut rest)
                .map_err(|e| format!("Invalid selector `{input}`: {e}"))?;
            selectors.push(complex);
            skip_space(&mut rest);
            if let Some(after) = rest.strip_prefix(',') {
                rest = after;
                continue;
            }
            if rest.is_empty() {
                break;
            }
            return Err(format!("Invalid selector `{input}`: unexpected `{rest}`"));
        }
        Ok(Self { selectors })
    }

    /// Does `node` match any selector in the group?
    pub fn matches(&self, doc: &Document, node: NodeIndex) -> bool {
        self.selectors
            .iter()
            .any(|s| matches_from(doc, node, &s.parts, s.parts.len()))
    }

    /// All element descendants of `context` matching the group, in
    /// document order (`querySelectorAll`).
    pub fn query_all(&self, doc: &Document, context: NodeIndex) -> Vec<NodeIndex> {
        doc.descendants(context)
            .into_iter()
            .filter(|&n| self.matches(doc, n))
            .collect()
    }

    /// First element descendant of `context` matching the group
    /// (`querySelector`).
    pub fn query_first(&self, doc: &Document, context: NodeIndex) -> Option<NodeIndex> {
        doc.descendants(context)
            .into_iter()
            .find(|&n| self.matches(doc, n))
    }
}

/// Match `parts[..end]` with `parts[end - 1]` anchored at `node`.
fn matches_from(
    doc: &Document,
    node: NodeIndex,
    parts: &[(Combinator, Compound)],
    end: usize,
) -> bool {
    let Some((combinator, compound)) = end.checked_sub(1).and_then(|i| parts.get(i)) else {
        return true;
    };
    let Some(el) = doc.element(node) else {
        return false;
    };
    if !compound.matches(el) {
        return false;
    }
    if end == 1 {
        return true;
    }
    match combinator {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|p| matches_from(doc, p, parts, end - 1)),
        Combinator::Descendant => doc
            .ancestors(node)
            .any(|a| matches_from(doc, a, parts, end - 1)),
    }
}

// ─── Parsers ─────────────────────────────────────────────────────────────

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> = multispace0.parse_next(input);
}

fn parse_ident(input: &mut &str) -> ModalResult<String> {
    let mut out = String::new();
    loop {
        let chunk: &str = take_while(0.., |c: char| {
            c.is_alphanumeric() || c == '-' || c == '_'
        })
        .parse_next(input)?;
        out.push_str(chunk);
        // Backslash escapes (`#matplotlib\.axis_1`).
        let mut chars = input.chars();
        if chars.next() == Some('\\')
            && let Some(escaped) = chars.next()
        {
            out.push(escaped);
            *input = chars.as_str();
            continue;
        }
        break;
    }
    if out.is_empty() {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    Ok(out)
}

fn parse_attr_value(input: &mut &str) -> ModalResult<String> {
    alt((
        delimited('"', take_till(0.., '"'), '"').map(str::to_string),
        delimited('\'', take_till(0.., '\''), '\'').map(str::to_string),
        parse_ident,
    ))
    .parse_next(input)
}

fn parse_attr_selector(input: &mut &str) -> ModalResult<AttrSelector> {
    let _ = '['.parse_next(input)?;
    skip_space(input);
    let name: &str = take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
    })
    .parse_next(input)?;
    skip_space(input);
    if let Some(after) = input.strip_prefix(']') {
        *input = after;
        return Ok(AttrSelector {
            name: name.to_string(),
            op: AttrOp::Exists,
            value: String::new(),
        });
    }
    let op = alt((
        "^=".value(AttrOp::Prefix),
        "$=".value(AttrOp::Suffix),
        "*=".value(AttrOp::Substring),
        "~=".value(AttrOp::Includes),
        "=".value(AttrOp::Equals),
    ))
    .parse_next(input)?;
    skip_space(input);
    let value = parse_attr_value.parse_next(input)?;
    skip_space(input);
    let _ = ']'.parse_next(input)?;
    Ok(AttrSelector {
        name: name.to_string(),
        op,
        value,
    })
}

fn parse_compound(input: &mut &str) -> ModalResult<Compound> {
    let mut compound = Compound::default();
    if let Some(after) = input.strip_prefix('*') {
        *input = after;
    } else if input.starts_with(|c: char| c.is_alphabetic()) {
        compound.tag = Some(parse_ident.parse_next(input)?);
    }
    loop {
        if let Some(after) = input.strip_prefix('#') {
            *input = after;
            compound.id = Some(parse_ident.parse_next(input)?);
        } else if let Some(after) = input.strip_prefix('.') {
            *input = after;
            compound.classes.push(parse_ident.parse_next(input)?);
        } else if input.starts_with('[') {
            compound.attrs.push(parse_attr_selector.parse_next(input)?);
        } else {
            break;
        }
    }
    Ok(compound)
}

fn parse_complex(input: &mut &str) -> ModalResult<ComplexSelector> {
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    loop {
        let before = *input;
        let compound = parse_compound.parse_next(input)?;
        if compound.is_empty() && *input == before && !before.starts_with('*') {
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        parts.push((combinator, compound));

        let before_space = *input;
        skip_space(input);
        if let Some(after) = input.strip_prefix('>') {
            *input = after;
            skip_space(input);
            combinator = Combinator::Child;
            continue;
        }
        if input.is_empty() || input.starts_with(',') {
            break;
        }
        if *input == before_space {
            // No whitespace and no combinator: trailing garbage.
            break;
        }
        combinator = Combinator::Descendant;
    }
    Ok(ComplexSelector { parts })
}
