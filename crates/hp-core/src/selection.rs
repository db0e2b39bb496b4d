//! Chainable query surface over a `Document`.
//!
//! A `Selection` is an ordered list of nodes. The order in which nodes were
//! discovered is document order, and that order is what pairs a node with
//! its entry in the metadata arrays, so nothing here ever reorders or
//! de-duplicates.
//!
//! The document is passed explicitly to every operation: `&Document` for
//! reads, `&mut Document` for writes. Writes return `&Self` for chaining.

use crate::event::{Bound, EventKind, Handler, ListenerId};
use crate::model::Document;
use crate::selector::SelectorList;
use petgraph::graph::NodeIndex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: Vec<NodeIndex>,
}

impl Selection {
    // ─── Boundary conversions ────────────────────────────────────────────

    /// Empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a single node.
    pub fn from_node(node: NodeIndex) -> Self {
        Self { nodes: vec![node] }
    }

    /// Wrap an ordered node list as-is.
    pub fn from_nodes(nodes: Vec<NodeIndex>) -> Self {
        Self { nodes }
    }

    /// Selection holding the document root.
    pub fn root(doc: &Document) -> Self {
        Self::from_node(doc.root)
    }

    /// All matches of `selector` in the whole document.
    pub fn query(doc: &Document, selector: &str) -> Self {
        Self::root(doc).select_all(doc, selector)
    }

    // ─── Traversal ───────────────────────────────────────────────────────

    /// First descendant of the first node matching `selector`.
    pub fn select(&self, doc: &Document, selector: &str) -> Self {
        let Some(&first) = self.nodes.first() else {
            return Self::empty();
        };
        let Some(list) = compile(selector) else {
            return Self::empty();
        };
        list.query_first(doc, first)
            .map(Self::from_node)
            .unwrap_or_default()
    }

    /// Every descendant match of every node, concatenated in order.
    pub fn select_all(&self, doc: &Document, selector: &str) -> Self {
        if self.nodes.is_empty() {
            return Self::empty();
        }
        let Some(list) = compile(selector) else {
            return Self::empty();
        };
        let nodes = self
            .nodes
            .iter()
            .flat_map(|&n| list.query_all(doc, n))
            .collect();
        Self { nodes }
    }

    /// Order-preserving subset.
    pub fn filter(
        &self,
        doc: &Document,
        mut pred: impl FnMut(&Document, NodeIndex, usize) -> bool,
    ) -> Self {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .filter(|&(i, &n)| pred(doc, n, i))
            .map(|(_, &n)| n)
            .collect();
        Self { nodes }
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    /// Attribute of the first node.
    pub fn attr(&self, doc: &Document, name: &str) -> Option<String> {
        self.first().and_then(|n| doc.attr(n, name)).map(str::to_string)
    }

    /// Set an attribute on every node.
    pub fn set_attr(&self, doc: &mut Document, name: &str, value: &str) -> &Self {
        for &n in &self.nodes {
            doc.set_attr(n, name, value);
        }
        self
    }

    /// Remove an attribute from every node.
    pub fn remove_attr(&self, doc: &mut Document, name: &str) -> &Self {
        for &n in &self.nodes {
            doc.remove_attr(n, name);
        }
        self
    }

    /// Whether the first node carries every class in `names`.
    pub fn classed(&self, doc: &Document, names: &str) -> Option<bool> {
        let first = self.first()?;
        doc.element(first)?;
        Some(names.split_whitespace().all(|c| doc.has_class(first, c)))
    }

    /// Add (`on == true`) or remove each class in `names` on every node.
    pub fn set_classed(&self, doc: &mut Document, names: &str, on: bool) -> &Self {
        for &n in &self.nodes {
            for class in names.split_whitespace() {
                if on {
                    doc.add_class(n, class);
                } else {
                    doc.remove_class(n, class);
                }
            }
        }
        self
    }

    /// Inline style property of the first node.
    pub fn style(&self, doc: &Document, property: &str) -> Option<String> {
        self.first().and_then(|n| doc.style_property(n, property))
    }

    /// Set an inline style property on every node. Empty removes it.
    pub fn set_style(&self, doc: &mut Document, property: &str, value: &str) -> &Self {
        for &n in &self.nodes {
            doc.set_style_property(n, property, value);
        }
        self
    }

    /// Inner markup of the first node.
    pub fn html(&self, doc: &Document) -> Option<String> {
        self.first().and_then(|n| doc.inner_markup(n))
    }

    /// Replace the content of every node with raw markup.
    pub fn set_html(&self, doc: &mut Document, markup: &str) -> &Self {
        for &n in &self.nodes {
            doc.set_inner_markup(n, markup);
        }
        self
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Register `handler` on every node. Each registration remembers the
    /// node's position in this selection.
    pub fn on(&self, doc: &mut Document, kind: EventKind, handler: Handler) -> Vec<ListenerId> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, &node)| doc.add_listener(kind, Bound { node, index }, handler.clone()))
            .collect()
    }

    // ─── Iteration ───────────────────────────────────────────────────────

    pub fn each(&self, mut f: impl FnMut(NodeIndex, usize)) -> &Self {
        for (i, &n) in self.nodes.iter().enumerate() {
            f(n, i);
        }
        self
    }

    pub fn each_mut(
        &self,
        doc: &mut Document,
        mut f: impl FnMut(&mut Document, NodeIndex, usize),
    ) -> &Self {
        for (i, &n) in self.nodes.iter().enumerate() {
            f(doc, n, i);
        }
        self
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn first(&self) -> Option<NodeIndex> {
        self.nodes.first().copied()
    }

    /// Position of `node` in this selection.
    pub fn index_of(&self, node: NodeIndex) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }
}

fn compile(selector: &str) -> Option<SelectorList> {
    match SelectorList::parse(selector) {
        Ok(list) => Some(list),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}
