//! Document tree for rendered SVG (and the HTML shell around it).
//!
//! The document is a tree stored in a `StableDiGraph`: nodes are elements,
//! text runs or raw markup, edges go parent → child. Child order is kept
//! explicitly because it is document order, and document order is the join
//! key between discovered plot elements and the metadata arrays.
//!
//! All writes (attributes, classes, inline style, content) mutate the tree
//! in place and show up in the emitted markup.

use crate::event::{Bound, DomEvent, EventKind, Handler, Listener, ListenerId};
use crate::id::Name;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A single `name="value"` pair. Values are stored decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: Name,
    pub value: String,
}

/// An element: tag name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Name,
    pub attrs: SmallVec<[Attr; 4]>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: Name::intern(tag),
            attrs: SmallVec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        let key = Name::get(name)?;
        self.attrs
            .iter()
            .find(|a| a.name == key)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let key = Name::intern(name);
        match self.attrs.iter_mut().find(|a| a.name == key) {
            Some(existing) => existing.value = value.to_string(),
            None => self.attrs.push(Attr {
                name: key,
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let key = Name::get(name)?;
        let pos = self.attrs.iter().position(|a| a.name == key)?;
        Some(self.attrs.remove(pos).value)
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_tokens().any(|c| c == class)
    }
}

/// What a tree node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root (holds prolog, doctype and the top-level element).
    Root,
    Element(Element),
    /// Character data, stored decoded.
    Text(String),
    /// Raw markup written through `set_inner_markup`, emitted verbatim.
    Markup(String),
    /// `<!-- ... -->` body.
    Comment(String),
    /// `<![CDATA[ ... ]]>` body.
    CData(String),
    /// `<?xml ...?>` or `<!DOCTYPE ...>`, stored with its delimiters.
    Declaration(String),
}

// ─── Document ────────────────────────────────────────────────────────────

/// An owned document tree plus the listeners attached to its nodes.
#[derive(Debug, Clone)]
pub struct Document {
    /// The underlying tree.
    pub graph: StableDiGraph<NodeKind, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Children of each node in document order.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,

    /// `id` attribute → first element carrying it.
    id_index: HashMap<String, NodeIndex>,

    /// Event listeners by node.
    listeners: HashMap<NodeIndex, SmallVec<[Listener; 2]>>,

    next_listener: u64,
}

impl Document {
    /// Create an empty document holding only the root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(NodeKind::Root);
        Self {
            graph,
            root,
            child_order: HashMap::new(),
            id_index: HashMap::new(),
            listeners: HashMap::new(),
            next_listener: 0,
        }
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Append a node as the last child of `parent`. Returns its index.
    pub fn append(&mut self, parent: NodeIndex, kind: NodeKind) -> NodeIndex {
        let id = match &kind {
            NodeKind::Element(el) => el.attr("id").map(str::to_string),
            _ => None,
        };
        let idx = self.graph.add_node(kind);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        if let Some(id) = id {
            self.id_index.entry(id).or_insert(idx);
        }
        idx
    }

    /// Append an element built from a tag name and attribute pairs.
    pub fn append_element(
        &mut self,
        parent: NodeIndex,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> NodeIndex {
        let mut el = Element::new(tag);
        for (name, value) in attrs {
            el.set_attr(name, value);
        }
        self.append(parent, NodeKind::Element(el))
    }

    /// Remove a node and everything below it, including their listeners.
    pub fn remove_subtree(&mut self, idx: NodeIndex) {
        if idx == self.root {
            return;
        }
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.child_order.get_mut(&parent)
        {
            siblings.retain(|&c| c != idx);
        }
        let mut stack = vec![idx];
        while let Some(node) = stack.pop() {
            if let Some(children) = self.child_order.remove(&node) {
                stack.extend(children);
            }
            self.listeners.remove(&node);
            if let Some(NodeKind::Element(el)) = self.graph.remove_node(node)
                && let Some(id) = el.attr("id")
                && self.id_index.get(id) == Some(&node)
            {
                self.id_index.remove(id);
            }
        }
    }

    /// Children of a node in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Element children only.
    pub fn element_children(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.children(idx)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// Parent of a node (`None` for the root).
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Ancestors from the parent upwards, root last.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.parent(idx), move |&n| self.parent(n))
    }

    /// Element descendants of `idx` in document (pre-)order, excluding `idx`.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.children(idx).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Nearest inclusive ancestor satisfying `pred` (DOM `closest`).
    pub fn closest(
        &self,
        idx: NodeIndex,
        mut pred: impl FnMut(&Element) -> bool,
    ) -> Option<NodeIndex> {
        std::iter::once(idx)
            .chain(self.ancestors(idx))
            .find(|&n| self.element(n).is_some_and(&mut pred))
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        ancestor != node && self.ancestors(node).any(|a| a == ancestor)
    }

    /// First top-level element (the `<svg>` or `<html>` element).
    pub fn document_element(&self) -> Option<NodeIndex> {
        self.element_children(self.root).next()
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ─── Element access ──────────────────────────────────────────────────

    pub fn kind(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.graph.node_weight(idx)
    }

    pub fn is_element(&self, idx: NodeIndex) -> bool {
        matches!(self.graph.node_weight(idx), Some(NodeKind::Element(_)))
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        match self.graph.node_weight(idx) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        match self.graph.node_weight_mut(idx) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag_name(&self, idx: NodeIndex) -> Option<&str> {
        self.element(idx).map(|el| el.tag.as_str())
    }

    /// Look up an element by its `id` attribute.
    pub fn get_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    pub fn attr(&self, idx: NodeIndex, name: &str) -> Option<&str> {
        self.element(idx)?.attr(name)
    }

    /// Set an attribute. No-op on non-element nodes.
    pub fn set_attr(&mut self, idx: NodeIndex, name: &str, value: &str) {
        let Some(el) = self.element_mut(idx) else {
            return;
        };
        let old_id = if name == "id" {
            el.attr("id").map(str::to_string)
        } else {
            None
        };
        el.set_attr(name, value);
        if name == "id" {
            if let Some(old) = old_id
                && self.id_index.get(&old) == Some(&idx)
            {
                self.id_index.remove(&old);
            }
            self.id_index.entry(value.to_string()).or_insert(idx);
        }
    }

    pub fn remove_attr(&mut self, idx: NodeIndex, name: &str) {
        let removed = self.element_mut(idx).and_then(|el| el.remove_attr(name));
        if name == "id"
            && let Some(old) = removed
            && self.id_index.get(&old) == Some(&idx)
        {
            self.id_index.remove(&old);
        }
    }

    // ─── classList ───────────────────────────────────────────────────────

    pub fn has_class(&self, idx: NodeIndex, class: &str) -> bool {
        self.element(idx).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, idx: NodeIndex, class: &str) {
        let Some(el) = self.element_mut(idx) else {
            return;
        };
        if el.has_class(class) {
            return;
        }
        let value = match el.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        el.set_attr("class", &value);
    }

    pub fn remove_class(&mut self, idx: NodeIndex, class: &str) {
        let Some(el) = self.element_mut(idx) else {
            return;
        };
        if !el.has_class(class) {
            return;
        }
        let value = el
            .class_tokens()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        el.set_attr("class", &value);
    }

    // ─── Inline style ────────────────────────────────────────────────────

    /// Read one property from the inline `style` attribute.
    pub fn style_property(&self, idx: NodeIndex, property: &str) -> Option<String> {
        let style = self.attr(idx, "style")?;
        parse_declarations(style)
            .into_iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v)
    }

    /// Write one inline style property. An empty value removes it.
    pub fn set_style_property(&mut self, idx: NodeIndex, property: &str, value: &str) {
        if !self.is_element(idx) {
            return;
        }
        let mut decls = self
            .attr(idx, "style")
            .map(parse_declarations)
            .unwrap_or_default();
        let value = value.trim();
        match decls.iter().position(|(k, _)| k == property) {
            Some(pos) if value.is_empty() => {
                decls.remove(pos);
            }
            Some(pos) => decls[pos].1 = value.to_string(),
            None if value.is_empty() => return,
            None => decls.push((property.to_string(), value.to_string())),
        }
        let serialized = decls
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(idx, "style", &serialized);
    }

    // ─── Content ─────────────────────────────────────────────────────────

    /// Serialized children (`innerHTML`). `None` for non-elements.
    pub fn inner_markup(&self, idx: NodeIndex) -> Option<String> {
        if !self.is_element(idx) {
            return None;
        }
        let mut out = String::new();
        for &child in self.children(idx) {
            crate::emitter::emit_node(&mut out, self, child);
        }
        Some(out)
    }

    /// Replace all children with raw markup (`innerHTML = ...`). The markup
    /// is kept verbatim; no sanitization happens here.
    pub fn set_inner_markup(&mut self, idx: NodeIndex, markup: &str) {
        if !self.is_element(idx) {
            return;
        }
        for child in self.children(idx).to_vec() {
            self.remove_subtree(child);
        }
        if !markup.is_empty() {
            self.append(idx, NodeKind::Markup(markup.to_string()));
        }
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self, idx: NodeIndex) -> String {
        let mut out = String::new();
        let mut stack = vec![idx];
        while let Some(node) = stack.pop() {
            match self.kind(node) {
                Some(NodeKind::Text(t) | NodeKind::CData(t) | NodeKind::Markup(t)) => {
                    out.push_str(t)
                }
                _ => stack.extend(self.children(node).iter().rev().copied()),
            }
        }
        out
    }

    // ─── Listeners ───────────────────────────────────────────────────────

    /// Attach a listener to `bound.node`.
    pub fn add_listener(&mut self, kind: EventKind, bound: Bound, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(bound.node).or_default().push(Listener {
            id,
            kind,
            bound,
            handler,
        });
        id
    }

    /// Detach a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Number of listeners registered on a node.
    pub fn listener_count(&self, idx: NodeIndex) -> usize {
        self.listeners.get(&idx).map_or(0, |l| l.len())
    }

    /// Dispatch an event at `event.target`, bubbling to the root. Handlers
    /// registered on one node run in registration order. Returns the
    /// number of handlers invoked.
    pub fn dispatch(&mut self, event: &DomEvent) -> usize {
        if self.graph.node_weight(event.target).is_none() {
            return 0;
        }
        let path: Vec<NodeIndex> = std::iter::once(event.target)
            .chain(self.ancestors(event.target))
            .collect();
        let mut invoked = 0;
        for node in path {
            let matching: Vec<Listener> = self
                .listeners
                .get(&node)
                .map(|list| list.iter().filter(|l| l.kind == event.kind).cloned().collect())
                .unwrap_or_default();
            for listener in matching {
                (listener.handler)(self, event, listener.bound);
                invoked += 1;
            }
        }
        invoked
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `a: b; c: d` into trimmed pairs, dropping empty declarations.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample() -> (Document, NodeIndex, NodeIndex, NodeIndex) {
        let mut doc = Document::new();
        let svg = doc.append_element(doc.root, "svg", &[]);
        let g = doc.append_element(svg, "g", &[("id", "axes_1")]);
        let path = doc.append_element(g, "path", &[("d", "M 0 0 L 1 1")]);
        (doc, svg, g, path)
    }

    #[test]
    fn tree_basics() {
        let (doc, svg, g, path) = sample();
        assert_eq!(doc.document_element(), Some(svg));
        assert_eq!(doc.children(svg), &[g]);
        assert_eq!(doc.parent(path), Some(g));
        assert_eq!(doc.get_by_id("axes_1"), Some(g));
        assert!(doc.is_ancestor_of(svg, path));
        assert!(!doc.is_ancestor_of(path, path));
        assert_eq!(doc.descendants(svg), vec![g, path]);
        assert_eq!(doc.closest(path, |el| el.attr("id").is_some()), Some(g));
    }

    #[test]
    fn class_list_edits() {
        let (mut doc, _, _, path) = sample();
        doc.add_class(path, "point");
        doc.add_class(path, "plot-element");
        doc.add_class(path, "point");
        assert_eq!(doc.attr(path, "class"), Some("point plot-element"));
        doc.remove_class(path, "point");
        assert_eq!(doc.attr(path, "class"), Some("plot-element"));
        assert!(doc.has_class(path, "plot-element"));
        assert!(!doc.has_class(path, "point"));
    }

    #[test]
    fn inline_style_edits() {
        let (mut doc, _, g, _) = sample();
        doc.set_style_property(g, "display", "none");
        doc.set_style_property(g, "left", "65px");
        doc.set_style_property(g, "display", "block");
        assert_eq!(doc.attr(g, "style"), Some("display: block; left: 65px"));
        assert_eq!(doc.style_property(g, "left").as_deref(), Some("65px"));
        doc.set_style_property(g, "left", "");
        assert_eq!(doc.style_property(g, "left"), None);
    }

    #[test]
    fn inner_markup_replaces_children() {
        let (mut doc, _, g, path) = sample();
        doc.set_inner_markup(g, "<b>Second</b>");
        assert!(doc.kind(path).is_none());
        assert_eq!(doc.inner_markup(g).as_deref(), Some("<b>Second</b>"));
        assert_eq!(doc.text_content(g), "<b>Second</b>");
    }

    #[test]
    fn id_index_follows_attribute_writes() {
        let (mut doc, _, g, _) = sample();
        doc.set_attr(g, "id", "axes_2");
        assert_eq!(doc.get_by_id("axes_1"), None);
        assert_eq!(doc.get_by_id("axes_2"), Some(g));
        doc.remove_attr(g, "id");
        assert_eq!(doc.get_by_id("axes_2"), None);
    }

    #[test]
    fn dispatch_bubbles_and_detaches() {
        let (mut doc, svg, g, path) = sample();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        let id = doc.add_listener(
            EventKind::MouseOver,
            Bound { node: g, index: 0 },
            Rc::new(move |_: &mut Document, ev: &DomEvent, bound: Bound| {
                l1.borrow_mut().push((ev.target, bound.node))
            }),
        );
        let l2 = log.clone();
        doc.add_listener(
            EventKind::MouseOut,
            Bound { node: svg, index: 0 },
            Rc::new(move |_: &mut Document, ev: &DomEvent, bound: Bound| {
                l2.borrow_mut().push((ev.target, bound.node))
            }),
        );

        assert_eq!(doc.dispatch(&DomEvent::new(EventKind::MouseOver, path)), 1);
        assert_eq!(log.borrow().as_slice(), &[(path, g)]);

        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        assert_eq!(doc.dispatch(&DomEvent::new(EventKind::MouseOver, path)), 0);
        assert_eq!(doc.dispatch(&DomEvent::new(EventKind::MouseOut, path)), 1);
    }
}
