//! Pointer events and the listener table carried by a `Document`.
//!
//! Listeners are plain `Rc` closures: everything runs on the host's UI
//! thread, one handler at a time, so nothing here is `Send`.

use crate::model::Document;
use petgraph::graph::NodeIndex;
use std::fmt;
use std::rc::Rc;

/// The pointer events the hover engine listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer entered an element (bubbles).
    MouseOver,
    /// Pointer moved while over an element (bubbles).
    MouseMove,
    /// Pointer left an element (bubbles).
    MouseOut,
}

impl EventKind {
    /// DOM event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MouseOver => "mouseover",
            EventKind::MouseMove => "mousemove",
            EventKind::MouseOut => "mouseout",
        }
    }

    /// Parse a DOM event name. `mouseenter`/`mouseleave` map onto the
    /// bubbling variants since dispatch here always bubbles.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mouseover" | "mouseenter" | "pointerover" | "pointerenter" => Some(Self::MouseOver),
            "mousemove" | "pointermove" => Some(Self::MouseMove),
            "mouseout" | "mouseleave" | "pointerout" | "pointerleave" => Some(Self::MouseOut),
            _ => None,
        }
    }
}

/// A dispatched pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomEvent {
    pub kind: EventKind,
    /// The innermost node the event was fired at.
    pub target: NodeIndex,
    /// Pointer position relative to the viewport.
    pub client_x: f64,
    pub client_y: f64,
    /// Pointer position relative to the page (viewport + scroll).
    pub page_x: f64,
    pub page_y: f64,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: NodeIndex) -> Self {
        Self {
            kind,
            target,
            client_x: 0.0,
            client_y: 0.0,
            page_x: 0.0,
            page_y: 0.0,
        }
    }

    /// Same client and page position (no scroll offset).
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.client_x = x;
        self.client_y = y;
        self.page_x = x;
        self.page_y = y;
        self
    }

    pub fn with_page(mut self, page_x: f64, page_y: f64) -> Self {
        self.page_x = page_x;
        self.page_y = page_y;
        self
    }
}

/// The node a listener was registered on, paired with its position in the
/// selection that registered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub node: NodeIndex,
    pub index: usize,
}

/// Listener callback: receives the document, the event, and the node the
/// listener is attached to.
pub type Handler = Rc<dyn Fn(&mut Document, &DomEvent, Bound)>;

/// Handle returned by `Document::add_listener`, used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// One registered listener.
#[derive(Clone)]
pub struct Listener {
    pub id: ListenerId,
    pub kind: EventKind,
    pub bound: Bound,
    pub handler: Handler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}
