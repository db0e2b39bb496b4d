//! Pointer router: raw pointer positions → DOM-style events.
//!
//! Keeps track of the element under the pointer. When it changes, the old
//! element gets `mouseout` and the new one `mouseover`; every sample also
//! fires `mousemove` at the current element. All three bubble, exactly as a
//! browser would deliver them.

use crate::input::PointerInput;
use hp_core::{Document, DomEvent, EventKind, NodeIndex};
use hp_render::ScreenTransform;
use hp_render::hit::{DEFAULT_TOLERANCE, hit_test};

/// What one pointer sample did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Element under the pointer after the sample.
    pub target: Option<NodeIndex>,
    /// Number of listeners invoked.
    pub handled: usize,
}

#[derive(Debug, Clone)]
pub struct PointerRouter {
    /// Subtree that receives events (normally the root `<svg>`). Pointer
    /// positions over no shape target this node.
    scope: NodeIndex,
    screen: ScreenTransform,
    tolerance: f64,
    hovered: Option<NodeIndex>,
}

impl PointerRouter {
    pub fn new(scope: NodeIndex) -> Self {
        Self {
            scope,
            screen: ScreenTransform::identity(),
            tolerance: DEFAULT_TOLERANCE,
            hovered: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn set_screen(&mut self, screen: ScreenTransform) {
        self.screen = screen;
    }

    /// Element currently under the pointer.
    pub fn hovered(&self) -> Option<NodeIndex> {
        self.hovered
    }

    pub fn handle(&mut self, doc: &mut Document, input: PointerInput) -> RouteOutcome {
        match input {
            PointerInput::Move {
                client_x,
                client_y,
                page_x,
                page_y,
            } => {
                let point = self.screen.to_document(client_x, client_y);
                let target = hit_test(doc, self.scope, point, self.tolerance).unwrap_or(self.scope);
                let event = |kind, target| {
                    let mut ev = DomEvent::new(kind, target).with_page(page_x, page_y);
                    ev.client_x = client_x;
                    ev.client_y = client_y;
                    ev
                };

                let mut handled = 0;
                if self.hovered != Some(target) {
                    if let Some(prev) = self.hovered {
                        handled += doc.dispatch(&event(EventKind::MouseOut, prev));
                    }
                    log::trace!("pointer enters {target:?}");
                    handled += doc.dispatch(&event(EventKind::MouseOver, target));
                    self.hovered = Some(target);
                }
                handled += doc.dispatch(&event(EventKind::MouseMove, target));
                RouteOutcome {
                    target: Some(target),
                    handled,
                }
            }
            PointerInput::Leave => self.leave(doc),
        }
    }

    /// Pointer left the surface: `mouseout` on the hovered element.
    pub fn leave(&mut self, doc: &mut Document) -> RouteOutcome {
        let handled = self
            .hovered
            .take()
            .map_or(0, |prev| doc.dispatch(&DomEvent::new(EventKind::MouseOut, prev)));
        RouteOutcome {
            target: None,
            handled,
        }
    }
}
