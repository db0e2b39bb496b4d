//! Raw pointer input from the host.
//!
//! Hosts report where the pointer is, not which element it is over; the
//! [`PointerRouter`](crate::router::PointerRouter) turns these into DOM-style
//! over/out/move events.

/// A pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Pointer is at a client (viewport) position. `page_*` adds the host's
    /// scroll offset and is what tooltips are positioned with.
    Move {
        client_x: f64,
        client_y: f64,
        page_x: f64,
        page_y: f64,
    },

    /// Pointer left the chart surface.
    Leave,
}

impl PointerInput {
    /// Move with no scroll offset (page == client).
    pub fn moved(x: f64, y: f64) -> Self {
        PointerInput::Move {
            client_x: x,
            client_y: y,
            page_x: x,
            page_y: y,
        }
    }
}
