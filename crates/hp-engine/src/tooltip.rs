//! The shared tooltip element.
//!
//! One tooltip serves every binding on a document; the last write wins.
//! When the document has no tooltip element every write is a no-op and
//! highlighting keeps working.

use hp_core::{Document, Selection};

/// Default tooltip element id in the host page.
pub const TOOLTIP_ID: &str = "tooltip";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tooltip {
    target: Option<Selection>,
}

/// Snapshot of the tooltip's inline style and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipState {
    pub display: Option<String>,
    pub left: Option<String>,
    pub top: Option<String>,
    pub content: String,
}

impl TooltipState {
    pub fn is_visible(&self) -> bool {
        self.display.as_deref() == Some("block")
    }
}

impl Tooltip {
    /// Wrap an explicit selection. An empty selection means "no tooltip".
    pub fn new(target: Selection) -> Self {
        Self {
            target: (!target.is_empty()).then_some(target),
        }
    }

    /// Tooltip that ignores every write.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Look up `#tooltip` in the document.
    pub fn find(doc: &Document) -> Self {
        Self::find_by_id(doc, TOOLTIP_ID)
    }

    pub fn find_by_id(doc: &Document, id: &str) -> Self {
        let tooltip = Self::new(
            doc.get_by_id(id)
                .map(Selection::from_node)
                .unwrap_or_default(),
        );
        if tooltip.target.is_none() {
            log::debug!("no #{id} element; tooltip writes are disabled");
        }
        tooltip
    }

    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    /// Position at `(x, y)` page pixels and set the content. The tooltip is
    /// made visible only when `visible`; otherwise it stays hidden with the
    /// position and content written anyway.
    pub fn place(&self, doc: &mut Document, x: f64, y: f64, content: &str, visible: bool) {
        let Some(target) = &self.target else {
            return;
        };
        target
            .set_style(doc, "display", if visible { "block" } else { "none" })
            .set_style(doc, "left", &format!("{x}px"))
            .set_style(doc, "top", &format!("{y}px"))
            .set_html(doc, content);
    }

    pub fn hide(&self, doc: &mut Document) {
        if let Some(target) = &self.target {
            target.set_style(doc, "display", "none");
        }
    }

    pub fn state(&self, doc: &Document) -> Option<TooltipState> {
        let target = self.target.as_ref()?;
        Some(TooltipState {
            display: target.style(doc, "display"),
            left: target.style(doc, "left"),
            top: target.style(doc, "top"),
            content: target.html(doc).unwrap_or_default(),
        })
    }
}
