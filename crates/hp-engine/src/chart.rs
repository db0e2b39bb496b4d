//! A ready-to-use interactive chart: parse, classify, bind, route.
//!
//! Owns the document and wires every axes listed in the plot data to its
//! own hover engine. Hosts feed raw pointer positions and read back element
//! and tooltip state (or the re-serialized markup).

use crate::hover::{Binding, HoverEngine, HoverState};
use crate::input::PointerInput;
use crate::router::{PointerRouter, RouteOutcome};
use crate::tooltip::{Tooltip, TooltipState};
use hp_core::{
    AxesRegistry, Category, Document, NodeIndex, PlotConventions, PlotData, Selection,
    classify_axes, emit_document, parse_document,
};
use hp_render::{Placement, ScreenTransform};

/// One plot element's current highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementState {
    pub axes_id: String,
    pub node: NodeIndex,
    /// Axes-wide discovery index.
    pub index: usize,
    pub category: Category,
    pub state: HoverState,
}

pub struct InteractiveChart {
    doc: Document,
    svg: NodeIndex,
    tooltip: Tooltip,
    registries: Vec<AxesRegistry>,
    engines: Vec<HoverEngine>,
    bindings: Vec<Binding>,
    router: PointerRouter,
}

impl InteractiveChart {
    /// Parse `markup` (bare SVG or an HTML fragment holding the SVG and the
    /// tooltip element) and bind every axes in `data`.
    pub fn from_markup(markup: &str, data: &PlotData) -> Result<Self, String> {
        Self::with_conventions(markup, data, &PlotConventions::default())
    }

    pub fn with_conventions(
        markup: &str,
        data: &PlotData,
        conventions: &PlotConventions,
    ) -> Result<Self, String> {
        let doc = parse_document(markup)?;
        Self::from_document(doc, data, conventions)
    }

    pub fn from_document(
        mut doc: Document,
        data: &PlotData,
        conventions: &PlotConventions,
    ) -> Result<Self, String> {
        let svg = Selection::query(&doc, "svg")
            .first()
            .ok_or_else(|| "No <svg> element found".to_string())?;
        let tooltip = Tooltip::find(&doc);

        let mut registries = Vec::new();
        let mut engines = Vec::new();
        let mut bindings = Vec::new();
        for entry in data.axes_entries() {
            let registry = classify_axes(&mut doc, &entry.id, &entry.metadata, conventions);
            let engine = HoverEngine::new(entry.metadata, tooltip.clone());
            bindings.extend(engine.bind_axes(&mut doc, &registry, entry.hover_nearest));
            registries.push(registry);
            engines.push(engine);
        }
        log::debug!(
            "chart ready: {} axes, {} bindings",
            registries.len(),
            bindings.len()
        );

        Ok(Self {
            doc,
            svg,
            tooltip,
            registries,
            engines,
            bindings,
            router: PointerRouter::new(svg),
        })
    }

    /// Tell the chart where its `<svg>` is drawn so client coordinates can
    /// be mapped into the drawing.
    pub fn set_placement(&mut self, placement: Placement) {
        let screen = ScreenTransform::for_root(&self.doc, self.svg, placement);
        self.set_screen(screen);
    }

    pub fn set_screen(&mut self, screen: ScreenTransform) {
        self.router.set_screen(screen);
        for engine in &self.engines {
            engine.set_screen(screen);
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle(&mut self, input: PointerInput) -> RouteOutcome {
        self.router.handle(&mut self.doc, input)
    }

    /// Pointer at a client position on an unscrolled page.
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> RouteOutcome {
        self.handle(PointerInput::moved(client_x, client_y))
    }

    pub fn pointer_leave(&mut self) -> RouteOutcome {
        self.handle(PointerInput::Leave)
    }

    // ─── State ───────────────────────────────────────────────────────────

    pub fn tooltip_state(&self) -> Option<TooltipState> {
        self.tooltip.state(&self.doc)
    }

    /// Highlight state of every plot element, axes by axes.
    pub fn element_states(&self) -> Vec<ElementState> {
        self.registries
            .iter()
            .flat_map(|reg| {
                reg.classified(&self.doc)
                    .into_iter()
                    .map(move |c| ElementState {
                        axes_id: reg.axes_id.clone(),
                        node: c.node,
                        index: c.index,
                        category: c.category,
                        state: HoverState::of(&self.doc, c.node),
                    })
            })
            .collect()
    }

    pub fn registries(&self) -> &[AxesRegistry] {
        &self.registries
    }

    pub fn registry(&self, axes_id: &str) -> Option<&AxesRegistry> {
        self.registries.iter().find(|r| r.axes_id == axes_id)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The annotated markup, including current highlight state.
    pub fn to_markup(&self) -> String {
        emit_document(&self.doc)
    }

    /// Remove every listener; classes stay as they are.
    pub fn detach_all(&mut self) -> usize {
        self.bindings
            .drain(..)
            .map(|binding| HoverEngine::detach(&mut self.doc, binding))
            .sum()
    }
}
