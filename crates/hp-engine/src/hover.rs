//! Hover-highlight engine.
//!
//! Binds pointer listeners to classified plot elements. Hovering an element
//! resolves its index, looks up its group and label, marks every element of
//! the same group `hovered` and every other one `not-hovered`, and moves the
//! tooltip next to the pointer. Leaving resets all of it.
//!
//! ## Modes
//!
//! | Mode | Listens on | Index comes from |
//! |------|------------|------------------|
//! | **Direct** | each bound element (`mouseover` / `mouseout`) | position in the bound selection |
//! | **Nearest** | the axes container (`mousemove` / `mouseout`) | closest box centre among the axes' plot elements |
//! | **Legend** | each legend point (`mouseover` / `mouseout`) | the legend point's `data-group` |
//!
//! Every event recomputes the whole state; nothing is carried between
//! events.

use crate::tooltip::Tooltip;
use hp_core::classify::DATA_GROUP;
use hp_core::{
    AxesRegistry, Bound, Category, Document, DomEvent, EventKind, Handler, ListenerId, Metadata,
    NodeIndex, Selection, TooltipVisibility,
};
use hp_render::{ScreenTransform, nearest_element};
use std::cell::Cell;
use std::rc::Rc;

pub const HOVERED: &str = "hovered";
pub const NOT_HOVERED: &str = "not-hovered";

// ─── Element state ───────────────────────────────────────────────────────

/// Highlight state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Neutral,
    Hovered,
    NotHovered,
}

impl HoverState {
    pub fn of(doc: &Document, node: NodeIndex) -> Self {
        if doc.has_class(node, HOVERED) {
            HoverState::Hovered
        } else if doc.has_class(node, NOT_HOVERED) {
            HoverState::NotHovered
        } else {
            HoverState::Neutral
        }
    }
}

/// Mark members of `active` hovered and everything else not-hovered.
/// `None` matches nothing.
fn partition(doc: &mut Document, elements: &Selection, meta: &Metadata, active: Option<&str>) {
    elements.each_mut(doc, |doc, node, j| {
        let same = matches!((active, meta.group(j)), (Some(a), Some(g)) if a == g);
        let (on, off) = if same {
            (HOVERED, NOT_HOVERED)
        } else {
            (NOT_HOVERED, HOVERED)
        };
        doc.add_class(node, on);
        doc.remove_class(node, off);
    });
}

fn clear(doc: &mut Document, elements: &Selection) {
    elements.set_classed(doc, &format!("{HOVERED} {NOT_HOVERED}"), false);
}

// ─── Bindings ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    Direct,
    Nearest,
    Legend,
}

/// Listeners registered by one `bind_*` call. Pass to
/// [`HoverEngine::detach`] to remove them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub mode: BindingMode,
    /// Axes the binding belongs to; `None` for raw selections.
    pub axes_id: Option<String>,
    listeners: Vec<ListenerId>,
}

impl Binding {
    fn new(mode: BindingMode, axes_id: Option<&str>) -> Self {
        Self {
            mode,
            axes_id: axes_id.map(str::to_string),
            listeners: Vec::new(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// State shared by every handler an engine registers.
#[derive(Debug)]
struct Shared {
    metadata: Metadata,
    tooltip: Tooltip,
    screen: Cell<ScreenTransform>,
}

impl Shared {
    /// Tooltip update for the element (or legend entry) at `label_index`.
    fn show_tooltip(&self, doc: &mut Document, event: &DomEvent, label_index: usize) {
        let meta = &self.metadata;
        let x = event.page_x + meta.tooltip_x_shift;
        let y = event.page_y + meta.tooltip_y_shift;
        match (meta.visibility(), meta.label(label_index)) {
            (TooltipVisibility::Shown, Some(label)) => self.tooltip.place(doc, x, y, label, true),
            (TooltipVisibility::Suppressed, _) => {
                self.tooltip
                    .place(doc, x, y, meta.label(label_index).unwrap_or_default(), false)
            }
            _ => self.tooltip.hide(doc),
        }
    }
}

/// Hover behaviour for one axes' metadata.
#[derive(Debug, Clone)]
pub struct HoverEngine {
    shared: Rc<Shared>,
}

impl HoverEngine {
    pub fn new(metadata: Metadata, tooltip: Tooltip) -> Self {
        Self {
            shared: Rc::new(Shared {
                metadata,
                tooltip,
                screen: Cell::new(ScreenTransform::identity()),
            }),
        }
    }

    pub fn with_screen(self, screen: ScreenTransform) -> Self {
        self.set_screen(screen);
        self
    }

    /// Update the client → document mapping used by nearest mode. Takes
    /// effect for already bound handlers.
    pub fn set_screen(&self, screen: ScreenTransform) {
        self.shared.screen.set(screen);
    }

    pub fn metadata(&self) -> &Metadata {
        &self.shared.metadata
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.shared.tooltip
    }

    fn disabled(&self, what: &str) -> bool {
        let off = self.shared.metadata.visibility() == TooltipVisibility::Disabled;
        if off {
            log::debug!("{what}: no labels and no groups, nothing bound");
        }
        off
    }

    // ─── Direct ──────────────────────────────────────────────────────────

    /// Per-element hover for one category of an axes.
    pub fn bind_direct(
        &self,
        doc: &mut Document,
        registry: &AxesRegistry,
        category: Category,
    ) -> Binding {
        let mut binding = self.bind_direct_selection(doc, registry.category(category));
        binding.axes_id = Some(registry.axes_id.clone());
        binding
    }

    /// Per-element hover for an arbitrary selection. Index `i` in the
    /// selection pairs with `groups[i]` and `labels[i]`.
    pub fn bind_direct_selection(&self, doc: &mut Document, selection: &Selection) -> Binding {
        let mut binding = Binding::new(BindingMode::Direct, None);
        if self.disabled("direct") || selection.is_empty() {
            return binding;
        }

        let shared = self.shared.clone();
        let bound = selection.clone();
        let over: Handler = Rc::new(move |doc: &mut Document, ev: &DomEvent, b: Bound| {
            let group = shared.metadata.group(b.index);
            log::trace!("over #{} group {group:?}", b.index);
            partition(doc, &bound, &shared.metadata, group);
            shared.show_tooltip(doc, ev, b.index);
        });

        let shared = self.shared.clone();
        let bound = selection.clone();
        let out: Handler = Rc::new(move |doc: &mut Document, _: &DomEvent, _: Bound| {
            clear(doc, &bound);
            shared.tooltip.hide(doc);
        });

        binding.listeners = selection.on(doc, EventKind::MouseOver, over);
        binding.listeners.extend(selection.on(doc, EventKind::MouseOut, out));
        binding
    }

    // ─── Nearest ─────────────────────────────────────────────────────────

    /// Container-level hover: the pointer selects the plot element whose
    /// bounding-box centre is closest.
    pub fn bind_nearest(&self, doc: &mut Document, registry: &AxesRegistry) -> Binding {
        let mut binding = Binding::new(BindingMode::Nearest, Some(&registry.axes_id));
        let Some(container) = registry.container else {
            log::debug!("{}: no container, nearest mode not bound", registry.axes_id);
            return binding;
        };
        if self.disabled(&registry.axes_id) {
            return binding;
        }

        let shared = self.shared.clone();
        let elements = registry.elements.clone();
        let moved: Handler = Rc::new(move |doc: &mut Document, ev: &DomEvent, _: Bound| {
            let point = shared.screen.get().to_document(ev.client_x, ev.client_y);
            match nearest_element(doc, point, elements.nodes()) {
                Some(hit) => {
                    let group = shared.metadata.group(hit.index);
                    log::trace!("nearest #{} at {:.1} group {group:?}", hit.index, hit.distance);
                    partition(doc, &elements, &shared.metadata, group);
                    shared.show_tooltip(doc, ev, hit.index);
                }
                None => {
                    clear(doc, &elements);
                    shared.tooltip.hide(doc);
                }
            }
        });

        let shared = self.shared.clone();
        let elements = registry.elements.clone();
        let out: Handler = Rc::new(move |doc: &mut Document, _: &DomEvent, _: Bound| {
            clear(doc, &elements);
            shared.tooltip.hide(doc);
        });

        let target = Selection::from_node(container);
        binding.listeners = target.on(doc, EventKind::MouseMove, moved);
        binding.listeners.extend(target.on(doc, EventKind::MouseOut, out));
        binding
    }

    // ─── Legend ──────────────────────────────────────────────────────────

    /// Hovering a legend handle highlights the axes' elements of its group.
    /// Legend labels sit at the tail of the label array.
    pub fn bind_legend(&self, doc: &mut Document, registry: &AxesRegistry) -> Binding {
        let mut binding = Binding::new(BindingMode::Legend, Some(&registry.axes_id));
        if registry.legend.is_empty() || self.disabled(&registry.axes_id) {
            return binding;
        }

        let legend_count = registry.legend.size();
        let shared = self.shared.clone();
        let elements = registry.elements.clone();
        let over: Handler = Rc::new(move |doc: &mut Document, ev: &DomEvent, b: Bound| {
            let group = doc.attr(b.node, DATA_GROUP).map(str::to_string);
            log::trace!("legend #{} group {group:?}", b.index);
            partition(doc, &elements, &shared.metadata, group.as_deref());
            let label_index = shared
                .metadata
                .labels
                .len()
                .checked_sub(legend_count)
                .map(|offset| offset + b.index);
            match label_index {
                Some(i) => shared.show_tooltip(doc, ev, i),
                None => shared.tooltip.hide(doc),
            }
        });

        let shared = self.shared.clone();
        let elements = registry.elements.clone();
        let out: Handler = Rc::new(move |doc: &mut Document, _: &DomEvent, _: Bound| {
            clear(doc, &elements);
            shared.tooltip.hide(doc);
        });

        binding.listeners = registry.legend.on(doc, EventKind::MouseOver, over);
        binding
            .listeners
            .extend(registry.legend.on(doc, EventKind::MouseOut, out));
        binding
    }

    // ─── Whole axes ──────────────────────────────────────────────────────

    /// Bind an axes the way the page does: nearest mode on the container,
    /// or direct mode per non-empty category plus legend handles.
    pub fn bind_axes(
        &self,
        doc: &mut Document,
        registry: &AxesRegistry,
        hover_nearest: bool,
    ) -> Vec<Binding> {
        if self.disabled(&registry.axes_id) {
            return Vec::new();
        }
        let mut bindings = Vec::new();
        if hover_nearest {
            bindings.push(self.bind_nearest(doc, registry));
        } else {
            for category in Category::PASS_ORDER {
                if !registry.category(category).is_empty() {
                    bindings.push(self.bind_direct(doc, registry, category));
                }
            }
        }
        // In nearest mode the container's mousemove already decides for
        // every position inside the axes, legend included.
        if !hover_nearest && !registry.legend.is_empty() {
            bindings.push(self.bind_legend(doc, registry));
        }
        bindings.retain(|b| !b.is_empty());
        log::debug!(
            "{}: {} bindings ({})",
            registry.axes_id,
            bindings.len(),
            if hover_nearest { "nearest" } else { "direct" }
        );
        bindings
    }

    /// Remove a binding's listeners. Returns how many were removed.
    pub fn detach(doc: &mut Document, binding: Binding) -> usize {
        binding
            .listeners
            .into_iter()
            .filter(|&id| doc.remove_listener(id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::{PlotConventions, classify_axes, parse_document};
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<div>
<svg>
  <g id="axes_1">
    <g id="patch_1"><path d="M 0 0 L 10 0 L 10 10 L 0 10 z" clip-path="url(#c)"/></g>
    <g id="patch_2"><path d="M 20 0 L 30 0 L 30 10 L 20 10 z" clip-path="url(#c)"/></g>
    <g id="patch_3"><path d="M 40 0 L 50 0 L 50 10 L 40 10 z" clip-path="url(#c)"/></g>
  </g>
</svg>
<div id="tooltip" style="display: none;"></div>
</div>"#;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn setup(labels: &[&str], groups: &[&str]) -> (Document, AxesRegistry, HoverEngine) {
        let mut doc = parse_document(PAGE).unwrap();
        let meta = Metadata::new(strings(labels), strings(groups));
        let reg = classify_axes(&mut doc, "axes_1", &meta, &PlotConventions::default());
        let engine = HoverEngine::new(meta, Tooltip::find(&doc));
        (doc, reg, engine)
    }

    fn states(doc: &Document, sel: &Selection) -> Vec<HoverState> {
        sel.nodes().iter().map(|&n| HoverState::of(doc, n)).collect()
    }

    #[test]
    fn direct_over_partitions_by_group() {
        let (mut doc, reg, engine) = setup(&["a", "b", "c"], &["x", "y", "x"]);
        let binding = engine.bind_direct(&mut doc, &reg, Category::Bar);
        assert_eq!(binding.listener_count(), 6);

        let bar = reg.bars.nodes()[2];
        doc.dispatch(&DomEvent::new(EventKind::MouseOver, bar).at(5.0, 5.0));
        use HoverState::*;
        assert_eq!(states(&doc, &reg.bars), vec![Hovered, NotHovered, Hovered]);
        let tip = engine.tooltip().state(&doc).unwrap();
        assert!(tip.is_visible());
        assert_eq!(tip.content, "c");

        doc.dispatch(&DomEvent::new(EventKind::MouseOut, bar));
        assert_eq!(states(&doc, &reg.bars), vec![Neutral, Neutral, Neutral]);
        assert!(!engine.tooltip().state(&doc).unwrap().is_visible());
    }

    #[test]
    fn absent_group_matches_nothing() {
        let (mut doc, reg, engine) = setup(&["a", "b", "c"], &["x"]);
        engine.bind_direct(&mut doc, &reg, Category::Bar);
        doc.dispatch(&DomEvent::new(EventKind::MouseOver, reg.bars.nodes()[1]));
        assert_eq!(
            states(&doc, &reg.bars),
            vec![HoverState::NotHovered; 3]
        );
    }

    #[test]
    fn absent_label_hides_tooltip() {
        let (mut doc, reg, engine) = setup(&["a"], &["x", "x", "x"]);
        engine.bind_direct(&mut doc, &reg, Category::Bar);
        doc.dispatch(&DomEvent::new(EventKind::MouseOver, reg.bars.nodes()[0]));
        assert!(engine.tooltip().state(&doc).unwrap().is_visible());
        doc.dispatch(&DomEvent::new(EventKind::MouseOver, reg.bars.nodes()[2]));
        assert!(!engine.tooltip().state(&doc).unwrap().is_visible());
        assert_eq!(states(&doc, &reg.bars), vec![HoverState::Hovered; 3]);
    }

    #[test]
    fn disabled_metadata_binds_nothing() {
        let (mut doc, reg, engine) = setup(&[], &[]);
        assert!(engine.bind_axes(&mut doc, &reg, false).is_empty());
        assert!(engine.bind_direct(&mut doc, &reg, Category::Bar).is_empty());
        assert!(engine.bind_nearest(&mut doc, &reg).is_empty());
        assert_eq!(doc.listener_count(reg.bars.nodes()[0]), 0);
    }

    #[test]
    fn nearest_uses_screen_transform() {
        let (mut doc, reg, engine) = setup(&["a", "b", "c"], &["1", "2", "3"]);
        let engine = engine.with_screen(ScreenTransform::from_screen_ctm(
            hp_render::Affine::scale(2.0),
        ));
        let bindings = engine.bind_axes(&mut doc, &reg, true);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].mode, BindingMode::Nearest);

        // Client (90, 10) is document (45, 5): the third bar.
        let axes = reg.container.unwrap();
        doc.dispatch(&DomEvent::new(EventKind::MouseMove, axes).at(90.0, 10.0));
        use HoverState::*;
        assert_eq!(states(&doc, &reg.elements), vec![NotHovered, NotHovered, Hovered]);
        assert_eq!(engine.tooltip().state(&doc).unwrap().content, "c");
    }

    #[test]
    fn points_join_on_data_group() {
        let mut doc = parse_document(
            r#"<svg><g id="axes_1"><g id="PathCollection_1">
                <use x="0" y="0"/><use x="10" y="0"/><use x="20" y="0"/>
            </g></g></svg>"#,
        )
        .unwrap();
        let meta = Metadata::new(Vec::new(), strings(&["X", "Y", "X"]));
        let reg = classify_axes(&mut doc, "axes_1", &meta, &PlotConventions::default());
        let engine = HoverEngine::new(meta, Tooltip::detached());
        let bindings = engine.bind_axes(&mut doc, &reg, false);
        assert_eq!(bindings.len(), 1);

        let groups: Vec<_> = reg
            .points
            .nodes()
            .iter()
            .map(|&n| doc.attr(n, DATA_GROUP).map(str::to_string))
            .collect();
        assert_eq!(groups, vec![Some("X".into()), Some("Y".into()), Some("X".into())]);

        doc.dispatch(&DomEvent::new(EventKind::MouseOver, reg.points.nodes()[0]));
        use HoverState::*;
        assert_eq!(states(&doc, &reg.points), vec![Hovered, NotHovered, Hovered]);
    }

    #[test]
    fn detach_removes_listeners() {
        let (mut doc, reg, engine) = setup(&["a", "b", "c"], &["x", "y", "x"]);
        let binding = engine.bind_direct(&mut doc, &reg, Category::Bar);
        assert_eq!(HoverEngine::detach(&mut doc, binding), 6);
        let bar = reg.bars.nodes()[0];
        assert_eq!(doc.dispatch(&DomEvent::new(EventKind::MouseOver, bar)), 0);
        assert_eq!(HoverState::of(&doc, bar), HoverState::Neutral);
    }
}
