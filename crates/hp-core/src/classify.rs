//! Recover plot semantics from matplotlib's SVG structure.
//!
//! matplotlib emits no semantic markup; what it does emit is stable `id`
//! prefixes on group containers (`patch_3`, `PathCollection_1`, `line2d_7`,
//! ...). Each category has one predicate built from those prefixes, and
//! every prefix lives in [`PlotConventions`].
//!
//! Discovery order is document order. The Nth element found by a pass is
//! paired with the Nth metadata entry, so passes never reorder.

use crate::metadata::Metadata;
use crate::model::Document;
use crate::selection::Selection;
use petgraph::graph::NodeIndex;

pub const PLOT_ELEMENT: &str = "plot-element";
pub const LEGEND_POINT: &str = "legend-point";
pub const DATA_GROUP: &str = "data-group";

// ─── Conventions ─────────────────────────────────────────────────────────

/// Container id prefixes used by the SVG backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotConventions {
    pub bar_prefix: String,
    pub point_prefix: String,
    pub line_prefix: String,
    pub area_prefix: String,
    /// Axis ticks and grid lines; their `line2d` paths are not data lines.
    pub axis_prefix: String,
    pub legend_prefix: String,
    /// A bar's path is clipped to the axes; frames and backgrounds are not.
    pub clip_marker: String,
}

impl Default for PlotConventions {
    fn default() -> Self {
        Self {
            bar_prefix: "patch".into(),
            point_prefix: "PathCollection".into(),
            line_prefix: "line2d".into(),
            area_prefix: "FillBetweenPolyCollection".into(),
            axis_prefix: "matplotlib.axis".into(),
            legend_prefix: "legend".into(),
            clip_marker: "url(".into(),
        }
    }
}

impl PlotConventions {
    /// `g[id="<axes>"] g[id^="<prefix>"]`
    fn containers(&self, axes_id: &str, prefix: &str) -> String {
        format!(r#"g[id="{axes_id}"] g[id^="{prefix}"]"#)
    }

    fn id_starts_with(doc: &Document, node: NodeIndex, prefix: &str) -> bool {
        doc.attr(node, "id").is_some_and(|id| id.starts_with(prefix))
    }

    fn in_container(&self, doc: &Document, node: NodeIndex, prefix: &str) -> bool {
        doc.closest(node, |el| {
            el.tag.as_str() == "g" && el.attr("id").is_some_and(|id| id.starts_with(prefix))
        })
        .is_some()
    }
}

// ─── Categories ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Bar,
    Point,
    Line,
    Area,
}

impl Category {
    /// Classification order of a full axes pass.
    pub const PASS_ORDER: [Category; 4] =
        [Category::Line, Category::Bar, Category::Point, Category::Area];

    pub fn class_name(&self) -> &'static str {
        match self {
            Category::Bar => "bar",
            Category::Point => "point",
            Category::Line => "line",
            Category::Area => "area",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            "bar" => Some(Category::Bar),
            "point" => Some(Category::Point),
            "line" => Some(Category::Line),
            "area" => Some(Category::Area),
            _ => None,
        }
    }

    /// Category of an already classified node.
    pub fn of(doc: &Document, node: NodeIndex) -> Option<Self> {
        let el = doc.element(node)?;
        if !el.has_class(PLOT_ELEMENT) {
            return None;
        }
        el.class_tokens().find_map(Self::from_class_name)
    }

    /// Full class attribute written by the classifier.
    pub fn class_attr(&self) -> String {
        format!("{} {PLOT_ELEMENT}", self.class_name())
    }
}

/// A classified node paired with its discovery index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedElement {
    pub node: NodeIndex,
    pub index: usize,
    pub category: Category,
}

// ─── Predicates ──────────────────────────────────────────────────────────

/// A `patch` group whose first path is clipped to the axes.
pub fn is_bar(doc: &Document, node: NodeIndex, conv: &PlotConventions) -> bool {
    doc.tag_name(node) == Some("g")
        && PlotConventions::id_starts_with(doc, node, &conv.bar_prefix)
        && Selection::from_node(node)
            .select(doc, "path")
            .attr(doc, "clip-path")
            .is_some_and(|clip| clip.starts_with(&conv.clip_marker))
}

/// A `path` inside a `line2d` group that is not part of an axis.
pub fn is_line(doc: &Document, node: NodeIndex, conv: &PlotConventions) -> bool {
    doc.tag_name(node) == Some("path")
        && conv.in_container(doc, node, &conv.line_prefix)
        && !conv.in_container(doc, node, &conv.axis_prefix)
}

/// A marker (`use`, or `path` as fallback) inside a `PathCollection`.
pub fn is_point_marker(doc: &Document, node: NodeIndex, conv: &PlotConventions) -> bool {
    matches!(doc.tag_name(node), Some("use" | "path"))
        && conv.in_container(doc, node, &conv.point_prefix)
}

/// A `path` inside a `FillBetweenPolyCollection`.
pub fn is_area(doc: &Document, node: NodeIndex, conv: &PlotConventions) -> bool {
    doc.tag_name(node) == Some("path") && conv.in_container(doc, node, &conv.area_prefix)
}

/// Inside the legend box.
pub fn in_legend(doc: &Document, node: NodeIndex, conv: &PlotConventions) -> bool {
    conv.in_container(doc, node, &conv.legend_prefix)
}

// ─── Passes ──────────────────────────────────────────────────────────────

fn mark(doc: &mut Document, sel: &Selection, category: Category) {
    sel.set_attr(doc, "class", &category.class_attr());
}

/// Bars of an axes.
pub fn find_bars(doc: &mut Document, axes_id: &str, conv: &PlotConventions) -> Selection {
    let bars = Selection::query(doc, &conv.containers(axes_id, &conv.bar_prefix))
        .filter(doc, |doc, n, _| is_bar(doc, n, conv));
    mark(doc, &bars, Category::Bar);
    log::debug!("{axes_id}: {} bars", bars.size());
    bars
}

/// Data lines of an axes (axis ticks and grid lines excluded).
pub fn find_lines(doc: &mut Document, axes_id: &str, conv: &PlotConventions) -> Selection {
    let selector = format!("{} path", conv.containers(axes_id, &conv.line_prefix));
    let lines = Selection::query(doc, &selector).filter(doc, |doc, n, _| is_line(doc, n, conv));
    mark(doc, &lines, Category::Line);
    log::debug!("{axes_id}: {} lines", lines.size());
    lines
}

/// Filled areas of an axes.
pub fn find_areas(doc: &mut Document, axes_id: &str, conv: &PlotConventions) -> Selection {
    let selector = format!("{} path", conv.containers(axes_id, &conv.area_prefix));
    let areas = Selection::query(doc, &selector).filter(doc, |doc, n, _| is_area(doc, n, conv));
    mark(doc, &areas, Category::Area);
    log::debug!("{axes_id}: {} areas", areas.size());
    areas
}

/// Scatter markers of an axes, split into data points and legend handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointSets {
    pub points: Selection,
    pub legend: Selection,
}

/// Scatter markers of an axes. Data point `i` gets `data-group = groups[i]`;
/// legend handles take their groups from the tail of `groups`.
pub fn find_points(
    doc: &mut Document,
    axes_id: &str,
    groups: &[String],
    conv: &PlotConventions,
) -> PointSets {
    let containers = conv.containers(axes_id, &conv.point_prefix);
    let markers = |doc: &Document, tag: &str, legend: bool| {
        Selection::query(doc, &format!("{containers} {tag}"))
            .filter(doc, |doc, n, _| {
                is_point_marker(doc, n, conv) && in_legend(doc, n, conv) == legend
            })
    };
    let pick = |doc: &Document, legend: bool| {
        let uses = markers(doc, "use", legend);
        if uses.is_empty() {
            markers(doc, "path", legend)
        } else {
            uses
        }
    };
    let points = pick(&*doc, false);
    let legend = pick(&*doc, true);

    mark(doc, &points, Category::Point);
    points.each_mut(doc, |doc, n, i| match groups.get(i) {
        Some(group) => doc.set_attr(n, DATA_GROUP, group),
        None => doc.remove_attr(n, DATA_GROUP),
    });

    legend.set_attr(doc, "class", LEGEND_POINT);
    let offset = groups.len().checked_sub(legend.size());
    legend.each_mut(doc, |doc, n, j| {
        match offset.and_then(|o| groups.get(o + j)) {
            Some(group) => doc.set_attr(n, DATA_GROUP, group),
            None => doc.remove_attr(n, DATA_GROUP),
        }
    });

    log::debug!(
        "{axes_id}: {} points, {} legend points",
        points.size(),
        legend.size()
    );
    PointSets { points, legend }
}

// ─── Axes registry ───────────────────────────────────────────────────────

/// Everything the classifier found in one axes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxesRegistry {
    pub axes_id: String,
    /// The `g#<axes_id>` container, if present.
    pub container: Option<NodeIndex>,
    pub lines: Selection,
    pub bars: Selection,
    pub points: Selection,
    pub areas: Selection,
    pub legend: Selection,
    /// Every `plot-element` of the axes in document order.
    pub elements: Selection,
}

impl AxesRegistry {
    pub fn category(&self, category: Category) -> &Selection {
        match category {
            Category::Bar => &self.bars,
            Category::Point => &self.points,
            Category::Line => &self.lines,
            Category::Area => &self.areas,
        }
    }

    /// Axes-wide plot elements paired with their index and category.
    pub fn classified(&self, doc: &Document) -> Vec<ClassifiedElement> {
        self.elements
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, &node)| {
                Category::of(doc, node).map(|category| ClassifiedElement {
                    node,
                    index,
                    category,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Classify one axes: lines, bars, points, areas, then collect the
/// axes-wide element list.
pub fn classify_axes(
    doc: &mut Document,
    axes_id: &str,
    metadata: &Metadata,
    conv: &PlotConventions,
) -> AxesRegistry {
    let axes_selector = format!(r#"g[id="{axes_id}"]"#);
    let container = Selection::query(doc, &axes_selector).first();
    if container.is_none() {
        log::debug!("{axes_id}: no axes container");
    }

    let mut registry = AxesRegistry {
        axes_id: axes_id.to_string(),
        container,
        ..AxesRegistry::default()
    };
    for category in Category::PASS_ORDER {
        match category {
            Category::Line => registry.lines = find_lines(doc, axes_id, conv),
            Category::Bar => registry.bars = find_bars(doc, axes_id, conv),
            Category::Point => {
                let sets = find_points(doc, axes_id, &metadata.groups, conv);
                registry.points = sets.points;
                registry.legend = sets.legend;
            }
            Category::Area => registry.areas = find_areas(doc, axes_id, conv),
        }
    }
    registry.elements = Selection::query(doc, &format!("{axes_selector} .{PLOT_ELEMENT}"));
    log::debug!("{axes_id}: {} plot elements", registry.elements.size());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    fn groups(g: &[&str]) -> Vec<String> {
        g.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bars_need_a_clipped_path() {
        let mut doc = parse_document(
            r#"<svg><g id="axes_1">
                <g id="patch_1"><path clip-path="url(#clip1)"/></g>
                <g id="patch_2"><path/></g>
            </g></svg>"#,
        )
        .unwrap();
        let bars = find_bars(&mut doc, "axes_1", &PlotConventions::default());
        assert_eq!(bars.size(), 1);
        assert_eq!(bars.attr(&doc, "class").as_deref(), Some("bar plot-element"));
        assert_eq!(bars.attr(&doc, "id").as_deref(), Some("patch_1"));
    }

    #[test]
    fn points_get_groups_by_index() {
        let mut doc = parse_document(
            r#"<svg><g id="axes_1"><g id="PathCollection_1">
                <g clip-path="url(#c)"><use/><use/><use/></g>
            </g></g></svg>"#,
        )
        .unwrap();
        let sets = find_points(&mut doc, "axes_1", &groups(&["A", "B"]), &PlotConventions::default());
        assert_eq!(sets.points.size(), 3);
        assert!(sets.legend.is_empty());
        let nodes = sets.points.nodes();
        assert_eq!(doc.attr(nodes[0], DATA_GROUP), Some("A"));
        assert_eq!(doc.attr(nodes[1], DATA_GROUP), Some("B"));
        assert_eq!(doc.attr(nodes[2], DATA_GROUP), None);
        assert_eq!(doc.attr(nodes[2], "class"), Some("point plot-element"));
    }

    #[test]
    fn category_roundtrip_from_classes() {
        let mut doc = parse_document(r#"<svg><path id="p"/></svg>"#).unwrap();
        let p = doc.get_by_id("p").unwrap();
        assert_eq!(Category::of(&doc, p), None);
        doc.set_attr(p, "class", &Category::Area.class_attr());
        assert_eq!(Category::of(&doc, p), Some(Category::Area));
        doc.set_attr(p, "class", "area hovered");
        assert_eq!(Category::of(&doc, p), None);
    }

    #[test]
    fn missing_axes_is_empty() {
        let mut doc = parse_document(r#"<svg><g id="axes_1"/></svg>"#).unwrap();
        let reg = classify_axes(
            &mut doc,
            "axes_9",
            &Metadata::default(),
            &PlotConventions::default(),
        );
        assert_eq!(reg.container, None);
        assert!(reg.is_empty());
        assert!(reg.classified(&doc).is_empty());
    }
}
