//! Hit testing: point → element lookup.
//!
//! Reverse-walks the document (last painted = topmost) to find the leaf
//! shape under a root-space point. The inflated bounding box is a cheap
//! pre-filter; the decision is made on the shape's outline: inside the fill
//! (unless `fill: none`), or within half the stroke width of an edge. The
//! tolerance widens both so hairlines stay reachable.

use crate::bbox::{Outline, SHAPES, bbox_in, outline_in, parse_length};
use crate::transform::element_transform;
use hp_core::{Document, NodeIndex};
use kurbo::{Affine, BezPath, ParamCurveNearest, PathEl, Point, Rect, Shape};

/// Default slop in root units.
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// Find the topmost shape under `point` (root coordinates) inside `scope`.
/// Returns `None` over background.
pub fn hit_test(doc: &Document, scope: NodeIndex, point: Point, tolerance: f64) -> Option<NodeIndex> {
    let to_root = crate::transform::ctm(doc, scope);
    hit_test_node(doc, scope, to_root, point, tolerance)
}

fn hit_test_node(
    doc: &Document,
    idx: NodeIndex,
    to_root: Affine,
    point: Point,
    tolerance: f64,
) -> Option<NodeIndex> {
    let tag = doc.tag_name(idx);
    // Shapes are leaves for hit purposes; `use` content is not descended.
    if let Some(tag) = tag
        && SHAPES.contains(&tag)
    {
        return shape_hit(doc, idx, to_root, point, tolerance).then_some(idx);
    }
    if tag.is_some_and(|t| !crate::bbox::is_container(t)) {
        return None;
    }

    // Check children in reverse (topmost first)
    for &child in doc.children(idx).iter().rev() {
        if !doc.is_element(child) {
            continue;
        }
        let child_to_root = to_root * element_transform(doc, child);
        if let Some(hit) = hit_test_node(doc, child, child_to_root, point, tolerance) {
            return Some(hit);
        }
    }
    None
}

fn shape_hit(doc: &Document, idx: NodeIndex, to_root: Affine, point: Point, tolerance: f64) -> bool {
    let Some(bbox) = bbox_in(doc, idx, to_root, 0) else {
        return false;
    };
    let Some(outline) = outline_in(doc, idx, to_root, 0) else {
        // A `use` of a group: the box is all we have.
        return contains(bbox, point, tolerance);
    };
    let paint = Paint::resolve(doc, &outline, idx);
    let reach = tolerance + paint.stroke_width.map_or(0.0, |w| w * outline.scale / 2.0);
    if !contains(bbox, point, reach) {
        return false;
    }
    (paint.filled && closed(&outline.path).contains(point))
        || edge_distance(&outline.path, point) <= reach
}

/// Inclusive containment with slop.
fn contains(b: Rect, p: Point, tolerance: f64) -> bool {
    let b = b.inflate(tolerance, tolerance);
    p.x >= b.x0 && p.x <= b.x1 && p.y >= b.y0 && p.y <= b.y1
}

/// Distance from `p` to the nearest segment of `path`.
fn edge_distance(path: &BezPath, p: Point) -> f64 {
    path.segments()
        .map(|seg| seg.nearest(p, 1e-6).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// `path` with every open subpath closed, as filling does.
fn closed(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    out.close_path();
                }
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => {}
        }
        out.push(el);
    }
    if open {
        out.close_path();
    }
    out
}

// ─── Paint ───────────────────────────────────────────────────────────────

/// The presentation properties that decide what part of a shape is hit.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Paint {
    filled: bool,
    /// `None` when unstroked.
    stroke_width: Option<f64>,
}

impl Paint {
    /// Inline style wins over the attribute; referenced elements win over
    /// the `use`, which inherits from its ancestors.
    fn resolve(doc: &Document, outline: &Outline, node: NodeIndex) -> Self {
        let chain: Vec<NodeIndex> = outline
            .referenced
            .iter()
            .copied()
            .chain(std::iter::once(node))
            .chain(doc.ancestors(node))
            .collect();
        let lookup = |name: &str| {
            chain.iter().find_map(|&n| {
                doc.style_property(n, name)
                    .or_else(|| doc.attr(n, name).map(str::to_string))
            })
        };
        let filled = lookup("fill").is_none_or(|v| v.trim() != "none");
        let stroke_width = lookup("stroke")
            .filter(|v| v.trim() != "none")
            .map(|_| {
                lookup("stroke-width")
                    .and_then(|w| parse_length(&w))
                    .unwrap_or(1.0)
            });
        Self {
            filled,
            stroke_width,
        }
    }
}
