//! Element bounding boxes in root user space.
//!
//! Boxes are computed from the element's own geometry attributes with every
//! ancestor (and the element's own) `transform` applied, so boxes of
//! elements in different groups are directly comparable.

use crate::transform::{ctm, element_transform};
use hp_core::{Document, NodeIndex};
use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, Shape};

/// `use` → `use` chains deeper than this are treated as cycles.
const MAX_USE_DEPTH: usize = 8;

/// Subtrees that are never rendered directly.
const NON_RENDERED: &[&str] = &[
    "defs",
    "clipPath",
    "mask",
    "marker",
    "pattern",
    "symbol",
    "linearGradient",
    "radialGradient",
    "filter",
    "style",
    "script",
    "metadata",
    "title",
    "desc",
];

/// Tags whose box is the union of their children.
const CONTAINERS: &[&str] = &["g", "svg", "a", "switch"];

/// Tags with their own geometry.
pub const SHAPES: &[&str] = &[
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "use",
];

/// Bounding box of `node` in root coordinates. `None` when the element has
/// no geometry (text, non-rendered elements, empty groups, bad path data).
pub fn bbox(doc: &Document, node: NodeIndex) -> Option<Rect> {
    if !is_rendered(doc, node) {
        return None;
    }
    bbox_in(doc, node, ctm(doc, node), 0)
}

/// Centre of [`bbox`].
pub fn bbox_center(doc: &Document, node: NodeIndex) -> Option<Point> {
    bbox(doc, node).map(|r| r.center())
}

/// Is `node` a rendered leaf shape?
pub fn is_shape(doc: &Document, node: NodeIndex) -> bool {
    doc.tag_name(node).is_some_and(|t| SHAPES.contains(&t))
}

/// Is `tag` a grouping element whose box is the union of its children?
pub fn is_container(tag: &str) -> bool {
    CONTAINERS.contains(&tag)
}

/// Is `node` (or an ancestor) excluded from rendering?
pub fn is_rendered(doc: &Document, node: NodeIndex) -> bool {
    !std::iter::once(node)
        .chain(doc.ancestors(node))
        .filter_map(|n| doc.tag_name(n))
        .any(|t| NON_RENDERED.contains(&t))
}

/// Box of `node` given the transform from its user space (own transform
/// included) to root space.
pub(crate) fn bbox_in(
    doc: &Document,
    node: NodeIndex,
    to_root: Affine,
    depth: usize,
) -> Option<Rect> {
    let tag = doc.tag_name(node)?;
    if NON_RENDERED.contains(&tag) {
        return None;
    }
    if CONTAINERS.contains(&tag) {
        return doc
            .element_children(node)
            .filter_map(|child| {
                bbox_in(doc, child, to_root * element_transform(doc, child), depth)
            })
            .reduce(|a, b| a.union(b));
    }
    if tag == "use" {
        return use_bbox(doc, node, to_root, depth);
    }
    if tag == "path" {
        let d = doc.attr(node, "d")?;
        let path = match BezPath::from_svg(d) {
            Ok(path) => path,
            Err(e) => {
                log::trace!("unreadable path data on {node:?}: {e}");
                return None;
            }
        };
        if path.elements().is_empty() {
            return None;
        }
        return Some((to_root * path).bounding_box());
    }
    local_shape_rect(doc, node, tag).map(|r| to_root.transform_rect_bbox(r))
}

/// Element referenced by a `use`.
fn use_target(doc: &Document, node: NodeIndex) -> Option<NodeIndex> {
    let href = doc
        .attr(node, "href")
        .or_else(|| doc.attr(node, "xlink:href"))?;
    doc.get_by_id(href.strip_prefix('#')?)
}

/// Placement of a `use` target: the `x`/`y` offset then the target's own
/// transform.
fn use_placement(doc: &Document, node: NodeIndex, target: NodeIndex) -> Affine {
    Affine::translate((length(doc, node, "x"), length(doc, node, "y")))
        * element_transform(doc, target)
}

/// A `use` is its referenced element, translated by `x`/`y`.
fn use_bbox(doc: &Document, node: NodeIndex, to_root: Affine, depth: usize) -> Option<Rect> {
    if depth >= MAX_USE_DEPTH {
        log::warn!("use chain deeper than {MAX_USE_DEPTH} at {node:?}");
        return None;
    }
    let target = use_target(doc, node)?;
    let to_root = to_root * use_placement(doc, node, target);
    // The referenced element usually sits in <defs>; only its own geometry
    // matters here.
    let tag = doc.tag_name(target)?;
    if CONTAINERS.contains(&tag) || tag == "symbol" {
        return doc
            .element_children(target)
            .filter_map(|child| {
                bbox_in(doc, child, to_root * element_transform(doc, child), depth + 1)
            })
            .reduce(|a, b| a.union(b));
    }
    match tag {
        "use" => use_bbox(doc, target, to_root, depth + 1),
        _ => bbox_in(doc, target, to_root, depth + 1),
    }
}

// ─── Outlines ────────────────────────────────────────────────────────────

/// Exact geometry of a leaf shape in root space.
#[derive(Debug, Clone)]
pub(crate) struct Outline {
    pub path: BezPath,
    /// Elements reached through `use` references, innermost first. Their
    /// own presentation attributes take precedence over the referencing
    /// element's.
    pub referenced: Vec<NodeIndex>,
    /// Linear scale of the final transform, for stroke widths.
    pub scale: f64,
}

/// Outline of a leaf shape. `None` for bad data and for a `use` of a group,
/// which has no single outline.
pub(crate) fn outline_in(
    doc: &Document,
    node: NodeIndex,
    to_root: Affine,
    depth: usize,
) -> Option<Outline> {
    let tag = doc.tag_name(node)?;
    if tag == "use" {
        if depth >= MAX_USE_DEPTH {
            return None;
        }
        let target = use_target(doc, node)?;
        let to_root = to_root * use_placement(doc, node, target);
        let mut inner = outline_in(doc, target, to_root, depth + 1)?;
        inner.referenced.push(target);
        return Some(inner);
    }
    let local = local_outline(doc, node, tag)?;
    Some(Outline {
        path: to_root * local,
        referenced: Vec::new(),
        scale: to_root.determinant().abs().sqrt(),
    })
}

/// Untransformed outline of a path or basic shape.
fn local_outline(doc: &Document, node: NodeIndex, tag: &str) -> Option<BezPath> {
    let len = |name: &str| length(doc, node, name);
    let path = match tag {
        "path" => BezPath::from_svg(doc.attr(node, "d")?).ok()?,
        "rect" => local_shape_rect(doc, node, tag)?.to_path(0.1),
        "circle" => {
            let r = len("r");
            if r < 0.0 {
                return None;
            }
            Circle::new((len("cx"), len("cy")), r).to_path(0.1)
        }
        "ellipse" => {
            let (rx, ry) = (len("rx"), len("ry"));
            if rx < 0.0 || ry < 0.0 {
                return None;
            }
            Ellipse::new((len("cx"), len("cy")), (rx, ry), 0.0).to_path(0.1)
        }
        "line" => {
            let mut path = BezPath::new();
            path.move_to((len("x1"), len("y1")));
            path.line_to((len("x2"), len("y2")));
            path
        }
        "polyline" | "polygon" => {
            let coords = point_list(doc.attr(node, "points")?);
            let mut pairs = coords.chunks_exact(2).map(|xy| Point::new(xy[0], xy[1]));
            let mut path = BezPath::new();
            path.move_to(pairs.next()?);
            pairs.for_each(|p| path.line_to(p));
            if tag == "polygon" {
                path.close_path();
            }
            path
        }
        _ => return None,
    };
    (!path.elements().is_empty()).then_some(path)
}

fn point_list(points: &str) -> Vec<f64> {
    points
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map_while(|s| s.parse().ok())
        .collect()
}

/// Untransformed box of a basic shape.
fn local_shape_rect(doc: &Document, node: NodeIndex, tag: &str) -> Option<Rect> {
    let len = |name: &str| length(doc, node, name);
    match tag {
        "rect" => {
            let (w, h) = (len("width"), len("height"));
            if w < 0.0 || h < 0.0 {
                return None;
            }
            Some(Rect::new(len("x"), len("y"), len("x") + w, len("y") + h))
        }
        "circle" => {
            let r = len("r");
            (r >= 0.0).then(|| Rect::from_center_size((len("cx"), len("cy")), (2.0 * r, 2.0 * r)))
        }
        "ellipse" => {
            let (rx, ry) = (len("rx"), len("ry"));
            (rx >= 0.0 && ry >= 0.0)
                .then(|| Rect::from_center_size((len("cx"), len("cy")), (2.0 * rx, 2.0 * ry)))
        }
        "line" => Some(Rect::from_points(
            (len("x1"), len("y1")),
            (len("x2"), len("y2")),
        )),
        "polyline" | "polygon" => {
            point_list(doc.attr(node, "points")?)
                .chunks_exact(2)
                .map(|xy| Rect::from_points((xy[0], xy[1]), (xy[0], xy[1])))
                .reduce(|a, b| a.union(b))
        }
        _ => None,
    }
}

/// Numeric attribute in user units (`px` tolerated), 0 when absent.
fn length(doc: &Document, node: NodeIndex, name: &str) -> f64 {
    doc.attr(node, name).and_then(parse_length).unwrap_or(0.0)
}

/// A length in user units; a `px` suffix is tolerated.
pub(crate) fn parse_length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::parse_document;
    use pretty_assertions::assert_eq;

    fn doc(svg: &str) -> Document {
        parse_document(svg).unwrap()
    }

    fn by_id(doc: &Document, id: &str) -> Option<Rect> {
        bbox(doc, doc.get_by_id(id).unwrap())
    }

    #[test]
    fn basic_shapes() {
        let d = doc(r#"<svg>
            <rect id="r" x="1" y="2" width="10" height="20"/>
            <circle id="c" cx="5" cy="5" r="2"/>
            <ellipse id="e" cx="0" cy="0" rx="3" ry="1"/>
            <line id="l" x1="4" y1="9" x2="1" y2="3"/>
            <polygon id="pg" points="0,0 10,5 3,-2"/>
            <path id="p" d="M 50 120 L 130 80 L 180 100"/>
        </svg>"#);
        assert_eq!(by_id(&d, "r"), Some(Rect::new(1.0, 2.0, 11.0, 22.0)));
        assert_eq!(by_id(&d, "c"), Some(Rect::new(3.0, 3.0, 7.0, 7.0)));
        assert_eq!(by_id(&d, "e"), Some(Rect::new(-3.0, -1.0, 3.0, 1.0)));
        assert_eq!(by_id(&d, "l"), Some(Rect::new(1.0, 3.0, 4.0, 9.0)));
        assert_eq!(by_id(&d, "pg"), Some(Rect::new(0.0, -2.0, 10.0, 5.0)));
        assert_eq!(by_id(&d, "p"), Some(Rect::new(50.0, 80.0, 180.0, 120.0)));
    }

    #[test]
    fn groups_union_children_with_transforms() {
        let d = doc(r#"<svg>
            <g id="g" transform="translate(100 0)">
                <rect x="0" y="0" width="10" height="10"/>
                <rect x="20" y="20" width="5" height="5" transform="scale(2)"/>
                <text x="500" y="500">ignored</text>
            </g>
            <g id="empty"><text>no geometry</text></g>
        </svg>"#);
        assert_eq!(by_id(&d, "g"), Some(Rect::new(100.0, 0.0, 150.0, 50.0)));
        assert_eq!(by_id(&d, "empty"), None);
    }

    #[test]
    fn use_offsets_referenced_marker() {
        let d = doc(r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
            <defs><path id="m" d="M 0 3 L 3 0 L 0 -3 L -3 0 z"/></defs>
            <g transform="translate(0 10)">
                <use id="u" xlink:href="#m" x="280" y="120"/>
                <use id="u2" href="#m" x="1" y="1"/>
                <use id="dangling" href="#missing"/>
            </g>
            <use id="loop" href="#loop"/>
        </svg>"##);
        assert_eq!(by_id(&d, "u"), Some(Rect::new(277.0, 127.0, 283.0, 133.0)));
        assert_eq!(by_id(&d, "u2"), Some(Rect::new(-2.0, 8.0, 4.0, 14.0)));
        assert_eq!(by_id(&d, "dangling"), None);
        assert_eq!(by_id(&d, "loop"), None);
        // The marker definition itself is not rendered.
        assert_eq!(by_id(&d, "m"), None);
    }

    #[test]
    fn bad_geometry_is_none() {
        let d = doc(r#"<svg>
            <path id="bad" d="M 0 0 X 5"/>
            <path id="blank" d=""/>
            <rect id="neg" width="-1" height="2"/>
        </svg>"#);
        assert_eq!(by_id(&d, "bad"), None);
        assert_eq!(by_id(&d, "blank"), None);
        assert_eq!(by_id(&d, "neg"), None);
    }

    #[test]
    fn centre_and_render_checks() {
        let d = doc(r#"<svg><defs><rect id="hidden" width="1" height="1"/></defs><rect id="r" x="0" y="0" width="4" height="2"/></svg>"#);
        let r = d.get_by_id("r").unwrap();
        assert_eq!(bbox_center(&d, r), Some(Point::new(2.0, 1.0)));
        assert!(is_shape(&d, r));
        assert!(is_rendered(&d, r));
        assert!(!is_rendered(&d, d.get_by_id("hidden").unwrap()));
    }
}
