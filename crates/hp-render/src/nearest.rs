//! Nearest element to a point, by bounding-box centre.

use crate::bbox::bbox_center;
use hp_core::{Document, NodeIndex};
use kurbo::Point;

/// Result of [`nearest_element`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Position in the candidate list.
    pub index: usize,
    pub node: NodeIndex,
    /// Euclidean distance from the point to the box centre.
    pub distance: f64,
}

/// The candidate whose bounding-box centre is closest to `point` (root
/// coordinates). Ties go to the earliest candidate. Candidates without
/// geometry are skipped; `None` if none has any.
pub fn nearest_element(doc: &Document, point: Point, candidates: &[NodeIndex]) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (index, &node) in candidates.iter().enumerate() {
        let Some(centre) = bbox_center(doc, node) else {
            continue;
        };
        let distance = (centre - point).hypot();
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Nearest {
                index,
                node,
                distance,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::parse_document;
    use pretty_assertions::assert_eq;

    const SVG: &str = r#"<svg>
        <rect id="a" x="0" y="0" width="2" height="2"/>
        <rect id="b" x="10" y="0" width="2" height="2"/>
        <text id="t">no box</text>
        <rect id="c" x="20" y="0" width="2" height="2"/>
    </svg>"#;

    fn nodes(doc: &hp_core::Document, ids: &[&str]) -> Vec<NodeIndex> {
        ids.iter().map(|id| doc.get_by_id(id).unwrap()).collect()
    }

    #[test]
    fn picks_minimum_distance() {
        let doc = parse_document(SVG).unwrap();
        let candidates = nodes(&doc, &["a", "t", "b", "c"]);
        let hit = nearest_element(&doc, Point::new(18.0, 1.0), &candidates).unwrap();
        assert_eq!(hit.index, 3);
        assert_eq!(hit.node, candidates[3]);
        assert_eq!(hit.distance, 3.0);
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let doc = parse_document(SVG).unwrap();
        // (6, 1) is 5 away from both a and b.
        let forward = nodes(&doc, &["a", "b"]);
        assert_eq!(
            nearest_element(&doc, Point::new(6.0, 1.0), &forward).map(|n| n.index),
            Some(0)
        );
        let reversed = nodes(&doc, &["b", "a"]);
        let hit = nearest_element(&doc, Point::new(6.0, 1.0), &reversed).unwrap();
        assert_eq!(hit.node, reversed[0]);
    }

    #[test]
    fn empty_or_geometry_less_input() {
        let doc = parse_document(SVG).unwrap();
        assert_eq!(nearest_element(&doc, Point::ORIGIN, &[]), None);
        assert_eq!(
            nearest_element(&doc, Point::ORIGIN, &nodes(&doc, &["t"])),
            None
        );
    }
}
