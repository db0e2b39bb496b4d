//! Client (viewport) coordinates ↔ root user coordinates.
//!
//! The host places the root `<svg>` at some client rectangle; the root's
//! `viewBox` is fitted into it (`xMidYMid meet` unless
//! `preserveAspectRatio="none"`). Pointer events arrive in client
//! coordinates and have to be mapped back before comparing against
//! bounding boxes.

use hp_core::{Document, NodeIndex};
use kurbo::{Affine, Point, Rect};

/// Where the root `<svg>` is drawn, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Client → root user space mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    /// Root user space → client.
    screen_ctm: Affine,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScreenTransform {
    /// Client coordinates are root coordinates.
    pub fn identity() -> Self {
        Self {
            screen_ctm: Affine::IDENTITY,
        }
    }

    /// Build from an explicit root → client matrix. Non-invertible matrices
    /// fall back to the identity.
    pub fn from_screen_ctm(screen_ctm: Affine) -> Self {
        if screen_ctm.determinant().abs() < f64::EPSILON {
            log::warn!("singular screen transform {screen_ctm:?}; using identity");
            return Self::identity();
        }
        Self { screen_ctm }
    }

    /// Fit `view_box` into `placement`.
    pub fn fit(placement: Placement, view_box: Option<Rect>, stretch: bool) -> Self {
        let Some(vb) = view_box.filter(|vb| vb.width() > 0.0 && vb.height() > 0.0) else {
            return Self::from_screen_ctm(Affine::translate((placement.left, placement.top)));
        };
        if placement.width <= 0.0 || placement.height <= 0.0 {
            return Self::identity();
        }
        let sx = placement.width / vb.width();
        let sy = placement.height / vb.height();
        let (sx, sy) = if stretch {
            (sx, sy)
        } else {
            let s = sx.min(sy);
            (s, s)
        };
        let tx = placement.left + (placement.width - vb.width() * sx) / 2.0 - vb.x0 * sx;
        let ty = placement.top + (placement.height - vb.height() * sy) / 2.0 - vb.y0 * sy;
        Self::from_screen_ctm(
            Affine::translate((tx, ty)) * Affine::scale_non_uniform(sx, sy),
        )
    }

    /// Fit the `viewBox` of the root element `svg` into `placement`.
    pub fn for_root(doc: &Document, svg: NodeIndex, placement: Placement) -> Self {
        let stretch = doc
            .attr(svg, "preserveAspectRatio")
            .is_some_and(|p| p.trim_start().starts_with("none"));
        Self::fit(placement, view_box(doc, svg), stretch)
    }

    /// Client point → root user point.
    pub fn to_document(&self, client_x: f64, client_y: f64) -> Point {
        self.screen_ctm.inverse() * Point::new(client_x, client_y)
    }

    /// Root user point → client point.
    pub fn to_client(&self, point: Point) -> Point {
        self.screen_ctm * point
    }
}

/// Parse the `viewBox` attribute (`min-x min-y width height`).
pub fn view_box(doc: &Document, svg: NodeIndex) -> Option<Rect> {
    let raw = doc.attr(svg, "viewBox")?;
    let nums: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        &[x, y, w, h] if w >= 0.0 && h >= 0.0 => Some(Rect::new(x, y, x + w, y + h)),
        _ => {
            log::warn!("ignoring malformed viewBox `{raw}`");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::parse_document;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn identity_by_default() {
        let t = ScreenTransform::default();
        assert!(close(t.to_document(12.0, 34.0), Point::new(12.0, 34.0)));
    }

    #[test]
    fn meet_centres_and_scales() {
        // 200x100 viewBox in a 400x400 box at (10, 20): scale 2, letterboxed
        // vertically by 100px.
        let t = ScreenTransform::fit(
            Placement { left: 10.0, top: 20.0, width: 400.0, height: 400.0 },
            Some(Rect::new(0.0, 0.0, 200.0, 100.0)),
            false,
        );
        assert!(close(t.to_client(Point::ORIGIN), Point::new(10.0, 120.0)));
        assert!(close(t.to_document(410.0, 320.0), Point::new(200.0, 100.0)));
    }

    #[test]
    fn reads_root_attributes() {
        let doc = parse_document(
            r#"<svg viewBox="0 0 460.8 345.6" preserveAspectRatio="none"/>"#,
        )
        .unwrap();
        let svg = doc.document_element().unwrap();
        assert_eq!(view_box(&doc, svg), Some(Rect::new(0.0, 0.0, 460.8, 345.6)));
        let t = ScreenTransform::for_root(
            &doc,
            svg,
            Placement { left: 0.0, top: 0.0, width: 921.6, height: 345.6 },
        );
        assert!(close(t.to_document(921.6, 345.6), Point::new(460.8, 345.6)));
    }

    #[test]
    fn no_view_box_only_offsets() {
        let doc = parse_document(r#"<svg viewBox="0 0 bogus"/>"#).unwrap();
        let svg = doc.document_element().unwrap();
        let t = ScreenTransform::for_root(
            &doc,
            svg,
            Placement { left: 5.0, top: 5.0, width: 10.0, height: 10.0 },
        );
        assert!(close(t.to_document(5.0, 6.0), Point::new(0.0, 1.0)));
    }
}
