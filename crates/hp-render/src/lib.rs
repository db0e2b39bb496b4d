pub mod bbox;
pub mod hit;
pub mod nearest;
pub mod screen;
pub mod transform;

pub use bbox::{bbox, bbox_center};
pub use hit::hit_test;
pub use nearest::{Nearest, nearest_element};
pub use screen::{Placement, ScreenTransform};
pub use transform::{ctm, parse_transform};

// Re-export kurbo geometry types used in the public API
pub use kurbo::{Affine, Point, Rect};
