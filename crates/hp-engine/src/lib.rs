pub mod chart;
pub mod hover;
pub mod input;
pub mod router;
pub mod tooltip;

pub use chart::{ElementState, InteractiveChart};
pub use hover::{Binding, BindingMode, HoverEngine, HoverState};
pub use input::PointerInput;
pub use router::{PointerRouter, RouteOutcome};
pub use tooltip::{Tooltip, TooltipState};
