pub mod classify;
pub mod emitter;
pub mod event;
pub mod id;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod selection;
pub mod selector;

pub use classify::{
    AxesRegistry, Category, ClassifiedElement, PlotConventions, PointSets, classify_axes,
};
pub use emitter::emit_document;
pub use event::{Bound, DomEvent, EventKind, Handler, ListenerId};
pub use id::Name;
pub use metadata::{AxesEntry, Metadata, PlotData, TooltipVisibility};
pub use model::*;
pub use parser::parse_document;
pub use selection::Selection;
pub use selector::SelectorList;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
