//! vellum-engine: the content model of a rich-text editing engine.
//!
//! Two subsystems make up the core:
//!
//! - A bidirectional converter between a mutable document tree
//!   ([`dom::DocumentTree`]) and its canonical serialized markup, with
//!   schema-driven filtering ([`schema::Schema`]), shape-conversion rules
//!   ([`conversion::ConversionRules`]) and plain-text / render-tree outputs
//!   ([`serialize`]).
//! - A marker-based selection engine ([`selection::SelectionMarkers`]) that
//!   records cursor/anchor/focus positions as transient nodes inside the
//!   tree so a selection survives arbitrary structural mutation, and can
//!   slice the tree around the recorded markers.

pub mod conversion;
pub mod dom;
pub mod schema;
pub mod selection;
pub mod serialize;

// Re-export key types for easier usage
pub use conversion::{ConversionRule, ConversionRules, ConvertedNode};
pub use dom::{
    Boundary, CardData, CardKind, CardZone, DocumentTree, ElementData, MarkerKind, MarkupError,
    NodeId, NodeKind, Range,
};
pub use schema::{Schema, SchemaRule, SchemaType};
pub use selection::{
    CaptureState, DeferredResync, MarkerRemoval, PlatformProfile, SelectionMarkers, SlicePosition,
};
pub use serialize::{
    MarkupOptions, RenderNode, Visitor, WalkContext, to_markup, to_render_tree, to_text, walk_tree,
};
