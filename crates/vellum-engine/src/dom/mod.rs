//! The document tree: node model, arena, ranges, and the markup reader.

pub mod node;
pub mod range;
pub mod reader;
pub mod tree;

pub use node::{
    CardData, CardKind, CardZone, ElementData, MarkerKind, NodeKind, is_block_tag, is_void_tag,
};
pub use range::{Boundary, Range};
pub use reader::{MarkupError, parse_fragment};
pub use tree::{DocumentTree, NodeId};
