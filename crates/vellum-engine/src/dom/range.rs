use super::node::NodeKind;
use super::tree::{DocumentTree, NodeId};

/// One end of a range. For text nodes the offset counts characters; for
/// every other node it counts children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection range over the document tree.
///
/// This is the range capability the selection engine is written against.
/// It mirrors the host-platform contract: boundary accessors, collapsing,
/// boundary placement relative to nodes, node insertion with text
/// splitting, and content selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A collapsed range at a single boundary.
    pub fn caret(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    /// Deepest node containing both boundaries, or `None` when they live in
    /// unrelated (detached) subtrees.
    pub fn common_ancestor(&self, tree: &DocumentTree) -> Option<NodeId> {
        let mut start_chain = vec![self.start.node];
        start_chain.extend(tree.ancestors(self.start.node));
        let mut node = Some(self.end.node);
        while let Some(candidate) = node {
            if start_chain.contains(&candidate) {
                return Some(candidate);
            }
            node = tree.parent(candidate);
        }
        None
    }

    pub fn set_start_before(&mut self, tree: &DocumentTree, node: NodeId) {
        if let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.start = Boundary::new(parent, index);
        }
    }

    pub fn set_start_after(&mut self, tree: &DocumentTree, node: NodeId) {
        if let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.start = Boundary::new(parent, index + 1);
        }
    }

    pub fn set_end_before(&mut self, tree: &DocumentTree, node: NodeId) {
        if let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.end = Boundary::new(parent, index);
        }
    }

    pub fn set_end_after(&mut self, tree: &DocumentTree, node: NodeId) {
        if let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.end = Boundary::new(parent, index + 1);
        }
    }

    /// Select the contents of a node: start at its first position, end at
    /// its last.
    pub fn select_contents(&mut self, tree: &DocumentTree, node: NodeId) {
        self.start = Boundary::new(node, 0);
        self.end = Boundary::new(node, tree.node_length(node));
    }

    /// Insert a detached node at the start boundary, splitting a text node
    /// when the boundary falls inside one. Afterwards the range start sits
    /// immediately before the inserted node; a collapsed range stays
    /// collapsed there.
    pub fn insert_node(&mut self, tree: &mut DocumentTree, node: NodeId) {
        let was_collapsed = self.collapsed();
        let at = self.start;
        if matches!(tree.kind(at.node), NodeKind::Text(_)) {
            let text_len = tree.node_length(at.node);
            if at.offset == 0 {
                tree.insert_before(at.node, node);
            } else if at.offset >= text_len {
                tree.insert_after(at.node, node);
            } else {
                tree.split_text(at.node, at.offset);
                tree.insert_after(at.node, node);
            }
        } else {
            tree.insert_child_at(at.node, at.offset, node);
        }
        self.set_start_before(tree, node);
        if was_collapsed {
            self.end = self.start;
        }
    }

    /// Concatenated text between the two boundaries, in document order.
    /// Boundaries are interpreted against the current tree shape.
    pub fn text_between(&self, tree: &DocumentTree, scope: NodeId) -> String {
        let start_path = boundary_path(tree, self.start);
        let end_path = boundary_path(tree, self.end);
        let mut out = String::new();
        for node in tree.pre_order(scope) {
            let NodeKind::Text(content) = tree.kind(node) else {
                continue;
            };
            let chars: Vec<char> = content.chars().collect();
            let from = if node == self.start.node {
                self.start.offset.min(chars.len())
            } else {
                0
            };
            let to = if node == self.end.node {
                self.end.offset.min(chars.len())
            } else {
                chars.len()
            };
            if from >= to {
                continue;
            }
            if boundary_path(tree, Boundary::new(node, from)) < start_path
                || boundary_path(tree, Boundary::new(node, to)) > end_path
            {
                continue;
            }
            out.extend(&chars[from..to]);
        }
        out
    }
}

/// Position of a boundary as a root-relative index path, comparable
/// lexicographically to order boundaries in document order.
fn boundary_path(tree: &DocumentTree, boundary: Boundary) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = boundary.node;
    while let Some(parent) = tree.parent(node) {
        if let Some(index) = tree.index_in_parent(node) {
            path.push(index);
        }
        node = parent;
    }
    path.reverse();
    path.push(boundary.offset);
    path
}
