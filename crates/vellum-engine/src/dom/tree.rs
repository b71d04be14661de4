use super::node::{
    CardData, CardZone, ElementData, MarkerKind, NodeKind, is_block_tag, is_void_tag,
};

/// Handle into a [`DocumentTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Debug)]
struct NodeSlot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The document tree: an arena of nodes with one editing-root element.
///
/// Nodes are owned by the arena; structure is expressed through parent and
/// ordered child links. Detached nodes keep their subtree and can be
/// re-inserted. Slots are not reclaimed within a tree's lifetime, which is
/// bounded by a single document.
#[derive(Debug)]
pub struct DocumentTree {
    nodes: Vec<NodeSlot>,
    root: NodeId,
}

impl DocumentTree {
    /// Create an empty tree with an editing-root wrapper element.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.alloc(NodeKind::Element(ElementData::new("div")));
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn slot(&self, id: NodeId) -> &NodeSlot {
        &self.nodes[id.0 as usize]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut NodeSlot {
        &mut self.nodes[id.0 as usize]
    }

    // ---- node creation ----

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        self.alloc(NodeKind::Element(data))
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(content.into()))
    }

    pub fn create_marker(&mut self, kind: MarkerKind) -> NodeId {
        self.alloc(NodeKind::Marker(kind))
    }

    /// Create a card node with its three zone wrappers (left guard, center
    /// payload, right guard).
    pub fn create_card(&mut self, data: CardData) -> NodeId {
        let card = self.alloc(NodeKind::Card(data));
        for zone in [CardZone::Left, CardZone::Center, CardZone::Right] {
            let mut wrapper = ElementData::new("span");
            wrapper.zone = Some(zone);
            let id = self.alloc(NodeKind::Element(wrapper));
            self.append_child(card, id);
        }
        card
    }

    // ---- access ----

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.slot(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.slot_mut(id).kind
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.kind_mut(id) {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn card(&self, id: NodeId) -> Option<&CardData> {
        match self.kind(id) {
            NodeKind::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn card_mut(&mut self, id: NodeId) -> Option<&mut CardData> {
        match self.kind_mut(id) {
            NodeKind::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn marker_kind(&self, id: NodeId) -> Option<MarkerKind> {
        match self.kind(id) {
            NodeKind::Marker(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Number of characters in a text node, or child count otherwise.
    /// This is the unit a [`super::Boundary`] offset is expressed in.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text(s) => s.chars().count(),
            _ => self.slot(id).children.len(),
        }
    }

    // ---- structure ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).children.last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.slot(parent).children.iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        if index == 0 {
            None
        } else {
            Some(self.slot(parent).children[index - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.slot(parent).children.get(index + 1).copied()
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&n| self.parent(n))
    }

    /// True when `id` is `ancestor` or sits below it.
    pub fn is_attached_under(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// True when the node lives under the editing root.
    pub fn in_editor(&self, id: NodeId) -> bool {
        self.is_attached_under(id, self.root)
    }

    /// First self-or-ancestor matching the predicate.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        if pred(self, id) {
            return Some(id);
        }
        self.ancestors(id).find(|&a| pred(self, a))
    }

    // ---- mutation ----

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.slot(child).parent.is_none());
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    /// Insert a detached node at a child index of `parent`.
    pub fn insert_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.slot(child).parent.is_none());
        let index = index.min(self.slot(parent).children.len());
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.insert(index, child);
    }

    /// Insert a detached node immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) =
            (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child_at(parent, index, node);
        }
    }

    /// Insert a detached node immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) =
            (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child_at(parent, index + 1, node);
        }
    }

    /// Remove a node (with its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.slot_mut(parent).children.retain(|&c| c != id);
            self.slot_mut(id).parent = None;
        }
    }

    /// Split a text node at a character offset; the suffix becomes a new
    /// sibling text node inserted right after, which is returned.
    pub fn split_text(&mut self, id: NodeId, char_offset: usize) -> Option<NodeId> {
        let byte_offset = {
            let content = self.text(id)?;
            content
                .char_indices()
                .nth(char_offset)
                .map(|(i, _)| i)
                .unwrap_or(content.len())
        };
        let suffix = {
            let NodeKind::Text(content) = self.kind_mut(id) else {
                return None;
            };
            content.split_off(byte_offset)
        };
        let suffix_node = self.create_text(suffix);
        self.insert_after(id, suffix_node);
        Some(suffix_node)
    }

    /// Deep-copy a subtree into the arena; the copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let kind = self.slot(id).kind.clone();
        let copy = self.alloc(kind);
        let children = self.slot(id).children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Merge adjacent text children and drop empty text children of `parent`.
    pub fn normalize(&mut self, parent: NodeId) {
        let children = self.slot(parent).children.clone();
        let mut prev_text: Option<NodeId> = None;
        for child in children {
            let content = match self.kind(child) {
                NodeKind::Text(s) => s.clone(),
                _ => {
                    prev_text = None;
                    continue;
                }
            };
            if content.is_empty() {
                // Removing an empty run leaves its neighbours adjacent, so
                // the merge target carries over.
                self.detach(child);
                continue;
            }
            match prev_text {
                Some(target) => {
                    if let NodeKind::Text(s) = self.kind_mut(target) {
                        s.push_str(&content);
                    }
                    self.detach(child);
                }
                None => prev_text = Some(child),
            }
        }
    }

    /// Strip zero-width spaces from the text children of `parent`.
    pub fn remove_zero_width_space(&mut self, parent: NodeId) {
        let children = self.slot(parent).children.clone();
        for child in children {
            if let NodeKind::Text(s) = self.kind_mut(child)
                && s.contains('\u{200B}')
            {
                *s = s.replace('\u{200B}', "");
            }
        }
    }

    // ---- traversal ----

    /// Pre-order traversal of the subtree rooted at `root`, root included.
    pub fn pre_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.slot(id).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Concatenated content of all text descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.pre_order(id) {
            if let NodeKind::Text(s) = self.kind(node) {
                out.push_str(s);
            }
        }
        out
    }

    pub fn find_markers(&self, scope: NodeId) -> Vec<NodeId> {
        self.pre_order(scope)
            .into_iter()
            .filter(|&n| matches!(self.kind(n), NodeKind::Marker(_)))
            .collect()
    }

    pub fn find_marker(&self, scope: NodeId, kind: MarkerKind) -> Option<NodeId> {
        self.pre_order(scope)
            .into_iter()
            .find(|&n| self.marker_kind(n) == Some(kind))
    }

    // ---- classification ----

    pub fn is_block(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Element(el) => el.zone.is_none() && is_block_tag(&el.tag),
            NodeKind::Card(card) => card.kind == super::node::CardKind::Block,
            _ => false,
        }
    }

    pub fn is_void_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element(el) if is_void_tag(&el.tag))
    }

    pub fn is_card(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Card(_))
    }

    pub fn is_pseudo_block_card(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Card(card) if card.pseudo_block)
    }

    /// The card zone wrapper a node sits in, if any.
    pub fn closest_zone(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, |tree, n| {
            matches!(tree.kind(n), NodeKind::Element(el) if el.zone.is_some())
        })
    }

    pub fn zone(&self, id: NodeId) -> Option<CardZone> {
        match self.kind(id) {
            NodeKind::Element(el) => el.zone,
            _ => None,
        }
    }

    /// The card a node sits in (or is), if any.
    pub fn closest_card(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, |tree, n| tree.is_card(n))
    }

    /// A card's zone wrapper node.
    pub fn card_zone(&self, card: NodeId, zone: CardZone) -> Option<NodeId> {
        self.children(card)
            .iter()
            .copied()
            .find(|&c| self.zone(c) == Some(zone))
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
