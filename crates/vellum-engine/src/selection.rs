//! Marker-based selection capture and restore.
//!
//! Selection endpoints are recorded as transient marker nodes inserted into
//! the document tree itself, so the selection survives arbitrary structural
//! mutation without help from a host range API. A cycle runs
//! `Empty → Captured → Restored`; markers never outlive one cycle.

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{Boundary, CardZone, DocumentTree, MarkerKind, NodeId, Range};

/// Where a capture/restore cycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Empty,
    Captured,
    Restored,
}

/// Which order marker removal and text-run normalization happen in. The
/// right order differs between host rendering engines (the wrong one can
/// split text nodes under the caret), so it is a capability choice rather
/// than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRemoval {
    NormalizeThenRemove,
    RemoveThenNormalize,
}

/// Host-platform capability flags consumed by [`SelectionMarkers::restore`].
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub marker_removal: MarkerRemoval,
    /// Re-apply the computed range to the host selection after restore.
    pub resync_selection: bool,
    /// Hand the resync back as a deferred task to run one scheduling tick
    /// later instead of immediately.
    pub defer_resync: bool,
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self {
            marker_removal: MarkerRemoval::RemoveThenNormalize,
            resync_selection: false,
            defer_resync: false,
        }
    }
}

impl PlatformProfile {
    /// Engines that split text nodes when removal precedes normalization.
    pub fn normalize_first() -> Self {
        Self {
            marker_removal: MarkerRemoval::NormalizeThenRemove,
            ..Self::default()
        }
    }

    /// Engines whose native selection desynchronizes after marker removal
    /// and needs the computed range pushed back on the next tick.
    pub fn deferred_resync() -> Self {
        Self {
            resync_selection: true,
            defer_resync: true,
            ..Self::default()
        }
    }
}

/// A cancellable single-shot task carrying the range the host should
/// re-apply to its native selection.
#[derive(Debug)]
pub struct DeferredResync {
    range: Option<Range>,
    deferred: bool,
}

impl DeferredResync {
    fn new(range: Range, deferred: bool) -> Self {
        Self {
            range: Some(range),
            deferred,
        }
    }

    /// Take the range to apply. Yields nothing after `cancel` or a prior
    /// `fire`.
    pub fn fire(&mut self) -> Option<Range> {
        self.range.take()
    }

    pub fn cancel(&mut self) {
        self.range = None;
    }

    pub fn is_pending(&self) -> bool {
        self.range.is_some()
    }

    /// Whether the host should wait one scheduling tick before firing.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }
}

/// Which slice of the captured selection [`SelectionMarkers::extract`]
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlicePosition {
    Left,
    Center,
    Right,
}

/// The marker engine for one selection capture/restore cycle.
#[derive(Debug)]
pub struct SelectionMarkers {
    state: CaptureState,
    anchor: Option<NodeId>,
    focus: Option<NodeId>,
}

impl SelectionMarkers {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Empty,
            anchor: None,
            focus: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn has_markers(&self) -> bool {
        self.anchor.is_some() && self.focus.is_some()
    }

    /// Remove serialized marker tags from a markup string.
    pub fn strip_marker_tags(value: &str) -> String {
        static MARKER_TAGS: OnceLock<Regex> = OnceLock::new();
        let re = MARKER_TAGS.get_or_init(|| {
            Regex::new(r"(?i)<(?:anchor|focus|cursor)\s*/>").expect("Invalid marker tag regex")
        });
        re.replace_all(value, "").into_owned()
    }

    /// Record the range as marker nodes. A no-op when the range's common
    /// ancestor is outside the editing root. Stray markers from earlier
    /// cycles are removed first; boundaries inside a non-pseudo-block
    /// card's guard zone snap to just outside the card.
    pub fn capture(&mut self, tree: &mut DocumentTree, range: &mut Range) {
        let Some(ancestor) = range.common_ancestor(tree) else {
            return;
        };
        if !tree.in_editor(ancestor) {
            return;
        }
        for marker in tree.find_markers(tree.root()) {
            tree.detach(marker);
        }
        self.anchor = None;
        self.focus = None;

        snap_guard_boundary(tree, range, true);
        if range.start.node != range.end.node {
            snap_guard_boundary(tree, range, false);
        }

        if range.collapsed() {
            let cursor = tree.create_marker(MarkerKind::Cursor);
            range.insert_node(tree, cursor);
            self.anchor = Some(cursor);
            self.focus = Some(cursor);
            self.state = CaptureState::Captured;
            return;
        }

        // The focus goes in first so the anchor insertion cannot displace
        // the end boundary.
        let mut end_range = range.clone();
        end_range.collapse(false);
        let focus = tree.create_marker(MarkerKind::Focus);
        end_range.insert_node(tree, focus);

        let mut start_range = range.clone();
        start_range.collapse(true);
        let anchor = tree.create_marker(MarkerKind::Anchor);
        start_range.insert_node(tree, anchor);

        range.set_start_after(tree, anchor);
        range.set_end_before(tree, focus);
        self.anchor = Some(anchor);
        self.focus = Some(focus);
        self.state = CaptureState::Captured;
    }

    /// Convert the markers back into a live range and remove them. A no-op
    /// unless a capture is in effect. Returns a resync task when the
    /// platform profile asks for one (two-marker restores only).
    pub fn restore(
        &mut self,
        tree: &mut DocumentTree,
        range: &mut Range,
        profile: &PlatformProfile,
    ) -> Option<DeferredResync> {
        let (Some(anchor), Some(focus)) = (self.anchor, self.focus) else {
            return None;
        };

        if anchor == focus {
            restore_cursor(tree, range, profile, anchor);
            self.finish_cycle();
            return None;
        }

        if let Some(boundary) = remove_marker(tree, anchor, profile) {
            range.start = boundary;
        }
        if let Some(boundary) = remove_marker(tree, focus, profile) {
            range.end = boundary;
        }
        self.finish_cycle();

        if profile.resync_selection {
            Some(DeferredResync::new(range.clone(), profile.defer_resync))
        } else {
            None
        }
    }

    /// Slice the subtree around the captured markers. `Left` keeps what
    /// precedes the selection, `Right` what follows it, `Center` exactly
    /// the content in between. Runs on a deep clone unless `is_clone` is
    /// false; the exclusion predicate gates every deletion. Without a
    /// prior capture the (cloned) subtree comes back unchanged. Does not
    /// advance the capture cycle.
    pub fn extract(
        &self,
        tree: &mut DocumentTree,
        source: NodeId,
        position: SlicePosition,
        is_clone: bool,
        exclude: &dyn Fn(&DocumentTree, NodeId) -> bool,
    ) -> NodeId {
        let scope = if is_clone {
            tree.clone_subtree(source)
        } else {
            source
        };
        let (Some(anchor), Some(focus)) = (self.anchor, self.focus) else {
            return scope;
        };

        if matches!(position, SlicePosition::Left | SlicePosition::Center) {
            let divider = if position == SlicePosition::Left {
                anchor
            } else {
                focus
            };
            if let Some(kind) = tree.marker_kind(divider) {
                trim_side(tree, scope, kind, exclude, TrimSide::After);
            }
        }
        if matches!(position, SlicePosition::Right | SlicePosition::Center) {
            let divider = if position == SlicePosition::Right {
                focus
            } else {
                anchor
            };
            if let Some(kind) = tree.marker_kind(divider) {
                trim_side(tree, scope, kind, exclude, TrimSide::Before);
            }
        }
        scope
    }

    fn finish_cycle(&mut self) {
        self.anchor = None;
        self.focus = None;
        self.state = CaptureState::Restored;
    }
}

impl Default for SelectionMarkers {
    fn default() -> Self {
        Self::new()
    }
}

/// Move a range boundary out of a card guard zone: left guard snaps to
/// just before the card, right guard to just after. Pseudo-block cards
/// keep their boundaries.
fn snap_guard_boundary(tree: &DocumentTree, range: &mut Range, at_start: bool) {
    let node = if at_start {
        range.start.node
    } else {
        range.end.node
    };
    let Some(card) = tree.closest_card(node) else {
        return;
    };
    if tree.is_pseudo_block_card(card) {
        return;
    }
    let Some(zone_node) = tree.closest_zone(node) else {
        return;
    };
    if tree.parent(zone_node) != Some(card) {
        return;
    }
    match tree.zone(zone_node) {
        Some(CardZone::Left) => {
            if at_start {
                range.set_start_before(tree, card);
            } else {
                range.set_end_before(tree, card);
            }
        }
        Some(CardZone::Right) => {
            if at_start {
                range.set_start_after(tree, card);
            } else {
                range.set_end_after(tree, card);
            }
        }
        _ => {}
    }
}

/// Single-cursor restore: the caret lands where the marker was, or enters
/// the guard zone of an adjacent non-pseudo-block card.
fn restore_cursor(
    tree: &mut DocumentTree,
    range: &mut Range,
    profile: &PlatformProfile,
    cursor: NodeId,
) {
    let Some(parent) = tree.parent(cursor) else {
        return;
    };
    tree.remove_zero_width_space(parent);
    // Settle pre-existing adjacent runs while the marker still separates
    // its own neighbours; keeps the computed boundary stable through the
    // removal below.
    tree.normalize(parent);

    let mut card_position: Option<Boundary> = None;
    if let Some(prev) = tree.prev_sibling(cursor)
        && tree.is_card(prev)
        && !tree.is_pseudo_block_card(prev)
    {
        if let Some(right) = tree.card_zone(prev, CardZone::Right) {
            card_position = Some(Boundary::new(right, tree.node_length(right)));
        }
    } else if let Some(next) = tree.next_sibling(cursor)
        && tree.is_card(next)
        && !tree.is_pseudo_block_card(next)
        && let Some(left) = tree.card_zone(next, CardZone::Left)
    {
        card_position = Some(Boundary::new(left, tree.node_length(left)));
    }

    let boundary = card_position.or_else(|| boundary_at(tree, cursor));

    match profile.marker_removal {
        MarkerRemoval::NormalizeThenRemove => {
            tree.normalize(parent);
            tree.detach(cursor);
        }
        MarkerRemoval::RemoveThenNormalize => {
            tree.detach(cursor);
            tree.normalize(parent);
        }
    }
    repair_empty_block(tree, parent);

    if let Some(boundary) = boundary {
        *range = Range::caret(boundary);
    }
}

/// Remove one marker and return the boundary where it sat.
fn remove_marker(
    tree: &mut DocumentTree,
    marker: NodeId,
    profile: &PlatformProfile,
) -> Option<Boundary> {
    let parent = tree.parent(marker)?;
    tree.remove_zero_width_space(parent);
    tree.normalize(parent);
    let boundary = boundary_at(tree, marker);
    match profile.marker_removal {
        MarkerRemoval::NormalizeThenRemove => {
            tree.normalize(parent);
            tree.detach(marker);
        }
        MarkerRemoval::RemoveThenNormalize => {
            tree.detach(marker);
            tree.normalize(parent);
        }
    }
    repair_empty_block(tree, parent);
    boundary
}

/// The boundary immediately before a marker, expressed in a form that
/// stays valid once the marker is removed and its neighbours merge.
fn boundary_at(tree: &DocumentTree, marker: NodeId) -> Option<Boundary> {
    if let Some(prev) = tree.prev_sibling(marker)
        && let Some(text) = tree.text(prev)
    {
        return Some(Boundary::new(prev, text.chars().count()));
    }
    let parent = tree.parent(marker)?;
    let index = tree.index_in_parent(marker)?;
    Some(Boundary::new(parent, index))
}

/// A block element emptied by marker cleanup gets a placeholder line break
/// so it stays editable.
fn repair_empty_block(tree: &mut DocumentTree, parent: NodeId) {
    if tree.element(parent).is_some() && tree.is_block(parent) && tree.children(parent).is_empty() {
        let br = tree.create_element("br");
        tree.append_child(parent, br);
    }
}

#[derive(Clone, Copy)]
enum TrimSide {
    After,
    Before,
}

fn trim_side(
    tree: &mut DocumentTree,
    scope: NodeId,
    kind: MarkerKind,
    exclude: &dyn Fn(&DocumentTree, NodeId) -> bool,
    side: TrimSide,
) {
    let Some(marker) = tree.find_marker(scope, kind) else {
        return;
    };
    // The marker's ancestors hold the content being kept; they are never
    // deleted even though they precede/follow the marker in the walk.
    let spine: Vec<NodeId> = tree.ancestors(marker).collect();

    let mut order = tree.pre_order(scope);
    if matches!(side, TrimSide::Before) {
        order.reverse();
    }
    let mut deleting = false;
    for node in order {
        if node == marker {
            let parent = tree.parent(marker);
            tree.detach(marker);
            if let Some(parent) = parent {
                repair_empty_block(tree, parent);
            }
            deleting = true;
            continue;
        }
        if !deleting || node == scope || spine.contains(&node) {
            continue;
        }
        if !tree.is_attached_under(node, scope) {
            continue;
        }
        if exclude(tree, node) {
            tree.detach(node);
        }
    }
}
