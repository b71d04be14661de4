use pretty_assertions::assert_eq;
use serde_json::json;
use vellum_engine::{
    Boundary, CardData, CardKind, CardZone, DocumentTree, MarkupOptions, NodeId, PlatformProfile,
    Range, SelectionMarkers, SlicePosition, to_markup,
};

fn first_paragraph(tree: &DocumentTree) -> (NodeId, NodeId) {
    let p = tree.first_child(tree.root()).expect("document has content");
    let t = tree.first_child(p).expect("paragraph has text");
    (p, t)
}

#[test]
fn capture_restore_leaves_no_markers_and_preserves_content() {
    let mut tree = DocumentTree::from_markup("<p>hello world</p>").unwrap();
    let (_, t) = first_paragraph(&tree);
    let mut range = Range::new(Boundary::new(t, 3), Boundary::new(t, 8));
    let before = range.text_between(&tree, tree.root());
    assert_eq!(before, "lo wo");

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    assert!(tree.find_markers(tree.root()).is_empty());
    assert_eq!(range.text_between(&tree, tree.root()), before);
}

#[test]
fn selection_survives_structural_mutation() {
    let mut tree = DocumentTree::from_markup("<p>hello world</p>").unwrap();
    let (p, t) = first_paragraph(&tree);
    let mut range = Range::new(Boundary::new(t, 6), Boundary::new(t, 11));

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);

    // Mutate the tree around the captured selection: hoist the paragraph
    // into a fresh blockquote and add a sibling before it.
    let quote = tree.create_element("blockquote");
    tree.append_child(tree.root(), quote);
    tree.detach(p);
    tree.append_child(quote, p);
    let intro = tree.create_element("p");
    let intro_text = tree.create_text("intro");
    tree.append_child(intro, intro_text);
    tree.insert_before(quote, intro);

    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    assert!(tree.find_markers(tree.root()).is_empty());
    assert_eq!(range.text_between(&tree, tree.root()), "world");
}

#[test]
fn serialized_output_is_clean_after_a_cycle() {
    let markup = "<p>hello world</p>";
    let mut tree = DocumentTree::from_markup(markup).unwrap();
    let (_, t) = first_paragraph(&tree);
    let mut range = Range::new(Boundary::new(t, 0), Boundary::new(t, 5));

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    let out = to_markup(&tree, tree.root(), None, None, MarkupOptions::default());
    assert_eq!(out, markup);
}

/// Builds `<p>A</p><card/><p>B</p>` with an inline card.
fn tree_with_card(pseudo_block: bool) -> (DocumentTree, NodeId) {
    let mut tree = DocumentTree::new();
    let pa = tree.create_element("p");
    let ta = tree.create_text("A");
    tree.append_child(pa, ta);
    tree.append_child(tree.root(), pa);
    let mut data = CardData::new("widget", CardKind::Inline, json!({"n": 1}));
    data.pseudo_block = pseudo_block;
    let card = tree.create_card(data);
    tree.append_child(tree.root(), card);
    let pb = tree.create_element("p");
    let tb = tree.create_text("B");
    tree.append_child(pb, tb);
    tree.append_child(tree.root(), pb);
    (tree, card)
}

#[test]
fn collapsed_caret_before_card_enters_the_adjacent_guard_zone() {
    let (mut tree, card) = tree_with_card(false);
    // Immediately before the card, between the first paragraph and it.
    let mut range = Range::caret(Boundary::new(tree.root(), 1));

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    let left = tree.card_zone(card, CardZone::Left).unwrap();
    assert!(range.collapsed());
    assert_eq!(range.start.node, left);
    assert_eq!(range.start.offset, tree.node_length(left));
}

#[test]
fn collapsed_caret_after_card_enters_the_right_guard_zone() {
    let (mut tree, card) = tree_with_card(false);
    let mut range = Range::caret(Boundary::new(tree.root(), 2));

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    let right = tree.card_zone(card, CardZone::Right).unwrap();
    assert!(range.collapsed());
    assert_eq!(range.start.node, right);
    assert_eq!(range.start.offset, tree.node_length(right));
}

#[test]
fn pseudo_block_cards_keep_the_caret_beside_them() {
    let (mut tree, _) = tree_with_card(true);
    let mut range = Range::caret(Boundary::new(tree.root(), 1));

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    assert!(range.collapsed());
    assert_eq!(range.start, Boundary::new(tree.root(), 1));
}

#[test]
fn capture_snaps_boundaries_out_of_guard_zones() {
    let (mut tree, card) = tree_with_card(false);
    let left = tree.card_zone(card, CardZone::Left).unwrap();
    let guard_text = tree.create_text("guard");
    tree.append_child(left, guard_text);

    // Start inside the left guard, end inside the second paragraph.
    let pb = tree.children(tree.root())[2];
    let tb = tree.first_child(pb).unwrap();
    let mut range = Range::new(Boundary::new(guard_text, 2), Boundary::new(tb, 1));

    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);

    // The anchor landed before the card, not inside the guard zone.
    let anchor = tree.prev_sibling(card).expect("anchor before card");
    assert!(tree.find_markers(left).is_empty());
    assert_eq!(
        tree.marker_kind(anchor),
        Some(vellum_engine::MarkerKind::Anchor)
    );
}

fn captured_abcd() -> (DocumentTree, SelectionMarkers, NodeId) {
    let mut tree = DocumentTree::from_markup("<p>abcd</p>").unwrap();
    let (p, t) = first_paragraph(&tree);
    // Anchor before 'c', focus after 'c'.
    let mut range = Range::new(Boundary::new(t, 2), Boundary::new(t, 3));
    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    (tree, selection, p)
}

#[test]
fn extract_center_yields_exactly_the_selected_content() {
    let (mut tree, selection, p) = captured_abcd();
    let slice = selection.extract(&mut tree, p, SlicePosition::Center, true, &|_, _| true);
    assert_eq!(tree.text_content(slice), "c");
}

#[test]
fn extract_left_yields_content_before_the_selection() {
    let (mut tree, selection, p) = captured_abcd();
    let slice = selection.extract(&mut tree, p, SlicePosition::Left, true, &|_, _| true);
    assert_eq!(tree.text_content(slice), "ab");
}

#[test]
fn extract_right_yields_content_after_the_selection() {
    let (mut tree, selection, p) = captured_abcd();
    let slice = selection.extract(&mut tree, p, SlicePosition::Right, true, &|_, _| true);
    assert_eq!(tree.text_content(slice), "d");
}

#[test]
fn extract_on_a_clone_leaves_the_live_tree_alone() {
    let (mut tree, selection, p) = captured_abcd();
    let _ = selection.extract(&mut tree, p, SlicePosition::Center, true, &|_, _| true);
    assert_eq!(tree.text_content(p), "abcd");
    // The live markers are still in place for a later restore.
    assert_eq!(tree.find_markers(p).len(), 2);
}

#[test]
fn exclusion_predicate_gates_deletion() {
    let (mut tree, selection, p) = captured_abcd();
    let slice = selection.extract(&mut tree, p, SlicePosition::Left, true, &|_, _| false);
    // Only the marker vanishes; vetoed content stays.
    assert_eq!(tree.text_content(slice), "abcd");
    assert!(tree.find_markers(slice).len() < 2);
}

#[test]
fn empty_block_repair_is_idempotent() {
    let mut tree = DocumentTree::from_markup("<p></p>").unwrap();
    let p = tree.first_child(tree.root()).unwrap();

    for _ in 0..2 {
        let mut selection = SelectionMarkers::new();
        let mut range = Range::caret(Boundary::new(p, 0));
        selection.capture(&mut tree, &mut range);
        selection.restore(&mut tree, &mut range, &PlatformProfile::default());

        let children = tree.children(p);
        assert_eq!(children.len(), 1);
        assert_eq!(tree.tag(children[0]), Some("br"));
    }
}

#[test]
fn two_marker_restore_repairs_both_emptied_blocks() {
    let mut tree = DocumentTree::from_markup("<p></p><p>y</p>").unwrap();
    let p1 = tree.children(tree.root())[0];
    let p2 = tree.children(tree.root())[1];
    let t2 = tree.first_child(p2).unwrap();

    let mut range = Range::new(Boundary::new(p1, 0), Boundary::new(t2, 1));
    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);
    selection.restore(&mut tree, &mut range, &PlatformProfile::default());

    assert!(tree.find_markers(tree.root()).is_empty());
    let p1_children = tree.children(p1);
    assert_eq!(p1_children.len(), 1);
    assert_eq!(tree.tag(p1_children[0]), Some("br"));
    assert_eq!(tree.text_content(p2), "y");
}

#[test]
fn restored_markup_parses_markers_back_to_the_same_selection() {
    // Full round trip: capture, serialize with expanded markers, re-read,
    // and the re-read tree carries the same marker layout.
    let mut tree = DocumentTree::from_markup("<p>abcd</p>").unwrap();
    let (_, t) = first_paragraph(&tree);
    let mut range = Range::new(Boundary::new(t, 1), Boundary::new(t, 3));
    let mut selection = SelectionMarkers::new();
    selection.capture(&mut tree, &mut range);

    let with_markers = to_markup(
        &tree,
        tree.root(),
        None,
        None,
        MarkupOptions {
            expand_markers: true,
            ..Default::default()
        },
    );
    assert_eq!(with_markers, "<p>a<anchor />bc<focus />d</p>");

    let reread = DocumentTree::from_markup(&with_markers).unwrap();
    assert_eq!(reread.find_markers(reread.root()).len(), 2);

    // And the stripped form is the canonical document.
    assert_eq!(
        SelectionMarkers::strip_marker_tags(&with_markers),
        "<p>abcd</p>"
    );
}
