use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use vellum_engine::{
    CardData, CardKind, CardZone, ConversionRules, DocumentTree, MarkupOptions, Schema, to_markup,
    to_text,
};

fn roundtrip(markup: &str) -> String {
    let tree = DocumentTree::from_markup(markup).expect("canonical markup parses");
    to_markup(&tree, tree.root(), None, None, MarkupOptions::default())
}

#[rstest]
#[case::paragraph("<p>hello</p>")]
#[case::headings("<h1>Title</h1><p>Body</p>")]
#[case::marks("<p><strong>b</strong><em>i</em></p>")]
#[case::nested_blocks("<blockquote><p>quote</p></blockquote>")]
#[case::escaped_text("<p>a &lt; b &amp; c &gt; d</p>")]
#[case::list_with_start("<ol start=\"5\"><li>x</li></ol>")]
#[case::link("<p><a href=\"https://example.net/?a=1&amp;b=2\">link</a></p>")]
#[case::preformatted("<pre>  keep  this  </pre>")]
#[case::line_break("<p>a<br />b</p>")]
#[case::card("<card type=\"inline\" name=\"chip\" value=\"{&quot;v&quot;:1}\"></card>")]
#[case::styles("<p style=\"text-align: center;\">t</p>")]
fn canonical_markup_round_trips(#[case] markup: &str) {
    assert_eq!(roundtrip(markup), markup);
}

#[test]
fn unwrap_invariant_keeps_children_of_unknown_tags() {
    let tree = DocumentTree::from_markup("<p><widget>text</widget></p>").unwrap();
    let schema = Schema::standard();
    let markup = to_markup(
        &tree,
        tree.root(),
        Some(&schema),
        None,
        MarkupOptions::default(),
    );
    assert_eq!(markup, "<p>text</p>");
}

#[test]
fn unwrap_applies_repeatedly_to_nested_unknown_tags() {
    let tree = DocumentTree::from_markup(
        "<p>a<widget>b<gadget>c</gadget>d</widget>e</p>",
    )
    .unwrap();
    let schema = Schema::standard();
    let markup = to_markup(
        &tree,
        tree.root(),
        Some(&schema),
        None,
        MarkupOptions::default(),
    );
    assert_eq!(markup, "<p>abcde</p>");
}

#[rstest]
#[case(json!(null))]
#[case(json!({"src": "https://example.net/a.png"}))]
#[case(json!({"rows": [1, 2, 3], "title": "t"}))]
fn guard_zone_content_never_serializes(#[case] value: serde_json::Value) {
    let mut tree = DocumentTree::new();
    let card = tree.create_card(CardData::new("widget", CardKind::Inline, value));
    tree.append_child(tree.root(), card);
    for zone in [CardZone::Left, CardZone::Right] {
        let wrapper = tree.card_zone(card, zone).unwrap();
        let guard = tree.create_text("GUARD");
        tree.append_child(wrapper, guard);
    }
    let center = tree.card_zone(card, CardZone::Center).unwrap();
    let payload = tree.create_text("PAYLOAD");
    tree.append_child(center, payload);

    let markup = to_markup(&tree, tree.root(), None, None, MarkupOptions::default());
    assert!(!markup.contains("GUARD"));
    assert!(!markup.contains("PAYLOAD"));

    // Plain text with the payload requested still excludes the guards.
    let text = to_text(&tree, tree.root(), None, true);
    assert!(!text.contains("GUARD"));
    assert_eq!(text, "PAYLOAD");
}

#[test]
fn block_boundary_trim_against_preformatted_preservation() {
    assert_eq!(roundtrip("<p>  hello  </p>"), "<p>hello</p>");
    assert_eq!(roundtrip("<pre>  hello  </pre>"), "<pre>  hello  </pre>");
}

#[test]
fn conversion_rules_rewrite_legacy_shapes() {
    let tree = DocumentTree::from_markup("<div><b>x</b><i>y</i></div>").unwrap();
    let rules = ConversionRules::standard();
    let markup = to_markup(&tree, tree.root(), None, Some(&rules), MarkupOptions::default());
    assert_eq!(markup, "<p><strong>x</strong><em>y</em></p>");
}

#[test]
fn markup_snapshot_with_schema_filtering() {
    let tree = DocumentTree::from_markup(
        "<p onclick=\"x()\" data-id=\"1\" style=\"text-align: center; position: fixed\">t</p>",
    )
    .unwrap();
    let schema = Schema::standard();
    let markup = to_markup(
        &tree,
        tree.root(),
        Some(&schema),
        None,
        MarkupOptions::default(),
    );
    insta::assert_snapshot!(markup, @r#"<p data-id="1" style="text-align: center;">t</p>"#);
}

#[test]
fn card_markup_snapshot() {
    let mut tree = DocumentTree::new();
    let card = tree.create_card(CardData::new("poll", CardKind::Block, json!({"q": "?"})));
    tree.append_child(tree.root(), card);
    let markup = to_markup(&tree, tree.root(), None, None, MarkupOptions::default());
    insta::assert_snapshot!(markup, @r#"<card type="block" name="poll" value="{&quot;q&quot;:&quot;?&quot;}"></card>"#);
}

#[test]
fn plain_text_export_snapshot() {
    let tree = DocumentTree::from_markup(
        "<h2>Agenda</h2><ol start=\"2\"><li>alpha</li><li>beta</li></ol><p>done</p>",
    )
    .unwrap();
    let text = to_text(&tree, tree.root(), None, false);
    assert_eq!(text, "Agenda\n2. alpha\n3. beta\ndone");
}

#[test]
fn malformed_markup_fails_at_construction_not_in_the_walker() {
    assert!(DocumentTree::from_markup("<p><em>x</p>").is_err());
    assert!(DocumentTree::from_markup("<p>x").is_err());
    assert!(DocumentTree::from_markup("x</p>").is_err());
}
