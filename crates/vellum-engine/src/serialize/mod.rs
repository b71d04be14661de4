//! Depth-first tree walking and the serializers built on top of it.
//!
//! [`walk_tree`] drives a [`Visitor`] over a subtree, applying conversion
//! rules, skipping card guard zones, resolving markers to their reserved
//! tag names, and normalizing text whitespace. The markup, plain-text and
//! render-tree serializers are visitors over the same traversal.

mod markup;
mod render;
mod style;
mod text;

pub use markup::{MarkupOptions, to_markup};
pub use render::{RenderNode, to_render_tree};
pub use style::{escape, unescape};
pub use text::to_text;

use crate::conversion::{AttrMap, ConversionRules, ConvertedNode, StyleMap};
use crate::dom::{CardData, CardZone, DocumentTree, NodeId, NodeKind, is_void_tag};

/// Per-node traversal context handed to visitor callbacks.
#[derive(Debug, Clone, Copy)]
pub struct WalkContext {
    pub node: NodeId,
    /// How many preformatted elements enclose this node. Threaded through
    /// the recursion so the walker stays reentrant.
    pub preformatted_depth: usize,
}

/// Traversal hooks. `open` may veto a node by returning `false`, which
/// skips the whole subtree (unlike the schema unwrap policy, which keeps
/// children). Void tags and markers receive no `close` call.
pub trait Visitor {
    fn begin(&mut self, _tree: &DocumentTree, _root: NodeId) {}
    fn open(
        &mut self,
        _tree: &DocumentTree,
        _cx: WalkContext,
        _tag: &str,
        _attrs: &AttrMap,
        _styles: &StyleMap,
    ) -> bool {
        true
    }
    fn text(&mut self, _tree: &DocumentTree, _cx: WalkContext, _text: &str) {}
    fn close(
        &mut self,
        _tree: &DocumentTree,
        _cx: WalkContext,
        _tag: &str,
        _attrs: &AttrMap,
        _styles: &StyleMap,
    ) {
    }
    fn finish(&mut self, _tree: &DocumentTree, _root: NodeId) {}
}

/// Walk the children of `root` depth-first. Guard zones are never entered;
/// card payloads only with `include_card`.
pub fn walk_tree(
    tree: &DocumentTree,
    root: NodeId,
    rules: Option<&ConversionRules>,
    visitor: &mut dyn Visitor,
    include_card: bool,
) {
    visitor.begin(tree, root);
    walk_children(tree, root, rules, visitor, include_card, 0);
    visitor.finish(tree, root);
}

fn walk_children(
    tree: &DocumentTree,
    parent: NodeId,
    rules: Option<&ConversionRules>,
    visitor: &mut dyn Visitor,
    include_card: bool,
    depth: usize,
) {
    for &child in tree.children(parent) {
        match tree.kind(child) {
            NodeKind::Element(el) => {
                match el.zone {
                    Some(CardZone::Left) | Some(CardZone::Right) => continue,
                    Some(CardZone::Center) => {
                        // The payload wrapper itself has no markup identity.
                        walk_children(tree, child, rules, visitor, include_card, depth);
                        continue;
                    }
                    None => {}
                }
                let converted = convert(rules, &el.tag, el.styles.clone(), el.attrs.clone());
                let cx = WalkContext {
                    node: child,
                    preformatted_depth: depth,
                };
                if !visitor.open(tree, cx, &converted.tag, &converted.attrs, &converted.styles) {
                    continue;
                }
                let child_depth = depth + usize::from(converted.tag == "pre");
                walk_children(tree, child, rules, visitor, include_card, child_depth);
                if !is_void_tag(&converted.tag) {
                    visitor.close(tree, cx, &converted.tag, &converted.attrs, &converted.styles);
                }
            }
            NodeKind::Text(content) => {
                let text = normalize_text(tree, child, content, depth);
                let cx = WalkContext {
                    node: child,
                    preformatted_depth: depth,
                };
                visitor.text(tree, cx, &text);
            }
            NodeKind::Card(card) => {
                let attrs = card_attrs(card);
                let styles = StyleMap::new();
                let cx = WalkContext {
                    node: child,
                    preformatted_depth: depth,
                };
                if !visitor.open(tree, cx, "card", &attrs, &styles) {
                    continue;
                }
                if include_card
                    && let Some(center) = tree.card_zone(child, CardZone::Center)
                {
                    walk_children(tree, center, rules, visitor, include_card, depth);
                }
                visitor.close(tree, cx, "card", &attrs, &styles);
            }
            NodeKind::Marker(kind) => {
                let cx = WalkContext {
                    node: child,
                    preformatted_depth: depth,
                };
                visitor.open(tree, cx, kind.tag_name(), &AttrMap::new(), &StyleMap::new());
            }
        }
    }
}

fn convert(
    rules: Option<&ConversionRules>,
    tag: &str,
    styles: StyleMap,
    attrs: AttrMap,
) -> ConvertedNode {
    match rules {
        Some(rules) => rules.apply(tag, styles, attrs),
        None => ConvertedNode {
            tag: tag.to_string(),
            attrs,
            styles,
        },
    }
}

fn card_attrs(card: &CardData) -> AttrMap {
    let mut attrs = vec![
        ("type".to_string(), card.kind.as_str().to_string()),
        ("name".to_string(), card.name.clone()),
    ];
    if !card.value.is_null() {
        attrs.push(("value".to_string(), card.value.to_string()));
    }
    attrs
}

/// Whitespace rules applied to every text node at walk level:
/// zero-width spaces vanish; outside preformatted context the first/last
/// text child of a block loses boundary spaces and newlines; all-whitespace
/// text directly between two block siblings collapses to nothing.
fn normalize_text(tree: &DocumentTree, node: NodeId, content: &str, depth: usize) -> String {
    let mut text = if content.contains('\u{200B}') {
        content.replace('\u{200B}', "")
    } else {
        content.to_string()
    };
    let parent_is_block = tree.parent(node).is_some_and(|p| tree.is_block(p));
    if depth == 0 && parent_is_block {
        if tree.prev_sibling(node).is_none() {
            text = text.trim_start_matches([' ', '\n']).to_string();
        }
        if tree.next_sibling(node).is_none() {
            text = text.trim_end_matches([' ', '\n']).to_string();
        }
    }
    let between_blocks = tree.prev_sibling(node).is_some_and(|s| tree.is_block(s))
        && tree.next_sibling(node).is_some_and(|s| tree.is_block(s));
    if between_blocks && text.trim().is_empty() {
        text.clear();
    }
    text
}
