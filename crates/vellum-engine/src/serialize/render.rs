use std::collections::HashSet;

use serde::Serialize;

use super::{Visitor, WalkContext, walk_tree};
use crate::conversion::{AttrMap, ConversionRules, StyleMap};
use crate::dom::{DocumentTree, MarkerKind, NodeId, is_void_tag};
use crate::schema::Schema;

/// Fixed text-run presentation applied to the render wrapper and to
/// paragraph elements.
const TEXT_RUN_STYLE: &[(&str, &str)] = &[
    ("font-size", "14px"),
    ("color", "#262626"),
    ("line-height", "24px"),
    ("letter-spacing", ".05em"),
    ("outline-style", "none"),
    ("overflow-wrap", "break-word"),
];

/// Host-consumable display tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        styles: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
    Text {
        text: String,
    },
}

impl RenderNode {
    fn element(tag: impl Into<String>) -> Self {
        RenderNode::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            styles: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Element { children, .. } => children,
            RenderNode::Text { .. } => &[],
        }
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self) -> String {
        match self {
            RenderNode::Text { text } => text.clone(),
            RenderNode::Element { children, .. } => {
                children.iter().map(RenderNode::text_content).collect()
            }
        }
    }
}

/// Serialize a subtree into a render-ready tree wrapped in a styled root
/// element. Elements styled `user-select: none` are dropped with their
/// subtree; markers are elided.
pub fn to_render_tree(
    tree: &DocumentTree,
    root: NodeId,
    schema: Option<&Schema>,
    rules: Option<&ConversionRules>,
) -> RenderNode {
    let mut wrapper = RenderNode::element("div");
    if let RenderNode::Element { styles, .. } = &mut wrapper {
        *styles = fixed_style();
    }
    let mut visitor = RenderVisitor {
        schema,
        stack: vec![wrapper],
        unwrapped: HashSet::new(),
    };
    walk_tree(tree, root, rules, &mut visitor, false);
    visitor
        .stack
        .pop()
        .unwrap_or_else(|| RenderNode::element("div"))
}

fn fixed_style() -> Vec<(String, String)> {
    TEXT_RUN_STYLE
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

struct RenderVisitor<'a> {
    schema: Option<&'a Schema>,
    stack: Vec<RenderNode>,
    unwrapped: HashSet<NodeId>,
}

impl RenderVisitor<'_> {
    fn attach(&mut self, node: RenderNode) {
        if let Some(RenderNode::Element { children, .. }) = self.stack.last_mut() {
            children.push(node);
        }
    }
}

impl Visitor for RenderVisitor<'_> {
    fn open(
        &mut self,
        _tree: &DocumentTree,
        cx: WalkContext,
        tag: &str,
        attrs: &AttrMap,
        styles: &StyleMap,
    ) -> bool {
        if MarkerKind::from_tag(tag).is_some() {
            return true;
        }
        if styles
            .iter()
            .any(|(k, v)| k == "user-select" && v == "none")
        {
            // Non-selectable chrome never reaches the render output.
            return false;
        }

        let mut attrs = attrs.clone();
        let mut styles = styles.clone();
        if let Some(schema) = self.schema {
            match schema.classify(tag, &attrs) {
                Some(kind) => {
                    schema.filter_attributes(tag, kind, &mut attrs);
                    schema.filter_styles(tag, kind, &mut styles);
                }
                None => {
                    self.unwrapped.insert(cx.node);
                    return true;
                }
            }
        }
        if tag == "p" {
            for (prop, value) in TEXT_RUN_STYLE {
                if !styles.iter().any(|(k, _)| k == prop) {
                    styles.push((prop.to_string(), value.to_string()));
                }
            }
        }

        let node = RenderNode::Element {
            tag: tag.to_string(),
            attrs,
            styles,
            children: Vec::new(),
        };
        if is_void_tag(tag) {
            self.attach(node);
        } else {
            self.stack.push(node);
        }
        true
    }

    fn text(&mut self, _tree: &DocumentTree, _cx: WalkContext, text: &str) {
        if text.is_empty() {
            return;
        }
        self.attach(RenderNode::Text {
            text: text.to_string(),
        });
    }

    fn close(
        &mut self,
        _tree: &DocumentTree,
        cx: WalkContext,
        _tag: &str,
        _attrs: &AttrMap,
        _styles: &StyleMap,
    ) {
        if self.unwrapped.remove(&cx.node) {
            return;
        }
        if self.stack.len() > 1
            && let Some(node) = self.stack.pop()
        {
            self.attach(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markup: &str) -> RenderNode {
        let tree = DocumentTree::from_markup(markup).unwrap();
        to_render_tree(&tree, tree.root(), None, None)
    }

    fn tag_of(node: &RenderNode) -> Option<&str> {
        match node {
            RenderNode::Element { tag, .. } => Some(tag),
            RenderNode::Text { .. } => None,
        }
    }

    #[test]
    fn wrapper_carries_fixed_text_style() {
        let out = render("<p>x</p>");
        let RenderNode::Element { tag, styles, .. } = &out else {
            panic!("wrapper must be an element");
        };
        assert_eq!(tag, "div");
        assert!(styles.iter().any(|(k, v)| k == "font-size" && v == "14px"));
        assert!(styles.iter().any(|(k, v)| k == "color" && v == "#262626"));
    }

    #[test]
    fn paragraphs_receive_text_style_without_clobbering() {
        let out = render("<p style=\"color: blue\">x</p>");
        let p = &out.children()[0];
        let RenderNode::Element { styles, .. } = p else {
            panic!("expected element");
        };
        // Author color wins; missing properties are filled in.
        assert!(styles.iter().any(|(k, v)| k == "color" && v == "blue"));
        assert!(styles.iter().any(|(k, v)| k == "line-height" && v == "24px"));
    }

    #[test]
    fn non_selectable_elements_are_dropped_with_subtree() {
        let out = render("<p>a<span style=\"user-select: none\">chrome<em>deep</em></span>b</p>");
        assert_eq!(out.text_content(), "ab");
    }

    #[test]
    fn markers_are_elided_from_render_output() {
        let out = render("<p>a<cursor />b</p>");
        assert_eq!(out.text_content(), "ab");
        let p = &out.children()[0];
        assert_eq!(p.children().len(), 2);
    }

    #[test]
    fn unknown_tags_unwrap_under_schema() {
        let tree = DocumentTree::from_markup("<p><widget>inner</widget></p>").unwrap();
        let schema = Schema::standard();
        let out = to_render_tree(&tree, tree.root(), Some(&schema), None);
        let p = &out.children()[0];
        assert_eq!(tag_of(p), Some("p"));
        assert_eq!(p.children().len(), 1);
        assert_eq!(out.text_content(), "inner");
    }

    #[test]
    fn void_elements_become_leaves() {
        let out = render("<p>a<br />b</p>");
        let p = &out.children()[0];
        assert_eq!(p.children().len(), 3);
        assert_eq!(tag_of(&p.children()[1]), Some("br"));
    }

    #[test]
    fn render_tree_serializes_to_json() {
        let out = render("<p>x</p>");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["kind"], "element");
        assert_eq!(json["tag"], "div");
    }
}
