use std::collections::HashSet;

use super::style::{attrs_to_string, escape, styles_to_string};
use super::{Visitor, WalkContext, walk_tree};
use crate::conversion::{AttrMap, ConversionRules, StyleMap};
use crate::dom::{DocumentTree, MarkerKind, NodeId, is_void_tag};
use crate::schema::Schema;

/// Knobs for [`to_markup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupOptions {
    /// Substitute every other space in runs of two or more with a
    /// non-breaking space so rendered whitespace survives a round-trip.
    pub replace_spaces: bool,
    /// Emit markers as their reserved empty tags (`<cursor />`) instead of
    /// the placeholder span representation.
    pub expand_markers: bool,
}

/// Serialize a subtree to canonical markup.
///
/// With a schema, unclassifiable elements are unwrapped: their own tags are
/// omitted while their children are still emitted in place.
pub fn to_markup(
    tree: &DocumentTree,
    root: NodeId,
    schema: Option<&Schema>,
    rules: Option<&ConversionRules>,
    options: MarkupOptions,
) -> String {
    let mut visitor = MarkupVisitor {
        schema,
        options,
        out: String::new(),
        unwrapped: HashSet::new(),
    };
    walk_tree(tree, root, rules, &mut visitor, false);
    visitor.out
}

struct MarkupVisitor<'a> {
    schema: Option<&'a Schema>,
    options: MarkupOptions,
    out: String,
    /// Nodes whose open tag was suppressed by the unwrap policy; their
    /// close must be suppressed too.
    unwrapped: HashSet<NodeId>,
}

impl Visitor for MarkupVisitor<'_> {
    fn open(
        &mut self,
        _tree: &DocumentTree,
        cx: WalkContext,
        tag: &str,
        attrs: &AttrMap,
        styles: &StyleMap,
    ) -> bool {
        if MarkerKind::from_tag(tag).is_some() {
            if self.options.expand_markers {
                self.out.push('<');
                self.out.push_str(tag);
                self.out.push_str(" />");
            } else {
                self.out.push_str("<span data-element=\"");
                self.out.push_str(tag);
                self.out.push_str("\"></span>");
            }
            return true;
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
                    // Unwrap policy: no tags for this node, children still
                    // serialize in its place.
                    self.unwrapped.insert(cx.node);
                    return true;
                }
            }
        }

        self.out.push('<');
        self.out.push_str(tag);
        let attr_string = attrs_to_string(&attrs);
        if !attr_string.is_empty() {
            self.out.push(' ');
            self.out.push_str(&attr_string);
        }
        let style_string = styles_to_string(&styles);
        if !style_string.is_empty() {
            self.out.push_str(" style=\"");
            self.out.push_str(&style_string);
            self.out.push('"');
        }
        if is_void_tag(tag) {
            self.out.push_str(" />");
        } else {
            self.out.push('>');
        }
        true
    }

    fn text(&mut self, _tree: &DocumentTree, cx: WalkContext, text: &str) {
        let mut text = text.to_string();
        if cx.preformatted_depth == 0 {
            text = text
                .trim_start_matches('\n')
                .trim_end_matches('\n')
                .to_string();
            if self.options.replace_spaces && text.chars().count() > 1 {
                text = substitute_space_runs(&text);
            }
        }
        self.out.push_str(&escape(&text));
    }

    fn close(
        &mut self,
        _tree: &DocumentTree,
        cx: WalkContext,
        tag: &str,
        _attrs: &AttrMap,
        _styles: &StyleMap,
    ) {
        if self.unwrapped.remove(&cx.node) {
            return;
        }
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }
}

/// In each run of two or more spaces, replace every other space with a
/// non-breaking space so consecutive spaces survive rendering.
fn substitute_space_runs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ' ' || chars[i] == '\u{a0}' {
            let mut j = i;
            while j < chars.len() && (chars[j] == ' ' || chars[j] == '\u{a0}') {
                j += 1;
            }
            if j - i >= 2 {
                for offset in 0..(j - i) {
                    out.push(if offset % 2 == 0 { ' ' } else { '\u{a0}' });
                }
            } else {
                out.push(' ');
            }
            i = j;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}
