use super::{Visitor, WalkContext, walk_tree};
use crate::conversion::{AttrMap, ConversionRules, StyleMap};
use crate::dom::{DocumentTree, NodeId};

/// Serialize a subtree to plain text: line breaks and block closes become
/// newlines, list items get ordinal or bullet prefixes, and the result is
/// collapsed to single newlines and trimmed.
pub fn to_text(
    tree: &DocumentTree,
    root: NodeId,
    rules: Option<&ConversionRules>,
    include_card: bool,
) -> String {
    let mut visitor = TextVisitor { out: String::new() };
    walk_tree(tree, root, rules, &mut visitor, include_card);
    collapse_newlines(&visitor.out)
        .trim_matches('\n')
        .to_string()
}

struct TextVisitor {
    out: String,
}

impl Visitor for TextVisitor {
    fn open(
        &mut self,
        tree: &DocumentTree,
        cx: WalkContext,
        tag: &str,
        _attrs: &AttrMap,
        _styles: &StyleMap,
    ) -> bool {
        if tag == "br" {
            self.out.push('\n');
        }
        // List prefixes key off the stored element, not the converted tag.
        if tree.tag(cx.node) == Some("li")
            && let Some(prefix) = list_item_prefix(tree, cx.node)
        {
            self.out.push_str(&prefix);
        }
        true
    }

    fn text(&mut self, _tree: &DocumentTree, _cx: WalkContext, text: &str) {
        if text.contains('\u{a0}') {
            self.out.push_str(&text.replace('\u{a0}', " "));
        } else {
            self.out.push_str(text);
        }
    }

    fn close(
        &mut self,
        tree: &DocumentTree,
        cx: WalkContext,
        _tag: &str,
        _attrs: &AttrMap,
        _styles: &StyleMap,
    ) {
        if tree.is_block(cx.node) {
            self.out.push('\n');
        }
    }
}

/// Compute the textual prefix for a list item, or `None` when the item is
/// just the wrapper around a nested list.
fn list_item_prefix(tree: &DocumentTree, li: NodeId) -> Option<String> {
    let first_element = tree
        .children(li)
        .iter()
        .copied()
        .find(|&c| tree.element(c).is_some());
    if first_element.is_some_and(|c| matches!(tree.tag(c), Some("ol") | Some("ul"))) {
        return None;
    }

    let parent = tree.parent(li)?;
    let parent_el = tree.element(parent)?;
    match parent_el.tag.as_str() {
        "ol" => {
            let start: usize = parent_el
                .attr("start")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            let preceding = tree
                .children(parent)
                .iter()
                .take_while(|&&c| c != li)
                .filter(|&&c| tree.tag(c) == Some("li"))
                .count();
            let style = parent_el.style("list-style-type").unwrap_or("decimal");
            Some(format!("{}. ", ordinal(style, start + preceding)))
        }
        "ul" => {
            let style = parent_el.style("list-style-type").unwrap_or("disc");
            Some(format!("{} ", bullet(style)))
        }
        _ => None,
    }
}

fn ordinal(style: &str, n: usize) -> String {
    match style {
        "lower-alpha" | "lower-latin" => alphabetic(n),
        "upper-alpha" | "upper-latin" => alphabetic(n).to_ascii_uppercase(),
        "lower-roman" => roman(n).to_ascii_lowercase(),
        "upper-roman" => roman(n),
        _ => n.to_string(),
    }
}

/// Bijective base-26 numbering: 1 → a, 26 → z, 27 → aa.
fn alphabetic(mut n: usize) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn roman(mut n: usize) -> String {
    const TABLE: &[(usize, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, glyphs) in TABLE {
        while n >= value {
            out.push_str(glyphs);
            n -= value;
        }
    }
    out
}

fn bullet(style: &str) -> &'static str {
    match style {
        "circle" => "◦",
        "square" => "▪",
        _ => "•",
    }
}

fn collapse_newlines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_newline = false;
    for c in s.chars() {
        if c == '\n' {
            if !prev_newline {
                out.push(c);
            }
            prev_newline = true;
        } else {
            out.push(c);
            prev_newline = false;
        }
    }
    out
}
