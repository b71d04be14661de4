use serde_json::Value;

use super::node::{CardData, CardKind, CardZone, ElementData, MarkerKind, is_void_tag};
use super::tree::{DocumentTree, NodeId};

/// Construction-time fault from the markup reader. The tree walker itself
/// never raises; anything unparsable surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("unexpected end of input inside {context}")]
    UnexpectedEof { context: &'static str },
    #[error("unexpected character {found:?} at offset {pos}")]
    UnexpectedChar { pos: usize, found: char },
    #[error("mismatched close tag: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag { expected: String, found: String },
    #[error("close tag </{tag}> without a matching open tag")]
    StrayCloseTag { tag: String },
    #[error("unclosed <{tag}> at end of input")]
    UnclosedTag { tag: String },
    #[error("invalid card value: {0}")]
    InvalidCardValue(#[from] serde_json::Error),
}

impl DocumentTree {
    /// Build a tree from canonical markup. Reserved tags become marker
    /// nodes, `<card>` tags become card nodes with their value decoded
    /// from JSON.
    pub fn from_markup(source: &str) -> Result<Self, MarkupError> {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        parse_fragment(&mut tree, root, source)?;
        Ok(tree)
    }
}

/// Parse markup and append the resulting nodes under `parent`.
pub fn parse_fragment(
    tree: &mut DocumentTree,
    parent: NodeId,
    source: &str,
) -> Result<(), MarkupError> {
    struct Frame {
        node: NodeId,
        tag: String,
    }

    let mut reader = Reader::new(source);
    let mut stack = vec![Frame {
        node: parent,
        tag: String::new(),
    }];

    while let Some(token) = reader.next_token()? {
        // Index of the current attach point; re-borrowed per token because
        // tree mutation needs exclusive access.
        let top = stack.len() - 1;
        match token {
            RawToken::Text(text) => {
                let decoded = html_escape::decode_html_entities(&text).into_owned();
                let node = tree.create_text(decoded);
                tree.append_child(stack[top].node, node);
            }
            RawToken::Close(name) => {
                if stack.len() == 1 {
                    return Err(MarkupError::StrayCloseTag { tag: name });
                }
                let frame = &stack[top];
                if frame.tag != name {
                    return Err(MarkupError::MismatchedCloseTag {
                        expected: frame.tag.clone(),
                        found: name,
                    });
                }
                stack.pop();
            }
            RawToken::Open {
                name,
                attrs,
                self_closing,
            } => {
                if let Some(kind) = marker_for(&name, &attrs) {
                    let node = tree.create_marker(kind);
                    tree.append_child(stack[top].node, node);
                    if !self_closing && !is_void_tag(&name) {
                        stack.push(Frame { node, tag: name });
                    }
                    continue;
                }
                if name == "card" {
                    let card = build_card(tree, &attrs)?;
                    tree.append_child(stack[top].node, card);
                    if !self_closing {
                        // Nested content belongs to the card's payload.
                        let center = tree
                            .card_zone(card, CardZone::Center)
                            .unwrap_or(card);
                        stack.push(Frame {
                            node: center,
                            tag: name,
                        });
                    }
                    continue;
                }
                let node = tree.create_element_with(element_from(&name, attrs));
                tree.append_child(stack[top].node, node);
                if !self_closing && !is_void_tag(&name) {
                    stack.push(Frame { node, tag: name });
                }
            }
        }
    }

    if stack.len() > 1 {
        let frame = stack.pop();
        return Err(MarkupError::UnclosedTag {
            tag: frame.map(|f| f.tag).unwrap_or_default(),
        });
    }
    Ok(())
}

fn marker_for(name: &str, attrs: &[(String, String)]) -> Option<MarkerKind> {
    if let Some(kind) = MarkerKind::from_tag(name) {
        return Some(kind);
    }
    // Placeholder representation: a span carrying the reserved data attribute.
    attrs
        .iter()
        .find(|(k, _)| k == "data-element")
        .and_then(|(_, v)| MarkerKind::from_tag(v))
}

fn build_card(tree: &mut DocumentTree, attrs: &[(String, String)]) -> Result<NodeId, MarkupError> {
    let lookup = |key: &str| {
        attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    let kind = lookup("type")
        .and_then(CardKind::from_str)
        .unwrap_or(CardKind::Inline);
    let name = lookup("name").unwrap_or_default().to_ascii_lowercase();
    let value = match lookup("value") {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
        _ => Value::Null,
    };
    Ok(tree.create_card(CardData::new(name, kind, value)))
}

fn element_from(name: &str, attrs: Vec<(String, String)>) -> ElementData {
    let mut element = ElementData::new(name);
    for (key, value) in attrs {
        if key == "style" {
            element.styles = parse_style_attribute(&value);
        } else {
            element.attrs.push((key, value));
        }
    }
    element
}

fn parse_style_attribute(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim();
            let val = val.trim();
            if prop.is_empty() || val.is_empty() {
                return None;
            }
            Some((prop.to_string(), val.to_string()))
        })
        .collect()
}

enum RawToken {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
    Text(String),
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
}

impl Reader {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Result<Option<RawToken>, MarkupError> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        if c != '<' {
            return Ok(Some(RawToken::Text(self.read_text())));
        }
        match self.peek_at(1) {
            Some('!') | Some('?') => {
                self.skip_declaration()?;
                self.next_token()
            }
            Some('/') => {
                self.pos += 2;
                let name = self.read_name();
                self.skip_whitespace();
                match self.bump() {
                    Some('>') => Ok(Some(RawToken::Close(name))),
                    Some(found) => Err(MarkupError::UnexpectedChar {
                        pos: self.pos - 1,
                        found,
                    }),
                    None => Err(MarkupError::UnexpectedEof {
                        context: "close tag",
                    }),
                }
            }
            Some(next) if next.is_ascii_alphabetic() => self.read_open_tag().map(Some),
            Some(found) => Err(MarkupError::UnexpectedChar {
                pos: self.pos + 1,
                found,
            }),
            None => Err(MarkupError::UnexpectedEof { context: "tag" }),
        }
    }

    fn read_text(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '<') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_lowercase()
    }

    fn skip_declaration(&mut self) -> Result<(), MarkupError> {
        // Comments need their full terminator; other declarations end at '>'.
        let is_comment = self.peek_at(1) == Some('!')
            && self.peek_at(2) == Some('-')
            && self.peek_at(3) == Some('-');
        if is_comment {
            self.pos += 4;
            while self.pos < self.chars.len() {
                if self.peek() == Some('-')
                    && self.peek_at(1) == Some('-')
                    && self.peek_at(2) == Some('>')
                {
                    self.pos += 3;
                    return Ok(());
                }
                self.pos += 1;
            }
            return Err(MarkupError::UnexpectedEof { context: "comment" });
        }
        while let Some(c) = self.bump() {
            if c == '>' {
                return Ok(());
            }
        }
        Err(MarkupError::UnexpectedEof {
            context: "declaration",
        })
    }

    fn read_open_tag(&mut self) -> Result<RawToken, MarkupError> {
        self.pos += 1; // consume '<'
        let name = self.read_name();
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    return Ok(RawToken::Open {
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some('/') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    match self.bump() {
                        Some('>') => {
                            return Ok(RawToken::Open {
                                name,
                                attrs,
                                self_closing: true,
                            });
                        }
                        Some(found) => {
                            return Err(MarkupError::UnexpectedChar {
                                pos: self.pos - 1,
                                found,
                            });
                        }
                        None => {
                            return Err(MarkupError::UnexpectedEof { context: "tag" });
                        }
                    }
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '-' => {
                    let (key, value) = self.read_attribute()?;
                    attrs.push((key, value));
                }
                Some(found) => {
                    return Err(MarkupError::UnexpectedChar {
                        pos: self.pos,
                        found,
                    });
                }
                None => {
                    return Err(MarkupError::UnexpectedEof { context: "tag" });
                }
            }
        }
    }

    fn read_attribute(&mut self) -> Result<(String, String), MarkupError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
        {
            self.pos += 1;
        }
        let key: String = self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_lowercase();
        self.skip_whitespace();
        if self.peek() != Some('=') {
            // Bare attribute.
            return Ok((key, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let value_start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(MarkupError::UnexpectedEof {
                        context: "attribute value",
                    });
                }
                let raw: String = self.chars[value_start..self.pos].iter().collect();
                self.pos += 1;
                raw
            }
            _ => {
                let value_start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && c != '>' && c != '/')
                {
                    self.pos += 1;
                }
                self.chars[value_start..self.pos].iter().collect()
            }
        };
        let decoded = html_escape::decode_html_entities(&value).into_owned();
        Ok((key, decoded))
    }
}
