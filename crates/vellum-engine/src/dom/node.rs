use serde_json::Value;

/// Selection marker variants. Markers are transient: they only exist between
/// a selection capture and the matching restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Cursor,
    Anchor,
    Focus,
}

impl MarkerKind {
    /// Reserved tag name used when a marker is expanded into markup.
    pub fn tag_name(self) -> &'static str {
        match self {
            MarkerKind::Cursor => "cursor",
            MarkerKind::Anchor => "anchor",
            MarkerKind::Focus => "focus",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "cursor" => Some(MarkerKind::Cursor),
            "anchor" => Some(MarkerKind::Anchor),
            "focus" => Some(MarkerKind::Focus),
            _ => None,
        }
    }
}

/// Zones of a card. `Left` and `Right` are non-editable guards; `Center`
/// holds the card's opaque payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardZone {
    Left,
    Center,
    Right,
}

impl CardZone {
    pub fn as_str(self) -> &'static str {
        match self {
            CardZone::Left => "left",
            CardZone::Center => "center",
            CardZone::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Inline,
    Block,
}

impl CardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CardKind::Inline => "inline",
            CardKind::Block => "block",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inline" => Some(CardKind::Inline),
            "block" => Some(CardKind::Block),
            _ => None,
        }
    }
}

/// Element payload. Attribute and style maps are ordered; ordering is
/// preserved through serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub styles: Vec<(String, String)>,
    /// Set on the three wrapper elements inside a card node.
    pub zone: Option<CardZone>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            styles: Vec::new(),
            zone: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn style(&self, prop: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style(&mut self, prop: impl Into<String>, value: impl Into<String>) {
        let prop = prop.into();
        let value = value.into();
        match self.styles.iter_mut().find(|(k, _)| *k == prop) {
            Some(entry) => entry.1 = value,
            None => self.styles.push((prop, value)),
        }
    }

    pub fn remove_style(&mut self, prop: &str) {
        self.styles.retain(|(k, _)| k != prop);
    }
}

/// Card payload: an opaque atomic widget identified by a type name and a
/// jsonable value. The card's tree children are its three zone wrappers.
#[derive(Debug, Clone, PartialEq)]
pub struct CardData {
    pub name: String,
    pub kind: CardKind,
    pub value: Value,
    /// Inline cards with block presentation behave like blocks for
    /// boundary snapping.
    pub pseudo_block: bool,
}

impl CardData {
    pub fn new(name: impl Into<String>, kind: CardKind, value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            pseudo_block: false,
        }
    }
}

/// A unit of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Card(CardData),
    Marker(MarkerKind),
}

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ol", "ul", "li", "blockquote", "pre", "div", "hr",
    "table", "thead", "tbody", "tr", "td", "th",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "area", "base", "col", "embed", "source", "track", "wbr"];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_tag_names_round_trip() {
        for kind in [MarkerKind::Cursor, MarkerKind::Anchor, MarkerKind::Focus] {
            assert_eq!(MarkerKind::from_tag(kind.tag_name()), Some(kind));
        }
        assert_eq!(MarkerKind::from_tag("span"), None);
    }

    #[test]
    fn element_attr_set_replaces_existing() {
        let mut el = ElementData::new("a");
        el.set_attr("href", "https://one.example");
        el.set_attr("target", "_blank");
        el.set_attr("href", "https://two.example");

        assert_eq!(el.attr("href"), Some("https://two.example"));
        assert_eq!(el.attrs.len(), 2);
        // Ordering preserved: href stays first.
        assert_eq!(el.attrs[0].0, "href");
    }

    #[test]
    fn element_style_accessors() {
        let mut el = ElementData::new("span");
        el.set_style("color", "red");
        assert_eq!(el.style("color"), Some("red"));
        el.remove_style("color");
        assert_eq!(el.style("color"), None);
    }

    #[test]
    fn tag_classification() {
        assert!(is_block_tag("p"));
        assert!(is_block_tag("blockquote"));
        assert!(!is_block_tag("span"));
        assert!(is_void_tag("br"));
        assert!(!is_void_tag("p"));
    }
}
