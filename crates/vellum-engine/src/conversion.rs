//! Ordered predicate→transform rules that rewrite legacy or alternate tree
//! shapes into canonical ones during serialization.
//!
//! Rules see the effective (tag, styles, attrs) of an element and may
//! replace all three. They are evaluated in order; the first match wins and
//! unmatched nodes pass through unchanged.

pub type AttrMap = Vec<(String, String)>;
pub type StyleMap = Vec<(String, String)>;

/// Result of a conversion: the representation the walker emits instead of
/// the element's own.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedNode {
    pub tag: String,
    pub attrs: AttrMap,
    pub styles: StyleMap,
}

type MatchFn = Box<dyn Fn(&str, &StyleMap, &AttrMap) -> bool + Send + Sync>;
type TransformFn = Box<dyn Fn(&str, StyleMap, AttrMap) -> ConvertedNode + Send + Sync>;

pub struct ConversionRule {
    matches: MatchFn,
    transform: TransformFn,
}

impl ConversionRule {
    pub fn new(
        matches: impl Fn(&str, &StyleMap, &AttrMap) -> bool + Send + Sync + 'static,
        transform: impl Fn(&str, StyleMap, AttrMap) -> ConvertedNode + Send + Sync + 'static,
    ) -> Self {
        Self {
            matches: Box::new(matches),
            transform: Box::new(transform),
        }
    }

    /// A plain tag rename that keeps attributes and styles.
    pub fn rename(from: &'static str, to: &'static str) -> Self {
        Self::new(
            move |tag, _, _| tag == from,
            move |_, styles, attrs| ConvertedNode {
                tag: to.to_string(),
                attrs,
                styles,
            },
        )
    }
}

#[derive(Default)]
pub struct ConversionRules {
    rules: Vec<ConversionRule>,
}

impl ConversionRules {
    pub fn new(rules: Vec<ConversionRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: ConversionRule) {
        self.rules.push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the first matching rule, or pass the node through unchanged.
    pub fn apply(&self, tag: &str, styles: StyleMap, attrs: AttrMap) -> ConvertedNode {
        for rule in &self.rules {
            if (rule.matches)(tag, &styles, &attrs) {
                return (rule.transform)(tag, styles, attrs);
            }
        }
        ConvertedNode {
            tag: tag.to_string(),
            attrs,
            styles,
        }
    }

    /// Default rewrites: loose `div` containers become paragraphs and
    /// legacy presentational tags become their semantic equivalents.
    pub fn standard() -> Self {
        Self::new(vec![
            ConversionRule::rename("div", "p"),
            ConversionRule::rename("b", "strong"),
            ConversionRule::rename("i", "em"),
        ])
    }
}

impl std::fmt::Debug for ConversionRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionRules")
            .field("len", &self.rules.len())
            .finish()
    }
}
