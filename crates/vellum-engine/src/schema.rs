//! Declarative allow-list of permitted tag/attribute/style combinations.
//!
//! The schema never errors: a tag it cannot classify triggers the walker's
//! unwrap policy, and a classified tag with no matching rule degrades to an
//! empty allow-list (everything stripped).

/// Classification of a recognized tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Block,
    Inline,
    Mark,
    Card,
}

/// One allow-list entry. `required_attrs` narrows matching: the rule only
/// applies when every listed attribute is present with the given value.
#[derive(Debug, Clone)]
pub struct SchemaRule {
    pub tag: String,
    pub kind: SchemaType,
    pub attributes: Vec<String>,
    pub styles: Vec<String>,
    pub required_attrs: Vec<(String, String)>,
}

impl SchemaRule {
    pub fn new(tag: impl Into<String>, kind: SchemaType) -> Self {
        Self {
            tag: tag.into(),
            kind,
            attributes: Vec::new(),
            styles: Vec::new(),
            required_attrs: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = styles.into_iter().map(Into::into).collect();
        self
    }

    fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        self.tag == tag
            && self
                .required_attrs
                .iter()
                .all(|(k, v)| attrs.iter().any(|(ak, av)| ak == k && av == v))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<SchemaRule>,
}

impl Schema {
    pub fn new(rules: Vec<SchemaRule>) -> Self {
        Self { rules }
    }

    pub fn add_rule(&mut self, rule: SchemaRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[SchemaRule] {
        &self.rules
    }

    /// Resolve a tag (plus its attributes) to a classification. `None`
    /// means the walker unwraps the node.
    pub fn classify(&self, tag: &str, attrs: &[(String, String)]) -> Option<SchemaType> {
        self.rules
            .iter()
            .find(|rule| rule.matches(tag, attrs))
            .map(|rule| rule.kind)
    }

    fn rule_for(&self, tag: &str, kind: SchemaType) -> Option<&SchemaRule> {
        self.rules
            .iter()
            .find(|rule| rule.tag == tag && rule.kind == kind)
    }

    /// Delete attributes not in the allow-list for (tag, kind), in place.
    /// Idempotent; deletion order cannot affect the surviving set.
    pub fn filter_attributes(
        &self,
        tag: &str,
        kind: SchemaType,
        attrs: &mut Vec<(String, String)>,
    ) {
        match self.rule_for(tag, kind) {
            Some(rule) => attrs.retain(|(k, _)| rule.attributes.iter().any(|a| a == k)),
            None => attrs.clear(),
        }
    }

    /// Delete style properties not in the allow-list for (tag, kind).
    pub fn filter_styles(&self, tag: &str, kind: SchemaType, styles: &mut Vec<(String, String)>) {
        match self.rule_for(tag, kind) {
            Some(rule) => styles.retain(|(k, _)| rule.styles.iter().any(|s| s == k)),
            None => styles.clear(),
        }
    }

    /// The baseline table for ordinary rich-text documents. Hosts extend or
    /// replace it; the engine never requires this exact set.
    pub fn standard() -> Self {
        let text_styles = ["color", "background-color", "font-size", "font-family"];
        let block_styles = ["text-align", "text-indent", "padding-left", "line-height"];
        let mut rules = Vec::new();
        for tag in ["p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote"] {
            rules.push(
                SchemaRule::new(tag, SchemaType::Block)
                    .with_attributes(["data-id"])
                    .with_styles(block_styles),
            );
        }
        for tag in ["ol", "ul"] {
            rules.push(
                SchemaRule::new(tag, SchemaType::Block)
                    .with_attributes(["start", "data-id"])
                    .with_styles(["list-style-type", "list-style-position"]),
            );
        }
        rules.push(
            SchemaRule::new("li", SchemaType::Block)
                .with_attributes(["class"])
                .with_styles(["list-style-type"]),
        );
        rules.push(SchemaRule::new("pre", SchemaType::Block).with_attributes(["data-syntax"]));
        rules.push(SchemaRule::new("br", SchemaType::Inline));
        rules.push(
            SchemaRule::new("a", SchemaType::Inline)
                .with_attributes(["href", "target", "rel"])
                .with_styles(text_styles),
        );
        rules.push(
            SchemaRule::new("img", SchemaType::Inline)
                .with_attributes(["src", "alt", "width", "height"]),
        );
        rules.push(SchemaRule::new("span", SchemaType::Mark).with_styles(text_styles));
        for tag in ["strong", "em", "u", "s", "sub", "sup", "mark"] {
            rules.push(SchemaRule::new(tag, SchemaType::Mark));
        }
        rules.push(
            SchemaRule::new("code", SchemaType::Mark).with_styles(["font-family"]),
        );
        rules.push(
            SchemaRule::new("card", SchemaType::Card).with_attributes(["type", "name", "value"]),
        );
        Self::new(rules)
    }
}
