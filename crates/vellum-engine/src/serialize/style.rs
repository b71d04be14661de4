use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::conversion::{AttrMap, StyleMap};

/// Fixed ASCII-safe escaping of `& < > " '`.
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_safe(text)
}

pub fn unescape(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Render attributes as ` key="value"` pairs. A `style` entry is never
/// emitted here; styles travel separately.
pub(crate) fn attrs_to_string(attrs: &AttrMap) -> String {
    let mut out = String::new();
    for (key, value) in attrs {
        if key == "style" {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    out
}

/// Render the style map as `prop: value;` declarations. Zero-valued spacing
/// properties are dropped and color values are normalized to hex.
pub(crate) fn styles_to_string(styles: &StyleMap) -> String {
    let mut out = String::new();
    for (prop, value) in styles {
        if is_zero_spacing(prop, value) {
            continue;
        }
        let value = if is_color_property(prop) {
            to_hex(value)
        } else {
            value.clone()
        };
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(prop);
        out.push_str(": ");
        out.push_str(&escape(&value));
        out.push(';');
    }
    out
}

fn is_zero_spacing(prop: &str, value: &str) -> bool {
    (prop.starts_with("padding") || prop.starts_with("margin") || prop.starts_with("text-indent"))
        && leading_number(value) == Some(0.0)
}

fn is_color_property(prop: &str) -> bool {
    static COLOR_PROP: OnceLock<Regex> = OnceLock::new();
    let re = COLOR_PROP
        .get_or_init(|| Regex::new(r"[^a-z]color$").expect("Invalid color property regex"));
    re.is_match(prop)
}

/// Numeric magnitude of a CSS length, ignoring its unit.
fn leading_number(value: &str) -> Option<f64> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();
    digits.parse().ok()
}

/// Rewrite `rgb()`/`rgba()` color functions to `#rrggbb` hex form.
pub(crate) fn to_hex(value: &str) -> String {
    static RGB: OnceLock<Regex> = OnceLock::new();
    let re = RGB.get_or_init(|| {
        Regex::new(r"rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*[\d.]+\s*)?\)")
            .expect("Invalid rgb regex")
    });
    re.replace_all(value, |caps: &regex::Captures<'_>| {
        let channel = |i: usize| {
            caps[i]
                .parse::<u32>()
                .unwrap_or(0)
                .min(255)
        };
        format!("#{:02x}{:02x}{:02x}", channel(1), channel(2), channel(3))
    })
    .into_owned()
}
