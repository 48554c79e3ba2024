//! Just enough markup inspection to tell an image-only bubble apart.
//!
//! This is not an HTML parser. Tags are recognized by regex, attribute
//! values containing `>` will confuse it, and implied end tags are not
//! inferred.

use std::sync::OnceLock;

use regex::{Captures, Regex};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<!--[\s\S]*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)(?:\s[^>]*)?/?>")
            .expect("static regex")
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").expect("static regex"))
}

/// Top-level element structure and text of a markup fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    children: Vec<String>,
    text: String,
}

impl Fragment {
    pub fn parse(markup: &str) -> Self {
        let mut fragment = Self::default();
        let mut depth = 0usize;
        let mut last = 0;

        for caps in tag_re().captures_iter(markup) {
            let Some(whole) = caps.get(0) else { continue };
            fragment.text.push_str(&markup[last..whole.start()]);
            last = whole.end();

            let Some(name) = caps.get(2) else {
                // comment
                continue;
            };

            if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                depth = depth.saturating_sub(1);
                continue;
            }

            let name = name.as_str().to_ascii_lowercase();
            let self_closing = whole.as_str().ends_with("/>");
            let is_void = VOID_ELEMENTS.contains(&name.as_str());
            if depth == 0 {
                fragment.children.push(name);
            }
            if !is_void && !self_closing {
                depth += 1;
            }
        }
        fragment.text.push_str(&markup[last..]);
        fragment.text = decode_entities(&fragment.text);
        fragment
    }

    /// Lowercase tag names of the top-level elements, in order.
    pub fn element_children(&self) -> &[String] {
        &self.children
    }

    /// All text with tags removed and entities decoded.
    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// Exactly one top-level element, it is an `img`, and there is no visible text.
    pub fn is_single_image(&self) -> bool {
        matches!(self.children.as_slice(), [only] if only == "img")
            && self.text.trim().is_empty()
    }
}

fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
