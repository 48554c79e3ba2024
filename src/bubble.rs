//! Message units: one avatar plus one content bubble per turn.

use std::fmt::Write;

use serde::Serialize;

use crate::settings::BubbleSettings;
use crate::transcript::{Fragment, Segment, Side};

/// Rendered form of one segment. Rebuilt on every full render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageUnit {
    pub side: Side,
    pub avatar: String,
    pub content: String,
    pub image_only: bool,
}

/// Build the unit for one segment, or None when there is nothing to show.
pub fn build_unit(segment: &Segment, settings: &BubbleSettings) -> Option<MessageUnit> {
    let content = segment.content.trim();
    if content.is_empty() {
        return None;
    }
    Some(MessageUnit {
        side: segment.side,
        avatar: settings.avatar(segment.side).to_string(),
        content: content.to_string(),
        image_only: Fragment::parse(content).is_single_image(),
    })
}

pub fn build_units(segments: &[Segment], settings: &BubbleSettings) -> Vec<MessageUnit> {
    segments
        .iter()
        .filter_map(|segment| build_unit(segment, settings))
        .collect()
}

impl MessageUnit {
    pub fn container_class(&self) -> String {
        format!("message-container align-{}", self.side)
    }

    pub fn bubble_class(&self) -> String {
        let mut class = format!("chat-bubble bubble-{}", self.side);
        if self.image_only {
            class.push_str(" image-only-bubble");
        }
        class
    }

    pub fn avatar_class(&self) -> String {
        format!("avatar avatar-{}", self.side)
    }

    /// Container markup. Bubble content is emitted as-is; the avatar
    /// reference is attribute-escaped.
    pub fn to_html(&self) -> String {
        let avatar = format!(
            r#"<img class="{}" src="{}">"#,
            self.avatar_class(),
            escape_attr(&self.avatar)
        );
        let bubble = format!(r#"<div class="{}">{}</div>"#, self.bubble_class(), self.content);

        let (first, second) = match self.side {
            Side::Left => (avatar, bubble),
            Side::Right => (bubble, avatar),
        };
        format!(
            r#"<div class="{}">{}{}</div>"#,
            self.container_class(),
            first,
            second
        )
    }
}

/// Markup for a run of units, one container per line.
pub fn units_to_html(units: &[MessageUnit]) -> String {
    let mut out = String::new();
    for unit in units {
        let _ = writeln!(out, "{}", unit.to_html());
    }
    out
}

pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
