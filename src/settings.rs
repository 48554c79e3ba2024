//! The user-configurable bubble theme and its persisted JSON form.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::transcript::Side;

pub const DEFAULT_BG_URL: &str = "https://cdn.discordapp.com/attachments/1412090688769757285/1415294257383739473/c79a77120952d57c.png?ex=68c2aefd&is=68c15d7d&hm=f81ef122a0b0b3917a573e205fffb6df2949633a19a441a13471d9281d168efb&";
pub const DEFAULT_LEFT_AVATAR: &str = "https://cdn.discordapp.com/attachments/1412090688769757285/1415334842874331146/IMG_9680.jpg?ex=68c2d4ca&is=68c1834a&hm=1f8c247db8e68c6297ebb58efcb952a8d018505886c9901430acd8d7d9a456ae&";
pub const DEFAULT_RIGHT_AVATAR: &str = "https://cdn.discordapp.com/attachments/1412090688769757285/1415334843516190812/IMG_9681.jpg?ex=68c2d4ca&is=68c1834a&hm=a3b9a5f95334c157c11e9b957e5a641fe4ed06332b45de45f45a26db9fd351b0&";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("persisted settings are not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("{field} must be a #rrggbb color, got {value:?}")]
    InvalidColor { field: &'static str, value: String },

    #[error("opacity must be between 0 and 1, got {0}")]
    InvalidOpacity(f64),
}

/// Settings fields that hold an image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageSlot {
    Background,
    LeftAvatar,
    RightAvatar,
}

impl ImageSlot {
    /// Key of this slot in the persisted record.
    pub const fn key(self) -> &'static str {
        match self {
            ImageSlot::Background => "bgUrl",
            ImageSlot::LeftAvatar => "leftAvatar",
            ImageSlot::RightAvatar => "rightAvatar",
        }
    }
}

/// Current theme: avatars, background, two-stop gradients, and opacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleSettings {
    pub bg_url: String,
    pub left_avatar: String,
    pub right_avatar: String,
    pub left_color1: String,
    pub left_color2: String,
    pub right_color1: String,
    pub right_color2: String,
    pub bubble_opacity: f64,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Self {
            bg_url: DEFAULT_BG_URL.to_string(),
            left_avatar: DEFAULT_LEFT_AVATAR.to_string(),
            right_avatar: DEFAULT_RIGHT_AVATAR.to_string(),
            left_color1: "#e9e9eb".to_string(),
            left_color2: "#f4f4f5".to_string(),
            right_color1: "#007aff".to_string(),
            right_color2: "#5856d6".to_string(),
            bubble_opacity: 0.8,
        }
    }
}

/// Color and opacity values as entered in the settings form.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorForm {
    pub left_color1: String,
    pub left_color2: String,
    pub right_color1: String,
    pub right_color2: String,
    pub opacity: f64,
}

impl From<&BubbleSettings> for ColorForm {
    fn from(settings: &BubbleSettings) -> Self {
        Self {
            left_color1: settings.left_color1.clone(),
            left_color2: settings.left_color2.clone(),
            right_color1: settings.right_color1.clone(),
            right_color2: settings.right_color2.clone(),
            opacity: settings.bubble_opacity,
        }
    }
}

impl ColorForm {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("leftColor1", &self.left_color1),
            ("leftColor2", &self.left_color2),
            ("rightColor1", &self.right_color1),
            ("rightColor2", &self.right_color2),
        ] {
            if parse_hex(value).is_none() {
                return Err(SettingsError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(SettingsError::InvalidOpacity(self.opacity));
        }
        Ok(())
    }

    /// CSS custom properties for the gradient stops, before anything is saved.
    pub fn gradient_variables(&self) -> Vec<(&'static str, String)> {
        let color = |hex: &str| {
            hex_to_rgba(hex, self.opacity).unwrap_or_else(|| rgba(0, 0, 0, self.opacity))
        };
        vec![
            ("--left-bubble-start", color(&self.left_color1)),
            ("--left-bubble-end", color(&self.left_color2)),
            ("--right-bubble-start", color(&self.right_color1)),
            ("--right-bubble-end", color(&self.right_color2)),
        ]
    }

    pub fn opacity_label(&self) -> String {
        opacity_label(self.opacity)
    }
}

impl BubbleSettings {
    /// Merge a persisted JSON record over `defaults`, field by field.
    ///
    /// Colors that do not parse fall back to the default and opacity is
    /// clamped into `0..=1`, so the result always renders.
    pub fn from_json(json: &str, defaults: &Self) -> Result<Self, SettingsError> {
        let stored: Map<String, Value> = serde_json::from_str(json)?;
        Ok(defaults.merged(&stored))
    }

    /// A field that is absent or null takes its default. A field of the wrong
    /// type is dropped on its own and the rest of the record still applies.
    fn merged(&self, stored: &Map<String, Value>) -> Self {
        let text = |field: &'static str, fallback: &str| match stored.get(field) {
            None | Some(Value::Null) => fallback.to_string(),
            Some(Value::String(v)) => v.clone(),
            Some(other) => {
                tracing::warn!(field, value = %other, "ignoring mistyped persisted field");
                fallback.to_string()
            }
        };
        let color = |field: &'static str, fallback: &str| {
            let value = text(field, fallback);
            if parse_hex(&value).is_some() {
                value
            } else {
                tracing::warn!(field, value = %value, "ignoring invalid persisted color");
                fallback.to_string()
            }
        };
        let number = |field: &'static str| match stored.get(field) {
            None | Some(Value::Null) => None,
            Some(v) => {
                let n = v.as_f64().filter(|n| n.is_finite());
                if n.is_none() {
                    tracing::warn!(field, value = %v, "ignoring mistyped persisted field");
                }
                n
            }
        };

        Self {
            bg_url: text("bgUrl", &self.bg_url),
            left_avatar: text("leftAvatar", &self.left_avatar),
            right_avatar: text("rightAvatar", &self.right_avatar),
            left_color1: color("leftColor1", &self.left_color1),
            left_color2: color("leftColor2", &self.left_color2),
            right_color1: color("rightColor1", &self.right_color1),
            right_color2: color("rightColor2", &self.right_color2),
            // `opacity` is the older key; `bubbleOpacity` wins when both are set
            bubble_opacity: number("bubbleOpacity")
                .or_else(|| number("opacity"))
                .map_or(self.bubble_opacity, |o| o.clamp(0.0, 1.0)),
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn avatar(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_avatar,
            Side::Right => &self.right_avatar,
        }
    }

    pub fn image(&self, slot: ImageSlot) -> &str {
        match slot {
            ImageSlot::Background => &self.bg_url,
            ImageSlot::LeftAvatar => &self.left_avatar,
            ImageSlot::RightAvatar => &self.right_avatar,
        }
    }

    pub fn set_image(&mut self, slot: ImageSlot, reference: String) {
        match slot {
            ImageSlot::Background => self.bg_url = reference,
            ImageSlot::LeftAvatar => self.left_avatar = reference,
            ImageSlot::RightAvatar => self.right_avatar = reference,
        }
    }

    /// Copy validated form values into the settings.
    pub fn apply_form(&mut self, form: &ColorForm) -> Result<(), SettingsError> {
        form.validate()?;
        self.left_color1.clone_from(&form.left_color1);
        self.left_color2.clone_from(&form.left_color2);
        self.right_color1.clone_from(&form.right_color1);
        self.right_color2.clone_from(&form.right_color2);
        self.bubble_opacity = form.opacity;
        Ok(())
    }

    /// All CSS custom properties the stylesheet reads.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![("--mobile-bg", format!("url('{}')", self.bg_url))];
        vars.extend(ColorForm::from(self).gradient_variables());
        vars
    }

    pub fn opacity_label(&self) -> String {
        opacity_label(self.bubble_opacity)
    }
}

fn opacity_label(opacity: f64) -> String {
    format!("{}%", (opacity * 100.0).round())
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// `#rrggbb` plus alpha as a CSS `rgba(...)` value.
pub fn hex_to_rgba(hex: &str, alpha: f64) -> Option<String> {
    let (r, g, b) = parse_hex(hex)?;
    Some(rgba(r, g, b, alpha))
}

pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> String {
    format!("rgba({r}, {g}, {b}, {alpha})")
}
