use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::EmojiConfig;

const ESCAPED_OPEN: &str = "&lt;emoji&gt;";
const ESCAPED_CLOSE: &str = "&lt;/emoji&gt;";

fn emoji_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<emoji>(.*?)</emoji>").expect("static regex"))
}

/// Resolves inline `<emoji>KEY</emoji>` tags into image references.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    base_url: String,
    size: u32,
    unescape: bool,
}

impl Preprocessor {
    pub fn new(emoji: &EmojiConfig, unescape: bool) -> Self {
        Self {
            base_url: emoji.base_url.clone(),
            size: emoji.size,
            unescape,
        }
    }

    /// Normalize raw transcript text. Everything other than emoji tags is
    /// passed through untouched.
    pub fn process(&self, raw: &str) -> String {
        let text = if self.unescape {
            unescape_tags(raw)
        } else {
            Cow::Borrowed(raw)
        };

        emoji_tag_re()
            .replace_all(&text, |caps: &Captures<'_>| self.image_for(&caps[1]))
            .into_owned()
    }

    /// Number of emoji tags `process` would substitute in `raw`.
    pub fn count_tags(&self, raw: &str) -> usize {
        let text = if self.unescape {
            unescape_tags(raw)
        } else {
            Cow::Borrowed(raw)
        };
        emoji_tag_re().find_iter(&text).count()
    }

    /// Image reference markup for a single tag key.
    pub fn image_for(&self, key: &str) -> String {
        format!(
            r#"<img src="{}{}" alt="{}" width="{size}" height="{size}">"#,
            self.base_url,
            key,
            crate::bubble::escape_attr(key),
            size = self.size
        )
    }
}

fn unescape_tags(raw: &str) -> Cow<'_, str> {
    if raw.contains(ESCAPED_OPEN) || raw.contains(ESCAPED_CLOSE) {
        Cow::Owned(raw.replace(ESCAPED_OPEN, "<emoji>").replace(ESCAPED_CLOSE, "</emoji>"))
    } else {
        Cow::Borrowed(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocessor(unescape: bool) -> Preprocessor {
        let emoji = EmojiConfig {
            base_url: "https://e.test/stickers/".to_string(),
            size: 128,
        };
        Preprocessor::new(&emoji, unescape)
    }

    #[test]
    fn text_without_tags_is_unchanged() {
        let input = "[Hi there]\n<b>bold</b> & <i>friends</i>\n[]";
        assert_eq!(preprocessor(true).process(input), input);
    }

    #[test]
    fn tag_becomes_image_with_key_suffix() {
        let out = preprocessor(true).process("look <emoji>cat.gif</emoji>!");
        assert_eq!(
            out,
            r#"look <img src="https://e.test/stickers/cat.gif" alt="cat.gif" width="128" height="128">!"#
        );
    }

    #[test]
    fn every_tag_is_replaced_with_its_own_key() {
        let p = preprocessor(true);
        let input = "<emoji>a</emoji> mid <emoji>b c</emoji>\n<emoji>d/e.png</emoji>";
        assert_eq!(p.count_tags(input), 3);

        let out = p.process(input);
        assert_eq!(out.matches("<img ").count(), 3);
        assert!(out.contains(r#"src="https://e.test/stickers/a""#));
        assert!(out.contains(r#"src="https://e.test/stickers/b c""#));
        assert!(out.contains(r#"src="https://e.test/stickers/d/e.png""#));
        assert!(!out.contains("<emoji>"));
    }

    #[test]
    fn tags_match_non_greedily() {
        let out = preprocessor(true).process("<emoji>x</emoji><emoji>y</emoji>");
        assert!(out.contains("stickers/x\""));
        assert!(out.contains("stickers/y\""));
    }

    #[test]
    fn tag_may_span_lines() {
        let out = preprocessor(true).process("<emoji>multi\nline</emoji>");
        assert!(out.contains("stickers/multi\nline\""));
    }

    #[test]
    fn unterminated_tag_stays_literal() {
        let input = "oops <emoji>never closed";
        assert_eq!(preprocessor(true).process(input), input);
        assert_eq!(preprocessor(true).count_tags(input), 0);
    }

    #[test]
    fn escaped_tags_resolve_when_unescape_enabled() {
        let out = preprocessor(true).process("&lt;emoji&gt;heart&lt;/emoji&gt;");
        assert_eq!(
            out,
            r#"<img src="https://e.test/stickers/heart" alt="heart" width="128" height="128">"#
        );
    }

    #[test]
    fn escaped_tags_pass_through_when_unescape_disabled() {
        let input = "&lt;emoji&gt;heart&lt;/emoji&gt;";
        assert_eq!(preprocessor(false).process(input), input);
        assert_eq!(preprocessor(false).count_tags(input), 0);
    }

    #[test]
    fn other_escaped_markup_is_left_alone() {
        let input = "&lt;b&gt;not bold&lt;/b&gt;";
        assert_eq!(preprocessor(true).process(input), input);
    }

    #[test]
    fn alt_text_is_escaped_key() {
        let out = preprocessor(true).process(r#"<emoji>say "hi"</emoji>"#);
        assert!(out.contains(r#"alt="say &quot;hi&quot;""#), "got: {out}");
    }

    #[test]
    fn size_follows_config() {
        let emoji = EmojiConfig {
            base_url: "/e/".to_string(),
            size: 64,
        };
        let out = Preprocessor::new(&emoji, true).process("<emoji>k</emoji>");
        assert_eq!(out, r#"<img src="/e/k" alt="k" width="64" height="64">"#);
    }
}
