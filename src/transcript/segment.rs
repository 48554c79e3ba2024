use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn bracket_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[\s\S]*?\]").expect("static regex"))
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r?\n").expect("static regex"))
}

/// Which speaker a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One speaker turn, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub side: Side,
    pub content: String,
}

impl Segment {
    pub fn left(content: impl Into<String>) -> Self {
        Self {
            side: Side::Left,
            content: content.into(),
        }
    }

    pub fn right(content: impl Into<String>) -> Self {
        Self {
            side: Side::Right,
            content: content.into(),
        }
    }

    /// Classify one already-cut piece. Returns None for pieces with nothing
    /// left after trimming, including `[]`.
    fn classify(piece: &str) -> Option<Self> {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            return None;
        }
        let segment = if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
            Self::right(trimmed[1..trimmed.len() - 1].trim())
        } else {
            Self::left(trimmed)
        };
        (!segment.content.is_empty()).then_some(segment)
    }
}

/// Transcript splitting rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStrategy {
    /// Cut at `[...]` blocks; a right turn may span several lines
    #[default]
    Bracket,
    /// One turn per line; `[...]` only counts when it opens and closes on the same line
    Line,
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    strategy: SegmentStrategy,
}

impl Segmenter {
    pub const fn new(strategy: SegmentStrategy) -> Self {
        Self { strategy }
    }

    pub const fn strategy(&self) -> SegmentStrategy {
        self.strategy
    }

    /// Split preprocessed text into ordered turns.
    pub fn split(&self, text: &str) -> Vec<Segment> {
        let pieces = match self.strategy {
            SegmentStrategy::Bracket => split_keeping_blocks(text),
            SegmentStrategy::Line => line_break_re().split(text).collect(),
        };
        pieces.into_iter().filter_map(Segment::classify).collect()
    }
}

/// Text between bracket blocks, interleaved with the blocks themselves.
fn split_keeping_blocks(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in bracket_block_re().find_iter(text) {
        pieces.push(&text[last..m.start()]);
        pieces.push(m.as_str());
        last = m.end();
    }
    pieces.push(&text[last..]);
    pieces
}
