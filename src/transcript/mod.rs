//! Transcript parsing: emoji substitution followed by turn segmentation.
//!
//! The accepted grammar, applied in order:
//!
//! ```text
//! unescape    &lt;emoji&gt;  => <emoji>      (only when `unescape` is enabled)
//!             &lt;/emoji&gt; => </emoji>
//! substitute  <emoji>(.*?)</emoji>  => <img src="{base}{1}" ...>
//! split       bracket: /(\[[\s\S]*?\])/ with captures kept
//!             line:    /\r?\n/
//! piece       trim; drop if empty
//!             "[" .. "]"  => Right(trim(interior))
//!             otherwise   => Left(piece)
//! ```
//!
//! Brackets are matched first-open to next-close. `[a [b] c]` is not a
//! nested turn: it yields `Right("a [b")` then `Left("c]")`. Under the line
//! strategy a bracketed turn spanning several lines falls apart into plain
//! left lines.

mod fragment;
mod preprocess;
mod segment;

pub use fragment::Fragment;
pub use preprocess::Preprocessor;
pub use segment::{Segment, SegmentStrategy, Segmenter, Side};

use crate::config::{EmojiConfig, PipelineConfig};

/// Preprocessor and segmenter wired together for one configuration.
#[derive(Debug)]
pub struct Pipeline {
    preprocessor: Preprocessor,
    segmenter: Segmenter,
}

impl Pipeline {
    pub fn new(pipeline: &PipelineConfig, emoji: &EmojiConfig) -> Self {
        Self {
            preprocessor: Preprocessor::new(emoji, pipeline.unescape),
            segmenter: Segmenter::new(pipeline.strategy),
        }
    }

    pub fn strategy(&self) -> SegmentStrategy {
        self.segmenter.strategy()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Preprocess `raw` and split it into ordered turns.
    pub fn segments(&self, raw: &str) -> Vec<Segment> {
        let text = self.preprocessor.process(raw);
        let segments = self.segmenter.split(&text);
        tracing::debug!(
            strategy = ?self.segmenter.strategy(),
            count = segments.len(),
            "segmented transcript"
        );
        segments
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default(), &EmojiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(strategy: SegmentStrategy) -> Pipeline {
        let config = PipelineConfig {
            strategy,
            unescape: true,
        };
        let emoji = EmojiConfig {
            base_url: "https://e.test/".to_string(),
            size: 128,
        };
        Pipeline::new(&config, &emoji)
    }

    #[test]
    fn hi_hello_bye_yields_three_turns_in_order() {
        let segments = pipeline(SegmentStrategy::Bracket).segments("[Hi]\nHello\n[Bye]");
        assert_eq!(
            segments,
            vec![
                Segment::right("Hi"),
                Segment::left("Hello"),
                Segment::right("Bye"),
            ]
        );
    }

    #[test]
    fn hi_hello_bye_same_under_line_strategy() {
        let segments = pipeline(SegmentStrategy::Line).segments("[Hi]\nHello\n[Bye]");
        assert_eq!(
            segments,
            vec![
                Segment::right("Hi"),
                Segment::left("Hello"),
                Segment::right("Bye"),
            ]
        );
    }

    #[test]
    fn escaped_emoji_inside_right_turn_resolves_before_split() {
        let segments = pipeline(SegmentStrategy::Bracket)
            .segments("[&lt;emoji&gt;wave.png&lt;/emoji&gt;]");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].side, Side::Right);
        assert!(segments[0].content.starts_with("<img src=\"https://e.test/wave.png\""));
    }

    #[test]
    fn emoji_key_with_bracket_is_substituted_first() {
        // Substitution runs before splitting, so the bracket lands inside src.
        let segments = pipeline(SegmentStrategy::Bracket).segments("hey <emoji>a]b</emoji>");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].side, Side::Left);
        assert!(segments[0].content.contains("https://e.test/a]b"));
    }

    #[test]
    fn whitespace_only_transcript_has_no_turns() {
        assert!(pipeline(SegmentStrategy::Bracket).segments(" \n\t\n ").is_empty());
        assert!(pipeline(SegmentStrategy::Line).segments(" \n\t\n ").is_empty());
    }
}
