use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::config::Config;
use crate::controller::TranscriptSource;
use crate::transcript::{Pipeline, Segment, SegmentStrategy};

use super::OutputFormat;

#[derive(Debug, Args)]
pub struct SegmentsArgs {
    /// Transcript file (reads stdin when omitted or `-`)
    pub transcript: Option<PathBuf>,
    /// Override the configured segmentation strategy
    #[arg(long, value_enum)]
    pub strategy: Option<SegmentStrategy>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub strategy: SegmentStrategy,
    pub emoji_tags: usize,
    pub segments: Vec<Segment>,
}

impl SegmentsArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut pipeline_config = config.pipeline.clone();
        if let Some(strategy) = self.strategy {
            pipeline_config.strategy = strategy;
        }
        let pipeline = Pipeline::new(&pipeline_config, &config.emoji);

        let raw = super::read_transcript(self.transcript.as_deref())?
            .read()
            .unwrap_or_default();
        let report = SegmentReport {
            strategy: pipeline.strategy(),
            emoji_tags: pipeline.preprocessor().count_tags(&raw),
            segments: pipeline.segments(&raw),
        };

        match OutputFormat::resolve(self.format) {
            OutputFormat::Pretty => print_pretty(&report),
            OutputFormat::Text => print_text(&report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }
}

fn print_pretty(report: &SegmentReport) {
    println!("=== Segments ({:?}) ===\n", report.strategy);
    for (i, segment) in report.segments.iter().enumerate() {
        let marker = match segment.side {
            crate::transcript::Side::Left => "◀",
            crate::transcript::Side::Right => "▶",
        };
        println!("{:>3} {marker} {}", i + 1, segment.content.replace('\n', "\n      "));
    }
    println!(
        "\n{} segment(s), {} emoji tag(s)",
        report.segments.len(),
        report.emoji_tags
    );
}

fn print_text(report: &SegmentReport) {
    for segment in &report.segments {
        println!("{}\t{}", segment.side, segment.content.replace('\n', "\\n"));
    }
}
