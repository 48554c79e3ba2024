use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::config::Config;
use crate::controller::HtmlSink;
use crate::template::{PageContext, render_page};
use crate::transcript::SegmentStrategy;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Transcript file (reads stdin when omitted or `-`)
    pub transcript: Option<PathBuf>,
    /// Emit only the message containers, without the page shell
    #[arg(long)]
    pub fragment: bool,
    /// Override the configured segmentation strategy
    #[arg(long, value_enum)]
    pub strategy: Option<SegmentStrategy>,
    /// Page title
    #[arg(long, default_value = "Chat")]
    pub title: String,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(strategy) = self.strategy {
            config.pipeline.strategy = strategy;
        }

        let mut controller = super::open_controller(&config)?;
        controller.load();

        let source = super::read_transcript(self.transcript.as_deref())?;
        let mut sink = HtmlSink::new();
        let count = controller.render(&source, &mut sink);
        tracing::info!(units = count, "rendered");

        let html = if self.fragment {
            sink.to_html()
        } else {
            render_page(&PageContext::new(
                self.title.clone(),
                controller.settings(),
                sink.units(),
            ))?
        };

        match &self.output {
            Some(path) => std::fs::write(path, html)
                .with_context(|| format!("writing {}", path.display()))?,
            None => print!("{html}"),
        }
        Ok(())
    }
}
