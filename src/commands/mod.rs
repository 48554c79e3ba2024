pub mod config;
pub mod render;
pub mod schema;
pub mod segments;
pub mod settings;
pub mod upload;

use std::io::{IsTerminal, Read};
use std::path::Path;

use anyhow::Context;

use crate::config::Config;
use crate::controller::{ChatController, FileSource, StaticSource, StderrNotifier, TranscriptSource};
use crate::storage::FileStore;
use crate::transcript::Pipeline;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

impl OutputFormat {
    /// Pretty on a terminal, text otherwise.
    pub fn resolve(format: Option<Self>) -> Self {
        format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        })
    }
}

pub type CliController = ChatController<FileStore, StderrNotifier>;

/// Controller backed by the configured storage file.
pub fn open_controller(config: &Config) -> anyhow::Result<CliController> {
    let path = config.storage.resolved_path()?;
    let quota = (config.storage.quota_bytes > 0).then_some(config.storage.quota_bytes);
    tracing::debug!(path = %path.display(), ?quota, "opening settings store");

    Ok(ChatController::new(
        FileStore::new(path, quota),
        StderrNotifier,
        Pipeline::new(&config.pipeline, &config.emoji),
        config.storage.key.clone(),
    ))
}

/// Read the transcript from a file, or stdin for `-` or no path.
pub fn read_transcript(path: Option<&Path>) -> anyhow::Result<StaticSource> {
    match path {
        Some(p) if p != Path::new("-") => Ok(StaticSource(
            FileSource {
                path: p.to_path_buf(),
            }
            .read(),
        )),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading transcript from stdin")?;
            Ok(StaticSource::new(text))
        }
    }
}
