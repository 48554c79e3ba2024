mod bubble;
mod commands;
mod config;
mod controller;
mod error;
mod settings;
mod storage;
mod telemetry;
mod template;
mod transcript;
mod upload;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommand;
use commands::render::RenderArgs;
use commands::segments::SegmentsArgs;
use commands::settings::SettingsCommand;
use commands::upload::UploadArgs;

#[derive(Debug, Parser)]
#[command(
    name = "chat-bubbles",
    version,
    about = "Render scripted dialogue transcripts as themed chat bubbles"
)]
struct Cli {
    /// Config file (defaults to .chat-bubbles.toml or .chat-bubbles.json in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a transcript to HTML
    Render(RenderArgs),
    /// Show how a transcript is split into turns
    Segments(SegmentsArgs),
    /// Show or change the persisted bubble settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Embed an image as background or avatar and save it
    Upload(UploadArgs),
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the JSON Schema for .chat-bubbles.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Segments(_) => "segments",
            Self::Settings { .. } => "settings",
            Self::Upload(_) => "upload",
            Self::Config { .. } => "config",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let load_config = || config::resolve(cli.config.as_deref());

    let result = match &cli.command {
        Commands::Render(args) => load_config().and_then(|c| args.execute(&c)),
        Commands::Segments(args) => load_config().and_then(|c| args.execute(&c)),
        Commands::Settings { command } => load_config().and_then(|c| command.execute(&c)),
        Commands::Upload(args) => load_config().and_then(|c| args.execute(&c)),
        Commands::Config {
            command: ConfigCommand::Init { force },
        } => commands::config::init(*force),
        Commands::Config { command } => load_config().and_then(|c| command.execute(&c)),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
