use std::io::IsTerminal;

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::controller::SaveOutcome;
use crate::error::ExitError;
use crate::settings::{BubbleSettings, ColorForm};

use super::OutputFormat;

/// Color and opacity overrides; anything left out keeps its current value.
#[derive(Debug, Args)]
pub struct ColorArgs {
    /// Left bubble gradient start (#rrggbb)
    #[arg(long)]
    pub left_color_1: Option<String>,
    /// Left bubble gradient end (#rrggbb)
    #[arg(long)]
    pub left_color_2: Option<String>,
    /// Right bubble gradient start (#rrggbb)
    #[arg(long)]
    pub right_color_1: Option<String>,
    /// Right bubble gradient end (#rrggbb)
    #[arg(long)]
    pub right_color_2: Option<String>,
    /// Bubble opacity, 0 to 1
    #[arg(long)]
    pub opacity: Option<f64>,
}

impl ColorArgs {
    fn form(&self, current: &BubbleSettings) -> ColorForm {
        let mut form = ColorForm::from(current);
        let fields = [
            (&self.left_color_1, &mut form.left_color1),
            (&self.left_color_2, &mut form.left_color2),
            (&self.right_color_1, &mut form.right_color1),
            (&self.right_color_2, &mut form.right_color2),
        ];
        for (arg, field) in fields {
            if let Some(value) = arg {
                field.clone_from(value);
            }
        }
        if let Some(opacity) = self.opacity {
            form.opacity = opacity;
        }
        form
    }
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the persisted settings merged over defaults
    Show {
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Change colors or opacity and save
    Set(ColorArgs),
    /// Print the CSS variables a change would produce, without saving
    Preview(ColorArgs),
    /// Clear persisted settings and return to the defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

impl SettingsCommand {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match self {
            SettingsCommand::Show { format } => show(config, *format),
            SettingsCommand::Set(args) => set(config, args),
            SettingsCommand::Preview(args) => preview(config, args),
            SettingsCommand::Reset { yes } => reset(config, *yes),
        }
    }
}

fn show(config: &Config, format: Option<OutputFormat>) -> anyhow::Result<()> {
    let mut controller = super::open_controller(config)?;
    let settings = controller.load().clone();

    match OutputFormat::resolve(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Text => {
            for (key, value) in fields(&settings) {
                println!("{key}  {value}");
            }
        }
        OutputFormat::Pretty => {
            println!("=== Bubble Settings ===\n");
            for (key, value) in fields(&settings) {
                println!("  {key:<14} {value}");
            }
            println!("\nCSS variables:");
            for (name, value) in settings.css_variables() {
                println!("  {name}: {}", abbreviate(&value));
            }
        }
    }
    Ok(())
}

fn set(config: &Config, args: &ColorArgs) -> anyhow::Result<()> {
    let mut controller = super::open_controller(config)?;
    controller.load();
    let form = args.form(controller.settings());

    match controller.save(&form).map_err(ExitError::from)? {
        SaveOutcome::Saved => {
            println!("settings saved (opacity {})", controller.settings().opacity_label());
            Ok(())
        }
        SaveOutcome::RolledBack => Err(ExitError::SaveRejected {
            message: "previous settings kept".to_string(),
        }
        .into()),
    }
}

fn preview(config: &Config, args: &ColorArgs) -> anyhow::Result<()> {
    let mut controller = super::open_controller(config)?;
    controller.load();
    let form = args.form(controller.settings());
    form.validate().map_err(ExitError::from)?;

    for (name, value) in controller.live_preview(&form) {
        println!("{name}: {value};");
    }
    println!("/* opacity {} */", form.opacity_label());
    Ok(())
}

fn reset(config: &Config, yes: bool) -> anyhow::Result<()> {
    if !yes {
        if !std::io::stdin().is_terminal() {
            return Err(ExitError::Input(
                "refusing to reset without --yes in a non-interactive session".into(),
            )
            .into());
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Restore all default settings? Uploaded images and chosen colors will be lost.")
            .default(false)
            .interact()
            .context("reading user confirmation")?;
        if !confirmed {
            println!("reset cancelled");
            return Ok(());
        }
    }

    let mut controller = super::open_controller(config)?;
    controller.reset().map_err(ExitError::from)?;
    println!("settings reset to defaults");
    Ok(())
}

fn fields(settings: &BubbleSettings) -> Vec<(&'static str, String)> {
    vec![
        ("bgUrl", abbreviate(&settings.bg_url)),
        ("leftAvatar", abbreviate(&settings.left_avatar)),
        ("rightAvatar", abbreviate(&settings.right_avatar)),
        ("leftColor1", settings.left_color1.clone()),
        ("leftColor2", settings.left_color2.clone()),
        ("rightColor1", settings.right_color1.clone()),
        ("rightColor2", settings.right_color2.clone()),
        ("bubbleOpacity", settings.bubble_opacity.to_string()),
    ]
}

/// Embedded images are shown by type and size rather than in full.
fn abbreviate(value: &str) -> String {
    if value.contains("data:")
        && let Some((head, body)) = value.split_once(";base64,")
    {
        let (body, tail) = body.strip_suffix("')").map_or((body, ""), |b| (b, "')"));
        return format!("{head};base64,… ({} bytes){tail}", body.len());
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_args_override_only_given_fields() {
        let args = ColorArgs {
            left_color_1: None,
            left_color_2: Some("#000000".to_string()),
            right_color_1: None,
            right_color_2: None,
            opacity: Some(0.4),
        };
        let current = BubbleSettings::default();
        let form = args.form(&current);
        assert_eq!(form.left_color1, current.left_color1);
        assert_eq!(form.left_color2, "#000000");
        assert_eq!(form.opacity, 0.4);
    }

    #[test]
    fn abbreviate_shortens_data_urls() {
        assert_eq!(
            abbreviate("data:image/png;base64,AAAA"),
            "data:image/png;base64,… (4 bytes)"
        );
        assert_eq!(
            abbreviate("url('data:image/png;base64,AAAA')"),
            "url('data:image/png;base64,… (4 bytes)')"
        );
        assert_eq!(abbreviate("https://x.test/a.png"), "https://x.test/a.png");
    }
}
