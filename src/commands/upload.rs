use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::controller::SaveOutcome;
use crate::error::ExitError;
use crate::settings::{ColorForm, ImageSlot};

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Which image to replace
    #[arg(value_enum)]
    pub slot: ImageSlot,
    /// Image file (png, jpeg, gif, webp, bmp, svg, avif); nothing happens when omitted
    pub file: Option<PathBuf>,
}

impl UploadArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let Some(file) = &self.file else {
            tracing::debug!("no file selected, nothing to upload");
            return Ok(());
        };
        let upload = crate::upload::read_image(file, config.upload.warn_bytes)?;
        let size = upload.size;

        let mut controller = super::open_controller(config)?;
        controller.load();
        controller.upload(self.slot, Some(upload));

        let form = ColorForm::from(controller.settings());
        match controller.save(&form).map_err(ExitError::from)? {
            SaveOutcome::Saved => {
                println!("{} updated ({size} bytes embedded)", self.slot.key());
                Ok(())
            }
            SaveOutcome::RolledBack => Err(ExitError::SaveRejected {
                message: format!("{} not updated; use a smaller image", self.slot.key()),
            }
            .into()),
        }
    }
}
