//! Top-level controller: owns the settings record and drives rendering.
//!
//! Everything here runs on one thread. Each trigger (load, save, reset,
//! upload, preview) runs to completion before the next one starts.

use std::path::PathBuf;

use crate::bubble::{self, MessageUnit};
use crate::settings::{BubbleSettings, ColorForm, ImageSlot, SettingsError};
use crate::storage::{SettingsStore, StorageError};
use crate::transcript::Pipeline;
use crate::upload::Upload;

/// Where the raw transcript comes from. Read again on every render.
pub trait TranscriptSource {
    /// None means there is no transcript at all, which renders nothing.
    fn read(&self) -> Option<String>;
}

/// A transcript held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Option<String>);

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }
}

impl TranscriptSource for StaticSource {
    fn read(&self) -> Option<String> {
        self.0.clone()
    }
}

/// A transcript file on disk; an unreadable file counts as missing.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl TranscriptSource for FileSource {
    fn read(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "transcript unavailable: {e}");
                None
            }
        }
    }
}

/// Display surface receiving message units.
pub trait OutputSink {
    fn clear(&mut self);
    fn append(&mut self, unit: MessageUnit);
    /// Swap avatar references in place without rebuilding units.
    fn update_avatars(&mut self, left: &str, right: &str);
}

/// Collects units and renders them to markup.
#[derive(Debug, Clone, Default)]
pub struct HtmlSink {
    units: Vec<MessageUnit>,
}

impl HtmlSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &[MessageUnit] {
        &self.units
    }

    pub fn to_html(&self) -> String {
        bubble::units_to_html(&self.units)
    }
}

impl OutputSink for HtmlSink {
    fn clear(&mut self) {
        self.units.clear();
    }

    fn append(&mut self, unit: MessageUnit) {
        self.units.push(unit);
    }

    fn update_avatars(&mut self, left: &str, right: &str) {
        for unit in &mut self.units {
            let avatar = match unit.side {
                crate::transcript::Side::Left => left,
                crate::transcript::Side::Right => right,
            };
            avatar.clone_into(&mut unit.avatar);
        }
    }
}

/// Something the user needs to be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Persisting failed; settings were rolled back.
    SaveFailed(String),
    /// An upload is big enough to cause trouble.
    LargeUpload(String),
    /// The persisted record could not be read; defaults are in use.
    UnreadableSettings(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::SaveFailed(m) | Notice::LargeUpload(m) | Notice::UnreadableSettings(m) => m,
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Prints notices to stderr.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, notice: Notice) {
        tracing::warn!(?notice, "user notice");
        eprintln!("warning: {}", notice.message());
    }
}

/// Keeps notices for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notices: Vec<Notice>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The store rejected the record; in-memory settings were reloaded.
    RolledBack,
}

pub struct ChatController<S, N> {
    defaults: BubbleSettings,
    settings: BubbleSettings,
    store: S,
    notifier: N,
    key: String,
    pipeline: Pipeline,
    panel_open: bool,
}

impl<S: SettingsStore, N: Notifier> ChatController<S, N> {
    pub fn new(store: S, notifier: N, pipeline: Pipeline, key: impl Into<String>) -> Self {
        let defaults = BubbleSettings::default();
        Self {
            settings: defaults.clone(),
            defaults,
            store,
            notifier,
            key: key.into(),
            pipeline,
            panel_open: false,
        }
    }

    pub fn with_defaults(mut self, defaults: BubbleSettings) -> Self {
        self.settings = defaults.clone();
        self.defaults = defaults;
        self
    }

    pub fn settings(&self) -> &BubbleSettings {
        &self.settings
    }

    pub fn defaults(&self) -> &BubbleSettings {
        &self.defaults
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Replace in-memory settings with the persisted record merged over
    /// defaults. With nothing persisted the defaults are the durable state.
    pub fn load(&mut self) -> &BubbleSettings {
        self.settings = match self.store.get(&self.key) {
            Ok(Some(json)) => match BubbleSettings::from_json(&json, &self.defaults) {
                Ok(settings) => settings,
                Err(e) => {
                    self.notifier
                        .notify(Notice::UnreadableSettings(format!("{e}; using defaults")));
                    self.defaults.clone()
                }
            },
            Ok(None) => self.defaults.clone(),
            Err(e) => {
                self.notifier
                    .notify(Notice::UnreadableSettings(format!("{e}; using defaults")));
                self.defaults.clone()
            }
        };
        &self.settings
    }

    /// Rebuild every unit from the current transcript. Returns the unit count.
    pub fn render(&self, source: &impl TranscriptSource, sink: &mut impl OutputSink) -> usize {
        sink.clear();
        let Some(raw) = source.read() else {
            tracing::debug!("no transcript source, nothing to render");
            return 0;
        };

        let segments = self.pipeline.segments(&raw);
        let mut count = 0;
        for segment in &segments {
            if let Some(unit) = bubble::build_unit(segment, &self.settings) {
                sink.append(unit);
                count += 1;
            }
        }
        tracing::debug!(segments = segments.len(), units = count, "rendered transcript");
        count
    }

    /// Point existing units at the current avatars.
    pub fn update_avatars(&self, sink: &mut impl OutputSink) {
        sink.update_avatars(&self.settings.left_avatar, &self.settings.right_avatar);
    }

    /// Push the current settings to the display. A full render rebuilds every
    /// unit; otherwise only avatars are swapped. Returns the CSS variables
    /// the stylesheet should receive.
    pub fn apply_settings(
        &self,
        full_render: bool,
        source: &impl TranscriptSource,
        sink: &mut impl OutputSink,
    ) -> Vec<(&'static str, String)> {
        if full_render {
            self.render(source, sink);
        } else {
            self.update_avatars(sink);
        }
        self.settings.css_variables()
    }

    /// Copy the form into the settings and persist them.
    ///
    /// Invalid form values are rejected before anything changes. When the
    /// store refuses the record the user is notified and the in-memory
    /// settings return to whatever is persisted.
    pub fn save(&mut self, form: &ColorForm) -> Result<SaveOutcome, SettingsError> {
        self.settings.apply_form(form)?;
        let json = self.settings.to_json()?;
        self.panel_open = false;

        match self.store.set(&self.key, &json) {
            Ok(()) => {
                tracing::info!(bytes = json.len(), "settings saved");
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                let message = match &e {
                    StorageError::QuotaExceeded { .. } => format!(
                        "could not save settings ({e}); an uploaded image is probably too large, try a smaller one"
                    ),
                    _ => format!("could not save settings ({e})"),
                };
                self.notifier.notify(Notice::SaveFailed(message));
                self.load();
                Ok(SaveOutcome::RolledBack)
            }
        }
    }

    /// Forget persisted settings and go back to the defaults.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.store.remove(&self.key)?;
        self.settings = self.defaults.clone();
        self.panel_open = false;
        tracing::info!("settings reset to defaults");
        Ok(())
    }

    /// Take an uploaded image into the given slot. Nothing is persisted until
    /// the next save. Returns false when no file was selected.
    pub fn upload(&mut self, slot: ImageSlot, upload: Option<Upload>) -> bool {
        let Some(upload) = upload else {
            return false;
        };
        if let Some(warning) = upload.warning {
            self.notifier.notify(Notice::LargeUpload(warning));
        }
        tracing::debug!(slot = slot.key(), bytes = upload.size, "image uploaded");
        self.settings.set_image(slot, upload.data_url);
        true
    }

    /// CSS variables for unsaved form values. Settings are left alone.
    pub fn live_preview(&self, form: &ColorForm) -> Vec<(&'static str, String)> {
        form.gradient_variables()
    }

    pub fn toggle_panel(&mut self) -> bool {
        self.panel_open = !self.panel_open;
        self.panel_open
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }
}
