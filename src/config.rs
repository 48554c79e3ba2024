use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::transcript::SegmentStrategy;

/// Config file name constants.
pub const CONFIG_TOML: &str = ".chat-bubbles.toml";
pub const CONFIG_JSON: &str = ".chat-bubbles.json";

/// Find the config file path, preferring .chat-bubbles.toml over .chat-bubbles.json.
/// Returns None if neither exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let toml_path = dir.join(CONFIG_TOML);
    if toml_path.exists() {
        return Some(toml_path);
    }
    let json_path = dir.join(CONFIG_JSON);
    if json_path.exists() {
        return Some(json_path);
    }
    None
}

/// Resolve the effective config: an explicit path must exist, otherwise the
/// working directory is searched and built-in defaults are used when nothing
/// is found.
pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path);
    }
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    match find_config(&cwd) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Top-level .chat-bubbles.toml config.
///
/// Every section is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub emoji: EmojiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// How the transcript is cut into turns
    #[serde(default)]
    pub strategy: SegmentStrategy,
    /// Recover `&lt;emoji&gt;` tags that arrived HTML-escaped
    #[serde(default = "default_true")]
    pub unescape: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: SegmentStrategy::default(),
            unescape: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmojiConfig {
    /// Remote base the tag key is appended to
    #[serde(default = "default_emoji_base", alias = "baseUrl")]
    pub base_url: String,
    /// Rendered width and height in pixels
    #[serde(default = "default_emoji_size")]
    pub size: u32,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            base_url: default_emoji_base(),
            size: default_emoji_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// Storage file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_storage_key")]
    pub key: String,
    #[serde(default = "default_quota", alias = "quotaBytes")]
    pub quota_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_storage_key(),
            quota_bytes: default_quota(),
        }
    }
}

impl StorageConfig {
    /// Storage file location, falling back to `<data dir>/chat-bubbles/storage.json`.
    pub fn resolved_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| ExitError::Config("no platform data directory; set storage.path".into()))?;
        Ok(base.join("chat-bubbles").join("storage.json"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadConfig {
    /// Uploads larger than this produce a warning
    #[serde(default = "default_warn_bytes", alias = "warnBytes")]
    pub warn_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            warn_bytes: default_warn_bytes(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_emoji_base() -> String { "https://files.catbox.moe/emoji/".into() }
fn default_emoji_size() -> u32 { 128 }
fn default_storage_key() -> String { crate::storage::STORAGE_KEY.into() }
fn default_quota() -> u64 { 5 * 1024 * 1024 }
fn default_warn_bytes() -> u64 { 3 * 1024 * 1024 }

impl Config {
    /// Load config from a file (TOML or JSON, auto-detected by extension).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "toml" => Self::parse_toml(&contents),
            "json" => Self::parse_json(&contents),
            _ => Self::parse_toml(&contents).or_else(|_| Self::parse_json(&contents)),
        }
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| {
            ExitError::Config(format!("invalid .chat-bubbles.toml: {e}")).into()
        })
    }

    /// Parse config from a JSON string.
    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ExitError::Config(format!("invalid .chat-bubbles.json: {e}")).into()
        })
    }

    /// Serialize config to a TOML string with helpful comments.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        fn set_table_comment(doc: &mut toml_edit::DocumentMut, key: &str, comment: &str) {
            if let Some(tbl) = doc.get_mut(key).and_then(|item| item.as_table_mut()) {
                tbl.decor_mut().set_prefix(comment);
            }
        }

        let raw = toml::to_string_pretty(self).context("serializing config to TOML")?;

        let mut doc: toml_edit::DocumentMut = raw
            .parse()
            .context("parsing generated TOML for comment injection")?;

        doc.decor_mut().set_prefix("# chat-bubbles configuration\n\n");

        set_table_comment(
            &mut doc,
            "pipeline",
            "# Transcript splitting: \"bracket\" keeps multi-line [..] turns, \"line\" splits per line\n",
        );
        set_table_comment(&mut doc, "emoji", "\n# <emoji>KEY</emoji> resolves to {base_url}KEY\n");
        set_table_comment(&mut doc, "storage", "\n# Persisted bubble settings\n");
        set_table_comment(&mut doc, "upload", "\n# Embedded image uploads\n");

        Ok(doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_toml_config() {
        let toml_str = r#"
[pipeline]
strategy = "line"
unescape = false

[emoji]
base_url = "https://cdn.example.com/e/"
size = 64

[storage]
path = "/tmp/bubbles.json"
key = "customKey"
quota_bytes = 1024

[upload]
warn_bytes = 10
"#;

        let config = Config::parse_toml(toml_str).unwrap();
        assert_eq!(config.pipeline.strategy, SegmentStrategy::Line);
        assert!(!config.pipeline.unescape);
        assert_eq!(config.emoji.base_url, "https://cdn.example.com/e/");
        assert_eq!(config.emoji.size, 64);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/bubbles.json")));
        assert_eq!(config.storage.key, "customKey");
        assert_eq!(config.storage.quota_bytes, 1024);
        assert_eq!(config.upload.warn_bytes, 10);
    }

    #[test]
    fn parse_json_config_with_camel_case() {
        let json = r#"{
            "pipeline": { "strategy": "bracket" },
            "emoji": { "baseUrl": "https://e.example/", "size": 64 },
            "storage": { "quotaBytes": 2048 },
            "upload": { "warnBytes": 99 }
        }"#;

        let config = Config::parse_json(json).unwrap();
        assert_eq!(config.pipeline.strategy, SegmentStrategy::Bracket);
        assert!(config.pipeline.unescape);
        assert_eq!(config.emoji.base_url, "https://e.example/");
        assert_eq!(config.storage.quota_bytes, 2048);
        assert_eq!(config.upload.warn_bytes, 99);
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.pipeline.strategy, SegmentStrategy::Bracket);
        assert!(config.pipeline.unescape);
        assert_eq!(config.emoji.size, 128);
        assert_eq!(config.storage.key, "chatBubbleSettings");
        assert_eq!(config.storage.quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.upload.warn_bytes, 3 * 1024 * 1024);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn parse_malformed_toml() {
        let result = Config::parse_toml("not valid toml [[[");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid .chat-bubbles.toml"));
        assert!(err.downcast_ref::<ExitError>().is_some());
    }

    #[test]
    fn parse_unknown_strategy_fails() {
        let result = Config::parse_toml("[pipeline]\nstrategy = \"paragraph\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn roundtrip_toml_with_comments() {
        let mut config = Config::default();
        config.pipeline.strategy = SegmentStrategy::Line;
        config.emoji.size = 64;

        let output = config.to_toml().unwrap();
        assert!(output.contains("# chat-bubbles configuration"));
        assert!(output.contains("# Persisted bubble settings"));

        let parsed = Config::parse_toml(&output).unwrap();
        assert_eq!(parsed.pipeline.strategy, SegmentStrategy::Line);
        assert_eq!(parsed.emoji.size, 64);
    }

    #[test]
    fn find_config_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_TOML), "").unwrap();
        std::fs::write(dir.path().join(CONFIG_JSON), "{}").unwrap();

        let found = find_config(dir.path()).unwrap();
        assert!(found.to_string_lossy().ends_with(CONFIG_TOML));
    }

    #[test]
    fn find_config_returns_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config(dir.path()).is_none());
    }

    #[test]
    fn load_detects_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"emoji": {"size": 32}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.emoji.size, 32);
    }

    #[test]
    fn explicit_storage_path_wins() {
        let storage = StorageConfig {
            path: Some(PathBuf::from("/srv/bubbles.json")),
            ..StorageConfig::default()
        };
        assert_eq!(storage.resolved_path().unwrap(), PathBuf::from("/srv/bubbles.json"));
    }
}
