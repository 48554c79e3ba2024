//! Turning an image file into an embedded `data:` reference.

use std::path::Path;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::ExitError;

/// An image file read and encoded for storage in the settings record.
#[derive(Debug, Clone)]
pub struct Upload {
    pub data_url: String,
    pub size: u64,
    /// Set when the file is large enough that saving it may exceed the storage quota.
    pub warning: Option<String>,
}

pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

pub fn data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Warning text for an upload of `size` bytes, if it crosses `threshold`.
pub fn size_warning(size: u64, threshold: u64) -> Option<String> {
    #[allow(clippy::cast_precision_loss)]
    let mb = size as f64 / 1024.0 / 1024.0;
    (size > threshold).then(|| {
        format!(
            "image is large ({mb:.2}MB) and may slow the page or fail to save; consider a compressed copy"
        )
    })
}

/// Read an image file into an embedded reference.
pub fn read_image(path: &Path, warn_threshold: u64) -> anyhow::Result<Upload> {
    let mime = mime_from_path(path).ok_or_else(|| {
        ExitError::Input(format!("{} is not a supported image type", path.display()))
    })?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let size = bytes.len() as u64;

    Ok(Upload {
        data_url: data_url(&bytes, mime),
        size,
        warning: size_warning(size, warn_threshold),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_is_base64_with_mime() {
        assert_eq!(data_url(b"hi", "image/png"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(mime_from_path(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(mime_from_path(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_from_path(Path::new("notes.txt")), None);
        assert_eq!(mime_from_path(Path::new("noext")), None);
    }

    #[test]
    fn warning_only_above_threshold() {
        let threshold = 3 * 1024 * 1024;
        assert!(size_warning(threshold, threshold).is_none());
        let warning = size_warning(threshold + 1024 * 1024, threshold).unwrap();
        assert!(warning.contains("4.00MB"), "got: {warning}");
    }

    #[test]
    fn read_image_encodes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let upload = read_image(&path, 1024).unwrap();
        assert_eq!(upload.size, 6);
        assert!(upload.data_url.starts_with("data:image/gif;base64,"));
        assert!(upload.warning.is_none());
    }

    #[test]
    fn read_image_rejects_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = read_image(&path, 1024).unwrap_err();
        assert!(err.downcast_ref::<ExitError>().is_some());
    }
}
