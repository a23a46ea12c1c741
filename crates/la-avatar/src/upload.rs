//! Avatar upload validation and file naming.

use std::path::Path;

use la_core::{Error, Result};

use crate::storage::UploadStorage;

/// Shown for any file that is not an accepted image.
pub const INVALID_IMAGE: &str = "Please upload a valid image file for the avatar.";

/// Accepted avatar image types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Gif,
    Png,
}

impl ImageKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    fn from_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::Png => Some(Self::Png),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
        }
    }
}

/// A file that passed [`UploadPolicy::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub kind: ImageKind,
    /// Lowercased extension including the dot, e.g. `.jpg`.
    pub extension: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Check the submitted name and content. The extension must be one of
    /// the accepted image types and the bytes must actually be that kind of
    /// image.
    pub fn validate(&self, file_name: &str, bytes: &[u8]) -> Result<AcceptedUpload> {
        if file_name.contains(".php") {
            return Err(Error::validation(
                "For security reasons, the extension \".php\" cannot be in your file name.",
            ));
        }

        if bytes.len() as u64 > self.max_bytes {
            return Err(Error::validation(format!(
                "The avatar exceeds the maximum upload size of {} bytes.",
                self.max_bytes
            )));
        }

        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::validation(INVALID_IMAGE))?;
        let kind = ImageKind::from_extension(ext).ok_or_else(|| Error::validation(INVALID_IMAGE))?;

        let sniffed = image::guess_format(bytes)
            .ok()
            .and_then(ImageKind::from_format)
            .ok_or_else(|| Error::validation(INVALID_IMAGE))?;
        if sniffed != kind {
            return Err(Error::validation(INVALID_IMAGE));
        }

        Ok(AcceptedUpload {
            kind,
            extension: format!(".{}", ext.to_ascii_lowercase()),
        })
    }
}

/// Reduce a string to a safe file name: whitespace becomes `-`, anything
/// other than letters, digits, `-`, `_` and `.` is dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_whitespace() || c == '-' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            out.push(c);
        }
    }
    let trimmed = out.trim_matches(|c| c == '.' || c == '-' || c == '_');
    if trimmed.is_empty() {
        "unnamed-file".into()
    } else {
        trimmed.to_string()
    }
}

/// First free `{base}{ext}`, `{base}_1{ext}`, `{base}_2{ext}`, … in `dir`.
pub fn unique_file_name(dir: &Path, base: &str, ext: &str) -> String {
    let mut name = format!("{base}{ext}");
    let mut n = 1;
    while dir.join(&name).exists() {
        name = format!("{base}_{n}{ext}");
        n += 1;
    }
    name
}

/// `{display name}_avatar_{unix time}`, sanitized.
pub fn avatar_base_name(display_name: &str, unix_time: i64) -> String {
    sanitize_file_name(&format!("{display_name}_avatar_{unix_time}"))
}

/// Write an accepted upload under a unique, meaningful name and return its
/// public URL.
pub fn store_upload(
    storage: &UploadStorage,
    accepted: &AcceptedUpload,
    display_name: &str,
    bytes: &[u8],
) -> Result<String> {
    let base = avatar_base_name(display_name, chrono::Utc::now().timestamp());
    let name = unique_file_name(storage.dir(), &base, &accepted.extension);
    let path = storage.write(&name, bytes)?;
    storage
        .path_to_url(&path)
        .ok_or_else(|| Error::Internal(format!("{} is outside uploads", path.display())))
}
