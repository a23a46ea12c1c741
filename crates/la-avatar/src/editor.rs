//! Image-editing collaborator used to generate size variants.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use la_core::{Error, Result};

/// Produces a resized copy of an image file.
pub trait ImageEditor: Send + Sync {
    /// Resize `source` to fit `width` x `height`, cropping to fill when
    /// `crop` is set, and return the path of the new file.
    fn resize(&self, source: &Path, width: u32, height: u32, crop: bool) -> Result<PathBuf>;
}

/// [`ImageEditor`] backed by the `image` crate. Variants are written beside
/// the source as `{stem}-{w}x{h}.{ext}`.
///
/// Never upscales: a request at or above the source dimensions fails, and
/// the caller falls back to the full-size image.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEditor;

impl ImageEditor for RasterEditor {
    fn resize(&self, source: &Path, width: u32, height: u32, crop: bool) -> Result<PathBuf> {
        let img = image::open(source)
            .map_err(|e| Error::generation(width, format!("{}: {e}", source.display())))?;

        let (src_w, src_h) = (img.width(), img.height());
        let (w, h) = (width.min(src_w), height.min(src_h));
        if w == src_w && h == src_h {
            return Err(Error::generation(
                width,
                format!("source is {src_w}x{src_h}; nothing to shrink"),
            ));
        }

        let resized = if crop {
            img.resize_to_fill(w, h, FilterType::Lanczos3)
        } else {
            img.resize(w, h, FilterType::Lanczos3)
        };

        let dest = variant_path(source, resized.width(), resized.height())
            .ok_or_else(|| Error::generation(width, "source has no file name"))?;
        resized
            .save(&dest)
            .map_err(|e| Error::generation(width, format!("{}: {e}", dest.display())))?;

        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            "Generated avatar variant"
        );
        Ok(dest)
    }
}

/// `/dir/a.jpg` at 50x50 becomes `/dir/a-50x50.jpg`.
pub fn variant_path(source: &Path, width: u32, height: u32) -> Option<PathBuf> {
    let stem = source.file_stem()?.to_str()?;
    let name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{width}x{height}.{ext}"),
        None => format!("{stem}-{width}x{height}"),
    };
    Some(source.with_file_name(name))
}
