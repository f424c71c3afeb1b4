//! Preview encoding: page image → small base64 PNG data URI.
//!
//! Scaled pages are printed from the downloadable PDF; the result page only
//! needs a thumbnail to show what came out. A 300 DPI A4 page is ~2500 px
//! wide, so previews are downsampled first to keep the HTML small.

use crate::error::PatternError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Longest side of a preview thumbnail, in pixels.
pub const PREVIEW_MAX_SIDE: u32 = 600;

/// Encode `img` as a PNG data URI, downsampled so neither side exceeds
/// `max_side`. Images already small enough are encoded as-is.
pub fn encode_preview(img: &DynamicImage, max_side: u32) -> Result<String, image::ImageError> {
    let thumb;
    let src = if img.width() > max_side || img.height() > max_side {
        thumb = img.resize(max_side, max_side, FilterType::Triangle);
        &thumb
    } else {
        img
    };

    let mut buf = Vec::new();
    src.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} preview → {} bytes base64",
        src.width(),
        src.height(),
        b64.len()
    );
    Ok(format!("data:image/png;base64,{b64}"))
}

/// Load the image at `path` and encode its preview.
pub fn preview_file(path: &Path, max_side: u32) -> Result<String, PatternError> {
    let wrap = |source| PatternError::Image {
        path: path.to_path_buf(),
        source,
    };
    let img = image::open(path).map_err(wrap)?;
    encode_preview(&img, max_side).map_err(wrap)
}
