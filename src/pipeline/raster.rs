//! Raster scaling: resample page bitmaps by independent X/Y factors.
//!
//! Target sizes are `floor(dim * scale)`, clamped to at least one pixel, and
//! resampling uses Lanczos3. The factor comes from the estimator, so every
//! target side is checked against a pixel cap before any buffer is allocated. Resizing is CPU-bound; the async wrapper moves
//! it onto the blocking pool so a large 300-DPI page never stalls the
//! request executor.

use crate::error::PatternError;
use crate::scale::ScaleFactor;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Target dimensions for a `width × height` image scaled by `factor`.
pub fn target_dimensions(width: u32, height: u32, factor: ScaleFactor) -> (u32, u32) {
    (scaled_side(width, factor.x), scaled_side(height, factor.y))
}

fn scaled_side(side: u32, scale: f64) -> u32 {
    let v = (side as f64 * scale).floor();
    if v.is_finite() && v >= 1.0 {
        v.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Target dimensions, rejected when either side exceeds `max_side` pixels.
pub fn checked_target_dimensions(
    width: u32,
    height: u32,
    factor: ScaleFactor,
    max_side: u32,
) -> Result<(u32, u32), PatternError> {
    let (w, h) = target_dimensions(width, height, factor);
    if w > max_side || h > max_side {
        return Err(PatternError::ScaledPageTooLarge {
            width: w,
            height: h,
            max_side,
        });
    }
    Ok((w, h))
}

/// Resample `img` to its scaled dimensions.
pub fn resize_image(img: &DynamicImage, factor: ScaleFactor) -> DynamicImage {
    let (w, h) = target_dimensions(img.width(), img.height(), factor);
    debug!(
        "Resizing {}x{} → {}x{} ({})",
        img.width(),
        img.height(),
        w,
        h,
        factor.to_transform()
    );
    img.resize_exact(w, h, FilterType::Lanczos3)
}

/// Resize the image at `path` in place, refusing targets larger than
/// `max_side` on either axis.
pub fn resize_image_file(
    path: &Path,
    factor: ScaleFactor,
    max_side: u32,
) -> Result<(u32, u32), PatternError> {
    let (width, height) = image::image_dimensions(path).map_err(|source| PatternError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    checked_target_dimensions(width, height, factor, max_side)?;

    let img = image::open(path).map_err(|source| PatternError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let resized = resize_image(&img, factor);
    resized.save(path).map_err(|source| PatternError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((resized.width(), resized.height()))
}

/// Resize every image in `paths` in place, off the async executor.
///
/// Returns the new dimensions of each page, in order. Stops at the first
/// page whose target exceeds `max_side`.
pub async fn resize_pages(
    paths: &[PathBuf],
    factor: ScaleFactor,
    max_side: u32,
) -> Result<Vec<(u32, u32)>, PatternError> {
    let paths = paths.to_vec();
    tokio::task::spawn_blocking(move || {
        paths
            .iter()
            .map(|path| resize_image_file(path, factor, max_side))
            .collect()
    })
    .await
    .map_err(|e| PatternError::Internal(format!("Resize task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn thousand_square_scaled_half_by_double() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1000, 1000, Rgb([200, 10, 10])));
        let out = resize_image(&img, ScaleFactor { x: 0.5, y: 2.0 });
        assert_eq!((out.width(), out.height()), (500, 2000));
    }

    #[test]
    fn dimensions_floor_and_clamp_to_one() {
        assert_eq!(target_dimensions(10, 10, ScaleFactor { x: 1.19, y: 0.01 }), (11, 1));
        assert_eq!(target_dimensions(3, 7, ScaleFactor { x: 0.1, y: 0.5 }), (1, 3));
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let err = checked_target_dimensions(2480, 3508, ScaleFactor { x: 1000.0, y: 1000.0 }, 6000)
            .unwrap_err();
        assert!(matches!(
            err,
            PatternError::ScaledPageTooLarge {
                width: 2_480_000,
                height: 3_508_000,
                max_side: 6000
            }
        ));
        assert_eq!(err.status(), 502);

        let err = checked_target_dimensions(100, 100, ScaleFactor { x: 1.0, y: 61.0 }, 6000)
            .unwrap_err();
        assert!(matches!(err, PatternError::ScaledPageTooLarge { .. }));
        assert_eq!(
            checked_target_dimensions(2480, 3508, ScaleFactor { x: 1.1, y: 1.0 }, 6000).unwrap(),
            (2728, 3508)
        );
    }

    #[test]
    fn oversized_resize_leaves_the_page_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_1.png");
        DynamicImage::ImageRgb8(RgbImage::new(40, 20)).save(&path).unwrap();
        let err = resize_image_file(&path, ScaleFactor { x: 1000.0, y: 1.0 }, 1000).unwrap_err();
        assert!(matches!(err, PatternError::ScaledPageTooLarge { width: 40_000, .. }));
        assert_eq!(image::image_dimensions(&path).unwrap(), (40, 20));
    }

    #[test]
    fn resize_file_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_1.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([0, 0, 0])))
            .save(&path)
            .unwrap();
        let dims = resize_image_file(&path, ScaleFactor { x: 1.5, y: 0.5 }, 6000).unwrap();
        assert_eq!(dims, (60, 10));
        let reopened = image::open(&path).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (60, 10));
    }

    #[tokio::test]
    async fn resize_pages_handles_every_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (1..=2)
            .map(|i| {
                let p = dir.path().join(format!("page_{i}.png"));
                DynamicImage::ImageRgb8(RgbImage::new(10, 10)).save(&p).unwrap();
                p
            })
            .collect();
        let dims = resize_pages(&paths, ScaleFactor { x: 2.0, y: 2.0 }, 6000)
            .await
            .unwrap();
        assert_eq!(dims, vec![(20, 20), (20, 20)]);
        for p in &paths {
            assert_eq!(image::image_dimensions(p).unwrap(), (20, 20));
        }
    }

    #[test]
    fn missing_file_is_image_error() {
        let err = resize_image_file(Path::new("/nonexistent/page.png"), ScaleFactor::IDENTITY, 6000)
            .unwrap_err();
        assert!(matches!(err, PatternError::Image { .. }));
    }
}
