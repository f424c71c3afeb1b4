//! Document assembly: PDF → page PNGs → PDF, via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks for the whole render. Every entry point here is an
//! async shim that moves the work onto Tokio's blocking pool.
//!
//! ## Page geometry
//!
//! Pages are rendered at `dpi` (300 by default), so a pixel is
//! `72 / dpi` PDF points. Assembly uses the same ratio in reverse, which
//! means a page rendered and reassembled without scaling keeps its
//! physical size, and a scaled page grows or shrinks on paper by exactly
//! the scale factor. That is the property a printed sewing pattern needs.

use crate::error::PatternError;
use image::{ColorType, DynamicImage};
use pdfium_render::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page count and sizes of a PDF, in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfInfo {
    pub page_count: usize,
    pub page_sizes: Vec<(f32, f32)>,
}

/// An ordered set of page images on disk, named `page_1.png`, `page_2.png`, …
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterPages {
    pub dpi: u32,
    pub paths: Vec<PathBuf>,
}

/// File name of the 1-indexed page `n`.
pub fn page_file_name(n: usize) -> String {
    format!("page_{n}.png")
}

/// Bind pdfium from an explicit library path, or the system library.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, PatternError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PatternError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, PatternError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| PatternError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Rasterise every page of `pdf_path` into `out_dir` at `dpi`.
///
/// `max_pixels` caps the longer side of any page regardless of DPI.
pub async fn render_pages(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<RasterPages, PatternError> {
    let pdf = pdf_path.to_path_buf();
    let dir = out_dir.to_path_buf();
    let lib = lib_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&pdf, &dir, dpi, max_pixels, lib.as_deref())
    })
    .await
    .map_err(|e| PatternError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<RasterPages, PatternError> {
    let pdfium = bind_pdfium(lib_path)?;
    let document = open_document(&pdfium, pdf_path)?;

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut paths = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PatternError::Pdfium(format!("page {page_num}: {:?}", e)))?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        let path = out_dir.join(page_file_name(page_num));
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| PatternError::Image {
                path: path.clone(),
                source,
            })?;
        paths.push(path);
    }

    Ok(RasterPages { dpi, paths })
}

/// Read page count and page sizes without rendering.
pub async fn inspect_pdf(pdf_path: &Path, lib_path: Option<&Path>) -> Result<PdfInfo, PatternError> {
    let pdf = pdf_path.to_path_buf();
    let lib = lib_path.map(Path::to_path_buf);
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib.as_deref())?;
        let document = open_document(&pdfium, &pdf)?;
        let page_sizes: Vec<(f32, f32)> = document
            .pages()
            .iter()
            .map(|p| (p.width().value, p.height().value))
            .collect();
        Ok(PdfInfo {
            page_count: page_sizes.len(),
            page_sizes,
        })
    })
    .await
    .map_err(|e| PatternError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Compose `pages` into one PDF at `out_path`, one page per image, in order.
pub async fn assemble_pdf(
    pages: &RasterPages,
    out_path: &Path,
    lib_path: Option<&Path>,
) -> Result<(), PatternError> {
    let pages = pages.clone();
    let out = out_path.to_path_buf();
    let lib = lib_path.map(Path::to_path_buf);
    tokio::task::spawn_blocking(move || assemble_pdf_blocking(&pages, &out, lib.as_deref()))
        .await
        .map_err(|e| PatternError::Internal(format!("Assembly task panicked: {}", e)))?
}

fn assemble_pdf_blocking(
    pages: &RasterPages,
    out_path: &Path,
    lib_path: Option<&Path>,
) -> Result<(), PatternError> {
    let images = load_conformed(&pages.paths)?;
    if images.is_empty() {
        return Err(PatternError::Internal("No pages to assemble".into()));
    }

    let pdfium = bind_pdfium(lib_path)?;
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| PatternError::Pdfium(format!("{:?}", e)))?;

    for (idx, image) in images.iter().enumerate() {
        let (w_pt, h_pt) = pixels_to_points(image.width(), image.height(), pages.dpi);
        let size = PdfPagePaperSize::Custom(PdfPoints::new(w_pt), PdfPoints::new(h_pt));
        let mut page = document
            .pages_mut()
            .create_page_at_end(size)
            .map_err(|e| PatternError::Pdfium(format!("page {}: {:?}", idx + 1, e)))?;
        page.objects_mut()
            .create_image_object(
                PdfPoints::ZERO,
                PdfPoints::ZERO,
                image,
                Some(PdfPoints::new(w_pt)),
                Some(PdfPoints::new(h_pt)),
            )
            .map_err(|e| PatternError::Pdfium(format!("page {}: {:?}", idx + 1, e)))?;
    }

    document
        .save_to_file(out_path)
        .map_err(|e| PatternError::Pdfium(format!("save {}: {:?}", out_path.display(), e)))?;
    info!(
        "Assembled {} pages → {}",
        images.len(),
        out_path.display()
    );
    Ok(())
}

/// Page size in points for an image rendered at `dpi`.
pub fn pixels_to_points(width: u32, height: u32, dpi: u32) -> (f32, f32) {
    let ratio = 72.0 / dpi as f32;
    (width as f32 * ratio, height as f32 * ratio)
}

/// Open every image and convert it to the first image's colour type.
pub fn load_conformed(paths: &[PathBuf]) -> Result<Vec<DynamicImage>, PatternError> {
    let mut images = Vec::with_capacity(paths.len());
    let mut canonical: Option<ColorType> = None;
    for path in paths {
        let img = image::open(path).map_err(|source| PatternError::Image {
            path: path.clone(),
            source,
        })?;
        let color = *canonical.get_or_insert(img.color());
        images.push(conform(img, color));
    }
    Ok(images)
}

/// Convert `img` to `color`; unusual layouts fall back to RGBA8.
pub fn conform(img: DynamicImage, color: ColorType) -> DynamicImage {
    if img.color() == color {
        return img;
    }
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(img.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}
