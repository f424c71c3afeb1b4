//! PDF round trips through a real pdfium library.
//!
//! Gated on `PDFIUM_LIB_PATH` so they do not run unless a library is
//! available.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test pdf -- --nocapture

mod common;

use common::{init_tracing, service_with, Scripted};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tailorfit::pipeline::render::{assemble_pdf, inspect_pdf, page_file_name, RasterPages};
use tailorfit::{MeasurementSet, RenderedPattern, ResizeRequest, ServiceConfig};

macro_rules! skip_unless_pdfium {
    () => {{
        match std::env::var("PDFIUM_LIB_PATH") {
            Ok(p) if Path::new(&p).exists() => PathBuf::from(p),
            _ => {
                println!("SKIP — set PDFIUM_LIB_PATH=/path/to/libpdfium to run pdf tests");
                return;
            }
        }
    }};
}

/// Two 144 px square pages at 72 DPI, i.e. two 2-inch pages.
async fn two_page_pdf(dir: &Path, lib: &Path) -> PathBuf {
    let paths: Vec<PathBuf> = (1..=2)
        .map(|n| {
            let p = dir.join(page_file_name(n));
            DynamicImage::ImageRgb8(RgbImage::from_pixel(144, 144, Rgb([30 * n as u8, 0, 0])))
                .save(&p)
                .unwrap();
            p
        })
        .collect();
    let out = dir.join("fixture.pdf");
    assemble_pdf(&RasterPages { dpi: 72, paths }, &out, Some(lib))
        .await
        .unwrap();
    out
}

#[tokio::test]
async fn assembled_pages_keep_physical_size() {
    init_tracing();
    let lib = skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_pdf(dir.path(), &lib).await;

    let info = inspect_pdf(&pdf, Some(&lib)).await.unwrap();
    assert_eq!(info.page_count, 2);
    for (w, h) in info.page_sizes {
        assert!((w - 144.0).abs() < 0.5 && (h - 144.0).abs() < 0.5, "{w} x {h}");
    }
}

#[tokio::test]
async fn pdf_upload_is_scaled_per_axis() {
    init_tracing();
    let lib = skip_unless_pdfium!();
    let fixtures = tempfile::tempdir().unwrap();
    let pdf = two_page_pdf(fixtures.path(), &lib).await;

    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .output_dir(root.path())
        .dpi(72)
        .pdfium_lib_path(&lib)
        .include_instructions(false)
        .build()
        .unwrap();
    let estimator = Scripted::answering("scale_x = 2.0\nscale_y = 0.5");
    let svc = service_with(config, estimator.clone(), Scripted::answering("unused"));

    let out = svc
        .resize(ResizeRequest {
            pattern_type: "skirt".into(),
            measurements: MeasurementSet::default(),
            filename: "skirt.pdf".into(),
            bytes: std::fs::read(&pdf).unwrap(),
        })
        .await
        .unwrap();

    assert!(estimator.last_prompt().contains("pdf document: 2 page(s)"));
    let RenderedPattern::Paged { file, pages } = &out.rendered else {
        panic!("expected a paged result");
    };
    assert_eq!(pages.len(), 2);
    assert_eq!((pages[0].width_px, pages[0].height_px), (288, 72));
    assert!(pages[0].preview.starts_with("data:image/png;base64,"));

    let scaled = root.path().join(&out.job_id).join(file);
    let info = inspect_pdf(&scaled, Some(&lib)).await.unwrap();
    assert_eq!(info.page_count, 2);
    let (w, h) = info.page_sizes[0];
    assert!((w - 288.0).abs() < 1.0 && (h - 72.0).abs() < 1.0, "{w} x {h}");
}

#[tokio::test]
async fn non_pdf_bytes_with_pdf_extension_are_rejected() {
    let root = tempfile::tempdir().unwrap();
    let svc = service_with(
        common::test_config(root.path()),
        Scripted::answering("scale_x = 1"),
        Scripted::answering("unused"),
    );
    let err = svc
        .resize(ResizeRequest {
            pattern_type: String::new(),
            measurements: MeasurementSet::default(),
            filename: "fake.pdf".into(),
            bytes: b"not a pdf".to_vec(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn runaway_estimated_scale_is_refused() {
    let lib = skip_unless_pdfium!();
    init_tracing();
    let fixtures = tempfile::tempdir().unwrap();
    let pdf = two_page_pdf(fixtures.path(), &lib).await;

    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .output_dir(root.path())
        .dpi(72)
        .max_rendered_pixels(1000)
        .pdfium_lib_path(&lib)
        .include_instructions(false)
        .build()
        .unwrap();
    let svc = service_with(
        config,
        Scripted::answering("scale_x = 1000\nscale_y = 1"),
        Scripted::answering("unused"),
    );

    let err = svc
        .resize(ResizeRequest {
            pattern_type: "skirt".into(),
            measurements: MeasurementSet::default(),
            filename: "skirt.pdf".into(),
            bytes: std::fs::read(&pdf).unwrap(),
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, tailorfit::PatternError::ScaledPageTooLarge { max_side: 1000, .. }),
        "{err}"
    );
    assert_eq!(err.status(), 502);
}
