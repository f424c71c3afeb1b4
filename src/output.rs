//! Result types returned by [`crate::PatternService`].

use crate::measurements::MeasurementSet;
use crate::pipeline::input::SourceKind;
use crate::pipeline::summary::PatternElement;
use crate::response::ScaleEstimate;
use crate::scale::ResolvedScale;
use serde::Serialize;

/// Outcome of a resize request.
#[derive(Debug, Clone, Serialize)]
pub struct ResizeOutput {
    /// Job directory name; the first segment of every download URL.
    pub job_id: String,
    pub source_kind: SourceKind,
    pub measurements: MeasurementSet,
    /// What the estimator reported, before fallbacks.
    pub estimate: ScaleEstimate,
    /// The factor actually applied, with per-axis provenance.
    pub scale: ResolvedScale,
    pub rendered: RenderedPattern,
    /// Drawable elements of an SVG source; empty for PDFs.
    pub elements: Vec<PatternElement>,
    /// Cleaned sewing instructions, when requested and available.
    pub instructions: Option<String>,
    /// Why instructions are missing, if they were requested.
    pub instructions_error: Option<String>,
}

impl ResizeOutput {
    /// File name of the scaled document inside the job directory.
    pub fn download_name(&self) -> &str {
        match &self.rendered {
            RenderedPattern::Vector { file, .. } | RenderedPattern::Paged { file, .. } => file,
        }
    }
}

/// The scaled document, in the form the result page shows it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderedPattern {
    /// Scaled SVG markup, shown inline.
    Vector { svg: String, file: String },
    /// Scaled PDF; one thumbnail per page.
    Paged {
        file: String,
        pages: Vec<PagePreview>,
    },
}

/// One scaled page of a PDF result.
#[derive(Debug, Clone, Serialize)]
pub struct PagePreview {
    /// 1-indexed page number.
    pub page: usize,
    pub width_px: u32,
    pub height_px: u32,
    /// PNG file inside the job directory.
    pub file: String,
    /// `data:image/png;base64,…` thumbnail.
    #[serde(skip_serializing)]
    pub preview: String,
}
