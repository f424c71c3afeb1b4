//! Error types for the tailorfit library.
//!
//! Three error types cover three distinct failure modes:
//!
//! * [`PatternError`] — **Fatal** for the request: the pipeline cannot
//!   produce a pattern (bad upload, malformed SVG, estimator unreachable).
//!   Each variant classifies itself into an HTTP status via
//!   [`PatternError::status`] so the server layer never has to guess.
//!
//! * [`ResponseParseError`] — the estimator answered, but the text did not
//!   contain the data line the generation flow needs.
//!
//! * [`CompletionError`] — a single completion attempt failed. Retried by
//!   [`crate::pipeline::llm::complete_with_retry`]; only the final failure
//!   is surfaced as a [`PatternError`].

use std::path::PathBuf;
use thiserror::Error;

/// All request-level errors returned by the tailorfit library.
#[derive(Debug, Error)]
pub enum PatternError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The multipart form had no pattern file, or the file was empty.
    #[error("Please upload a valid SVG or PDF file.")]
    MissingUpload,

    /// The uploaded file is neither an SVG nor a PDF.
    #[error("Unsupported file type '{filename}': only .svg and .pdf patterns are accepted")]
    UnsupportedFileType { filename: String },

    /// A measurement required by the selected garment was left blank.
    #[error("{field} measurement is required for {garment}.")]
    MissingMeasurement { field: String, garment: String },

    /// A required measurement was present but not a positive number.
    #[error("Invalid {field} measurement '{value}': expected a positive number")]
    InvalidMeasurement { field: String, value: String },

    /// The garment selector named a template that does not exist.
    #[error("Unknown garment '{name}'. Expected one of: bikini_top, bikini_bottom, corset")]
    UnknownGarment { name: String },

    /// The SVG could not be parsed as XML.
    #[error("Pattern document is malformed: {detail}")]
    MalformedDocument { detail: String },

    /// pdfium could not open the uploaded PDF.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── Estimator errors ──────────────────────────────────────────────────
    /// The language-model provider is not configured (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every completion attempt failed.
    #[error("Estimator call failed after {attempts} attempt(s): {detail}")]
    EstimatorFailed { attempts: u32, detail: String },

    /// The estimated scale would produce a page larger than the pixel cap.
    #[error(
        "Estimated scale would produce a {width}x{height} px page; the limit is {max_side} px per side"
    )]
    ScaledPageTooLarge { width: u32, height: u32, max_side: u32 },

    /// The estimator response lacked the data the generation flow needs.
    #[error("Error parsing AI response: {0}")]
    ResponseParse(#[from] ResponseParseError),

    // ── Output errors ─────────────────────────────────────────────────────
    /// A requested download does not exist.
    #[error("File not found: '{name}'")]
    NotFound { name: String },

    /// Rasterisation or PDF assembly failed inside pdfium.
    #[error("PDF processing failed: {0}")]
    Pdfium(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// Image decode/encode failure.
    #[error("Image processing failed for '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Reading or writing the job workspace failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PatternError {
    /// HTTP status code this error maps to.
    ///
    /// | Class | Status |
    /// |-------|--------|
    /// | validation / unsupported type / malformed document | 400 |
    /// | unknown download | 404 |
    /// | estimator unreachable or scale beyond the pixel cap | 502 |
    /// | response parse failure and everything else | 500 |
    pub fn status(&self) -> u16 {
        match self {
            PatternError::MissingUpload
            | PatternError::UnsupportedFileType { .. }
            | PatternError::MissingMeasurement { .. }
            | PatternError::InvalidMeasurement { .. }
            | PatternError::UnknownGarment { .. }
            | PatternError::MalformedDocument { .. }
            | PatternError::CorruptPdf { .. } => 400,
            PatternError::NotFound { .. } => 404,
            PatternError::EstimatorFailed { .. }
            | PatternError::ProviderNotConfigured { .. }
            | PatternError::ScaledPageTooLarge { .. } => 502,
            PatternError::ResponseParse(_)
            | PatternError::Pdfium(_)
            | PatternError::PdfiumBindingFailed(_)
            | PatternError::Image { .. }
            | PatternError::Io { .. }
            | PatternError::InvalidConfig(_)
            | PatternError::Internal(_) => 500,
        }
    }

    /// True when the caller sent bad input (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatternError::Io {
            path: path.into(),
            source,
        }
    }
}

/// The estimator's text did not contain a usable data line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseParseError {
    /// No line contained every required key.
    #[error("No valid line found with {}", .keys.join(", "))]
    NoDataLine { keys: Vec<String> },

    /// A qualifying line was found but a value could not be read.
    #[error("Could not read a number for '{key}' from line '{line}'")]
    MalformedValue { key: String, line: String },

    /// A value was read but is not a usable size.
    #[error("Estimated '{key}' must be a positive number, got {value}")]
    NonPositive { key: String, value: f64 },
}

/// A single failed completion attempt.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The attempt exceeded the per-call timeout.
    #[error("completion timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider answered with an empty body.
    #[error("provider returned an empty response")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_400() {
        assert_eq!(PatternError::MissingUpload.status(), 400);
        let e = PatternError::UnsupportedFileType {
            filename: "dress.docx".into(),
        };
        assert_eq!(e.status(), 400);
        assert!(e.to_string().contains("dress.docx"));
        let e = PatternError::MalformedDocument {
            detail: "unexpected end of stream".into(),
        };
        assert!(e.is_client_error());
    }

    #[test]
    fn response_parse_is_500_with_message() {
        let e: PatternError = ResponseParseError::NoDataLine {
            keys: vec!["width".into(), "height".into()],
        }
        .into();
        assert_eq!(e.status(), 500);
        let msg = e.to_string();
        assert!(msg.starts_with("Error parsing AI response"), "got: {msg}");
        assert!(msg.contains("width, height"), "got: {msg}");
    }

    #[test]
    fn non_positive_estimate_is_a_parse_failure() {
        let e: PatternError = ResponseParseError::NonPositive {
            key: "width".into(),
            value: 0.0,
        }
        .into();
        assert_eq!(e.status(), 500);
        assert_eq!(
            e.to_string(),
            "Error parsing AI response: Estimated 'width' must be a positive number, got 0"
        );
    }

    #[test]
    fn estimator_failure_is_502() {
        let e = PatternError::EstimatorFailed {
            attempts: 2,
            detail: CompletionError::Timeout { secs: 30 }.to_string(),
        };
        assert_eq!(e.status(), 502);
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn missing_measurement_display() {
        let e = PatternError::MissingMeasurement {
            field: "Bust".into(),
            garment: "bikini top".into(),
        };
        assert_eq!(e.to_string(), "Bust measurement is required for bikini top.");
        assert_eq!(e.status(), 400);
    }
}
