//! Upload persistence: classify an uploaded pattern and store it in a
//! per-request job directory.
//!
//! ## Why a job directory per request?
//!
//! Uploads arrive with user-chosen filenames. Two users uploading
//! `pattern.svg` at once must not overwrite each other, and a download
//! URL must not be guessable from a filename alone. Each request therefore
//! gets its own randomly named directory under the configured output root.
//! The directory outlives the request so its files can be downloaded; its
//! cleanup is left to the operator.

use crate::error::PatternError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Kind of pattern document uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Svg,
    Pdf,
}

impl SourceKind {
    /// File extension (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            SourceKind::Svg => "svg",
            SourceKind::Pdf => "pdf",
        }
    }
}

/// Classify an upload from its filename and first bytes.
///
/// The extension must be `.svg` or `.pdf` (case-insensitive). A `.pdf`
/// must start with `%PDF`; an `.svg` must be UTF-8 text.
pub fn classify_upload(filename: &str, bytes: &[u8]) -> Result<SourceKind, PatternError> {
    let unsupported = || PatternError::UnsupportedFileType {
        filename: filename.to_string(),
    };
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(unsupported)?;

    match ext.as_str() {
        "pdf" => {
            if bytes.starts_with(b"%PDF") {
                Ok(SourceKind::Pdf)
            } else {
                Err(PatternError::CorruptPdf {
                    path: PathBuf::from(filename),
                    detail: format!(
                        "missing %PDF header (first bytes: {:?})",
                        &bytes[..bytes.len().min(4)]
                    ),
                })
            }
        }
        "svg" => {
            if std::str::from_utf8(bytes).is_ok() {
                Ok(SourceKind::Svg)
            } else {
                Err(PatternError::MalformedDocument {
                    detail: "SVG is not valid UTF-8".into(),
                })
            }
        }
        _ => Err(unsupported()),
    }
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are stripped so the result is never hidden or `..`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "pattern".to_string()
    } else {
        trimmed.to_string()
    }
}

/// True when `name` is usable as a single path component inside a job.
pub fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// A per-request working directory.
#[derive(Debug, Clone)]
pub struct JobDir {
    id: String,
    path: PathBuf,
}

impl JobDir {
    /// Create a fresh, uniquely named job directory under `root`.
    pub fn create(root: &Path) -> Result<Self, PatternError> {
        std::fs::create_dir_all(root).map_err(|e| PatternError::io(root, e))?;
        let dir = tempfile::Builder::new()
            .prefix("job-")
            .rand_bytes(12)
            .tempdir_in(root)
            .map_err(|e| PatternError::io(root, e))?;
        let path = dir.keep();
        let id = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| PatternError::Internal("job directory has no name".into()))?;
        debug!("Created job directory {}", path.display());
        Ok(Self { id, path })
    }

    /// Re-open an existing job by id, for downloads.
    pub fn open(root: &Path, id: &str) -> Result<Self, PatternError> {
        if !is_plain_component(id) {
            return Err(PatternError::NotFound { name: id.into() });
        }
        let path = root.join(id);
        if !path.is_dir() {
            return Err(PatternError::NotFound { name: id.into() });
        }
        Ok(Self {
            id: id.to_string(),
            path,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `name` inside the job, rejecting anything but a plain name.
    pub fn file(&self, name: &str) -> Result<PathBuf, PatternError> {
        if !is_plain_component(name) {
            return Err(PatternError::NotFound { name: name.into() });
        }
        Ok(self.path.join(name))
    }
}

/// A persisted upload.
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// SVG markup, also written to disk as `source.svg`.
    Vector(String),
    /// PDF written to disk as `source.pdf`.
    Paged(PathBuf),
}

/// Write the uploaded bytes into `job` and return the typed source.
pub async fn persist_upload(
    job: &JobDir,
    original_name: &str,
    kind: SourceKind,
    bytes: Vec<u8>,
) -> Result<PatternSource, PatternError> {
    let path = job.file(&format!("source.{}", kind.extension()))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| PatternError::io(&path, e))?;
    info!(
        "Stored upload '{}' ({} bytes) as {}",
        sanitize_filename(original_name),
        bytes.len(),
        path.display()
    );

    match kind {
        SourceKind::Svg => {
            let text = String::from_utf8(bytes).map_err(|_| PatternError::MalformedDocument {
                detail: "SVG is not valid UTF-8".into(),
            })?;
            Ok(PatternSource::Vector(text))
        }
        SourceKind::Pdf => Ok(PatternSource::Paged(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_accepts_svg_and_pdf_case_insensitively() {
        assert_eq!(classify_upload("Dress.SVG", b"<svg/>").unwrap(), SourceKind::Svg);
        assert_eq!(classify_upload("a.pdf", b"%PDF-1.7").unwrap(), SourceKind::Pdf);
    }

    #[test]
    fn classify_rejects_other_extensions() {
        for name in ["pattern.png", "pattern", "svg"] {
            let err = classify_upload(name, b"data").unwrap_err();
            assert!(matches!(err, PatternError::UnsupportedFileType { .. }), "{name}");
            assert_eq!(err.status(), 400);
        }
    }

    #[test]
    fn classify_checks_pdf_magic() {
        let err = classify_upload("fake.pdf", b"<svg/>").unwrap_err();
        assert!(matches!(err, PatternError::CorruptPdf { .. }));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn sanitize_strips_paths_and_odd_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\my dress.svg"), "my_dress.svg");
        assert_eq!(sanitize_filename(".."), "pattern");
        assert_eq!(sanitize_filename(".hidden.svg"), "hidden.svg");
    }

    #[test]
    fn plain_component_rules() {
        assert!(is_plain_component("scaled.pdf"));
        assert!(!is_plain_component(".."));
        assert!(!is_plain_component("a/b"));
        assert!(!is_plain_component(""));
    }

    #[test]
    fn job_dirs_are_unique_and_reopenable() {
        let root = tempfile::tempdir().unwrap();
        let a = JobDir::create(root.path()).unwrap();
        let b = JobDir::create(root.path()).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("job-"));
        let reopened = JobDir::open(root.path(), a.id()).unwrap();
        assert_eq!(reopened.path(), a.path());
        assert!(JobDir::open(root.path(), "..").is_err());
        assert!(JobDir::open(root.path(), "job-missing").is_err());
        assert!(a.file("../escape").is_err());
    }

    #[tokio::test]
    async fn persist_svg_roundtrips_text() {
        let root = tempfile::tempdir().unwrap();
        let job = JobDir::create(root.path()).unwrap();
        let src = persist_upload(&job, "p.svg", SourceKind::Svg, b"<svg/>".to_vec())
            .await
            .unwrap();
        match src {
            PatternSource::Vector(text) => assert_eq!(text, "<svg/>"),
            other => panic!("expected vector source, got {other:?}"),
        }
        assert!(job.path().join("source.svg").exists());
    }
}
