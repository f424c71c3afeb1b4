//! Request orchestration: the resize and generate flows.
//!
//! A [`PatternService`] is built once at start-up and shared across
//! requests. It owns no per-request state; every resize gets a fresh job
//! directory and a [`StageTracker`], so concurrent requests only share the
//! output root.

use crate::config::{ResponseStrategy, ServiceConfig};
use crate::error::PatternError;
use crate::measurements::{require_measurement, MeasurementSet};
use crate::output::{PagePreview, RenderedPattern, ResizeOutput};
use crate::pipeline::cleanup::clean_instructions;
use crate::pipeline::encode::{preview_file, PREVIEW_MAX_SIDE};
use crate::pipeline::generate::{generate_pattern, GarmentDimensions, GarmentKind, GeneratedPattern};
use crate::pipeline::input::{classify_upload, persist_upload, JobDir, PatternSource, SourceKind};
use crate::pipeline::llm::{
    complete_with_retry, resolve_provider, CompletionClient, ProviderClient, RetryPolicy,
};
use crate::pipeline::render::{self, RasterPages};
use crate::pipeline::stage::{Stage, StageTracker};
use crate::pipeline::{raster, summary, vector};
use crate::prompts;
use crate::response::{decoder_for, parse_generation_line};
use crate::scale::resolve_scale;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name of the scaled SVG inside a job directory.
pub const SCALED_SVG: &str = "scaled.svg";
/// File name of the scaled PDF inside a job directory.
pub const SCALED_PDF: &str = "scaled.pdf";

/// Pattern type used in prompts when the form left it blank.
const DEFAULT_PATTERN_TYPE: &str = "garment";

/// A resize request, as decoded from the upload form.
#[derive(Debug, Clone)]
pub struct ResizeRequest {
    /// Free-text garment type ("dress", "corset", …).
    pub pattern_type: String,
    pub measurements: MeasurementSet,
    /// Client-supplied file name; only its extension is trusted.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A generation request. Measurements are raw form values; which ones are
/// required depends on the garment.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub pattern: String,
    pub bust: Option<String>,
    pub waist: Option<String>,
}

/// The pattern rescaling service.
#[derive(Clone)]
pub struct PatternService {
    config: Arc<ServiceConfig>,
    estimator: Arc<dyn CompletionClient>,
    instructions: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
}

impl PatternService {
    /// Build a service around explicit completion clients.
    pub fn new(
        config: ServiceConfig,
        estimator: Arc<dyn CompletionClient>,
        instructions: Arc<dyn CompletionClient>,
    ) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            config: Arc::new(config),
            estimator,
            instructions,
            policy,
        }
    }

    /// Build a service whose clients talk to the configured LLM provider.
    pub fn from_config(config: ServiceConfig) -> Result<Self, PatternError> {
        let provider = resolve_provider(&config)?;
        info!(
            "LLM provider resolved (provider: {}, model: {})",
            config.provider_name.as_deref().unwrap_or("auto"),
            config.model_or_default()
        );
        let estimator = Arc::new(ProviderClient::estimator(Arc::clone(&provider), &config));
        let instructions = Arc::new(ProviderClient::instructions(provider, &config));
        Ok(Self::new(config, estimator, instructions))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Rescale an uploaded pattern to the request's measurements.
    ///
    /// # Errors
    /// - empty upload, unsupported type, malformed SVG or corrupt PDF (400)
    /// - estimator unreachable after retries, or a scale beyond the pixel cap (502)
    /// - pdfium, image or filesystem failures (500)
    ///
    /// The job directory is removed again when the upload itself was bad.
    /// A failed instructions call is not an error; it is reported in
    /// [`ResizeOutput::instructions_error`].
    pub async fn resize(&self, request: ResizeRequest) -> Result<ResizeOutput, PatternError> {
        if request.bytes.is_empty() {
            return Err(PatternError::MissingUpload);
        }
        let kind = classify_upload(&request.filename, &request.bytes)?;
        let job = JobDir::create(&self.config.output_dir)?;
        let mut tracker = StageTracker::new(job.id());

        match self.run_resize(&job, &mut tracker, request, kind).await {
            Ok(output) => Ok(output),
            Err(e) => {
                tracker.fail(&e);
                if e.is_client_error() {
                    discard_job(&job).await;
                }
                Err(e)
            }
        }
    }

    async fn run_resize(
        &self,
        job: &JobDir,
        tracker: &mut StageTracker,
        request: ResizeRequest,
        kind: SourceKind,
    ) -> Result<ResizeOutput, PatternError> {
        let config = &self.config;
        let lib_path = config.pdfium_lib_path.as_deref();
        let pattern_type = match request.pattern_type.trim() {
            "" => DEFAULT_PATTERN_TYPE.to_string(),
            t => t.to_string(),
        };
        let measurements = request.measurements;

        // ── Persist ──────────────────────────────────────────────────────
        let source = persist_upload(job, &request.filename, kind, request.bytes).await?;
        tracker.advance(Stage::SourcePersisted)?;

        // ── Summarise ────────────────────────────────────────────────────
        let pattern_summary = match &source {
            PatternSource::Vector(svg) => summary::summarize_svg(svg, config.summary_max_lines)?,
            PatternSource::Paged(pdf) => {
                let info = render::inspect_pdf(pdf, lib_path).await?;
                summary::summarize_pdf(&info, config.summary_max_lines)
            }
        };
        debug!("Pattern summary:\n{}", pattern_summary);
        tracker.advance(Stage::Summarized)?;

        // ── Estimate ─────────────────────────────────────────────────────
        let description = measurements.describe();
        let prompt = match config.response_strategy {
            ResponseStrategy::TolerantScan => {
                prompts::resize_prompt(&pattern_type, &pattern_summary, &description, &config.base)
            }
            ResponseStrategy::Structured => prompts::structured_resize_prompt(
                &pattern_type,
                &pattern_summary,
                &description,
                &config.base,
            ),
        };
        let answer = complete_with_retry(self.estimator.as_ref(), &prompt, &self.policy).await?;
        tracker.advance(Stage::EstimatorInvoked)?;

        let decoder = decoder_for(config.response_strategy);
        let estimate = decoder.decode(&answer.text);
        let scale = resolve_scale(&estimate, &measurements, &config.base);
        info!(
            "[{}] scale {} via {} (x: {:?}, y: {:?})",
            job.id(),
            scale.factor,
            decoder.name(),
            scale.x_source,
            scale.y_source
        );
        tracker.advance(Stage::ScaleResolved)?;

        // ── Transform + assemble ─────────────────────────────────────────
        let (rendered, elements) = match &source {
            PatternSource::Vector(svg) => {
                let scaled = vector::scale_svg(svg, scale.factor)?;
                tracker.advance(Stage::Transformed)?;

                let out = job.file(SCALED_SVG)?;
                tokio::fs::write(&out, &scaled)
                    .await
                    .map_err(|e| PatternError::io(&out, e))?;
                tracker.advance(Stage::Assembled)?;

                let elements = summary::extract_elements(svg)?;
                let rendered = RenderedPattern::Vector {
                    svg: scaled,
                    file: SCALED_SVG.to_string(),
                };
                (rendered, elements)
            }
            PatternSource::Paged(pdf) => {
                let pages = render::render_pages(
                    pdf,
                    job.path(),
                    config.dpi,
                    config.max_rendered_pixels,
                    lib_path,
                )
                .await?;
                let dims =
                    raster::resize_pages(&pages.paths, scale.factor, config.max_rendered_pixels)
                        .await?;
                tracker.advance(Stage::Transformed)?;

                let out = job.file(SCALED_PDF)?;
                render::assemble_pdf(&pages, &out, lib_path).await?;
                tracker.advance(Stage::Assembled)?;

                let rendered = RenderedPattern::Paged {
                    file: SCALED_PDF.to_string(),
                    pages: page_previews(&pages, &dims)?,
                };
                (rendered, Vec::new())
            }
        };

        // ── Instructions (best effort) ───────────────────────────────────
        let (instructions, instructions_error) = if config.include_instructions {
            self.instructions_for(&pattern_type, &description).await
        } else {
            (None, None)
        };

        tracker.advance(Stage::Responded)?;
        Ok(ResizeOutput {
            job_id: job.id().to_string(),
            source_kind: kind,
            measurements,
            estimate,
            scale,
            rendered,
            elements,
            instructions,
            instructions_error,
        })
    }

    async fn instructions_for(
        &self,
        pattern_type: &str,
        description: &str,
    ) -> (Option<String>, Option<String>) {
        let prompt = prompts::instructions_prompt(pattern_type, description);
        match complete_with_retry(self.instructions.as_ref(), &prompt, &self.policy).await {
            Ok(c) => {
                let text = clean_instructions(&c.text);
                if text.is_empty() {
                    (None, Some("instructions came back empty".to_string()))
                } else {
                    (Some(text), None)
                }
            }
            Err(e) => {
                warn!("Sewing instructions unavailable: {}", e);
                (None, Some(e.to_string()))
            }
        }
    }

    /// Draft a garment pattern from measurements.
    ///
    /// # Errors
    /// - unknown garment, missing or invalid measurement (400)
    /// - estimator unreachable (502)
    /// - estimator answer without a usable data line (500)
    pub async fn generate(&self, request: GenerateRequest) -> Result<GeneratedPattern, PatternError> {
        let kind: GarmentKind = request.pattern.parse()?;

        let mut measurements = MeasurementSet::default();
        for field in kind.required_measurements() {
            match *field {
                "bust" => {
                    measurements.bust =
                        require_measurement(request.bust.as_deref(), field, kind.label())?
                }
                "waist" => {
                    measurements.waist =
                        require_measurement(request.waist.as_deref(), field, kind.label())?
                }
                other => {
                    return Err(PatternError::Internal(format!(
                        "no form field for measurement '{other}'"
                    )))
                }
            }
        }
        info!("Generating {} for {}", kind.label(), measurements.describe());

        let prompt = prompts::generation_prompt(kind, &measurements.describe());
        let answer = complete_with_retry(self.estimator.as_ref(), &prompt, &self.policy).await?;
        let values = parse_generation_line(&answer.text, kind.response_keys())?;
        let dims = GarmentDimensions::from_values(kind, &values)?;
        debug!("{} dimensions: {:?}", kind.label(), dims);
        Ok(generate_pattern(kind, dims))
    }

    /// Resolve a download to a file path.
    ///
    /// Both segments must be plain file names and the file must exist;
    /// anything else is [`PatternError::NotFound`].
    pub fn download_path(&self, job_id: &str, file: &str) -> Result<PathBuf, PatternError> {
        let job = JobDir::open(&self.config.output_dir, job_id)?;
        let path = job.file(file)?;
        if !path.is_file() {
            return Err(PatternError::NotFound {
                name: format!("{job_id}/{file}"),
            });
        }
        Ok(path)
    }
}

async fn discard_job(job: &JobDir) {
    match tokio::fs::remove_dir_all(job.path()).await {
        Ok(()) => debug!("Removed job directory {}", job.path().display()),
        Err(e) => warn!("Could not remove job directory {}: {}", job.path().display(), e),
    }
}

fn page_previews(pages: &RasterPages, dims: &[(u32, u32)]) -> Result<Vec<PagePreview>, PatternError> {
    pages
        .paths
        .iter()
        .zip(dims)
        .enumerate()
        .map(|(idx, (path, (w, h)))| {
            let file = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            Ok(PagePreview {
                page: idx + 1,
                width_px: *w,
                height_px: *h,
                file,
                preview: preview_file(path, PREVIEW_MAX_SIDE)?,
            })
        })
        .collect()
}
