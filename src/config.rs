//! Configuration types for the pattern-rescaling service.
//!
//! Everything the pipeline reads at request time lives in [`ServiceConfig`],
//! which is built once at process start and shared behind an `Arc`. Nothing
//! in the library reads environment variables after that point, apart from
//! provider auto-detection when no provider was configured explicitly.

use crate::error::PatternError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Reference body measurements, in centimetres.
///
/// `torso_height` is the divisor for the local vertical-scale override;
/// the others are handed to the estimator as context for what a "size 1.0"
/// pattern is assumed to fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseMeasurements {
    pub bust: f64,
    pub waist: f64,
    pub hips: f64,
    pub torso_height: f64,
}

impl Default for BaseMeasurements {
    fn default() -> Self {
        Self {
            bust: 90.0,
            waist: 70.0,
            hips: 95.0,
            torso_height: 30.0,
        }
    }
}

/// Configuration for the pattern-rescaling service.
///
/// Built via [`ServiceConfig::builder()`] or [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use tailorfit::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .dpi(200)
///     .model("gpt-4o-mini")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Rasterisation DPI for PDF uploads. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// Cap on either dimension of a rendered or rescaled page, in pixels.
    /// Default: 6000.
    ///
    /// An A0 sheet at 300 DPI is ~9 900 × 14 000 px; the cap keeps a single
    /// page well below a gigabyte of RGBA.
    pub max_rendered_pixels: u32,

    /// Reference measurements (bust 90, waist 70, hips 95, torso 30).
    pub base: BaseMeasurements,

    /// LLM model identifier. If None, `gpt-4o-mini`.
    pub model: Option<String>,

    /// LLM provider name ("openai", "anthropic", "ollama", …).
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the estimator. Default: 0.3.
    pub temperature: f32,

    /// Token cap for estimator answers. Default: 100.
    ///
    /// The answer is five short lines; a tight cap stops the model from
    /// wrapping the numbers in paragraphs of prose.
    pub estimator_max_tokens: usize,

    /// Token cap for sewing instructions. Default: 800.
    pub instructions_max_tokens: usize,

    /// Retries after the first failed completion attempt. Default: 1.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-attempt completion timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// How the estimator is asked to answer and how the answer is decoded.
    pub response_strategy: ResponseStrategy,

    /// Maximum number of summary lines sent to the estimator. Default: 10.
    pub summary_max_lines: usize,

    /// Ask the instructions collaborator for sewing steps. Default: true.
    pub include_instructions: bool,

    /// Root under which one job directory per request is created.
    pub output_dir: PathBuf,

    /// Explicit pdfium library path. If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Largest accepted upload in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 6000,
            base: BaseMeasurements::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            estimator_max_tokens: 100,
            instructions_max_tokens: 800,
            max_retries: 1,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            response_strategy: ResponseStrategy::default(),
            summary_max_lines: 10,
            include_instructions: true,
            output_dir: PathBuf::from("output"),
            pdfium_lib_path: None,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("base", &self.base)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("response_strategy", &self.response_strategy)
            .field("include_instructions", &self.include_instructions)
            .field("output_dir", &self.output_dir)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model used when none is configured.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Model used when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn base(mut self, base: BaseMeasurements) -> Self {
        self.config.base = base;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn estimator_max_tokens(mut self, n: usize) -> Self {
        self.config.estimator_max_tokens = n;
        self
    }

    pub fn instructions_max_tokens(mut self, n: usize) -> Self {
        self.config.instructions_max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn response_strategy(mut self, strategy: ResponseStrategy) -> Self {
        self.config.response_strategy = strategy;
        self
    }

    pub fn summary_max_lines(mut self, n: usize) -> Self {
        self.config.summary_max_lines = n.max(1);
        self
    }

    pub fn include_instructions(mut self, v: bool) -> Self {
        self.config.include_instructions = v;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, PatternError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(PatternError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        let b = &c.base;
        for (name, value) in [
            ("base bust", b.bust),
            ("base waist", b.waist),
            ("base hips", b.hips),
            ("base torso height", b.torso_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PatternError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if c.api_timeout_secs == 0 {
            return Err(PatternError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the estimator is prompted and how its answer is decoded.
///
/// | Strategy | Prompt asks for | Decoder |
/// |----------|-----------------|---------|
/// | `TolerantScan` | `key = value` lines | line scanner |
/// | `Structured` | one JSON object | serde, falling back to the line scanner |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseStrategy {
    /// Plain `key = value` lines; the historical wire format. (default)
    #[default]
    TolerantScan,
    /// JSON object with the same keys.
    Structured,
}
