//! # tailorfit
//!
//! Rescale sewing patterns (SVG or PDF) to a wearer's body measurements, and
//! draft simple garment patterns from measurements alone.
//!
//! ## How it works
//!
//! A pattern is drafted for some body that nobody wrote down. Rather than
//! reverse-engineering the pieces, this crate asks a language model to
//! estimate the pattern's original size from a short summary of the
//! document, and to report how much each axis must grow or shrink. The
//! scaling itself is local and deterministic.
//!
//! ```text
//! upload (SVG | PDF)
//!  │
//!  ├─ 1. Persist   fresh job directory per request
//!  ├─ 2. Summarise root size, element counts, labels (or PDF page sizes)
//!  ├─ 3. Estimate  estimator call with timeout + retry
//!  ├─ 4. Resolve   scale_x / scale_y, defaults, torso-height override
//!  ├─ 5. Transform SVG: wrap content in <g transform="scale(x,y)">
//!  │               PDF: rasterise → resample each page
//!  └─ 6. Assemble  scaled.svg, or pages reassembled into scaled.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tailorfit::{MeasurementSet, PatternService, ResizeRequest, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let service = PatternService::from_config(ServiceConfig::default())?;
//!     let output = service
//!         .resize(ResizeRequest {
//!             pattern_type: "dress".into(),
//!             measurements: MeasurementSet::from_fields(Some("96"), Some("74"), None, Some("33")),
//!             filename: "dress.svg".into(),
//!             bytes: std::fs::read("dress.svg")?,
//!         })
//!         .await?;
//!     println!("scaled by {} → {}/{}", output.scale.factor, output.job_id, output.download_name());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The [`http`] router and the `tailorfit` binary (axum + clap + anyhow + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! tailorfit = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod measurements;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod response;
pub mod scale;
pub mod service;

#[cfg(feature = "server")]
pub mod http;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BaseMeasurements, ResponseStrategy, ServiceConfig, ServiceConfigBuilder};
pub use error::{CompletionError, PatternError, ResponseParseError};
pub use measurements::{parse_measurement, MeasurementSet};
pub use output::{PagePreview, RenderedPattern, ResizeOutput};
pub use pipeline::generate::{GarmentKind, GeneratedPattern};
pub use pipeline::llm::{Completion, CompletionClient, ProviderClient};
pub use response::{ResponseDecoder, ScaleEstimate};
pub use scale::{ResolvedScale, ScaleFactor, ScaleSource};
pub use service::{GenerateRequest, PatternService, ResizeRequest};
