//! Pipeline stages for pattern rescaling and generation.
//!
//! Each submodule implements one step. [`crate::service`] strings them
//! together and [`stage`] enforces the order.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ summary ──▶ llm ──▶ vector ─────────────┐
//! (job dir) (SVG/PDF)  (estimator)  (SVG splice)     ├──▶ response
//!                               └──▶ render ▶ raster ▶ render
//!                                    (pdfium)  (resize) (assemble)
//! ```
//!
//! 1. [`input`]   — classify the upload and persist it in a fresh job directory
//! 2. [`summary`] — condense the document into a few lines for the prompt
//! 3. [`llm`]     — estimator and instructions calls, with timeout and retry;
//!    the only stage with network I/O
//! 4. [`vector`]  — wrap SVG content in a scale group
//! 5. [`render`]  — pdfium rasterisation, inspection and reassembly; runs in
//!    `spawn_blocking`
//! 6. [`raster`]  — per-axis Lanczos resampling of page images
//! 7. [`encode`]  — thumbnails for the result page
//! 8. [`cleanup`] — deterministic tidying of instruction text
//! 9. [`generate`] — garment templates for the generation flow

pub mod cleanup;
pub mod encode;
pub mod generate;
pub mod input;
pub mod llm;
pub mod raster;
pub mod render;
pub mod stage;
pub mod summary;
pub mod vector;
