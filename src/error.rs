//! Error types for the ocrmath library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RenderError`] is **fatal**: the caller asked for something that cannot
//!   be done at all (invalid configuration, unreadable input, unwritable
//!   output file). Returned only from configuration validation,
//!   [`crate::render::read_ocr_text`] and [`crate::render::RenderPipeline::render_to_file`].
//!
//! * [`EngineError`] is **non-fatal**: a Markdown or math engine rejected its
//!   input or blew up. The pipeline degrades to literal text for that span (or
//!   to the minimal Markdown fallback) and records the error in
//!   [`crate::output::SpanReport`]; it is never propagated to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ocrmath library.
///
/// The `render*` entry points never return these; they degrade instead.
#[derive(Debug, Error)]
pub enum RenderError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the raw OCR text.
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output markup file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error from a pluggable engine.
///
/// Stored alongside [`crate::output::SpanReport`] when a span falls back to
/// its literal source, or in [`crate::output::RenderStats`] when the Markdown
/// stage degrades.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum EngineError {
    /// The engine parsed the input and refused it (malformed expression).
    #[error("{engine} rejected the input: {detail}")]
    Rejected { engine: String, detail: String },

    /// The engine failed for a reason unrelated to the input itself.
    #[error("{engine} failed: {detail}")]
    Failed { engine: String, detail: String },

    /// The engine panicked; the panic was caught at the call site.
    #[error("{engine} panicked")]
    Panicked { engine: String },
}

impl EngineError {
    /// Name of the engine that produced this error.
    pub fn engine(&self) -> &str {
        match self {
            EngineError::Rejected { engine, .. }
            | EngineError::Failed { engine, .. }
            | EngineError::Panicked { engine } => engine,
        }
    }
}
