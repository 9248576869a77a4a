//! # ocrmath
//!
//! Render OCR-extracted Markdown with embedded LaTeX math into display-ready
//! markup.
//!
//! ## Why this crate?
//!
//! OCR models asked to transcribe scientific documents answer in Markdown
//! with `$…$` and `$$…$$` LaTeX. Feeding that straight to a Markdown engine
//! destroys the math: `a_1 + b_1` turns into emphasis, `\\` collapses to `\`,
//! a line starting with `* ` becomes a list. Feeding it straight to a math
//! engine ignores the document structure. This crate cuts the math out
//! first, converts the rest, then splices independently rendered math back
//! in, and degrades to literal text whenever an engine is missing or fails.
//!
//! ## Pipeline Overview
//!
//! ```text
//! raw OCR text
//!  │
//!  ├─ 0. Clean     optional: strip fences, CRLF, invisible chars
//!  ├─ 1. Extract   $$…$$ then $…$ → %%DISPLAYMATHn%% / %%INLINEMATHn%%
//!  ├─ 2. Markdown  GFM + hard breaks (or \n → <br> without an engine)
//!  ├─ 3. Math      each span → MathML / KaTeX HTML (or literal $…$)
//!  └─ 4. Reinsert  every token → its fragment, in one pass
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ocrmath::{RenderConfig, RenderPipeline};
//!
//! let pipeline = RenderPipeline::new(RenderConfig::default());
//! let html = pipeline.render_to_string(Some("# Result\n\nWe have $a^2+b^2=c^2$."));
//! assert!(!html.contains("%%INLINEMATH"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `ocrmath` binary (clap + anyhow + tracing-subscriber) |
//! | `comrak` | on      | Built-in GFM Markdown engine |
//! | `mathml` | on      | Built-in MathML math engine (pulldown-latex) |
//! | `katex`  | off     | KaTeX HTML math engine (embeds a JS runtime) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod render;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{MarkdownOptions, RenderConfig, RenderConfigBuilder, DEFAULT_EMPTY_MESSAGE};
pub use engine::{MarkdownEngine, MathEngine};
pub use error::{EngineError, RenderError};
pub use output::{RenderOutput, RenderStats, SpanReport};
pub use pipeline::extract::{
    extract, extract_with, Extraction, MathKind, MathSpan, PlaceholderScheme,
};
pub use pipeline::math::{FragmentSource, MathSpanRenderer, RenderedFragment};
pub use render::{read_ocr_text, write_atomic, DisplaySurface, RenderPipeline};
