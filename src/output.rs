//! Output types returned by [`crate::render::RenderPipeline::render_detailed`].

use crate::error::EngineError;
use crate::pipeline::extract::MathKind;
use crate::pipeline::math::FragmentSource;
use serde::{Deserialize, Serialize};

/// The final markup plus a per-span account of how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Markup ready to be assigned to a display surface.
    pub markup: String,
    /// One entry per extracted span, in token-number order.
    pub spans: Vec<SpanReport>,
    pub stats: RenderStats,
}

/// What happened to one math span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanReport {
    /// Token number (display spans first, then inline).
    pub index: usize,
    pub kind: MathKind,
    /// Trimmed source between the delimiters.
    pub expression: String,
    /// Rendered, or kept literal and why.
    pub source: FragmentSource,
    /// Copies of the span's token found after Markdown conversion. `0` means
    /// the Markdown engine dropped it; `>1` means it was duplicated.
    pub occurrences: usize,
}

/// Aggregate counters for one render call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub display_spans: usize,
    pub inline_spans: usize,
    /// Spans typeset by the math engine.
    pub rendered_spans: usize,
    /// Spans kept as literal source (no engine, or engine failure).
    pub fallback_spans: usize,
    /// Spans whose token the Markdown engine did not emit.
    pub dropped_spans: usize,
    pub math_engine: Option<String>,
    pub markdown_engine: Option<String>,
    /// Set when the Markdown engine failed and the line-break fallback ran.
    pub markdown_degraded: Option<EngineError>,
    /// The input was empty or absent; `markup` is the "no content" message.
    pub empty_input: bool,
    /// Set when an internal failure forced the whole-text literal fallback.
    pub literal_fallback: bool,
    /// Wall-clock time spent in the pipeline, in microseconds.
    pub duration_us: u64,
}

impl RenderStats {
    pub fn total_spans(&self) -> usize {
        self.display_spans + self.inline_spans
    }

    /// True when every span was typeset and the Markdown engine (if any) ran cleanly.
    pub fn is_clean(&self) -> bool {
        self.fallback_spans == 0 && self.markdown_degraded.is_none() && !self.literal_fallback
    }
}
