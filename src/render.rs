//! The render pipeline: raw OCR text → display-ready markup.
//!
//! ## Why a pipeline object?
//!
//! Engines and options are fixed once in a [`RenderConfig`] and reused for
//! every call, the same way a page would configure its Markdown and math
//! libraries once at load. Each call is still a pure transformation: all span
//! and placeholder state lives on the stack of that call, so one pipeline can
//! be shared across threads without locking.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::output::{RenderOutput, RenderStats, SpanReport};
use crate::pipeline::clean::clean_ocr_text;
use crate::pipeline::extract::{extract, extract_with, Extraction, MathSpan, PlaceholderScheme};
use crate::pipeline::markdown::{self, Conversion};
use crate::pipeline::math::MathSpanRenderer;
use crate::pipeline::reinsert::{reinsert, Reinsertion};
use std::borrow::Cow;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Anything that can display a markup string.
///
/// [`RenderPipeline::render`] assigns the whole document in one call; there
/// are no incremental updates.
pub trait DisplaySurface {
    fn set_markup(&mut self, markup: String);
}

impl DisplaySurface for String {
    fn set_markup(&mut self, markup: String) {
        *self = markup;
    }
}

/// Segment, convert, render and reassemble OCR text.
///
/// # Example
/// ```rust
/// use ocrmath::{RenderConfig, RenderPipeline};
///
/// let pipeline = RenderPipeline::new(RenderConfig::bare());
/// let mut surface = String::new();
/// pipeline.render(Some("Euler: $e^{i\\pi}+1=0$\nQED"), &mut surface);
/// assert_eq!(surface, "Euler: $e^{i\\pi}+1=0$<br>QED");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderPipeline {
    config: RenderConfig,
}

impl RenderPipeline {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `raw` and assign the result to `surface`.
    ///
    /// Empty or absent input assigns the configured "no content" message.
    /// Never fails: engine failures degrade to literal text.
    pub fn render<S: DisplaySurface + ?Sized>(&self, raw: Option<&str>, surface: &mut S) {
        surface.set_markup(self.render_to_string(raw));
    }

    /// Render `raw` and return the markup.
    pub fn render_to_string(&self, raw: Option<&str>) -> String {
        self.render_detailed(raw).markup
    }

    /// Render `raw` and return the markup with per-span reports and stats.
    pub fn render_detailed(&self, raw: Option<&str>) -> RenderOutput {
        let start = Instant::now();

        let Some(text) = self.prepare(raw) else {
            debug!("empty input; showing placeholder message");
            return self.empty_output();
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_render(&text)));
        let mut output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Render failed, degrading to literal text: {e}");
                self.literal_output(&text)
            }
            Err(_) => {
                warn!("Render panicked, degrading to literal text");
                self.literal_output(&text)
            }
        };

        output.stats.duration_us = start.elapsed().as_micros() as u64;
        info!(
            spans = output.stats.total_spans(),
            rendered = output.stats.rendered_spans,
            fallback = output.stats.fallback_spans,
            "Render complete in {}µs",
            output.stats.duration_us
        );
        output
    }

    /// Render math spans in place without any Markdown interpretation.
    ///
    /// With no math engine the raw text is returned HTML-escaped, i.e. shown
    /// as plain text.
    pub fn render_math_only(&self, raw: Option<&str>) -> String {
        let Some(text) = self.prepare(raw) else {
            return self.config.empty_message.clone();
        };
        if self.config.math_engine.is_none() {
            return html_escape::encode_text(&text).into_owned();
        }

        let extraction = extract(&text);
        let renderer = self.math_renderer();
        match reinsert(
            &extraction.processed,
            &extraction.spans,
            &extraction.scheme,
            |span| renderer.render_one(span),
        ) {
            Ok(reinsertion) => reinsertion.markup,
            Err(e) => {
                warn!("Math-only render failed, returning text unchanged: {e}");
                text.into_owned()
            }
        }
    }

    /// Render `raw` and write the markup to `path` atomically.
    ///
    /// See [`write_atomic`]; missing parent directories are created.
    pub fn render_to_file(
        &self,
        raw: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<RenderStats, RenderError> {
        let output = self.render_detailed(raw);
        write_atomic(path, &output.markup)?;
        Ok(output.stats)
    }

    /// The math spans a render of `raw` would typeset, in token-number order.
    ///
    /// Applies the same input cleanup as the render calls; empty input has
    /// no spans.
    pub fn extract_spans(&self, raw: Option<&str>) -> Vec<MathSpan> {
        self.prepare(raw)
            .map(|text| extract(&text).spans)
            .unwrap_or_default()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Apply optional cleanup; `None` means there is nothing to render.
    fn prepare<'a>(&self, raw: Option<&'a str>) -> Option<Cow<'a, str>> {
        let raw = raw.filter(|r| !r.is_empty())?;
        let text = if self.config.clean_input {
            Cow::Owned(clean_ocr_text(raw))
        } else {
            Cow::Borrowed(raw)
        };
        (!text.is_empty()).then_some(text)
    }

    fn math_renderer(&self) -> MathSpanRenderer<'_> {
        MathSpanRenderer::new(self.config.math_engine.as_deref())
            .escape_fallback(self.config.escape_fallback)
    }

    /// Token spelling that neither the raw text nor the Markdown engine's
    /// rendering of it can imitate.
    ///
    /// Escapes and entities (`\%`, `&#37;`) only become `%` inside the
    /// engine, so the raw text is converted once and the fence is grown past
    /// that markup as well.
    fn placeholder_scheme(&self, text: &str) -> PlaceholderScheme {
        let scheme = PlaceholderScheme::for_input(text);
        let Some(engine) = self.config.markdown_engine.as_deref() else {
            return scheme;
        };
        let plain = markdown::convert(text, Some(engine), &self.config.markdown);
        let grown = scheme.clone().grown_past(&plain.markup);
        if grown != scheme {
            debug!(
                fence = grown.fence(),
                "markdown output imitates placeholders; lengthened fence"
            );
        }
        grown
    }

    fn try_render(&self, text: &str) -> Result<RenderOutput, RenderError> {
        // ── Step 1: Extract math spans ───────────────────────────────────
        let extraction = extract_with(text, self.placeholder_scheme(text));

        // ── Step 2: Convert Markdown ─────────────────────────────────────
        let conversion = markdown::convert(
            &extraction.processed,
            self.config.markdown_engine.as_deref(),
            &self.config.markdown,
        );

        // ── Step 3: Render spans and fold them back in ───────────────────
        let renderer = self.math_renderer();
        let reinsertion = reinsert(
            &conversion.markup,
            &extraction.spans,
            &extraction.scheme,
            |span| renderer.render_one(span),
        )?;

        Ok(self.assemble(extraction, conversion, reinsertion))
    }

    fn assemble(
        &self,
        extraction: Extraction,
        conversion: Conversion,
        reinsertion: Reinsertion,
    ) -> RenderOutput {
        let dropped_spans = reinsertion.dropped().count();
        let Reinsertion {
            markup,
            fragments,
            occurrences,
        } = reinsertion;

        let spans: Vec<SpanReport> = extraction
            .spans
            .into_iter()
            .zip(fragments)
            .zip(occurrences)
            .enumerate()
            .map(|(index, ((span, fragment), occurrences))| SpanReport {
                index,
                kind: span.kind,
                expression: span.expression,
                source: fragment.source,
                occurrences,
            })
            .collect();

        let rendered_spans = spans.iter().filter(|s| s.source.is_rendered()).count();
        let display_spans = spans.iter().filter(|s| s.kind.is_display()).count();

        let stats = RenderStats {
            display_spans,
            inline_spans: spans.len() - display_spans,
            rendered_spans,
            fallback_spans: spans.len() - rendered_spans,
            dropped_spans,
            math_engine: self.engine_names().0,
            markdown_engine: self.engine_names().1,
            markdown_degraded: conversion.degraded,
            ..RenderStats::default()
        };

        RenderOutput {
            markup,
            spans,
            stats,
        }
    }

    fn engine_names(&self) -> (Option<String>, Option<String>) {
        (
            self.config.math_engine.as_ref().map(|e| e.name().to_string()),
            self.config
                .markdown_engine
                .as_ref()
                .map(|e| e.name().to_string()),
        )
    }

    fn empty_output(&self) -> RenderOutput {
        let (math_engine, markdown_engine) = self.engine_names();
        RenderOutput {
            markup: self.config.empty_message.clone(),
            spans: Vec::new(),
            stats: RenderStats {
                math_engine,
                markdown_engine,
                empty_input: true,
                ..RenderStats::default()
            },
        }
    }

    fn literal_output(&self, text: &str) -> RenderOutput {
        let (math_engine, markdown_engine) = self.engine_names();
        RenderOutput {
            markup: markdown::fallback_markup(text),
            spans: Vec::new(),
            stats: RenderStats {
                math_engine,
                markdown_engine,
                literal_fallback: true,
                ..RenderStats::default()
            },
        }
    }
}

/// Write `contents` to `path` so readers never see a half-written file.
///
/// The contents go to a temporary file in the target directory, which is then
/// renamed over `path`. Missing parent directories are created.
pub fn write_atomic(path: impl AsRef<Path>, contents: &str) -> Result<(), RenderError> {
    let path = path.as_ref();
    let write_err = |source| RenderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote markup");
    Ok(())
}

/// Read raw OCR text from `path`.
pub fn read_ocr_text(path: impl AsRef<Path>) -> Result<String, RenderError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| RenderError::InputReadFailed {
        path: PathBuf::from(path),
        source,
    })
}
