//! Configuration types for math-aware Markdown rendering.
//!
//! All rendering behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. The config is an explicit value handed to
//! [`crate::render::RenderPipeline::new`], so two pipelines in one process can
//! carry different engines (e.g. a test pipeline with mock engines next to the
//! production one) without touching any global state.

use crate::engine::{MarkdownEngine, MathEngine};
use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Message shown when there is no OCR text to render.
pub const DEFAULT_EMPTY_MESSAGE: &str =
    r#"<p style="color: var(--hint-color)">No content extracted</p>"#;

/// Configuration for a [`crate::render::RenderPipeline`].
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use ocrmath::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .without_math_engine()
///     .escape_fallback(true)
///     .build()
///     .unwrap();
/// assert!(config.math_engine.is_none());
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Engine used to typeset math spans. `None` leaves every span as its
    /// literal `$…$` / `$$…$$` source.
    ///
    /// Defaults to [`crate::engine::MathMlEngine`] when the `mathml` feature is
    /// enabled, else [`crate::engine::KatexEngine`] when `katex` is enabled.
    pub math_engine: Option<Arc<dyn MathEngine>>,

    /// Engine used to convert the placeholder-substituted text. `None` falls
    /// back to replacing every line break with `<br>`.
    ///
    /// Defaults to [`crate::engine::ComrakEngine`] when the `comrak` feature is
    /// enabled.
    pub markdown_engine: Option<Arc<dyn MarkdownEngine>>,

    /// Switches handed to the Markdown engine.
    pub markdown: MarkdownOptions,

    /// Markup assigned to the surface when the input is empty or absent.
    /// Default: [`DEFAULT_EMPTY_MESSAGE`].
    pub empty_message: String,

    /// HTML-escape literal fallbacks (`$x<y$` → `$x&lt;y$`). Default: false.
    ///
    /// Off by default so the fallback is byte-for-byte the source text.
    pub escape_fallback: bool,

    /// Run the OCR cleanup rules in [`crate::pipeline::clean`] before
    /// extraction. Default: false.
    pub clean_input: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            math_engine: default_math_engine(),
            markdown_engine: default_markdown_engine(),
            markdown: MarkdownOptions::default(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            escape_fallback: false,
            clean_input: false,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("math_engine", &self.math_engine.as_ref().map(|e| e.name()))
            .field(
                "markdown_engine",
                &self.markdown_engine.as_ref().map(|e| e.name()),
            )
            .field("markdown", &self.markdown)
            .field("empty_message", &self.empty_message)
            .field("escape_fallback", &self.escape_fallback)
            .field("clean_input", &self.clean_input)
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`, starting from the defaults.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// A config with no engines at all: the fully degraded mode.
    pub fn bare() -> Self {
        Self {
            math_engine: None,
            markdown_engine: None,
            ..Self::default()
        }
    }
}

#[cfg(feature = "mathml")]
fn default_math_engine() -> Option<Arc<dyn MathEngine>> {
    Some(Arc::new(crate::engine::MathMlEngine))
}

#[cfg(all(not(feature = "mathml"), feature = "katex"))]
fn default_math_engine() -> Option<Arc<dyn MathEngine>> {
    Some(Arc::new(crate::engine::KatexEngine))
}

#[cfg(not(any(feature = "mathml", feature = "katex")))]
fn default_math_engine() -> Option<Arc<dyn MathEngine>> {
    None
}

#[cfg(feature = "comrak")]
fn default_markdown_engine() -> Option<Arc<dyn MarkdownEngine>> {
    Some(Arc::new(crate::engine::ComrakEngine))
}

#[cfg(not(feature = "comrak"))]
fn default_markdown_engine() -> Option<Arc<dyn MarkdownEngine>> {
    None
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn math_engine(mut self, engine: Arc<dyn MathEngine>) -> Self {
        self.config.math_engine = Some(engine);
        self
    }

    pub fn without_math_engine(mut self) -> Self {
        self.config.math_engine = None;
        self
    }

    pub fn markdown_engine(mut self, engine: Arc<dyn MarkdownEngine>) -> Self {
        self.config.markdown_engine = Some(engine);
        self
    }

    pub fn without_markdown_engine(mut self) -> Self {
        self.config.markdown_engine = None;
        self
    }

    pub fn markdown(mut self, options: MarkdownOptions) -> Self {
        self.config.markdown = options;
        self
    }

    pub fn hard_breaks(mut self, v: bool) -> Self {
        self.config.markdown.hard_breaks = v;
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.config.empty_message = message.into();
        self
    }

    pub fn escape_fallback(mut self, v: bool) -> Self {
        self.config.escape_fallback = v;
        self
    }

    pub fn clean_input(mut self, v: bool) -> Self {
        self.config.clean_input = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, RenderError> {
        if self.config.empty_message.trim().is_empty() {
            return Err(RenderError::InvalidConfig(
                "empty_message must not be blank; the surface would show nothing".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Markdown options ─────────────────────────────────────────────────────

/// Switches forwarded to the [`MarkdownEngine`].
///
/// The defaults match a GFM renderer with `breaks: true`: every soft line
/// break in the OCR text is significant, which is what users expect from a
/// transcription where each source line is its own line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownOptions {
    /// Render `\n` inside a paragraph as a line break. Default: true.
    pub hard_breaks: bool,
    /// GFM tables. Default: true.
    pub tables: bool,
    /// GFM bare-URL autolinks. Default: true.
    pub autolinks: bool,
    /// GFM `~~strikethrough~~`. Default: true.
    pub strikethrough: bool,
    /// GFM `- [x]` task lists. Default: true.
    pub task_lists: bool,
    /// Pass raw HTML in the source through untouched. Default: true.
    pub raw_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            hard_breaks: true,
            tables: true,
            autolinks: true,
            strikethrough: true,
            task_lists: true,
            raw_html: true,
        }
    }
}
