//! Pluggable Markdown and math engines.
//!
//! The pipeline treats both engines as black boxes: a Markdown engine turns
//! placeholder-substituted text into markup, a math engine turns one LaTeX
//! expression into a markup fragment. Either may be absent; absence is a
//! defined degraded mode, not an error.
//!
//! Built-in implementations live behind cargo features:
//!
//! | Feature  | Engine            | Output            |
//! |----------|-------------------|-------------------|
//! | `comrak` | [`ComrakEngine`]  | GFM HTML          |
//! | `mathml` | [`MathMlEngine`]  | MathML            |
//! | `katex`  | [`KatexEngine`]   | KaTeX HTML        |

use crate::config::MarkdownOptions;
use crate::error::EngineError;
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "comrak")]
mod comrak;
#[cfg(feature = "katex")]
mod katex;
#[cfg(feature = "mathml")]
mod mathml;

#[cfg(feature = "comrak")]
pub use self::comrak::ComrakEngine;
#[cfg(feature = "katex")]
pub use self::katex::KatexEngine;
#[cfg(feature = "mathml")]
pub use self::mathml::MathMlEngine;

/// Converts one LaTeX expression into a markup fragment.
///
/// Implementations should return `Err` rather than panic on malformed input;
/// the pipeline catches panics anyway and treats them as [`EngineError::Panicked`].
pub trait MathEngine: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Render `expression` (without delimiters) in display or inline mode.
    fn render(&self, expression: &str, display_mode: bool) -> Result<String, EngineError>;
}

/// Converts Markdown text into a markup document.
pub trait MarkdownEngine: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Convert `text` honouring the GFM and line-break switches in `options`.
    fn to_markup(&self, text: &str, options: &MarkdownOptions) -> Result<String, EngineError>;
}

/// Run an engine call, converting a panic into [`EngineError::Panicked`].
pub(crate) fn guarded<T>(
    engine: &str,
    call: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(_) => Err(EngineError::Panicked {
            engine: engine.to_string(),
        }),
    }
}
