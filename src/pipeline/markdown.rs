//! Markdown conversion of the placeholder-substituted text.
//!
//! Delegates to the configured [`MarkdownEngine`]. With no engine, or when
//! the engine fails, falls back to [`fallback_markup`]: every line break
//! becomes `<br>` and nothing else is interpreted. Placeholder tokens are
//! plain text to this stage; it never looks for them.

use crate::config::MarkdownOptions;
use crate::engine::{guarded, MarkdownEngine};
use crate::error::EngineError;
use tracing::{debug, warn};

/// Result of [`convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Markup with placeholder tokens still embedded.
    pub markup: String,
    /// Set when an engine was configured but failed and the fallback was used.
    pub degraded: Option<EngineError>,
}

/// Convert `text` to markup with `engine`, or with the line-break fallback.
pub fn convert(
    text: &str,
    engine: Option<&dyn MarkdownEngine>,
    options: &MarkdownOptions,
) -> Conversion {
    let Some(engine) = engine else {
        debug!("no markdown engine configured; using line-break fallback");
        return Conversion {
            markup: fallback_markup(text),
            degraded: None,
        };
    };

    match guarded(engine.name(), || engine.to_markup(text, options)) {
        Ok(markup) => {
            debug!(engine = engine.name(), bytes = markup.len(), "markdown converted");
            Conversion {
                markup,
                degraded: None,
            }
        }
        Err(e) => {
            warn!("Markdown engine failed, using line-break fallback: {e}");
            Conversion {
                markup: fallback_markup(text),
                degraded: Some(e),
            }
        }
    }
}

/// Minimal degradation: each line break (`\r\n`, `\n` or `\r`) becomes `<br>`.
pub fn fallback_markup(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br>")
}
