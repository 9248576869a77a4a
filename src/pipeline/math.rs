//! Per-span math rendering with literal fallback.

use crate::engine::{guarded, MathEngine};
use crate::error::EngineError;
use crate::pipeline::extract::MathSpan;
use html_escape::encode_text;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where a [`RenderedFragment`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FragmentSource {
    /// The math engine typeset the expression.
    Rendered,
    /// No math engine is configured; the literal source was kept.
    NoEngine,
    /// The engine failed; the literal source was kept.
    Fallback { error: EngineError },
}

impl FragmentSource {
    pub fn is_rendered(&self) -> bool {
        matches!(self, FragmentSource::Rendered)
    }
}

/// Markup produced for one [`MathSpan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFragment {
    pub markup: String,
    pub source: FragmentSource,
}

/// Renders spans one at a time with an optional engine.
///
/// Never fails: an absent engine, a rejected expression or a panicking engine
/// all yield the span's literal `$$expr$$` / `$expr$` text.
#[derive(Clone, Copy)]
pub struct MathSpanRenderer<'a> {
    engine: Option<&'a dyn MathEngine>,
    escape_fallback: bool,
}

impl<'a> MathSpanRenderer<'a> {
    pub fn new(engine: Option<&'a dyn MathEngine>) -> Self {
        Self {
            engine,
            escape_fallback: false,
        }
    }

    /// HTML-escape literal fallbacks before they are spliced into markup.
    pub fn escape_fallback(mut self, v: bool) -> Self {
        self.escape_fallback = v;
        self
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine.map(|e| e.name())
    }

    pub fn render_one(&self, span: &MathSpan) -> RenderedFragment {
        let Some(engine) = self.engine else {
            return RenderedFragment {
                markup: self.literal(span),
                source: FragmentSource::NoEngine,
            };
        };

        let display = span.kind.is_display();
        match guarded(engine.name(), || engine.render(&span.expression, display)) {
            Ok(markup) => RenderedFragment {
                markup,
                source: FragmentSource::Rendered,
            },
            Err(error) => {
                warn!(
                    kind = %span.kind,
                    "Rendering failed, keeping the original content: {error}"
                );
                RenderedFragment {
                    markup: self.literal(span),
                    source: FragmentSource::Fallback { error },
                }
            }
        }
    }

    fn literal(&self, span: &MathSpan) -> String {
        let literal = span.literal();
        if self.escape_fallback {
            encode_text(&literal).into_owned()
        } else {
            literal
        }
    }
}
