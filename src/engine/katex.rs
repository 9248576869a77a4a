//! KaTeX HTML math engine.

use super::MathEngine;
use crate::error::EngineError;
use katex::{OptsBuilder, OutputType};

const ENGINE: &str = "katex";

/// Math engine producing KaTeX HTML (`output: 'html'`).
///
/// KaTeX is asked to throw on malformed input so the error reaches the
/// pipeline as `Err` and the span falls back to its literal source, rather
/// than being typeset as red error text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexEngine;

impl MathEngine for KatexEngine {
    fn name(&self) -> &str {
        ENGINE
    }

    fn render(&self, expression: &str, display_mode: bool) -> Result<String, EngineError> {
        let mut builder = OptsBuilder::default();
        builder.display_mode(display_mode);
        builder.output_type(OutputType::Html);
        builder.throw_on_error(true);

        let opts = builder.build().map_err(|err| EngineError::Failed {
            engine: ENGINE.to_string(),
            detail: format!("failed to build KaTeX options: {err}"),
        })?;

        katex::render_with_opts(expression, &opts).map_err(|err| match err {
            katex::Error::JsExecError(detail) => EngineError::Rejected {
                engine: ENGINE.to_string(),
                detail,
            },
            other => EngineError::Failed {
                engine: ENGINE.to_string(),
                detail: other.to_string(),
            },
        })
    }
}
