//! LaTeX math rendering via pulldown-latex → MathML

use super::MathEngine;
use crate::error::EngineError;
use pulldown_latex::{
    config::DisplayMode, config::RenderConfig as MathMlConfig, mathml::push_mathml, Parser,
    Storage,
};

const ENGINE: &str = "mathml";

/// Pure-Rust math engine producing MathML.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMlEngine;

impl MathEngine for MathMlEngine {
    fn name(&self) -> &str {
        ENGINE
    }

    fn render(&self, expression: &str, display_mode: bool) -> Result<String, EngineError> {
        let storage = Storage::new();
        let parser = Parser::new(expression, &storage);
        let config = MathMlConfig {
            display_mode: if display_mode {
                DisplayMode::Block
            } else {
                DisplayMode::Inline
            },
            ..Default::default()
        };

        // Collect events first so a parse error rejects the whole expression
        // instead of leaking an inline error report into the MathML.
        let events: Vec<_> = parser.collect();
        let errors: Vec<String> = events
            .iter()
            .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
            .collect();
        if !errors.is_empty() {
            return Err(EngineError::Rejected {
                engine: ENGINE.to_string(),
                detail: errors.join("; "),
            });
        }

        let mut mathml = String::new();
        push_mathml(&mut mathml, events.into_iter(), config).map_err(|e| {
            EngineError::Failed {
                engine: ENGINE.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(mathml)
    }
}
