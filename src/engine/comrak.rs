//! GFM Markdown engine backed by comrak.

use super::MarkdownEngine;
use crate::config::MarkdownOptions;
use crate::error::EngineError;

/// Markdown → HTML via comrak.
///
/// Mirrors a marked-style setup: soft breaks become `<br />` when
/// [`MarkdownOptions::hard_breaks`] is set, and raw HTML in the OCR text is
/// passed through when [`MarkdownOptions::raw_html`] is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComrakEngine;

impl MarkdownEngine for ComrakEngine {
    fn name(&self) -> &str {
        "comrak"
    }

    fn to_markup(&self, text: &str, options: &MarkdownOptions) -> Result<String, EngineError> {
        let mut opts = comrak::Options::default();
        opts.extension.table = options.tables;
        opts.extension.autolink = options.autolinks;
        opts.extension.strikethrough = options.strikethrough;
        opts.extension.tasklist = options.task_lists;
        opts.render.hardbreaks = options.hard_breaks;
        opts.render.unsafe_ = options.raw_html;
        Ok(comrak::markdown_to_html(text, &opts))
    }
}
