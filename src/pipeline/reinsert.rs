//! Fold rendered math fragments back into the converted markup.
//!
//! One regex pass over the markup: each token occurrence is looked up by its
//! index and replaced by that span's fragment. Replacement is global per
//! token (an engine that duplicated a token gets the fragment at every copy),
//! inserted fragments are never rescanned, and bytes outside token
//! occurrences are copied through unchanged. A token the engine dropped is
//! not an error; its span simply reports zero occurrences.

use crate::error::RenderError;
use crate::pipeline::extract::{MathSpan, PlaceholderScheme};
use crate::pipeline::math::RenderedFragment;
use regex::Captures;
use tracing::debug;

/// Result of [`reinsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reinsertion {
    /// Final markup, free of placeholder tokens.
    pub markup: String,
    /// Fragment per span, by index.
    pub fragments: Vec<RenderedFragment>,
    /// How many times each span's token was found in the markup.
    pub occurrences: Vec<usize>,
}

impl Reinsertion {
    /// Spans whose token did not survive Markdown conversion.
    pub fn dropped(&self) -> impl Iterator<Item = usize> + '_ {
        self.occurrences
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(i, _)| i)
    }
}

/// Replace every token in `markup` with `render_fn(span)` for its span.
///
/// `render_fn` is called exactly once per span, in index order, whether or
/// not the span's token is still present.
pub fn reinsert<F>(
    markup: &str,
    spans: &[MathSpan],
    scheme: &PlaceholderScheme,
    render_fn: F,
) -> Result<Reinsertion, RenderError>
where
    F: FnMut(&MathSpan) -> RenderedFragment,
{
    let fragments: Vec<RenderedFragment> = spans.iter().map(render_fn).collect();
    let mut occurrences = vec![0usize; spans.len()];

    if spans.is_empty() {
        return Ok(Reinsertion {
            markup: markup.to_string(),
            fragments,
            occurrences,
        });
    }

    let pattern = scheme
        .pattern()
        .map_err(|e| RenderError::Internal(format!("placeholder pattern: {e}")))?;

    let replaced = pattern.replace_all(markup, |caps: &Captures<'_>| {
        let index = caps[2].parse::<usize>().ok();
        match index.and_then(|i| fragments.get(i).map(|f| (i, f))) {
            Some((i, fragment)) => {
                occurrences[i] += 1;
                fragment.markup.clone()
            }
            // Not one of ours; copy through.
            None => caps[0].to_string(),
        }
    });
    let markup = replaced.into_owned();

    for (i, &n) in occurrences.iter().enumerate() {
        match n {
            0 => debug!(span = i, "placeholder dropped by markdown engine"),
            1 => {}
            n => debug!(span = i, copies = n, "placeholder duplicated by markdown engine"),
        }
    }

    Ok(Reinsertion {
        markup,
        fragments,
        occurrences,
    })
}
