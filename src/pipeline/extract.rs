//! Math span extraction: cut `$$…$$` and `$…$` out of the raw text.
//!
//! Markdown engines mangle LaTeX (`_` becomes emphasis, `\\` becomes `\`,
//! `*` starts a list). Before the text goes anywhere near a Markdown engine,
//! every math span is swapped for an opaque placeholder token and recorded,
//! in order, in a span list. The tokens are swapped back for rendered
//! fragments in [`crate::pipeline::reinsert`].
//!
//! ## Pattern semantics
//!
//! Two non-overlapping, leftmost-first passes:
//!
//! 1. Display: `\$\$([\s\S]+?)\$\$`: non-greedy, may span lines.
//! 2. Inline (on pass 1 output): `\$([^$\n]+?)\$`: non-greedy, no `$` and no
//!    newline in the body, so an unclosed `$5` at the end of a line stays
//!    literal and never captures the next line.
//!
//! Because display runs first, `$$$x$$$` resolves to the display span `$x`
//! followed by a literal `$`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;

static RE_DISPLAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$([\s\S]+?)\$\$").unwrap());

static RE_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").unwrap());

const DISPLAY_TAG: &str = "DISPLAYMATH";
const INLINE_TAG: &str = "INLINEMATH";

/// Whether a span is block-level (`$$…$$`) or inline (`$…$`) math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathKind {
    Display,
    Inline,
}

impl MathKind {
    /// Source delimiter for this kind.
    pub fn delimiter(self) -> &'static str {
        match self {
            MathKind::Display => "$$",
            MathKind::Inline => "$",
        }
    }

    pub fn is_display(self) -> bool {
        matches!(self, MathKind::Display)
    }

    fn tag(self) -> &'static str {
        match self {
            MathKind::Display => DISPLAY_TAG,
            MathKind::Inline => INLINE_TAG,
        }
    }
}

impl fmt::Display for MathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathKind::Display => f.write_str("display"),
            MathKind::Inline => f.write_str("inline"),
        }
    }
}

/// One math expression cut out of the raw text.
///
/// Its identity is its position in [`Extraction::spans`], which is also the
/// number encoded in its placeholder token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathSpan {
    pub kind: MathKind,
    /// Source between the delimiters, trimmed.
    pub expression: String,
}

impl MathSpan {
    pub fn new(kind: MathKind, expression: impl Into<String>) -> Self {
        Self {
            kind,
            expression: expression.into(),
        }
    }

    /// The span re-wrapped in its original delimiters: `$$expr$$` or `$expr$`.
    pub fn literal(&self) -> String {
        let d = self.kind.delimiter();
        format!("{d}{}{d}", self.expression)
    }
}

/// How placeholder tokens are spelled for one extraction.
///
/// A token is `<fence>DISPLAYMATH<i><fence>` or `<fence>INLINEMATH<i><fence>`.
/// The fence is `%%` unless the raw text already contains something that
/// starts like a token, in which case it is lengthened until it does not.
/// Tokens contain only `%`, ASCII capitals and digits: nothing a Markdown
/// engine treats as list, emphasis, heading or escape syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderScheme {
    fence: String,
}

impl Default for PlaceholderScheme {
    fn default() -> Self {
        Self {
            fence: "%%".to_string(),
        }
    }
}

impl PlaceholderScheme {
    /// Pick a fence that cannot collide with anything already in `raw`.
    pub fn for_input(raw: &str) -> Self {
        Self::default().grown_past(raw)
    }

    /// Lengthen the fence until no token of this scheme could be read out of
    /// `text`.
    ///
    /// A fence clear of the raw text is not enough on its own: a Markdown
    /// engine decodes `\%` and `&#37;` into `%`, so the converted markup can
    /// contain token-shaped text the raw input did not.
    pub fn grown_past(mut self, text: &str) -> Self {
        while self.marks_placeholder(text) {
            self.fence.push('%');
        }
        self
    }

    pub fn fence(&self) -> &str {
        &self.fence
    }

    /// The token for the span at `index`.
    pub fn token(&self, kind: MathKind, index: usize) -> String {
        format!("{f}{}{index}{f}", kind.tag(), f = self.fence)
    }

    /// Regex matching any token of this scheme.
    ///
    /// Group 1 is the kind tag, group 2 the span index.
    pub fn pattern(&self) -> Result<Regex, regex::Error> {
        let f = regex::escape(&self.fence);
        Regex::new(&format!("{f}({DISPLAY_TAG}|{INLINE_TAG})([0-9]+){f}"))
    }

    fn marks_placeholder(&self, text: &str) -> bool {
        text.contains(&format!("{}{DISPLAY_TAG}", self.fence))
            || text.contains(&format!("{}{INLINE_TAG}", self.fence))
    }
}

/// Result of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Raw text with every span replaced by its token.
    pub processed: String,
    /// Spans in token-number order: display spans first, then inline.
    pub spans: Vec<MathSpan>,
    /// Token spelling used for `processed`.
    pub scheme: PlaceholderScheme,
}

impl Extraction {
    pub fn display_count(&self) -> usize {
        self.spans.iter().filter(|s| s.kind.is_display()).count()
    }

    pub fn inline_count(&self) -> usize {
        self.spans.len() - self.display_count()
    }

    /// Token for the span at `index`, if any.
    pub fn token(&self, index: usize) -> Option<String> {
        self.spans
            .get(index)
            .map(|s| self.scheme.token(s.kind, index))
    }
}

/// Segment `raw` into placeholder text plus the ordered list of math spans.
///
/// Every match is replaced exactly once; `spans[i]` corresponds to the only
/// occurrence of token `i` in `processed`. Unmatched delimiters stay literal.
pub fn extract(raw: &str) -> Extraction {
    extract_with(raw, PlaceholderScheme::default())
}

/// [`extract`] with a caller-chosen starting scheme.
///
/// The scheme is still grown past `raw`, so a too-short fence is never used.
pub fn extract_with(raw: &str, scheme: PlaceholderScheme) -> Extraction {
    let scheme = scheme.grown_past(raw);
    let mut spans: Vec<MathSpan> = Vec::new();

    // ── Pass 1: display math ─────────────────────────────────────────────
    let pass1 = RE_DISPLAY.replace_all(raw, |caps: &Captures<'_>| {
        let token = scheme.token(MathKind::Display, spans.len());
        spans.push(MathSpan::new(MathKind::Display, caps[1].trim()));
        token
    });

    // ── Pass 2: inline math ──────────────────────────────────────────────
    let pass2 = RE_INLINE.replace_all(&pass1, |caps: &Captures<'_>| {
        // `$a $$b$$ c$` would otherwise swallow display token 0 into an
        // inline expression; leave such text literal.
        if scheme.marks_placeholder(&caps[1]) {
            return caps[0].to_string();
        }
        let token = scheme.token(MathKind::Inline, spans.len());
        spans.push(MathSpan::new(MathKind::Inline, caps[1].trim()));
        token
    });

    let processed = pass2.into_owned();
    tracing::debug!(
        spans = spans.len(),
        fence = scheme.fence(),
        "extracted math spans"
    );

    Extraction {
        processed,
        spans,
        scheme,
    }
}
