//! Optional cleanup of raw OCR text before math extraction.
//!
//! OCR models occasionally wrap their whole answer in a ` ```markdown ` fence
//! despite being told not to, emit CRLF line endings, or scatter zero-width
//! characters through the text, including through the middle of a LaTeX
//! command where they make the math engine reject the whole expression. The
//! rules below fix that and run only when
//! [`crate::config::RenderConfig::clean_input`] is set.
//!
//! Every rule is written against text that still contains `$…$` and `$$…$$`
//! spans, since cleanup runs before extraction:
//!
//! | Rule | Outside math | Inside `$$…$$` |
//! |------|--------------|----------------|
//! | outer fence  | unwraps the answer | n/a (whole-text only) |
//! | line endings | CRLF/CR → LF | same; a display span split by `\r\n` stays one span |
//! | trailing ws  | trimmed | trimmed, except a TeX control space (`\ `) |
//! | math blank lines | untouched | blank lines closed up (a `\par` is illegal in math mode) |
//! | blank runs   | 4+ newlines → 3 | never reached (math blank lines are gone) |
//! | invisible    | removed | removed, so `\fr<ZWSP>ac` becomes `\frac` again |
//!
//! Line endings are normalised before any rule that matches on `\n`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use tracing::debug;

type Rule = fn(&str) -> Cow<'_, str>;

/// Rules in the order they run.
const RULES: &[(&str, Rule)] = &[
    ("outer_fence", strip_outer_fence),
    ("line_endings", normalise_line_endings),
    ("trailing_whitespace", trim_trailing_whitespace),
    ("math_blank_lines", close_blank_lines_in_display_math),
    ("blank_runs", collapse_blank_runs),
    ("invisible_chars", remove_invisible_chars),
];

/// Apply every cleanup rule in order and return the cleaned text.
pub fn clean_ocr_text(input: &str) -> String {
    let mut text = input.to_string();
    for (name, rule) in RULES {
        let changed = match rule(&text) {
            Cow::Owned(changed) => changed,
            Cow::Borrowed(_) => continue,
        };
        debug!(rule = *name, "cleanup rule applied");
        text = changed;
    }
    text
}

// ── Outer fence ──────────────────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```(?:markdown|md)?[ \t]*\r?\n(.*?)\r?\n```\s*\z").unwrap()
});

fn strip_outer_fence(input: &str) -> Cow<'_, str> {
    match RE_OUTER_FENCE.captures(input) {
        Some(caps) => Cow::Owned(caps[1].to_string()),
        None => Cow::Borrowed(input),
    }
}

// ── Line endings ─────────────────────────────────────────────────────────────

static RE_CR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());

fn normalise_line_endings(input: &str) -> Cow<'_, str> {
    RE_CR.replace_all(input, "\n")
}

// ── Trailing whitespace ──────────────────────────────────────────────────────

// Group 1 keeps the character before the run; a backslash there means the
// run is a TeX control space and must survive.
static RE_TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(^|[^\\])[ \t]+$").unwrap());

fn trim_trailing_whitespace(input: &str) -> Cow<'_, str> {
    RE_TRAILING_WS.replace_all(input, "$1")
}

// ── Blank lines inside display math ──────────────────────────────────────────

static RE_DISPLAY_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$([\s\S]+?)\$\$").unwrap());

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

fn close_blank_lines_in_display_math(input: &str) -> Cow<'_, str> {
    if !input.contains("$$") {
        return Cow::Borrowed(input);
    }
    let mut changed = false;
    let out = RE_DISPLAY_BODY.replace_all(input, |caps: &Captures<'_>| {
        let body = RE_BLANK_RUN.replace_all(&caps[1], "\n");
        if let Cow::Owned(_) = body {
            changed = true;
        }
        format!("$${body}$$")
    });
    if changed {
        Cow::Owned(out.into_owned())
    } else {
        Cow::Borrowed(input)
    }
}

// ── Blank runs ───────────────────────────────────────────────────────────────

static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_runs(input: &str) -> Cow<'_, str> {
    RE_EXCESS_NEWLINES.replace_all(input, "\n\n\n")
}

// ── Invisible characters ─────────────────────────────────────────────────────

// ZWSP, ZWNJ, ZWJ, word joiner, BOM, soft hyphen.
static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}-\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> Cow<'_, str> {
    RE_INVISIBLE.replace_all(input, "")
}
