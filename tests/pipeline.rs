//! Integration tests for the render pipeline.
//!
//! Mock engines make every stage observable: the Markdown mock wraps lines in
//! `<p>` and turns `*x*` into `<em>x</em>`, the math mock tags each expression
//! with its mode and rejects anything containing `\bad`. Tests that exercise
//! the built-in comrak / MathML engines are gated on their features.

use ocrmath::{
    extract, EngineError, FragmentSource, MarkdownEngine, MarkdownOptions, MathEngine, MathKind,
    RenderConfig, RenderPipeline, DEFAULT_EMPTY_MESSAGE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Mock engines ─────────────────────────────────────────────────────────────

/// Paragraph-per-line Markdown with `*emphasis*`.
struct MiniMarkdown;

impl MarkdownEngine for MiniMarkdown {
    fn name(&self) -> &str {
        "mini"
    }

    fn to_markup(&self, text: &str, _options: &MarkdownOptions) -> Result<String, EngineError> {
        Ok(text
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| {
                let mut out = String::new();
                for (i, part) in l.split('*').enumerate() {
                    if i % 2 == 1 {
                        out.push_str(&format!("<em>{part}</em>"));
                    } else {
                        out.push_str(part);
                    }
                }
                format!("<p>{out}</p>")
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Emits every line twice, duplicating any placeholder on it.
struct Duplicating;

impl MarkdownEngine for Duplicating {
    fn name(&self) -> &str {
        "dup"
    }

    fn to_markup(&self, text: &str, _options: &MarkdownOptions) -> Result<String, EngineError> {
        Ok(format!("<p>{text}</p><p>{text}</p>"))
    }
}

/// Drops everything after the first line.
struct Truncating;

impl MarkdownEngine for Truncating {
    fn name(&self) -> &str {
        "trunc"
    }

    fn to_markup(&self, text: &str, _options: &MarkdownOptions) -> Result<String, EngineError> {
        Ok(format!("<p>{}</p>", text.lines().next().unwrap_or("")))
    }
}

/// Decodes `\%` and `&#37;` into `%`, the way CommonMark engines do.
struct Unescaping;

impl MarkdownEngine for Unescaping {
    fn name(&self) -> &str {
        "unescaping"
    }

    fn to_markup(&self, text: &str, _options: &MarkdownOptions) -> Result<String, EngineError> {
        Ok(format!(
            "<p>{}</p>",
            text.replace("\\%", "%").replace("&#37;", "%")
        ))
    }
}

struct PanickingMarkdown;

impl MarkdownEngine for PanickingMarkdown {
    fn name(&self) -> &str {
        "panicky-md"
    }

    fn to_markup(&self, _text: &str, _options: &MarkdownOptions) -> Result<String, EngineError> {
        panic!("markdown engine bug")
    }
}

/// Tags each expression with its mode; counts calls.
#[derive(Default)]
struct TagMath {
    calls: AtomicUsize,
}

impl MathEngine for TagMath {
    fn name(&self) -> &str {
        "tag"
    }

    fn render(&self, expression: &str, display_mode: bool) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if expression.contains("\\bad") {
            return Err(EngineError::Rejected {
                engine: "tag".into(),
                detail: format!("undefined control sequence in {expression}"),
            });
        }
        let mode = if display_mode { "D" } else { "I" };
        Ok(format!("<math mode=\"{mode}\">{expression}</math>"))
    }
}

struct PanickingMath;

impl MathEngine for PanickingMath {
    fn name(&self) -> &str {
        "panicky-math"
    }

    fn render(&self, _expression: &str, _display_mode: bool) -> Result<String, EngineError> {
        panic!("math engine bug")
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn pipeline(markdown: Option<Arc<dyn MarkdownEngine>>, math: Option<Arc<dyn MathEngine>>) -> RenderPipeline {
    RenderPipeline::new(RenderConfig {
        markdown_engine: markdown,
        math_engine: math,
        ..RenderConfig::bare()
    })
}

fn mocked() -> RenderPipeline {
    pipeline(Some(Arc::new(MiniMarkdown)), Some(Arc::new(TagMath::default())))
}

fn assert_no_placeholders(markup: &str) {
    assert!(
        !markup.contains("DISPLAYMATH") && !markup.contains("INLINEMATH"),
        "placeholder survived: {markup}"
    );
}

// ── Properties ───────────────────────────────────────────────────────────────

#[test]
fn text_without_dollars_equals_markdown_engine_output() {
    let raw = "# Heading\nsome *emphasis* here\n\nlast line";
    let expected = MiniMarkdown
        .to_markup(raw, &MarkdownOptions::default())
        .unwrap();
    assert_eq!(mocked().render_to_string(Some(raw)), expected);
}

#[test]
fn display_math_rendered_in_display_mode() {
    let out = mocked().render_to_string(Some("before $$\\frac{a}{b}$$ after"));
    assert_eq!(
        out,
        "<p>before <math mode=\"D\">\\frac{a}{b}</math> after</p>"
    );
    assert_no_placeholders(&out);
}

#[test]
fn inline_math_rendered_in_inline_mode() {
    let out = mocked().render_to_string(Some("let $x_1$ be given"));
    assert_eq!(out, "<p>let <math mode=\"I\">x_1</math> be given</p>");
}

#[test]
fn math_is_protected_from_emphasis() {
    // `*` inside math must reach the math engine, not the Markdown engine.
    let out = mocked().render_to_string(Some("*note* $a*b*c$"));
    assert_eq!(
        out,
        "<p><em>note</em> <math mode=\"I\">a*b*c</math></p>"
    );
}

#[test]
fn emphasis_around_math_wraps_the_fragment() {
    let out = mocked().render_to_string(Some("*$x$*"));
    assert_eq!(out, "<p><em><math mode=\"I\">x</math></em></p>");
}

#[test]
fn extraction_order_display_then_inline() {
    let e = extract("$$a$$ and $b$");
    let got: Vec<_> = e
        .spans
        .iter()
        .map(|s| (s.kind, s.expression.as_str()))
        .collect();
    assert_eq!(got, vec![(MathKind::Display, "a"), (MathKind::Inline, "b")]);
}

#[test]
fn unmatched_dollar_passes_through() {
    let out = mocked().render_detailed(Some("price is $5"));
    assert!(out.spans.is_empty());
    assert_eq!(out.markup, "<p>price is $5</p>");
}

#[test]
fn empty_and_absent_input_yield_message() {
    let p = mocked();
    assert_eq!(p.render_to_string(None), DEFAULT_EMPTY_MESSAGE);
    assert_eq!(p.render_to_string(Some("")), DEFAULT_EMPTY_MESSAGE);
}

#[test]
fn custom_empty_message() {
    let config = RenderConfig::builder()
        .empty_message("<p>nothing yet</p>")
        .build()
        .unwrap();
    let mut surface = String::from("stale");
    RenderPipeline::new(config).render(None, &mut surface);
    assert_eq!(surface, "<p>nothing yet</p>");
}

#[test]
fn failure_is_isolated_to_one_span() {
    let out = mocked().render_detailed(Some("good $x^2$ bad $\\bad{y}$"));
    assert_eq!(
        out.markup,
        "<p>good <math mode=\"I\">x^2</math> bad $\\bad{y}$</p>"
    );
    assert!(out.spans[0].source.is_rendered());
    assert!(matches!(
        out.spans[1].source,
        FragmentSource::Fallback {
            error: EngineError::Rejected { .. }
        }
    ));
    assert_eq!(out.stats.rendered_spans, 1);
    assert_eq!(out.stats.fallback_spans, 1);
}

#[test]
fn no_math_engine_is_lossless() {
    let p = pipeline(Some(Arc::new(MiniMarkdown)), None);
    let out = p.render_to_string(Some("Area $$\\pi r^2$$ and $r$ radius"));
    assert_eq!(out, "<p>Area $$\\pi r^2$$ and $r$ radius</p>");
}

#[test]
fn no_engines_at_all() {
    let p = pipeline(None, None);
    let out = p.render_to_string(Some("line $a$\n$$b$$\nend"));
    assert_eq!(out, "line $a$<br>$$b$$<br>end");
}

#[test]
fn math_without_markdown_engine() {
    let p = pipeline(None, Some(Arc::new(TagMath::default())));
    let out = p.render_to_string(Some("$a$\n$$b$$"));
    assert_eq!(
        out,
        "<math mode=\"I\">a</math><br><math mode=\"D\">b</math>"
    );
}

#[test]
fn duplicated_placeholder_replaced_everywhere() {
    let math = Arc::new(TagMath::default());
    let p = pipeline(Some(Arc::new(Duplicating)), Some(math.clone()));
    let out = p.render_detailed(Some("$x$"));
    assert_eq!(
        out.markup,
        "<p><math mode=\"I\">x</math></p><p><math mode=\"I\">x</math></p>"
    );
    assert_eq!(out.spans[0].occurrences, 2);
    // Rendered once, inserted twice.
    assert_eq!(math.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn dropped_placeholder_is_not_an_error() {
    let p = pipeline(Some(Arc::new(Truncating)), Some(Arc::new(TagMath::default())));
    let out = p.render_detailed(Some("first $a$\nsecond $b$"));
    assert_eq!(out.markup, "<p>first <math mode=\"I\">a</math></p>");
    assert_eq!(out.stats.dropped_spans, 1);
    assert_eq!(out.spans[1].occurrences, 0);
    assert_no_placeholders(&out.markup);
}

#[test]
fn panicking_markdown_engine_degrades_to_line_breaks() {
    let p = pipeline(
        Some(Arc::new(PanickingMarkdown)),
        Some(Arc::new(TagMath::default())),
    );
    let out = p.render_detailed(Some("a $x$\nb"));
    assert_eq!(out.markup, "a <math mode=\"I\">x</math><br>b");
    assert_eq!(
        out.stats.markdown_degraded,
        Some(EngineError::Panicked {
            engine: "panicky-md".into()
        })
    );
}

#[test]
fn panicking_math_engine_keeps_literals() {
    let p = pipeline(Some(Arc::new(MiniMarkdown)), Some(Arc::new(PanickingMath)));
    let out = p.render_detailed(Some("$$a$$ $b$"));
    assert_eq!(out.markup, "<p>$$a$$ $b$</p>");
    assert_eq!(out.stats.fallback_spans, 2);
}

#[test]
fn raw_text_resembling_placeholders_is_left_alone() {
    let out = mocked().render_to_string(Some("%%INLINEMATH0%% vs $y$"));
    assert_eq!(out, "<p>%%INLINEMATH0%% vs <math mode=\"I\">y</math></p>");
}

#[test]
fn escaped_percent_text_is_not_mistaken_for_a_token() {
    let p = pipeline(Some(Arc::new(Unescaping)), Some(Arc::new(TagMath::default())));
    let out = p.render_detailed(Some(r"literal \%\%INLINEMATH0\%\% and $x$"));
    assert_eq!(
        out.markup,
        "<p>literal %%INLINEMATH0%% and <math mode=\"I\">x</math></p>"
    );
    assert_eq!(out.spans[0].occurrences, 1);
}

#[test]
fn entity_percent_text_is_not_mistaken_for_a_token() {
    let p = pipeline(Some(Arc::new(Unescaping)), Some(Arc::new(TagMath::default())));
    let out = p.render_detailed(Some("literal &#37;&#37;DISPLAYMATH0&#37;&#37; and $$y$$"));
    assert_eq!(
        out.markup,
        "<p>literal %%DISPLAYMATH0%% and <math mode=\"D\">y</math></p>"
    );
    assert_eq!(out.spans[0].occurrences, 1);
}

#[test]
fn triple_dollar_display_wins() {
    let out = mocked().render_to_string(Some("$$$x$$$"));
    assert_eq!(out, "<p><math mode=\"D\">$x</math>$</p>");
}

#[test]
fn escape_fallback_option() {
    let p = RenderPipeline::new(RenderConfig {
        escape_fallback: true,
        ..RenderConfig::bare()
    });
    assert_eq!(p.render_to_string(Some("$a<b$")), "$a&lt;b$");
}

#[test]
fn math_only_mode_substitutes_in_place() {
    let out = mocked().render_math_only(Some("*keep* $x$\n$$y$$"));
    assert_eq!(
        out,
        "*keep* <math mode=\"I\">x</math>\n<math mode=\"D\">y</math>"
    );
}

#[test]
fn pipeline_is_shareable_across_threads() {
    let p = Arc::new(mocked());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let p = Arc::clone(&p);
            std::thread::spawn(move || p.render_to_string(Some(&format!("$x_{i}$"))))
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(
            h.join().unwrap(),
            format!("<p><math mode=\"I\">x_{i}</math></p>")
        );
    }
}

#[test]
fn report_serialises_to_json() {
    let out = mocked().render_detailed(Some("$$a$$ $\\bad$"));
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["spans"][0]["kind"], "display");
    assert_eq!(json["spans"][1]["source"]["outcome"], "fallback");
    assert_eq!(json["stats"]["math_engine"], "tag");
}

// ── Built-in engines ─────────────────────────────────────────────────────────

#[cfg(all(feature = "comrak", feature = "mathml"))]
mod builtin {
    use super::*;

    #[test]
    fn default_pipeline_renders_gfm_and_mathml() {
        let raw = "# Results\n\n| x | $x^2$ |\n| --- | --- |\n| 2 | 4 |\n\nWhere $$\\sum_{i=1}^n i$$ holds.";
        let out = RenderPipeline::default().render_detailed(Some(raw));
        assert!(out.markup.contains("<h1>Results</h1>"), "got: {}", out.markup);
        assert!(out.markup.contains("<table>"), "got: {}", out.markup);
        assert!(out.markup.contains("<math"), "got: {}", out.markup);
        assert_eq!(out.stats.rendered_spans, 2);
        assert_no_placeholders(&out.markup);
    }

    #[test]
    fn underscores_in_math_do_not_become_emphasis() {
        let out = RenderPipeline::default().render_to_string(Some("$a_1$ and $b_1$"));
        assert!(!out.contains("<em>"), "got: {out}");
        assert_no_placeholders(&out);
    }

    #[test]
    fn malformed_expression_kept_literal_next_to_valid_one() {
        let out = RenderPipeline::default().render_detailed(Some("$\\frac{a$ and $x^2$"));
        assert!(out.markup.contains("$\\frac{a$"), "got: {}", out.markup);
        assert!(out.markup.contains("<math"), "got: {}", out.markup);
        assert_eq!(out.stats.fallback_spans, 1);
        assert_eq!(out.stats.rendered_spans, 1);
    }

    #[test]
    fn comrak_decoded_percents_stay_user_text() {
        let out =
            RenderPipeline::default().render_detailed(Some(r"literal \%\%INLINEMATH0\%\% and $x$"));
        assert!(out.markup.contains("literal %%INLINEMATH0%% and"), "got: {}", out.markup);
        assert_eq!(out.markup.matches("<math").count(), 1, "got: {}", out.markup);
        assert_eq!(out.spans[0].occurrences, 1);

        let out = RenderPipeline::default()
            .render_detailed(Some("literal &#37;&#37;DISPLAYMATH0&#37;&#37; and $$y$$"));
        assert!(out.markup.contains("%%DISPLAYMATH0%%"), "got: {}", out.markup);
        assert_eq!(out.markup.matches("<math").count(), 1, "got: {}", out.markup);
        assert_eq!(out.spans[0].occurrences, 1);
    }

    #[test]
    fn soft_breaks_are_significant() {
        let out = RenderPipeline::default().render_to_string(Some("line one\nline two"));
        assert!(out.contains("<br"), "got: {out}");
    }
}

// ── File output ──────────────────────────────────────────────────────────────

#[test]
fn spans_report_matches_rendered_spans_with_cleanup() {
    let p = RenderPipeline::new(RenderConfig {
        clean_input: true,
        markdown_engine: Some(Arc::new(MiniMarkdown)),
        math_engine: Some(Arc::new(TagMath::default())),
        ..RenderConfig::bare()
    });
    let raw = "```markdown\n$$\r\na\r\n\r\nb\r\n$$ and $c\u{200B}$\n```";
    let spans = p.extract_spans(Some(raw));
    let rendered = p.render_detailed(Some(raw));
    let reported: Vec<_> = rendered
        .spans
        .iter()
        .map(|s| (s.kind, s.expression.clone()))
        .collect();
    let extracted: Vec<_> = spans.iter().map(|s| (s.kind, s.expression.clone())).collect();
    assert_eq!(extracted, reported);
    assert_eq!(spans[0].expression, "a\nb");
    assert_eq!(spans[1].expression, "c");
}

#[test]
fn render_to_file_is_atomic_and_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    std::fs::write(&path, "old").unwrap();

    let stats = mocked()
        .render_to_file(Some("$$a$$"), &path)
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "<p><math mode=\"D\">a</math></p>"
    );
    assert_eq!(stats.display_spans, 1);
    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1, "temp file left behind");
}
