//! CLI binary for ocrmath.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use ocrmath::{read_ocr_text, write_atomic, RenderConfig, RenderPipeline};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render an OCR transcript to HTML on stdout
  ocrmath page.md

  # Read from stdin, write to a file
  cat page.md | ocrmath -o page.html

  # Keep math as literal $…$ (no math engine)
  ocrmath --no-math page.md

  # Only typeset math, leave the rest as text
  ocrmath --math-only page.md

  # Inspect what was recognised as math
  ocrmath --spans page.md

  # Full report: markup, per-span outcome, counters
  ocrmath --json page.md > report.json

MATH ENGINES:
  mathml   pulldown-latex → MathML (default, pure Rust)
  katex    KaTeX HTML (build with --features katex)

ENVIRONMENT VARIABLES:
  RUST_LOG               Override log filter (e.g. ocrmath=debug)
"#;

/// Render OCR Markdown with LaTeX math into HTML.
#[derive(Parser, Debug)]
#[command(
    name = "ocrmath",
    version,
    about = "Render OCR Markdown with embedded LaTeX math into HTML",
    long_about = "Render Markdown transcripts containing $…$ and $$…$$ LaTeX into HTML. \
Math spans are protected from the Markdown engine, rendered independently, and \
spliced back in; any span the math engine rejects is kept as its literal source.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file with OCR text. Reads stdin when absent or `-`.
    input: Option<PathBuf>,

    /// Write markup to this file instead of stdout.
    #[arg(short, long, env = "OCRMATH_OUTPUT")]
    output: Option<PathBuf>,

    /// Math engine: mathml or katex.
    #[arg(long, env = "OCRMATH_MATH_ENGINE", value_enum, default_value = "mathml")]
    math_engine: MathEngineArg,

    /// Do not typeset math; keep the literal $…$ source.
    #[arg(long, env = "OCRMATH_NO_MATH")]
    no_math: bool,

    /// Do not interpret Markdown; only turn line breaks into <br>.
    #[arg(long, env = "OCRMATH_NO_MARKDOWN")]
    no_markdown: bool,

    /// Typeset math in place without any Markdown conversion.
    #[arg(long, conflicts_with = "no_math")]
    math_only: bool,

    /// Treat single newlines as spaces instead of line breaks.
    #[arg(long, env = "OCRMATH_NO_HARD_BREAKS")]
    no_hard_breaks: bool,

    /// Clean OCR artefacts (outer fences, CRLF, invisible chars) first.
    #[arg(long, env = "OCRMATH_CLEAN")]
    clean: bool,

    /// HTML-escape math that is kept as literal source.
    #[arg(long, env = "OCRMATH_ESCAPE_FALLBACK")]
    escape_fallback: bool,

    /// Markup to emit when the input is empty.
    #[arg(long, env = "OCRMATH_EMPTY_MESSAGE")]
    empty_message: Option<String>,

    /// Output a JSON report (markup, spans, stats) instead of markup.
    #[arg(long, conflicts_with_all = ["math_only", "spans"])]
    json: bool,

    /// Output the extracted math spans as JSON instead of markup.
    #[arg(long, conflicts_with = "math_only")]
    spans: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCRMATH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCRMATH_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MathEngineArg {
    Mathml,
    Katex,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read input ───────────────────────────────────────────────────────
    let raw = read_input(cli.input.as_ref())?;

    // ── Build pipeline ───────────────────────────────────────────────────
    let pipeline = RenderPipeline::new(build_config(&cli)?);

    // ── Spans-only mode ──────────────────────────────────────────────────
    if cli.spans {
        let spans = pipeline.extract_spans(Some(&raw));
        let json = serde_json::to_string_pretty(&spans).context("Failed to serialise spans")?;
        return emit(&cli, &json);
    }

    if cli.math_only {
        let markup = pipeline.render_math_only(Some(&raw));
        return emit(&cli, &markup);
    }

    if cli.json {
        let output = pipeline.render_detailed(Some(&raw));
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        return emit(&cli, &json);
    }

    if let Some(ref path) = cli.output {
        let stats = pipeline
            .render_to_file(Some(&raw), path)
            .context("Failed to write output")?;
        if !cli.quiet {
            eprintln!(
                "{}/{} math spans rendered ({} kept literal)  →  {}",
                stats.rendered_spans,
                stats.total_spans(),
                stats.fallback_spans,
                path.display()
            );
        }
        return Ok(());
    }

    let markup = pipeline.render_to_string(Some(&raw));
    emit(&cli, &markup)
}

/// Map CLI args to `RenderConfig`.
fn build_config(cli: &Cli) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .hard_breaks(!cli.no_hard_breaks)
        .clean_input(cli.clean)
        .escape_fallback(cli.escape_fallback);

    if let Some(ref message) = cli.empty_message {
        builder = builder.empty_message(message.clone());
    }

    builder = match (cli.no_math, cli.math_engine) {
        (true, _) => builder.without_math_engine(),
        (false, MathEngineArg::Mathml) => builder.math_engine(mathml_engine()?),
        (false, MathEngineArg::Katex) => builder.math_engine(katex_engine()?),
    };

    if cli.no_markdown {
        builder = builder.without_markdown_engine();
    }

    builder.build().context("Invalid configuration")
}

#[cfg(feature = "mathml")]
fn mathml_engine() -> Result<Arc<dyn ocrmath::MathEngine>> {
    Ok(Arc::new(ocrmath::engine::MathMlEngine))
}

#[cfg(not(feature = "mathml"))]
fn mathml_engine() -> Result<Arc<dyn ocrmath::MathEngine>> {
    anyhow::bail!("this build has no MathML engine; rebuild with --features mathml")
}

#[cfg(feature = "katex")]
fn katex_engine() -> Result<Arc<dyn ocrmath::MathEngine>> {
    Ok(Arc::new(ocrmath::engine::KatexEngine))
}

#[cfg(not(feature = "katex"))]
fn katex_engine() -> Result<Arc<dyn ocrmath::MathEngine>> {
    anyhow::bail!("this build has no KaTeX engine; rebuild with --features katex")
}

/// Read OCR text from a file, or from stdin for `None` / `-`.
fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            read_ocr_text(path).context("Failed to read input")
        }
        _ => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

/// Write `text` to `--output` (atomically) or stdout.
fn emit(cli: &Cli, text: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        return write_atomic(path, text).context("Failed to write output");
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
