//! Pipeline stages for math-aware Markdown rendering.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and either engine can be swapped without touching the
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! clean ──▶ extract ──▶ markdown ──▶ math × reinsert
//! (opt.)    (regex)     (engine)     (engine, one pass)
//! ```
//!
//! 1. [`clean`]   : optional OCR hygiene (fences, CRLF, invisible chars)
//! 2. [`extract`] : swap `$$…$$` then `$…$` spans for placeholder tokens
//! 3. [`markdown`]: convert the placeholder text; tokens pass through as text
//! 4. [`math`]    : render each span, or keep its literal source
//! 5. [`reinsert`]: replace every token with its span's fragment

pub mod clean;
pub mod extract;
pub mod markdown;
pub mod math;
pub mod reinsert;
