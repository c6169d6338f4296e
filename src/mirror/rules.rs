// src/mirror/rules.rs

//! Built-in rules registered when `render.default_rules = true`.
//!
//! Each one is idempotent: applying it to its own output is a no-op.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::pipeline::TransformPipeline;

pub const NORMALIZE_EOL: &str = "normalize-eol";
pub const COLLAPSE_BLANK_LINES: &str = "collapse-blank-lines";
pub const FINAL_NEWLINE: &str = "final-newline";

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n{3,}").expect("static regex is valid")
});

pub fn register_defaults(pipeline: &mut TransformPipeline) {
    pipeline.register(NORMALIZE_EOL, normalize_eol);
    pipeline.register(COLLAPSE_BLANK_LINES, collapse_blank_lines);
    pipeline.register(FINAL_NEWLINE, final_newline);
}

/// CRLF and lone CR become LF.
pub fn normalize_eol(_path: &Path, content: &str) -> anyhow::Result<String> {
    if !content.contains('\r') {
        return Ok(content.to_string());
    }
    Ok(content.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Three or more consecutive newlines shrink to one blank line.
pub fn collapse_blank_lines(_path: &Path, content: &str) -> anyhow::Result<String> {
    Ok(BLANK_RUN.replace_all(content, "\n\n").into_owned())
}

/// Non-empty content ends with exactly one newline.
pub fn final_newline(_path: &Path, content: &str) -> anyhow::Result<String> {
    let trimmed = content.trim_end_matches('\n');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("{trimmed}\n"))
}
