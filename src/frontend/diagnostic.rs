use std::env;

use crate::error::HannaError;

/// Renders an error the way the CLI reports it: a headline naming the error
/// kind and file, the message, and, when the error points at a token and
/// the source is at hand, the offending line with a caret under it.
///
/// Colors are suppressed when `NO_COLOR` is set.
pub fn render_error(error: &HannaError, source: Option<&str>, file: &str) -> String {
    let use_color = env::var_os("NO_COLOR").is_none();
    let red = "\u{1b}[0;31m";
    let reset = "\u{1b}[0m";

    let mut out = String::new();
    if use_color {
        out.push_str(red);
    }
    out.push_str(&format!("-- {} -- {}", error.title(), file));
    if use_color {
        out.push_str(reset);
    }
    out.push('\n');

    out.push('\n');
    out.push_str(&format!("ERROR: {}", error));
    out.push('\n');

    if let Some(position) = error.position() {
        if let Some(line_text) = source.and_then(|src| src.lines().nth(position.line.saturating_sub(1))) {
            let line_str = position.line.to_string();
            let gutter_width = line_str.len();
            let caret_indent = position.column.saturating_sub(1).min(line_text.len());
            out.push('\n');
            out.push_str(&format!(
                "{:>width$} | {}\n",
                position.line,
                line_text,
                width = gutter_width
            ));
            out.push_str(&format!(
                "{:>width$} | {}",
                "",
                " ".repeat(caret_indent),
                width = gutter_width
            ));
            if use_color {
                out.push_str(red);
            }
            out.push('^');
            if use_color {
                out.push_str(reset);
            }
            out.push('\n');
        }
    }

    out
}
