//! Diagnostic rendering for terminal output.

use std::path::Path;

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic reported for `path`.
    ///
    /// When `source` is provided, the offending line is quoted with a caret
    /// under the reported column.
    fn render(&self, diag: &Diagnostic, path: &Path, source: Option<&str>) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error: expected ';'
///   --> circuits/main.circom:3:21
///    |
///  3 | include "lib.circom"
///    |                     ^
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_label(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Note => "36",
        };
        format!("\x1b[1;{code}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, path: &Path, source: Option<&str>) -> String {
        let mut out = format!("{}: {}\n", self.severity_label(diag.severity), diag.message);

        match diag.location {
            Some(location) => {
                out.push_str(&format!("  --> {}:{location}\n", path.display()));
                let line_content = source.and_then(|s| {
                    (location.line as usize)
                        .checked_sub(1)
                        .and_then(|idx| s.lines().nth(idx))
                });
                if let Some(line_content) = line_content {
                    let line_num = location.line.to_string();
                    let padding = " ".repeat(line_num.len());
                    let col_padding = " ".repeat((location.column as usize).saturating_sub(1));
                    out.push_str(&format!("{padding} |\n"));
                    out.push_str(&format!("{line_num} | {line_content}\n"));
                    out.push_str(&format!("{padding} | {col_padding}^\n"));
                }
            }
            None => out.push_str(&format!("  --> {}\n", path.display())),
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    #[test]
    fn render_error_with_source_line() {
        let source = "pragma circom 2.1.6;\ninclude \"a.circom\"\n";
        let diag = Diagnostic::error("expected ';'", Location::new(2, 19));

        let output = TerminalRenderer::new(false).render(&diag, Path::new("main.circom"), Some(source));

        assert!(output.contains("error: expected ';'"));
        assert!(output.contains("--> main.circom:2:19"));
        assert!(output.contains("include \"a.circom\""));
        assert!(output.contains("^"));
    }

    #[test]
    fn render_without_location() {
        let diag = Diagnostic::general("no templates").with_note("file is empty");
        let output = TerminalRenderer::new(false).render(&diag, Path::new("x.circom"), None);
        assert!(output.contains("error: no templates"));
        assert!(output.contains("--> x.circom\n"));
        assert!(output.contains("= note: file is empty"));
    }

    #[test]
    fn render_colored_severity() {
        let diag = Diagnostic::warning("unused", Location::new(1, 1));
        let output = TerminalRenderer::new(true).render(&diag, Path::new("x.circom"), None);
        assert!(output.contains("\x1b[1;33mwarning\x1b[0m"));
    }
}
