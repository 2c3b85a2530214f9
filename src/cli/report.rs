//! Report formatting and printing utilities.
//!
//! Diagnostics are shown in cargo style. Kept out of `core` so notate can be
//! used as a library without any terminal output.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::commands::{CommandResult, CommandSummary, InitSummary, ListEntry, ListSummary, ReportedDiagnostic};
use crate::{config::CONFIG_FILE_NAME, diagnostics::Severity};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

pub fn print(result: &CommandResult) {
    match &result.summary {
        CommandSummary::Check(summary) => {
            report(&result.diagnostics);
            if result.diagnostics.is_empty() {
                print_success(result.source_files_checked, summary.annotation_count);
            }
        }
        CommandSummary::List(summary) => {
            print_list(summary);
            print_problem_hint(result.error_count + result.warning_count);
        }
        CommandSummary::Init(summary) => print_init(summary),
    }
}

/// Print diagnostics in cargo-style format to stdout.
pub fn report(diagnostics: &[ReportedDiagnostic]) {
    report_to(diagnostics, &mut io::stdout().lock());
}

/// Print diagnostics to a custom writer. Expects them sorted.
pub fn report_to<W: Write>(diagnostics: &[ReportedDiagnostic], writer: &mut W) {
    if diagnostics.is_empty() {
        return;
    }

    let max_line_width = calculate_max_line_width(diagnostics);
    for diagnostic in diagnostics {
        print_diagnostic(diagnostic, writer, max_line_width);
    }

    print_summary(diagnostics, writer);
}

/// Print a success message when nothing was reported.
pub fn print_success(source_files: usize, annotations: usize) {
    print_success_to(source_files, annotations, &mut io::stdout().lock());
}

pub fn print_success_to<W: Write>(source_files: usize, annotations: usize, writer: &mut W) {
    let msg = format!(
        "Checked {} source {}, {} {} - no issues found",
        source_files,
        if source_files == 1 { "file" } else { "files" },
        annotations,
        if annotations == 1 {
            "annotation"
        } else {
            "annotations"
        }
    );
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), msg.green());
}

pub fn print_list(summary: &ListSummary) {
    print_list_to(summary, &mut io::stdout().lock());
}

pub fn print_list_to<W: Write>(summary: &ListSummary, writer: &mut W) {
    if summary.json {
        match serde_json::to_string_pretty(&summary.entries) {
            Ok(json) => {
                let _ = writeln!(writer, "{}", json);
            }
            Err(err) => tracing::error!(error = %err, "cannot serialize listing"),
        }
        return;
    }

    if summary.entries.is_empty() {
        let _ = match &summary.name {
            Some(name) => writeln!(writer, "No annotations named {}", name.bold()),
            None => writeln!(writer, "No annotations found"),
        };
        return;
    }

    for entry in &summary.entries {
        print_entry(entry, writer);
    }
    let count = summary.entries.len();
    let _ = writeln!(
        writer,
        "{} {}",
        count,
        if count == 1 { "annotation" } else { "annotations" }
    );
}

/// Point at `check` when `list` saw problems it does not print.
pub fn print_problem_hint(count: usize) {
    print_problem_hint_to(count, &mut io::stderr().lock());
}

pub fn print_problem_hint_to<W: Write>(count: usize, writer: &mut W) {
    if count > 0 {
        let _ = writeln!(
            writer,
            "{} {} problem(s) found (run {} for details)",
            "warning:".bold().yellow(),
            count,
            "notate check".cyan()
        );
    }
}

fn print_init(summary: &InitSummary) {
    if summary.created {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    }
}

// ============================================================
// Internal Functions
// ============================================================

fn print_diagnostic<W: Write>(reported: &ReportedDiagnostic, writer: &mut W, max_line_width: usize) {
    let diagnostic = &reported.diagnostic;
    let severity_str = match diagnostic.severity {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };

    let _ = writeln!(
        writer,
        "{}: {}  {}",
        severity_str,
        diagnostic.message,
        diagnostic.stage.to_string().dimmed().cyan()
    );

    let Some(location) = &diagnostic.location else {
        let _ = writeln!(writer);
        return;
    };
    let _ = writeln!(writer, "  {} {}", "-->".blue(), location);

    if let Some(source_line) = &reported.source_line {
        let caret_char = match diagnostic.severity {
            Severity::Error => "^".red(),
            Severity::Warning => "^".yellow(),
        };

        let _ = writeln!(writer, "{:>width$} {}", "", "|".blue(), width = max_line_width);
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            location.line.to_string().blue(),
            "|".blue(),
            source_line,
            width = max_line_width
        );

        // col is 1-based and counts characters
        let prefix: String = source_line
            .chars()
            .take(location.col.saturating_sub(1))
            .collect();
        let caret_padding = UnicodeWidthStr::width(prefix.as_str());
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            caret_char,
            width = max_line_width,
            padding = caret_padding
        );
    }

    let _ = writeln!(writer);
}

fn print_entry<W: Write>(entry: &ListEntry, writer: &mut W) {
    let _ = writeln!(writer, "{}", entry.text.bold());
    let _ = writeln!(writer, "  {} {}", "-->".blue(), entry.location);

    match (&entry.anchor, &entry.anchor_error) {
        (Some(anchor), _) => {
            let _ = writeln!(writer, "   {} {} {}", "=".blue(), "anchor:".bold(), anchor);
        }
        (None, Some(err)) => {
            let _ = writeln!(
                writer,
                "   {} {} {}",
                "=".blue(),
                "anchor:".bold(),
                err.yellow()
            );
        }
        (None, None) => {}
    }

    for (index, line) in entry.argument_lines.iter().enumerate() {
        let _ = writeln!(
            writer,
            "   {} {} {}",
            "=".blue(),
            format!("arg {index}:").bold(),
            line
        );
    }
    let _ = writeln!(writer);
}

fn print_summary<W: Write>(diagnostics: &[ReportedDiagnostic], writer: &mut W) {
    let total_errors = diagnostics
        .iter()
        .filter(|d| d.diagnostic.is_error())
        .count();
    let total_warnings = diagnostics.len() - total_errors;

    let _ = writeln!(
        writer,
        "{} {} problems ({} {}, {} {})",
        FAILURE_MARK.red(),
        diagnostics.len(),
        total_errors,
        if total_errors == 1 { "error" } else { "errors" }.red(),
        total_warnings,
        if total_warnings == 1 {
            "warning"
        } else {
            "warnings"
        }
        .yellow()
    );
}

fn calculate_max_line_width(diagnostics: &[ReportedDiagnostic]) -> usize {
    diagnostics
        .iter()
        .filter_map(|d| d.diagnostic.location.as_ref().map(|loc| loc.line))
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1)
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, Location, Stage};

    fn strip_ansi(s: &str) -> String {
        let mut result = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == 'm' {
                        break;
                    }
                }
            } else {
                result.push(c);
            }
        }
        result
    }

    fn reported(diagnostic: Diagnostic, source_line: Option<&str>) -> ReportedDiagnostic {
        ReportedDiagnostic {
            diagnostic,
            source_line: source_line.map(str::to_string),
        }
    }

    fn render(diagnostics: &[ReportedDiagnostic]) -> String {
        let mut output = Vec::new();
        report_to(diagnostics, &mut output);
        strip_ansi(&String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_report_empty() {
        let mut output = Vec::new();
        report_to(&[], &mut output);
        assert!(output.is_empty());
    }

    #[test]
    fn test_report_parse_error_with_caret() {
        let diagnostic = Diagnostic::error(
            Stage::Parse,
            Some(Location::new("src/app.ts", 3, 5)),
            "NotACall.Foo + 1: not a func call, instead binary expression",
        );
        let output = render(&[reported(diagnostic, Some("// @NotACall.Foo + 1"))]);

        assert!(output.contains("error: NotACall.Foo + 1: not a func call"));
        assert!(output.contains("parse"));
        assert!(output.contains("--> src/app.ts:3:5"));
        assert!(output.contains("3 | // @NotACall.Foo + 1"));
        assert!(output.contains("\n  |     ^"));
        assert!(output.contains("1 problems (1 error, 0 warnings)"));
    }

    #[test]
    fn test_report_without_location() {
        let diagnostic = Diagnostic::warning(Stage::Load, None, "cannot read file");
        let output = render(&[reported(diagnostic, None)]);

        assert!(output.contains("warning: cannot read file"));
        assert!(!output.contains("-->"));
        assert!(output.contains("0 errors, 1 warning"));
    }

    #[test]
    fn test_report_unicode_source_line() {
        // "你好" is 4 columns wide but 2 characters.
        let diagnostic = Diagnostic::warning(
            Stage::Resolve,
            Some(Location::new("src/app.ts", 10, 6)),
            "Missing: not found",
        );
        let output = render(&[reported(diagnostic, Some("// 你好@Missing()"))]);

        assert!(output.contains("你好@Missing()"));
        assert!(output.contains("|        ^"));
    }

    #[test]
    fn test_print_success() {
        let mut output = Vec::new();
        print_success_to(1, 3, &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());
        assert!(stripped.contains("Checked 1 source file, 3 annotations - no issues found"));
    }

    #[test]
    fn test_print_list_text() {
        let summary = ListSummary {
            entries: vec![ListEntry {
                name: "Route".to_string(),
                text: r#"Route("/users")"#.to_string(),
                location: Location::new("src/users.ts", 2, 5),
                anchor: Some("class Users".to_string()),
                anchor_error: None,
                arguments: vec![serde_json::json!({ "kind": "string", "value": "/users" })],
                argument_lines: vec![r#""/users" (string)"#.to_string()],
            }],
            name: None,
            json: false,
        };

        let mut output = Vec::new();
        print_list_to(&summary, &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());

        assert!(stripped.contains(r#"Route("/users")"#));
        assert!(stripped.contains("--> src/users.ts:2:5"));
        assert!(stripped.contains("= anchor: class Users"));
        assert!(stripped.contains(r#"= arg 0: "/users" (string)"#));
        assert!(stripped.contains("1 annotation"));
    }

    #[test]
    fn test_print_list_empty_filter() {
        let summary = ListSummary {
            entries: Vec::new(),
            name: Some("Route".to_string()),
            json: false,
        };
        let mut output = Vec::new();
        print_list_to(&summary, &mut output);
        assert!(strip_ansi(&String::from_utf8(output).unwrap()).contains("No annotations named Route"));
    }

    #[test]
    fn test_print_problem_hint() {
        let mut output = Vec::new();
        print_problem_hint_to(0, &mut output);
        assert!(output.is_empty());

        print_problem_hint_to(2, &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());
        assert!(stripped.contains("2 problem(s) found (run notate check for details)"));
    }
}
