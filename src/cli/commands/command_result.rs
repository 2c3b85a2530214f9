use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    core::SourceModel,
    diagnostics::{Diagnostic, Location},
};

#[derive(Debug)]
pub enum CommandSummary {
    Check(CheckSummary),
    List(ListSummary),
    Init(InitSummary),
}

#[derive(Debug, Default)]
pub struct CheckSummary {
    pub annotation_count: usize,
}

#[derive(Debug)]
pub struct ListSummary {
    pub entries: Vec<ListEntry>,
    /// The `--name` filter, if any.
    pub name: Option<String>,
    pub json: bool,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
}

/// One cataloged annotation as `list` shows it.
#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub name: String,
    pub text: String,
    pub location: Location,
    /// The anchor symbol, e.g. `class Thing`.
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_error: Option<String>,
    pub arguments: Vec<JsonValue>,
    /// One human-readable line per argument.
    #[serde(skip)]
    pub argument_lines: Vec<String>,
}

/// A diagnostic plus the source line it points into, captured while the
/// source model is still alive.
#[derive(Debug, Clone)]
pub struct ReportedDiagnostic {
    pub diagnostic: Diagnostic,
    pub source_line: Option<String>,
}

impl ReportedDiagnostic {
    pub fn new(diagnostic: Diagnostic, model: &SourceModel) -> Self {
        let source_line = diagnostic
            .location
            .as_ref()
            .and_then(|location| model.source_line(location))
            .map(str::to_string);
        Self {
            diagnostic,
            source_line,
        }
    }
}

impl From<Diagnostic> for ReportedDiagnostic {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            source_line: None,
        }
    }
}

/// Result of running a notate command.
pub struct CommandResult {
    pub summary: CommandSummary,
    pub error_count: usize,
    pub warning_count: usize,
    /// If true, exit code 1 should be returned when error_count > 0.
    pub exit_on_errors: bool,
    /// Sorted by location.
    pub diagnostics: Vec<ReportedDiagnostic>,
    pub source_files_checked: usize,
}
