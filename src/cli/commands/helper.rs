use super::{CommandResult, CommandSummary, ReportedDiagnostic};

pub fn finish(
    summary: CommandSummary,
    mut diagnostics: Vec<ReportedDiagnostic>,
    source_files_checked: usize,
    exit_on_errors: bool,
) -> CommandResult {
    diagnostics.sort_by(|a, b| a.diagnostic.cmp(&b.diagnostic));

    let error_count = diagnostics
        .iter()
        .filter(|d| d.diagnostic.is_error())
        .count();
    let warning_count = diagnostics.len() - error_count;

    CommandResult {
        summary,
        error_count,
        warning_count,
        exit_on_errors,
        diagnostics,
        source_files_checked,
    }
}
