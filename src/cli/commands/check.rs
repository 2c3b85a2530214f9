use anyhow::{Result, anyhow};

use super::super::args::CheckCommand;
use super::{
    CheckSummary, CommandResult, CommandSummary, ReportedDiagnostic, context::ProjectContext,
    helper::finish,
};
use crate::{
    core::{Catalog, RunOutput, default_pipeline},
    diagnostics::{Diagnostic, Severity},
};

pub fn check(cmd: CheckCommand) -> Result<CommandResult> {
    let ctx = ProjectContext::new(&cmd.common)?;
    let strict = cmd.strict || ctx.config.strict;

    if ctx.files.is_empty() {
        return Ok(finish(
            CommandSummary::Check(CheckSummary::default()),
            Vec::new(),
            0,
            true,
        ));
    }

    let mut pipeline = default_pipeline(ctx.loader());
    let RunOutput {
        value,
        diagnostics,
        model,
    } = pipeline.run()?;
    let catalog = value
        .downcast::<Catalog>()
        .map_err(|value| anyhow!("pipeline produced {}, expected a catalog", value.type_name()))?;

    let diagnostics = diagnostics
        .into_iter()
        .map(|diagnostic| if strict { promote(diagnostic) } else { diagnostic })
        .map(|diagnostic| ReportedDiagnostic::new(diagnostic, &model))
        .collect();

    Ok(finish(
        CommandSummary::Check(CheckSummary {
            annotation_count: catalog.len(),
        }),
        diagnostics,
        ctx.files.len(),
        true,
    ))
}

fn promote(mut diagnostic: Diagnostic) -> Diagnostic {
    diagnostic.severity = Severity::Error;
    diagnostic
}
