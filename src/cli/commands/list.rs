use anyhow::{Result, anyhow};

use super::super::args::ListCommand;
use super::{
    CommandResult, CommandSummary, ListEntry, ListSummary, ReportedDiagnostic,
    context::ProjectContext, helper::finish,
};
use crate::core::{
    Annotation, Argument, Catalog, RunOutput, SourceModel, annotation::ArgumentValue,
    default_pipeline,
};

pub fn list(cmd: ListCommand) -> Result<CommandResult> {
    let ctx = ProjectContext::new(&cmd.common)?;

    let mut entries = Vec::new();
    let mut reported = Vec::new();

    if !ctx.files.is_empty() {
        let mut pipeline = default_pipeline(ctx.loader());
        let RunOutput {
            value,
            diagnostics,
            model,
        } = pipeline.run()?;
        let catalog = value.downcast::<Catalog>().map_err(|value| {
            anyhow!("pipeline produced {}, expected a catalog", value.type_name())
        })?;

        let selected = match &cmd.name {
            Some(name) => catalog.named(name),
            None => catalog.all(),
        };
        entries = selected
            .into_iter()
            .map(|annotation| list_entry(&model, annotation))
            .collect();
        reported = diagnostics
            .into_iter()
            .map(|diagnostic| ReportedDiagnostic::new(diagnostic, &model))
            .collect();
    }

    Ok(finish(
        CommandSummary::List(ListSummary {
            entries,
            name: cmd.name,
            json: cmd.json,
        }),
        reported,
        ctx.files.len(),
        false,
    ))
}

fn list_entry(model: &SourceModel, annotation: &Annotation) -> ListEntry {
    let (anchor, anchor_error) = match model.anchor_of(annotation.anchor) {
        Ok(symbol) => (Some(model.symbol(symbol).to_string()), None),
        Err(err) => (None, Some(err.to_string())),
    };

    ListEntry {
        name: annotation.name.clone(),
        text: annotation.to_string(),
        location: annotation.location.clone(),
        anchor,
        anchor_error,
        arguments: annotation.args.iter().map(|arg| arg.to_json(model)).collect(),
        argument_lines: annotation
            .args
            .iter()
            .map(|arg| describe_argument(model, arg))
            .collect(),
    }
}

fn describe_argument(model: &SourceModel, arg: &Argument) -> String {
    match arg {
        Argument::Literal(literal) => format!("{literal} ({})", literal.type_name()),
        Argument::Reference(reference) => match reference.resolution() {
            Some(Ok(_)) => match reference.target() {
                Some(target) => format!("{reference} -> {}", model.symbol(target)),
                None => format!("{reference} -> (empty path)"),
            },
            Some(Err(err)) => format!("{reference} (unresolved: {err})"),
            None => format!("{reference} (unresolved)"),
        },
    }
}
