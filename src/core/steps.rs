//! The built-in pipeline steps.
//!
//! `parse` yields a `Vec<Annotation>`, `resolve` passes it on with every
//! reference resolved, and `catalog` turns it into a [`Catalog`]. A
//! [`DispatchStep`] added after them hands each annotation to its handler.

use anyhow::bail;

use crate::core::{
    annotation::Annotation,
    catalog::Catalog,
    dispatch::Dispatcher,
    parse::scan,
    pipeline::{Pipeline, Step, Value},
    resolve::resolve_all,
    source::Load,
};

pub const PARSE_STEP: &str = "notate.parse";
pub const RESOLVE_STEP: &str = "notate.resolve";
pub const CATALOG_STEP: &str = "notate.catalog";

/// Scan every doc comment in the model. Malformed annotations are reported
/// and skipped.
pub fn parse_step() -> Step {
    Step::new(PARSE_STEP, |ctx| {
        let scanned = scan(ctx.model());
        for err in scanned.errors {
            ctx.report(err.into());
        }
        Ok(Value::new(scanned.annotations))
    })
}

/// Resolve the references of the incoming annotations.
pub fn resolve_step() -> Step {
    Step::new(RESOLVE_STEP, |ctx| {
        let annotations: Vec<Annotation> = ctx.take_input_as()?;
        for diagnostic in resolve_all(ctx.model(), &annotations) {
            ctx.report(diagnostic);
        }
        Ok(Value::new(annotations))
    })
}

/// Index the incoming annotations.
pub fn catalog_step() -> Step {
    Step::new(CATALOG_STEP, |ctx| {
        let annotations: Vec<Annotation> = ctx.take_input_as()?;
        let (catalog, diagnostics) = Catalog::build(ctx.model(), annotations);
        for diagnostic in diagnostics {
            ctx.report(diagnostic);
        }
        Ok(Value::new(catalog))
    })
}

/// Parse, resolve and catalog. The next step added receives the [`Catalog`].
pub fn default_pipeline<L: Load>(loader: L) -> Pipeline<L> {
    let mut pipeline = Pipeline::new(loader);
    pipeline
        .add_step(parse_step())
        .add_step(resolve_step())
        .add_step(catalog_step());
    pipeline
}

/// Runs a [`Dispatcher`] over the incoming catalog and passes the catalog on.
///
/// Dispatch failures become diagnostics. With [`DispatchStep::escalate`] the
/// first failure other than a missing handler aborts the run instead.
#[derive(Debug)]
pub struct DispatchStep {
    dispatcher: Dispatcher,
    escalate: bool,
}

impl DispatchStep {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            escalate: false,
        }
    }

    pub fn escalate(mut self) -> Self {
        self.escalate = true;
        self
    }

    pub fn into_step(self, name: impl Into<String>) -> Step {
        let DispatchStep {
            mut dispatcher,
            escalate,
        } = self;

        Step::new(name, move |ctx| {
            let input = ctx.take_input();
            let Some(catalog) = input.downcast_ref::<Catalog>() else {
                bail!("step input is {}, expected a catalog", input.type_name());
            };

            let errors = dispatcher.dispatch(ctx.model(), catalog);
            if escalate && let Some(position) = errors.iter().position(|e| e.is_escalatable()) {
                let mut errors = errors;
                let err = errors.swap_remove(position);
                let location = err.location().to_string();
                return Err(anyhow::Error::new(err).context(location));
            }
            for err in &errors {
                ctx.report(err.to_diagnostic());
            }
            Ok(input)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;

    use crate::core::{
        annotation::SymbolReference, dispatch::Invocation, fixtures, pipeline::PipelineState, steps::*,
    };
    use crate::diagnostics::Stage;

    #[test]
    fn test_default_pipeline_builds_the_catalog() {
        let mut pipeline = default_pipeline(fixtures::loader());
        let names: Vec<&str> = pipeline.steps().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![PARSE_STEP, RESOLVE_STEP, CATALOG_STEP]);

        let output = pipeline.run().unwrap();
        let catalog = output.value.downcast::<Catalog>().unwrap();
        assert_eq!(catalog.len(), 20);
        assert!(catalog.named("LocalRefs")[0].references().all(|r| r.is_resolved()));

        let stages: Vec<Stage> = output.diagnostics.iter().map(|d| d.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Parse,
                Stage::Parse,
                Stage::Parse,
                Stage::Parse,
                Stage::Resolve,
                Stage::Resolve,
                Stage::Resolve,
                Stage::Anchor,
                Stage::Anchor,
            ]
        );
        let errors: Vec<String> = output
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(errors[0], "NotACall.Foo.Bar + 1: not a func call, instead binary expression");
    }

    #[test]
    fn test_catalog_step_needs_annotations() {
        let mut pipeline = Pipeline::new(fixtures::loader());
        pipeline.add_step(catalog_step());
        let err = pipeline.run().unwrap_err().to_string();
        assert!(err.starts_with(r#"step 1 "notate.catalog": step input is nothing, expected "#));
        assert!(err.contains("Annotation"));
    }

    #[test]
    fn test_dispatch_step_reports_and_passes_catalog_on() {
        let funcs = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&funcs);
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("OnFunc", move |inv: &Invocation<'_>, _: SymbolReference| {
                log.borrow_mut().push(inv.annotation.to_string());
            })
            .unwrap();

        let mut pipeline = default_pipeline(fixtures::loader());
        pipeline
            .add_step(DispatchStep::new(dispatcher).into_step("dispatch"))
            .add_step(Step::new("after", |ctx| {
                let catalog: &Catalog = ctx.input_as()?;
                Ok(Value::new(catalog.len()))
            }));

        let output = pipeline.run().unwrap();
        assert_eq!(*funcs.borrow(), vec!["OnFunc(describe)"]);
        assert_eq!(output.value.downcast::<usize>().ok(), Some(20));
        let missing = output
            .diagnostics
            .iter()
            .filter(|d| d.stage == Stage::Dispatch)
            .count();
        assert_eq!(missing, 19);
    }

    #[test]
    fn test_escalating_dispatch_step_aborts() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("OnType", |_: &Invocation<'_>| -> anyhow::Result<()> { bail!("no types today") })
            .unwrap();

        let mut pipeline = default_pipeline(fixtures::loader());
        pipeline.add_step(DispatchStep::new(dispatcher).escalate().into_step("dispatch"));

        let err = pipeline.run().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"step 4 "dispatch": src/annotations.ts:16:5: OnType(): no types today"#
        );
        assert_eq!(pipeline.state(), PipelineState::Aborted);
    }
}
