//! A sequential pipeline of named steps over one source model.
//!
//! `run` loads the model once, then runs each step in order, handing every
//! step the value the previous one returned. Steps report non-fatal findings
//! through their [`StepContext`]; returning an error aborts the run.

use std::{any::Any, fmt};

use thiserror::Error;

use crate::{
    core::source::{Load, LoadError, SourceModel},
    diagnostics::{Diagnostic, Location, Stage},
};

// ============================================================
// Threaded values
// ============================================================

/// The type-erased value passed from one step to the next.
pub struct Value {
    inner: Option<Box<dyn Any>>,
    type_name: &'static str,
}

impl Value {
    /// The "no input" value the first step receives.
    pub fn none() -> Self {
        Self {
            inner: None,
            type_name: "nothing",
        }
    }

    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Some(Box::new(value)),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_ref()?.downcast_ref()
    }

    /// Take the value out as a `T`, or get `self` back unchanged.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.inner.map(|inner| inner.downcast::<T>()) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(inner)) => Err(Self {
                inner: Some(inner),
                type_name,
            }),
            None => Err(Self::none()),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.type_name)
    }
}

// ============================================================
// Steps
// ============================================================

/// What a step sees while it runs.
pub struct StepContext<'a> {
    model: &'a SourceModel,
    input: Value,
    diagnostics: &'a mut Vec<Diagnostic>,
    index: usize,
    name: &'a str,
}

impl<'a> StepContext<'a> {
    pub fn model(&self) -> &'a SourceModel {
        self.model
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    /// 1-based position of the running step.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Take the previous step's value, leaving "no input" behind.
    pub fn take_input(&mut self) -> Value {
        std::mem::take(&mut self.input)
    }

    pub fn input_as<T: Any>(&self) -> anyhow::Result<&T> {
        self.input
            .downcast_ref()
            .ok_or_else(|| input_mismatch::<T>(&self.input))
    }

    pub fn take_input_as<T: Any>(&mut self) -> anyhow::Result<T> {
        self.take_input().downcast().map_err(|input| input_mismatch::<T>(&input))
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, location: Option<Location>, message: impl Into<String>) {
        self.report(Diagnostic::error(Stage::Step, location, message));
    }

    pub fn warn(&mut self, location: Option<Location>, message: impl Into<String>) {
        self.report(Diagnostic::warning(Stage::Step, location, message));
    }
}

fn input_mismatch<T: Any>(input: &Value) -> anyhow::Error {
    anyhow::anyhow!(
        "step input is {}, expected {}",
        input.type_name(),
        std::any::type_name::<T>()
    )
}

type StepFn = Box<dyn FnMut(&mut StepContext<'_>) -> anyhow::Result<Value>>;

/// One named stage of a [`Pipeline`].
pub struct Step {
    name: String,
    run: StepFn,
}

impl Step {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: FnMut(&mut StepContext<'_>) -> anyhow::Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish_non_exhaustive()
    }
}

// ============================================================
// Pipeline
// ============================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot load sources: {0}")]
    Load(#[from] LoadError),

    #[error("step {index} {name:?}: {error:#}")]
    Step {
        /// 1-based.
        index: usize,
        name: String,
        error: anyhow::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    /// Running the step at this 1-based index.
    Running(usize),
    Completed,
    Aborted,
}

/// The result of a completed run.
#[derive(Debug)]
pub struct RunOutput {
    /// Whatever the last step returned.
    pub value: Value,
    /// Load diagnostics followed by everything steps reported, in order.
    pub diagnostics: Vec<Diagnostic>,
    pub model: SourceModel,
}

pub struct Pipeline<L: Load> {
    loader: L,
    steps: Vec<Step>,
    state: PipelineState,
}

impl<L: Load> Pipeline<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            steps: Vec::new(),
            state: PipelineState::NotStarted,
        }
    }

    pub fn add_step(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Load the model and run every step. Each call loads from scratch.
    pub fn run(&mut self) -> Result<RunOutput, PipelineError> {
        self.state = PipelineState::NotStarted;

        let loaded = match self.loader.load() {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::debug!(%err, "load failed");
                self.state = PipelineState::Aborted;
                return Err(err.into());
            }
        };
        let model = loaded.model;
        let mut diagnostics = loaded.diagnostics;
        let mut value = Value::none();

        for (i, step) in self.steps.iter_mut().enumerate() {
            let index = i + 1;
            self.state = PipelineState::Running(index);
            let _span = tracing::debug_span!("step", index, name = %step.name).entered();

            let mut ctx = StepContext {
                model: &model,
                input: value,
                diagnostics: &mut diagnostics,
                index,
                name: &step.name,
            };
            value = match (step.run)(&mut ctx) {
                Ok(value) => value,
                Err(error) => {
                    tracing::debug!(error = %format!("{error:#}"), "step failed");
                    self.state = PipelineState::Aborted;
                    return Err(PipelineError::Step {
                        index,
                        name: step.name.clone(),
                        error,
                    });
                }
            };
            tracing::debug!(output = value.type_name(), "step done");
        }

        self.state = PipelineState::Completed;
        Ok(RunOutput {
            value,
            diagnostics,
            model,
        })
    }
}
