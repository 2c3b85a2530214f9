//! The annotation engine.
//!
//! Data flows in one direction:
//!
//! 1. [`source`]: load TypeScript files into a [`SourceModel`]
//! 2. [`parse`]: scan doc comments for `@Name(args)` annotations
//! 3. [`resolve`]: resolve dotted reference arguments to symbols
//! 4. [`catalog`]: index the annotations by name, anchor and module
//!
//! [`pipeline`] sequences these (see [`steps::default_pipeline`]) with any
//! user steps after them, and [`dispatch`] calls typed handlers per name.

pub mod annotation;
pub mod catalog;
pub mod dispatch;
pub mod parse;
pub mod pipeline;
pub mod resolve;
pub mod scan;
pub mod source;
pub mod steps;

#[cfg(test)]
pub mod fixtures;

pub use annotation::{Annotation, Argument, ArgumentValue, Literal, SymbolReference};
pub use catalog::Catalog;
pub use dispatch::{DispatchError, Dispatcher, Invocation};
pub use pipeline::{Pipeline, PipelineError, PipelineState, RunOutput, Step, StepContext, Value};
pub use source::{Load, Loader, SourceModel};
pub use steps::{DispatchStep, default_pipeline};
