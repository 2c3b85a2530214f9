//! Calling one registered handler per annotation name.
//!
//! A handler is any closure taking an [`Invocation`] followed by zero to five
//! typed parameters, returning `()` or `Result<(), E>`. Registration erases it
//! into a wrapper that checks arity and argument types before every call, so
//! a mismatched annotation becomes a [`DispatchError`] instead of a panic.
//! Variadic handlers and multi-value returns cannot be expressed at all.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    core::{
        annotation::{Annotation, Argument, ArgumentValue, Literal, SymbolReference},
        catalog::Catalog,
        source::SourceModel,
    },
    diagnostics::{Diagnostic, Location, Stage},
};

/// The annotation a handler is called for, with the model it came from.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub annotation: &'a Annotation,
    pub model: &'a SourceModel,
}

// ============================================================
// Parameter and return types
// ============================================================

/// A handler parameter type that an [`Argument`] can be converted into.
pub trait FromArgument: Sized {
    /// Type name used in mismatch messages.
    const EXPECTED: &'static str;

    fn from_argument(arg: &Argument) -> Option<Self>;
}

impl FromArgument for String {
    const EXPECTED: &'static str = "string";

    fn from_argument(arg: &Argument) -> Option<Self> {
        match arg {
            Argument::Literal(Literal::String(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

impl FromArgument for i64 {
    const EXPECTED: &'static str = "int";

    fn from_argument(arg: &Argument) -> Option<Self> {
        match arg {
            Argument::Literal(Literal::Int(value)) => Some(*value),
            _ => None,
        }
    }
}

impl FromArgument for f64 {
    const EXPECTED: &'static str = "float";

    fn from_argument(arg: &Argument) -> Option<Self> {
        match arg {
            Argument::Literal(Literal::Float(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Any literal.
impl FromArgument for Literal {
    const EXPECTED: &'static str = "literal";

    fn from_argument(arg: &Argument) -> Option<Self> {
        match arg {
            Argument::Literal(literal) => Some(literal.clone()),
            Argument::Reference(_) => None,
        }
    }
}

impl FromArgument for SymbolReference {
    const EXPECTED: &'static str = "reference";

    fn from_argument(arg: &Argument) -> Option<Self> {
        match arg {
            Argument::Reference(reference) => Some(reference.clone()),
            Argument::Literal(_) => None,
        }
    }
}

/// Any argument at all.
impl FromArgument for Argument {
    const EXPECTED: &'static str = "argument";

    fn from_argument(arg: &Argument) -> Option<Self> {
        Some(arg.clone())
    }
}

/// What a handler may return.
pub trait HandlerOutput {
    fn into_result(self) -> anyhow::Result<()>;
}

impl HandlerOutput for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E: Into<anyhow::Error>> HandlerOutput for Result<(), E> {
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

// ============================================================
// Erased handlers
// ============================================================

/// Why a single call did not happen, or failed.
#[derive(Debug)]
pub enum Failure {
    Arity { need: usize, have: usize },
    ArgType { index: usize, need: &'static str, have: &'static str },
    Handler(anyhow::Error),
}

pub type Handler = Box<dyn FnMut(&Invocation<'_>) -> Result<(), Failure>>;

/// Converts a typed closure into a [`Handler`]. `Args` is the tuple of its
/// parameter types after the invocation.
pub trait IntoHandler<Args> {
    fn into_handler(self) -> Handler;
}

fn convert<T: FromArgument>(index: usize, arg: &Argument) -> Result<T, Failure> {
    T::from_argument(arg).ok_or(Failure::ArgType {
        index,
        need: T::EXPECTED,
        have: arg.type_name(),
    })
}

macro_rules! impl_into_handler {
    ($count:literal; $($ty:ident $value:ident $index:literal),*) => {
        impl<F, R, $($ty,)*> IntoHandler<($($ty,)*)> for F
        where
            F: FnMut(&Invocation<'_> $(, $ty)*) -> R + 'static,
            R: HandlerOutput,
            $($ty: FromArgument,)*
        {
            fn into_handler(mut self) -> Handler {
                Box::new(move |invocation: &Invocation<'_>| {
                    let args = invocation.annotation.args.as_slice();
                    let [$($value),*] = args else {
                        return Err(Failure::Arity {
                            need: $count,
                            have: args.len(),
                        });
                    };
                    $(let $value = convert::<$ty>($index, $value)?;)*
                    self(invocation $(, $value)*).into_result().map_err(Failure::Handler)
                })
            }
        }
    };
}

impl_into_handler!(0;);
impl_into_handler!(1; A0 a0 0);
impl_into_handler!(2; A0 a0 0, A1 a1 1);
impl_into_handler!(3; A0 a0 0, A1 a1 1, A2 a2 2);
impl_into_handler!(4; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3);
impl_into_handler!(5; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4);

// ============================================================
// Dispatcher
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("annotation name is empty")]
    EmptyName,

    #[error("handler already registered for {0:?}")]
    Duplicate(String),
}

/// A per-annotation dispatch failure. None of these stop dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler for annotation {name:?}")]
    NoHandler { name: String, location: Location },

    #[error("{annotation}: need {need} args, have {have} args")]
    Arity {
        annotation: String,
        location: Location,
        need: usize,
        have: usize,
    },

    /// `index` counts from 0 over the annotation's arguments.
    #[error("{annotation}: arg {index}: need {need}, have {have}")]
    ArgType {
        annotation: String,
        location: Location,
        index: usize,
        need: &'static str,
        have: &'static str,
    },

    #[error("{annotation}: {error:#}")]
    Handler {
        annotation: String,
        location: Location,
        error: anyhow::Error,
    },
}

impl DispatchError {
    fn new(annotation: &Annotation, failure: Failure) -> Self {
        let location = annotation.location.clone();
        let annotation = annotation.to_string();
        match failure {
            Failure::Arity { need, have } => Self::Arity {
                annotation,
                location,
                need,
                have,
            },
            Failure::ArgType { index, need, have } => Self::ArgType {
                annotation,
                location,
                index,
                need,
                have,
            },
            Failure::Handler(error) => Self::Handler {
                annotation,
                location,
                error,
            },
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Self::NoHandler { location, .. }
            | Self::Arity { location, .. }
            | Self::ArgType { location, .. }
            | Self::Handler { location, .. } => location,
        }
    }

    /// Missing handlers are never worth aborting a run over.
    pub fn is_escalatable(&self) -> bool {
        !matches!(self, Self::NoHandler { .. })
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let location = Some(self.location().clone());
        if self.is_escalatable() {
            Diagnostic::error(Stage::Dispatch, location, self.to_string())
        } else {
            Diagnostic::warning(Stage::Dispatch, location, self.to_string())
        }
    }
}

/// Handlers keyed by annotation name.
#[derive(Default)]
pub struct Dispatcher {
    handlers: BTreeMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `name`. Each name takes exactly one handler.
    pub fn register<Args, H>(&mut self, name: impl Into<String>, handler: H) -> Result<&mut Self, RegisterError>
    where
        H: IntoHandler<Args>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if self.handlers.contains_key(&name) {
            return Err(RegisterError::Duplicate(name));
        }
        self.handlers.insert(name, handler.into_handler());
        Ok(self)
    }

    pub fn handles(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Call the matching handler for every annotation, in catalog order.
    /// Returns every failure; dispatch always visits the whole catalog.
    pub fn dispatch(&mut self, model: &SourceModel, catalog: &Catalog) -> Vec<DispatchError> {
        let mut errors = Vec::new();
        let mut called = 0usize;

        for annotation in catalog.all() {
            let Some(handler) = self.handlers.get_mut(&annotation.name) else {
                errors.push(DispatchError::NoHandler {
                    name: annotation.name.clone(),
                    location: annotation.location.clone(),
                });
                continue;
            };

            tracing::trace!(location = %annotation.location, name = %annotation.name, "dispatch");
            let invocation = Invocation { annotation, model };
            match handler(&invocation) {
                Ok(()) => called += 1,
                Err(failure) => errors.push(DispatchError::new(annotation, failure)),
            }
        }

        tracing::debug!(called, failed = errors.len(), "dispatched annotations");
        errors
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("handlers", &self.names()).finish()
    }
}
