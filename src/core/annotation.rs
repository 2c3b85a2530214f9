//! Annotation values produced by the comment scanner.
//!
//! An [`Annotation`] is created once and never changes afterwards, with one
//! exception: each [`SymbolReference`] carries a write-once resolution slot
//! that the resolver fills in a separate pass.

use std::{fmt, sync::OnceLock};

use enum_dispatch::enum_dispatch;
use serde_json::{Value as JsonValue, json};

use crate::{
    core::{
        resolve::ResolveError,
        source::{DeclId, SourceModel, SymbolId},
    },
    diagnostics::Location,
};

// ============================================================
// Annotation
// ============================================================

/// A parsed `@Name(args)` directive attached to a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Dotted callee text, kept whole (`Group.Member`).
    pub name: String,
    pub args: Vec<Argument>,
    /// The declaration whose doc comment carries the annotation.
    pub anchor: DeclId,
    /// Where the call text starts (just after the `@`).
    pub location: Location,
    /// The call text as written, for error reporting.
    pub text: String,
}

impl Annotation {
    /// Symbol references among the arguments, in order.
    pub fn references(&self) -> impl Iterator<Item = &SymbolReference> {
        self.args.iter().filter_map(|arg| match arg {
            Argument::Reference(reference) => Some(reference),
            Argument::Literal(_) => None,
        })
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

// ============================================================
// Arguments
// ============================================================

/// Behaviour shared by every argument kind.
#[enum_dispatch]
pub trait ArgumentValue {
    /// Short type name used in dispatch error messages.
    fn type_name(&self) -> &'static str;

    /// JSON form for machine-readable listings.
    fn to_json(&self, model: &SourceModel) -> JsonValue;
}

/// One annotation argument. Order matches the source.
#[enum_dispatch(ArgumentValue)]
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(Literal),
    Reference(SymbolReference),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Literal(literal) => literal.fmt(f),
            Argument::Reference(reference) => reference.fmt(f),
        }
    }
}

/// A string, integer or float literal, with any leading `-` already folded in.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
}

impl ArgumentValue for Literal {
    fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
        }
    }

    fn to_json(&self, _model: &SourceModel) -> JsonValue {
        match self {
            Literal::String(value) => json!({ "kind": "string", "value": value }),
            Literal::Int(value) => json!({ "kind": "int", "value": value }),
            Literal::Float(value) => json!({ "kind": "float", "value": value }),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => write!(f, "{value:?}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
        }
    }
}

// ============================================================
// Symbol references
// ============================================================

/// A dotted identifier path, resolved relative to its anchor declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReference {
    pub path: Vec<String>,
    pub anchor: DeclId,
    pub location: Location,
    resolution: OnceLock<Result<Vec<SymbolId>, ResolveError>>,
}

impl SymbolReference {
    pub fn new(path: Vec<String>, anchor: DeclId, location: Location) -> Self {
        Self {
            path,
            anchor,
            location,
            resolution: OnceLock::new(),
        }
    }

    /// `None` until the resolver has visited this reference.
    pub fn resolution(&self) -> Option<&Result<Vec<SymbolId>, ResolveError>> {
        self.resolution.get()
    }

    /// The symbol chain, one entry per path segment.
    pub fn resolved(&self) -> Option<&[SymbolId]> {
        self.resolution.get()?.as_deref().ok()
    }

    pub fn error(&self) -> Option<&ResolveError> {
        self.resolution.get()?.as_ref().err()
    }

    /// The symbol the whole path names.
    pub fn target(&self) -> Option<SymbolId> {
        self.resolved()?.last().copied()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved().is_some()
    }

    /// Record the outcome of resolution. Only the first call has any effect;
    /// returns whether this call was it.
    pub(crate) fn set_resolution(&self, resolution: Result<Vec<SymbolId>, ResolveError>) -> bool {
        self.resolution.set(resolution).is_ok()
    }

    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

impl ArgumentValue for SymbolReference {
    fn type_name(&self) -> &'static str {
        "reference"
    }

    fn to_json(&self, model: &SourceModel) -> JsonValue {
        let status = match self.resolution() {
            None => json!("unresolved"),
            Some(Ok(chain)) => json!(
                chain
                    .iter()
                    .map(|symbol| model.symbol(*symbol).to_string())
                    .collect::<Vec<_>>()
            ),
            Some(Err(err)) => json!({ "error": err.to_string() }),
        };
        json!({
            "kind": "reference",
            "path": self.dotted(),
            "resolution": status,
        })
    }
}

impl fmt::Display for SymbolReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}
