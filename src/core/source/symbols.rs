//! Arena entries of the source model: declarations, scopes, symbols, modules.

use std::{collections::HashMap, fmt, path::PathBuf};

use swc_common::{Span, comments::Comment};
use thiserror::Error;

use super::ids::{DeclId, ModuleId, ScopeId, SymbolId};

// ============================================================
// Declarations
// ============================================================

/// Syntactic kind of a scanned declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Import,
    ImportSpecifier,
    Class,
    Interface,
    TypeAlias,
    Enum,
    EnumMember,
    Field,
    Method,
    Constructor,
    Function,
    VariableGroup,
    Variable,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclKind::Import => "import declaration",
            DeclKind::ImportSpecifier => "import specifier",
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
            DeclKind::TypeAlias => "type alias",
            DeclKind::Enum => "enum",
            DeclKind::EnumMember => "enum member",
            DeclKind::Field => "field",
            DeclKind::Method => "method",
            DeclKind::Constructor => "constructor",
            DeclKind::Function => "function",
            DeclKind::VariableGroup => "variable declaration",
            DeclKind::Variable => "variable declarator",
        };
        f.write_str(name)
    }
}

/// Why a declaration cannot be pinned to a single symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("{kind} binds no names")]
    NoNames { kind: DeclKind },

    #[error("{kind} is ambiguous: binds {count} names")]
    Ambiguous { kind: DeclKind, count: usize },

    #[error("{kind} has a computed or unsupported name")]
    Unnamed { kind: DeclKind },
}

/// One syntactic entity that can carry a doc comment.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    /// Display name, if the declaration has one.
    pub name: Option<String>,
    pub span: Span,
    pub module: ModuleId,
    /// Enclosing declaration (class of a field, import of a specifier, ...).
    pub parent: Option<DeclId>,
    /// The doc comment run attached to the declaration, in source order.
    pub doc: Vec<Comment>,
    pub(crate) anchor: Result<SymbolId, AnchorError>,
}

// ============================================================
// Types
// ============================================================

/// Unresolved type information attached to a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A (possibly qualified) type name, looked up from `scope`.
    Named { path: Vec<String>, scope: ScopeId },
    /// An anonymous type that the builder materialised as a symbol.
    Symbol(SymbolId),
    /// Anything without members the model tracks (arrays, functions, ...).
    Opaque,
}

// ============================================================
// Symbols
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Builtin,
    Class,
    Interface,
    TypeAlias,
    TypeLiteral,
    Enum,
    EnumMember,
    Function,
    Method,
    Field,
    Variable,
    Parameter,
    /// A namespace import (`import * as ns from "..."`).
    Module,
    /// A named or default import binding.
    Import,
}

impl SymbolKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Builtin
                | SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::TypeAlias
                | SymbolKind::TypeLiteral
                | SymbolKind::Enum
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Builtin => "builtin",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type",
            SymbolKind::TypeLiteral => "type literal",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum member",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Module => "module",
            SymbolKind::Import => "import",
        };
        f.write_str(name)
    }
}

/// What an import binding points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// The module specifier as written (`"./fmt"`, `"react"`).
    pub specifier: String,
    /// Filled in once all files are loaded.
    pub module: Option<ModuleId>,
    /// Exported name for named/default imports; `None` for namespace imports.
    pub export: Option<String>,
}

/// A resolved identity for a name.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub span: Option<Span>,
    /// Declaring module; `None` for universe builtins.
    pub module: Option<ModuleId>,
    /// Declared type of a value, or the aliased type of a type alias.
    pub ty: Option<TypeRef>,
    /// Own members of a type, in declaration order.
    pub members: Vec<SymbolId>,
    /// Types whose members are inherited (`extends`).
    pub heritage: Vec<TypeRef>,
    pub import: Option<ImportTarget>,
}

impl Symbol {
    pub(crate) fn new(
        id: SymbolId,
        name: impl Into<String>,
        kind: SymbolKind,
        span: Option<Span>,
        module: Option<ModuleId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            span,
            module,
            ty: None,
            members: Vec::new(),
            heritage: Vec::new(),
            import: None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

// ============================================================
// Scopes
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Module(ModuleId),
    Function,
}

/// A lexical scope. Lookups walk outward through `parent`.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Source range covered by the scope; the universe covers everything.
    pub span: Option<Span>,
    pub children: Vec<ScopeId>,
    pub(crate) names: HashMap<String, SymbolId>,
}

impl Scope {
    pub(crate) fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, span: Option<Span>) -> Self {
        Self {
            id,
            kind,
            parent,
            span,
            children: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Look a name up in this scope only.
    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    /// Insert a binding; the first declaration of a name wins.
    pub(crate) fn insert(&mut self, name: impl Into<String>, symbol: SymbolId) {
        self.names.entry(name.into()).or_insert(symbol);
    }

    pub(crate) fn contains(&self, pos: swc_common::BytePos) -> bool {
        match self.span {
            Some(span) => span.lo <= pos && pos < span.hi,
            None => true,
        }
    }
}

// ============================================================
// Modules
// ============================================================

/// One loaded file, or an import specifier that matched no loaded file.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    /// File path for loaded modules, the specifier for external ones.
    pub name: String,
    pub path: Option<PathBuf>,
    pub scope: Option<ScopeId>,
    pub span: Option<Span>,
    pub(crate) exports: HashMap<String, SymbolId>,
}

impl Module {
    pub fn is_external(&self) -> bool {
        self.path.is_none()
    }

    pub fn export(&self, name: &str) -> Option<SymbolId> {
        self.exports.get(name).copied()
    }

    /// Exported names, sorted.
    pub fn export_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
