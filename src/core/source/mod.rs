//! The source model: loaded TypeScript files, their declarations, scopes,
//! symbols and modules.

mod builder;
pub mod ids;
mod loader;
mod model;
mod symbols;

pub use ids::{DeclId, ModuleId, ScopeId, SymbolId};
pub use loader::{FileFilter, Load, LoadError, Loaded, Loader, SOURCE_EXTENSIONS};
pub use model::SourceModel;
pub use symbols::{
    AnchorError, DeclKind, Declaration, ImportTarget, Module, Scope, ScopeKind, Symbol,
    SymbolKind, TypeRef,
};
