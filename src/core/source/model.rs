use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use swc_common::{BytePos, SourceMap};

use super::{
    ids::{DeclId, ModuleId, ScopeId, SymbolId},
    symbols::{AnchorError, Declaration, Module, Scope, Symbol, SymbolKind, TypeRef},
};
use crate::diagnostics::Location;

/// Alias chains and nested type lookups deeper than this are treated as unresolvable.
const MAX_LOOKUP_DEPTH: usize = 32;

/// The loaded, read-only view of a set of source files.
///
/// Built once by the [`Loader`](super::Loader) and shared immutably by every
/// stage of a run. Declarations, scopes, symbols and modules are stored in
/// arenas and addressed by the handles in [`ids`](super::ids).
pub struct SourceModel {
    pub(crate) source_map: Arc<SourceMap>,
    pub(crate) modules: Vec<Module>,
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) universe: ScopeId,
    pub(crate) sources: HashMap<String, Arc<str>>,
}

impl std::fmt::Debug for SourceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceModel")
            .field("modules", &self.modules.len())
            .field("declarations", &self.declarations.len())
            .field("scopes", &self.scopes.len())
            .field("symbols", &self.symbols.len())
            .finish()
    }
}

impl SourceModel {
    pub fn source_map(&self) -> &Arc<SourceMap> {
        &self.source_map
    }

    /// All scanned declarations, files in path order, each file in source order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    /// Loaded and external modules.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Loaded modules only, in path order.
    pub fn loaded_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(|module| !module.is_external())
    }

    pub fn universe(&self) -> ScopeId {
        self.universe
    }

    /// Map a byte position to a `file:line:col` location (1-based line and column).
    pub fn location(&self, pos: BytePos) -> Location {
        let loc = self.source_map.lookup_char_pos(pos);
        Location::new(loc.file.name.to_string(), loc.line, loc.col.0 + 1)
    }

    /// The text of the line a location points into, without its line terminator.
    pub fn source_line(&self, location: &Location) -> Option<&str> {
        let source = self.sources.get(&location.file_path)?;
        source
            .lines()
            .nth(location.line.checked_sub(1)?)
            .map(|line| line.trim_end_matches('\r'))
    }

    // ============================================================
    // Scopes
    // ============================================================

    /// The innermost scope whose range contains `pos`.
    ///
    /// Positions outside every loaded file map to the universe scope.
    pub fn innermost_scope(&self, pos: BytePos) -> ScopeId {
        let Some(mut current) = self
            .loaded_modules()
            .find(|module| module.span.is_some_and(|span| span.lo <= pos && pos <= span.hi))
            .and_then(|module| module.scope)
        else {
            return self.universe;
        };

        while let Some(child) = self
            .scope(current)
            .children
            .iter()
            .copied()
            .find(|child| self.scope(*child).contains(pos))
        {
            current = child;
        }
        current
    }

    /// Look `name` up starting at `scope` and walking outward through its parents.
    pub fn lookup_in_scope(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id);
            if let Some(symbol) = scope.lookup_local(name) {
                tracing::trace!(name, ?scope_id, ?symbol, "scope hit");
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    // ============================================================
    // Members
    // ============================================================

    /// Treat `owner` as a namespace and look `name` up in it.
    ///
    /// Modules answer with their exports, types with their own and inherited
    /// members, typed values with the members of their type. Import bindings,
    /// type aliases and `T | null | undefined` wrappers are looked through, and
    /// static and instance members are visible through both the type and its
    /// values.
    pub fn lookup_member(&self, owner: SymbolId, name: &str) -> Option<SymbolId> {
        self.lookup_member_at(owner, name, 0)
    }

    fn lookup_member_at(&self, owner: SymbolId, name: &str, depth: usize) -> Option<SymbolId> {
        if depth > MAX_LOOKUP_DEPTH {
            return None;
        }
        let owner = self.follow_import(owner);
        let symbol = self.symbol(owner);
        match symbol.kind {
            SymbolKind::Module => {
                let module = symbol.import.as_ref()?.module?;
                self.module(module).export(name)
            }
            // An import whose target never materialised.
            SymbolKind::Import => None,
            kind if kind.is_type() => self.lookup_type_member(owner, name, depth + 1),
            _ => {
                let ty = self.resolve_type_at(symbol.ty.as_ref()?, depth + 1)?;
                self.lookup_type_member(ty, name, depth + 1)
            }
        }
    }

    fn lookup_type_member(&self, ty: SymbolId, name: &str, depth: usize) -> Option<SymbolId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([ty]);

        while let Some(current) = queue.pop_front() {
            let current = self.follow_import(current);
            if !visited.insert(current) {
                continue;
            }
            let symbol = self.symbol(current);

            if symbol.kind == SymbolKind::TypeAlias {
                if let Some(aliased) = symbol
                    .ty
                    .as_ref()
                    .and_then(|ty| self.resolve_type_at(ty, depth + 1))
                {
                    queue.push_back(aliased);
                }
                continue;
            }

            if let Some(member) = symbol
                .members
                .iter()
                .copied()
                .find(|member| self.symbol(*member).name == name)
            {
                return Some(member);
            }

            queue.extend(
                symbol
                    .heritage
                    .iter()
                    .filter_map(|base| self.resolve_type_at(base, depth + 1)),
            );
        }
        None
    }

    /// Follow named and default import bindings to the symbol they alias.
    ///
    /// Returns `symbol` itself when it is not an import or its target is unknown.
    pub fn follow_import(&self, symbol: SymbolId) -> SymbolId {
        let mut current = symbol;
        for _ in 0..MAX_LOOKUP_DEPTH {
            let entry = self.symbol(current);
            if entry.kind != SymbolKind::Import {
                break;
            }
            let Some(target) = entry
                .import
                .as_ref()
                .and_then(|import| Some((import.module?, import.export.as_deref()?)))
                .and_then(|(module, export)| self.module(module).export(export))
            else {
                break;
            };
            current = target;
        }
        current
    }

    /// Resolve a type reference to the symbol naming the type.
    pub fn resolve_type(&self, ty: &TypeRef) -> Option<SymbolId> {
        self.resolve_type_at(ty, 0)
    }

    fn resolve_type_at(&self, ty: &TypeRef, depth: usize) -> Option<SymbolId> {
        if depth > MAX_LOOKUP_DEPTH {
            return None;
        }
        match ty {
            TypeRef::Symbol(symbol) => Some(*symbol),
            TypeRef::Opaque => None,
            TypeRef::Named { path, scope } => {
                let (first, rest) = path.split_first()?;
                let mut current = self.follow_import(self.lookup_in_scope(*scope, first)?);
                for segment in rest {
                    current = self.follow_import(self.lookup_member_at(current, segment, depth + 1)?);
                }
                Some(current)
            }
        }
    }

    // ============================================================
    // Anchors
    // ============================================================

    /// The symbol a declaration introduces, if it introduces exactly one.
    pub fn anchor_of(&self, decl: DeclId) -> Result<SymbolId, AnchorError> {
        self.declaration(decl).anchor.clone()
    }

    /// `file:line:col` of a declaration's first token.
    pub fn declaration_location(&self, decl: DeclId) -> Location {
        self.location(self.declaration(decl).span.lo)
    }
}
