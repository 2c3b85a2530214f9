//! Builds the [`SourceModel`] from parsed files.
//!
//! Pass one walks every file on its own: it creates the module scope, the
//! symbols and the declarations, and records which names each file exports.
//! Pass two runs once all files are known and links imports and re-exports
//! across modules.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use swc_common::{BytePos, SourceMap, Span, Spanned, comments::Comment};
use swc_ecma_ast::{
    BindingIdent, BlockStmt, Class, ClassMember, Decl, DefaultDecl, ExportSpecifier, Expr,
    FnDecl, Function, ImportDecl, ImportSpecifier, MemberProp, Module as AstModule, ModuleDecl,
    ModuleExportName, ModuleItem, NamedExport, ObjectPatProp, ParamOrTsParamProp, Pat, PropName,
    Stmt, Str, TsEntityName, TsEnumDecl, TsEnumMemberId, TsInterfaceDecl, TsKeywordTypeKind,
    TsParamPropParam, TsType, TsTypeAliasDecl, TsTypeAnn, TsTypeElement,
    TsUnionOrIntersectionType, VarDecl, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::{
    SourceModel,
    ids::{DeclId, ModuleId, ScopeId, SymbolId},
    symbols::{
        AnchorError, DeclKind, Declaration, ImportTarget, Module, Scope, ScopeKind, Symbol,
        SymbolKind, TypeRef,
    },
};
use crate::utils::normalize_path;

/// Leading comments keyed by the position of the token they precede.
pub type CommentMap = HashMap<BytePos, Vec<Comment>>;

/// Predeclared names visible from every module.
const BUILTINS: &[&str] = &[
    "string",
    "number",
    "boolean",
    "bigint",
    "symbol",
    "object",
    "any",
    "unknown",
    "never",
    "void",
    "undefined",
    "null",
    "Error",
    "Array",
    "Promise",
    "Map",
    "Set",
    "Date",
];

/// Extensions tried, in order, when an import specifier has none.
const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx"];

/// Name given to anonymous object types, matching the TypeScript compiler.
const TYPE_LITERAL_NAME: &str = "__type";

/// One successfully parsed file, ready to be folded into the model.
pub struct ParsedFile {
    pub path: String,
    pub source: Arc<str>,
    pub span: Span,
    pub module: AstModule,
    pub comments: CommentMap,
}

enum PendingExport {
    /// `export { local as exported }` and `export default local`.
    Local {
        module: ModuleId,
        exported: String,
        local: String,
    },
    /// `export * from "specifier"`.
    All { module: ModuleId, specifier: String },
}

pub struct ModelBuilder {
    source_map: Arc<SourceMap>,
    modules: Vec<Module>,
    declarations: Vec<Declaration>,
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    universe: ScopeId,
    sources: HashMap<String, Arc<str>>,
    paths: HashMap<PathBuf, ModuleId>,
    external: HashMap<String, ModuleId>,
    pending: Vec<PendingExport>,
}

impl ModelBuilder {
    pub fn new(source_map: Arc<SourceMap>) -> Self {
        let mut builder = Self {
            source_map,
            modules: Vec::new(),
            declarations: Vec::new(),
            scopes: Vec::new(),
            symbols: Vec::new(),
            universe: ScopeId::from_index(0),
            sources: HashMap::new(),
            paths: HashMap::new(),
            external: HashMap::new(),
            pending: Vec::new(),
        };
        builder.universe = builder.new_scope(ScopeKind::Universe, None, None);
        for name in BUILTINS {
            let symbol = builder.new_symbol(*name, SymbolKind::Builtin, None, None);
            builder.scopes[builder.universe.index()].insert(*name, symbol);
        }
        builder
    }

    /// Pass one for a single file. Files must be added in path order.
    pub fn add_file(&mut self, file: &ParsedFile) {
        let module = ModuleId::from_index(self.modules.len());
        let path = normalize_path(Path::new(&file.path));
        let scope = self.new_scope(ScopeKind::Module(module), Some(self.universe), Some(file.span));

        self.modules.push(Module {
            id: module,
            name: file.path.clone(),
            path: Some(path.clone()),
            scope: Some(scope),
            span: Some(file.span),
            exports: HashMap::new(),
        });
        self.paths.insert(path, module);
        self.sources.insert(file.path.clone(), file.source.clone());

        let mut walker = FileWalker {
            builder: self,
            module,
            scope,
            comments: &file.comments,
        };
        walker.walk_module(&file.module);
    }

    /// Pass two: link imports and exports across modules and freeze the model.
    pub fn finish(mut self) -> SourceModel {
        self.link_imports();
        self.link_exports();

        tracing::debug!(
            modules = self.modules.len(),
            declarations = self.declarations.len(),
            symbols = self.symbols.len(),
            "source model built"
        );

        SourceModel {
            source_map: self.source_map,
            modules: self.modules,
            declarations: self.declarations,
            scopes: self.scopes,
            symbols: self.symbols,
            universe: self.universe,
            sources: self.sources,
        }
    }

    fn new_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, span: Option<Span>) -> ScopeId {
        let id = ScopeId::from_index(self.scopes.len());
        self.scopes.push(Scope::new(id, kind, parent, span));
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        id
    }

    fn new_symbol(
        &mut self,
        name: impl Into<String>,
        kind: SymbolKind,
        span: Option<Span>,
        module: Option<ModuleId>,
    ) -> SymbolId {
        let id = SymbolId::from_index(self.symbols.len());
        self.symbols.push(Symbol::new(id, name, kind, span, module));
        id
    }

    // ============================================================
    // Pass two
    // ============================================================

    fn link_imports(&mut self) {
        for index in 0..self.symbols.len() {
            let Some((from, specifier)) = self.symbols[index].import.as_ref().and_then(|import| {
                let from = self.symbols[index].module?;
                Some((from, import.specifier.clone()))
            }) else {
                continue;
            };
            let target = self.resolve_specifier(from, &specifier);
            if let Some(import) = self.symbols[index].import.as_mut() {
                import.module = Some(target);
            }
        }
    }

    fn link_exports(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let mut star_exports = Vec::new();

        for export in pending {
            match export {
                PendingExport::Local {
                    module,
                    exported,
                    local,
                } => {
                    let symbol = self.modules[module.index()]
                        .scope
                        .and_then(|scope| self.scopes[scope.index()].lookup_local(&local));
                    match symbol {
                        Some(symbol) => {
                            self.modules[module.index()].exports.entry(exported).or_insert(symbol);
                        }
                        None => tracing::debug!(
                            module = %self.modules[module.index()].name,
                            local = %local,
                            "export of an undeclared name"
                        ),
                    }
                }
                PendingExport::All { module, specifier } => {
                    let target = self.resolve_specifier(module, &specifier);
                    star_exports.push((module, target));
                }
            }
        }

        // `export *` chains settle after at most one round per module.
        for _ in 0..self.modules.len().max(1) {
            let mut changed = false;
            for (module, target) in &star_exports {
                let inherited: Vec<(String, SymbolId)> = self.modules[target.index()]
                    .exports
                    .iter()
                    .filter(|(name, _)| name.as_str() != "default")
                    .map(|(name, symbol)| (name.clone(), *symbol))
                    .collect();
                for (name, symbol) in inherited {
                    let exports = &mut self.modules[module.index()].exports;
                    if !exports.contains_key(&name) {
                        exports.insert(name, symbol);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Map an import specifier to a loaded module, or to an external module
    /// named after the specifier.
    fn resolve_specifier(&mut self, from: ModuleId, specifier: &str) -> ModuleId {
        if let Some(module) = self.modules[from.index()]
            .path
            .as_deref()
            .and_then(|path| self.find_loaded(path, specifier))
        {
            return module;
        }

        if let Some(module) = self.external.get(specifier) {
            return *module;
        }
        let id = ModuleId::from_index(self.modules.len());
        self.modules.push(Module {
            id,
            name: specifier.to_string(),
            path: None,
            scope: None,
            span: None,
            exports: HashMap::new(),
        });
        self.external.insert(specifier.to_string(), id);
        id
    }

    fn find_loaded(&self, from: &Path, specifier: &str) -> Option<ModuleId> {
        if !specifier.starts_with('.') {
            return None;
        }
        let base = from.parent().unwrap_or(Path::new(""));
        let joined = normalize_path(&base.join(specifier));
        let joined_str = joined.to_string_lossy();

        let mut candidates = vec![joined.clone()];
        for ext in RESOLVE_EXTENSIONS {
            candidates.push(PathBuf::from(format!("{joined_str}.{ext}")));
        }
        // ESM style: `./fmt.js` names the compiled output of `./fmt.ts`.
        if let Some(stem) = joined_str.strip_suffix(".js") {
            candidates.push(PathBuf::from(format!("{stem}.ts")));
            candidates.push(PathBuf::from(format!("{stem}.tsx")));
        }
        for ext in RESOLVE_EXTENSIONS {
            candidates.push(joined.join(format!("index.{ext}")));
        }

        candidates
            .iter()
            .find_map(|candidate| self.paths.get(candidate).copied())
    }
}

// ============================================================
// Pass one
// ============================================================

struct FileWalker<'a> {
    builder: &'a mut ModelBuilder,
    module: ModuleId,
    scope: ScopeId,
    comments: &'a CommentMap,
}

impl FileWalker<'_> {
    fn walk_module(&mut self, module: &AstModule) {
        for item in &module.body {
            match item {
                ModuleItem::ModuleDecl(decl) => self.walk_module_decl(decl),
                ModuleItem::Stmt(Stmt::Decl(decl)) => {
                    self.walk_decl(decl, decl.span().lo);
                }
                ModuleItem::Stmt(_) => {}
            }
        }
    }

    fn walk_module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::Import(import) => self.walk_import(import),
            ModuleDecl::ExportDecl(export) => {
                for (name, symbol) in self.walk_decl(&export.decl, export.span.lo) {
                    self.export(name, symbol);
                }
            }
            ModuleDecl::ExportDefaultDecl(export) => {
                let lo = export.span.lo;
                let symbol = match &export.decl {
                    DefaultDecl::Class(class) => {
                        let name = class.ident.as_ref().map(|ident| ident.sym.to_string());
                        let symbol = self.walk_class(name.as_deref().unwrap_or("default"), &class.class, lo);
                        if let Some(name) = name {
                            self.bind(&name, symbol);
                        }
                        Some(symbol)
                    }
                    DefaultDecl::Fn(function) => {
                        let name = function.ident.as_ref().map(|ident| ident.sym.to_string());
                        let symbol = self.walk_function(
                            name.as_deref().unwrap_or("default"),
                            &function.function,
                            lo,
                        );
                        if let Some(name) = name {
                            self.bind(&name, symbol);
                        }
                        Some(symbol)
                    }
                    DefaultDecl::TsInterfaceDecl(interface) => {
                        let symbol = self.walk_interface(interface, lo);
                        self.bind(&interface.id.sym, symbol);
                        Some(symbol)
                    }
                };
                if let Some(symbol) = symbol {
                    self.export("default".to_string(), symbol);
                }
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                if let Expr::Ident(ident) = &*export.expr {
                    self.builder.pending.push(PendingExport::Local {
                        module: self.module,
                        exported: "default".to_string(),
                        local: ident.sym.to_string(),
                    });
                }
            }
            ModuleDecl::ExportNamed(named) => self.walk_named_export(named),
            ModuleDecl::ExportAll(all) => {
                self.builder.pending.push(PendingExport::All {
                    module: self.module,
                    specifier: str_value(&all.src),
                });
            }
            _ => {}
        }
    }

    /// Returns the names the declaration binds, for `export` to pick up.
    fn walk_decl(&mut self, decl: &Decl, lo: BytePos) -> Vec<(String, SymbolId)> {
        match decl {
            Decl::Class(class) => {
                let name = class.ident.sym.to_string();
                let symbol = self.walk_class(&name, &class.class, lo);
                self.bind(&name, symbol);
                vec![(name, symbol)]
            }
            Decl::Fn(FnDecl {
                ident, function, ..
            }) => {
                let name = ident.sym.to_string();
                let symbol = self.walk_function(&name, function, lo);
                self.bind(&name, symbol);
                vec![(name, symbol)]
            }
            Decl::Var(var) => self.walk_var(var, lo),
            Decl::TsInterface(interface) => {
                let name = interface.id.sym.to_string();
                let symbol = self.walk_interface(interface, lo);
                self.bind(&name, symbol);
                vec![(name, symbol)]
            }
            Decl::TsTypeAlias(alias) => {
                let name = alias.id.sym.to_string();
                let symbol = self.walk_type_alias(alias, lo);
                self.bind(&name, symbol);
                vec![(name, symbol)]
            }
            Decl::TsEnum(decl) => {
                let name = decl.id.sym.to_string();
                let symbol = self.walk_enum(decl, lo);
                self.bind(&name, symbol);
                vec![(name, symbol)]
            }
            _ => Vec::new(),
        }
    }

    // ------------------------------------------------------------
    // Imports and exports
    // ------------------------------------------------------------

    fn walk_import(&mut self, import: &ImportDecl) {
        let specifier = str_value(&import.src);
        let group = self.declare(
            DeclKind::Import,
            Some(specifier.clone()),
            import.span,
            None,
            Err(AnchorError::NoNames {
                kind: DeclKind::Import,
            }),
        );

        let mut bound = Vec::new();
        for spec in &import.specifiers {
            let (local, span, kind, export) = match spec {
                ImportSpecifier::Namespace(ns) => (&ns.local, ns.span, SymbolKind::Module, None),
                ImportSpecifier::Default(default) => (
                    &default.local,
                    default.span,
                    SymbolKind::Import,
                    Some("default".to_string()),
                ),
                ImportSpecifier::Named(named) => {
                    let export = named
                        .imported
                        .as_ref()
                        .map(export_name)
                        .unwrap_or_else(|| named.local.sym.to_string());
                    (&named.local, named.span, SymbolKind::Import, Some(export))
                }
            };

            let name = local.sym.to_string();
            let symbol = self.new_symbol(&name, kind, Some(span));
            self.builder.symbols[symbol.index()].import = Some(ImportTarget {
                specifier: specifier.clone(),
                module: None,
                export,
            });
            self.bind(&name, symbol);
            self.declare(DeclKind::ImportSpecifier, Some(name), span, Some(group), Ok(symbol));
            bound.push(symbol);
        }

        self.set_anchor(group, single(DeclKind::Import, &bound));
    }

    fn walk_named_export(&mut self, named: &NamedExport) {
        match &named.src {
            None => {
                for spec in &named.specifiers {
                    if let ExportSpecifier::Named(spec) = spec {
                        let local = export_name(&spec.orig);
                        let exported = spec.exported.as_ref().map(export_name).unwrap_or_else(|| local.clone());
                        self.builder.pending.push(PendingExport::Local {
                            module: self.module,
                            exported,
                            local,
                        });
                    }
                }
            }
            Some(src) => {
                // Re-exports bind nothing locally: they become import symbols
                // that only the module's export table can see.
                let specifier = str_value(src);
                for spec in &named.specifiers {
                    let (exported, kind, export) = match spec {
                        ExportSpecifier::Named(spec) => {
                            let orig = export_name(&spec.orig);
                            let exported = spec.exported.as_ref().map(export_name).unwrap_or_else(|| orig.clone());
                            (exported, SymbolKind::Import, Some(orig))
                        }
                        ExportSpecifier::Namespace(spec) => (export_name(&spec.name), SymbolKind::Module, None),
                        ExportSpecifier::Default(spec) => {
                            (spec.exported.sym.to_string(), SymbolKind::Import, Some("default".to_string()))
                        }
                    };
                    let symbol = self.new_symbol(&exported, kind, Some(spec.span()));
                    self.builder.symbols[symbol.index()].import = Some(ImportTarget {
                        specifier: specifier.clone(),
                        module: None,
                        export,
                    });
                    self.export(exported, symbol);
                }
            }
        }
    }

    fn export(&mut self, name: String, symbol: SymbolId) {
        self.builder.modules[self.module.index()]
            .exports
            .entry(name)
            .or_insert(symbol);
    }

    // ------------------------------------------------------------
    // Types
    // ------------------------------------------------------------

    fn walk_class(&mut self, name: &str, class: &Class, lo: BytePos) -> SymbolId {
        let symbol = self.new_symbol(name, SymbolKind::Class, Some(class.span));
        let decl = self.declare(
            DeclKind::Class,
            Some(name.to_string()),
            Span::new(lo, class.span.hi),
            None,
            Ok(symbol),
        );

        let bases = class
            .super_class
            .iter()
            .map(|expr| &**expr)
            .chain(class.implements.iter().map(|implemented| &*implemented.expr))
            .filter_map(expr_path)
            .map(|path| TypeRef::Named {
                path,
                scope: self.scope,
            })
            .collect();
        self.builder.symbols[symbol.index()].heritage = bases;

        for member in &class.body {
            self.walk_class_member(symbol, decl, member);
        }
        symbol
    }

    fn walk_class_member(&mut self, owner: SymbolId, parent: DeclId, member: &ClassMember) {
        match member {
            ClassMember::ClassProp(prop) => {
                let ty = self.value_type(prop.type_ann.as_deref(), prop.value.as_deref(), self.scope);
                self.member(owner, parent, prop_name(&prop.key), DeclKind::Field, SymbolKind::Field, prop.span, ty);
            }
            ClassMember::PrivateProp(prop) => {
                let ty = self.value_type(prop.type_ann.as_deref(), prop.value.as_deref(), self.scope);
                let name = format!("#{}", prop.key.name);
                self.member(owner, parent, Some(name), DeclKind::Field, SymbolKind::Field, prop.span, ty);
            }
            ClassMember::Method(method) => {
                self.member(owner, parent, prop_name(&method.key), DeclKind::Method, SymbolKind::Method, method.span, None);
                self.function_scope(&method.function);
            }
            ClassMember::PrivateMethod(method) => {
                let name = format!("#{}", method.key.name);
                self.member(owner, parent, Some(name), DeclKind::Method, SymbolKind::Method, method.span, None);
                self.function_scope(&method.function);
            }
            ClassMember::Constructor(ctor) => {
                self.member(
                    owner,
                    parent,
                    Some("constructor".to_string()),
                    DeclKind::Constructor,
                    SymbolKind::Method,
                    ctor.span,
                    None,
                );

                // `constructor(private readonly x: T)` also declares a field.
                let mut params = Vec::new();
                for param in &ctor.params {
                    match param {
                        ParamOrTsParamProp::Param(param) => params.extend(binding_idents(&param.pat)),
                        ParamOrTsParamProp::TsParamProp(prop) => {
                            let ident = match &prop.param {
                                TsParamPropParam::Ident(ident) => Some(ident),
                                TsParamPropParam::Assign(assign) => match &*assign.left {
                                    Pat::Ident(ident) => Some(ident),
                                    _ => None,
                                },
                            };
                            if let Some(ident) = ident {
                                let ty = self.value_type(ident.type_ann.as_deref(), None, self.scope);
                                let field = self.new_symbol(&*ident.id.sym, SymbolKind::Field, Some(ident.id.span));
                                self.builder.symbols[field.index()].ty = ty;
                                self.builder.symbols[owner.index()].members.push(field);
                                params.push(ident);
                            }
                        }
                    }
                }
                let first = ctor.params.first().map(|param| param.span().lo);
                self.open_function_scope(&params, first, ctor.body.as_ref());
            }
            _ => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn member(
        &mut self,
        owner: SymbolId,
        parent: DeclId,
        name: Option<String>,
        decl_kind: DeclKind,
        symbol_kind: SymbolKind,
        span: Span,
        ty: Option<TypeRef>,
    ) {
        let Some(name) = name else {
            self.declare(decl_kind, None, span, Some(parent), Err(AnchorError::Unnamed { kind: decl_kind }));
            return;
        };
        let symbol = self.new_symbol(&name, symbol_kind, Some(span));
        self.builder.symbols[symbol.index()].ty = ty;
        self.builder.symbols[owner.index()].members.push(symbol);
        self.declare(decl_kind, Some(name), span, Some(parent), Ok(symbol));
    }

    fn walk_interface(&mut self, interface: &TsInterfaceDecl, lo: BytePos) -> SymbolId {
        let name = interface.id.sym.to_string();
        let symbol = self.new_symbol(&name, SymbolKind::Interface, Some(interface.span));
        let decl = self.declare(
            DeclKind::Interface,
            Some(name),
            Span::new(lo, interface.span.hi),
            None,
            Ok(symbol),
        );

        let bases = interface
            .extends
            .iter()
            .filter_map(|base| expr_path(&base.expr))
            .map(|path| TypeRef::Named {
                path,
                scope: self.scope,
            })
            .collect();
        self.builder.symbols[symbol.index()].heritage = bases;
        self.type_members(symbol, &interface.body.body, Some(decl));
        symbol
    }

    fn walk_type_alias(&mut self, alias: &TsTypeAliasDecl, lo: BytePos) -> SymbolId {
        let name = alias.id.sym.to_string();
        let symbol = self.new_symbol(&name, SymbolKind::TypeAlias, Some(alias.span));
        let decl = self.declare(
            DeclKind::TypeAlias,
            Some(name.clone()),
            Span::new(lo, alias.span.hi),
            None,
            Ok(symbol),
        );

        // Members of an object-literal alias are declarations of their own.
        let ty = match &*alias.type_ann {
            TsType::TsTypeLit(lit) => {
                let literal = self.new_symbol(name, SymbolKind::TypeLiteral, Some(lit.span));
                self.type_members(literal, &lit.members, Some(decl));
                TypeRef::Symbol(literal)
            }
            other => self.type_ref(other, self.scope),
        };
        self.builder.symbols[symbol.index()].ty = Some(ty);
        symbol
    }

    fn walk_enum(&mut self, decl: &TsEnumDecl, lo: BytePos) -> SymbolId {
        let name = decl.id.sym.to_string();
        let symbol = self.new_symbol(&name, SymbolKind::Enum, Some(decl.span));
        let parent = self.declare(
            DeclKind::Enum,
            Some(name),
            Span::new(lo, decl.span.hi),
            None,
            Ok(symbol),
        );
        for member in &decl.members {
            let name = match &member.id {
                TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
                TsEnumMemberId::Str(s) => str_value(s),
            };
            self.member(
                symbol,
                parent,
                Some(name),
                DeclKind::EnumMember,
                SymbolKind::EnumMember,
                member.span,
                None,
            );
        }
        symbol
    }

    /// Members of interfaces and object types. Declarations are only created
    /// when `parent` is given.
    fn type_members(&mut self, owner: SymbolId, elements: &[TsTypeElement], parent: Option<DeclId>) {
        for element in elements {
            let (key, decl_kind, symbol_kind, span, ty) = match element {
                TsTypeElement::TsPropertySignature(prop) => {
                    let ty = prop.type_ann.as_deref().map(|ann| self.type_ref(&ann.type_ann, self.scope));
                    (&prop.key, DeclKind::Field, SymbolKind::Field, prop.span, ty)
                }
                TsTypeElement::TsMethodSignature(method) => {
                    (&method.key, DeclKind::Method, SymbolKind::Method, method.span, None)
                }
                _ => continue,
            };
            let name = match &**key {
                Expr::Ident(ident) => Some(ident.sym.to_string()),
                Expr::Lit(swc_ecma_ast::Lit::Str(s)) => Some(str_value(s)),
                _ => None,
            };
            match parent {
                Some(parent) => self.member(owner, parent, name, decl_kind, symbol_kind, span, ty),
                None => {
                    if let Some(name) = name {
                        let symbol = self.new_symbol(name, symbol_kind, Some(span));
                        self.builder.symbols[symbol.index()].ty = ty;
                        self.builder.symbols[owner.index()].members.push(symbol);
                    }
                }
            }
        }
    }

    fn type_ref(&mut self, ty: &TsType, scope: ScopeId) -> TypeRef {
        match ty {
            TsType::TsTypeRef(reference) => TypeRef::Named {
                path: entity_path(&reference.type_name),
                scope,
            },
            TsType::TsKeywordType(keyword) => TypeRef::Named {
                path: vec![keyword_name(keyword.kind).to_string()],
                scope,
            },
            TsType::TsParenthesizedType(paren) => self.type_ref(&paren.type_ann, scope),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let mut rest = union.types.iter().filter(|member| !is_nullish(member));
                match (rest.next(), rest.next()) {
                    (Some(only), None) => self.type_ref(only, scope),
                    _ => TypeRef::Opaque,
                }
            }
            TsType::TsTypeLit(lit) => {
                let literal = self.new_symbol(TYPE_LITERAL_NAME, SymbolKind::TypeLiteral, Some(lit.span));
                self.type_members(literal, &lit.members, None);
                TypeRef::Symbol(literal)
            }
            _ => TypeRef::Opaque,
        }
    }

    /// Declared type of a value, falling back to `new X(...)` and `... as X`.
    fn value_type(&mut self, ann: Option<&TsTypeAnn>, init: Option<&Expr>, scope: ScopeId) -> Option<TypeRef> {
        if let Some(ann) = ann {
            return Some(self.type_ref(&ann.type_ann, scope));
        }
        match init? {
            Expr::New(new) => expr_path(&new.callee).map(|path| TypeRef::Named { path, scope }),
            Expr::TsAs(cast) => Some(self.type_ref(&cast.type_ann, scope)),
            Expr::Paren(paren) => self.value_type(None, Some(&paren.expr), scope),
            _ => None,
        }
    }

    // ------------------------------------------------------------
    // Values
    // ------------------------------------------------------------

    fn walk_function(&mut self, name: &str, function: &Function, lo: BytePos) -> SymbolId {
        let symbol = self.new_symbol(name, SymbolKind::Function, Some(function.span));
        self.declare(
            DeclKind::Function,
            Some(name.to_string()),
            Span::new(lo, function.span.hi),
            None,
            Ok(symbol),
        );
        self.function_scope(function);
        symbol
    }

    fn walk_var(&mut self, var: &VarDecl, lo: BytePos) -> Vec<(String, SymbolId)> {
        let group = self.declare(
            DeclKind::VariableGroup,
            None,
            Span::new(lo, var.span.hi),
            None,
            Err(AnchorError::NoNames {
                kind: DeclKind::VariableGroup,
            }),
        );

        let mut bound = Vec::new();
        for declarator in &var.decls {
            let symbols = self.walk_declarator(declarator, group);
            bound.extend(symbols);
        }

        let symbols: Vec<SymbolId> = bound.iter().map(|(_, symbol)| *symbol).collect();
        if let [(name, _)] = bound.as_slice() {
            self.builder.declarations[group.index()].name = Some(name.clone());
        }
        self.set_anchor(group, single(DeclKind::VariableGroup, &symbols));
        bound
    }

    fn walk_declarator(&mut self, declarator: &VarDeclarator, group: DeclId) -> Vec<(String, SymbolId)> {
        let idents = binding_idents(&declarator.name);
        let mut bound = Vec::new();
        for ident in &idents {
            let name = ident.id.sym.to_string();
            let symbol = self.new_symbol(&name, SymbolKind::Variable, Some(ident.id.span));
            let ty = self.value_type(ident.type_ann.as_deref(), declarator.init.as_deref(), self.scope);
            self.builder.symbols[symbol.index()].ty = ty;
            self.bind(&name, symbol);
            bound.push((name, symbol));
        }

        let name = match bound.as_slice() {
            [(name, _)] => Some(name.clone()),
            _ => None,
        };
        let symbols: Vec<SymbolId> = bound.iter().map(|(_, symbol)| *symbol).collect();
        self.declare(
            DeclKind::Variable,
            name,
            declarator.span,
            Some(group),
            single(DeclKind::Variable, &symbols),
        );
        bound
    }

    fn function_scope(&mut self, function: &Function) {
        let params: Vec<&BindingIdent> = function
            .params
            .iter()
            .flat_map(|param| binding_idents(&param.pat))
            .collect();
        let first = function.params.first().map(|param| param.span.lo);
        self.open_function_scope(&params, first, function.body.as_ref());
    }

    /// A scope for parameters and body locals. It starts at the first
    /// parameter so the declaration's own name stays in the enclosing scope.
    fn open_function_scope(&mut self, params: &[&BindingIdent], first_param: Option<BytePos>, body: Option<&BlockStmt>) {
        let Some(body) = body else {
            return;
        };
        let lo = first_param.unwrap_or(body.span.lo);
        let scope = self
            .builder
            .new_scope(ScopeKind::Function, Some(self.scope), Some(Span::new(lo, body.span.hi)));

        for ident in params {
            let name = ident.id.sym.to_string();
            let symbol = self.new_symbol(&name, SymbolKind::Parameter, Some(ident.id.span));
            let ty = self.value_type(ident.type_ann.as_deref(), None, scope);
            self.builder.symbols[symbol.index()].ty = ty;
            self.builder.scopes[scope.index()].insert(name, symbol);
        }

        let mut locals = LocalBindings::default();
        body.visit_with(&mut locals);
        for local in locals.bindings {
            let symbol = self.new_symbol(&local.name, local.kind, Some(local.span));
            let ty = match (&local.ann, local.new_path) {
                (Some(ann), _) => Some(self.type_ref(&ann.type_ann, scope)),
                (None, Some(path)) => Some(TypeRef::Named { path, scope }),
                (None, None) => None,
            };
            self.builder.symbols[symbol.index()].ty = ty;
            self.builder.scopes[scope.index()].insert(local.name, symbol);
        }
    }

    // ------------------------------------------------------------
    // Arenas
    // ------------------------------------------------------------

    fn new_symbol(&mut self, name: impl Into<String>, kind: SymbolKind, span: Option<Span>) -> SymbolId {
        self.builder.new_symbol(name, kind, span, Some(self.module))
    }

    fn bind(&mut self, name: &str, symbol: SymbolId) {
        self.builder.scopes[self.scope.index()].insert(name, symbol);
    }

    fn declare(
        &mut self,
        kind: DeclKind,
        name: Option<String>,
        span: Span,
        parent: Option<DeclId>,
        anchor: Result<SymbolId, AnchorError>,
    ) -> DeclId {
        let id = DeclId::from_index(self.builder.declarations.len());
        let doc = self.doc_comments(span.lo);
        self.builder.declarations.push(Declaration {
            id,
            kind,
            name,
            span,
            module: self.module,
            parent,
            doc,
            anchor,
        });
        id
    }

    fn set_anchor(&mut self, decl: DeclId, anchor: Result<SymbolId, AnchorError>) {
        self.builder.declarations[decl.index()].anchor = anchor;
    }

    /// The run of leading comments that ends on the line directly above (or on
    /// the same line as) `lo`, each comment starting no more than one line
    /// below the end of the previous one. A blank line breaks the run.
    fn doc_comments(&self, lo: BytePos) -> Vec<Comment> {
        let Some(comments) = self.comments.get(&lo) else {
            return Vec::new();
        };

        let line_of = |pos: BytePos| self.builder.source_map.lookup_char_pos(pos).line;
        let mut next_line = line_of(lo);
        let mut run = Vec::new();
        for comment in comments.iter().rev() {
            if line_of(comment.span.hi) + 1 < next_line {
                break;
            }
            run.push(comment.clone());
            next_line = line_of(comment.span.lo);
        }
        run.reverse();
        run
    }
}

/// Bindings a function body introduces, without descending into nested
/// functions or classes.
#[derive(Default)]
struct LocalBindings {
    bindings: Vec<LocalBinding>,
}

struct LocalBinding {
    name: String,
    kind: SymbolKind,
    span: Span,
    ann: Option<Box<TsTypeAnn>>,
    new_path: Option<Vec<String>>,
}

impl Visit for LocalBindings {
    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        let new_path = match declarator.init.as_deref() {
            Some(Expr::New(new)) => expr_path(&new.callee),
            _ => None,
        };
        for ident in binding_idents(&declarator.name) {
            self.bindings.push(LocalBinding {
                name: ident.id.sym.to_string(),
                kind: SymbolKind::Variable,
                span: ident.id.span,
                ann: ident.type_ann.clone(),
                new_path: new_path.clone(),
            });
        }
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        self.bindings.push(LocalBinding {
            name: decl.ident.sym.to_string(),
            kind: SymbolKind::Function,
            span: decl.ident.span,
            ann: None,
            new_path: None,
        });
    }

    fn visit_class_decl(&mut self, decl: &swc_ecma_ast::ClassDecl) {
        self.bindings.push(LocalBinding {
            name: decl.ident.sym.to_string(),
            kind: SymbolKind::Class,
            span: decl.ident.span,
            ann: None,
            new_path: None,
        });
    }

    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &swc_ecma_ast::ArrowExpr) {}

    fn visit_class(&mut self, _: &Class) {}
}

// ============================================================
// Syntax helpers
// ============================================================

fn single(kind: DeclKind, symbols: &[SymbolId]) -> Result<SymbolId, AnchorError> {
    match symbols {
        [only] => Ok(*only),
        [] => Err(AnchorError::NoNames { kind }),
        many => Err(AnchorError::Ambiguous {
            kind,
            count: many.len(),
        }),
    }
}

fn str_value(s: &Str) -> String {
    s.value.as_str().unwrap_or_default().to_string()
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => str_value(s),
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(str_value(s)),
        PropName::Num(num) => Some(num.value.to_string()),
        _ => None,
    }
}

/// `a.b.c` as `["a", "b", "c"]`, for identifier/member chains only.
fn expr_path(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Ident(ident) => Some(vec![ident.sym.to_string()]),
        Expr::Member(member) => {
            let MemberProp::Ident(prop) = &member.prop else {
                return None;
            };
            let mut path = expr_path(&member.obj)?;
            path.push(prop.sym.to_string());
            Some(path)
        }
        _ => None,
    }
}

fn entity_path(name: &TsEntityName) -> Vec<String> {
    match name {
        TsEntityName::Ident(ident) => vec![ident.sym.to_string()],
        TsEntityName::TsQualifiedName(qualified) => {
            let mut path = entity_path(&qualified.left);
            path.push(qualified.right.sym.to_string());
            path
        }
    }
}

fn keyword_name(kind: TsKeywordTypeKind) -> &'static str {
    match kind {
        TsKeywordTypeKind::TsAnyKeyword => "any",
        TsKeywordTypeKind::TsUnknownKeyword => "unknown",
        TsKeywordTypeKind::TsNumberKeyword => "number",
        TsKeywordTypeKind::TsObjectKeyword => "object",
        TsKeywordTypeKind::TsBooleanKeyword => "boolean",
        TsKeywordTypeKind::TsBigIntKeyword => "bigint",
        TsKeywordTypeKind::TsStringKeyword => "string",
        TsKeywordTypeKind::TsSymbolKeyword => "symbol",
        TsKeywordTypeKind::TsVoidKeyword => "void",
        TsKeywordTypeKind::TsUndefinedKeyword => "undefined",
        TsKeywordTypeKind::TsNullKeyword => "null",
        TsKeywordTypeKind::TsNeverKeyword => "never",
        TsKeywordTypeKind::TsIntrinsicKeyword => "intrinsic",
    }
}

fn is_nullish(ty: &TsType) -> bool {
    matches!(
        ty,
        TsType::TsKeywordType(keyword)
            if matches!(
                keyword.kind,
                TsKeywordTypeKind::TsNullKeyword | TsKeywordTypeKind::TsUndefinedKeyword
            )
    )
}

/// Identifiers bound by a pattern, in source order.
fn binding_idents(pat: &Pat) -> Vec<&BindingIdent> {
    match pat {
        Pat::Ident(ident) => vec![ident],
        Pat::Object(obj) => obj
            .props
            .iter()
            .flat_map(|prop| match prop {
                ObjectPatProp::KeyValue(kv) => binding_idents(&kv.value),
                ObjectPatProp::Assign(assign) => vec![&assign.key],
                ObjectPatProp::Rest(rest) => binding_idents(&rest.arg),
            })
            .collect(),
        Pat::Array(arr) => arr.elems.iter().flatten().flat_map(binding_idents).collect(),
        Pat::Assign(assign) => binding_idents(&assign.left),
        Pat::Rest(rest) => binding_idents(&rest.arg),
        _ => Vec::new(),
    }
}
