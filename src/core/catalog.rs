//! The annotation catalog: every annotation of a run, indexed for lookup.
//!
//! Annotations live in one flat arena in scan order; the indices hold arena
//! positions, so per-key results always come back in scan order too. Nothing
//! is added or removed after [`Catalog::build`].

use std::collections::BTreeMap;

use crate::{
    core::{
        annotation::Annotation,
        source::{DeclId, ModuleId, SourceModel, SymbolId},
    },
    diagnostics::{Diagnostic, Stage},
};

#[derive(Debug, Default)]
pub struct Catalog {
    annotations: Vec<Annotation>,
    by_name: BTreeMap<String, Vec<usize>>,
    by_declaration: BTreeMap<DeclId, Vec<usize>>,
    by_symbol: BTreeMap<SymbolId, Vec<usize>>,
    by_module: BTreeMap<ModuleId, Vec<usize>>,
}

impl Catalog {
    /// Index `annotations`, resolving each anchor declaration to its symbol.
    ///
    /// An annotation whose anchor has no single symbol is still cataloged by
    /// name and declaration, and reported as an anchor diagnostic.
    pub fn build(model: &SourceModel, annotations: Vec<Annotation>) -> (Self, Vec<Diagnostic>) {
        let mut catalog = Catalog::default();
        let mut diagnostics = Vec::new();

        for (index, annotation) in annotations.iter().enumerate() {
            catalog.by_name.entry(annotation.name.clone()).or_default().push(index);
            catalog.by_declaration.entry(annotation.anchor).or_default().push(index);

            match model.anchor_of(annotation.anchor) {
                Ok(symbol) => {
                    catalog.by_symbol.entry(symbol).or_default().push(index);
                    if let Some(module) = model.symbol(symbol).module {
                        catalog.by_module.entry(module).or_default().push(index);
                    }
                }
                Err(err) => {
                    tracing::debug!(location = %annotation.location, name = %annotation.name, %err, "cannot find anchor symbol");
                    diagnostics.push(Diagnostic::warning(
                        Stage::Anchor,
                        Some(annotation.location.clone()),
                        format!("{}: cannot find anchor symbol: {}", annotation.name, err),
                    ));
                }
            }
        }

        catalog.annotations = annotations;
        tracing::debug!(
            annotations = catalog.annotations.len(),
            names = catalog.by_name.len(),
            anchors = catalog.by_symbol.len(),
            "catalog built"
        );
        (catalog, diagnostics)
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&Annotation> {
        indices
            .map(|indices| indices.iter().map(|&i| &self.annotations[i]).collect())
            .unwrap_or_default()
    }

    /// Every annotation, in scan order.
    pub fn all(&self) -> Vec<&Annotation> {
        self.annotations.iter().collect()
    }

    pub fn named(&self, name: &str) -> Vec<&Annotation> {
        self.collect(self.by_name.get(name))
    }

    pub fn for_declaration(&self, decl: DeclId) -> Vec<&Annotation> {
        self.collect(self.by_declaration.get(&decl))
    }

    pub fn for_anchor(&self, symbol: SymbolId) -> Vec<&Annotation> {
        self.collect(self.by_symbol.get(&symbol))
    }

    pub fn for_module(&self, module: ModuleId) -> Vec<&Annotation> {
        self.collect(self.by_module.get(&module))
    }

    /// Distinct annotation names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.by_name.keys().map(String::as_str).collect()
    }

    pub fn declarations(&self) -> Vec<DeclId> {
        self.by_declaration.keys().copied().collect()
    }

    /// Symbols with at least one annotation anchored on them.
    pub fn anchor_symbols(&self) -> Vec<SymbolId> {
        self.by_symbol.keys().copied().collect()
    }

    pub fn modules(&self) -> Vec<ModuleId> {
        self.by_module.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
