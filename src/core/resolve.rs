//! Resolving the dotted paths of symbol references.
//!
//! The first segment is looked up lexically from the scope around the anchor
//! declaration. Every further segment is looked up as a member of the symbol
//! before it. Resolution stops at the first segment that fails.

use thiserror::Error;

use crate::{
    core::{
        annotation::{Annotation, SymbolReference},
        source::{DeclId, SourceModel, SymbolId},
    },
    diagnostics::{Diagnostic, Stage},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("\"{name}\" not found in scope")]
    NotInScope { name: String },

    #[error("\"{name}\" not found in {owner}")]
    NotInNamespace { name: String, owner: String },

    #[error("empty reference path")]
    EmptyPath,
}

/// Resolve `path` relative to `anchor`: one symbol per segment.
///
/// Performs at most one lookup per segment.
pub fn resolve_path(model: &SourceModel, anchor: DeclId, path: &[String]) -> Result<Vec<SymbolId>, ResolveError> {
    let (first, rest) = path.split_first().ok_or(ResolveError::EmptyPath)?;
    let scope = model.innermost_scope(model.declaration(anchor).span.lo);

    let mut current = model
        .lookup_in_scope(scope, first)
        .map(|symbol| model.follow_import(symbol))
        .ok_or_else(|| ResolveError::NotInScope { name: first.clone() })?;

    let mut chain = Vec::with_capacity(path.len());
    chain.push(current);
    for segment in rest {
        current = model
            .lookup_member(current, segment)
            .map(|symbol| model.follow_import(symbol))
            .ok_or_else(|| ResolveError::NotInNamespace {
                name: segment.clone(),
                owner: model.symbol(current).to_string(),
            })?;
        chain.push(current);
    }
    Ok(chain)
}

/// Resolve one reference, unless it was resolved before. Returns the error,
/// if this call recorded one.
pub fn resolve_reference(model: &SourceModel, reference: &SymbolReference) -> Option<ResolveError> {
    if reference.resolution().is_some() {
        return None;
    }
    let resolution = resolve_path(model, reference.anchor, &reference.path);
    let err = resolution.as_ref().err().cloned();
    reference.set_resolution(resolution);
    err
}

/// Resolve every reference of every annotation. Failures come back as
/// warnings located at the reference.
pub fn resolve_all(model: &SourceModel, annotations: &[Annotation]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut resolved = 0usize;

    for reference in annotations.iter().flat_map(Annotation::references) {
        match resolve_reference(model, reference) {
            Some(err) => {
                tracing::debug!(location = %reference.location, path = %reference.dotted(), %err, "unresolved reference");
                diagnostics.push(Diagnostic::warning(
                    Stage::Resolve,
                    Some(reference.location.clone()),
                    format!("cannot resolve {:?}: {}", reference.dotted(), err),
                ));
            }
            None => resolved += 1,
        }
    }

    tracing::debug!(resolved, failed = diagnostics.len(), "references resolved");
    diagnostics
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::{fixtures, resolve::*};

    fn path(dotted: &str) -> Vec<String> {
        dotted.split('.').map(str::to_string).collect()
    }

    fn named<'a>(annotations: &'a [Annotation], name: &str) -> &'a Annotation {
        annotations.iter().find(|a| a.name == name).unwrap()
    }

    fn targets(model: &SourceModel, annotation: &Annotation) -> Vec<String> {
        annotation
            .references()
            .map(|r| model.symbol(r.target().unwrap()).to_string())
            .collect()
    }

    #[test]
    fn test_local_references() {
        let (model, scanned) = fixtures::scanned();
        let diagnostics = resolve_all(&model, &scanned.annotations);
        // Only the three deliberately broken references fail.
        assert_eq!(diagnostics.len(), 3);

        let local = named(&scanned.annotations, "LocalRefs");
        assert_eq!(targets(&model, local), vec!["class Thing", "method greeting"]);

        let chain = local.references().nth(1).unwrap().resolved().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0], fixtures::symbol(&model, "class Thing"));
    }

    #[test]
    fn test_references_through_imports() {
        let (model, scanned) = fixtures::scanned();
        resolve_all(&model, &scanned.annotations);

        let remote = named(&scanned.annotations, "RemoteRefs");
        assert_eq!(
            targets(&model, remote),
            vec![
                "function sprintf",
                "interface Stringer",
                "function sprintf",
                "method toString",
            ]
        );
        let namespace = remote.references().next().unwrap().resolved().unwrap()[0];
        assert_eq!(model.symbol(namespace).to_string(), "module fmt");
    }

    #[test]
    fn test_references_through_values_and_statics() {
        let (model, scanned) = fixtures::scanned();
        resolve_all(&model, &scanned.annotations);

        let values = named(&scanned.annotations, "ValueRefs");
        assert_eq!(
            targets(&model, values),
            vec!["method greeting", "field age", "method create", "enum member Red"]
        );
    }

    #[test]
    fn test_broken_references_stop_at_first_failure() {
        let (model, scanned) = fixtures::scanned();
        let diagnostics = resolve_all(&model, &scanned.annotations);

        let broken = named(&scanned.annotations, "BrokenRefs");
        let errors: Vec<String> = broken.references().map(|r| r.error().unwrap().to_string()).collect();
        assert_eq!(
            errors,
            vec![
                r#""Missing" not found in scope"#,
                r#""nope" not found in class Thing"#,
                r#""Missing" not found in scope"#,
            ]
        );

        let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                r#"src/annotations.ts:66:16: cannot resolve "Missing": "Missing" not found in scope"#,
                r#"src/annotations.ts:66:25: cannot resolve "Thing.nope": "nope" not found in class Thing"#,
                r#"src/annotations.ts:66:37: cannot resolve "Missing.deeper.still": "Missing" not found in scope"#,
            ]
        );
    }

    #[test]
    fn test_resolution_happens_once() {
        let (model, scanned) = fixtures::scanned();
        let first = resolve_all(&model, &scanned.annotations);
        assert_eq!(first.len(), 3);
        assert!(resolve_all(&model, &scanned.annotations).is_empty());
    }

    #[test]
    fn test_resolve_path_directly() {
        let model = fixtures::model();
        let anchor = model
            .declarations()
            .iter()
            .find(|d| d.name.as_deref() == Some("Magnitude"))
            .unwrap()
            .id;

        let chain = resolve_path(&model, anchor, &path("fmt.Stringer.toString")).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(
            resolve_path(&model, anchor, &path("fmt.nope")),
            Err(ResolveError::NotInNamespace {
                name: "nope".to_string(),
                owner: "module fmt".to_string(),
            })
        );
        assert_eq!(resolve_path(&model, anchor, &[]), Err(ResolveError::EmptyPath));
        // Builtins live in the universe scope.
        assert_eq!(resolve_path(&model, anchor, &path("string")).unwrap().len(), 1);
    }

    #[test]
    fn test_default_import_resolves_to_default_export() {
        let mut loader = fixtures::loader();
        loader.include_source(
            "src/uses_default.ts",
            "import Printer from \"./fmt\";\n// @Prints(Printer.print)\nexport const p = 1;\n",
        );
        let model = crate::core::source::Load::load(&loader).unwrap().model;
        let scanned = crate::core::parse::scan(&model);
        resolve_all(&model, &scanned.annotations);

        let prints = named(&scanned.annotations, "Prints");
        assert_eq!(targets(&model, prints), vec!["method print"]);
    }
}
