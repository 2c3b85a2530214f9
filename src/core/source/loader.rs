//! Loading source files into a [`SourceModel`].
//!
//! Files are registered in one shared `SourceMap` in path order, so byte
//! positions and every later traversal are deterministic, then parsed in
//! parallel.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::prelude::*;
use swc_common::{
    FileName, GLOBALS, Globals, SourceFile, SourceMap, Span, Spanned,
    comments::SingleThreadedComments,
};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use thiserror::Error;

use super::{
    SourceModel,
    builder::{CommentMap, ModelBuilder, ParsedFile},
};
use crate::{
    diagnostics::{Diagnostic, Location, Stage},
    utils::has_extension,
};

/// Extensions the loader picks up from directories.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx"];

/// Extra predicate applied to files found by [`Loader::include_dir`].
pub type FileFilter = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Produces a source model. Called exactly once per pipeline run.
pub trait Load {
    fn load(&self) -> Result<Loaded, LoadError>;
}

/// A source model plus the non-fatal problems found while building it.
#[derive(Debug)]
pub struct Loaded {
    pub model: SourceModel,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing was included, or every include was empty.
    #[error("no files parsed")]
    NoFiles,

    /// No file could be parsed; carries the first problem found.
    #[error("{0}")]
    Failed(Diagnostic),
}

/// The default [`Load`] implementation: explicit sources, files and directories.
#[derive(Default)]
pub struct Loader {
    sources: Vec<(String, String)>,
    files: Vec<PathBuf>,
    dirs: Vec<(PathBuf, Option<FileFilter>)>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register in-memory contents under a path.
    pub fn include_source(&mut self, path: impl Into<String>, contents: impl Into<String>) -> &mut Self {
        self.sources.push((path.into(), contents.into()));
        self
    }

    pub fn include_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.files.push(path.into());
        self
    }

    pub fn include_files<I, P>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Include the source files directly inside `path` (not recursive).
    pub fn include_dir(&mut self, path: impl Into<PathBuf>, filter: Option<FileFilter>) -> &mut Self {
        self.dirs.push((path.into(), filter));
        self
    }

    /// Collect `(path, contents)` pairs; unreadable inputs become diagnostics.
    fn gather(&self, diagnostics: &mut Vec<Diagnostic>) -> Vec<(String, String)> {
        let mut inputs = self.sources.clone();

        let mut paths = self.files.clone();
        for (dir, filter) in &self.dirs {
            match fs::read_dir(dir) {
                Ok(entries) => {
                    paths.extend(
                        entries
                            .filter_map(Result::ok)
                            .map(|entry| entry.path())
                            .filter(|path| path.is_file() && has_extension(path, SOURCE_EXTENSIONS))
                            .filter(|path| filter.as_ref().is_none_or(|filter| filter(path))),
                    );
                }
                Err(err) => diagnostics.push(Diagnostic::error(
                    Stage::Load,
                    None,
                    format!("cannot read directory {}: {}", dir.display(), err),
                )),
            }
        }

        for path in paths {
            match fs::read_to_string(&path) {
                Ok(contents) => inputs.push((path.to_string_lossy().into_owned(), contents)),
                Err(err) => diagnostics.push(Diagnostic::error(
                    Stage::Load,
                    None,
                    format!("cannot read {}: {}", path.display(), err),
                )),
            }
        }

        inputs.sort_by(|a, b| a.0.cmp(&b.0));
        inputs.dedup_by(|a, b| a.0 == b.0);
        inputs
    }
}

impl Load for Loader {
    fn load(&self) -> Result<Loaded, LoadError> {
        let mut diagnostics = Vec::new();
        let inputs = self.gather(&mut diagnostics);

        let source_map: Arc<SourceMap> = Default::default();
        let files: Vec<(String, Arc<str>, Arc<SourceFile>)> = inputs
            .into_iter()
            .map(|(path, contents)| {
                let source: Arc<str> = Arc::from(contents.as_str());
                let file = source_map.new_source_file(FileName::Real(PathBuf::from(&path)).into(), contents);
                (path, source, file)
            })
            .collect();

        tracing::debug!(files = files.len(), "parsing sources");

        let results: Vec<(Option<ParsedFile>, Vec<Diagnostic>)> = files
            .par_iter()
            .map(|(path, source, file)| parse_file(path, source, file, &source_map))
            .collect();

        let mut parsed = Vec::with_capacity(results.len());
        for (file, file_diagnostics) in results {
            diagnostics.extend(file_diagnostics);
            parsed.extend(file);
        }

        if parsed.is_empty() {
            return Err(match diagnostics.into_iter().find(Diagnostic::is_error) {
                Some(first) => LoadError::Failed(first),
                None => LoadError::NoFiles,
            });
        }

        let mut builder = ModelBuilder::new(source_map);
        for file in &parsed {
            builder.add_file(file);
        }

        Ok(Loaded {
            model: builder.finish(),
            diagnostics,
        })
    }
}

fn syntax_for(path: &str) -> Syntax {
    Syntax::Typescript(TsSyntax {
        tsx: has_extension(Path::new(path), &["tsx", "jsx"]),
        ..Default::default()
    })
}

fn parse_file(
    path: &str,
    source: &Arc<str>,
    file: &SourceFile,
    source_map: &SourceMap,
) -> (Option<ParsedFile>, Vec<Diagnostic>) {
    GLOBALS.set(&Globals::new(), || {
        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(syntax_for(path), StringInput::from(file), Some(&comments));

        let result = parser.parse_module();
        let mut diagnostics: Vec<Diagnostic> = parser
            .take_errors()
            .into_iter()
            .map(|err| syntax_error(source_map, err))
            .collect();

        match result {
            Ok(module) => {
                // Only leading comments can be doc comments.
                let (leading, _) = comments.borrow_all();
                let comments: CommentMap = leading.iter().map(|(k, v)| (*k, v.clone())).collect();
                let parsed = ParsedFile {
                    path: path.to_string(),
                    source: source.clone(),
                    span: Span::new(file.start_pos, file.end_pos),
                    module,
                    comments,
                };
                (Some(parsed), diagnostics)
            }
            Err(err) => {
                diagnostics.push(syntax_error(source_map, err));
                tracing::warn!(path, "failed to parse");
                (None, diagnostics)
            }
        }
    })
}

fn syntax_error(source_map: &SourceMap, err: swc_ecma_parser::error::Error) -> Diagnostic {
    let loc = source_map.lookup_char_pos(err.span().lo);
    let location = Location::new(loc.file.name.to_string(), loc.line, loc.col.0 + 1);
    Diagnostic::error(Stage::Load, Some(location), err.kind().msg())
}
