use std::{collections::BTreeSet, path::PathBuf};

use anyhow::{Context, Result, bail};

use super::super::args::CommonArgs;
use crate::{
    config::{Config, load_config},
    core::{Loader, scan::scan_files},
};

/// Everything a command needs before the pipeline runs: the resolved
/// configuration and the source files it selects.
pub struct ProjectContext {
    pub config: Config,
    /// Source files, relative to the working directory when the root is.
    pub files: BTreeSet<PathBuf>,
}

impl ProjectContext {
    pub fn new(common: &CommonArgs) -> Result<Self> {
        let root = common
            .source_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        if !root.is_dir() {
            bail!("source root is not a directory: {}", root.display());
        }

        // The upward config search needs real parent directories.
        let search_from = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve source root: {}", root.display()))?;
        let config = load_config(&search_from)?.config;

        let scanned = scan_files(
            &root,
            &config.includes,
            &config.ignores,
            config.ignore_test_files,
        );
        tracing::debug!(
            root = %root.display(),
            files = scanned.files.len(),
            "project context ready"
        );

        Ok(Self {
            config,
            files: scanned.files,
        })
    }

    pub fn loader(&self) -> Loader {
        let mut loader = Loader::new();
        loader.include_files(self.files.iter().cloned());
        loader
    }
}
