//! Common utility functions shared across the codebase.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path: drops `.` components and folds `..` into the
/// preceding component where there is one.
///
/// Does not touch the filesystem, so it works for paths that only exist in
/// memory (sources registered with the loader directly).
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use notate::utils::normalize_path;
///
/// assert_eq!(normalize_path(Path::new("./src/./a/../b.ts")), PathBuf::from("src/b.ts"));
/// assert_eq!(normalize_path(Path::new("../x.ts")), PathBuf::from("../x.ts"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Whether the path has one of the given extensions (without the dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
