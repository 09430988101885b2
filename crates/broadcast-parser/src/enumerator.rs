//! Directory-based class enumeration
//!
//! Walks source directories in sorted order and collects every class-like
//! declaration found in `*.php` files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};
use walkdir::WalkDir;

use broadcast_core::{ClassEnumerator, ClassIdentifier, EnumerationError, SourceDirectory};

use crate::parser::parse_source;

/// Whether a path names a PHP source file
pub fn is_php_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

/// PHP files below `root` in deterministic order
///
/// Entries are visited sorted by file name and symlinks are followed. A `root`
/// that is itself a file yields just that file.
pub fn php_files(root: &Path) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() && is_php_file(entry.path()) => {
                Some(Ok(entry.into_path()))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
}

fn walk_error(root: &Path, error: walkdir::Error) -> EnumerationError {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    EnumerationError::Io {
        path,
        source: error.into(),
    }
}

/// Enumerates classes declared in the files of the given directories
///
/// Directories are processed in the order given. A file reachable through
/// several directories (nested roots, symlinks) is read once, at its first
/// occurrence. Any file that cannot be read or parsed fails the enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryClassEnumerator;

impl DirectoryClassEnumerator {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous enumeration, run on the blocking pool by the trait impl
    pub fn enumerate_blocking(
        &self,
        directories: &[SourceDirectory],
    ) -> Result<Vec<ClassIdentifier>, EnumerationError> {
        let mut seen = HashSet::new();
        let mut classes = Vec::new();

        for directory in directories {
            let before = classes.len();

            for file in php_files(&directory.path) {
                let file = file.map_err(|e| walk_error(&directory.path, e))?;

                let canonical = fs::canonicalize(&file).map_err(|source| EnumerationError::Io {
                    path: file.clone(),
                    source,
                })?;
                if !seen.insert(canonical) {
                    trace!("Skipping already enumerated file {}", file.display());
                    continue;
                }

                let source = fs::read_to_string(&file).map_err(|source| EnumerationError::Io {
                    path: file.clone(),
                    source,
                })?;
                let parsed = parse_source(&source).map_err(|e| EnumerationError::Parse {
                    path: file.clone(),
                    message: e.to_string(),
                })?;

                classes.extend(
                    parsed
                        .classes
                        .into_iter()
                        .map(|decl| ClassIdentifier::new(decl.name)),
                );
            }

            debug!(
                package = %directory.package,
                "Enumerated {} classes in {}",
                classes.len() - before,
                directory.path.display()
            );
        }

        Ok(classes)
    }
}

#[async_trait]
impl ClassEnumerator for DirectoryClassEnumerator {
    async fn enumerate(
        &self,
        directories: &[SourceDirectory],
    ) -> Result<Vec<ClassIdentifier>, EnumerationError> {
        let enumerator = *self;
        let directories = directories.to_vec();
        let fallback = directories
            .first()
            .map(|d| d.path.clone())
            .unwrap_or_default();

        tokio::task::spawn_blocking(move || enumerator.enumerate_blocking(&directories))
            .await
            .map_err(|e| EnumerationError::Io {
                path: fallback,
                source: std::io::Error::other(e),
            })?
    }
}
