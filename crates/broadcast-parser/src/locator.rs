//! Class name to source file resolution
//!
//! Mirrors how a Composer autoloader finds classes: an explicit classmap is
//! consulted first, then PSR-4 prefixes from the most to the least specific.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use broadcast_core::{AutoloadMap, Psr4Mapping};

use crate::enumerator::php_files;
use crate::error::LocatorError;
use crate::parser::parse_source;

/// Resolves fully-qualified class names to the files declaring them
#[derive(Debug, Clone, Default)]
pub struct ComposerLocator {
    /// Sorted by descending prefix length
    psr4: Vec<Psr4Mapping>,
    /// Lower-cased class name -> declaring file
    classmap: HashMap<String, PathBuf>,
}

impl ComposerLocator {
    /// Build a locator from an autoload map
    ///
    /// # Errors
    ///
    /// [`LocatorError::MissingDirectory`] when a PSR-4 prefix points at a
    /// directory that does not exist. Classmap files that fail to parse are
    /// skipped with a warning.
    pub fn build(map: &AutoloadMap) -> Result<Self, LocatorError> {
        for mapping in &map.psr4 {
            if let Some(missing) = mapping.directories.iter().find(|d| !d.is_dir()) {
                return Err(LocatorError::MissingDirectory {
                    prefix: mapping.prefix.clone(),
                    path: missing.clone(),
                });
            }
        }

        let mut psr4 = map.psr4.clone();
        psr4.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        let mut classmap = HashMap::new();
        for root in &map.classmap {
            index_classmap(root, &mut classmap)?;
        }

        debug!(
            "Class locator built with {} PSR-4 prefixes and {} classmap entries",
            psr4.len(),
            classmap.len()
        );

        Ok(Self { psr4, classmap })
    }

    /// File that should declare `class`, if any
    pub fn locate(&self, class: &str) -> Option<PathBuf> {
        let class = class.trim_start_matches('\\');

        if let Some(path) = self.classmap.get(&class.to_ascii_lowercase()) {
            return Some(path.clone());
        }

        for mapping in &self.psr4 {
            let Some(relative) = class.strip_prefix(mapping.prefix.as_str()) else {
                continue;
            };
            if relative.is_empty() {
                continue;
            }
            let relative = format!("{}.php", relative.replace('\\', "/"));

            for directory in &mapping.directories {
                let candidate = directory.join(&relative);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        None
    }

    pub fn psr4_mappings(&self) -> &[Psr4Mapping] {
        &self.psr4
    }

    pub fn classmap_len(&self) -> usize {
        self.classmap.len()
    }
}

fn index_classmap(root: &Path, index: &mut HashMap<String, PathBuf>) -> Result<(), LocatorError> {
    if !root.exists() {
        debug!("Classmap path {} does not exist", root.display());
        return Ok(());
    }

    for file in php_files(root) {
        let file = file.map_err(|e| LocatorError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: e.into(),
        })?;

        let source = match fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping unreadable classmap file {}: {}", file.display(), e);
                continue;
            }
        };

        match parse_source(&source) {
            Ok(parsed) => {
                for decl in parsed.classes {
                    index
                        .entry(decl.name.to_ascii_lowercase())
                        .or_insert_with(|| file.clone());
                }
            }
            Err(e) => warn!("Skipping unparsable classmap file {}: {}", file.display(), e),
        }
    }

    Ok(())
}
