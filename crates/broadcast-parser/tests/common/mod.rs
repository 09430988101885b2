//! Common test utilities for source reader tests.

#![allow(dead_code)]

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use broadcast_core::{AutoloadKind, AutoloadMap, Psr4Mapping, SourceDirectory};

/// A throwaway PHP project.
///
/// Application code lives under `src/` (`App\` prefix). The listener marker
/// interface lives under `marker/` as it would in an installed package.
pub struct FixtureProject {
    pub dir: TempDir,
}

impl FixtureProject {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("src"))?;
        std::fs::create_dir_all(dir.path().join("marker"))?;
        std::fs::write(
            dir.path().join("marker/Listener.php"),
            "<?php\n\nnamespace WyriHaximus\\Broadcast\\Marker;\n\ninterface Listener\n{\n}\n",
        )?;
        Ok(Self { dir })
    }

    pub fn src(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    /// Write a file relative to `src/`.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.src().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn autoload_map(&self) -> AutoloadMap {
        AutoloadMap {
            psr4: vec![
                Psr4Mapping::new("App\\", vec![self.src()]),
                Psr4Mapping::new(
                    "WyriHaximus\\Broadcast\\Marker\\",
                    vec![self.dir.path().join("marker")],
                ),
            ],
            classmap: vec![],
        }
    }

    pub fn source_directories(&self) -> Vec<SourceDirectory> {
        vec![SourceDirectory::new(self.src(), "acme/app", AutoloadKind::Psr4)]
    }
}
