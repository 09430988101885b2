//! Common test utilities for CLI tests

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TEMPLATE: &str = "<?php\n\nnamespace WyriHaximus\\Broadcast\\Generated;\n\nabstract class AbstractListenerProvider\n{\n    private const LISTENERS = ['%s'];\n}\n";

/// A consumer project with the broadcast package installed under `vendor/`
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let project = Self { dir: TempDir::new()? };

        project.write(
            "composer.json",
            r#"{
    "name": "acme/app",
    "autoload": { "psr-4": { "App\\": "src/" } },
    "extra": { "wyrihaximus": { "broadcast": { "has-listeners": true } } }
}"#,
        )?;
        project.write(
            "vendor/composer/installed.json",
            r#"{
    "packages": [{
        "name": "wyrihaximus/broadcast",
        "autoload": { "psr-4": { "WyriHaximus\\Broadcast\\": "src/" } }
    }]
}"#,
        )?;
        project.write(
            "vendor/wyrihaximus/broadcast/src/Marker/Listener.php",
            "<?php\nnamespace WyriHaximus\\Broadcast\\Marker;\n\ninterface Listener {}\n",
        )?;
        project.write(
            "vendor/wyrihaximus/broadcast/etc/AbstractListenerProvider.php",
            TEMPLATE,
        )?;
        project.write(
            "src/Listener/Mailer.php",
            r#"<?php
namespace App\Listener;

use App\Event\UserRegistered;
use WyriHaximus\Broadcast\Marker\Listener;

final class Mailer implements Listener
{
    public function welcome(UserRegistered $event): void {}

    private function log(UserRegistered $event): void {}
}
"#,
        )?;
        project.write(
            "src/Event/UserRegistered.php",
            "<?php\nnamespace App\\Event;\n\nfinal class UserRegistered {}\n",
        )?;

        Ok(project)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Generated provider location for a consumer project
    pub fn artifact(&self) -> PathBuf {
        self.dir
            .path()
            .join("vendor/wyrihaximus/broadcast/src/Generated/AbstractListenerProvider.php")
    }
}
