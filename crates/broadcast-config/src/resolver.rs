//! Manifest-based path resolution
//!
//! Turns the root manifest and the installed-packages manifest into:
//! 1. The source directories of packages flagged as shipping listeners
//! 2. The autoload map of every package, for class location
//! 3. The install path of the package owning the generated artifact

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use broadcast_core::{
    AutoloadKind, AutoloadMap, PathResolver, Psr4Mapping, ResolveError, SourceDirectory,
};

use crate::manifest::{InstalledManifest, PackageManifest, RootManifest};

const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Resolves paths from `composer.json` and `vendor/composer/installed.json`
#[derive(Debug, Clone)]
pub struct ManifestPathResolver {
    project_root: PathBuf,
    vendor_dir: PathBuf,
    root: PackageManifest,
    installed: Vec<PackageManifest>,
    listener_flag: String,
}

impl ManifestPathResolver {
    /// Read the manifests of the project at `project_root`
    ///
    /// A missing `installed.json` means no dependencies are installed.
    pub async fn load(project_root: &Path, listener_flag: &str) -> Result<Self, ResolveError> {
        let manifest_path = project_root.join("composer.json");
        let root: RootManifest = read_json(&manifest_path).await?;

        let vendor_dir = project_root.join(
            root.config
                .vendor_dir
                .as_deref()
                .unwrap_or(DEFAULT_VENDOR_DIR),
        );

        let installed_path = vendor_dir.join("composer").join("installed.json");
        let installed = if tokio::fs::try_exists(&installed_path).await.unwrap_or(false) {
            read_json::<InstalledManifest>(&installed_path)
                .await?
                .into_packages()
        } else {
            debug!("No installed packages manifest at {}", installed_path.display());
            Vec::new()
        };

        Ok(Self::from_manifests(
            project_root,
            vendor_dir,
            root.package,
            installed,
            listener_flag,
        ))
    }

    pub fn from_manifests(
        project_root: impl Into<PathBuf>,
        vendor_dir: impl Into<PathBuf>,
        root: PackageManifest,
        installed: Vec<PackageManifest>,
        listener_flag: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            vendor_dir: vendor_dir.into(),
            root,
            installed,
            listener_flag: listener_flag.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    pub fn root_package_name(&self) -> &str {
        &self.root.name
    }

    /// Directory `package_name` is installed in
    ///
    /// The project root when the project is that package, its vendor
    /// directory otherwise.
    pub fn install_path(&self, package_name: &str) -> PathBuf {
        if self.root.name == package_name {
            self.project_root.clone()
        } else {
            self.vendor_dir.join(package_name)
        }
    }

    /// Installed packages followed by the root package
    fn packages(&self) -> impl Iterator<Item = (&PackageManifest, bool)> {
        self.installed
            .iter()
            .map(|p| (p, false))
            .chain(std::iter::once((&self.root, true)))
    }

    fn package_path(&self, package: &PackageManifest, is_root: bool, relative: &str) -> PathBuf {
        let base = if is_root {
            self.project_root.clone()
        } else {
            self.vendor_dir.join(&package.name)
        };
        let joined = format!("{}/{}", base.display(), relative);
        PathBuf::from(joined.trim_end_matches('/'))
    }

    fn is_listener_package(&self, package: &PackageManifest) -> bool {
        !package.autoload.is_empty()
            && package.has_flag(&self.listener_flag)
            && package.autoload.has_scannable_entries()
    }

    /// Existing source directories of listener packages, without duplicates
    pub fn listener_directories(&self) -> Vec<SourceDirectory> {
        let mut seen = HashSet::new();
        let mut directories = Vec::new();

        for (package, is_root) in self.packages() {
            if !self.is_listener_package(package) {
                trace!(package = %package.name, "Not a listener package");
                continue;
            }

            let classmap = package
                .autoload
                .classmap_paths()
                .map(|p| (p, AutoloadKind::Classmap));
            let psr4 = package
                .autoload
                .psr4_paths()
                .map(|p| (p, AutoloadKind::Psr4));

            for (relative, kind) in classmap.chain(psr4) {
                let path = self.package_path(package, is_root, relative);
                if !path.exists() {
                    debug!(package = %package.name, "Skipping missing path {}", path.display());
                    continue;
                }
                if seen.insert(path.clone()) {
                    directories.push(SourceDirectory::new(path, &package.name, kind));
                }
            }
        }

        directories
    }

    /// Autoload mappings of every package, flagged or not
    pub fn autoload_map(&self) -> AutoloadMap {
        let mut map = AutoloadMap::default();

        for (package, is_root) in self.packages() {
            if let Some(psr4) = &package.autoload.psr4 {
                for (prefix, paths) in psr4 {
                    let directories = paths
                        .iter()
                        .map(|relative| self.package_path(package, is_root, relative))
                        .collect();
                    map.psr4.push(Psr4Mapping::new(prefix, directories));
                }
            }

            map.classmap.extend(
                package
                    .autoload
                    .classmap_paths()
                    .map(|relative| self.package_path(package, is_root, relative))
                    .filter(|path| path.exists()),
            );
        }

        map
    }
}

#[async_trait]
impl PathResolver for ManifestPathResolver {
    async fn list_source_directories(&self) -> Result<Vec<SourceDirectory>, ResolveError> {
        Ok(self.listener_directories())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ResolveError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|e| ResolveError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn package(value: serde_json::Value) -> PackageManifest {
        serde_json::from_value(value).unwrap()
    }

    fn flagged(name: &str, autoload: serde_json::Value) -> PackageManifest {
        package(json!({
            "name": name,
            "autoload": autoload,
            "extra": { "wyrihaximus": { "broadcast": { "has-listeners": true } } }
        }))
    }

    const FLAG: &str = "wyrihaximus.broadcast.has-listeners";

    #[test]
    fn test_listener_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("vendor/acme/mail/src")).unwrap();
        fs::create_dir_all(root.join("vendor/acme/mail/lib")).unwrap();
        fs::create_dir_all(root.join("vendor/acme/quiet/src")).unwrap();
        fs::create_dir_all(root.join("app")).unwrap();

        let resolver = ManifestPathResolver::from_manifests(
            root,
            root.join("vendor"),
            flagged("acme/app", json!({ "psr-4": { "App\\": "app/" } })),
            vec![
                flagged(
                    "acme/mail",
                    json!({
                        "psr-4": { "Mail\\": ["src/", "missing/"] },
                        "classmap": ["lib/"]
                    }),
                ),
                package(json!({ "name": "acme/quiet", "autoload": { "psr-4": { "Quiet\\": "src/" } } })),
                flagged("acme/files", json!({ "files": ["f.php"] })),
            ],
            FLAG,
        );

        let directories = resolver.listener_directories();
        let found: Vec<_> = directories
            .iter()
            .map(|d| (d.path.strip_prefix(root).unwrap().to_path_buf(), d.package.as_str(), d.autoload))
            .collect();

        assert_eq!(
            found,
            vec![
                (PathBuf::from("vendor/acme/mail/lib"), "acme/mail", AutoloadKind::Classmap),
                (PathBuf::from("vendor/acme/mail/src"), "acme/mail", AutoloadKind::Psr4),
                (PathBuf::from("app"), "acme/app", AutoloadKind::Psr4),
            ]
        );
    }

    #[test]
    fn test_duplicate_paths_are_listed_once() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let resolver = ManifestPathResolver::from_manifests(
            temp.path(),
            temp.path().join("vendor"),
            flagged("acme/app", json!({ "psr-4": { "App\\": "src/", "App\\Other\\": "src" } })),
            vec![],
            FLAG,
        );

        assert_eq!(resolver.listener_directories().len(), 1);
    }

    #[test]
    fn test_autoload_map_covers_unflagged_packages() {
        let temp = TempDir::new().unwrap();
        let resolver = ManifestPathResolver::from_manifests(
            temp.path(),
            temp.path().join("vendor"),
            package(json!({ "name": "acme/app", "autoload": { "psr-4": { "App\\": "src/" } } })),
            vec![package(json!({
                "name": "vendor/lib",
                "autoload": { "psr-4": { "Lib\\": "" } }
            }))],
            FLAG,
        );

        let map = resolver.autoload_map();
        assert_eq!(map.psr4.len(), 2);
        assert_eq!(map.psr4[0].prefix, "Lib\\");
        assert_eq!(map.psr4[0].directories, vec![temp.path().join("vendor/vendor/lib")]);
        assert_eq!(map.psr4[1].directories, vec![temp.path().join("src")]);
    }

    #[test]
    fn test_install_path_convention() {
        let temp = TempDir::new().unwrap();
        let own = ManifestPathResolver::from_manifests(
            temp.path(),
            temp.path().join("vendor"),
            package(json!({ "name": "wyrihaximus/broadcast" })),
            vec![],
            FLAG,
        );
        let consumer = ManifestPathResolver::from_manifests(
            temp.path(),
            temp.path().join("vendor"),
            package(json!({ "name": "acme/app" })),
            vec![],
            FLAG,
        );

        assert_eq!(own.install_path("wyrihaximus/broadcast"), temp.path());
        assert_eq!(
            consumer.install_path("wyrihaximus/broadcast"),
            temp.path().join("vendor/wyrihaximus/broadcast")
        );
    }

    #[tokio::test]
    async fn test_load_reads_both_manifests() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(
            root.join("composer.json"),
            r#"{ "name": "acme/app", "config": { "vendor-dir": "deps" } }"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("deps/composer")).unwrap();
        fs::create_dir_all(root.join("deps/acme/mail/src")).unwrap();
        fs::write(
            root.join("deps/composer/installed.json"),
            json!({
                "packages": [{
                    "name": "acme/mail",
                    "autoload": { "psr-4": { "Mail\\": "src/" } },
                    "extra": { "wyrihaximus": { "broadcast": { "has-listeners": true } } }
                }]
            })
            .to_string(),
        )
        .unwrap();

        let resolver = ManifestPathResolver::load(root, FLAG).await.unwrap();
        let directories = resolver.list_source_directories().await.unwrap();

        assert_eq!(resolver.vendor_dir(), root.join("deps"));
        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0].path, root.join("deps/acme/mail/src"));
    }

    #[tokio::test]
    async fn test_load_without_root_manifest_fails() {
        let temp = TempDir::new().unwrap();
        let err = ManifestPathResolver::load(temp.path(), FLAG).await.unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }

    #[tokio::test]
    async fn test_malformed_manifest() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("composer.json"), "{ not json").unwrap();

        let err = ManifestPathResolver::load(temp.path(), FLAG).await.unwrap_err();
        assert!(matches!(err, ResolveError::Manifest { .. }));
    }
}
