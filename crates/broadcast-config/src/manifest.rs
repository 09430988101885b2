//! Composer manifest models
//!
//! Only the parts of `composer.json` and `vendor/composer/installed.json`
//! that matter for listener discovery are modelled; everything else is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One path or a list of paths, as allowed by Composer autoload sections
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AutoloadPaths {
    One(String),
    Many(Vec<String>),
}

impl AutoloadPaths {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::One(path) => std::slice::from_ref(path),
            Self::Many(paths) => paths,
        };
        slice.iter().map(String::as_str)
    }
}

/// The `autoload` section of a package
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Autoload {
    #[serde(rename = "psr-4", default)]
    pub psr4: Option<IndexMap<String, AutoloadPaths>>,
    #[serde(default)]
    pub classmap: Option<Vec<AutoloadPaths>>,
    /// `psr-0`, `files`, `exclude-from-classmap`, ...
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl Autoload {
    pub fn is_empty(&self) -> bool {
        self.psr4.is_none() && self.classmap.is_none() && self.other.is_empty()
    }

    /// Whether a `classmap` or `psr-4` key is declared
    pub fn has_scannable_entries(&self) -> bool {
        self.psr4.is_some() || self.classmap.is_some()
    }

    pub fn classmap_paths(&self) -> impl Iterator<Item = &str> {
        self.classmap.iter().flatten().flat_map(AutoloadPaths::iter)
    }

    pub fn psr4_paths(&self) -> impl Iterator<Item = &str> {
        self.psr4.iter().flat_map(|map| map.values()).flat_map(AutoloadPaths::iter)
    }
}

/// Composer writes an empty autoload section as `[]` in some manifests
fn autoload_or_empty_list<'de, D>(deserializer: D) -> Result<Autoload, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Section {
        Map(Autoload),
        List(Vec<Value>),
    }

    Ok(match Section::deserialize(deserializer)? {
        Section::Map(autoload) => autoload,
        Section::List(_) => Autoload::default(),
    })
}

/// A single package entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "autoload_or_empty_list")]
    pub autoload: Autoload,
    #[serde(default)]
    pub extra: Value,
}

impl PackageManifest {
    /// Value under a dot-separated path inside `extra`
    pub fn extra_value(&self, dot_path: &str) -> Option<&Value> {
        dot_path
            .split('.')
            .try_fold(&self.extra, |value, key| value.get(key))
    }

    /// Whether the `extra` flag at `dot_path` is literally `true`
    pub fn has_flag(&self, dot_path: &str) -> bool {
        matches!(self.extra_value(dot_path), Some(Value::Bool(true)))
    }
}

/// `config` section of the root manifest
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComposerSettings {
    #[serde(rename = "vendor-dir", default)]
    pub vendor_dir: Option<String>,
}

/// The project's own `composer.json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RootManifest {
    #[serde(flatten)]
    pub package: PackageManifest,
    #[serde(default)]
    pub config: ComposerSettings,
}

/// `vendor/composer/installed.json` in either of its layouts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InstalledManifest {
    /// Composer 2: `{ "packages": [...], "dev": ..., ... }`
    Packages { packages: Vec<PackageManifest> },
    /// Composer 1: a bare array
    List(Vec<PackageManifest>),
}

impl InstalledManifest {
    pub fn into_packages(self) -> Vec<PackageManifest> {
        match self {
            Self::Packages { packages } | Self::List(packages) => packages,
        }
    }
}
