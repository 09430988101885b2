//! Data model shared by every discovery stage
//!
//! Each stage owns its output until it hands it to the next one:
//!
//! ```text
//! SourceDirectory -> ClassIdentifier -> ClassMetadata -> HandlerDescriptor -> EventRegistry
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Autoload mechanism a source directory was declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoloadKind {
    /// Directory scanned for every class it contains
    Classmap,
    /// Directory mapped to a namespace prefix
    Psr4,
}

impl fmt::Display for AutoloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoloadKind::Classmap => write!(f, "classmap"),
            AutoloadKind::Psr4 => write!(f, "psr-4"),
        }
    }
}

/// A directory believed to contain class definitions for one component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDirectory {
    /// Absolute path of the directory
    pub path: PathBuf,
    /// Name of the component that declared it
    pub package: String,
    /// How the component declared it
    pub autoload: AutoloadKind,
}

impl SourceDirectory {
    pub fn new(path: impl Into<PathBuf>, package: impl Into<String>, autoload: AutoloadKind) -> Self {
        Self {
            path: path.into(),
            package: package.into(),
            autoload,
        }
    }
}

/// Namespace prefix mapped to the directories its classes live in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr4Mapping {
    /// Namespace prefix, empty or ending in a separator
    pub prefix: String,
    pub directories: Vec<PathBuf>,
}

impl Psr4Mapping {
    pub fn new(prefix: impl AsRef<str>, directories: Vec<PathBuf>) -> Self {
        let prefix = prefix.as_ref().trim_start_matches('\\');
        let prefix = if prefix.is_empty() || prefix.ends_with('\\') {
            prefix.to_string()
        } else {
            format!("{prefix}\\")
        };
        Self {
            prefix,
            directories,
        }
    }
}

/// Every autoload rule of every installed component
///
/// Used to locate the definition of any class a listener depends on, not only
/// the listeners themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoloadMap {
    pub psr4: Vec<Psr4Mapping>,
    /// Files and directories whose classes are indexed up front
    pub classmap: Vec<PathBuf>,
}

impl AutoloadMap {
    pub fn is_empty(&self) -> bool {
        self.psr4.is_empty() && self.classmap.is_empty()
    }
}

/// Fully-qualified name of a class-like definition
///
/// Stored without a leading namespace separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIdentifier(String);

impl ClassIdentifier {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim_start_matches('\\').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short name (last namespace segment)
    pub fn short_name(&self) -> &str {
        self.0.rsplit('\\').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ClassIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassIdentifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Method visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// One declared parameter of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Parameter name without the leading `$`
    pub name: String,
    /// Declared type as written (names resolved to their fully-qualified form)
    pub type_hint: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, type_hint: Option<&str>) -> Self {
        Self {
            name: name.into(),
            type_hint: type_hint.map(str::to_string),
        }
    }
}

/// One method of a class as seen by reflection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub parameters: Vec<ParameterDescriptor>,
}

impl MethodDescriptor {
    /// Public instance method with the given parameters
    pub fn public(name: impl Into<String>, parameters: Vec<ParameterDescriptor>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            parameters,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Structural facts about one class
///
/// Produced by a [`Reflector`](crate::traits::Reflector) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Fully-qualified class name
    pub name: ClassIdentifier,
    /// Implemented capabilities (interfaces), including inherited ones
    pub interfaces: Vec<String>,
    /// Methods visible on the class
    pub methods: Vec<MethodDescriptor>,
    /// False for abstract classes, interfaces, traits, enums and classes with a
    /// non-public constructor
    pub instantiable: bool,
}

impl ClassMetadata {
    /// Instantiable class without interfaces or methods
    pub fn new(name: impl Into<ClassIdentifier>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
            methods: Vec::new(),
            instantiable: true,
        }
    }

    pub fn with_interface(mut self, interface: impl AsRef<str>) -> Self {
        self.interfaces
            .push(interface.as_ref().trim_start_matches('\\').to_string());
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_instantiable(mut self, instantiable: bool) -> Self {
        self.instantiable = instantiable;
        self
    }

    /// Whether the class implements `interface`
    ///
    /// Class names are case-insensitive and may carry a leading separator.
    pub fn implements(&self, interface: &str) -> bool {
        let wanted = interface.trim_start_matches('\\');
        self.interfaces
            .iter()
            .any(|candidate| candidate.trim_start_matches('\\').eq_ignore_ascii_case(wanted))
    }
}

/// One eligible event handler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// Declared type of the handler's single parameter
    pub event_type: String,
    pub class_name: String,
    pub method_name: String,
    pub is_static: bool,
}

impl HandlerDescriptor {
    pub fn new(
        event_type: impl Into<String>,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        is_static: bool,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            class_name: class_name.into(),
            method_name: method_name.into(),
            is_static,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_identifier_strips_leading_separator() {
        let id = ClassIdentifier::new("\\App\\Listener\\Mailer");
        assert_eq!(id.as_str(), "App\\Listener\\Mailer");
        assert_eq!(id.short_name(), "Mailer");
    }

    #[test]
    fn test_psr4_prefix_is_normalized() {
        assert_eq!(Psr4Mapping::new("\\App\\Listener", vec![]).prefix, "App\\Listener\\");
        assert_eq!(Psr4Mapping::new("App\\", vec![]).prefix, "App\\");
        assert_eq!(Psr4Mapping::new("", vec![]).prefix, "");
    }

    #[test]
    fn test_implements_is_case_insensitive() {
        let class = ClassMetadata::new("App\\A").with_interface("\\WyriHaximus\\Broadcast\\Marker\\Listener");

        assert!(class.implements("WyriHaximus\\Broadcast\\Marker\\Listener"));
        assert!(class.implements("\\wyrihaximus\\broadcast\\marker\\listener"));
        assert!(!class.implements("WyriHaximus\\Broadcast\\Marker\\Subscriber"));
    }
}
