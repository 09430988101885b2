//! Declarations extracted from a PHP source file
//!
//! Every class-like name stored here is fully qualified, without a leading
//! separator.

use broadcast_core::{MethodDescriptor, ParameterDescriptor, Visibility};

/// Kind of a class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Trait => "trait",
            ClassKind::Enum => "enum",
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub type_hint: Option<String>,
    pub by_ref: bool,
    pub variadic: bool,
    pub has_default: bool,
}

/// One declared method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub params: Vec<ParamDecl>,
    pub line: usize,
}

impl MethodDecl {
    pub fn to_descriptor(&self) -> MethodDescriptor {
        MethodDescriptor {
            name: self.name.clone(),
            visibility: self.visibility,
            is_static: self.is_static,
            parameters: self
                .params
                .iter()
                .map(|p| ParameterDescriptor::new(&p.name, p.type_hint.as_deref()))
                .collect(),
        }
    }
}

/// One class, interface, trait or enum declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Parent class (classes only)
    pub parent: Option<String>,
    /// `implements` for classes and enums, `extends` for interfaces
    pub interfaces: Vec<String>,
    /// Traits pulled in with `use`
    pub traits: Vec<String>,
    pub methods: Vec<MethodDecl>,
    pub line: usize,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, kind: ClassKind, line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            is_abstract: false,
            is_final: false,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            methods: Vec::new(),
            line,
        }
    }

    /// Declared method by name (PHP method names are case-insensitive)
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// All declarations of one file, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub classes: Vec<ClassDecl>,
}

impl SourceFile {
    /// Declaration with the given fully-qualified name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&ClassDecl> {
        let name = name.trim_start_matches('\\');
        self.classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
