//! PHP name resolution
//!
//! Resolves class names the way the PHP compiler does: fully-qualified names
//! are taken as-is, names whose first segment matches an import are expanded,
//! everything else is relative to the current namespace.

use std::collections::HashMap;

/// Type keywords that never refer to a class
const BUILTIN_TYPES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "parent", "self", "static", "string", "true", "void",
];

pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.iter().any(|b| b.eq_ignore_ascii_case(name))
}

/// Namespace and imports in effect at some point of a file
#[derive(Debug, Clone, Default)]
pub struct NameContext {
    namespace: String,
    /// Lower-cased alias -> fully-qualified name
    imports: HashMap<String, String>,
}

impl NameContext {
    /// Enter a namespace, forgetting previous imports
    pub fn enter_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.trim_matches('\\').to_string();
        self.imports.clear();
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register `use name [as alias]`
    pub fn import(&mut self, name: &str, alias: Option<&str>) {
        let name = name.trim_start_matches('\\');
        let alias = alias
            .map(str::to_string)
            .unwrap_or_else(|| name.rsplit('\\').next().unwrap_or(name).to_string());
        self.imports.insert(alias.to_ascii_lowercase(), name.to_string());
    }

    /// Fully-qualified name of a declaration in the current namespace
    pub fn declare(&self, short_name: &str) -> String {
        if self.namespace.is_empty() {
            short_name.to_string()
        } else {
            format!("{}\\{}", self.namespace, short_name)
        }
    }

    /// Resolve a class reference
    pub fn resolve_class(&self, name: &str) -> String {
        if let Some(fully_qualified) = name.strip_prefix('\\') {
            return fully_qualified.to_string();
        }

        if let (Some(keyword), Some(relative)) = (name.get(..10), name.get(10..)) {
            if keyword.eq_ignore_ascii_case("namespace\\") && !relative.is_empty() {
                return self.declare(relative);
            }
        }

        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };

        match (self.imports.get(&first.to_ascii_lowercase()), rest) {
            (Some(imported), Some(rest)) => format!("{imported}\\{rest}"),
            (Some(imported), None) => imported.clone(),
            (None, _) => self.declare(name),
        }
    }

    /// Resolve a name in type position, leaving type keywords untouched
    pub fn resolve_type(&self, name: &str) -> String {
        if is_builtin_type(name) {
            name.to_string()
        } else {
            self.resolve_class(name)
        }
    }
}
