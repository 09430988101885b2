//! Source-based class reflection
//!
//! Reflection happens in two phases. The declaration of the requested class
//! and of every ancestor (parents, interfaces, traits) is loaded first,
//! locating and parsing files on demand. The class shape is then computed
//! from the loaded declarations without touching the filesystem again.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

use broadcast_core::{ClassIdentifier, ClassMetadata, MethodDescriptor, ReflectionError, Reflector};

use crate::ast::{ClassDecl, ClassKind, SourceFile};
use crate::builtin;
use crate::locator::ComposerLocator;
use crate::parser::parse_source;

const CONSTRUCTOR: &str = "__construct";

/// Reflects classes by parsing the files the locator points at
///
/// Parsed files are cached for the lifetime of the reflector, so ancestors
/// shared by many classes are read once.
#[derive(Debug)]
pub struct SourceReflector {
    locator: Arc<ComposerLocator>,
    cache: DashMap<PathBuf, Arc<SourceFile>>,
}

impl SourceReflector {
    pub fn new(locator: ComposerLocator) -> Self {
        Self::with_locator(Arc::new(locator))
    }

    pub fn with_locator(locator: Arc<ComposerLocator>) -> Self {
        Self {
            locator,
            cache: DashMap::new(),
        }
    }

    pub fn locator(&self) -> &ComposerLocator {
        &self.locator
    }

    /// Number of distinct files parsed so far
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    async fn load_file(&self, requested: &str, path: &Path) -> Result<Arc<SourceFile>, ReflectionError> {
        if let Some(file) = self.cache.get(path) {
            return Ok(Arc::clone(file.value()));
        }

        trace!("Parsing {}", path.display());
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            ReflectionError::fatal(requested, format!("Failed to read {}: {}", path.display(), e))
        })?;
        let parsed = parse_source(&source).map_err(|e| {
            ReflectionError::fatal(requested, format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let file = Arc::new(parsed);
        Ok(Arc::clone(
            self.cache
                .entry(path.to_path_buf())
                .or_insert(file)
                .value(),
        ))
    }

    /// Declaration of `name`, searching project sources before runtime classes
    async fn declaration(&self, requested: &str, name: &str) -> Result<ClassDecl, ReflectionError> {
        if let Some(path) = self.locator.locate(name) {
            let file = self.load_file(requested, &path).await?;
            if let Some(decl) = file.find(name) {
                return Ok(decl.clone());
            }
        } else if let Some(decl) = builtin::lookup(name) {
            return Ok(decl.clone());
        }

        Err(ReflectionError::not_found(
            requested,
            format!("Class \"{name}\" could not be found in the located source"),
        ))
    }

    /// Load the requested class and all of its ancestors, keyed by lower-cased name
    async fn load_hierarchy(
        &self,
        class: &ClassIdentifier,
    ) -> Result<HashMap<String, ClassDecl>, ReflectionError> {
        let mut loaded = HashMap::new();
        let mut queue = VecDeque::from([class.as_str().to_string()]);

        while let Some(name) = queue.pop_front() {
            let key = name.to_ascii_lowercase();
            if loaded.contains_key(&key) {
                continue;
            }

            let decl = self.declaration(class.as_str(), &name).await?;
            queue.extend(decl.parent.iter().cloned());
            queue.extend(decl.interfaces.iter().cloned());
            queue.extend(decl.traits.iter().cloned());
            loaded.insert(key, decl);
        }

        Ok(loaded)
    }
}

#[async_trait]
impl Reflector for SourceReflector {
    async fn reflect(&self, class: &ClassIdentifier) -> Result<ClassMetadata, ReflectionError> {
        let hierarchy = self.load_hierarchy(class).await?;
        let metadata = Hierarchy::new(class, &hierarchy).metadata()?;
        debug!(
            class = %metadata.name,
            "Reflected {} interfaces and {} methods",
            metadata.interfaces.len(),
            metadata.methods.len()
        );
        Ok(metadata)
    }
}

/// Loaded declarations of one class and its ancestors
struct Hierarchy<'a> {
    requested: &'a ClassIdentifier,
    declarations: &'a HashMap<String, ClassDecl>,
}

impl<'a> Hierarchy<'a> {
    fn new(requested: &'a ClassIdentifier, declarations: &'a HashMap<String, ClassDecl>) -> Self {
        Self {
            requested,
            declarations,
        }
    }

    fn fatal(&self, message: String) -> ReflectionError {
        ReflectionError::fatal(self.requested.as_str(), message)
    }

    fn get(&self, name: &str) -> Result<&'a ClassDecl, ReflectionError> {
        self.declarations
            .get(&name.trim_start_matches('\\').to_ascii_lowercase())
            .ok_or_else(|| {
                ReflectionError::not_found(
                    self.requested.as_str(),
                    format!("Class \"{name}\" could not be found in the located source"),
                )
            })
    }

    fn expect_kind(&self, owner: &ClassDecl, name: &str, kind: ClassKind) -> Result<&'a ClassDecl, ReflectionError> {
        let decl = self.get(name)?;
        if decl.kind != kind {
            return Err(self.fatal(format!(
                "{} {} cannot use {} {} as {}",
                owner.kind.as_str(),
                owner.name,
                decl.kind.as_str(),
                decl.name,
                kind.as_str()
            )));
        }
        Ok(decl)
    }

    fn metadata(&self) -> Result<ClassMetadata, ReflectionError> {
        let root = self.get(self.requested.as_str())?;
        let chain = self.class_chain(root)?;

        let mut interfaces = Vec::new();
        let mut seen = HashSet::new();
        for decl in &chain {
            self.collect_interfaces(decl, &mut interfaces, &mut seen, &mut Vec::new())?;
        }

        let mut methods: Vec<MethodDescriptor> = Vec::new();
        for decl in &chain {
            self.collect_methods(decl, &mut methods, &mut Vec::new())?;
        }

        let constructor_public = methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(CONSTRUCTOR))
            .map_or(true, |m| m.is_public());
        let instantiable = root.kind == ClassKind::Class && !root.is_abstract && constructor_public;

        Ok(ClassMetadata {
            name: ClassIdentifier::new(&root.name),
            interfaces,
            methods,
            instantiable,
        })
    }

    /// The class followed by its parents, nearest first
    fn class_chain(&self, root: &'a ClassDecl) -> Result<Vec<&'a ClassDecl>, ReflectionError> {
        let mut chain = vec![root];
        let mut seen = HashSet::from([root.name.to_ascii_lowercase()]);
        let mut current = root;

        while let Some(parent) = &current.parent {
            let decl = self.expect_kind(current, parent, ClassKind::Class)?;
            if !seen.insert(decl.name.to_ascii_lowercase()) {
                return Err(self.fatal(format!("Inheritance cycle through class {}", decl.name)));
            }
            chain.push(decl);
            current = decl;
        }

        Ok(chain)
    }

    fn collect_interfaces(
        &self,
        decl: &ClassDecl,
        out: &mut Vec<String>,
        seen: &mut HashSet<String>,
        visiting: &mut Vec<String>,
    ) -> Result<(), ReflectionError> {
        let key = decl.name.to_ascii_lowercase();
        if visiting.contains(&key) {
            return Err(self.fatal(format!("Inheritance cycle through interface {}", decl.name)));
        }
        visiting.push(key);

        for name in &decl.interfaces {
            let interface = self.expect_kind(decl, name, ClassKind::Interface)?;
            if seen.insert(interface.name.to_ascii_lowercase()) {
                out.push(interface.name.clone());
            }
            self.collect_interfaces(interface, out, seen, visiting)?;
        }

        visiting.pop();
        Ok(())
    }

    /// Own methods, then trait methods, skipping names already present
    fn collect_methods(
        &self,
        decl: &ClassDecl,
        out: &mut Vec<MethodDescriptor>,
        visiting: &mut Vec<String>,
    ) -> Result<(), ReflectionError> {
        let key = decl.name.to_ascii_lowercase();
        if visiting.contains(&key) {
            return Err(self.fatal(format!("Recursive trait use through {}", decl.name)));
        }
        visiting.push(key);

        for method in &decl.methods {
            if !out.iter().any(|m| m.name.eq_ignore_ascii_case(&method.name)) {
                out.push(method.to_descriptor());
            }
        }

        for name in &decl.traits {
            let used = self.expect_kind(decl, name, ClassKind::Trait)?;
            self.collect_methods(used, out, visiting)?;
        }

        visiting.pop();
        Ok(())
    }
}
