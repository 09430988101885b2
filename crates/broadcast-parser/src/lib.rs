//! Broadcast PHP Source Reader
//!
//! Reads PHP sources just deeply enough to discover listeners. This crate provides:
//! - A chumsky-based tokenizer and declaration parser (classes, interfaces, traits, enums)
//! - Namespace and import aware name resolution
//! - Composer-style class location (classmap and PSR-4)
//! - Directory enumeration and structural reflection behind the
//!   `broadcast-core` collaborator traits
//!
//! Method bodies are never interpreted; only declarations are extracted.

pub mod ast;
pub mod builtin;
pub mod enumerator;
pub mod error;
pub mod lexer;
pub mod locator;
pub mod names;
pub mod parser;
pub mod reflector;

// Re-export main types for convenience
pub use ast::{ClassDecl, ClassKind, MethodDecl, ParamDecl, SourceFile};
pub use enumerator::{is_php_file, php_files, DirectoryClassEnumerator};
pub use error::{LocatorError, ParseError, ParseResult};
pub use locator::ComposerLocator;
pub use names::NameContext;
pub use parser::parse_source;
pub use reflector::SourceReflector;
