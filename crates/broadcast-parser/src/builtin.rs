//! Classes and interfaces provided by the PHP runtime
//!
//! These never have a source file in a project, yet listeners commonly
//! implement or extend them. Each entry lists its direct parent and the
//! interfaces it implements so ancestry walks can continue through them.

use std::sync::LazyLock;

use crate::ast::{ClassDecl, ClassKind};

struct Builtin {
    name: &'static str,
    kind: ClassKind,
    parent: Option<&'static str>,
    interfaces: &'static [&'static str],
    is_abstract: bool,
}

const fn interface(name: &'static str, extends: &'static [&'static str]) -> Builtin {
    Builtin {
        name,
        kind: ClassKind::Interface,
        parent: None,
        interfaces: extends,
        is_abstract: false,
    }
}

const fn class(
    name: &'static str,
    parent: Option<&'static str>,
    interfaces: &'static [&'static str],
) -> Builtin {
    Builtin {
        name,
        kind: ClassKind::Class,
        parent,
        interfaces,
        is_abstract: false,
    }
}

const BUILTINS: &[Builtin] = &[
    interface("Traversable", &[]),
    interface("Iterator", &["Traversable"]),
    interface("IteratorAggregate", &["Traversable"]),
    interface("ArrayAccess", &[]),
    interface("Countable", &[]),
    interface("Serializable", &[]),
    interface("JsonSerializable", &[]),
    interface("Stringable", &[]),
    interface("Throwable", &["Stringable"]),
    interface("UnitEnum", &[]),
    interface("BackedEnum", &["UnitEnum"]),
    interface("OuterIterator", &["Iterator"]),
    interface("RecursiveIterator", &["Iterator"]),
    interface("SeekableIterator", &["Iterator"]),
    interface("SplObserver", &[]),
    interface("SplSubject", &[]),
    interface("DateTimeInterface", &[]),
    class("stdClass", None, &[]),
    class("ArrayObject", None, &["IteratorAggregate", "ArrayAccess", "Serializable", "Countable"]),
    class("ArrayIterator", None, &["SeekableIterator", "ArrayAccess", "Serializable", "Countable"]),
    class("SplObjectStorage", None, &["Countable", "Iterator", "Serializable", "ArrayAccess"]),
    class("DateTime", None, &["DateTimeInterface"]),
    class("DateTimeImmutable", None, &["DateTimeInterface"]),
    class("Exception", None, &["Throwable"]),
    class("Error", None, &["Throwable"]),
    class("ErrorException", Some("Exception"), &[]),
    class("LogicException", Some("Exception"), &[]),
    class("RuntimeException", Some("Exception"), &[]),
    class("InvalidArgumentException", Some("LogicException"), &[]),
    class("DomainException", Some("LogicException"), &[]),
    class("LengthException", Some("LogicException"), &[]),
    class("OutOfRangeException", Some("LogicException"), &[]),
    class("BadFunctionCallException", Some("LogicException"), &[]),
    class("BadMethodCallException", Some("BadFunctionCallException"), &[]),
    class("OutOfBoundsException", Some("RuntimeException"), &[]),
    class("OverflowException", Some("RuntimeException"), &[]),
    class("UnderflowException", Some("RuntimeException"), &[]),
    class("RangeException", Some("RuntimeException"), &[]),
    class("UnexpectedValueException", Some("RuntimeException"), &[]),
    class("TypeError", Some("Error"), &[]),
    class("ValueError", Some("Error"), &[]),
    class("ArithmeticError", Some("Error"), &[]),
    class("DivisionByZeroError", Some("ArithmeticError"), &[]),
    class("ArgumentCountError", Some("TypeError"), &[]),
    Builtin {
        name: "FilterIterator",
        kind: ClassKind::Class,
        parent: None,
        interfaces: &["OuterIterator"],
        is_abstract: true,
    },
];

static DECLARATIONS: LazyLock<Vec<ClassDecl>> = LazyLock::new(|| {
    BUILTINS
        .iter()
        .map(|b| {
            let mut decl = ClassDecl::new(b.name, b.kind, 0);
            decl.parent = b.parent.map(str::to_string);
            decl.interfaces = b.interfaces.iter().map(|i| i.to_string()).collect();
            decl.is_abstract = b.is_abstract;
            decl
        })
        .collect()
});

/// Declaration of a runtime-provided class, looked up case-insensitively
pub fn lookup(name: &str) -> Option<&'static ClassDecl> {
    let name = name.trim_start_matches('\\');
    DECLARATIONS
        .iter()
        .find(|decl| decl.name.eq_ignore_ascii_case(name))
}
