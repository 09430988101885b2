//! Declaration parser
//!
//! Extracts class-like declarations, their ancestry and their method
//! signatures from the token stream of one file. The grammar accepts any
//! token sequence: function and method bodies are skipped as balanced
//! groups, and structural problems (stray or missing braces, malformed
//! headers) are reported when the parsed items are resolved against the
//! namespace and imports in effect.

use broadcast_core::Visibility;
use chumsky::extra;
use chumsky::prelude::*;
use chumsky::select;

use crate::ast::{ClassDecl, ClassKind, MethodDecl, ParamDecl, SourceFile};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Token};
use crate::names::NameContext;

type Tokens<'src> = &'src [Token];

/// Extra type for token-level parsers
type Extra<'src> = extra::Err<Rich<'src, Token>>;

/// Parse a PHP source file into its declarations
pub fn parse_source(source: &str) -> ParseResult<SourceFile> {
    let (tokens, lines): (Vec<Token>, Vec<usize>) = tokenize(source)?.into_iter().unzip();
    let items = file()
        .parse(tokens.as_slice())
        .into_result()
        .map_err(|errs| syntax_error(&errs, &lines))?;
    Resolver::new(&lines).run(&items)
}

fn syntax_error(errs: &[Rich<'_, Token>], lines: &[usize]) -> ParseError {
    let Some(e) = errs.first() else {
        return ParseError::new(1, "invalid syntax");
    };
    let found = e
        .found()
        .map_or("end of file".to_string(), |t| format!("'{}'", t));
    ParseError::new(
        line_at(lines, e.span().start),
        format!("{} (found {})", e.reason(), found),
    )
}

/// Line of the token at `index`, or of the last token past the end
fn line_at(lines: &[usize], index: usize) -> usize {
    lines.get(index).or(lines.last()).copied().unwrap_or(1)
}

// ============================================================================
// Parsed items (names as written, before resolution)
// ============================================================================

#[derive(Debug, Clone)]
enum Item {
    /// `namespace X;` (no body) or `namespace [X] { ... }`
    Namespace {
        name: Option<String>,
        body: Option<Block>,
    },
    /// Imports of one `use` statement
    Use(Vec<(String, Option<String>)>),
    Class(RawClass),
    Block(Block),
    /// `}` without a matching `{`
    Stray(usize),
    Malformed {
        at: usize,
        message: &'static str,
    },
    Other,
}

#[derive(Debug, Clone)]
struct Block {
    items: Vec<Item>,
    closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassModifier {
    Abstract,
    Final,
    Readonly,
}

#[derive(Debug, Clone)]
enum Clause {
    Extends(Vec<String>),
    Implements(Vec<String>),
    Unexpected(usize),
}

#[derive(Debug, Clone)]
struct RawClass {
    kind: ClassKind,
    /// Token index of the declaring keyword
    at: usize,
    name: String,
    modifiers: Vec<ClassModifier>,
    clauses: Vec<Clause>,
    members: Vec<Member>,
    closed: bool,
}

#[derive(Debug, Clone)]
enum Member {
    Method(RawMethod),
    Traits(Vec<String>),
    Malformed(usize),
    Unexpected(usize),
    Skipped,
}

#[derive(Debug, Clone, Copy)]
enum Modifier {
    Visibility(Visibility),
    Static,
    Abstract,
    Final,
    Readonly,
}

#[derive(Debug, Clone)]
struct RawMethod {
    at: usize,
    name: String,
    modifiers: Vec<Modifier>,
    params: Vec<RawParam>,
}

#[derive(Debug, Clone)]
enum TypePart {
    Name(String),
    Symbol(char),
}

#[derive(Debug, Clone)]
struct RawParam {
    name: String,
    type_parts: Vec<TypePart>,
    by_ref: bool,
    variadic: bool,
    has_default: bool,
}

// ============================================================================
// Token primitives
// ============================================================================

fn punct<'src>(c: char) -> impl Parser<'src, Tokens<'src>, Token, Extra<'src>> + Clone {
    just(Token::Punct(c))
}

/// Case-insensitive keyword
fn kw<'src>(word: &'static str) -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    any().filter(move |t: &Token| t.is_name(word)).ignored()
}

fn name<'src>() -> impl Parser<'src, Tokens<'src>, String, Extra<'src>> + Clone {
    select! { Token::Name(name) => name }
}

fn name_list<'src>() -> impl Parser<'src, Tokens<'src>, Vec<String>, Extra<'src>> + Clone {
    name()
        .separated_by(punct(','))
        .at_least(1)
        .collect::<Vec<_>>()
}

/// Any token that does not open or close a group
fn leaf<'src>() -> impl Parser<'src, Tokens<'src>, Token, Extra<'src>> + Clone {
    any().filter(|t: &Token| !t.is_bracket())
}

/// Balanced `(...)`, `[...]`, `#[...]` or `{...}`
fn group<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    recursive(|group| {
        let inner = group.or(leaf().ignored()).repeated();
        choice((
            punct('(').ignore_then(inner.clone()).then_ignore(punct(')')),
            punct('[').ignore_then(inner.clone()).then_ignore(punct(']')),
            just(Token::AttributeStart)
                .ignore_then(inner.clone())
                .then_ignore(punct(']')),
            punct('{').ignore_then(inner).then_ignore(punct('}')),
        ))
    })
}

fn unit<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    group().or(leaf().ignored())
}

fn skip_block<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    punct('{')
        .ignore_then(unit().repeated())
        .then_ignore(punct('}'))
}

fn skip_attribute<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    just(Token::AttributeStart)
        .ignore_then(unit().repeated())
        .then_ignore(punct(']'))
}

/// Balanced group other than a `{ ... }` block
fn inline_group<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    choice((
        punct('(')
            .ignore_then(unit().repeated())
            .then_ignore(punct(')')),
        punct('[')
            .ignore_then(unit().repeated())
            .then_ignore(punct(']')),
        skip_attribute(),
    ))
}

/// Everything up to and including the next `;` outside of brackets
fn skip_statement<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    choice((group(), leaf().filter(|t: &Token| !t.is_punct(';')).ignored()))
        .repeated()
        .then_ignore(punct(';'))
}

/// A member declaration ending in `;` or a block (bodies, property hooks)
fn skip_declaration<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    choice((
        inline_group(),
        leaf().filter(|t: &Token| !t.is_punct(';')).ignored(),
    ))
    .repeated()
    .ignore_then(choice((punct(';').ignored(), skip_block())))
}

/// `}`, or `false` when the file ends first
fn closing<'src>() -> impl Parser<'src, Tokens<'src>, bool, Extra<'src>> + Clone {
    punct('}').to(true).or(end().to(false))
}

// ============================================================================
// File structure
// ============================================================================

fn file<'src>() -> impl Parser<'src, Tokens<'src>, Vec<Item>, Extra<'src>> {
    let stray = punct('}').map_with(|_, e| Item::Stray(e.span().start));

    choice((namespace(), namespace_item(), stray))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}

fn block<'src>(
    item: impl Parser<'src, Tokens<'src>, Item, Extra<'src>> + Clone,
) -> impl Parser<'src, Tokens<'src>, Block, Extra<'src>> + Clone {
    punct('{')
        .ignore_then(item.repeated().collect::<Vec<_>>())
        .then(closing())
        .map(|(items, closed)| Block { items, closed })
}

fn namespace<'src>() -> impl Parser<'src, Tokens<'src>, Item, Extra<'src>> + Clone {
    let statement = kw("namespace")
        .ignore_then(name())
        .then_ignore(punct(';'))
        .map(|name| Item::Namespace {
            name: Some(name),
            body: None,
        });

    let braced = kw("namespace")
        .ignore_then(name().or_not())
        .then(block(namespace_item()))
        .map(|(name, body)| Item::Namespace {
            name,
            body: Some(body),
        });

    let malformed = kw("namespace")
        .then(name())
        .map_with(|_, e| Item::Malformed {
            at: e.span().start,
            message: "malformed namespace declaration",
        });

    choice((statement, braced, malformed))
}

/// Item at namespace level, where `use` imports are legal
fn namespace_item<'src>() -> impl Parser<'src, Tokens<'src>, Item, Extra<'src>> + Clone {
    use_statement().or(inner_item())
}

fn inner_item<'src>() -> impl Parser<'src, Tokens<'src>, Item, Extra<'src>> + Clone {
    recursive(|inner_item| {
        // Foo::class, $object->class, new class
        let member_access = choice((
            just(Token::DoubleColon).ignored(),
            punct('-').then(punct('>')).ignored(),
            kw("new"),
        ))
        .then(name());

        choice((
            class_decl(),
            skip_attribute().to(Item::Other),
            block(inner_item).map(Item::Block),
            member_access.to(Item::Other),
            any()
                .filter(|t: &Token| !t.is_punct('{') && !t.is_punct('}'))
                .to(Item::Other),
        ))
    })
}

fn use_statement<'src>() -> impl Parser<'src, Tokens<'src>, Item, Extra<'src>> + Clone {
    let alias = kw("as").ignore_then(name()).or_not();
    let skipped = kw("function").or(kw("const"));

    let group_entry = skipped
        .clone()
        .or_not()
        .then(name())
        .then(alias.clone())
        .map(|((skip, name), alias)| skip.is_none().then_some((name, alias)));

    let clause = choice((
        name()
            .filter(|prefix: &String| prefix.ends_with('\\'))
            .then(
                group_entry
                    .separated_by(punct(','))
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(punct('{'), punct('}')),
            )
            .map(|(prefix, entries)| {
                entries
                    .into_iter()
                    .flatten()
                    .map(|(name, alias)| (format!("{prefix}{name}"), alias))
                    .collect::<Vec<_>>()
            }),
        name().then(alias).map(|import| vec![import]),
    ));

    let imports = kw("use")
        .ignore_then(
            clause
                .separated_by(punct(','))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(punct(';'))
        .map(|clauses| Item::Use(clauses.into_iter().flatten().collect()));

    let functions = kw("use")
        .ignore_then(skipped)
        .ignore_then(skip_statement())
        .to(Item::Use(Vec::new()));

    let malformed = kw("use")
        .ignore_then(name().rewind())
        .ignore_then(skip_statement())
        .map_with(|_, e| Item::Malformed {
            at: e.span().start,
            message: "malformed use statement",
        });

    choice((functions, imports, malformed))
}

// ============================================================================
// Class-like declarations
// ============================================================================

fn class_decl<'src>() -> impl Parser<'src, Tokens<'src>, Item, Extra<'src>> + Clone {
    let modifiers = choice((
        kw("abstract").to(ClassModifier::Abstract),
        kw("final").to(ClassModifier::Final),
        kw("readonly").to(ClassModifier::Readonly),
    ))
    .repeated()
    .collect::<Vec<_>>();

    let keyword = choice((
        kw("class").to(ClassKind::Class),
        kw("interface").to(ClassKind::Interface),
        kw("trait").to(ClassKind::Trait),
    ))
    .map_with(|kind, e| (kind, e.span().start))
    .then(name());

    // `enum` is a soft keyword
    let enum_keyword = kw("enum")
        .map_with(|_, e| (ClassKind::Enum, e.span().start))
        .then(name())
        .then_ignore(
            choice((punct('{').ignored(), punct(':').ignored(), kw("implements"))).rewind(),
        )
        .then_ignore(punct(':').then(name()).or_not());

    let clause = choice((
        kw("extends").ignore_then(name_list()).map(Clause::Extends),
        kw("implements")
            .ignore_then(name_list())
            .map(Clause::Implements),
        any::<Tokens<'src>, Extra<'src>>()
            .filter(|t: &Token| !matches!(t, Token::Punct('{' | ';' | '}')))
            .map_with(|_, e| Clause::Unexpected(e.span().start)),
    ));

    let body = punct('{')
        .ignore_then(member().repeated().collect::<Vec<_>>())
        .then(closing());

    modifiers
        .then(keyword.or(enum_keyword))
        .then(clause.repeated().collect::<Vec<_>>())
        .then(body)
        .map(
            |(((modifiers, ((kind, at), name)), clauses), (members, closed))| {
                Item::Class(RawClass {
                    kind,
                    at,
                    name,
                    modifiers,
                    clauses,
                    members,
                    closed,
                })
            },
        )
}

fn member<'src>() -> impl Parser<'src, Tokens<'src>, Member, Extra<'src>> + Clone {
    let trait_use = kw("use")
        .ignore_then(name_list())
        .then_ignore(choice((skip_block(), punct(';').ignored())))
        .map(Member::Traits);

    let malformed_method = member_modifiers()
        .ignore_then(kw("function"))
        .ignore_then(skip_declaration())
        .map_with(|_, e| Member::Malformed(e.span().start));

    choice((
        punct(';').to(Member::Skipped),
        skip_attribute().to(Member::Skipped),
        trait_use,
        method().map(Member::Method),
        malformed_method,
        // properties, constants, enum cases
        skip_declaration().to(Member::Skipped),
        any::<Tokens<'src>, Extra<'src>>()
            .filter(|t: &Token| !t.is_punct('}'))
            .map_with(|_, e| Member::Unexpected(e.span().start)),
    ))
}

/// `(set)` of asymmetric visibility
fn set_visibility<'src>() -> impl Parser<'src, Tokens<'src>, (), Extra<'src>> + Clone {
    punct('(')
        .then(kw("set"))
        .then(punct(')'))
        .ignored()
}

fn member_modifiers<'src>() -> impl Parser<'src, Tokens<'src>, Vec<Modifier>, Extra<'src>> + Clone
{
    choice((
        kw("public")
            .or(kw("var"))
            .to(Modifier::Visibility(Visibility::Public)),
        kw("protected").to(Modifier::Visibility(Visibility::Protected)),
        kw("private").to(Modifier::Visibility(Visibility::Private)),
        kw("static").to(Modifier::Static),
        kw("abstract").to(Modifier::Abstract),
        kw("final").to(Modifier::Final),
        kw("readonly").to(Modifier::Readonly),
    ))
    .then_ignore(set_visibility().or_not())
    .repeated()
    .collect::<Vec<_>>()
}

fn method<'src>() -> impl Parser<'src, Tokens<'src>, RawMethod, Extra<'src>> + Clone {
    let params = param()
        .separated_by(punct(','))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(punct('('), punct(')'));

    member_modifiers()
        .then(kw("function").map_with(|_, e| e.span().start))
        .then_ignore(punct('&').or_not())
        .then(name())
        .then(params)
        // return type, then a body or `;`
        .then_ignore(skip_declaration())
        .map(|(((modifiers, at), name), params)| RawMethod {
            at,
            name,
            modifiers,
            params,
        })
}

fn param<'src>() -> impl Parser<'src, Tokens<'src>, RawParam, Extra<'src>> + Clone {
    let promotion = choice((
        kw("public"),
        kw("protected"),
        kw("private"),
        kw("readonly"),
    ))
    .then_ignore(set_visibility().or_not());

    // `&$x` / `&...$x` is by-reference, `A&B` is an intersection
    let by_ref_target = choice((
        select! { Token::Variable(_) => () },
        just(Token::Ellipsis).ignored(),
    ));

    let type_part = choice((
        name().map(TypePart::Name),
        punct('&')
            .then_ignore(by_ref_target.not())
            .to(TypePart::Symbol('&')),
        select! { Token::Punct(c @ ('?' | '|' | '(' | ')')) => TypePart::Symbol(c) },
    ));

    let default_value = choice((
        group(),
        leaf().filter(|t: &Token| !t.is_punct(',')).ignored(),
    ))
    .repeated();

    skip_attribute()
        .repeated()
        .ignore_then(promotion.repeated())
        .ignore_then(type_part.repeated().collect::<Vec<_>>())
        .then(punct('&').or_not().map(|r| r.is_some()))
        .then(just(Token::Ellipsis).or_not().map(|v| v.is_some()))
        .then(select! { Token::Variable(name) => name })
        .then(
            punct('=')
                .ignore_then(default_value)
                .or_not()
                .map(|d| d.is_some()),
        )
        .map(
            |((((type_parts, by_ref), variadic), name), has_default)| RawParam {
                name,
                type_parts,
                by_ref,
                variadic,
                has_default,
            },
        )
}

// ============================================================================
// Resolution
// ============================================================================

/// Walks parsed items in source order, tracking namespace and imports
struct Resolver<'a> {
    lines: &'a [usize],
    names: NameContext,
    classes: Vec<ClassDecl>,
}

impl<'a> Resolver<'a> {
    fn new(lines: &'a [usize]) -> Self {
        Self {
            lines,
            names: NameContext::default(),
            classes: Vec::new(),
        }
    }

    fn run(mut self, items: &[Item]) -> ParseResult<SourceFile> {
        self.items(items)?;
        Ok(SourceFile {
            classes: self.classes,
        })
    }

    fn line(&self, index: usize) -> usize {
        line_at(self.lines, index)
    }

    fn items(&mut self, items: &[Item]) -> ParseResult<()> {
        for item in items {
            match item {
                Item::Namespace { name, body: None } => {
                    self.names.enter_namespace(name.as_deref().unwrap_or_default());
                }
                Item::Namespace {
                    name,
                    body: Some(body),
                } => {
                    self.names.enter_namespace(name.as_deref().unwrap_or_default());
                    self.block(body)?;
                    self.names.enter_namespace("");
                }
                Item::Use(imports) => {
                    for (name, alias) in imports {
                        self.names.import(name, alias.as_deref());
                    }
                }
                Item::Class(class) => self.class(class)?,
                Item::Block(block) => self.block(block)?,
                Item::Stray(at) => return Err(ParseError::new(self.line(*at), "unmatched '}'")),
                Item::Malformed { at, message } => {
                    return Err(ParseError::new(self.line(*at), *message))
                }
                Item::Other => {}
            }
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> ParseResult<()> {
        if !block.closed {
            let line = self.lines.last().copied().unwrap_or(1);
            return Err(ParseError::new(line, "unclosed '{' at end of file"));
        }
        self.items(&block.items)
    }

    fn resolve_all(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|n| self.names.resolve_class(n)).collect()
    }

    fn class(&mut self, raw: &RawClass) -> ParseResult<()> {
        let line = self.line(raw.at);
        let mut decl = ClassDecl::new(self.names.declare(&raw.name), raw.kind, line);
        if !raw.closed {
            return Err(ParseError::new(
                line,
                format!("unclosed body of {} {}", raw.kind.as_str(), decl.name),
            ));
        }
        decl.is_abstract = raw.modifiers.contains(&ClassModifier::Abstract);
        decl.is_final = raw.modifiers.contains(&ClassModifier::Final);

        for clause in &raw.clauses {
            match clause {
                Clause::Extends(names) => {
                    let names = self.resolve_all(names);
                    match raw.kind {
                        ClassKind::Class if names.len() == 1 => {
                            decl.parent = names.into_iter().next()
                        }
                        ClassKind::Interface => decl.interfaces.extend(names),
                        _ => {
                            return Err(ParseError::new(
                                line,
                                format!(
                                    "invalid extends clause on {} {}",
                                    raw.kind.as_str(),
                                    decl.name
                                ),
                            ))
                        }
                    }
                }
                Clause::Implements(names) => {
                    let names = self.resolve_all(names);
                    decl.interfaces.extend(names);
                }
                Clause::Unexpected(at) => {
                    return Err(ParseError::new(
                        self.line(*at),
                        format!("unexpected token in declaration of {}", decl.name),
                    ))
                }
            }
        }

        let in_interface = raw.kind == ClassKind::Interface;
        for member in &raw.members {
            match member {
                Member::Method(method) => decl.methods.push(self.method(method, in_interface)),
                Member::Traits(names) => {
                    let names = self.resolve_all(names);
                    decl.traits.extend(names);
                }
                Member::Malformed(at) => {
                    return Err(ParseError::new(
                        self.line(*at),
                        format!("malformed method declaration in {}", decl.name),
                    ))
                }
                Member::Unexpected(at) => {
                    return Err(ParseError::new(
                        self.line(*at),
                        format!("unexpected token in body of {}", decl.name),
                    ))
                }
                Member::Skipped => {}
            }
        }

        self.classes.push(decl);
        Ok(())
    }

    fn method(&self, raw: &RawMethod, in_interface: bool) -> MethodDecl {
        let mut visibility = None;
        let mut is_static = false;
        let mut is_abstract = in_interface;
        for modifier in &raw.modifiers {
            match modifier {
                Modifier::Visibility(v) => {
                    visibility.get_or_insert(*v);
                }
                Modifier::Static => is_static = true,
                Modifier::Abstract => is_abstract = true,
                Modifier::Final | Modifier::Readonly => {}
            }
        }

        MethodDecl {
            name: raw.name.clone(),
            visibility: visibility.unwrap_or_default(),
            is_static,
            is_abstract,
            params: raw.params.iter().map(|p| self.param(p)).collect(),
            line: self.line(raw.at),
        }
    }

    fn param(&self, raw: &RawParam) -> ParamDecl {
        let rendered: String = raw
            .type_parts
            .iter()
            .map(|part| match part {
                TypePart::Name(name) => self.names.resolve_type(name),
                TypePart::Symbol(c) => c.to_string(),
            })
            .collect();

        ParamDecl {
            name: raw.name.clone(),
            type_hint: (!rendered.is_empty()).then_some(rendered),
            by_ref: raw.by_ref,
            variadic: raw.variadic,
            has_default: raw.has_default,
        }
    }
}
