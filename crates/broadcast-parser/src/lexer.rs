//! PHP tokenizer
//!
//! Produces just enough structure for declaration parsing: names, variables,
//! punctuation and opaque literals. Comments, inline HTML and string contents
//! are dropped; `?>` is reported as a statement terminator and
//! `__halt_compiler` ends the token stream.

use std::fmt;

use chumsky::extra;
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::error::{ParseError, ParseResult};

/// Extra type for character-level parsers - uses Rich errors for better messages
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Identifier, keyword or (qualified) name
    Name(String),
    /// `$name`, without the `$`
    Variable(String),
    /// String literal of any flavour
    Str,
    Number,
    /// `::`
    DoubleColon,
    /// `...`
    Ellipsis,
    /// `#[`
    AttributeStart,
    Punct(char),
}

impl Token {
    /// Name token matching `word` case-insensitively
    pub fn is_name(&self, word: &str) -> bool {
        matches!(self, Token::Name(name) if name.eq_ignore_ascii_case(word))
    }

    pub fn is_punct(&self, c: char) -> bool {
        *self == Token::Punct(c)
    }

    /// Opens or closes a bracketed group
    pub fn is_bracket(&self) -> bool {
        matches!(
            self,
            Token::AttributeStart | Token::Punct('(' | ')' | '[' | ']' | '{' | '}')
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "{name}"),
            Token::Variable(name) => write!(f, "${name}"),
            Token::Str => write!(f, "string literal"),
            Token::Number => write!(f, "number"),
            Token::DoubleColon => write!(f, "::"),
            Token::Ellipsis => write!(f, "..."),
            Token::AttributeStart => write!(f, "#["),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// A token with the 1-based line it starts on
pub type Spanned = (Token, usize);

/// Outcome of one lexer step
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Token(Token),
    /// Whitespace, comments and inline HTML
    Trivia,
    /// Literal or comment running into the end of input
    Unterminated(&'static str),
    /// Nothing after `__halt_compiler` is source code
    Halt,
}

/// Tokenize a PHP source file
pub fn tokenize(source: &str) -> ParseResult<Vec<Spanned>> {
    let lexemes = lexer()
        .parse(source)
        .into_result()
        .map_err(|errs| lex_error(&errs, source))?;

    let lines = LineIndex::new(source);
    let mut tokens = Vec::with_capacity(lexemes.len());
    for (lexeme, span) in lexemes {
        let line = lines.line(span.start);
        match lexeme {
            Lexeme::Token(token) => tokens.push((token, line)),
            Lexeme::Trivia => {}
            Lexeme::Unterminated(what) => {
                return Err(ParseError::new(line, format!("unterminated {what}")))
            }
            Lexeme::Halt => break,
        }
    }
    Ok(tokens)
}

fn lex_error(errs: &[Rich<'_, char>], source: &str) -> ParseError {
    let Some(e) = errs.first() else {
        return ParseError::new(1, "invalid source");
    };
    let found = e
        .found()
        .map_or("end of input".to_string(), |c| format!("'{}'", c));
    ParseError::new(
        LineIndex::new(source).line(e.span().start),
        format!("{} (found {})", e.reason(), found),
    )
}

/// Byte offset to line number lookup
struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        Self {
            newlines: source.match_indices('\n').map(|(i, _)| i).collect(),
        }
    }

    fn line(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&n| n < offset) + 1
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c as u32 >= 0x80
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

// ============================================================================
// Lexer
// ============================================================================

fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<(Lexeme, SimpleSpan)>, Extra<'src>> {
    let whitespace = any()
        .filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .to(Lexeme::Trivia);

    let close_tag = just("?>")
        .ignore_then(inline_html())
        .to(Lexeme::Token(Token::Punct(';')));

    let line_comment = just("//")
        .or(just("#").then_ignore(just('[').not()))
        .ignore_then(none_of("\n").and_is(just("?>").not()).repeated())
        .to(Lexeme::Trivia);

    let block_comment = just("/*")
        .ignore_then(any().and_is(just("*/").not()).repeated())
        .ignore_then(closing(just("*/")))
        .map(|closed| if closed { Lexeme::Trivia } else { Lexeme::Unterminated("comment") });

    let halt = name()
        .filter(|name: &String| name.eq_ignore_ascii_case("__halt_compiler"))
        .ignore_then(any().repeated())
        .to(Lexeme::Halt);

    let token = choice((
        just("#[").to(Token::AttributeStart),
        just("::").to(Token::DoubleColon),
        just("...").to(Token::Ellipsis),
        just('$')
            .ignore_then(ident())
            .map(|s: &str| Token::Variable(s.to_string())),
        number(),
        name().map(Token::Name),
        any().map(Token::Punct),
    ));

    let lexeme = choice((
        whitespace,
        close_tag,
        line_comment,
        block_comment,
        single_quoted().map(|closed| literal(closed, "string")),
        double_quoted().map(|closed| literal(closed, "string")),
        backtick().map(|closed| literal(closed, "string")),
        heredoc(),
        halt,
        token.map(Lexeme::Token),
    ))
    .map_with(|lexeme, e| (lexeme, e.span()));

    inline_html()
        .ignore_then(lexeme.repeated().collect::<Vec<_>>())
        .then_ignore(end())
}

fn literal(closed: bool, what: &'static str) -> Lexeme {
    if closed {
        Lexeme::Token(Token::Str)
    } else {
        Lexeme::Unterminated(what)
    }
}

/// `close`, or `false` when the input ends first
fn closing<'src, O>(
    close: impl Parser<'src, &'src str, O, Extra<'src>> + Clone,
) -> impl Parser<'src, &'src str, bool, Extra<'src>> + Clone {
    close.to(true).or(end().to(false))
}

/// `<?php`, `<?=` or a short open tag
fn open_tag<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    just("<?").ignore_then(choice((
        one_of("pP")
            .then(one_of("hH"))
            .then(one_of("pP"))
            .ignored(),
        just('=').ignored(),
        one_of(" \t\r\n").ignored(),
    )))
}

/// Everything up to and including the next open tag
fn inline_html<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    any()
        .and_is(open_tag().not())
        .repeated()
        .ignore_then(open_tag().or(end()))
}

fn ident<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| is_ident_start(*c))
        .then(any().filter(|c: &char| is_ident_char(*c)).repeated())
        .to_slice()
        .labelled("identifier")
}

/// Identifier or qualified name; keeps a trailing `\` before `{` for group imports
fn name<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    just('\\')
        .or_not()
        .then(ident())
        .then(just('\\').then(ident()).repeated())
        .then(just('\\').then(just('{').rewind()).or_not())
        .to_slice()
        .map(|s: &str| s.to_string())
        .labelled("name")
}

fn number<'src>() -> impl Parser<'src, &'src str, Token, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_digit())
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
                .repeated(),
        )
        .to(Token::Number)
        .labelled("number")
}

fn single_quoted<'src>() -> impl Parser<'src, &'src str, bool, Extra<'src>> + Clone {
    just('\'')
        .ignore_then(
            choice((
                just('\\').then(any().or_not()).ignored(),
                none_of("\\'").ignored(),
            ))
            .repeated(),
        )
        .ignore_then(closing(just('\'')))
        .labelled("single-quoted string")
}

fn double_quoted<'src>() -> impl Parser<'src, &'src str, bool, Extra<'src>> + Clone {
    recursive(|double_quoted| interpolated('"', "\\\"", double_quoted))
        .labelled("double-quoted string")
}

fn backtick<'src>() -> impl Parser<'src, &'src str, bool, Extra<'src>> + Clone {
    interpolated('`', "\\`", double_quoted()).labelled("shell command")
}

/// String with `{$...}` interpolation; `plain` lists the characters that
/// end a run of literal text
fn interpolated<'src>(
    quote: char,
    plain: &'static str,
    nested: impl Parser<'src, &'src str, bool, Extra<'src>> + Clone + 'src,
) -> impl Parser<'src, &'src str, bool, Extra<'src>> + Clone {
    let expression = recursive(|expression| {
        just('{')
            .ignore_then(
                choice((
                    single_quoted().ignored(),
                    nested.ignored(),
                    expression,
                    none_of("{}'\"").ignored(),
                ))
                .repeated(),
            )
            .then_ignore(just('}'))
    });

    just(quote)
        .ignore_then(
            choice((
                just("{$").rewind().ignore_then(expression),
                just('\\').then(any().or_not()).ignored(),
                none_of(plain).ignored(),
            ))
            .repeated(),
        )
        .ignore_then(closing(just(quote)))
}

/// Heredoc or nowdoc; the closing label may be indented
fn heredoc<'src>() -> impl Parser<'src, &'src str, Lexeme, Extra<'src>> + Clone {
    just("<<<").ignore_then(custom::<_, &'src str, _, Extra<'src>>(|inp| {
        let before = inp.cursor();
        while matches!(inp.peek(), Some(' ' | '\t')) {
            inp.next();
        }

        let quote = match inp.peek() {
            Some(q @ ('\'' | '"')) => {
                inp.next();
                Some(q)
            }
            _ => None,
        };
        let mut label = String::new();
        while let Some(c) = inp.peek().filter(|c| is_ident_char(*c)) {
            label.push(c);
            inp.next();
        }
        if label.is_empty() || quote.is_some_and(|q| inp.next() != Some(q)) {
            return Err(Rich::custom(inp.span_since(&before), "heredoc without label"));
        }

        loop {
            loop {
                match inp.next() {
                    None => return Ok(Lexeme::Unterminated("heredoc")),
                    Some('\n') => break,
                    Some(_) => {}
                }
            }
            while matches!(inp.peek(), Some(' ' | '\t')) {
                inp.next();
            }
            let closes = label.chars().all(|c| {
                if inp.peek() == Some(c) {
                    inp.next();
                    true
                } else {
                    false
                }
            });
            if closes && !inp.peek().is_some_and(is_ident_char) {
                return Ok(Lexeme::Token(Token::Str));
            }
        }
    }))
}
