//! Shared helpers for the integration tests.
//!
//! [`parse`] is a small YANG text reader: a logos lexer for keywords,
//! unquoted and quoted arguments and comments, and a recursive statement
//! builder on top that handles `+` concatenation and nested blocks. It
//! panics on malformed input, which is fine for hand-written fixtures.

#![allow(dead_code)]

use logos::Logos;
use yang_model::{EffectiveModelContext, QName, QNameModule, StatementSourceReference};
use yang_reactor::{RawStatement, ReactorConfig, ReactorError, StatementStreamSource};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum Token {
    #[token(";")]
    Semicolon,
    #[token("{")]
    Open,
    #[token("}")]
    Close,
    /// String concatenation.
    #[token("+", priority = 3)]
    Plus,
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(strip_quotes(lex.slice())))]
    #[regex(r"'[^']*'", |lex| strip_quotes(lex.slice()).to_string())]
    Quoted(String),
    /// Keyword or unquoted argument.
    #[regex(r#"[^ \t\r\n;{}"']+"#, |lex| lex.slice().to_string())]
    Word(String),
}

fn strip_quotes(slice: &str) -> &str {
    &slice[1..slice.len() - 1]
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}

/// Tokens of `text` with their 1-based line and column.
fn tokenize(name: &str, text: &str) -> Vec<(Token, u32, u32)> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices('\n').map(|(at, _)| at + 1))
        .collect();
    Token::lexer(text)
        .spanned()
        .map(|(token, span)| {
            let line = line_starts.partition_point(|start| *start <= span.start);
            let column = text[line_starts[line - 1]..span.start].chars().count() + 1;
            match token {
                Ok(token) => (token, line as u32, column as u32),
                Err(()) => panic!("{name}:{line}:{column}: unexpected input {:?}", &text[span]),
            }
        })
        .collect()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, u32, u32)>,
    pos: usize,
}

impl Parser<'_> {
    fn next(&mut self) -> (Token, u32, u32) {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| panic!("{}: unexpected end of input", self.source));
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _, _)| token)
    }

    fn argument(&mut self) -> Option<String> {
        match self.peek()? {
            Token::Word(_) => match self.next().0 {
                Token::Word(word) => Some(word),
                _ => unreachable!(),
            },
            Token::Quoted(_) => {
                let mut text = String::new();
                loop {
                    match self.next().0 {
                        Token::Quoted(part) => text.push_str(&part),
                        other => panic!("{}: expected string, found {other:?}", self.source),
                    }
                    if self.peek() != Some(&Token::Plus) {
                        return Some(text);
                    }
                    self.pos += 1;
                }
            }
            _ => None,
        }
    }

    fn statement(&mut self) -> RawStatement {
        let (keyword, line, column) = match self.next() {
            (Token::Word(keyword), line, column) => (keyword, line, column),
            (other, line, _) => panic!("{}:{line}: expected keyword, found {other:?}", self.source),
        };
        let argument = self.argument();
        let mut statement = RawStatement::new(
            keyword,
            argument.as_deref(),
            StatementSourceReference::new(self.source, line, column),
        );
        match self.next() {
            (Token::Semicolon, _, _) => {}
            (Token::Open, _, _) => {
                while self.peek() != Some(&Token::Close) {
                    let child = self.statement();
                    statement = statement.with_substatement(child);
                }
                self.pos += 1;
            }
            (other, line, _) => panic!("{}:{line}: expected ';' or '{{', found {other:?}", self.source),
        }
        statement
    }
}

/// Parse one YANG source text.
pub fn parse(name: &str, text: &str) -> StatementStreamSource {
    let mut parser = Parser {
        source: name,
        tokens: tokenize(name, text),
        pos: 0,
    };
    let root = parser.statement();
    assert!(parser.peek().is_none(), "{name}: trailing input after root statement");
    StatementStreamSource::new(name, root)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build `(name, text)` sources with `config`.
pub fn build_with(config: ReactorConfig, sources: &[(&str, &str)]) -> Result<EffectiveModelContext, ReactorError> {
    init_tracing();
    yang_rfc7950::default_reactor()
        .new_build()
        .add_sources(sources.iter().map(|(name, text)| parse(name, text)))
        .with_config(config)
        .build()
}

pub fn build(sources: &[(&str, &str)]) -> Result<EffectiveModelContext, ReactorError> {
    build_with(ReactorConfig::default(), sources)
}

/// Helper for tests that expect success.
pub fn build_ok(sources: &[(&str, &str)]) -> EffectiveModelContext {
    match build(sources) {
        Ok(model) => model,
        Err(err) => panic!("build should succeed, got: {err}"),
    }
}

/// Helper for tests that expect failure; returns the individual causes.
pub fn build_err(sources: &[(&str, &str)]) -> Vec<ReactorError> {
    expect_failure(build(sources))
}

pub fn expect_failure(result: Result<EffectiveModelContext, ReactorError>) -> Vec<ReactorError> {
    match result {
        Ok(_) => panic!("expected build failure, but it succeeded"),
        Err(err) => err.causes().into_iter().cloned().collect(),
    }
}

/// Config supporting exactly `features`.
pub fn with_features(features: impl IntoIterator<Item = QName>) -> ReactorConfig {
    ReactorConfig {
        supported_features: Some(features.into_iter().collect()),
        ..ReactorConfig::default()
    }
}

pub fn qname(namespace: &str, local_name: &str) -> QName {
    QName::create(QNameModule::new(namespace, None), local_name).unwrap()
}
