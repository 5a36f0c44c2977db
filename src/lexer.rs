//! PHP tokenizer feeding the structural walker.
//!
//! The lexer only distinguishes what the walker needs: doc-comments, the
//! handful of declaration keywords, names, variables and punctuation. Everything
//! else (strings, numbers, inline HTML, other keywords) is kept as opaque
//! material. Plain comments, whitespace and `#[...]` attributes are dropped.
//! Lexing never fails; unterminated constructs run to the end of the input.

use std::iter::FusedIterator;

/// Kinds of tokens produced by [`Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `/** ... */`
    DocComment,
    Namespace,
    Use,
    Class,
    Abstract,
    Final,
    Extends,
    Public,
    Protected,
    Private,
    Static,
    Var,
    Function,
    Readonly,
    /// Any other reserved word (`const`, `return`, `as`, ...)
    Keyword,
    /// A simple or namespace-qualified name, e.g. `Foo`, `\Foo\Bar`
    Identifier,
    /// `$name`
    Variable,
    StringLiteral,
    Number,
    /// Text outside of `<?php ... ?>`
    InlineHtml,
    /// Operators and delimiters (`;`, `{`, `::`, `->`, ...)
    Punct,
}

/// A lexical token with its literal text and 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    /// True for punctuation with exactly this text.
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    /// True for a reserved word matching `word` case-insensitively.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(word)
    }
}

const OTHER_KEYWORDS: &[&str] = &[
    "and", "as", "break", "case", "catch", "clone", "const", "continue", "declare", "default",
    "die", "do", "echo", "else", "elseif", "empty", "enddeclare", "endfor", "endforeach",
    "endif", "endswitch", "endwhile", "eval", "exit", "fn", "for", "foreach", "global", "goto",
    "if", "implements", "include", "include_once", "instanceof", "insteadof", "interface",
    "isset", "match", "new", "or", "print", "require", "require_once", "return", "switch",
    "throw", "trait", "try", "unset", "while", "xor", "yield",
];

fn keyword_kind(word: &str) -> Option<TokenKind> {
    let lower = word.to_ascii_lowercase();
    let kind = match lower.as_str() {
        "namespace" => TokenKind::Namespace,
        "use" => TokenKind::Use,
        "class" => TokenKind::Class,
        "abstract" => TokenKind::Abstract,
        "final" => TokenKind::Final,
        "extends" => TokenKind::Extends,
        "public" => TokenKind::Public,
        "protected" => TokenKind::Protected,
        "private" => TokenKind::Private,
        "static" => TokenKind::Static,
        "var" => TokenKind::Var,
        "function" => TokenKind::Function,
        "readonly" => TokenKind::Readonly,
        other if OTHER_KEYWORDS.contains(&other) => TokenKind::Keyword,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || !ch.is_ascii()
}

/// Pull-based lexer over PHP source text.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    in_php: bool,
    /// Set after `::`, `->`, `?->` and `function` so member names are never read as keywords
    expect_name: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            in_php: false,
            expect_name: false,
        }
    }

    /// Tokenizes a whole file.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn advance_by(&mut self, bytes: usize) {
        let end = (self.pos + bytes).min(self.source.len());
        self.line += self.source[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    fn lex_inline_html(&mut self) -> Option<Token> {
        let line = self.line;
        let start = self.pos;
        let (html_len, tag_len) = match self.rest().find("<?") {
            Some(offset) => {
                let after = &self.rest()[offset..];
                let tag_len = if after
                    .get(..5)
                    .map_or(false, |tag| tag.eq_ignore_ascii_case("<?php"))
                {
                    5
                } else if after.starts_with("<?=") {
                    3
                } else {
                    2
                };
                (offset, tag_len)
            }
            None => (self.rest().len(), 0),
        };
        self.advance_by(html_len);
        let html = &self.source[start..self.pos];
        self.advance_by(tag_len);
        self.in_php = tag_len > 0;
        if html.is_empty() {
            None
        } else {
            Some(Token::new(TokenKind::InlineHtml, html, line))
        }
    }

    /// Skips whitespace, plain comments and attributes. Returns a doc-comment if one is found.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('#') if self.peek_nth(1) == Some('[') => self.skip_attribute(),
                Some('#') => self.skip_line_comment(),
                Some('/') if self.peek_nth(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_nth(1) == Some('*') => {
                    if let Some(doc) = self.lex_block_comment() {
                        return Some(doc);
                    }
                }
                _ => return None,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || self.rest().starts_with("?>") {
                break;
            }
            self.bump();
        }
    }

    fn skip_attribute(&mut self) {
        let mut depth = 0usize;
        while let Some(ch) = self.bump() {
            match ch {
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                '\'' | '"' => self.skip_quoted(ch),
                _ => {}
            }
        }
    }

    fn lex_block_comment(&mut self) -> Option<Token> {
        let line = self.line;
        let start = self.pos;
        let is_doc = self.rest().starts_with("/**")
            && self.peek_nth(3).map_or(false, char::is_whitespace);
        let len = match self.rest()[2..].find("*/") {
            Some(offset) => offset + 4,
            None => self.rest().len(),
        };
        self.advance_by(len);
        if is_doc {
            Some(Token::new(
                TokenKind::DocComment,
                &self.source[start..self.pos],
                line,
            ))
        } else {
            None
        }
    }

    /// Consumes the body of a quoted string whose opening quote was already read.
    fn skip_quoted(&mut self, quote: char) {
        while let Some(ch) = self.bump() {
            if ch == '\\' {
                self.bump();
            } else if ch == quote {
                break;
            }
        }
    }

    fn lex_heredoc(&mut self) -> String {
        let start = self.pos;
        self.advance_by(3);
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
        let quoted = matches!(self.peek(), Some('\'') | Some('"'));
        if quoted {
            self.bump();
        }
        let label: String = self
            .rest()
            .chars()
            .take_while(|&c| is_ident_continue(c))
            .collect();
        self.advance_by(label.len());
        if quoted {
            self.bump();
        }
        if label.is_empty() {
            return self.source[start..self.pos].to_string();
        }
        // Body runs until a line starting (after indentation) with the label
        loop {
            match self.rest().find('\n') {
                Some(offset) => {
                    self.advance_by(offset + 1);
                    let trimmed = self.rest().trim_start_matches([' ', '\t']);
                    let indent = self.rest().len() - trimmed.len();
                    if trimmed.starts_with(label.as_str())
                        && !trimmed[label.len()..]
                            .chars()
                            .next()
                            .map_or(false, is_ident_continue)
                    {
                        self.advance_by(indent + label.len());
                        break;
                    }
                }
                None => {
                    self.advance_by(self.rest().len());
                    break;
                }
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn lex_name(&mut self) -> String {
        let start = self.pos;
        if self.peek() == Some('\\') {
            self.bump();
        }
        loop {
            while self.peek().map_or(false, is_ident_continue) {
                self.bump();
            }
            if self.peek() == Some('\\') && self.peek_nth(1).map_or(false, is_ident_start) {
                self.bump();
                continue;
            }
            break;
        }
        self.source[start..self.pos].to_string()
    }

    fn lex_token(&mut self) -> Option<Token> {
        let line = self.line;
        let ch = self.peek()?;
        let expect_name = std::mem::replace(&mut self.expect_name, false);

        if ch == '$' && self.peek_nth(1).map_or(false, is_ident_start) {
            self.bump();
            let name = self.lex_name();
            return Some(Token::new(TokenKind::Variable, format!("${}", name), line));
        }

        if is_ident_start(ch) || (ch == '\\' && self.peek_nth(1).map_or(false, is_ident_start)) {
            let name = self.lex_name();
            let kind = if expect_name || name.contains('\\') {
                TokenKind::Identifier
            } else {
                keyword_kind(&name).unwrap_or(TokenKind::Identifier)
            };
            // `function new()`: reserved words are valid method names
            self.expect_name = kind == TokenKind::Function;
            return Some(Token::new(kind, name, line));
        }

        if ch.is_ascii_digit() {
            let start = self.pos;
            while self
                .peek()
                .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            {
                self.bump();
            }
            return Some(Token::new(
                TokenKind::Number,
                &self.source[start..self.pos],
                line,
            ));
        }

        if ch == '\'' || ch == '"' || ch == '`' {
            let start = self.pos;
            self.bump();
            self.skip_quoted(ch);
            return Some(Token::new(
                TokenKind::StringLiteral,
                &self.source[start..self.pos],
                line,
            ));
        }

        if self.rest().starts_with("<<<") {
            let text = self.lex_heredoc();
            return Some(Token::new(TokenKind::StringLiteral, text, line));
        }

        if self.rest().starts_with("?>") {
            self.advance_by(2);
            self.in_php = false;
            return None;
        }

        for op in ["?->", "::", "->"] {
            if self.rest().starts_with(op) {
                self.advance_by(op.len());
                self.expect_name = true;
                return Some(Token::new(TokenKind::Punct, op, line));
            }
        }

        self.bump();
        // `function &name()`
        self.expect_name = expect_name && ch == '&';
        Some(Token::new(TokenKind::Punct, ch.to_string(), line))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.pos < self.source.len() {
            if !self.in_php {
                if let Some(html) = self.lex_inline_html() {
                    return Some(html);
                }
                continue;
            }
            if let Some(doc) = self.skip_trivia() {
                self.expect_name = false;
                return Some(doc);
            }
            if self.pos >= self.source.len() {
                break;
            }
            if let Some(token) = self.lex_token() {
                return Some(token);
            }
        }
        None
    }
}

impl FusedIterator for Lexer<'_> {}
