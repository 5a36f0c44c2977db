//! Structural walker pairing doc-comments with the declarations they document.
//!
//! The walker makes a single pass over the token stream with one token of
//! lookahead. It does not build a syntax tree; it only follows namespace and
//! `use` statements, class declarations and the modifiers in front of fields
//! and methods. A pending doc-comment is attached to the next recognized
//! declaration; if anything else comes first it is emitted as unattached.
//!
//! The member-attachment logic is an explicit state machine:
//!
//! | state | entered on | leaves on |
//! |---|---|---|
//! | `Scanning` | start | `class`, modifiers, `function` |
//! | `ClassName` | `class` | the class name |
//! | `TypeHeader` | class name while a comment is pending | `extends` or anything else |
//! | `Extends` | `extends` | the parent name |
//! | `AfterModifier` | `public`/`protected`/`private`/`var` | `$field`, `function` |
//! | `AfterStatic` | bare `static` | `$field`, `function`, a visibility |
//! | `FunctionName` | `function` | the method name |

use crate::context::{Context, ImportTable, Location, Scope};
use crate::defaults::{basename, resolve_class_name};
use crate::lexer::{Token, TokenKind};
use log::debug;
use std::iter::Peekable;

/// A doc-comment waiting to be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment {
    pub text: String,
    pub line: usize,
}

/// What a doc-comment was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Not followed by a declaration (file-level)
    Unattached,
    Type {
        class: String,
        parent: Option<String>,
    },
    /// A field; the name has no `$` sigil
    Property { name: String },
    Method { name: String },
}

/// A doc-comment together with everything needed to interpret it later.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub comment: DocComment,
    pub target: Target,
    /// Namespace active at the comment
    pub namespace: String,
    /// Snapshot of the imports active at the comment
    pub imports: ImportTable,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Scanning,
    ClassName,
    TypeHeader { class: String },
    Extends { class: String },
    AfterModifier { is_static: bool },
    AfterStatic,
    FunctionName,
}

/// Single-file walker. Owns its context; never shared between files.
pub struct Walker {
    context: Context,
    pending: Option<DocComment>,
    state: State,
    attachments: Vec<Attachment>,
}

impl Walker {
    fn new() -> Self {
        Self {
            context: Context::new(),
            pending: None,
            state: State::Scanning,
            attachments: Vec::new(),
        }
    }

    /// Walks a whole token stream and returns the doc-comments in source order.
    pub fn walk<I>(tokens: I) -> Vec<Attachment>
    where
        I: IntoIterator<Item = Token>,
    {
        let mut walker = Walker::new();
        let mut tokens = tokens.into_iter().peekable();
        while let Some(token) = tokens.next() {
            walker.step(token, &mut tokens);
        }
        walker.finish()
    }

    fn step<I>(&mut self, token: Token, tokens: &mut Peekable<I>)
    where
        I: Iterator<Item = Token>,
    {
        let state = std::mem::replace(&mut self.state, State::Scanning);
        match state {
            State::Scanning => self.scan(token, tokens),
            State::ClassName => {
                if token.kind == TokenKind::Identifier {
                    let class = self.context.qualify(&token.text);
                    debug!("Entering class {}", class);
                    self.context.class = Some(class.clone());
                    self.context.parent = None;
                    if self.pending.is_some() {
                        self.state = State::TypeHeader { class };
                    }
                } else {
                    // Anonymous class
                    self.scan(token, tokens);
                }
            }
            State::TypeHeader { class } => {
                if token.kind == TokenKind::Extends {
                    self.state = State::Extends { class };
                } else {
                    self.attach_type(class, None);
                    self.scan(token, tokens);
                }
            }
            State::Extends { class } => {
                if token.kind == TokenKind::Identifier {
                    let parent = resolve_class_name(
                        &token.text,
                        &self.context.namespace,
                        &self.context.imports,
                    );
                    self.context.parent = Some(parent.clone());
                    self.attach_type(class, Some(parent));
                } else {
                    self.attach_type(class, None);
                    self.scan(token, tokens);
                }
            }
            State::AfterModifier { is_static } => match token.kind {
                TokenKind::Static => self.state = State::AfterModifier { is_static: true },
                TokenKind::Variable => self.attach_property(&token.text, is_static),
                TokenKind::Function => self.state = State::FunctionName,
                // Stacked modifiers and property type declarations
                TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Var
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Readonly
                | TokenKind::Identifier => self.state = State::AfterModifier { is_static },
                TokenKind::Punct if is_type_operator(&token) => {
                    self.state = State::AfterModifier { is_static }
                }
                _ => self.scan(token, tokens),
            },
            State::AfterStatic => match token.kind {
                TokenKind::Variable => self.attach_property(&token.text, true),
                TokenKind::Function => self.state = State::FunctionName,
                TokenKind::Public | TokenKind::Protected | TokenKind::Private | TokenKind::Var => {
                    self.state = State::AfterModifier { is_static: true }
                }
                TokenKind::Final | TokenKind::Readonly | TokenKind::Identifier => {
                    self.state = State::AfterStatic
                }
                TokenKind::Punct if token.is_punct("?") || token.is_punct("|") => {
                    self.state = State::AfterStatic
                }
                _ => {
                    self.flush();
                    self.scan(token, tokens);
                }
            },
            State::FunctionName => match token.kind {
                TokenKind::Identifier => self.attach_method(&token.text),
                TokenKind::Punct if token.is_punct("&") => self.state = State::FunctionName,
                _ => {
                    // Closure
                    self.flush();
                    self.scan(token, tokens);
                }
            },
        }
    }

    /// Handles a token in the `Scanning` state.
    fn scan<I>(&mut self, token: Token, tokens: &mut Peekable<I>)
    where
        I: Iterator<Item = Token>,
    {
        match token.kind {
            TokenKind::DocComment => {
                if self.pending.is_some() {
                    // Two doc-comments in succession
                    self.flush();
                }
                self.pending = Some(DocComment {
                    text: token.text,
                    line: token.line,
                });
            }
            TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly => {}
            TokenKind::Class => self.state = State::ClassName,
            TokenKind::Namespace => self.parse_namespace(tokens),
            TokenKind::Use => self.parse_use(tokens),
            _ if self.pending.is_none() => {}
            TokenKind::Public | TokenKind::Protected | TokenKind::Private | TokenKind::Var => {
                self.state = State::AfterModifier { is_static: false }
            }
            TokenKind::Static => self.state = State::AfterStatic,
            TokenKind::Function => self.state = State::FunctionName,
            TokenKind::Punct => {}
            _ => self.flush(),
        }
    }

    fn finish(mut self) -> Vec<Attachment> {
        match std::mem::replace(&mut self.state, State::Scanning) {
            State::TypeHeader { class } | State::Extends { class } => {
                self.attach_type(class, None)
            }
            _ => {}
        }
        // File ends with a doc-comment
        self.flush();
        self.attachments
    }

    fn parse_namespace<I>(&mut self, tokens: &mut Peekable<I>)
    where
        I: Iterator<Item = Token>,
    {
        let namespace = tokens
            .next_if(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text.trim_start_matches('\\').to_string())
            .unwrap_or_default();
        debug!("Namespace: {:?}", namespace);
        self.context.namespace = namespace;
    }

    fn parse_use<I>(&mut self, tokens: &mut Peekable<I>)
    where
        I: Iterator<Item = Token>,
    {
        // Closure `use ($var)`
        if tokens.peek().map_or(false, |t| t.is_punct("(")) {
            return;
        }
        if tokens
            .peek()
            .map_or(false, |t| t.kind == TokenKind::Function || t.is_keyword("const"))
        {
            for t in tokens.by_ref() {
                if t.is_punct(";") {
                    break;
                }
            }
            return;
        }

        while let Some(name) = tokens.next_if(|t| t.kind == TokenKind::Identifier) {
            if tokens.next_if(|t| t.is_punct("\\")).is_some() {
                if tokens.next_if(|t| t.is_punct("{")).is_some() {
                    self.parse_use_group(&name.text, tokens);
                }
            } else {
                let alias = parse_alias(tokens).unwrap_or_else(|| basename(&name.text).to_string());
                self.add_import(&alias, &name.text);
            }
            if tokens.next_if(|t| t.is_punct(",")).is_none() {
                break;
            }
        }
        tokens.next_if(|t| t.is_punct(";"));
    }

    /// `use Prefix\{A, B as C}` after the opening brace.
    fn parse_use_group<I>(&mut self, prefix: &str, tokens: &mut Peekable<I>)
    where
        I: Iterator<Item = Token>,
    {
        loop {
            tokens.next_if(|t| t.kind == TokenKind::Function || t.is_keyword("const"));
            let Some(item) = tokens.next_if(|t| t.kind == TokenKind::Identifier) else {
                break;
            };
            let alias = parse_alias(tokens).unwrap_or_else(|| basename(&item.text).to_string());
            self.add_import(&alias, &format!("{}\\{}", prefix, item.text));
            if tokens.next_if(|t| t.is_punct(",")).is_none() {
                break;
            }
        }
        tokens.next_if(|t| t.is_punct("}"));
    }

    fn add_import(&mut self, alias: &str, target: &str) {
        debug!("Import {} => {}", alias, target);
        self.context.imports.insert(alias, target);
    }

    fn attach(&mut self, target: Target, scope: Scope) {
        let Some(comment) = self.pending.take() else {
            return;
        };
        let location = Location::new(comment.line, scope);
        debug!("Doc-comment on line {} attached to {:?}", comment.line, target);
        self.attachments.push(Attachment {
            comment,
            target,
            namespace: self.context.namespace.clone(),
            imports: self.context.imports.clone(),
            location,
        });
    }

    fn flush(&mut self) {
        self.attach(Target::Unattached, Scope::File);
    }

    fn attach_type(&mut self, class: String, parent: Option<String>) {
        let scope = Scope::Type(class.clone());
        self.attach(Target::Type { class, parent }, scope);
    }

    fn attach_property(&mut self, variable: &str, is_static: bool) {
        let name = variable.trim_start_matches('$').to_string();
        let scope = Scope::Property {
            class: self.context.class.clone(),
            name: name.clone(),
            is_static,
        };
        self.attach(Target::Property { name }, scope);
    }

    fn attach_method(&mut self, name: &str) {
        let scope = Scope::Method {
            class: self.context.class.clone(),
            name: name.to_string(),
        };
        self.attach(
            Target::Method {
                name: name.to_string(),
            },
            scope,
        );
    }
}

/// `?`, `|` and `&` inside a property type declaration.
fn is_type_operator(token: &Token) -> bool {
    token.is_punct("?") || token.is_punct("|") || token.is_punct("&")
}

fn parse_alias<I>(tokens: &mut Peekable<I>) -> Option<String>
where
    I: Iterator<Item = Token>,
{
    tokens.next_if(|t| t.is_keyword("as"))?;
    tokens
        .next_if(|t| t.kind == TokenKind::Identifier)
        .map(|t| t.text)
}
