//! Annotation-expression parsing for doc-comment bodies.
//!
//! [`AnnotationParser`] is the seam between the extraction engine and the
//! annotation grammar. [`DocBlockParser`] is the default implementation and
//! understands the Doctrine-style syntax used by Swagger-PHP:
//!
//! ```text
//! @SWG\Api(
//!     path="/pets/{id}",
//!     @SWG\Operation(method="GET", parameters={@SWG\Parameter(name="id")})
//! )
//! ```
//!
//! Names are resolved against the file's import table; annotations outside
//! the Swagger namespace (`@var`, `@param`, ...) are ignored.

use super::{canonical_name, Annotation, Argument, Value, ANNOTATION_NAMESPACE};
use crate::context::ImportTable;
use crate::error::{Error, Result};
use log::debug;
use std::collections::BTreeMap;

/// Turns a doc-comment into the top-level annotations it declares.
pub trait AnnotationParser {
    /// Parses `comment`, resolving names through `imports`. `context` labels error messages.
    fn parse(&self, comment: &str, imports: &ImportTable, context: &str)
        -> Result<Vec<Annotation>>;
}

/// Default Doctrine-style annotation parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocBlockParser;

impl AnnotationParser for DocBlockParser {
    fn parse(
        &self,
        comment: &str,
        imports: &ImportTable,
        context: &str,
    ) -> Result<Vec<Annotation>> {
        let mut cursor = Cursor {
            chars: comment.chars().collect(),
            pos: 0,
            imports,
            context,
        };
        let annotations = cursor.annotations()?;
        debug!("Parsed {} annotation(s) in {}", annotations.len(), context);
        Ok(annotations)
    }
}

enum Resolved {
    Known(&'static str),
    /// Not in the annotation namespace, parsed and dropped
    Ignored,
}

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    imports: &'a ImportTable,
    context: &'a str,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::annotation(self.context, message)
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(ch) => format!("'{}'", ch),
            None => "end of string".to_string(),
        }
    }

    /// Whitespace and the `*` line prefixes of a doc-comment are insignificant between tokens.
    fn skip_insignificant(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() || c == '*') {
            self.pos += 1;
        }
    }

    /// Position of the next `@` that starts an annotation: at the start or after a blank or `*`.
    fn next_at(&self) -> Option<usize> {
        (self.pos..self.chars.len()).find(|&i| {
            self.chars[i] == '@'
                && (i == 0 || matches!(self.chars[i - 1], ' ' | '\t' | '\n' | '\r' | '*'))
        })
    }

    fn annotations(&mut self) -> Result<Vec<Annotation>> {
        let mut found = Vec::new();
        while let Some(at) = self.next_at() {
            self.pos = at + 1;
            let name = self.read_name();
            if name.is_empty() {
                continue;
            }
            match self.resolve(&name)? {
                Some(kind) => found.push(self.annotation(kind)?),
                None => continue,
            }
        }
        Ok(found)
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '\\') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        if matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                self.pos += 1;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Resolves an annotation name through the import table.
    ///
    /// Returns `None` for names that do not point into the annotation namespace.
    fn resolve(&self, name: &str) -> Result<Option<&'static str>> {
        let full = if let Some(absolute) = name.strip_prefix('\\') {
            absolute.to_string()
        } else if let Some((first, rest)) = name.split_once('\\') {
            match self.imports.get(first) {
                Some(target) => format!("{}\\{}", target, rest),
                None => name.to_string(),
            }
        } else {
            match self.imports.get(name) {
                Some(target) => target.to_string(),
                None => return Ok(None),
            }
        };

        let prefix_len = ANNOTATION_NAMESPACE.len();
        let in_namespace = full.len() > prefix_len + 1
            && full.is_char_boundary(prefix_len)
            && full[..prefix_len].eq_ignore_ascii_case(ANNOTATION_NAMESPACE)
            && full[prefix_len..].starts_with('\\');
        if !in_namespace {
            return Ok(None);
        }
        let short = &full[prefix_len + 1..];
        match canonical_name(short) {
            Some(kind) => Ok(Some(kind)),
            None => Err(self.error(format!(
                "[Semantical Error] The annotation \"@{}\" does not exist, or could not be auto-loaded.",
                full
            ))),
        }
    }

    /// Parses the optional argument list following an annotation name.
    fn annotation(&mut self, kind: &'static str) -> Result<Annotation> {
        let arguments = self.optional_arguments()?;
        Annotation::build(kind, arguments).map_err(|message| self.error(message))
    }

    fn optional_arguments(&mut self) -> Result<Vec<Argument>> {
        let mut lookahead = self.pos;
        while matches!(self.chars.get(lookahead), Some(' ') | Some('\t')) {
            lookahead += 1;
        }
        if self.chars.get(lookahead) != Some(&'(') {
            return Ok(Vec::new());
        }
        self.pos = lookahead + 1;
        self.arguments()
    }

    fn arguments(&mut self) -> Result<Vec<Argument>> {
        let mut arguments = Vec::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some(')') {
                self.pos += 1;
                return Ok(arguments);
            }
            arguments.push(self.argument()?);
            self.skip_insignificant();
            match self.bump() {
                Some(',') => continue,
                Some(')') => return Ok(arguments),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error(format!(
                        "[Syntax Error] Expected ',' or ')', got {}",
                        self.describe_next()
                    )));
                }
            }
        }
    }

    fn argument(&mut self) -> Result<Argument> {
        let start = self.pos;
        let word = self.read_identifier();
        if !word.is_empty() {
            self.skip_insignificant();
            if self.peek() == Some('=') {
                self.pos += 1;
                let value = self.plain_value()?;
                return Ok(Argument {
                    name: Some(word),
                    value,
                });
            }
        }
        self.pos = start;
        Ok(Argument {
            name: None,
            value: self.plain_value()?,
        })
    }

    fn plain_value(&mut self) -> Result<Value> {
        self.skip_insignificant();
        match self.peek() {
            Some('"') => Ok(Value::String(self.string()?)),
            Some('{') => {
                self.pos += 1;
                self.array()
            }
            Some('@') => {
                self.pos += 1;
                let name = self.read_name();
                match self.resolve_nested(&name)? {
                    Resolved::Known(kind) => Ok(Value::Annotation(Box::new(self.annotation(kind)?))),
                    Resolved::Ignored => {
                        self.optional_arguments()?;
                        Ok(Value::Null)
                    }
                }
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let word = self.read_identifier();
                match word.to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => Err(self.error(format!(
                        "[Syntax Error] Unexpected constant \"{}\"",
                        word
                    ))),
                }
            }
            _ => Err(self.error(format!(
                "[Syntax Error] Expected a value, got {}",
                self.describe_next()
            ))),
        }
    }

    fn resolve_nested(&self, name: &str) -> Result<Resolved> {
        if name.is_empty() {
            return Err(self.error("[Syntax Error] Expected an annotation name after '@'"));
        }
        Ok(match self.resolve(name)? {
            Some(kind) => Resolved::Known(kind),
            None => Resolved::Ignored,
        })
    }

    /// Double-quoted string; `""` stands for a literal quote.
    fn string(&mut self) -> Result<String> {
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') if self.peek() == Some('"') => {
                    self.pos += 1;
                    value.push('"');
                }
                Some('"') => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("[Syntax Error] Unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Value::Integer(integer));
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| self.error(format!("[Syntax Error] Invalid number \"{}\"", text)))
    }

    /// Array body after `{`. Keyed entries (`key=value` or `key: value`) produce a map.
    fn array(&mut self) -> Result<Value> {
        let mut entries: Vec<(Option<String>, Value)> = Vec::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some('}') {
                self.pos += 1;
                break;
            }
            let key = self.array_key()?;
            let value = self.plain_value()?;
            entries.push((key, value));
            self.skip_insignificant();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error(format!(
                        "[Syntax Error] Expected ',' or '}}', got {}",
                        self.describe_next()
                    )));
                }
            }
        }

        if entries.iter().all(|(key, _)| key.is_none()) {
            return Ok(Value::Array(entries.into_iter().map(|(_, v)| v).collect()));
        }
        let mut map = BTreeMap::new();
        for (index, (key, value)) in entries.into_iter().enumerate() {
            map.insert(key.unwrap_or_else(|| index.to_string()), value);
        }
        Ok(Value::Map(map))
    }

    /// Reads `key=` / `key:` if present, otherwise leaves the cursor untouched.
    fn array_key(&mut self) -> Result<Option<String>> {
        let start = self.pos;
        let key = match self.peek() {
            Some('"') => Some(self.string()?),
            Some(c) if c.is_ascii_digit() => {
                let begin = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                Some(self.chars[begin..self.pos].iter().collect())
            }
            Some(c) if c.is_alphabetic() || c == '_' => Some(self.read_identifier()),
            _ => None,
        };
        if key.is_some() {
            self.skip_insignificant();
            if matches!(self.peek(), Some('=') | Some(':')) {
                self.pos += 1;
                return Ok(key);
            }
        }
        self.pos = start;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Api, Resource};
    use pretty_assertions::assert_eq;

    fn parse(comment: &str) -> Result<Vec<Annotation>> {
        DocBlockParser.parse(comment, &ImportTable::seeded(), "test.php on line 1")
    }

    #[test]
    fn test_ignores_foreign_tags() {
        let annotations = parse("/**\n * Some text\n * @var int\n * @param string $x\n */").unwrap();
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_parses_resource_with_nested_api() {
        let comment = r#"/**
 * @SWG\Resource(
 *   resourcePath="/user",
 *   basePath="http://api.example.com",
 *   @SWG\Api(path="/user/{id}", @SWG\Operation(method="GET", nickname="getUser"))
 * )
 */"#;
        let annotations = parse(comment).unwrap();
        assert_eq!(annotations.len(), 1);
        let Annotation::Resource(Resource {
            resource_path,
            base_path,
            apis,
            ..
        }) = &annotations[0]
        else {
            panic!("expected a Resource, got {:?}", annotations[0]);
        };
        assert_eq!(resource_path.as_deref(), Some("/user"));
        assert_eq!(base_path.as_deref(), Some("http://api.example.com"));
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].path.as_deref(), Some("/user/{id}"));
        assert_eq!(apis[0].operations[0].nickname.as_deref(), Some("getUser"));
    }

    #[test]
    fn test_multiple_top_level_annotations_in_order() {
        let comment = "/**\n * @SWG\\Model(id=\"Pet\")\n * @SWG\\Property(name=\"id\", type=\"int\")\n */";
        let annotations = parse(comment).unwrap();
        let names: Vec<_> = annotations.iter().map(Annotation::name).collect();
        assert_eq!(names, vec!["Model", "Property"]);
    }

    #[test]
    fn test_name_resolution_through_imports() {
        let mut imports = ImportTable::seeded();
        imports.insert("Swg2", "Swagger\\Annotations");
        imports.insert("Api", "Swagger\\Annotations\\Api");
        imports.insert("Entity", "Doctrine\\ORM\\Mapping\\Entity");

        let annotations = DocBlockParser
            .parse(
                "/** @Swg2\\Api(path=\"/a\") @Api(path=\"/b\") @Entity @\\Swagger\\Annotations\\Api(path=\"/c\") */",
                &imports,
                "ctx",
            )
            .unwrap();
        let paths: Vec<_> = annotations
            .iter()
            .map(|a| match a {
                Annotation::Api(Api { path, .. }) => path.clone().unwrap(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_values_and_arrays() {
        let comment = r#"/** @SWG\Property(name="status", type="string", required=true,
 *   @SWG\AllowableValues(valueType="LIST", values="[""a"",""b""]"),
 *   enum={"a", "b"}, limits={min=1, "max": 2.5}, extra=null) */"#;
        let annotations = parse(comment).unwrap();
        let Annotation::Property(property) = &annotations[0] else {
            panic!("expected a Property");
        };
        assert_eq!(property.required, Some(true));
        assert_eq!(property.children[0].name(), "AllowableValues");
        assert_eq!(
            property.attributes.get("enum"),
            Some(&Value::Array(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string())
            ]))
        );
        let Some(Value::Map(limits)) = property.attributes.get("limits") else {
            panic!("expected a map");
        };
        assert_eq!(limits.get("min"), Some(&Value::Integer(1)));
        assert_eq!(limits.get("max"), Some(&Value::Float(2.5)));
        assert_eq!(property.attributes.get("extra"), Some(&Value::Null));

        let Annotation::Other(allowable) = &property.children[0] else {
            panic!("expected AllowableValues");
        };
        assert_eq!(
            allowable.attributes.get("values"),
            Some(&Value::String("[\"a\",\"b\"]".to_string()))
        );
    }

    #[test]
    fn test_email_addresses_are_not_annotations() {
        let annotations = parse("/** Contact foo@SWG.example for help */").unwrap();
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_syntax_errors_carry_context() {
        let err = parse("/** @SWG\\Api(path=\"/a\" */").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("[Syntax Error]"), "{}", msg);
        assert!(msg.contains("test.php on line 1"), "{}", msg);

        assert!(parse("/** @SWG\\Api(path=\"/a) */").is_err());
        assert!(parse("/** @SWG\\Api(path=SOME_CONSTANT) */").is_err());
    }

    #[test]
    fn test_unknown_annotation_in_namespace_is_an_error() {
        let err = parse("/** @SWG\\Resorce(resourcePath=\"/x\") */").unwrap_err();
        assert!(err.to_string().contains("Swagger\\Annotations\\Resorce"));
    }
}
