//! Structural context tracked while walking a single PHP file.

use crate::annotations::{ANNOTATION_ALIAS, ANNOTATION_NAMESPACE};
use std::collections::BTreeMap;

/// Alias to fully-qualified name mapping built from `use` statements.
///
/// Aliases are matched case-insensitively, as PHP does for class names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportTable {
    aliases: BTreeMap<String, String>,
}

impl ImportTable {
    /// Creates a table without any aliases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding only the built-in `swg` alias for the annotation namespace.
    pub fn seeded() -> Self {
        let mut table = Self::new();
        table.insert(ANNOTATION_ALIAS, ANNOTATION_NAMESPACE);
        table
    }

    /// Adds or replaces an alias. A leading namespace separator on the target is dropped.
    pub fn insert(&mut self, alias: &str, target: &str) {
        let target = target.strip_prefix('\\').unwrap_or(target);
        self.aliases
            .insert(alias.to_ascii_lowercase(), target.to_string());
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases
            .get(&alias.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Where the walker currently is inside a file.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Active namespace, empty for the global namespace
    pub namespace: String,
    pub imports: ImportTable,
    /// Full name of the most recently declared class
    pub class: Option<String>,
    /// Resolved `extends` target of that class
    pub parent: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            namespace: String::new(),
            imports: ImportTable::seeded(),
            class: None,
            parent: None,
        }
    }

    /// Prefixes a declared (unqualified) class name with the active namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }
}

/// The structural element a doc-comment was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    File,
    Type(String),
    Property {
        class: Option<String>,
        name: String,
        is_static: bool,
    },
    Method {
        class: Option<String>,
        name: String,
    },
}

/// Source position of a doc-comment, rendered into diagnostic labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub scope: Scope,
}

impl Location {
    pub fn new(line: usize, scope: Scope) -> Self {
        Self { line, scope }
    }

    /// Renders the label used in diagnostics, e.g. `Pet->name in pet.php on line 12`.
    pub fn label(&self, file: &str) -> String {
        let position = format!("{} on line {}", file, self.line);
        match &self.scope {
            Scope::File => position,
            Scope::Type(class) => format!("{} in {}", class, position),
            Scope::Property {
                class,
                name,
                is_static,
            } => {
                let separator = if *is_static { "::$" } else { "->" };
                format!(
                    "{}{}{} in {}",
                    class.as_deref().unwrap_or_default(),
                    separator,
                    name,
                    position
                )
            }
            Scope::Method { class, name } => match class {
                Some(class) => format!("{}->{}(...) in {}", class, name, position),
                None => format!("{}(...) in {}", name, position),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_table_is_case_insensitive() {
        let mut imports = ImportTable::new();
        imports.insert("Foo", "\\Baz\\Foo");

        assert_eq!(imports.get("foo"), Some("Baz\\Foo"));
        assert_eq!(imports.get("FOO"), Some("Baz\\Foo"));
        assert_eq!(imports.get("bar"), None);
    }

    #[test]
    fn test_seeded_table_has_annotation_alias() {
        let imports = ImportTable::seeded();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports.get("SWG"), Some("Swagger\\Annotations"));
    }

    #[test]
    fn test_qualify_uses_namespace() {
        let mut context = Context::new();
        assert_eq!(context.qualify("Pet"), "Pet");
        context.namespace = "App\\Models".to_string();
        assert_eq!(context.qualify("Pet"), "App\\Models\\Pet");
    }

    #[test]
    fn test_location_labels() {
        let file = "src/user.php";
        let class = Some("App\\User".to_string());

        assert_eq!(
            Location::new(3, Scope::File).label(file),
            "src/user.php on line 3"
        );
        assert_eq!(
            Location::new(4, Scope::Type("App\\User".to_string())).label(file),
            "App\\User in src/user.php on line 4"
        );
        assert_eq!(
            Location::new(
                5,
                Scope::Property {
                    class: class.clone(),
                    name: "name".to_string(),
                    is_static: false
                }
            )
            .label(file),
            "App\\User->name in src/user.php on line 5"
        );
        assert_eq!(
            Location::new(
                6,
                Scope::Property {
                    class: class.clone(),
                    name: "count".to_string(),
                    is_static: true
                }
            )
            .label(file),
            "App\\User::$count in src/user.php on line 6"
        );
        assert_eq!(
            Location::new(
                7,
                Scope::Method {
                    class,
                    name: "listAction".to_string()
                }
            )
            .label(file),
            "App\\User->listAction(...) in src/user.php on line 7"
        );
    }
}
