//! Default derivation and class-name resolution.
//!
//! Annotations may leave out values that can be read off the code they
//! document: the resource path from the controller class, the api path and
//! operation nickname from the action method, the model id from the class,
//! and property names and types from the field and its `@var` tag. Values
//! written explicitly in the annotation always win.

use crate::annotations::Annotation;
use crate::context::ImportTable;
use regex::Regex;
use std::sync::LazyLock;

/// Resolves a class reference the way PHP does inside `namespace` with the given `use` imports.
///
/// - `\Foo\Bar` is fully qualified and returned without the leading separator
/// - `Foo\Bar` with an import aliased `Foo` has that prefix replaced by the import target
/// - `Foo` matching an import alias resolves to the import target
/// - anything else is relative to the active namespace
pub fn resolve_class_name(name: &str, namespace: &str, imports: &ImportTable) -> String {
    if let Some(absolute) = name.strip_prefix('\\') {
        return absolute.to_string();
    }
    match name.split_once('\\') {
        Some((first, rest)) => {
            if let Some(target) = imports.get(first) {
                return format!("{}\\{}", target, rest);
            }
        }
        None => {
            if let Some(target) = imports.get(name) {
                return target.to_string();
            }
        }
    }
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}\\{}", namespace, name)
    }
}

/// Last segment of a namespaced class name.
pub fn basename(class: &str) -> &str {
    class.rsplit('\\').next().unwrap_or(class)
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> &'a str {
    let Some(split) = value.len().checked_sub(suffix.len()) else {
        return value;
    };
    if value.is_char_boundary(split) && value[split..].eq_ignore_ascii_case(suffix) {
        &value[..split]
    } else {
        value
    }
}

fn lcfirst(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `App\UserController` → `/user`, `FooBarController` → `/fooBar`.
pub fn default_resource_path(class: &str) -> String {
    let path = format!("/{}", lcfirst(basename(class)));
    strip_suffix_ignore_case(&path, "Controller").to_string()
}

/// `("/user", "listAction")` → `/user/list`.
pub fn default_api_path(resource_path: &str, method: &str) -> String {
    format!(
        "{}/{}",
        resource_path,
        strip_suffix_ignore_case(method, "Action")
    )
}

/// Maps a `@var` type onto the Swagger type name; unknown types pass through unchanged.
pub fn map_property_type(raw: &str) -> String {
    let mapped = match raw.to_ascii_lowercase().as_str() {
        "array" => "Array",
        "byte" => "byte",
        "boolean" | "bool" => "boolean",
        "int" | "integer" => "int",
        "long" => "long",
        "float" => "float",
        "double" => "double",
        "string" => "string",
        "date" | "datetime" | "\\datetime" => "Date",
        "list" => "List",
        "set" => "Set",
        _ => return raw.to_string(),
    };
    mapped.to_string()
}

static RE_VAR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@var\s+(\\?[\w\\]+)").unwrap());

/// Type named by the first `@var` tag of a raw doc-comment, mapped by [`map_property_type`].
pub fn property_type_from_comment(comment: &str) -> Option<String> {
    RE_VAR_TAG
        .captures(comment)
        .and_then(|captures| captures.get(1))
        .map(|raw| map_property_type(raw.as_str()))
}

/// Defaults for annotations in a doc-comment placed on a class declaration.
pub fn apply_type_defaults(annotation: &mut Annotation, class: &str, parent: Option<&str>) {
    match annotation {
        Annotation::Resource(resource) => {
            if resource.resource_path.is_none() {
                resource.resource_path = Some(default_resource_path(class));
            }
        }
        Annotation::Model(model) => {
            model.source_type = Some(class.to_string());
            if model.id.is_none() {
                model.id = Some(basename(class).to_string());
            }
            model.parent_type = parent.map(str::to_string);
        }
        _ => {}
    }
}

/// Defaults for annotations in a doc-comment placed on a method.
///
/// `resource_path` is the path of the current resource, if any.
pub fn apply_method_defaults(
    annotation: &mut Annotation,
    method: &str,
    resource_path: Option<&str>,
) {
    if let Annotation::Api(api) = annotation {
        if api.path.is_none() {
            if let Some(resource_path) = resource_path.filter(|p| !p.is_empty()) {
                api.path = Some(default_api_path(resource_path, method));
            }
        }
        for operation in &mut api.operations {
            if operation.nickname.is_none() {
                operation.nickname = Some(method.to_string());
            }
        }
    }
}

/// Defaults for annotations in a doc-comment placed on a field.
pub fn apply_property_defaults(annotation: &mut Annotation, field: &str, comment: &str) {
    if let Annotation::Property(property) = annotation {
        if property.name.is_none() {
            property.name = Some(field.to_string());
        }
        if property.type_name.is_none() {
            property.type_name = property_type_from_comment(comment);
        }
    }
}
