//! Typed `@SWG\...` annotation values.
//!
//! The annotation parser produces [`Annotation`] values, a closed set of kinds
//! the extraction engine branches on. Each kind carries the fields the engine
//! derives defaults for; anything else given in the doc-comment is kept in
//! `attributes` (named values) or `children` (nested annotations) so nothing
//! written by the author is lost.

pub mod parser;
mod validate;

use serde::Serialize;
use std::collections::BTreeMap;

/// Namespace holding the annotation classes.
pub const ANNOTATION_NAMESPACE: &str = "Swagger\\Annotations";

/// Alias available in every file without a `use` statement (`@SWG\Resource`).
pub const ANNOTATION_ALIAS: &str = "swg";

/// Short names of the annotations known in [`ANNOTATION_NAMESPACE`].
const KNOWN_ANNOTATIONS: &[&str] = &[
    "AllowableValues",
    "Api",
    "Authorization",
    "Authorizations",
    "Consumes",
    "ErrorResponse",
    "ErrorResponses",
    "Items",
    "Model",
    "Operation",
    "Operations",
    "Parameter",
    "Parameters",
    "Partial",
    "Produces",
    "Property",
    "Resource",
    "ResponseMessage",
    "ResponseMessages",
    "Scope",
    "Scopes",
];

/// Returns the canonical short name if `name` is a known annotation (case-insensitive).
pub fn canonical_name(name: &str) -> Option<&'static str> {
    KNOWN_ANNOTATIONS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(name))
}

/// A literal value inside an annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Annotation(Box<Annotation>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) | Value::Map(_) => "array",
            Value::Annotation(_) => "annotation",
        }
    }
}

/// One `key=value` or positional argument of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Value,
}

/// A grouping of api calls sharing a resource path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger_version: Option<String>,
    pub apis: Vec<Api>,
    #[serde(rename = "partial", skip_serializing_if = "Option::is_none")]
    pub partial_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// A documented endpoint path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub operations: Vec<Operation>,
    #[serde(rename = "partial", skip_serializing_if = "Option::is_none")]
    pub partial_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// One HTTP method on an [`Api`] path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_class: Option<String>,
    #[serde(rename = "partial", skip_serializing_if = "Option::is_none")]
    pub partial_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// A data schema bound to a PHP class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full name of the class the model was declared on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Resolved `extends` target of that class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    pub properties: Vec<Property>,
    #[serde(rename = "partial", skip_serializing_if = "Option::is_none")]
    pub partial_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// A field of a [`Model`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(rename = "partial", skip_serializing_if = "Option::is_none")]
    pub partial_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// `@SWG\Partial("id")`: a pointer to a partial declared elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialRef {
    pub id: String,
}

/// Any other known annotation (`Parameter`, `ErrorResponse`, `Items`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OtherAnnotation {
    pub name: String,
    #[serde(rename = "partial", skip_serializing_if = "Option::is_none")]
    pub partial_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Annotation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// A parsed annotation, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "annotation")]
pub enum Annotation {
    Resource(Resource),
    Api(Api),
    Operation(Operation),
    Model(Model),
    Property(Property),
    Partial(PartialRef),
    Other(OtherAnnotation),
}

impl Annotation {
    /// Short annotation name, e.g. `Resource` or `Parameter`.
    pub fn name(&self) -> &str {
        match self {
            Annotation::Resource(_) => "Resource",
            Annotation::Api(_) => "Api",
            Annotation::Operation(_) => "Operation",
            Annotation::Model(_) => "Model",
            Annotation::Property(_) => "Property",
            Annotation::Partial(_) => "Partial",
            Annotation::Other(other) => &other.name,
        }
    }

    /// Identifier given via `partial="..."`, making this annotation a reusable partial.
    pub fn partial_id(&self) -> Option<&str> {
        match self {
            Annotation::Resource(a) => a.partial_id.as_deref(),
            Annotation::Api(a) => a.partial_id.as_deref(),
            Annotation::Operation(a) => a.partial_id.as_deref(),
            Annotation::Model(a) => a.partial_id.as_deref(),
            Annotation::Property(a) => a.partial_id.as_deref(),
            Annotation::Other(a) => a.partial_id.as_deref(),
            Annotation::Partial(_) => None,
        }
    }

    /// Builds a typed annotation from its canonical short name and arguments.
    ///
    /// Fails with a `[Type Error]` message when a known field holds a value of the wrong type.
    pub fn build(name: &'static str, arguments: Vec<Argument>) -> Result<Annotation, String> {
        let mut args = ArgList::new(name, arguments);
        let annotation = match name {
            "Resource" => Annotation::Resource(build_resource(&mut args)?),
            "Api" => Annotation::Api(build_api(&mut args)?),
            "Operation" => Annotation::Operation(build_operation(&mut args)?),
            "Model" => Annotation::Model(build_model(&mut args)?),
            "Property" => Annotation::Property(build_property(&mut args)?),
            "Partial" => {
                let id = args
                    .take_string("value")?
                    .or(args.take_positional_string()?)
                    .ok_or_else(|| "@SWG\\Partial requires a partial identifier".to_string())?;
                return Ok(Annotation::Partial(PartialRef { id }));
            }
            _ => {
                let partial_id = args.take_string("partial")?;
                let (attributes, children) = args.finish();
                return Ok(Annotation::Other(OtherAnnotation {
                    name: name.to_string(),
                    partial_id,
                    children,
                    attributes,
                }));
            }
        };
        Ok(annotation)
    }
}

fn build_resource(args: &mut ArgList) -> Result<Resource, String> {
    let mut resource = Resource {
        resource_path: args.take_string("resourcePath")?,
        base_path: args.take_string("basePath")?,
        api_version: args.take_string("apiVersion")?,
        swagger_version: args.take_string("swaggerVersion")?,
        partial_id: args.take_string("partial")?,
        ..Resource::default()
    };
    let named = args.take_nested("apis")?;
    let (attributes, nested) = args.finish();
    resource.attributes = attributes;
    for annotation in named.into_iter().chain(nested) {
        match annotation {
            Annotation::Api(api) => resource.apis.push(api),
            other => resource.children.push(other),
        }
    }
    Ok(resource)
}

fn build_api(args: &mut ArgList) -> Result<Api, String> {
    let mut api = Api {
        path: args.take_string("path")?,
        description: args.take_string("description")?,
        partial_id: args.take_string("partial")?,
        ..Api::default()
    };
    let named = args.take_nested("operations")?;
    let (attributes, nested) = args.finish();
    api.attributes = attributes;
    for annotation in named.into_iter().chain(nested) {
        match annotation {
            Annotation::Operation(operation) => api.operations.push(operation),
            // @SWG\Operations(...) only groups operations
            Annotation::Other(group) if group.name == "Operations" => {
                for child in group.children {
                    match child {
                        Annotation::Operation(operation) => api.operations.push(operation),
                        other => api.children.push(other),
                    }
                }
            }
            other => api.children.push(other),
        }
    }
    Ok(api)
}

fn build_operation(args: &mut ArgList) -> Result<Operation, String> {
    let mut operation = Operation {
        method: args.take_string("method")?,
        nickname: args.take_string("nickname")?,
        summary: args.take_string("summary")?,
        notes: args.take_string("notes")?,
        response_class: args.take_string("responseClass")?,
        partial_id: args.take_string("partial")?,
        ..Operation::default()
    };
    let (attributes, children) = args.finish();
    operation.attributes = attributes;
    operation.children = children;
    Ok(operation)
}

fn build_model(args: &mut ArgList) -> Result<Model, String> {
    let mut model = Model {
        id: args.take_string("id")?,
        description: args.take_string("description")?,
        partial_id: args.take_string("partial")?,
        ..Model::default()
    };
    let named = args.take_nested("properties")?;
    let (attributes, nested) = args.finish();
    model.attributes = attributes;
    for annotation in named.into_iter().chain(nested) {
        match annotation {
            Annotation::Property(property) => model.properties.push(property),
            other => model.children.push(other),
        }
    }
    Ok(model)
}

fn build_property(args: &mut ArgList) -> Result<Property, String> {
    let mut property = Property {
        name: args.take_string("name")?,
        type_name: args.take_string("type")?,
        description: args.take_string("description")?,
        required: args.take_bool("required")?,
        partial_id: args.take_string("partial")?,
        ..Property::default()
    };
    let (attributes, children) = args.finish();
    property.attributes = attributes;
    property.children = children;
    Ok(property)
}

/// Arguments of one annotation while its typed fields are picked out.
struct ArgList {
    annotation: &'static str,
    named: Vec<(String, Value)>,
    positional: Vec<Value>,
}

impl ArgList {
    fn new(annotation: &'static str, arguments: Vec<Argument>) -> Self {
        let mut named = Vec::new();
        let mut positional = Vec::new();
        for argument in arguments {
            match argument.name {
                Some(name) => named.push((name, argument.value)),
                None => positional.push(argument.value),
            }
        }
        Self {
            annotation,
            named,
            positional,
        }
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        let index = self.named.iter().rposition(|(name, _)| name == key)?;
        let (_, value) = self.named.remove(index);
        self.named.retain(|(name, _)| name != key);
        Some(value)
    }

    fn type_error(&self, key: &str, expected: &str, value: &Value) -> String {
        format!(
            "[Type Error] Attribute \"{}\" of @SWG\\{} expects {}, but got {}",
            key,
            self.annotation,
            expected,
            value.type_name()
        )
    }

    fn take_string(&mut self, key: &str) -> Result<Option<String>, String> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Integer(i)) => Ok(Some(i.to_string())),
            // `1.0` must not collapse to `1`
            Some(Value::Float(f)) if f.is_finite() && f.fract() == 0.0 => Ok(Some(format!("{f:.1}"))),
            Some(Value::Float(f)) => Ok(Some(f.to_string())),
            Some(other) => Err(self.type_error(key, "a string", &other)),
        }
    }

    fn take_bool(&mut self, key: &str) -> Result<Option<bool>, String> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(self.type_error(key, "a boolean", &other)),
        }
    }

    fn take_nested(&mut self, key: &str) -> Result<Vec<Annotation>, String> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Annotation(annotation)) => Ok(vec![*annotation]),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Annotation(annotation) => Ok(*annotation),
                    other => Err(self.type_error(key, "annotations", &other)),
                })
                .collect(),
            Some(other) => Err(self.type_error(key, "annotations", &other)),
        }
    }

    /// Takes the first positional scalar, used for `@SWG\Partial("id")`.
    fn take_positional_string(&mut self) -> Result<Option<String>, String> {
        let Some(index) = self
            .positional
            .iter()
            .position(|value| !matches!(value, Value::Annotation(_)))
        else {
            return Ok(None);
        };
        match self.positional.remove(index) {
            Value::String(s) => Ok(Some(s)),
            other => Err(self.type_error("value", "a string", &other)),
        }
    }

    /// Returns the leftover named values plus positional scalars (as `value`), and the
    /// positional nested annotations.
    fn finish(&mut self) -> (BTreeMap<String, Value>, Vec<Annotation>) {
        let mut attributes: BTreeMap<String, Value> = self.named.drain(..).collect();
        let mut children = Vec::new();
        let mut scalars = Vec::new();
        for value in self.positional.drain(..) {
            match value {
                Value::Annotation(annotation) => children.push(*annotation),
                other => scalars.push(other),
            }
        }
        match scalars.len() {
            0 => {}
            1 => {
                attributes.insert("value".to_string(), scalars.remove(0));
            }
            _ => {
                attributes.insert("value".to_string(), Value::Array(scalars));
            }
        }
        (attributes, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, value: Value) -> Argument {
        Argument {
            name: Some(name.to_string()),
            value,
        }
    }

    fn positional(value: Value) -> Argument {
        Argument { name: None, value }
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_canonical_name_is_case_insensitive() {
        assert_eq!(canonical_name("resource"), Some("Resource"));
        assert_eq!(canonical_name("ERRORRESPONSE"), Some("ErrorResponse"));
        assert_eq!(canonical_name("Controller"), None);
    }

    #[test]
    fn test_build_api_collects_operations_from_all_forms() {
        let op = |nick: &str| {
            Value::Annotation(Box::new(
                Annotation::build("Operation", vec![named("nickname", string(nick))]).unwrap(),
            ))
        };
        let group = Value::Annotation(Box::new(
            Annotation::build("Operations", vec![positional(op("grouped"))]).unwrap(),
        ));
        let api = Annotation::build(
            "Api",
            vec![
                named("path", string("/pets")),
                named("operations", Value::Array(vec![op("listed")])),
                positional(op("inline")),
                positional(group),
            ],
        )
        .unwrap();

        let Annotation::Api(api) = api else {
            panic!("expected an Api");
        };
        let nicknames: Vec<_> = api
            .operations
            .iter()
            .map(|o| o.nickname.as_deref().unwrap())
            .collect();
        assert_eq!(nicknames, vec!["listed", "inline", "grouped"]);
        assert_eq!(api.path.as_deref(), Some("/pets"));
        assert!(api.children.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_kept_as_attributes() {
        let annotation = Annotation::build(
            "Resource",
            vec![
                named("resourcePath", string("/user")),
                named("produces", Value::Array(vec![string("application/json")])),
            ],
        )
        .unwrap();
        let Annotation::Resource(resource) = annotation else {
            panic!("expected a Resource");
        };
        assert_eq!(resource.resource_path.as_deref(), Some("/user"));
        assert_eq!(
            resource.attributes.get("produces"),
            Some(&Value::Array(vec![string("application/json")]))
        );
    }

    #[test]
    fn test_numeric_versions_keep_their_decimals() {
        let Annotation::Resource(resource) = Annotation::build(
            "Resource",
            vec![
                named("apiVersion", Value::Float(1.0)),
                named("swaggerVersion", Value::Float(1.2)),
                named("basePath", Value::Integer(2)),
            ],
        )
        .unwrap() else {
            panic!("expected a resource");
        };
        assert_eq!(resource.api_version.as_deref(), Some("1.0"));
        assert_eq!(resource.swagger_version.as_deref(), Some("1.2"));
        assert_eq!(resource.base_path.as_deref(), Some("2"));
    }

    #[test]
    fn test_type_errors_are_reported() {
        let err = Annotation::build("Model", vec![named("id", Value::Bool(true))]).unwrap_err();
        assert!(err.contains("[Type Error]"));
        assert!(err.contains("\"id\""));
    }

    #[test]
    fn test_partial_pointer_and_partial_definition() {
        let pointer = Annotation::build("Partial", vec![positional(string("list"))]).unwrap();
        assert_eq!(
            pointer,
            Annotation::Partial(PartialRef {
                id: "list".to_string()
            })
        );
        assert_eq!(pointer.partial_id(), None);

        let definition =
            Annotation::build("Parameter", vec![named("partial", string("page"))]).unwrap();
        assert_eq!(definition.partial_id(), Some("page"));
        assert_eq!(definition.name(), "Parameter");

        assert!(Annotation::build("Partial", vec![]).is_err());
    }
}
