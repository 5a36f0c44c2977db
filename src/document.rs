use crate::annotations::{Annotation, Model, Resource};
use crate::parser::ParsedFile;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Collects the extracted annotations of many files into one [`Document`].
pub struct DocumentBuilder {
    info: Info,
    resources: Vec<Resource>,
    /// resource path -> index into `resources`
    resource_index: HashMap<String, usize>,
    models: Vec<Model>,
    model_ids: HashMap<String, usize>,
    partials: BTreeMap<String, Annotation>,
}

/// Descriptive header of the generated document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything extracted from a project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub info: Info,
    /// Resources in first-seen order, one per resource path
    pub resources: Vec<Resource>,
    pub models: Vec<Model>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub partials: BTreeMap<String, Annotation>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        debug!("Initializing DocumentBuilder");
        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: Some("API documentation generated from PHP doc-comments".to_string()),
            },
            resources: Vec::new(),
            resource_index: HashMap::new(),
            models: Vec::new(),
            model_ids: HashMap::new(),
            partials: BTreeMap::new(),
        }
    }

    /// Set custom info for the document
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Merges the valid resources, models and partials of one parsed file.
    ///
    /// Resources sharing a resource path are combined: apis are appended and
    /// missing header fields are filled from the later declaration. The first
    /// model with a given id wins; a later partial with the same id replaces
    /// the earlier one.
    pub fn add_file(&mut self, mut file: ParsedFile) {
        debug!("Adding {}", file.path.display());

        for resource in file.resources().to_vec() {
            self.add_resource(resource);
        }

        for model in file.models().to_vec() {
            let id = model.id.clone().unwrap_or_default();
            if self.model_ids.contains_key(&id) {
                warn!(
                    "Model \"{}\" from {} is already declared, keeping the first",
                    id,
                    file.path.display()
                );
                continue;
            }
            self.model_ids.insert(id, self.models.len());
            self.models.push(model);
        }

        for (id, partial) in file.partials() {
            if self.partials.insert(id.clone(), partial.clone()).is_some() {
                warn!(
                    "partial=\"{}\" from {} replaces an earlier declaration",
                    id,
                    file.path.display()
                );
            }
        }
    }

    fn add_resource(&mut self, resource: Resource) {
        let path = resource.resource_path.clone().unwrap_or_default();
        let Some(&index) = self.resource_index.get(&path) else {
            self.resource_index.insert(path, self.resources.len());
            self.resources.push(resource);
            return;
        };

        debug!("Merging resource {}", path);
        let existing = &mut self.resources[index];
        existing.apis.extend(resource.apis);
        existing.children.extend(resource.children);
        if existing.base_path.is_none() {
            existing.base_path = resource.base_path;
        }
        if existing.api_version.is_none() {
            existing.api_version = resource.api_version;
        }
        if existing.swagger_version.is_none() {
            existing.swagger_version = resource.swagger_version;
        }
        for (key, value) in resource.attributes {
            existing.attributes.entry(key).or_insert(value);
        }
    }

    /// Build the final document
    pub fn build(self) -> Document {
        debug!(
            "Building document with {} resource(s) and {} model(s)",
            self.resources.len(),
            self.models.len()
        );
        Document {
            info: self.info,
            resources: self.resources,
            models: self.models,
            partials: self.partials,
        }
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceParser;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn parse(name: &str, source: &str) -> ParsedFile {
        SourceParser::new().parse_source(Path::new(name), source)
    }

    fn controller(class: &str, method: &str, base_path: Option<&str>) -> String {
        let base = base_path
            .map(|b| format!("(basePath=\"{}\")", b))
            .unwrap_or_default();
        format!(
            r#"<?php
/** @SWG\Resource{base} */
class {class} {{
    /** @SWG\Api(@SWG\Operation(method="GET")) */
    public function {method}() {{}}
}}
"#
        )
    }

    #[test]
    fn test_new_builder() {
        let document = DocumentBuilder::new().build();

        assert_eq!(document.info.title, "Generated API");
        assert_eq!(document.info.version, "1.0.0");
        assert!(document.resources.is_empty());
        assert!(document.models.is_empty());
    }

    #[test]
    fn test_with_info() {
        let document = DocumentBuilder::new()
            .with_info("Pet Store".to_string(), "2.0.0".to_string(), None)
            .build();

        assert_eq!(
            document.info,
            Info {
                title: "Pet Store".to_string(),
                version: "2.0.0".to_string(),
                description: None,
            }
        );
    }

    #[test]
    fn test_resources_with_same_path_are_merged() {
        let mut builder = DocumentBuilder::new();
        builder.add_file(parse("a.php", &controller("UserController", "listAction", None)));
        builder.add_file(parse(
            "b.php",
            &controller("UserController", "showAction", Some("http://api")),
        ));
        builder.add_file(parse("c.php", &controller("PetController", "listAction", None)));

        let document = builder.build();
        assert_eq!(document.resources.len(), 2);

        let user = &document.resources[0];
        assert_eq!(user.resource_path.as_deref(), Some("/user"));
        assert_eq!(user.base_path.as_deref(), Some("http://api"));
        let paths: Vec<_> = user.apis.iter().filter_map(|a| a.path.as_deref()).collect();
        assert_eq!(paths, vec!["/user/list", "/user/show"]);

        assert_eq!(document.resources[1].resource_path.as_deref(), Some("/pet"));
    }

    #[test]
    fn test_first_model_wins() {
        let model = |description: &str| {
            format!(
                "<?php\n/** @SWG\\Model(id=\"Pet\", description=\"{}\") */\nclass Pet {{}}\n",
                description
            )
        };
        let mut builder = DocumentBuilder::new();
        builder.add_file(parse("a.php", &model("first")));
        builder.add_file(parse("b.php", &model("second")));

        let document = builder.build();
        assert_eq!(document.models.len(), 1);
        assert_eq!(document.models[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_partials_from_later_files_replace_earlier_ones() {
        let partial = |name: &str| {
            format!(
                "<?php\n/** @SWG\\Parameter(partial=\"limit\", name=\"{}\") */\n",
                name
            )
        };
        let mut builder = DocumentBuilder::new();
        builder.add_file(parse("a.php", &partial("first")));
        builder.add_file(parse("b.php", &partial("second")));

        let document = builder.build();
        let Some(Annotation::Other(parameter)) = document.partials.get("limit") else {
            panic!("expected the limit partial");
        };
        assert_eq!(
            parameter.attributes.get("name"),
            Some(&crate::annotations::Value::String("second".to_string()))
        );
    }
}
