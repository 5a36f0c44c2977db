//! Per-file store of extracted resources, models and partials.

use crate::annotations::{Annotation, Api, Model, Property, Resource};
use crate::diagnostics::Diagnostics;
use log::debug;
use std::collections::BTreeMap;

/// Everything collected from one file.
///
/// Entities are recorded during the scan without checks. [`Registry::resources`]
/// and [`Registry::models`] validate lazily and keep only what passes.
#[derive(Debug)]
pub struct Registry {
    /// File path used as the location of validation diagnostics
    source: String,
    resources: Vec<Resource>,
    models: Vec<Model>,
    partials: BTreeMap<String, Annotation>,
    /// Index of the resource new apis are attached to
    current_resource: Option<usize>,
    /// Index of the model new properties are attached to
    current_model: Option<usize>,
    diagnostics: Diagnostics,
}

impl Registry {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            resources: Vec::new(),
            models: Vec::new(),
            partials: BTreeMap::new(),
            current_resource: None,
            current_model: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Records a resource and makes it the current one.
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
        self.current_resource = Some(self.resources.len() - 1);
    }

    /// Records a model and makes it the current one.
    pub fn add_model(&mut self, model: Model) {
        self.models.push(model);
        self.current_model = Some(self.models.len() - 1);
    }

    /// Appends to the current resource. Hands the api back if there is none.
    pub fn add_api(&mut self, api: Api) -> Result<(), Api> {
        match self.current_resource.and_then(|i| self.resources.get_mut(i)) {
            Some(resource) => {
                resource.apis.push(api);
                Ok(())
            }
            None => Err(api),
        }
    }

    /// Appends to the current model. Hands the property back if there is none.
    pub fn add_property(&mut self, property: Property) -> Result<(), Property> {
        match self.current_model.and_then(|i| self.models.get_mut(i)) {
            Some(model) => {
                model.properties.push(property);
                Ok(())
            }
            None => Err(property),
        }
    }

    /// Stores a partial; a later partial with the same id replaces the earlier one.
    ///
    /// Returns true if an earlier partial was replaced.
    pub fn add_partial(&mut self, id: String, annotation: Annotation) -> bool {
        self.partials.insert(id, annotation).is_some()
    }

    /// Resource path of the current resource.
    pub fn current_resource_path(&self) -> Option<&str> {
        self.current_resource
            .and_then(|i| self.resources.get(i))
            .and_then(|r| r.resource_path.as_deref())
    }

    /// Valid resources. Invalid ones are dropped for good on the first call.
    pub fn resources(&mut self) -> &[Resource] {
        let before = self.resources.len();
        let diagnostics = &mut self.diagnostics;
        let source = self.source.as_str();
        self.resources
            .retain_mut(|resource| resource.validate(diagnostics, source));
        if self.resources.len() != before {
            debug!(
                "Dropped {} invalid resource(s) from {}",
                before - self.resources.len(),
                self.source
            );
            self.current_resource = None;
        }
        &self.resources
    }

    /// Valid models. Invalid ones are dropped for good on the first call.
    pub fn models(&mut self) -> &[Model] {
        let before = self.models.len();
        let diagnostics = &mut self.diagnostics;
        let source = self.source.as_str();
        self.models
            .retain_mut(|model| model.validate(diagnostics, source));
        if self.models.len() != before {
            debug!(
                "Dropped {} invalid model(s) from {}",
                before - self.models.len(),
                self.source
            );
            self.current_model = None;
        }
        &self.models
    }

    /// All partials by id, unvalidated.
    pub fn partials(&self) -> &BTreeMap<String, Annotation> {
        &self.partials
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Operation;

    fn valid_api(path: &str) -> Api {
        Api {
            path: Some(path.to_string()),
            operations: vec![Operation {
                method: Some("GET".to_string()),
                nickname: Some("list".to_string()),
                ..Operation::default()
            }],
            ..Api::default()
        }
    }

    #[test]
    fn test_api_needs_current_resource() {
        let mut registry = Registry::new("a.php");
        assert!(registry.add_api(valid_api("/x")).is_err());

        registry.add_resource(Resource {
            resource_path: Some("/x".to_string()),
            ..Resource::default()
        });
        assert!(registry.add_api(valid_api("/x/list")).is_ok());
        assert_eq!(registry.current_resource_path(), Some("/x"));
    }

    #[test]
    fn test_property_needs_current_model() {
        let mut registry = Registry::new("a.php");
        assert!(registry.add_property(Property::default()).is_err());
        registry.add_model(Model::default());
        assert!(registry.add_property(Property::default()).is_ok());
    }

    #[test]
    fn test_resources_filtered_and_idempotent() {
        let mut registry = Registry::new("src/user.php");
        registry.add_resource(Resource {
            resource_path: Some("/user".to_string()),
            ..Resource::default()
        });
        registry.add_api(valid_api("/user/list")).unwrap();
        registry.add_resource(Resource::default());

        let first = registry.resources().to_vec();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].resource_path.as_deref(), Some("/user"));
        let diagnostics_after_first = registry.diagnostics().len();
        assert!(registry
            .diagnostics()
            .entries()
            .iter()
            .all(|d| d.location == "src/user.php"));

        let second = registry.resources().to_vec();
        assert_eq!(first, second);
        assert_eq!(registry.diagnostics().len(), diagnostics_after_first);
    }

    #[test]
    fn test_partials_last_write_wins() {
        let mut registry = Registry::new("a.php");
        let first = Annotation::Model(Model {
            id: Some("First".to_string()),
            partial_id: Some("p".to_string()),
            ..Model::default()
        });
        let second = Annotation::Model(Model {
            id: Some("Second".to_string()),
            partial_id: Some("p".to_string()),
            ..Model::default()
        });
        assert!(!registry.add_partial("p".to_string(), first));
        assert!(registry.add_partial("p".to_string(), second.clone()));
        assert_eq!(registry.partials().get("p"), Some(&second));
    }
}
