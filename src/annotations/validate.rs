use super::{Api, Model, Operation, Property, Resource};
use crate::diagnostics::Diagnostics;

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl Resource {
    /// Checks required fields and drops invalid apis. Returns false if the resource is unusable.
    pub fn validate(&mut self, diagnostics: &mut Diagnostics, location: &str) -> bool {
        if is_blank(&self.resource_path) {
            diagnostics.notice("@SWG\\Resource() is missing \"resourcePath\"", location);
            return false;
        }
        self.apis.retain_mut(|api| api.validate(diagnostics, location));
        if self.apis.is_empty() {
            diagnostics.notice(
                format!(
                    "Resource \"{}\" doesn't have any valid api calls",
                    self.resource_path.as_deref().unwrap_or_default()
                ),
                location,
            );
            return false;
        }
        true
    }
}

impl Api {
    pub fn validate(&mut self, diagnostics: &mut Diagnostics, location: &str) -> bool {
        if is_blank(&self.path) {
            diagnostics.notice("@SWG\\Api() is missing \"path\"", location);
            return false;
        }
        self.operations
            .retain_mut(|operation| operation.validate(diagnostics, location));
        if self.operations.is_empty() {
            diagnostics.notice(
                format!(
                    "Api \"{}\" doesn't have any valid operations",
                    self.path.as_deref().unwrap_or_default()
                ),
                location,
            );
            return false;
        }
        true
    }
}

impl Operation {
    pub fn validate(&mut self, diagnostics: &mut Diagnostics, location: &str) -> bool {
        match self.method.as_deref() {
            None | Some("") => {
                diagnostics.notice("@SWG\\Operation() is missing \"method\"", location);
                return false;
            }
            Some(method) if !HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method)) => {
                diagnostics.notice(
                    format!("Invalid method \"{}\" in @SWG\\Operation()", method),
                    location,
                );
                return false;
            }
            Some(_) => {}
        }
        if is_blank(&self.nickname) {
            diagnostics.notice("@SWG\\Operation() is missing \"nickname\"", location);
            return false;
        }
        true
    }
}

impl Model {
    /// Checks the id and drops invalid properties; a model without properties is still valid.
    pub fn validate(&mut self, diagnostics: &mut Diagnostics, location: &str) -> bool {
        if is_blank(&self.id) {
            diagnostics.notice("@SWG\\Model() is missing \"id\"", location);
            return false;
        }
        self.properties
            .retain_mut(|property| property.validate(diagnostics, location));
        true
    }
}

impl Property {
    pub fn validate(&mut self, diagnostics: &mut Diagnostics, location: &str) -> bool {
        if is_blank(&self.name) {
            diagnostics.notice("@SWG\\Property() is missing \"name\"", location);
            return false;
        }
        if is_blank(&self.type_name) {
            diagnostics.notice(
                format!(
                    "@SWG\\Property(name=\"{}\") is missing \"type\"",
                    self.name.as_deref().unwrap_or_default()
                ),
                location,
            );
            return false;
        }
        true
    }
}
