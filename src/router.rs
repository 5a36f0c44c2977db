//! Routes parsed doc-comments into the [`Registry`].

use crate::annotations::parser::AnnotationParser;
use crate::annotations::Annotation;
use crate::defaults::{apply_method_defaults, apply_property_defaults, apply_type_defaults};
use crate::error::Error;
use crate::registry::Registry;
use crate::walker::{Attachment, Target};

/// Parses each attachment's comment and files the annotations it declares.
///
/// Keeps no state of its own; the current resource and model live in the registry.
pub struct CommentRouter<'a> {
    parser: &'a dyn AnnotationParser,
    registry: &'a mut Registry,
}

impl<'a> CommentRouter<'a> {
    pub fn new(parser: &'a dyn AnnotationParser, registry: &'a mut Registry) -> Self {
        Self { parser, registry }
    }

    /// Parses, derives defaults for, and classifies the annotations of one doc-comment.
    ///
    /// A comment that fails to parse is reported as a warning and contributes nothing.
    pub fn route(&mut self, attachment: Attachment) {
        let location = attachment.location.label(self.registry.source());
        let mut annotations =
            match self
                .parser
                .parse(&attachment.comment.text, &attachment.imports, &location)
            {
                Ok(annotations) => annotations,
                Err(err) => {
                    let message = match err {
                        Error::AnnotationError { message, .. } => message,
                        other => other.to_string(),
                    };
                    self.registry.diagnostics_mut().warning(message, &location);
                    return;
                }
            };

        match &attachment.target {
            Target::Unattached => {}
            Target::Type { class, parent } => {
                for annotation in &mut annotations {
                    apply_type_defaults(annotation, class, parent.as_deref());
                }
            }
            Target::Property { name } => {
                for annotation in &mut annotations {
                    apply_property_defaults(annotation, name, &attachment.comment.text);
                }
            }
            Target::Method { name } => {
                let resource_path = self.resource_path_after(&annotations);
                for annotation in &mut annotations {
                    apply_method_defaults(annotation, name, resource_path.as_deref());
                }
            }
        }

        for annotation in annotations {
            self.classify(annotation, &location);
        }
    }

    /// Path of the resource that is current once this comment's own resources are filed.
    fn resource_path_after(&self, annotations: &[Annotation]) -> Option<String> {
        let own = annotations.iter().rev().find_map(|annotation| match annotation {
            Annotation::Resource(resource) if resource.partial_id.is_none() => {
                Some(resource.resource_path.clone())
            }
            _ => None,
        });
        match own {
            Some(path) => path,
            None => self.registry.current_resource_path().map(str::to_string),
        }
    }

    fn classify(&mut self, annotation: Annotation, location: &str) {
        if let Annotation::Partial(pointer) = &annotation {
            self.registry.diagnostics_mut().notice(
                format!(
                    "Unexpected \"@SWG\\Partial(\"{}\")\", @SWG\\Partial is a pointer to a partial and should be inside another annotation",
                    pointer.id
                ),
                location,
            );
            return;
        }

        if let Some(id) = annotation.partial_id().map(str::to_string) {
            if self.registry.add_partial(id.clone(), annotation) {
                self.registry.diagnostics_mut().notice(
                    format!("partial=\"{}\" is not unique, another was found", id),
                    location,
                );
            }
            return;
        }

        match annotation {
            Annotation::Resource(resource) => self.registry.add_resource(resource),
            Annotation::Model(model) => self.registry.add_model(model),
            Annotation::Api(api) => {
                if self.registry.add_api(api).is_err() {
                    self.registry.diagnostics_mut().notice(
                        "Unexpected \"@SWG\\Api\", should be inside or after a \"Resource\" declaration",
                        location,
                    );
                }
            }
            Annotation::Property(property) => {
                if self.registry.add_property(property).is_err() {
                    self.registry.diagnostics_mut().notice(
                        "Unexpected \"@SWG\\Property\", should be inside or after a \"Model\" declaration",
                        location,
                    );
                }
            }
            other => {
                self.registry.diagnostics_mut().notice(
                    format!(
                        "Unexpected \"@SWG\\{}\", expecting a \"Resource\", \"Model\" or partial declaration",
                        other.name()
                    ),
                    location,
                );
            }
        }
    }
}
