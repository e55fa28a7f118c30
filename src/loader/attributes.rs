//! Attribute and reference assignment for newly created objects.
//!
//! Scalar attributes are converted and set immediately; reference-valued
//! attributes only queue [`UnresolvedReference`]s, since their targets may
//! not exist yet. Each raw attribute consumes its matched feature so one
//! element cannot assign the same feature twice.

use crate::{
    event::Attribute,
    loader::{matcher, DocumentLoader, UnresolvedReference},
    model::ObjectId,
    schema::{FeatureId, FeatureKind, SchemaProvider},
};

impl<S: SchemaProvider> DocumentLoader<S> {
    pub(crate) fn set_attributes(&mut self, object: ObjectId, attributes: &[Attribute]) {
        self.trace.record(object, self.current_line);

        let class = self.graph.class_of(object);
        let mut candidates: Vec<(String, FeatureId)> = self
            .schema
            .features(class)
            .into_iter()
            .filter_map(|feature| {
                let info = self.schema.feature_info(feature);
                info.attribute_settable().then_some((info.name, feature))
            })
            .collect();
        let threshold = self.options.fuzzy_matching_threshold;

        for attribute in attributes {
            let Some(feature) = matcher::resolve_name(&attribute.name, &candidates, threshold)
            else {
                let class_name = self.schema.class_name(class);
                self.add_warning(format!(
                    "Could not map attribute {} to a structural feature of {}",
                    attribute.name, class_name
                ));
                continue;
            };
            candidates.retain(|(_, candidate)| *candidate != feature);

            let info = self.schema.feature_info(feature);
            match info.kind {
                FeatureKind::Attribute { identifier, .. } => {
                    if info.many {
                        for part in attribute.value.split(',') {
                            let part = part.trim();
                            match self.schema.convert(feature, part) {
                                Ok(value) => {
                                    self.graph.object_mut(object).push_scalar(feature, value)
                                }
                                Err(err) => self.add_warning(format!(
                                    "{err} in the value of {}",
                                    attribute.name
                                )),
                            }
                        }
                    } else {
                        match self.schema.convert(feature, &attribute.value) {
                            Ok(value) => {
                                self.graph.object_mut(object).set_scalar(feature, value);
                                // Index the raw text, not the converted
                                // value; resolution matches on what was
                                // written.
                                if identifier || info.name.eq_ignore_ascii_case("name") {
                                    self.id_cache.register(&attribute.value, object);
                                }
                            }
                            Err(err) => self
                                .add_warning(format!("{err} in the value of {}", attribute.name)),
                        }
                    }
                }
                FeatureKind::Reference { .. } => {
                    if info.many {
                        for part in attribute.value.split(',') {
                            self.unresolved.push(UnresolvedReference {
                                object,
                                reference: feature,
                                attribute_name: attribute.name.clone(),
                                value: part.trim().to_string(),
                                line: self.current_line,
                            });
                        }
                    } else {
                        self.unresolved.push(UnresolvedReference {
                            object,
                            reference: feature,
                            attribute_name: attribute.name.clone(),
                            value: attribute.value.clone(),
                            line: self.current_line,
                        });
                    }
                }
            }
        }
    }
}
