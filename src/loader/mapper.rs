//! The element dispatch state machine.
//!
//! One [`StackEntry`] is pushed per element open and popped at its close.
//! The entry kinds form a tagged union so every transition handles all
//! three parse contexts explicitly: an unmapped subtree, an open
//! containment slot awaiting children, or a normal in-progress object.

use crate::{
    error::FlexmodError,
    event::Attribute,
    loader::{matcher, DocumentLoader},
    model::ObjectId,
    schema::{ClassId, FeatureId, FeatureKind, SchemaProvider},
};

/// Parse context for one open element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackEntry {
    /// The element could not be mapped; its subtree is skipped (children
    /// are still visited so orphan recovery can pick them up).
    Unmapped,
    /// An attribute-less element named a containment reference of its
    /// parent: every element opened while this is on top is placed into
    /// `reference` on `owner`.
    Slot {
        reference: FeatureId,
        target: ClassId,
        owner: ObjectId,
        filled: usize,
    },
    /// A normal in-progress object.
    Object(ObjectId),
}

impl<S: SchemaProvider> DocumentLoader<S> {
    pub(crate) fn start_element(
        &mut self,
        name: &str,
        attributes: &[Attribute],
    ) -> Result<(), FlexmodError> {
        // Strip a namespace prefix before any matching.
        let name = match name.split_once(':') {
            Some((_, local)) => local,
            None => name,
        };

        let top = match self.stack.last() {
            // Document root.
            None => return self.open_root(name, attributes),
            // Children of unmapped elements retry against the whole class
            // set when orphan recovery is on.
            Some(StackEntry::Unmapped) if self.options.orphans_as_top_level => {
                return self.open_root(name, attributes)
            }
            Some(top) => *top,
        };
        match top {
            StackEntry::Unmapped => {
                self.stack.push(StackEntry::Unmapped);
                self.add_warning(format!("Could not map element {name} to a model object"));
                Ok(())
            }
            StackEntry::Slot {
                reference,
                target,
                owner,
                ..
            } => self.open_in_slot(name, attributes, reference, target, owner),
            StackEntry::Object(parent) => self.open_in_parent(name, attributes, parent),
        }
    }

    /// Map an element at the document root, or an orphan's child being
    /// adopted as a root: the whole concrete class set is the candidate
    /// space.
    fn open_root(&mut self, name: &str, attributes: &[Attribute]) -> Result<(), FlexmodError> {
        match self.class_for_name(name) {
            Some(class) => {
                tracing::trace!("element {} mapped to root class {:?}", name, class);
                let object = self.instantiate(class)?;
                self.graph.add_root(object);
                self.set_attributes(object, attributes);
                self.stack.push(StackEntry::Object(object));
            }
            None => {
                self.add_warning(format!("Could not map element {name} to a model object"));
                self.stack.push(StackEntry::Unmapped);
            }
        }
        Ok(())
    }

    /// Map an element under an open containment slot: candidates are the
    /// concrete subtypes of the slot reference's target.
    fn open_in_slot(
        &mut self,
        name: &str,
        attributes: &[Attribute],
        reference: FeatureId,
        target: ClassId,
        owner: ObjectId,
    ) -> Result<(), FlexmodError> {
        let candidates = {
            let subtypes = self.subtypes_of(target);
            self.named_candidates(subtypes)
        };
        let threshold = self.options.fuzzy_matching_threshold;
        match matcher::resolve_name(name, &candidates, threshold) {
            Some(class) => {
                let object = self.instantiate(class)?;
                self.place_in_reference(owner, reference, object);
                if let Some(StackEntry::Slot { filled, .. }) = self.stack.last_mut() {
                    *filled += 1;
                }
                self.set_attributes(object, attributes);
                self.stack.push(StackEntry::Object(object));
            }
            None => {
                self.stack.push(StackEntry::Unmapped);
                self.add_warning(format!("Could not map element {name} to a model object"));
            }
        }
        Ok(())
    }

    /// Map an element under an in-progress object: first as a containment
    /// slot name (attribute-less elements only), then as an instance of
    /// some containment reference's subtype union.
    fn open_in_parent(
        &mut self,
        name: &str,
        attributes: &[Attribute],
        parent: ObjectId,
    ) -> Result<(), FlexmodError> {
        let parent_class = self.graph.class_of(parent);
        let containments = self.containments_of(parent_class);
        let threshold = self.options.fuzzy_matching_threshold;

        if attributes.is_empty() {
            let slot_candidates: Vec<(String, (FeatureId, ClassId))> = containments
                .iter()
                .map(|(name, reference, target)| (name.clone(), (*reference, *target)))
                .collect();
            let hit = if self.options.fuzzy_containment_matching {
                matcher::resolve_name(name, &slot_candidates, threshold)
            } else {
                matcher::exact_match(name, &slot_candidates)
            };
            if let Some((reference, target)) = hit {
                tracing::trace!("element {} opened a containment slot", name);
                self.stack.push(StackEntry::Slot {
                    reference,
                    target,
                    owner: parent,
                    filled: 0,
                });
                return Ok(());
            }
        }

        // Candidate classes: the union of concrete subtypes across every
        // containment reference, in declaration order.
        let mut candidate_classes: Vec<ClassId> = Vec::new();
        for (_, _, target) in &containments {
            for class in self.subtypes_of(*target) {
                if !candidate_classes.contains(&class) {
                    candidate_classes.push(class);
                }
            }
        }
        let named = self.named_candidates(candidate_classes);

        let chosen = matcher::resolve_name(name, &named, threshold).and_then(|class| {
            // First declared containment reference whose subtype set
            // contains the matched class wins; this is deliberately not a
            // best-match search.
            containments
                .iter()
                .find(|(_, _, target)| self.subtypes_of(*target).contains(&class))
                .map(|(_, reference, _)| (class, *reference))
        });

        match chosen {
            Some((class, reference)) => {
                let object = self.instantiate(class)?;
                self.place_in_reference(parent, reference, object);
                self.set_attributes(object, attributes);
                self.stack.push(StackEntry::Object(object));
            }
            None => {
                self.stack.push(StackEntry::Unmapped);
                self.add_warning(format!("Could not map element {name} to a model object"));
            }
        }
        Ok(())
    }

    pub(crate) fn end_element(&mut self, _name: &str) -> Result<(), FlexmodError> {
        match self.stack.pop() {
            Some(StackEntry::Object(object)) => {
                self.trace.record(object, self.current_line);
                Ok(())
            }
            Some(StackEntry::Slot {
                reference,
                filled: 0,
                ..
            }) => {
                let name = self.schema.feature_info(reference).name;
                self.add_warning(format!(
                    "No element supplied for containment reference {name}"
                ));
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(FlexmodError::StreamAt(
                self.current_line,
                "element close without a matching open".to_string(),
            )),
        }
    }

    fn instantiate(&mut self, class: ClassId) -> Result<ObjectId, FlexmodError> {
        let object = self.schema.instantiate(class)?;
        Ok(self.graph.insert(object))
    }

    /// Place a contained child into `reference` on `owner`, appending for
    /// many-valued references and overwriting for single-valued ones.
    fn place_in_reference(&mut self, owner: ObjectId, reference: FeatureId, child: ObjectId) {
        if self.schema.feature_info(reference).many {
            self.graph.object_mut(owner).push_child(reference, child);
        } else {
            self.graph.object_mut(owner).set_child(reference, child);
        }
    }

    /// The containment references of `class`, declaration order, with
    /// their names and target classes.
    fn containments_of(&mut self, class: ClassId) -> Vec<(String, FeatureId, ClassId)> {
        self.schema
            .features(class)
            .into_iter()
            .filter_map(|feature| {
                let info = self.schema.feature_info(feature);
                match info.kind {
                    FeatureKind::Reference {
                        target,
                        containment: true,
                    } => Some((info.name, feature, target)),
                    _ => None,
                }
            })
            .collect()
    }
}
