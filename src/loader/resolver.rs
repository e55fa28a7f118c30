//! End-of-document reference resolution and the identifier cache.
//!
//! The cache maps identifier text (from identifier-significant attributes)
//! to the objects that declared it, in document order. It exists for one
//! load/resolve cycle only and is discarded once the pass completes,
//! whether or not every reference resolved.

use std::collections::HashMap;

use crate::{
    loader::{DocumentLoader, ParseWarning},
    model::ObjectId,
    schema::{FeatureKind, SchemaProvider},
};

/// The wildcard value resolving a many-valued reference to every instance
/// of the target type in the document.
pub(crate) const WILDCARD: &str = "*";

#[derive(Debug, Default)]
pub(crate) struct IdCache {
    entries: HashMap<String, Vec<ObjectId>>,
}

impl IdCache {
    pub(crate) fn register(&mut self, id: &str, object: ObjectId) {
        self.entries.entry(id.to_string()).or_default().push(object);
    }

    pub(crate) fn lookup(&self, id: &str) -> &[ObjectId] {
        self.entries.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<S: SchemaProvider> DocumentLoader<S> {
    /// Resolve every queued reference, report what is left, discard the
    /// identifier cache.
    pub(crate) fn resolve_references(&mut self) {
        let pending = std::mem::take(&mut self.unresolved);
        let total = pending.len();
        let mut remaining = Vec::new();

        for reference in pending {
            let info = self.schema.feature_info(reference.reference);
            let target = match info.kind {
                FeatureKind::Reference { target, .. } => target,
                // Only reference features are ever queued.
                FeatureKind::Attribute { .. } => continue,
            };

            if info.many && reference.value == WILDCARD {
                for candidate in self.graph.all_contents() {
                    let class = self.graph.class_of(candidate);
                    if self.conforms(class, target) {
                        self.graph
                            .object_mut(reference.object)
                            .push_ref(reference.reference, candidate);
                    }
                }
                continue;
            }

            let candidates: Vec<ObjectId> = self.id_cache.lookup(&reference.value).to_vec();
            let mut resolved = false;
            for candidate in candidates {
                let class = self.graph.class_of(candidate);
                if self.conforms(class, target) {
                    if info.many {
                        self.graph
                            .object_mut(reference.object)
                            .push_ref(reference.reference, candidate);
                    } else {
                        self.graph
                            .object_mut(reference.object)
                            .set_ref(reference.reference, candidate);
                    }
                    resolved = true;
                    break;
                }
            }
            if !resolved {
                remaining.push(reference);
            }
        }

        tracing::debug!(
            "reference resolution: {} resolved, {} pending",
            total - remaining.len(),
            remaining.len()
        );

        for reference in &remaining {
            let reference_name = self.schema.feature_info(reference.reference).name;
            self.warnings.push(ParseWarning::new(
                format!(
                    "Could not resolve target {} for reference {} ({})",
                    reference.value, reference.attribute_name, reference_name
                ),
                reference.line,
            ));
        }
        self.unresolved = remaining;
        self.id_cache.clear();
    }
}
