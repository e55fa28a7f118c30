//! The process-wide package registry and the session-facing provider built
//! on top of it.
//!
//! [`PACKAGES`] is the shared read-only registry: hosts register sealed
//! [`SchemaPackage`]s under their namespace URI once at startup, and every
//! load session consults it when a document activates a namespace. A
//! [`PackageSet`] is one session's view: the packages currently visible to
//! class lookups, growable mid-parse through
//! [`SchemaProvider::activate_namespace`].

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    error::FlexmodError,
    model::{ModelObject, Scalar},
    schema::{ClassId, ConvertError, FeatureId, FeatureInfo, SchemaPackage, SchemaProvider},
};

/// Global singleton package registry.
pub static PACKAGES: Lazy<PackageRegistry> = Lazy::new(PackageRegistry::create);

/// Thread-safe registry of sealed packages keyed by namespace URI.
///
/// Pattern matches the registry style used for codecs: `Lazy` singleton,
/// `RwLock` interior, cheap `Arc` handout.
pub struct PackageRegistry(Arc<RwLock<HashMap<String, Arc<SchemaPackage>>>>);

impl Clone for PackageRegistry {
    fn clone(&self) -> Self {
        PackageRegistry(self.0.clone())
    }
}

impl PackageRegistry {
    pub fn create() -> Self {
        PackageRegistry(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Register a package under its namespace URI.
    ///
    /// An existing package under the same URI is overwritten and a log
    /// message emitted.
    pub fn register(&self, package: SchemaPackage) {
        while self.0.is_locked() {
            tracing::info!("[PackageRegistry::register] Waiting for write access to the registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let mut writer = self.0.write();
        let nsuri = package.nsuri().to_string();
        if writer.contains_key(&nsuri) {
            tracing::info!(
                "[PackageRegistry::register] Overwriting existing package: {}",
                nsuri
            );
        }
        writer.insert(nsuri, Arc::new(package));
    }

    /// Retrieve a package by namespace URI as a cheap `Arc` clone.
    pub fn get(&self, nsuri: &str) -> Option<Arc<SchemaPackage>> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[PackageRegistry::get] Waiting for read access to the registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let reader = self.0.read();
        reader.get(nsuri).cloned()
    }

    pub fn list_nsuris(&self) -> Vec<String> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[PackageRegistry::list_nsuris] Waiting for read access to the registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let reader = self.0.read();
        reader.keys().cloned().collect()
    }
}

/// A [`SchemaProvider`] over an ordered set of sealed packages.
///
/// Class and feature handles are global across the set: each package's
/// classes and features occupy a contiguous id range starting at the
/// package's base offset. Activating another namespace appends a package,
/// so previously issued handles stay valid.
#[derive(Debug, Clone, Default)]
pub struct PackageSet {
    packages: Vec<Arc<SchemaPackage>>,
    class_base: Vec<u32>,
    feature_base: Vec<u32>,
}

impl PackageSet {
    pub fn new() -> Self {
        PackageSet::default()
    }

    pub fn with_package(package: Arc<SchemaPackage>) -> Self {
        let mut set = PackageSet::new();
        set.push(package);
        set
    }

    /// Append a package to the active set. Returns false (and leaves the
    /// set unchanged) when a package with the same namespace URI is
    /// already active.
    pub fn push(&mut self, package: Arc<SchemaPackage>) -> bool {
        if self
            .packages
            .iter()
            .any(|active| active.nsuri() == package.nsuri())
        {
            return false;
        }
        let class_base = self
            .class_base
            .last()
            .zip(self.packages.last())
            .map(|(base, last)| base + last.class_count() as u32)
            .unwrap_or(0);
        let feature_base = self
            .feature_base
            .last()
            .zip(self.packages.last())
            .map(|(base, last)| base + last.feature_count() as u32)
            .unwrap_or(0);
        self.class_base.push(class_base);
        self.feature_base.push(feature_base);
        self.packages.push(package);
        true
    }

    fn locate_class(&self, class: ClassId) -> (usize, usize) {
        for (idx, package) in self.packages.iter().enumerate() {
            let base = self.class_base[idx];
            if class.0 >= base && class.0 < base + package.class_count() as u32 {
                return (idx, (class.0 - base) as usize);
            }
        }
        panic!("class handle {class:?} does not belong to this provider");
    }

    fn locate_feature(&self, feature: FeatureId) -> (usize, usize) {
        for (idx, package) in self.packages.iter().enumerate() {
            let base = self.feature_base[idx];
            if feature.0 >= base && feature.0 < base + package.feature_count() as u32 {
                return (idx, (feature.0 - base) as usize);
            }
        }
        panic!("feature handle {feature:?} does not belong to this provider");
    }
}

impl SchemaProvider for PackageSet {
    fn concrete_classes(&self) -> Vec<ClassId> {
        let mut out = Vec::new();
        for (idx, package) in self.packages.iter().enumerate() {
            let base = self.class_base[idx];
            for local in 0..package.class_count() {
                if !package.is_abstract(local) {
                    out.push(ClassId(base + local as u32));
                }
            }
        }
        out
    }

    fn class_name(&self, class: ClassId) -> String {
        let (idx, local) = self.locate_class(class);
        self.packages[idx].class_name(local).to_string()
    }

    fn supertypes(&self, class: ClassId) -> Vec<ClassId> {
        let (idx, local) = self.locate_class(class);
        let base = self.class_base[idx];
        self.packages[idx]
            .supertypes(local)
            .iter()
            .map(|supertype| ClassId(base + *supertype as u32))
            .collect()
    }

    fn features(&self, class: ClassId) -> Vec<FeatureId> {
        let (idx, local) = self.locate_class(class);
        let base = self.feature_base[idx];
        self.packages[idx]
            .all_features(local)
            .iter()
            .map(|feature| FeatureId(base + *feature as u32))
            .collect()
    }

    fn feature_info(&self, feature: FeatureId) -> FeatureInfo {
        let (idx, local) = self.locate_feature(feature);
        self.packages[idx].feature_info(local, self.class_base[idx])
    }

    fn instantiate(&self, class: ClassId) -> Result<ModelObject, FlexmodError> {
        let (idx, local) = self.locate_class(class);
        if self.packages[idx].is_abstract(local) {
            return Err(FlexmodError::Schema(format!(
                "Cannot instantiate abstract class {}",
                self.packages[idx].class_name(local)
            )));
        }
        Ok(ModelObject::new(class))
    }

    fn convert(&self, attribute: FeatureId, raw: &str) -> Result<Scalar, ConvertError> {
        let (idx, local) = self.locate_feature(attribute);
        self.packages[idx].convert(local, raw)
    }

    fn activate_namespace(&mut self, nsuri: &str) -> bool {
        match PACKAGES.get(nsuri) {
            Some(package) => {
                tracing::debug!("Activating package for nsURI {}", nsuri);
                self.push(package);
                true
            }
            None => false,
        }
    }
}
