//! In-memory schema packages.
//!
//! A [`SchemaPackage`] is built once from plain-data [`ClassDef`] records,
//! validated and sealed (inheritance closure computed, reference targets
//! resolved), and is immutable afterwards; providers hand out cheap `Arc`
//! clones of sealed packages.

use serde::{Deserialize, Serialize};

use crate::{
    error::FlexmodError,
    model::Scalar,
    schema::{ClassId, ConvertError, FeatureInfo, FeatureKind},
};

/// Value type of a scalar attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    Str,
    Int,
    Float,
    Bool,
    /// A named enumeration over a fixed literal set. Converted values are
    /// stored as strings.
    Enum {
        name: String,
        literals: Vec<String>,
    },
}

/// Declaration-time description of a structural feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub kind: FeatureDefKind,
    pub many: bool,
    pub changeable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureDefKind {
    Attribute {
        value_type: AttrType,
        identifier: bool,
    },
    /// Reference target is the name of a class in the same package,
    /// resolved when the package is sealed.
    Reference {
        target: String,
        containment: bool,
    },
}

impl FeatureDef {
    pub fn attribute(name: impl Into<String>, value_type: AttrType) -> Self {
        FeatureDef {
            name: name.into(),
            kind: FeatureDefKind::Attribute {
                value_type,
                identifier: false,
            },
            many: false,
            changeable: true,
        }
    }

    /// An identifier-significant attribute: assigned values are indexed
    /// for reference resolution.
    pub fn id_attribute(name: impl Into<String>, value_type: AttrType) -> Self {
        FeatureDef {
            name: name.into(),
            kind: FeatureDefKind::Attribute {
                value_type,
                identifier: true,
            },
            many: false,
            changeable: true,
        }
    }

    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        FeatureDef {
            name: name.into(),
            kind: FeatureDefKind::Reference {
                target: target.into(),
                containment: false,
            },
            many: false,
            changeable: true,
        }
    }

    pub fn containment(name: impl Into<String>, target: impl Into<String>) -> Self {
        FeatureDef {
            name: name.into(),
            kind: FeatureDefKind::Reference {
                target: target.into(),
                containment: true,
            },
            many: false,
            changeable: true,
        }
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn unchangeable(mut self) -> Self {
        self.changeable = false;
        self
    }
}

/// Declaration-time description of a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub is_abstract: bool,
    /// Direct supertypes, by class name within the same package.
    pub supertypes: Vec<String>,
    pub features: Vec<FeatureDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDef {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        ClassDef {
            name: name.into(),
            is_abstract: true,
            ..Default::default()
        }
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn feature(mut self, feature: FeatureDef) -> Self {
        self.features.push(feature);
        self
    }
}

#[derive(Debug, Clone)]
struct SealedFeature {
    name: String,
    many: bool,
    changeable: bool,
    kind: SealedKind,
}

#[derive(Debug, Clone)]
enum SealedKind {
    Attribute {
        value_type: AttrType,
        identifier: bool,
    },
    Reference {
        target: usize,
        containment: bool,
    },
}

#[derive(Debug, Clone)]
struct SealedClass {
    name: String,
    is_abstract: bool,
    /// Transitive supertypes, root-most first.
    supertypes: Vec<usize>,
    /// Declared feature ids, declaration order.
    declared: Vec<usize>,
    /// Inherited features first, then declared, duplicates removed.
    all_features: Vec<usize>,
}

/// A sealed, immutable package of classes registered under a namespace URI.
#[derive(Debug, Clone)]
pub struct SchemaPackage {
    nsuri: String,
    classes: Vec<SealedClass>,
    features: Vec<SealedFeature>,
}

impl SchemaPackage {
    /// Validate and seal a package definition.
    ///
    /// Fails on duplicate class names, unknown supertype or reference
    /// target names, and inheritance cycles.
    pub fn new(nsuri: impl Into<String>, defs: Vec<ClassDef>) -> Result<Self, FlexmodError> {
        let nsuri = nsuri.into();
        let mut index = std::collections::HashMap::new();
        for (idx, def) in defs.iter().enumerate() {
            if index.insert(def.name.clone(), idx).is_some() {
                return Err(FlexmodError::Schema(format!(
                    "Duplicate class {} in package {}",
                    def.name, nsuri
                )));
            }
        }

        // Transitive supertype closure, root-most first.
        let mut closures: Vec<Option<Vec<usize>>> = vec![None; defs.len()];
        for idx in 0..defs.len() {
            Self::closure_of(idx, &defs, &index, &mut closures, &mut Vec::new())?;
        }

        let mut features = Vec::new();
        let mut classes = Vec::new();
        for (idx, def) in defs.iter().enumerate() {
            let mut declared = Vec::new();
            for feature in &def.features {
                let kind = match &feature.kind {
                    FeatureDefKind::Attribute {
                        value_type,
                        identifier,
                    } => SealedKind::Attribute {
                        value_type: value_type.clone(),
                        identifier: *identifier,
                    },
                    FeatureDefKind::Reference {
                        target,
                        containment,
                    } => {
                        let target = *index.get(target).ok_or_else(|| {
                            FlexmodError::Schema(format!(
                                "Unknown reference target {} on {}.{}",
                                target, def.name, feature.name
                            ))
                        })?;
                        SealedKind::Reference {
                            target,
                            containment: *containment,
                        }
                    }
                };
                declared.push(features.len());
                features.push(SealedFeature {
                    name: feature.name.clone(),
                    many: feature.many,
                    changeable: feature.changeable,
                    kind,
                });
            }
            classes.push(SealedClass {
                name: def.name.clone(),
                is_abstract: def.is_abstract,
                supertypes: closures[idx].clone().unwrap_or_default(),
                declared,
                all_features: Vec::new(),
            });
        }

        // Inherited-first feature lists, deduplicated in diamond setups.
        for idx in 0..classes.len() {
            let mut all = Vec::new();
            for supertype in classes[idx].supertypes.clone() {
                for feature in classes[supertype].declared.clone() {
                    if !all.contains(&feature) {
                        all.push(feature);
                    }
                }
            }
            for feature in classes[idx].declared.clone() {
                if !all.contains(&feature) {
                    all.push(feature);
                }
            }
            classes[idx].all_features = all;
        }

        Ok(SchemaPackage {
            nsuri,
            classes,
            features,
        })
    }

    fn closure_of(
        idx: usize,
        defs: &[ClassDef],
        index: &std::collections::HashMap<String, usize>,
        closures: &mut Vec<Option<Vec<usize>>>,
        visiting: &mut Vec<usize>,
    ) -> Result<Vec<usize>, FlexmodError> {
        if let Some(closure) = &closures[idx] {
            return Ok(closure.clone());
        }
        if visiting.contains(&idx) {
            return Err(FlexmodError::Schema(format!(
                "Inheritance cycle involving {}",
                defs[idx].name
            )));
        }
        visiting.push(idx);
        let mut closure: Vec<usize> = Vec::new();
        for name in &defs[idx].supertypes {
            let super_idx = *index.get(name).ok_or_else(|| {
                FlexmodError::Schema(format!(
                    "Unknown supertype {} of {}",
                    name, defs[idx].name
                ))
            })?;
            for ancestor in Self::closure_of(super_idx, defs, index, closures, visiting)? {
                if !closure.contains(&ancestor) {
                    closure.push(ancestor);
                }
            }
            if !closure.contains(&super_idx) {
                closure.push(super_idx);
            }
        }
        visiting.pop();
        closures[idx] = Some(closure.clone());
        Ok(closure)
    }

    pub fn nsuri(&self) -> &str {
        &self.nsuri
    }

    pub(crate) fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub(crate) fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn class_name(&self, local: usize) -> &str {
        &self.classes[local].name
    }

    pub(crate) fn is_abstract(&self, local: usize) -> bool {
        self.classes[local].is_abstract
    }

    pub(crate) fn supertypes(&self, local: usize) -> &[usize] {
        &self.classes[local].supertypes
    }

    pub(crate) fn all_features(&self, local: usize) -> &[usize] {
        &self.classes[local].all_features
    }

    /// Feature metadata with the reference target widened to a global
    /// [`ClassId`] by `class_base`, the id of this package's first class.
    pub(crate) fn feature_info(&self, local: usize, class_base: u32) -> FeatureInfo {
        let feature = &self.features[local];
        let kind = match &feature.kind {
            SealedKind::Attribute {
                value_type,
                identifier,
            } => FeatureKind::Attribute {
                value_type: value_type.clone(),
                identifier: *identifier,
            },
            SealedKind::Reference {
                target,
                containment,
            } => FeatureKind::Reference {
                target: ClassId(class_base + *target as u32),
                containment: *containment,
            },
        };
        FeatureInfo {
            name: feature.name.clone(),
            kind,
            many: feature.many,
            changeable: feature.changeable,
        }
    }

    pub(crate) fn convert(&self, local: usize, raw: &str) -> Result<Scalar, ConvertError> {
        let feature = &self.features[local];
        let value_type = match &feature.kind {
            SealedKind::Attribute { value_type, .. } => value_type,
            SealedKind::Reference { .. } => {
                // References never reach value conversion; treat the raw
                // text as opaque.
                return Ok(Scalar::Str(raw.to_string()));
            }
        };
        match value_type {
            AttrType::Str => Ok(Scalar::Str(raw.to_string())),
            AttrType::Int => raw.parse::<i64>().map(Scalar::Int).map_err(|_| {
                ConvertError::Malformed {
                    value: raw.to_string(),
                    expected: "an integer value".to_string(),
                }
            }),
            AttrType::Float => raw.parse::<f64>().map(Scalar::Float).map_err(|_| {
                ConvertError::Malformed {
                    value: raw.to_string(),
                    expected: "a floating point value".to_string(),
                }
            }),
            AttrType::Bool => raw.parse::<bool>().map(Scalar::Bool).map_err(|_| {
                ConvertError::Malformed {
                    value: raw.to_string(),
                    expected: "a boolean value".to_string(),
                }
            }),
            AttrType::Enum { name, literals } => {
                if literals.iter().any(|literal| literal == raw) {
                    Ok(Scalar::Str(raw.to_string()))
                } else {
                    Err(ConvertError::UnknownLiteral {
                        value: raw.to_string(),
                        enumeration: name.clone(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes_package() -> SchemaPackage {
        SchemaPackage::new(
            "http://example.org/shapes",
            vec![
                ClassDef::abstract_class("Shape")
                    .feature(FeatureDef::id_attribute("name", AttrType::Str)),
                ClassDef::new("Circle")
                    .extends("Shape")
                    .feature(FeatureDef::attribute("radius", AttrType::Float)),
                ClassDef::new("Canvas")
                    .feature(FeatureDef::containment("shapes", "Shape").many()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_inherited_features_come_first() {
        let package = shapes_package();
        let circle = 1;
        let features: Vec<&str> = package
            .all_features(circle)
            .iter()
            .map(|f| package.features[*f].name.as_str())
            .collect();
        assert_eq!(features, vec!["name", "radius"]);
    }

    #[test]
    fn test_transitive_supertypes_root_most_first() {
        let package = SchemaPackage::new(
            "http://example.org/deep",
            vec![
                ClassDef::abstract_class("A"),
                ClassDef::abstract_class("B").extends("A"),
                ClassDef::new("C").extends("B"),
            ],
        )
        .unwrap();
        assert_eq!(package.supertypes(2), &[0, 1]);
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let result = SchemaPackage::new(
            "http://example.org/dup",
            vec![ClassDef::new("A"), ClassDef::new("A")],
        );
        assert!(matches!(result, Err(FlexmodError::Schema(_))));
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let result = SchemaPackage::new(
            "http://example.org/cycle",
            vec![
                ClassDef::new("A").extends("B"),
                ClassDef::new("B").extends("A"),
            ],
        );
        assert!(matches!(result, Err(FlexmodError::Schema(_))));
    }

    #[test]
    fn test_unknown_reference_target_rejected() {
        let result = SchemaPackage::new(
            "http://example.org/missing",
            vec![ClassDef::new("A").feature(FeatureDef::reference("to", "Nowhere"))],
        );
        assert!(matches!(result, Err(FlexmodError::Schema(_))));
    }

    #[test]
    fn test_convert_failures_are_typed() {
        let package = SchemaPackage::new(
            "http://example.org/conv",
            vec![ClassDef::new("A")
                .feature(FeatureDef::attribute("count", AttrType::Int))
                .feature(FeatureDef::attribute(
                    "kind",
                    AttrType::Enum {
                        name: "Kind".to_string(),
                        literals: vec!["solid".to_string(), "dashed".to_string()],
                    },
                ))],
        )
        .unwrap();

        assert_eq!(package.convert(0, "42"), Ok(Scalar::Int(42)));
        assert!(matches!(
            package.convert(0, "forty-two"),
            Err(ConvertError::Malformed { .. })
        ));
        assert_eq!(
            package.convert(1, "solid"),
            Ok(Scalar::Str("solid".to_string()))
        );
        assert!(matches!(
            package.convert(1, "dotted"),
            Err(ConvertError::UnknownLiteral { .. })
        ));
    }
}
