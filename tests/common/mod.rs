//! Shared fixtures for loader integration tests.

use std::sync::Arc;

use flexmod_core::{
    event::{Attribute, ParseEvent},
    schema::{
        AttrType, ClassDef, FeatureDef, FeatureId, PackageSet, SchemaPackage, SchemaProvider,
    },
};

/// A publishing metamodel exercising inheritance, containment
/// disambiguation, identifiers and references:
///
/// - `Library` contains `Book`s and `Author`s and references books both
///   singly (`featured`) and in bulk (`catalog`)
/// - `Novel` specializes `Book`
/// - `Anthology` declares a `Novel` containment before a broader `Book`
///   containment, so first-declared-wins placement is observable
pub fn library_package() -> SchemaPackage {
    SchemaPackage::new(
        "http://example.org/library",
        vec![
            ClassDef::new("Library")
                .feature(FeatureDef::id_attribute("name", AttrType::Str))
                .feature(FeatureDef::containment("books", "Book").many())
                .feature(FeatureDef::containment("authors", "Author").many())
                .feature(FeatureDef::reference("featured", "Book"))
                .feature(FeatureDef::reference("catalog", "Book").many()),
            ClassDef::new("Book")
                .feature(FeatureDef::id_attribute("title", AttrType::Str))
                .feature(FeatureDef::attribute("pages", AttrType::Int))
                .feature(FeatureDef::attribute("tags", AttrType::Str).many())
                .feature(FeatureDef::attribute("editions", AttrType::Int).many())
                .feature(FeatureDef::reference("authors", "Author").many()),
            ClassDef::new("Novel")
                .extends("Book")
                .feature(FeatureDef::attribute("series", AttrType::Str)),
            ClassDef::new("Author")
                .feature(FeatureDef::attribute("name", AttrType::Str))
                .feature(FeatureDef::attribute("born", AttrType::Int)),
            ClassDef::new("Anthology")
                .feature(FeatureDef::id_attribute("name", AttrType::Str))
                .feature(FeatureDef::containment("novels", "Novel").many())
                .feature(FeatureDef::containment("works", "Book").many()),
        ],
    )
    .expect("library package is well-formed")
}

pub fn library_schema() -> PackageSet {
    PackageSet::with_package(Arc::new(library_package()))
}

/// Look up a feature handle by class and feature name.
pub fn feature_id(schema: &PackageSet, class_name: &str, feature_name: &str) -> FeatureId {
    for class in schema.concrete_classes() {
        if schema.class_name(class) == class_name {
            for feature in schema.features(class) {
                if schema.feature_info(feature).name == feature_name {
                    return feature;
                }
            }
        }
    }
    panic!("no feature {class_name}.{feature_name} in fixture schema");
}

pub fn open(name: &str, attributes: &[(&str, &str)], line: u32) -> ParseEvent {
    ParseEvent::StartElement {
        name: name.to_string(),
        attributes: attributes
            .iter()
            .map(|(name, value)| Attribute::new(*name, *value))
            .collect(),
        line,
    }
}

pub fn close(name: &str, line: u32) -> ParseEvent {
    ParseEvent::EndElement {
        name: name.to_string(),
        line,
    }
}

pub fn pi(key: &str, value: &str, line: u32) -> ParseEvent {
    ParseEvent::ProcessingInstruction {
        key: key.to_string(),
        value: value.to_string(),
        line,
    }
}

pub fn end(line: u32) -> ParseEvent {
    ParseEvent::EndDocument { line }
}
