//! Shared test utilities for loader testing.

use std::sync::Arc;

use crate::{
    event::{Attribute, ParseEvent},
    schema::{AttrType, ClassDef, FeatureDef, PackageSet, SchemaPackage},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A minimal drawing metamodel: one abstract supertype, one containment.
pub fn shapes_package() -> SchemaPackage {
    SchemaPackage::new(
        "http://example.org/shapes",
        vec![
            ClassDef::abstract_class("Shape")
                .feature(FeatureDef::id_attribute("name", AttrType::Str)),
            ClassDef::new("Circle")
                .extends("Shape")
                .feature(FeatureDef::attribute("radius", AttrType::Float)),
            ClassDef::new("Square")
                .extends("Shape")
                .feature(FeatureDef::attribute("side", AttrType::Float)),
            ClassDef::new("Canvas")
                .feature(FeatureDef::id_attribute("name", AttrType::Str))
                .feature(FeatureDef::containment("shapes", "Shape").many())
                .feature(FeatureDef::reference("focus", "Shape")),
        ],
    )
    .expect("shapes package is well-formed")
}

pub fn shapes_schema() -> PackageSet {
    init_logging();
    PackageSet::with_package(Arc::new(shapes_package()))
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
