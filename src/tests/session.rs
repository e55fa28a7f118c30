//! White-box tests of the load session: reset contract, option
//! processing, stream errors, script sequencing.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::FlexmodError,
    loader::DocumentLoader,
    model::ModelGraph,
    schema::{AttrType, ClassDef, FeatureDef, SchemaPackage, SchemaProvider, PACKAGES},
    script::{ScriptEngine, ScriptError},
    tests::helpers::{close, end, open, pi, shapes_schema},
};

fn canvas_document() -> Vec<crate::event::ParseEvent> {
    vec![
        open("canvas", &[("name", "main"), ("focus", "c1")], 1),
        open("shapes", &[], 2),
        open("circle", &[("name", "c1"), ("radius", "3.5")], 3),
        close("circle", 3),
        close("shapes", 4),
        close("canvas", 5),
        end(5),
    ]
}

#[test]
fn test_reparse_is_idempotent() {
    let mut loader = DocumentLoader::new(shapes_schema());

    let first = loader.load_events(canvas_document()).unwrap();
    let second = loader.load_events(canvas_document()).unwrap();

    assert_eq!(first.graph, second.graph);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.trace, second.trace);
    assert_eq!(first.unresolved, second.unresolved);
    assert!(first.warnings.is_empty());
}

#[test]
fn test_identifier_cache_discarded_after_resolution() {
    let mut loader = DocumentLoader::new(shapes_schema());
    loader.load_events(canvas_document()).unwrap();

    // The cache lives for exactly one load/resolve cycle.
    assert!(loader.id_cache.lookup("c1").is_empty());
    assert!(loader.stack.is_empty());
    assert!(loader.unresolved.is_empty());
}

#[test]
fn test_unknown_option_key_warns() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader
        .load_events(vec![pi("colour", "blue", 1), end(1)])
        .unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(
        result.warnings[0].message,
        "Could not process option colour: unknown option"
    );
}

#[test]
fn test_bad_option_value_keeps_prior_setting() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader
        .load_events(vec![
            pi("fuzzyMatchingThreshold", "lots", 1),
            // Threshold stays at the default 2, so the typo still maps.
            open("canvas", &[("name", "main")], 2),
            open("circl", &[("radius", "2.5")], 3),
            close("circl", 3),
            close("canvas", 4),
            end(4),
        ])
        .unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0]
        .message
        .starts_with("Could not process option fuzzyMatchingThreshold:"));
    assert_eq!(result.graph.len(), 2);
}

#[test]
fn test_threshold_option_applies_mid_parse() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader
        .load_events(vec![
            pi("fuzzyMatchingThreshold", "10", 1),
            open("canvas", &[("name", "main")], 2),
            open("circl", &[("radius", "2.5")], 3),
            close("circl", 3),
            close("canvas", 4),
            end(4),
        ])
        .unwrap();

    assert_eq!(
        result.warnings[0].message,
        "Could not map element circl to a model object"
    );
    // Only the canvas was created.
    assert_eq!(result.graph.len(), 1);
}

#[test]
fn test_unbalanced_close_is_fatal() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader.load_events(vec![close("canvas", 1), end(1)]);
    assert!(matches!(result, Err(FlexmodError::StreamAt(1, _))));
}

#[test]
fn test_unclosed_elements_at_end_are_fatal() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader.load_events(vec![open("canvas", &[("name", "main")], 1), end(2)]);
    assert!(matches!(result, Err(FlexmodError::StreamAt(2, _))));
}

#[test]
fn test_events_after_document_end_are_fatal() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader.load_events(vec![end(1), open("canvas", &[], 2)]);
    assert!(matches!(result, Err(FlexmodError::StreamAt(2, _))));
}

#[test]
fn test_missing_document_end_is_fatal() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader.load_events(vec![
        open("canvas", &[("name", "main")], 1),
        close("canvas", 1),
    ]);
    assert!(matches!(result, Err(FlexmodError::Stream(_))));
}

#[test]
fn test_source_errors_abort_the_load() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader.load(vec![
        Ok(open("canvas", &[("name", "main")], 1)),
        Err(FlexmodError::StreamAt(2, "unexpected byte".to_string())),
    ]);
    assert!(matches!(result, Err(FlexmodError::StreamAt(2, _))));
}

#[test]
fn test_nsuri_activates_registered_package() {
    PACKAGES.register(
        SchemaPackage::new(
            "http://example.org/press",
            vec![ClassDef::new("Magazine")
                .feature(FeatureDef::id_attribute("title", AttrType::Str))],
        )
        .unwrap(),
    );

    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader
        .load_events(vec![
            pi("nsuri", "http://example.org/press", 1),
            open("magazine", &[("title", "Monthly")], 2),
            close("magazine", 2),
            end(2),
        ])
        .unwrap();

    assert!(result.warnings.is_empty());
    assert_eq!(result.graph.roots().len(), 1);
    let root = result.graph.object(result.graph.roots()[0]);
    assert_eq!(loader.schema().class_name(root.class), "Magazine");
}

#[test]
fn test_unknown_nsuri_warns_and_continues() {
    let mut loader = DocumentLoader::new(shapes_schema());
    let result = loader
        .load_events(vec![
            pi("nsuri", "http://example.org/not-registered", 1),
            open("canvas", &[("name", "main")], 2),
            close("canvas", 2),
            end(2),
        ])
        .unwrap();

    assert_eq!(
        result.warnings[0].message,
        "Failed to locate a package for nsURI http://example.org/not-registered"
    );
    assert_eq!(result.graph.roots().len(), 1);
}

struct RecordingEngine {
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptEngine for RecordingEngine {
    fn run(&mut self, source: &str, _graph: &ModelGraph) -> Result<(), ScriptError> {
        self.log.lock().push(source.to_string());
        if let Some(problem) = source.strip_prefix("syntax!") {
            return Err(ScriptError::Syntax(format!("unexpected token {problem}")));
        }
        if source.starts_with("runtime!") {
            return Err(ScriptError::Runtime("evaluation failed".to_string()));
        }
        Ok(())
    }
}

#[test]
fn test_scripts_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut loader = DocumentLoader::new(shapes_schema())
        .script_engine(Box::new(RecordingEngine { log: log.clone() }));

    let result = loader
        .load_events(vec![
            pi("script", "first", 1),
            open("canvas", &[("name", "main")], 2),
            close("canvas", 2),
            pi("script", "second", 3),
            end(3),
        ])
        .unwrap();

    assert!(result.warnings.is_empty());
    assert_eq!(*log.lock(), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn test_script_runtime_failure_is_swallowed() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut loader = DocumentLoader::new(shapes_schema())
        .script_engine(Box::new(RecordingEngine { log: log.clone() }));

    let result = loader
        .load_events(vec![
            pi("script", "runtime!", 1),
            pi("script", "after", 2),
            end(2),
        ])
        .unwrap();

    // Runtime failures are not parse problems; later scripts still run.
    assert!(result.warnings.is_empty());
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_script_syntax_problem_warns_and_halts() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut loader = DocumentLoader::new(shapes_schema())
        .script_engine(Box::new(RecordingEngine { log: log.clone() }));

    let result = loader
        .load_events(vec![
            pi("script", "syntax!%", 1),
            pi("script", "never-run", 2),
            end(2),
        ])
        .unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].message, "unexpected token %");
    assert_eq!(*log.lock(), vec!["syntax!%".to_string()]);
}
