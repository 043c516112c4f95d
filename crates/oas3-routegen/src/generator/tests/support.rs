use serde_json::Value;

use crate::{
  generator::{
    codegen::CodegenConfig,
    document::Document,
    errors::GeneratorError,
    orchestrator::{GeneratedOutput, Orchestrator},
    schema_graph::{ResolvedGraph, resolve},
  },
  utils::spec::{SpecFormat, parse_document},
};

pub(super) fn yaml_tree(text: &str) -> Value {
  parse_document(text.as_bytes(), SpecFormat::Yaml).expect("failed to parse test document")
}

pub(super) fn json_tree(text: &str) -> Value {
  parse_document(text.as_bytes(), SpecFormat::Json).expect("failed to parse test document")
}

pub(super) fn document(tree: &Value) -> Document {
  Document::from_tree(tree).expect("failed to build document")
}

pub(super) fn graph(tree: &Value) -> ResolvedGraph {
  resolve(&document(tree)).expect("failed to resolve document")
}

pub(super) fn generate(tree: &Value) -> GeneratedOutput {
  generate_with(tree, CodegenConfig::default())
}

pub(super) fn generate_with(tree: &Value, config: CodegenConfig) -> GeneratedOutput {
  Orchestrator::from_tree(tree, config)
    .and_then(|orchestrator| orchestrator.generate("test.json"))
    .expect("generation failed")
}

/// The generator error a run failed with.
#[track_caller]
pub(super) fn generation_error(tree: &Value) -> GeneratorError {
  let err = Orchestrator::from_tree(tree, CodegenConfig::default())
    .and_then(|orchestrator| orchestrator.generate("test.json"))
    .expect_err("generation should fail");
  err
    .downcast_ref::<GeneratorError>()
    .cloned()
    .unwrap_or_else(|| panic!("unexpected error: {err:#}"))
}

/// Strips whitespace and trailing commas so assertions do not depend on how
/// the formatter wraps long lines.
pub(super) fn normalize(code: &str) -> String {
  code
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect::<String>()
    .replace(",)", ")")
    .replace(",}", "}")
    .replace(",]", "]")
    .replace(",>", ">")
}

#[track_caller]
pub(super) fn assert_code_contains(code: &str, expected: &str) {
  assert!(
    normalize(code).contains(&normalize(expected)),
    "expected generated code to contain:\n{expected}\n\ngenerated:\n{code}"
  );
}

#[track_caller]
pub(super) fn assert_code_lacks(code: &str, unexpected: &str) {
  assert!(
    !normalize(code).contains(&normalize(unexpected)),
    "expected generated code not to contain:\n{unexpected}\n\ngenerated:\n{code}"
  );
}

/// Position of `needle` in the normalized code, for ordering assertions.
#[track_caller]
pub(super) fn position_of(code: &str, needle: &str) -> usize {
  normalize(code)
    .find(&normalize(needle))
    .unwrap_or_else(|| panic!("`{needle}` not found in generated code"))
}
