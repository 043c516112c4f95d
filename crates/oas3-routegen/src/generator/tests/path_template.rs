use crate::generator::{
  document::{Parameter, ParameterLocation, ScalarKind, ScalarSchema, SchemaNode},
  errors::GeneratorError,
  path_template::compile_path,
};

fn param(name: &str, location: ParameterLocation, required: bool) -> Parameter<String> {
  Parameter::builder()
    .name(name)
    .location(location)
    .required(required)
    .schema(SchemaNode::Scalar(ScalarSchema::new(ScalarKind::String)))
    .build()
}

fn path(name: &str) -> Parameter<String> {
  param(name, ParameterLocation::Path, true)
}

#[test]
fn test_placeholders_in_template_order() {
  // Declared in the opposite order of the template.
  let parameters = [path("noteId"), path("itemId")];
  let compiled = compile_path("/api/v1/items/{itemId}/notes/{noteId}", &parameters).unwrap();

  assert_eq!(compiled.ordered_params, vec!["itemId", "noteId"]);
  assert_eq!(compiled.rewritten, "/api/v1/items/:itemId/notes/:noteId");
  assert_eq!(compiled.template, "/api/v1/items/{itemId}/notes/{noteId}");
}

#[test]
fn test_literal_only_template() {
  let compiled = compile_path::<String>("/api/v1/plan", &[]).unwrap();
  assert!(compiled.ordered_params.is_empty());
  assert_eq!(compiled.rewritten, "/api/v1/plan");
}

#[test]
fn test_literal_text_around_placeholders_is_kept() {
  let parameters = [path("name"), path("version")];
  let compiled = compile_path("/files/{name}.json/v{version}/", &parameters).unwrap();
  assert_eq!(compiled.rewritten, "/files/:name.json/v:version/");
  assert_eq!(compiled.ordered_params, vec!["name", "version"]);
}

#[test]
fn test_placeholder_declared_in_query() {
  let parameters = [param("id", ParameterLocation::Query, true)];
  let err = compile_path("/items/{id}", &parameters).unwrap_err();

  let GeneratorError::ParameterMismatch { parameter, path, reason } = &err else {
    panic!("expected parameter mismatch, got {err:?}");
  };
  assert_eq!(parameter, "id");
  assert_eq!(path, "/items/{id}");
  assert!(reason.contains("query"), "reason: {reason}");
  assert!(err.to_string().contains("'id'"));
}

#[test]
fn test_placeholder_without_parameter() {
  let err = compile_path::<String>("/items/{id}", &[]).unwrap_err();
  assert!(matches!(err, GeneratorError::ParameterMismatch { ref parameter, .. } if parameter == "id"));
}

#[test]
fn test_unreferenced_path_parameter() {
  let parameters = [path("id"), path("extra")];
  let err = compile_path("/items/{id}", &parameters).unwrap_err();
  assert_eq!(err, GeneratorError::ParameterMismatch {
    parameter: "extra".to_string(),
    path: "/items/{id}".to_string(),
    reason: "path parameter is not referenced by the template".to_string(),
  });
}

#[test]
fn test_optional_path_parameter() {
  let parameters = [param("id", ParameterLocation::Path, false)];
  let err = compile_path("/items/{id}", &parameters).unwrap_err();
  assert_eq!(err, GeneratorError::ParameterMismatch {
    parameter: "id".to_string(),
    path: "/items/{id}".to_string(),
    reason: "path parameters must be required".to_string(),
  });
}

#[test]
fn test_repeated_placeholder() {
  let parameters = [path("id")];
  let err = compile_path("/items/{id}/copies/{id}", &parameters).unwrap_err();
  assert!(matches!(err, GeneratorError::ParameterMismatch { .. }));
}

#[test]
fn test_query_parameters_do_not_need_placeholders() {
  let parameters = [path("id"), param("limit", ParameterLocation::Query, false)];
  assert!(compile_path("/items/{id}", &parameters).is_ok());
}

#[test]
fn test_malformed_templates() {
  let parameters = [path("id")];
  for template in ["/items/{id", "/items/{}", "/items/id}", "/items/{a{id}}"] {
    let err = compile_path(template, &parameters).unwrap_err();
    assert!(
      matches!(&err, GeneratorError::InvalidTemplate { path, .. } if path == template),
      "unexpected error {err:?} for {template}"
    );
  }
}

#[test]
fn test_malformed_template_reasons() {
  let err = compile_path::<String>("/items/{id", &[]).unwrap_err();
  assert_eq!(
    err.to_string(),
    "invalid path template '/items/{id': unclosed '{' at position 0 in segment '{id'"
  );
}
