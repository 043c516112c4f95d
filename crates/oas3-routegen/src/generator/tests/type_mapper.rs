use serde_json::{Value, json};

use super::support::{graph, yaml_tree};
use crate::{
  fixtures,
  generator::{
    descriptor::{RustPrimitive, TypeDescriptor},
    document::{Literal, ScalarKind},
    errors::GeneratorError,
    schema_graph::ResolvedGraph,
    type_mapper::{TypeMapper, TypeScope},
  },
};

fn component(graph: &ResolvedGraph, name: &str) -> TypeDescriptor {
  let id = graph.lookup(name).unwrap();
  TypeMapper::new(graph).map_component(id).unwrap()
}

fn single(schema: Value) -> ResolvedGraph {
  graph(&json!({ "components": { "schemas": { "Subject": schema } } }))
}

fn map_error(schema: Value) -> GeneratorError {
  let graph = single(schema);
  let id = graph.lookup("Subject").unwrap();
  TypeMapper::new(&graph).map_component(id).unwrap_err()
}

fn case_names(descriptor: &TypeDescriptor) -> Vec<&str> {
  let TypeDescriptor::Enumeration(enumeration) = descriptor else {
    panic!("expected enumeration, got {descriptor:?}");
  };
  enumeration.cases.iter().map(|case| case.name.as_str()).collect()
}

#[test]
fn test_equal_nodes_map_to_equal_descriptors() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));
  let mapper = TypeMapper::new(&graph);
  let plan = &graph.operations()[0];

  let mode = plan.parameters.iter().find(|p| p.name == "mode").unwrap();
  let scope = TypeScope::parameter("mode");
  let first = mapper.map_type(&mode.schema, &scope).unwrap();
  let second = mapper.map_type(&mode.schema.clone(), &scope.clone()).unwrap();
  assert_eq!(first, second);

  for (id, _) in graph.schemas() {
    assert_eq!(mapper.map_component(id).unwrap(), mapper.map_component(id).unwrap());
  }
}

#[test]
fn test_string_enum_keeps_declared_cases() {
  let tree = yaml_tree(
    r"
paths:
  /items:
    get:
      operationId: listItems
      parameters:
        - in: query
          name: sort
          description: Sort order
          schema:
            type: string
            enum: [asc, desc]
",
  );
  let graph = graph(&tree);
  let sort = &graph.operations()[0].parameters[0];
  let descriptor = TypeMapper::new(&graph)
    .map_type(&sort.schema, &TypeScope::parameter(&sort.name))
    .unwrap();

  assert_eq!(case_names(&descriptor), vec!["asc", "desc"]);
  let TypeDescriptor::Enumeration(enumeration) = &descriptor else {
    unreachable!();
  };
  assert_eq!(enumeration.name, "SortEnum");
  assert_eq!(enumeration.kind, ScalarKind::String);
  assert_eq!(enumeration.repr, RustPrimitive::String);
  assert_eq!(enumeration.default, None);
}

#[test]
fn test_similar_enum_literals_stay_distinct() {
  let descriptor = component(
    &single(json!({ "type": "string", "enum": ["CAR_PARK", "CAR_TO_PARK", "CAR_PARK"] })),
    "Subject",
  );
  assert_eq!(case_names(&descriptor), vec!["CAR_PARK", "CAR_TO_PARK"]);
}

#[test]
fn test_component_and_field_enum_names() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));

  let direction = component(&graph, "RelativeDirection");
  assert_eq!(direction.declared_name(), Some("RelativeDirection"));
  assert_eq!(case_names(&direction)[..2], ["DEPART", "HARD_LEFT"]);

  let TypeDescriptor::Record(leg) = component(&graph, "Leg") else {
    panic!("expected record");
  };
  let mode = leg.fields.iter().find(|field| field.name == "mode").unwrap();
  assert_eq!(mode.ty.unwrap_optional().declared_name(), Some("LegModeEnum"));
}

#[test]
fn test_record_fields_follow_required() {
  let descriptor = component(
    &single(json!({
      "type": "object",
      "description": "A subject.",
      "required": ["id"],
      "properties": {
        "id": { "type": "string" },
        "count": { "type": "integer", "format": "int32" }
      }
    })),
    "Subject",
  );
  let TypeDescriptor::Record(record) = &descriptor else {
    panic!("expected record, got {descriptor:?}");
  };
  assert_eq!(record.name, "Subject");
  assert_eq!(record.description.as_deref(), Some("A subject."));

  assert!(record.fields[0].required);
  assert!(matches!(record.fields[0].ty, TypeDescriptor::Primitive(_)));

  assert!(!record.fields[1].required);
  let TypeDescriptor::Optional(inner) = &record.fields[1].ty else {
    panic!("expected optional field");
  };
  let TypeDescriptor::Primitive(count) = inner.as_ref() else {
    panic!("expected primitive");
  };
  assert_eq!(count.repr, RustPrimitive::I32);
}

#[test]
fn test_nested_records_are_named_by_scope() {
  let descriptor = component(
    &single(json!({
      "type": "object",
      "properties": {
        "owner": { "type": "object", "properties": { "display_name": { "type": "string" } } }
      }
    })),
    "Subject",
  );
  let TypeDescriptor::Record(record) = &descriptor else {
    panic!("expected record");
  };
  assert_eq!(record.fields[0].ty.unwrap_optional().declared_name(), Some("SubjectOwner"));

  let declared = descriptor
    .anonymous_declarations(true)
    .into_iter()
    .filter_map(TypeDescriptor::declared_name)
    .collect::<Vec<_>>();
  assert_eq!(declared, vec!["SubjectOwner", "Subject"]);
}

#[test]
fn test_scalar_formats_and_defaults() {
  let descriptor = component(
    &single(json!({ "type": "number", "format": "float", "default": 1, "minimum": 0 })),
    "Subject",
  );
  let TypeDescriptor::Primitive(primitive) = &descriptor else {
    panic!("expected primitive");
  };
  assert_eq!(primitive.repr, RustPrimitive::F32);
  assert_eq!(primitive.constraints.default, Some(Literal::Number(1.0)));
  assert_eq!(primitive.constraints.minimum.as_ref().and_then(|n| n.as_i64()), Some(0));
}

#[test]
fn test_enum_default_points_at_case() {
  let descriptor = component(
    &single(json!({ "type": "integer", "enum": [1, 2, 3], "default": 2 })),
    "Subject",
  );
  let TypeDescriptor::Enumeration(enumeration) = &descriptor else {
    panic!("expected enumeration");
  };
  assert_eq!(enumeration.repr, RustPrimitive::I64);
  assert_eq!(enumeration.default, Some(1));
}

#[test]
fn test_maps_and_sequences() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));
  let mapper = TypeMapper::new(&graph);
  let plan = &graph.operations()[0];
  let response = mapper
    .map_type(plan.response.as_ref().unwrap(), &TypeScope::operation("plan", "Response"))
    .unwrap();

  let TypeDescriptor::Record(record) = &response else {
    panic!("expected record");
  };
  assert_eq!(record.name, "PlanResponse");

  let parameters = record.fields[0].ty.unwrap_optional();
  assert!(matches!(parameters, TypeDescriptor::Map(_)));

  let TypeDescriptor::Sequence(itineraries) = record.fields[5].ty.unwrap_optional() else {
    panic!("expected sequence");
  };
  let TypeDescriptor::Named(named) = itineraries.items.as_ref() else {
    panic!("expected named items");
  };
  assert_eq!(named.name, "Itinerary");
  assert_eq!(named.schema, graph.lookup("Itinerary").unwrap());
}

#[test]
fn test_references_use_sanitized_type_names() {
  let graph = graph(&json!({
    "components": {
      "schemas": {
        "String": { "type": "string" },
        "wrapper": {
          "type": "object",
          "properties": { "value": { "$ref": "#/components/schemas/String" } }
        }
      }
    }
  }));

  let TypeDescriptor::Record(record) = component(&graph, "wrapper") else {
    panic!("expected record");
  };
  assert_eq!(record.name, "Wrapper");
  let TypeDescriptor::Named(named) = record.fields[0].ty.unwrap_optional() else {
    panic!("expected named field");
  };
  assert_eq!(named.name, "StringType");
}

#[test]
fn test_rejects_invalid_constraints() {
  let cases = [
    json!({ "type": "string", "minimum": 1 }),
    json!({ "type": "boolean", "multipleOf": 2 }),
    json!({ "type": "integer", "multipleOf": 0 }),
    json!({ "type": "integer", "default": "ten" }),
    json!({ "type": "string", "enum": ["a", "b"], "default": "c" }),
    json!({ "type": "integer", "enum": [1, "two"] }),
  ];

  for schema in cases {
    let err = map_error(schema.clone());
    assert!(
      matches!(&err, GeneratorError::UnsupportedSchema { location, .. } if location == "Subject"),
      "unexpected error {err:?} for {schema}"
    );
  }
}

#[test]
fn test_enum_with_numeric_bounds_is_rejected() {
  let err = map_error(json!({ "type": "integer", "enum": [1, 2, 3], "minimum": 1 }));
  assert_eq!(
    err,
    GeneratorError::unsupported("Subject", "`minimum` cannot be combined with `enum`")
  );

  let err = map_error(json!({ "type": "number", "enum": [0.5, 1.5], "multipleOf": 0.5 }));
  assert_eq!(
    err,
    GeneratorError::unsupported("Subject", "`multipleOf` cannot be combined with `enum`")
  );
}

#[test]
fn test_literals_must_fit_the_rust_type() {
  let err = map_error(json!({ "type": "integer", "format": "int32", "default": 3_000_000_000_i64 }));
  assert_eq!(
    err,
    GeneratorError::unsupported("Subject", "`default` value `3000000000` does not fit in i32")
  );

  let err = map_error(json!({ "type": "integer", "format": "int32", "enum": [1, 4_294_967_297_i64] }));
  assert_eq!(
    err,
    GeneratorError::unsupported("Subject", "`enum` value `4294967297` does not fit in i32")
  );

  let err = map_error(json!({ "type": "number", "format": "float", "default": 1e300 }));
  assert!(
    matches!(&err, GeneratorError::UnsupportedSchema { reason, .. } if reason.ends_with("does not fit in f32")),
    "{err:?}"
  );
}

#[test]
fn test_literals_at_the_type_limits_are_kept() {
  let descriptor = component(
    &single(json!({ "type": "integer", "format": "int32", "default": 2_147_483_647 })),
    "Subject",
  );
  let TypeDescriptor::Primitive(primitive) = &descriptor else {
    panic!("expected primitive");
  };
  assert_eq!(primitive.constraints.default, Some(Literal::Integer(i64::from(i32::MAX))));

  let descriptor = component(
    &single(json!({ "type": "integer", "default": 3_000_000_000_i64 })),
    "Subject",
  );
  let TypeDescriptor::Primitive(primitive) = &descriptor else {
    panic!("expected primitive");
  };
  assert_eq!(primitive.repr, RustPrimitive::I64);
}
