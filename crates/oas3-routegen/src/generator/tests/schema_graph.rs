use serde_json::{Value, json};

use super::support::{document, graph, json_tree, yaml_tree};
use crate::{
  fixtures,
  generator::{
    document::SchemaNode,
    errors::GeneratorError,
    schema_graph::{ResolvedGraph, SchemaId, resolve},
  },
};

fn components(schemas: Value) -> Value {
  json!({ "components": { "schemas": schemas } })
}

fn names(graph: &ResolvedGraph, ids: &[SchemaId]) -> Vec<String> {
  ids.iter().map(|id| graph.schema(*id).name.clone()).collect()
}

#[test]
fn test_schemas_keep_document_order() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));
  assert_eq!(graph.len(), 9);

  let order = graph.schemas().map(|(_, named)| named.name.as_str()).collect::<Vec<_>>();
  assert_eq!(order.first(), Some(&"Place"));
  assert_eq!(order.last(), Some(&"Leg"));

  let leg = graph.lookup("Leg").unwrap();
  assert_eq!(graph.schema(leg).name, "Leg");
  assert!(graph.lookup("Missing").is_none());
}

#[test]
fn test_dependencies_in_order_of_first_use() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));

  let leg = graph.lookup("Leg").unwrap();
  assert_eq!(names(&graph, graph.dependencies(leg)), vec![
    "Place",
    "EncodedPolyline",
    "StepInstruction"
  ]);

  let step = graph.lookup("StepInstruction").unwrap();
  assert_eq!(names(&graph, graph.dependencies(step)), vec![
    "RelativeDirection",
    "AbsoluteDirection"
  ]);

  let place = graph.lookup("Place").unwrap();
  assert!(graph.dependencies(place).is_empty());
}

#[test]
fn test_references_become_arena_links() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));
  let itinerary = graph.lookup("Itinerary").unwrap();
  let leg = graph.lookup("Leg").unwrap();

  let SchemaNode::Object(object) = &graph.schema(itinerary).schema else {
    panic!("expected object schema");
  };
  let SchemaNode::Array(legs) = &object.properties["legs"] else {
    panic!("expected array property");
  };
  assert_eq!(*legs.items, SchemaNode::Reference(leg));
}

#[test]
fn test_unresolved_reference() {
  let tree = components(json!({
    "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } }
  }));
  let err = resolve(&document(&tree)).unwrap_err();
  assert_eq!(err, GeneratorError::UnresolvedReference {
    reference: "B".to_string(),
    location: "components.schemas.A".to_string(),
  });
}

#[test]
fn test_unresolved_reference_in_parameter() {
  let tree = json!({
    "paths": {
      "/a": {
        "get": {
          "operationId": "getA",
          "parameters": [
            { "name": "filter", "in": "query", "schema": { "$ref": "#/components/schemas/Filter" } }
          ]
        }
      }
    }
  });
  let err = resolve(&document(&tree)).unwrap_err();
  assert_eq!(err, GeneratorError::UnresolvedReference {
    reference: "Filter".to_string(),
    location: "getA.parameters.filter".to_string(),
  });
}

#[test]
fn test_direct_cycle_is_rejected() {
  let tree = components(json!({
    "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
    "B": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } }
  }));
  let err = resolve(&document(&tree)).unwrap_err();
  assert_eq!(err, GeneratorError::CyclicSchema {
    cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
  });
  assert_eq!(err.to_string(), "cyclic schema reference: A -> B -> A");
}

#[test]
fn test_self_reference_without_list_is_rejected() {
  let tree = components(json!({
    "Node": { "type": "object", "properties": { "next": { "$ref": "#/components/schemas/Node" } } }
  }));
  let err = resolve(&document(&tree)).unwrap_err();
  assert_eq!(err, GeneratorError::CyclicSchema {
    cycle: vec!["Node".to_string(), "Node".to_string()],
  });
}

#[test]
fn test_cycle_through_map_values_is_rejected() {
  let tree = components(json!({
    "Registry": {
      "type": "object",
      "additionalProperties": { "$ref": "#/components/schemas/Registry" }
    }
  }));
  assert!(matches!(
    resolve(&document(&tree)),
    Err(GeneratorError::CyclicSchema { .. })
  ));
}

#[test]
fn test_list_recursion_is_permitted() {
  let graph = graph(&json_tree(fixtures::ITEMS_API));
  assert_eq!(graph.recursive_cycles(), &[vec!["TreeNode".to_string(), "TreeNode".to_string()]]);

  let tree_node = graph.lookup("TreeNode").unwrap();
  assert_eq!(graph.dependencies(tree_node), &[tree_node]);
}

#[test]
fn test_mutual_recursion_through_list_is_permitted() {
  let tree = components(json!({
    "Folder": {
      "type": "object",
      "properties": { "files": { "type": "array", "items": { "$ref": "#/components/schemas/File" } } }
    },
    "File": {
      "type": "object",
      "properties": { "parent": { "$ref": "#/components/schemas/Folder" } }
    }
  }));
  let graph = graph(&tree);
  assert_eq!(graph.recursive_cycles(), &[vec![
    "Folder".to_string(),
    "File".to_string(),
    "Folder".to_string()
  ]]);
}

#[test]
fn test_operations_are_linked() {
  let graph = graph(&yaml_tree(fixtures::MOTIS));
  let place = graph.lookup("Place").unwrap();

  let plan = &graph.operations()[0];
  assert_eq!(plan.operation_id, "plan");
  let Some(SchemaNode::Object(response)) = &plan.response else {
    panic!("expected inline response object");
  };
  assert_eq!(response.properties["from"], SchemaNode::Reference(place));
  assert_eq!(graph.info().title, "MOTIS API");
}
