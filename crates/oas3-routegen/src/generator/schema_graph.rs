use std::collections::HashMap;

use super::{
  document::{Document, DocumentInfo, Operation, Parameter, RawSchema, SchemaNode},
  errors::{GeneratorError, GeneratorResult},
};

/// Index of a named schema in the [`ResolvedGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
  #[must_use]
  pub fn index(self) -> usize {
    self.0
  }
}

/// Schema tree whose references are validated arena links.
pub type ResolvedSchema = SchemaNode<SchemaId>;
pub type ResolvedOperation = Operation<SchemaId>;
pub type ResolvedParameter = Parameter<SchemaId>;

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSchema {
  pub name: String,
  pub schema: ResolvedSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
  target: SchemaId,
  through_items: bool,
}

/// Immutable result of resolving a [`Document`].
///
/// Named schemas live in an arena in document order. Recursion is expressed
/// through [`SchemaId`] links, so the graph may be cyclic while every tree
/// stays finite. The only cycles left are ones closed through an array's
/// `items`.
#[derive(Debug)]
pub struct ResolvedGraph {
  info: DocumentInfo,
  schemas: Vec<NamedSchema>,
  index: HashMap<String, SchemaId>,
  dependencies: Vec<Vec<SchemaId>>,
  operations: Vec<ResolvedOperation>,
  recursive_cycles: Vec<Vec<String>>,
}

impl ResolvedGraph {
  #[must_use]
  pub fn info(&self) -> &DocumentInfo {
    &self.info
  }

  pub fn schemas(&self) -> impl Iterator<Item = (SchemaId, &NamedSchema)> {
    self.schemas.iter().enumerate().map(|(i, schema)| (SchemaId(i), schema))
  }

  #[must_use]
  pub fn schema(&self, id: SchemaId) -> &NamedSchema {
    &self.schemas[id.0]
  }

  #[must_use]
  pub fn lookup(&self, name: &str) -> Option<SchemaId> {
    self.index.get(name).copied()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.schemas.len()
  }

  /// Named schemas referenced directly by `id`, in order of first appearance.
  #[must_use]
  pub fn dependencies(&self, id: SchemaId) -> &[SchemaId] {
    &self.dependencies[id.0]
  }

  #[must_use]
  pub fn operations(&self) -> &[ResolvedOperation] {
    &self.operations
  }

  /// Permitted list-recursion cycles, each closed with its first name
  /// (`["TreeNode", "TreeNode"]`).
  #[must_use]
  pub fn recursive_cycles(&self) -> &[Vec<String>] {
    &self.recursive_cycles
  }
}

pub fn resolve(document: &Document) -> GeneratorResult<ResolvedGraph> {
  SchemaResolver::new(document).resolve()
}

pub struct SchemaResolver<'a> {
  document: &'a Document,
  index: HashMap<String, SchemaId>,
}

impl<'a> SchemaResolver<'a> {
  #[must_use]
  pub fn new(document: &'a Document) -> Self {
    let index = document
      .schemas
      .keys()
      .enumerate()
      .map(|(i, name)| (name.clone(), SchemaId(i)))
      .collect();
    Self { document, index }
  }

  pub fn resolve(self) -> GeneratorResult<ResolvedGraph> {
    let schemas = self
      .document
      .schemas
      .iter()
      .map(|(name, raw)| {
        Ok(NamedSchema {
          name: name.clone(),
          schema: self.link(raw, &format!("components.schemas.{name}"))?,
        })
      })
      .collect::<GeneratorResult<Vec<_>>>()?;

    let edges = schemas
      .iter()
      .map(|named| {
        let mut edges = vec![];
        collect_edges(&named.schema, false, &mut edges);
        edges
      })
      .collect::<Vec<_>>();

    reject_direct_cycles(&schemas, &edges)?;
    let recursive_cycles = detect_cycles(&schemas, &edges);

    let dependencies = edges
      .iter()
      .map(|edges| {
        let mut targets = Vec::with_capacity(edges.len());
        for edge in edges {
          if !targets.contains(&edge.target) {
            targets.push(edge.target);
          }
        }
        targets
      })
      .collect();

    let operations = self
      .document
      .operations()
      .map(|operation| self.link_operation(operation))
      .collect::<GeneratorResult<Vec<_>>>()?;

    Ok(ResolvedGraph {
      info: self.document.info.clone(),
      schemas,
      index: self.index,
      dependencies,
      operations,
      recursive_cycles,
    })
  }

  fn link(&self, raw: &RawSchema, location: &str) -> GeneratorResult<ResolvedSchema> {
    raw.try_map_refs(&mut |name: &String| {
      self
        .index
        .get(name)
        .copied()
        .ok_or_else(|| GeneratorError::UnresolvedReference {
          reference: name.clone(),
          location: location.to_string(),
        })
    })
  }

  fn link_operation(&self, operation: &Operation<String>) -> GeneratorResult<ResolvedOperation> {
    let id = &operation.operation_id;

    let parameters = operation
      .parameters
      .iter()
      .map(|parameter| {
        let schema = self.link(&parameter.schema, &format!("{id}.parameters.{}", parameter.name))?;
        Ok(
          Parameter::builder()
            .name(parameter.name.clone())
            .location(parameter.location)
            .required(parameter.required)
            .explode(parameter.explode)
            .maybe_description(parameter.description.clone())
            .schema(schema)
            .build(),
        )
      })
      .collect::<GeneratorResult<Vec<_>>>()?;

    let request_body = operation
      .request_body
      .as_ref()
      .map(|schema| self.link(schema, &format!("{id}.requestBody")))
      .transpose()?;
    let response = operation
      .response
      .as_ref()
      .map(|schema| self.link(schema, &format!("{id}.response")))
      .transpose()?;

    Ok(Operation {
      operation_id: operation.operation_id.clone(),
      method: operation.method,
      path: operation.path.clone(),
      summary: operation.summary.clone(),
      description: operation.description.clone(),
      parameters,
      request_body,
      response,
    })
  }
}

fn collect_edges(node: &ResolvedSchema, through_items: bool, edges: &mut Vec<Edge>) {
  match node {
    SchemaNode::Scalar(_) => {}
    SchemaNode::Array(array) => collect_edges(&array.items, true, edges),
    SchemaNode::Object(object) => {
      for property in object.properties.values() {
        collect_edges(property, through_items, edges);
      }
      if let Some(values) = &object.additional_properties {
        collect_edges(values, through_items, edges);
      }
    }
    SchemaNode::Reference(target) => edges.push(Edge {
      target: *target,
      through_items,
    }),
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  Active,
  Done,
}

/// Fails on any cycle that never passes through an array's `items`.
///
/// Such a cycle has no indirection and cannot be represented as a finite
/// type, so the search only follows direct (non-items) edges.
fn reject_direct_cycles(schemas: &[NamedSchema], edges: &[Vec<Edge>]) -> GeneratorResult<()> {
  let mut marks = vec![Mark::Unvisited; schemas.len()];
  let mut chain = vec![];

  for start in 0..schemas.len() {
    if marks[start] == Mark::Unvisited {
      visit_direct(SchemaId(start), schemas, edges, &mut marks, &mut chain)?;
    }
  }
  Ok(())
}

fn visit_direct(
  id: SchemaId,
  schemas: &[NamedSchema],
  edges: &[Vec<Edge>],
  marks: &mut [Mark],
  chain: &mut Vec<SchemaId>,
) -> GeneratorResult<()> {
  marks[id.0] = Mark::Active;
  chain.push(id);

  for edge in edges[id.0].iter().filter(|edge| !edge.through_items) {
    match marks[edge.target.0] {
      Mark::Active => {
        let start = chain.iter().position(|member| *member == edge.target).unwrap_or(0);
        let cycle = chain[start..]
          .iter()
          .chain(std::iter::once(&edge.target))
          .map(|member| schemas[member.0].name.clone())
          .collect();
        return Err(GeneratorError::CyclicSchema { cycle });
      }
      Mark::Unvisited => visit_direct(edge.target, schemas, edges, marks, chain)?,
      Mark::Done => {}
    }
  }

  chain.pop();
  marks[id.0] = Mark::Done;
  Ok(())
}

/// Lists the cycles of the full reference graph.
///
/// Runs after [`reject_direct_cycles`], so every cycle reported here is a
/// permitted list recursion.
fn detect_cycles(schemas: &[NamedSchema], edges: &[Vec<Edge>]) -> Vec<Vec<String>> {
  let mut marks = vec![Mark::Unvisited; schemas.len()];
  let mut chain = vec![];
  let mut cycles = vec![];

  for start in 0..schemas.len() {
    if marks[start] == Mark::Unvisited {
      visit_all(SchemaId(start), schemas, edges, &mut marks, &mut chain, &mut cycles);
    }
  }
  cycles
}

fn visit_all(
  id: SchemaId,
  schemas: &[NamedSchema],
  edges: &[Vec<Edge>],
  marks: &mut [Mark],
  chain: &mut Vec<SchemaId>,
  cycles: &mut Vec<Vec<String>>,
) {
  marks[id.0] = Mark::Active;
  chain.push(id);

  for edge in &edges[id.0] {
    match marks[edge.target.0] {
      Mark::Active => {
        if let Some(start) = chain.iter().position(|member| *member == edge.target) {
          let cycle = chain[start..]
            .iter()
            .chain(std::iter::once(&edge.target))
            .map(|member| schemas[member.0].name.clone())
            .collect::<Vec<_>>();
          if !cycles.contains(&cycle) {
            cycles.push(cycle);
          }
        }
      }
      Mark::Unvisited => visit_all(edge.target, schemas, edges, marks, chain, cycles),
      Mark::Done => {}
    }
  }

  chain.pop();
  marks[id.0] = Mark::Done;
}
