use super::{
  context::RunContext,
  descriptor::TypeDescriptor,
  errors::{GeneratorError, GeneratorResult},
  naming::identifiers::to_rust_type_name,
  schema_graph::{ResolvedGraph, ResolvedOperation, ResolvedSchema, SchemaId},
  type_mapper::{TypeMapper, TypeScope},
};

/// Mapped types of one operation, parallel to its parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationTypes {
  pub parameters: Vec<TypeDescriptor>,
  pub request: Option<TypeDescriptor>,
  pub response: Option<TypeDescriptor>,
}

/// Every type descriptor of a run, with anonymous type names settled.
///
/// Both emitters read from the catalog so a parameter type in the route
/// bindings always names the declaration the type emitter produced.
#[derive(Debug)]
pub struct TypeCatalog {
  components: Vec<TypeDescriptor>,
  operations: Vec<OperationTypes>,
}

fn declarations_of(descriptor: &TypeDescriptor) -> Vec<(String, TypeDescriptor)> {
  descriptor
    .anonymous_declarations(true)
    .into_iter()
    .filter_map(|nested| nested.declared_name().map(|name| (name.to_string(), nested.shape())))
    .collect()
}

impl TypeCatalog {
  pub fn build(graph: &ResolvedGraph, context: &mut RunContext) -> GeneratorResult<Self> {
    let mapper = TypeMapper::new(graph);

    let components = graph
      .schemas()
      .map(|(id, named)| -> GeneratorResult<TypeDescriptor> {
        let descriptor = mapper.map_component(id)?;
        let mut claims = declarations_of(&descriptor);
        if descriptor.declared_name().is_none() {
          claims.push((to_rust_type_name(&named.name), descriptor.shape()));
        }
        context.claim_types(claims).map_err(|name| {
          GeneratorError::unsupported(
            format!("components.schemas.{}", named.name),
            format!("type name `{name}` is already used by another schema"),
          )
        })?;
        Ok(descriptor)
      })
      .collect::<GeneratorResult<Vec<_>>>()?;

    let operations = graph
      .operations()
      .iter()
      .map(|operation| Self::map_operation(&mapper, operation, context))
      .collect::<GeneratorResult<Vec<_>>>()?;

    Ok(Self { components, operations })
  }

  fn map_operation(
    mapper: &TypeMapper<'_>,
    operation: &ResolvedOperation,
    context: &mut RunContext,
  ) -> GeneratorResult<OperationTypes> {
    let id = &operation.operation_id;

    let parameters = operation
      .parameters
      .iter()
      .map(|parameter| -> GeneratorResult<TypeDescriptor> {
        let scope = TypeScope::parameter(&parameter.name);
        let descriptor = mapper.map_type(&parameter.schema, &scope)?;
        if context.claim_types(declarations_of(&descriptor)).is_ok() {
          return Ok(descriptor);
        }

        // A different type already took the name; qualify with the operation.
        let scope = scope.qualified(id);
        let descriptor = mapper.map_type(&parameter.schema, &scope)?;
        context.claim_types(declarations_of(&descriptor)).map_err(|name| {
          GeneratorError::unsupported(
            format!("{id}.parameters.{}", parameter.name),
            format!("type name `{name}` is already used by another schema"),
          )
        })?;
        Ok(descriptor)
      })
      .collect::<GeneratorResult<Vec<_>>>()?;

    let mut owned = |schema: Option<&ResolvedSchema>, role: &str| {
      schema
        .map(|schema| -> GeneratorResult<TypeDescriptor> {
          let descriptor = mapper.map_type(schema, &TypeScope::operation(id, role))?;
          context.claim_types(declarations_of(&descriptor)).map_err(|name| {
            GeneratorError::unsupported(
              format!("{id}.{role}"),
              format!("type name `{name}` is already used by another schema"),
            )
          })?;
          Ok(descriptor)
        })
        .transpose()
    };

    let request = owned(operation.request_body.as_ref(), "Request")?;
    let response = owned(operation.response.as_ref(), "Response")?;

    Ok(OperationTypes {
      parameters,
      request,
      response,
    })
  }

  #[must_use]
  pub fn component(&self, id: SchemaId) -> &TypeDescriptor {
    &self.components[id.index()]
  }

  /// Types of the operation at `index` in [`ResolvedGraph::operations`].
  #[must_use]
  pub fn operation(&self, index: usize) -> &OperationTypes {
    &self.operations[index]
  }

  pub fn operations(&self) -> impl Iterator<Item = &OperationTypes> {
    self.operations.iter()
  }
}
