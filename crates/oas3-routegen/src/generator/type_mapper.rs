use super::{
  descriptor::{
    Constraints, EnumCase, EnumerationType, FieldDescriptor, MapType, NamedType, PrimitiveType, RecordType,
    RustPrimitive, SequenceType, TypeDescriptor,
  },
  document::{ArraySchema, Literal, ObjectSchema, ScalarKind, ScalarSchema, SchemaNode},
  errors::{GeneratorError, GeneratorResult},
  naming::identifiers::{to_pascal_case, to_rust_type_name},
  schema_graph::{ResolvedGraph, ResolvedSchema, SchemaId},
};

/// Naming context for types that have no name of their own.
///
/// A component scope names its declaration after the component. Nested
/// scopes concatenate their segments, so field `mode` of `Leg` yields
/// `LegMode` for a record and `LegModeEnum` for an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeScope {
  segments: Vec<String>,
  anonymous: bool,
}

impl TypeScope {
  #[must_use]
  pub fn component(name: &str) -> Self {
    Self {
      segments: vec![name.to_string()],
      anonymous: false,
    }
  }

  /// Scope of an inline parameter schema.
  #[must_use]
  pub fn parameter(name: &str) -> Self {
    Self {
      segments: vec![name.to_string()],
      anonymous: true,
    }
  }

  /// Scope of an operation-owned schema, e.g. `plan` + `Response`.
  #[must_use]
  pub fn operation(operation_id: &str, role: &str) -> Self {
    Self {
      segments: vec![operation_id.to_string(), role.to_string()],
      anonymous: true,
    }
  }

  #[must_use]
  pub fn field(&self, name: &str) -> Self {
    let mut segments = self.segments.clone();
    segments.push(name.to_string());
    Self {
      segments,
      anonymous: true,
    }
  }

  /// Prefixes the scope with the owning operation id.
  #[must_use]
  pub fn qualified(&self, operation_id: &str) -> Self {
    let mut segments = vec![operation_id.to_string()];
    segments.extend(self.segments.iter().cloned());
    Self {
      segments,
      anonymous: self.anonymous,
    }
  }

  fn joined(&self) -> String {
    self.segments.iter().map(|segment| to_pascal_case(segment)).collect()
  }

  #[must_use]
  pub fn record_name(&self) -> String {
    if self.anonymous {
      to_rust_type_name(&self.joined())
    } else {
      to_rust_type_name(&self.segments[0])
    }
  }

  #[must_use]
  pub fn enum_name(&self) -> String {
    if self.anonymous {
      to_rust_type_name(&format!("{}Enum", self.joined()))
    } else {
      self.record_name()
    }
  }

  #[must_use]
  pub fn location(&self) -> String {
    self.segments.join(".")
  }
}

/// Maps resolved schema nodes to [`TypeDescriptor`]s.
///
/// Pure: equal `(node, scope)` pairs always give equal descriptors.
pub struct TypeMapper<'a> {
  graph: &'a ResolvedGraph,
}

impl<'a> TypeMapper<'a> {
  #[must_use]
  pub fn new(graph: &'a ResolvedGraph) -> Self {
    Self { graph }
  }

  pub fn map_type(&self, schema: &ResolvedSchema, scope: &TypeScope) -> GeneratorResult<TypeDescriptor> {
    match schema {
      SchemaNode::Scalar(scalar) => map_scalar(scalar, scope),
      SchemaNode::Array(array) => self.map_array(array, scope),
      SchemaNode::Object(object) => self.map_object(object, scope),
      SchemaNode::Reference(id) => Ok(self.named(*id)),
    }
  }

  /// Descriptor for the declaration of component `id`.
  pub fn map_component(&self, id: SchemaId) -> GeneratorResult<TypeDescriptor> {
    let named = self.graph.schema(id);
    self.map_type(&named.schema, &TypeScope::component(&named.name))
  }

  fn named(&self, id: SchemaId) -> TypeDescriptor {
    TypeDescriptor::Named(NamedType {
      schema: id,
      name: to_rust_type_name(&self.graph.schema(id).name),
    })
  }

  fn map_array(&self, array: &ArraySchema<SchemaId>, scope: &TypeScope) -> GeneratorResult<TypeDescriptor> {
    Ok(TypeDescriptor::Sequence(SequenceType {
      items: Box::new(self.map_type(&array.items, scope)?),
      min_items: array.min_items,
      unique_items: array.unique_items.unwrap_or(false),
      description: array.description.clone(),
    }))
  }

  fn map_object(&self, object: &ObjectSchema<SchemaId>, scope: &TypeScope) -> GeneratorResult<TypeDescriptor> {
    if let Some(values) = &object.additional_properties {
      return Ok(TypeDescriptor::Map(MapType {
        values: Box::new(self.map_type(values, scope)?),
        description: object.description.clone(),
      }));
    }

    let fields = object
      .properties
      .iter()
      .map(|(name, property)| {
        let ty = self.map_type(property, &scope.field(name))?;
        let required = object.required.contains(name);
        Ok(FieldDescriptor {
          name: name.clone(),
          required,
          ty: if required {
            ty
          } else {
            TypeDescriptor::Optional(Box::new(ty))
          },
        })
      })
      .collect::<GeneratorResult<Vec<_>>>()?;

    Ok(TypeDescriptor::Record(RecordType {
      name: scope.record_name(),
      fields,
      description: object.description.clone(),
    }))
  }
}

fn map_scalar(scalar: &ScalarSchema, scope: &TypeScope) -> GeneratorResult<TypeDescriptor> {
  let location = scope.location();
  let numeric = matches!(scalar.kind, ScalarKind::Integer | ScalarKind::Number);

  for (keyword, present) in [
    ("minimum", scalar.minimum.is_some()),
    ("maximum", scalar.maximum.is_some()),
    ("multipleOf", scalar.multiple_of.is_some()),
  ] {
    if present && !numeric {
      return Err(GeneratorError::unsupported(
        &location,
        format!("`{keyword}` is not supported on {} schemas", scalar.kind),
      ));
    }
  }

  if let Some(step) = &scalar.multiple_of
    && step.as_f64().is_none_or(|value| value <= 0.0)
  {
    return Err(GeneratorError::unsupported(
      &location,
      format!("`multipleOf` must be positive, found {step}"),
    ));
  }

  let repr = RustPrimitive::for_scalar(scalar.kind, scalar.format.as_deref());
  let coerce = |literal: &Literal, keyword: &str| -> GeneratorResult<Literal> {
    let value = literal.coerce(scalar.kind).ok_or_else(|| {
      GeneratorError::unsupported(
        &location,
        format!("`{keyword}` value `{literal}` is not a {}", scalar.kind),
      )
    })?;
    if !repr.holds(&value) {
      return Err(GeneratorError::unsupported(
        &location,
        format!("`{keyword}` value `{literal}` does not fit in {repr}"),
      ));
    }
    Ok(value)
  };

  let default = scalar
    .default
    .as_ref()
    .map(|literal| coerce(literal, "default"))
    .transpose()?;

  if scalar.enum_values.is_empty() {
    return Ok(TypeDescriptor::Primitive(PrimitiveType {
      kind: scalar.kind,
      repr,
      constraints: Constraints {
        format: scalar.format.clone(),
        default,
        minimum: scalar.minimum.clone(),
        maximum: scalar.maximum.clone(),
        multiple_of: scalar.multiple_of.clone(),
      },
      description: scalar.description.clone(),
    }));
  }

  // Enumerations declare no constraint docs, so bounds on them would be lost.
  if let Some(keyword) = [
    ("minimum", scalar.minimum.is_some()),
    ("maximum", scalar.maximum.is_some()),
    ("multipleOf", scalar.multiple_of.is_some()),
  ]
  .into_iter()
  .find_map(|(keyword, present)| present.then_some(keyword))
  {
    return Err(GeneratorError::unsupported(
      &location,
      format!("`{keyword}` cannot be combined with `enum`"),
    ));
  }

  let mut cases: Vec<EnumCase> = vec![];
  for literal in &scalar.enum_values {
    let literal = coerce(literal, "enum")?;
    if cases.iter().all(|case| case.literal != literal) {
      cases.push(EnumCase {
        name: literal.to_string(),
        literal,
      });
    }
  }

  let default = match default {
    Some(literal) => Some(cases.iter().position(|case| case.literal == literal).ok_or_else(|| {
      GeneratorError::unsupported(&location, format!("default `{literal}` is not one of the enum values"))
    })?),
    None => None,
  };

  Ok(TypeDescriptor::Enumeration(EnumerationType {
    name: scope.enum_name(),
    kind: scalar.kind,
    repr,
    cases,
    default,
    description: scalar.description.clone(),
  }))
}
