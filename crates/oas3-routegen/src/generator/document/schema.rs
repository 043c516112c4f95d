use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Number, Value};
use strum::{Display, EnumString};

/// JSON Schema primitive types the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
  Integer,
  Number,
  Boolean,
  String,
}

/// A scalar value appearing in `enum` or `default`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  Integer(i64),
  Number(f64),
  Boolean(bool),
  String(String),
}

impl Literal {
  /// Reads a literal from its natural JSON type, or `None` for
  /// arrays, objects and null.
  pub fn from_json(value: &Value) -> Option<Self> {
    match value {
      Value::Bool(b) => Some(Self::Boolean(*b)),
      Value::String(s) => Some(Self::String(s.clone())),
      Value::Number(n) => n
        .as_i64()
        .map(Self::Integer)
        .or_else(|| n.as_f64().map(Self::Number)),
      Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
  }

  #[must_use]
  pub fn kind(&self) -> ScalarKind {
    match self {
      Self::Integer(_) => ScalarKind::Integer,
      Self::Number(_) => ScalarKind::Number,
      Self::Boolean(_) => ScalarKind::Boolean,
      Self::String(_) => ScalarKind::String,
    }
  }

  /// Converts the literal to `kind`, widening integers to numbers.
  ///
  /// Returns `None` when the literal cannot be a value of that kind.
  #[must_use]
  pub fn coerce(&self, kind: ScalarKind) -> Option<Self> {
    match (self, kind) {
      (Self::Integer(i), ScalarKind::Number) => Some(Self::Number(*i as f64)),
      (literal, kind) if literal.kind() == kind => Some(literal.clone()),
      _ => None,
    }
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Integer(i) => write!(f, "{i}"),
      Self::Number(n) => write!(f, "{n}"),
      Self::Boolean(b) => write!(f, "{b}"),
      Self::String(s) => f.write_str(s),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSchema {
  pub kind: ScalarKind,
  pub format: Option<String>,
  pub enum_values: Vec<Literal>,
  pub default: Option<Literal>,
  pub minimum: Option<Number>,
  pub maximum: Option<Number>,
  pub multiple_of: Option<Number>,
  pub description: Option<String>,
}

impl ScalarSchema {
  #[must_use]
  pub fn new(kind: ScalarKind) -> Self {
    Self {
      kind,
      format: None,
      enum_values: vec![],
      default: None,
      minimum: None,
      maximum: None,
      multiple_of: None,
      description: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema<R> {
  pub items: Box<SchemaNode<R>>,
  pub min_items: Option<u64>,
  pub unique_items: Option<bool>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema<R> {
  pub properties: IndexMap<String, SchemaNode<R>>,
  pub required: IndexSet<String>,
  pub additional_properties: Option<Box<SchemaNode<R>>>,
  pub description: Option<String>,
}

impl<R> Default for ObjectSchema<R> {
  fn default() -> Self {
    Self {
      properties: IndexMap::new(),
      required: IndexSet::new(),
      additional_properties: None,
      description: None,
    }
  }
}

/// A schema tree whose named references are of type `R`.
///
/// In a parsed [`Document`](super::Document) references carry the target
/// component name. After resolution they carry a validated arena index, so
/// recursive schemas stay finite.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode<R> {
  Scalar(ScalarSchema),
  Array(ArraySchema<R>),
  Object(ObjectSchema<R>),
  Reference(R),
}

/// Schema as read from the document, references by component name.
pub type RawSchema = SchemaNode<String>;

impl<R> SchemaNode<R> {
  #[must_use]
  pub fn description(&self) -> Option<&str> {
    match self {
      Self::Scalar(s) => s.description.as_deref(),
      Self::Array(a) => a.description.as_deref(),
      Self::Object(o) => o.description.as_deref(),
      Self::Reference(_) => None,
    }
  }

  /// Rebuilds the tree with every reference passed through `link`.
  pub fn try_map_refs<T, E, F>(&self, link: &mut F) -> Result<SchemaNode<T>, E>
  where
    F: FnMut(&R) -> Result<T, E>,
  {
    Ok(match self {
      Self::Scalar(scalar) => SchemaNode::Scalar(scalar.clone()),
      Self::Array(array) => SchemaNode::Array(ArraySchema {
        items: Box::new(array.items.try_map_refs(link)?),
        min_items: array.min_items,
        unique_items: array.unique_items,
        description: array.description.clone(),
      }),
      Self::Object(object) => SchemaNode::Object(ObjectSchema {
        properties: object
          .properties
          .iter()
          .map(|(name, node)| Ok((name.clone(), node.try_map_refs(link)?)))
          .collect::<Result<_, E>>()?,
        required: object.required.clone(),
        additional_properties: object
          .additional_properties
          .as_deref()
          .map(|node| node.try_map_refs(link).map(Box::new))
          .transpose()?,
        description: object.description.clone(),
      }),
      Self::Reference(target) => SchemaNode::Reference(link(target)?),
    })
  }
}
