use serde_json::Number;
use strum::Display;

use super::{
  document::{Literal, ScalarKind},
  schema_graph::SchemaId,
};

/// Rust primitive a scalar maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RustPrimitive {
  #[strum(serialize = "i32")]
  I32,
  #[strum(serialize = "i64")]
  I64,
  #[strum(serialize = "f32")]
  F32,
  #[strum(serialize = "f64")]
  F64,
  #[strum(serialize = "bool")]
  Bool,
  #[strum(serialize = "String")]
  String,
}

impl RustPrimitive {
  #[must_use]
  pub fn for_scalar(kind: ScalarKind, format: Option<&str>) -> Self {
    match (kind, format) {
      (ScalarKind::Integer, Some("int32")) => Self::I32,
      (ScalarKind::Integer, _) => Self::I64,
      (ScalarKind::Number, Some("float")) => Self::F32,
      (ScalarKind::Number, _) => Self::F64,
      (ScalarKind::Boolean, _) => Self::Bool,
      (ScalarKind::String, _) => Self::String,
    }
  }

  #[must_use]
  pub fn is_float(self) -> bool {
    matches!(self, Self::F32 | Self::F64)
  }

  /// Whether `literal` is representable as this type without truncation.
  #[must_use]
  pub fn holds(self, literal: &Literal) -> bool {
    match (self, literal) {
      (Self::I32, Literal::Integer(value)) => i32::try_from(*value).is_ok(),
      (Self::F32, Literal::Number(value)) => value.is_finite() && value.abs() <= f64::from(f32::MAX),
      (Self::F64, Literal::Number(value)) => value.is_finite(),
      _ => true,
    }
  }
}

/// Constraints carried from the schema to the emitters, unenforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
  pub format: Option<String>,
  pub default: Option<Literal>,
  pub minimum: Option<Number>,
  pub maximum: Option<Number>,
  pub multiple_of: Option<Number>,
}

impl Constraints {
  #[must_use]
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveType {
  pub kind: ScalarKind,
  pub repr: RustPrimitive,
  pub constraints: Constraints,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
  /// Literal text, used as the case name (`WALK`, `asc`, `1`).
  pub name: String,
  pub literal: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationType {
  pub name: String,
  pub kind: ScalarKind,
  pub repr: RustPrimitive,
  pub cases: Vec<EnumCase>,
  /// Index into `cases` of the schema default.
  pub default: Option<usize>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceType {
  pub items: Box<TypeDescriptor>,
  pub min_items: Option<u64>,
  pub unique_items: bool,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapType {
  pub values: Box<TypeDescriptor>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
  /// Wire name of the property.
  pub name: String,
  pub required: bool,
  /// Field type, already wrapped in [`TypeDescriptor::Optional`] when not required.
  pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
  pub name: String,
  pub fields: Vec<FieldDescriptor>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
  pub schema: SchemaId,
  pub name: String,
}

/// Target-language type for a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
  Primitive(PrimitiveType),
  Enumeration(EnumerationType),
  Sequence(SequenceType),
  Map(MapType),
  Record(RecordType),
  Named(NamedType),
  Optional(Box<TypeDescriptor>),
}

impl TypeDescriptor {
  /// Drops any number of optional wrappers.
  #[must_use]
  pub fn unwrap_optional(&self) -> &Self {
    match self {
      Self::Optional(inner) => inner.unwrap_optional(),
      other => other,
    }
  }

  #[must_use]
  pub fn description(&self) -> Option<&str> {
    match self {
      Self::Primitive(p) => p.description.as_deref(),
      Self::Enumeration(e) => e.description.as_deref(),
      Self::Sequence(s) => s.description.as_deref(),
      Self::Map(m) => m.description.as_deref(),
      Self::Record(r) => r.description.as_deref(),
      Self::Named(_) => None,
      Self::Optional(inner) => inner.description(),
    }
  }

  /// Name of the type this descriptor declares, if it declares one.
  #[must_use]
  pub fn declared_name(&self) -> Option<&str> {
    match self {
      Self::Enumeration(e) => Some(&e.name),
      Self::Record(r) => Some(&r.name),
      _ => None,
    }
  }

  /// The descriptor as a declaration, with per-use annotations removed.
  ///
  /// Two anonymous types may share one declaration when their shapes are
  /// equal even if their defaults or descriptions differ.
  #[must_use]
  pub fn shape(&self) -> Self {
    match self {
      Self::Primitive(p) => Self::Primitive(PrimitiveType {
        constraints: Constraints::default(),
        description: None,
        ..p.clone()
      }),
      Self::Enumeration(e) => Self::Enumeration(EnumerationType {
        default: None,
        description: None,
        ..e.clone()
      }),
      Self::Sequence(s) => Self::Sequence(SequenceType {
        items: Box::new(s.items.shape()),
        min_items: None,
        unique_items: false,
        description: None,
      }),
      Self::Map(m) => Self::Map(MapType {
        values: Box::new(m.values.shape()),
        description: None,
      }),
      Self::Record(r) => Self::Record(RecordType {
        name: r.name.clone(),
        fields: r
          .fields
          .iter()
          .map(|field| FieldDescriptor {
            ty: field.ty.shape(),
            ..field.clone()
          })
          .collect(),
        description: None,
      }),
      Self::Named(n) => Self::Named(n.clone()),
      Self::Optional(inner) => Self::Optional(Box::new(inner.shape())),
    }
  }

  /// Named schemas referenced anywhere inside, in order of first appearance.
  #[must_use]
  pub fn named_references(&self) -> Vec<SchemaId> {
    let mut found = vec![];
    self.visit(&mut |descriptor| {
      if let Self::Named(named) = descriptor
        && !found.contains(&named.schema)
      {
        found.push(named.schema);
      }
    });
    found
  }

  /// Calls `f` for this descriptor and every nested one, parents first.
  pub fn visit<F>(&self, f: &mut F)
  where
    F: FnMut(&Self),
  {
    f(self);
    match self {
      Self::Sequence(s) => s.items.visit(f),
      Self::Map(m) => m.values.visit(f),
      Self::Record(r) => {
        for field in &r.fields {
          field.ty.visit(f);
        }
      }
      Self::Optional(inner) => inner.visit(f),
      Self::Primitive(_) | Self::Enumeration(_) | Self::Named(_) => {}
    }
  }

  /// Nested enumerations and records that need their own declaration,
  /// innermost first. The descriptor itself is included when
  /// `include_self` is set.
  #[must_use]
  pub fn anonymous_declarations(&self, include_self: bool) -> Vec<&Self> {
    let mut out = vec![];
    self.collect_anonymous(include_self, &mut out);
    out
  }

  fn collect_anonymous<'a>(&'a self, include_self: bool, out: &mut Vec<&'a Self>) {
    match self {
      Self::Sequence(s) => s.items.collect_anonymous(true, out),
      Self::Map(m) => m.values.collect_anonymous(true, out),
      Self::Optional(inner) => inner.collect_anonymous(true, out),
      Self::Record(r) => {
        for field in &r.fields {
          field.ty.collect_anonymous(true, out);
        }
      }
      Self::Primitive(_) | Self::Enumeration(_) | Self::Named(_) => {}
    }
    if include_self && self.declared_name().is_some() {
      out.push(self);
    }
  }
}
