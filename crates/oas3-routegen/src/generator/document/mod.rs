//! In-memory model of the subset of OpenAPI the generator consumes.

use indexmap::IndexMap;
use strum::{Display, EnumString, IntoStaticStr};

mod parser;
mod schema;

pub use schema::{ArraySchema, Literal, ObjectSchema, RawSchema, ScalarKind, ScalarSchema, SchemaNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
  Get,
  Put,
  Post,
  Delete,
  Options,
  Head,
  Patch,
}

impl HttpMethod {
  #[must_use]
  pub fn as_str(self) -> &'static str {
    self.into()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ParameterLocation {
  Path,
  Query,
  Header,
  Cookie,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
  pub title: String,
  pub version: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct Parameter<R> {
  #[builder(into)]
  pub name: String,
  pub location: ParameterLocation,
  #[builder(default)]
  pub required: bool,
  #[builder(default)]
  pub explode: bool,
  #[builder(into)]
  pub description: Option<String>,
  pub schema: SchemaNode<R>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation<R> {
  pub operation_id: String,
  pub method: HttpMethod,
  pub path: String,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub parameters: Vec<Parameter<R>>,
  pub request_body: Option<SchemaNode<R>>,
  pub response: Option<SchemaNode<R>>,
}

impl<R> Operation<R> {
  /// `GET /api/v1/plan`, used when reporting errors.
  #[must_use]
  pub fn route_label(&self) -> String {
    format!("{} {}", self.method, self.path)
  }

  /// Summary if present, otherwise the description.
  #[must_use]
  pub fn doc(&self) -> Option<&str> {
    self.summary.as_deref().or(self.description.as_deref())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathItem {
  pub operations: IndexMap<HttpMethod, Operation<String>>,
}

/// A parsed OpenAPI document: info, paths in document order and the named
/// schemas of `components.schemas` in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
  pub info: DocumentInfo,
  pub paths: IndexMap<String, PathItem>,
  pub schemas: IndexMap<String, RawSchema>,
}

impl Document {
  /// Every operation in document order.
  pub fn operations(&self) -> impl Iterator<Item = &Operation<String>> {
    self.paths.values().flat_map(|item| item.operations.values())
  }
}
