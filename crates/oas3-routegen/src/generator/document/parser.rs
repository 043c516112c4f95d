use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use mediatype::{MediaType, names};
use serde_json::{Map, Number, Value};

use super::{
  ArraySchema, Document, DocumentInfo, HttpMethod, Literal, ObjectSchema, Operation, Parameter, ParameterLocation,
  PathItem, RawSchema, ScalarKind, ScalarSchema, SchemaNode,
};
use crate::{
  generator::errors::{GeneratorError, GeneratorResult},
  utils::{parse_component_ref, parse_schema_ref_path},
};

const PATH_ITEM_KEYS: &[&str] = &["parameters", "summary", "description", "servers", "$ref"];

const UNSUPPORTED_KEYWORDS: &[&str] = &[
  "oneOf",
  "anyOf",
  "allOf",
  "not",
  "pattern",
  "minLength",
  "maxLength",
  "maxItems",
  "exclusiveMinimum",
  "exclusiveMaximum",
  "nullable",
];

const SCALAR_ONLY_KEYWORDS: &[&str] = &["enum", "default", "minimum", "maximum", "multipleOf"];
const ARRAY_ONLY_KEYWORDS: &[&str] = &["items", "minItems", "uniqueItems"];
const OBJECT_ONLY_KEYWORDS: &[&str] = &["properties", "required", "additionalProperties"];

const MAX_REF_HOPS: usize = 16;

enum SchemaType {
  Scalar(ScalarKind),
  Array,
  Object,
}

impl Document {
  /// Builds the document model from a parsed YAML/JSON tree.
  pub fn from_tree(tree: &Value) -> GeneratorResult<Self> {
    DocumentParser { root: tree }.parse()
  }
}

struct DocumentParser<'a> {
  root: &'a Value,
}

fn as_object<'v>(value: &'v Value, location: &str) -> GeneratorResult<&'v Map<String, Value>> {
  value
    .as_object()
    .ok_or_else(|| GeneratorError::malformed(location, "expected an object"))
}

fn optional_string(map: &Map<String, Value>, key: &str, location: &str) -> GeneratorResult<Option<String>> {
  match map.get(key) {
    None => Ok(None),
    Some(Value::String(s)) => Ok(Some(s.clone())),
    Some(_) => Err(GeneratorError::malformed(location, format!("`{key}` must be a string"))),
  }
}

fn optional_bool(map: &Map<String, Value>, key: &str, location: &str) -> GeneratorResult<Option<bool>> {
  match map.get(key) {
    None => Ok(None),
    Some(Value::Bool(b)) => Ok(Some(*b)),
    Some(_) => Err(GeneratorError::malformed(location, format!("`{key}` must be a boolean"))),
  }
}

fn optional_number(map: &Map<String, Value>, key: &str, location: &str) -> GeneratorResult<Option<Number>> {
  match map.get(key) {
    None => Ok(None),
    Some(Value::Number(n)) => Ok(Some(n.clone())),
    Some(_) => Err(GeneratorError::malformed(location, format!("`{key}` must be a number"))),
  }
}

fn reject_keywords(map: &Map<String, Value>, keywords: &[&str], location: &str, kind: &str) -> GeneratorResult<()> {
  match keywords.iter().find(|keyword| map.contains_key(**keyword)) {
    Some(keyword) => Err(GeneratorError::unsupported(
      location,
      format!("`{keyword}` is not allowed on {kind} schemas"),
    )),
    None => Ok(()),
  }
}

impl<'a> DocumentParser<'a> {
  fn parse(&self) -> GeneratorResult<Document> {
    let root = as_object(self.root, "document")?;

    let info = match root.get("info") {
      Some(info) => {
        let info = as_object(info, "info")?;
        DocumentInfo {
          title: optional_string(info, "title", "info")?.unwrap_or_default(),
          version: optional_string(info, "version", "info")?.unwrap_or_default(),
          description: optional_string(info, "description", "info")?,
        }
      }
      None => DocumentInfo::default(),
    };

    let mut schemas = IndexMap::new();
    if let Some(components) = root.get("components") {
      let components = as_object(components, "components")?;
      if let Some(defined) = components.get("schemas") {
        for (name, schema) in as_object(defined, "components.schemas")? {
          let schema = self.parse_schema(schema, &format!("components.schemas.{name}"))?;
          schemas.insert(name.clone(), schema);
        }
      }
    }

    let mut paths = IndexMap::new();
    if let Some(defined) = root.get("paths") {
      for (path, item) in as_object(defined, "paths")? {
        paths.insert(path.clone(), self.parse_path_item(path, item)?);
      }
    }

    Ok(Document { info, paths, schemas })
  }

  /// Follows `$ref` chains into `components.<kind>`.
  fn follow(&self, value: &'a Value, kind: &str, location: &str) -> GeneratorResult<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_HOPS {
      let Some(reference) = current.get("$ref") else {
        return Ok(current);
      };
      let reference = reference
        .as_str()
        .ok_or_else(|| GeneratorError::malformed(location, "`$ref` must be a string"))?;
      let unresolved = || GeneratorError::UnresolvedReference {
        reference: reference.to_string(),
        location: location.to_string(),
      };
      let name = parse_component_ref(reference, kind).ok_or_else(unresolved)?;
      current = self
        .root
        .get("components")
        .and_then(|components| components.get(kind))
        .and_then(|defined| defined.get(&name))
        .ok_or_else(unresolved)?;
    }
    Err(GeneratorError::malformed(location, "`$ref` chain is too long"))
  }

  fn parse_path_item(&self, path: &str, item: &'a Value) -> GeneratorResult<PathItem> {
    let item = as_object(item, &format!("paths.{path}"))?;

    let shared = match item.get("parameters") {
      Some(parameters) => self.parse_parameters(parameters, &format!("paths.{path}"), path)?,
      None => vec![],
    };

    let mut operations = IndexMap::new();
    for (key, value) in item {
      if PATH_ITEM_KEYS.contains(&key.as_str()) || key.starts_with("x-") {
        continue;
      }
      let method = HttpMethod::from_str(key).map_err(|_| GeneratorError::InvalidMethod {
        method: key.clone(),
        path: path.to_string(),
      })?;
      if operations.contains_key(&method) {
        return Err(GeneratorError::malformed(
          format!("paths.{path}"),
          format!("method {method} is declared more than once"),
        ));
      }
      let operation = self.parse_operation(path, method, value, &shared)?;
      operations.insert(method, operation);
    }

    Ok(PathItem { operations })
  }

  fn parse_operation(
    &self,
    path: &str,
    method: HttpMethod,
    value: &'a Value,
    shared: &[Parameter<String>],
  ) -> GeneratorResult<Operation<String>> {
    let map = as_object(value, &format!("paths.{path}.{method}"))?;

    let operation_id = match map.get("operationId") {
      Some(Value::String(id)) if !id.is_empty() => id.clone(),
      _ => {
        return Err(GeneratorError::MissingOperationId {
          method: method.to_string(),
          path: path.to_string(),
        });
      }
    };
    let location = operation_id.as_str();

    let mut parameters = shared.to_vec();
    if let Some(own) = map.get("parameters") {
      for parameter in self.parse_parameters(own, location, path)? {
        let existing = parameters
          .iter_mut()
          .find(|p| p.name == parameter.name && p.location == parameter.location);
        match existing {
          Some(slot) => *slot = parameter,
          None => parameters.push(parameter),
        }
      }
    }

    let request_body = match map.get("requestBody") {
      Some(body) => {
        let body = self.follow(body, "requestBodies", location)?;
        self.json_schema(body, &format!("{location}.requestBody"))?
      }
      None => None,
    };

    let mut response = None;
    if let Some(responses) = map.get("responses") {
      for (status, reply) in as_object(responses, &format!("{location}.responses"))? {
        if !status.starts_with('2') {
          continue;
        }
        let reply = self.follow(reply, "responses", location)?;
        if let Some(schema) = self.json_schema(reply, &format!("{location}.responses.{status}"))? {
          response = Some(schema);
          break;
        }
      }
    }

    Ok(Operation {
      operation_id: operation_id.clone(),
      method,
      path: path.to_string(),
      summary: optional_string(map, "summary", location)?,
      description: optional_string(map, "description", location)?,
      parameters,
      request_body,
      response,
    })
  }

  /// Schema of the first JSON content entry of a request body or response.
  fn json_schema(&self, value: &'a Value, location: &str) -> GeneratorResult<Option<RawSchema>> {
    value
      .get("content")
      .and_then(Value::as_object)
      .and_then(|content| {
        content
          .iter()
          .find(|(content_type, _)| is_json_media_type(content_type))
      })
      .and_then(|(_, media)| media.get("schema"))
      .map(|schema| self.parse_schema(schema, location))
      .transpose()
  }

  /// Parses one `parameters` list. A `(name, in)` pair may appear only once.
  fn parse_parameters(
    &self,
    value: &'a Value,
    location: &str,
    path: &str,
  ) -> GeneratorResult<Vec<Parameter<String>>> {
    let list = value
      .as_array()
      .ok_or_else(|| GeneratorError::malformed(location, "`parameters` must be a list"))?;

    let mut parsed: Vec<Parameter<String>> = Vec::with_capacity(list.len());
    for parameter in list {
      let parameter = self.parse_parameter(parameter, location)?;
      if parsed
        .iter()
        .any(|p| p.name == parameter.name && p.location == parameter.location)
      {
        return Err(GeneratorError::mismatch(
          &parameter.name,
          path,
          format!("{} parameter is declared more than once in {location}", parameter.location),
        ));
      }
      parsed.push(parameter);
    }
    Ok(parsed)
  }

  fn parse_parameter(&self, value: &'a Value, owner: &str) -> GeneratorResult<Parameter<String>> {
    let value = self.follow(value, "parameters", owner)?;
    let map = as_object(value, &format!("{owner}.parameters"))?;

    let name = optional_string(map, "name", owner)?
      .ok_or_else(|| GeneratorError::malformed(format!("{owner}.parameters"), "parameter without `name`"))?;
    let location = format!("{owner}.parameters.{name}");

    let placement = optional_string(map, "in", &location)?
      .ok_or_else(|| GeneratorError::malformed(&location, "parameter without `in`"))?;
    let placement = ParameterLocation::from_str(&placement)
      .map_err(|_| GeneratorError::unsupported(&location, format!("unknown parameter location `{placement}`")))?;

    if let Some(style) = optional_string(map, "style", &location)?
      && !matches!(style.as_str(), "form" | "simple")
    {
      return Err(GeneratorError::unsupported(
        &location,
        format!("parameter style `{style}` is not supported"),
      ));
    }

    let schema = map
      .get("schema")
      .ok_or_else(|| GeneratorError::unsupported(&location, "parameter without `schema`"))?;

    let default_explode = matches!(placement, ParameterLocation::Query | ParameterLocation::Cookie);

    Ok(Parameter {
      schema: self.parse_schema(schema, &location)?,
      required: optional_bool(map, "required", &location)?.unwrap_or(false),
      explode: optional_bool(map, "explode", &location)?.unwrap_or(default_explode),
      description: optional_string(map, "description", &location)?,
      location: placement,
      name,
    })
  }

  fn parse_schema(&self, value: &Value, location: &str) -> GeneratorResult<RawSchema> {
    let map = as_object(value, location)?;

    if let Some(reference) = map.get("$ref") {
      let reference = reference
        .as_str()
        .ok_or_else(|| GeneratorError::malformed(location, "`$ref` must be a string"))?;
      return parse_schema_ref_path(reference)
        .map(SchemaNode::Reference)
        .ok_or_else(|| GeneratorError::UnresolvedReference {
          reference: reference.to_string(),
          location: location.to_string(),
        });
    }

    for keyword in UNSUPPORTED_KEYWORDS {
      if let Some(value) = map.get(*keyword)
        && *value != Value::Bool(false)
      {
        return Err(GeneratorError::unsupported(
          location,
          format!("keyword `{keyword}` is not supported"),
        ));
      }
    }

    let description = optional_string(map, "description", location)?;
    match schema_type(map, location)? {
      SchemaType::Scalar(kind) => self.parse_scalar(map, kind, description, location),
      SchemaType::Array => self.parse_array(map, description, location),
      SchemaType::Object => self.parse_object(map, description, location),
    }
  }

  fn parse_scalar(
    &self,
    map: &Map<String, Value>,
    kind: ScalarKind,
    description: Option<String>,
    location: &str,
  ) -> GeneratorResult<RawSchema> {
    reject_keywords(map, ARRAY_ONLY_KEYWORDS, location, "scalar")?;
    reject_keywords(map, OBJECT_ONLY_KEYWORDS, location, "scalar")?;

    let literal = |value: &Value, keyword: &str| {
      Literal::from_json(value).ok_or_else(|| {
        GeneratorError::unsupported(location, format!("`{keyword}` value {value} is not a scalar literal"))
      })
    };

    let enum_values = match map.get("enum") {
      None => vec![],
      Some(Value::Array(values)) => values
        .iter()
        .map(|value| literal(value, "enum"))
        .collect::<GeneratorResult<_>>()?,
      Some(_) => return Err(GeneratorError::malformed(location, "`enum` must be a list")),
    };

    Ok(SchemaNode::Scalar(ScalarSchema {
      kind,
      format: optional_string(map, "format", location)?,
      enum_values,
      default: map.get("default").map(|value| literal(value, "default")).transpose()?,
      minimum: optional_number(map, "minimum", location)?,
      maximum: optional_number(map, "maximum", location)?,
      multiple_of: optional_number(map, "multipleOf", location)?,
      description,
    }))
  }

  fn parse_array(
    &self,
    map: &Map<String, Value>,
    description: Option<String>,
    location: &str,
  ) -> GeneratorResult<RawSchema> {
    reject_keywords(map, SCALAR_ONLY_KEYWORDS, location, "array")?;
    reject_keywords(map, OBJECT_ONLY_KEYWORDS, location, "array")?;

    let items = map
      .get("items")
      .ok_or_else(|| GeneratorError::unsupported(location, "array schema without `items`"))?;

    let mut min_items = optional_u64(map, "minItems", location)?;
    let mut unique_items = optional_bool(map, "uniqueItems", location)?;

    // `minItems`/`uniqueItems` written on a scalar `items` describe the array.
    let items_location = format!("{location}.items");
    let items = match items.as_object() {
      Some(inner) if is_scalar_schema(inner) && has_any(inner, &["minItems", "uniqueItems"]) => {
        let mut inner = inner.clone();
        let lifted_min = inner.remove("minItems");
        let lifted_unique = inner.remove("uniqueItems");
        if min_items.is_none()
          && let Some(value) = lifted_min
        {
          min_items = Some(
            value
              .as_u64()
              .ok_or_else(|| GeneratorError::malformed(&items_location, "`minItems` must be a non-negative integer"))?,
          );
        }
        if unique_items.is_none()
          && let Some(value) = lifted_unique
        {
          unique_items = Some(
            value
              .as_bool()
              .ok_or_else(|| GeneratorError::malformed(&items_location, "`uniqueItems` must be a boolean"))?,
          );
        }
        self.parse_schema(&Value::Object(inner), &items_location)?
      }
      _ => self.parse_schema(items, &items_location)?,
    };

    Ok(SchemaNode::Array(ArraySchema {
      items: Box::new(items),
      min_items,
      unique_items,
      description,
    }))
  }

  fn parse_object(
    &self,
    map: &Map<String, Value>,
    description: Option<String>,
    location: &str,
  ) -> GeneratorResult<RawSchema> {
    reject_keywords(map, SCALAR_ONLY_KEYWORDS, location, "object")?;
    reject_keywords(map, ARRAY_ONLY_KEYWORDS, location, "object")?;

    let mut properties = IndexMap::new();
    if let Some(defined) = map.get("properties") {
      for (name, schema) in as_object(defined, &format!("{location}.properties"))? {
        let schema = self.parse_schema(schema, &format!("{location}.properties.{name}"))?;
        properties.insert(name.clone(), schema);
      }
    }

    let mut required = IndexSet::new();
    if let Some(names) = map.get("required") {
      let names = names
        .as_array()
        .ok_or_else(|| GeneratorError::malformed(location, "`required` must be a list"))?;
      for name in names {
        let name = name
          .as_str()
          .ok_or_else(|| GeneratorError::malformed(location, "`required` entries must be strings"))?;
        if !properties.contains_key(name) {
          return Err(GeneratorError::unsupported(
            location,
            format!("required property `{name}` is not declared"),
          ));
        }
        required.insert(name.to_string());
      }
    }

    let additional_properties = match map.get("additionalProperties") {
      None | Some(Value::Bool(_)) => None,
      Some(schema) => Some(Box::new(
        self.parse_schema(schema, &format!("{location}.additionalProperties"))?,
      )),
    };

    if additional_properties.is_some() && !properties.is_empty() {
      return Err(GeneratorError::unsupported(
        location,
        "objects with both `properties` and `additionalProperties` are not supported",
      ));
    }

    Ok(SchemaNode::Object(ObjectSchema {
      properties,
      required,
      additional_properties,
      description,
    }))
  }
}

fn optional_u64(map: &Map<String, Value>, key: &str, location: &str) -> GeneratorResult<Option<u64>> {
  match map.get(key) {
    None => Ok(None),
    Some(value) => value
      .as_u64()
      .map(Some)
      .ok_or_else(|| GeneratorError::malformed(location, format!("`{key}` must be a non-negative integer"))),
  }
}

fn has_any(map: &Map<String, Value>, keys: &[&str]) -> bool {
  keys.iter().any(|key| map.contains_key(*key))
}

fn is_scalar_schema(map: &Map<String, Value>) -> bool {
  !map.contains_key("$ref") && matches!(schema_type(map, ""), Ok(SchemaType::Scalar(_)))
}

fn schema_type(map: &Map<String, Value>, location: &str) -> GeneratorResult<SchemaType> {
  match map.get("type") {
    Some(Value::String(name)) => match name.as_str() {
      "object" => Ok(SchemaType::Object),
      "array" => Ok(SchemaType::Array),
      other => ScalarKind::from_str(other)
        .map(SchemaType::Scalar)
        .map_err(|_| GeneratorError::unsupported(location, format!("type `{other}` is not supported"))),
    },
    Some(Value::Array(_)) => Err(GeneratorError::unsupported(location, "type unions are not supported")),
    Some(_) => Err(GeneratorError::malformed(location, "`type` must be a string")),
    None if has_any(map, OBJECT_ONLY_KEYWORDS) => Ok(SchemaType::Object),
    None if map.contains_key("items") => Ok(SchemaType::Array),
    None => match map.get("enum").and_then(Value::as_array).and_then(|values| values.first()) {
      Some(first) => Literal::from_json(first)
        .map(|literal| SchemaType::Scalar(literal.kind()))
        .ok_or_else(|| GeneratorError::unsupported(location, "enum of non-scalar values")),
      None => Err(GeneratorError::unsupported(location, "schema without a `type`")),
    },
  }
}

/// `application/json` and any `+json` structured syntax, ignoring parameters
/// such as `charset`.
fn is_json_media_type(content_type: &str) -> bool {
  let Ok(media) = MediaType::parse(content_type.trim()) else {
    return false;
  };
  let suffix = media.suffix.as_ref().map(mediatype::Name::as_str);

  media.ty == names::APPLICATION
    && (media.subty == names::JSON || suffix.is_some_and(|suffix| suffix.eq_ignore_ascii_case("json")))
}
