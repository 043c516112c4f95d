use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
  #[error("missing required parameter '{name}'")]
  Missing { name: String },
  #[error("invalid value '{value}' for parameter '{name}': {reason}")]
  Invalid { name: String, value: String, reason: String },
}

impl ParamError {
  fn missing(name: &str) -> Self {
    Self::Missing { name: name.to_string() }
  }

  #[must_use]
  pub fn name(&self) -> &str {
    match self {
      Self::Missing { name } | Self::Invalid { name, .. } => name,
    }
  }
}

fn convert<T>(value: &str, name: &str) -> Result<T, ParamError>
where
  T: FromStr,
  T::Err: Display,
{
  value.parse::<T>().map_err(|err| ParamError::Invalid {
    name: name.to_string(),
    value: value.to_string(),
    reason: err.to_string(),
  })
}

/// Converts a required parameter.
pub fn parse<T>(raw: Option<&str>, name: &str) -> Result<T, ParamError>
where
  T: FromStr,
  T::Err: Display,
{
  let value = raw.ok_or_else(|| ParamError::missing(name))?;
  convert(value, name)
}

/// Converts an optional parameter; absence is not an error.
pub fn parse_optional<T>(raw: Option<&str>, name: &str) -> Result<Option<T>, ParamError>
where
  T: FromStr,
  T::Err: Display,
{
  raw.map(|value| convert(value, name)).transpose()
}

/// Converts an optional parameter, falling back to `default` when absent.
pub fn parse_or<T, F>(raw: Option<&str>, name: &str, default: F) -> Result<T, ParamError>
where
  T: FromStr,
  T::Err: Display,
  F: FnOnce() -> T,
{
  Ok(parse_optional(raw, name)?.unwrap_or_else(default))
}

/// Splits a joined value (`explode=false`) into its elements.
///
/// An empty string yields no elements.
#[must_use]
pub fn split(raw: Option<&str>, separator: char) -> Option<Vec<&str>> {
  raw.map(|value| {
    if value.is_empty() {
      vec![]
    } else {
      value.split(separator).collect()
    }
  })
}

/// Treats an empty list of repeated values as an absent parameter.
#[must_use]
pub fn repeated(values: Vec<&str>) -> Option<Vec<&str>> {
  if values.is_empty() { None } else { Some(values) }
}

pub fn parse_each<T>(values: Vec<&str>, name: &str) -> Result<Vec<T>, ParamError>
where
  T: FromStr,
  T::Err: Display,
{
  values.into_iter().map(|value| convert(value, name)).collect()
}

/// Converts a required array parameter element-wise.
pub fn parse_array<T>(parts: Option<Vec<&str>>, name: &str) -> Result<Vec<T>, ParamError>
where
  T: FromStr,
  T::Err: Display,
{
  let parts = parts.ok_or_else(|| ParamError::missing(name))?;
  parse_each(parts, name)
}

pub fn parse_array_optional<T>(parts: Option<Vec<&str>>, name: &str) -> Result<Option<Vec<T>>, ParamError>
where
  T: FromStr,
  T::Err: Display,
{
  parts.map(|parts| parse_each(parts, name)).transpose()
}
