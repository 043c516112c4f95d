use std::{ffi::OsStr, path::Path};

use anyhow::{Context, bail};
use fmmap::tokio::{AsyncMmapFile, AsyncMmapFileExt};
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecFormat {
  #[default]
  Json,
  Yaml,
}

impl SpecFormat {
  #[must_use]
  pub fn from_extension(ext: &str) -> Self {
    match ext {
      "yaml" | "yml" => Self::Yaml,
      _ => Self::Json,
    }
  }
}

/// Reads an OpenAPI document from disk into a generic JSON tree.
pub struct SpecLoader {
  file: AsyncMmapFile,
  format: SpecFormat,
}

impl SpecLoader {
  pub async fn open(path: &Path) -> anyhow::Result<Self> {
    let format = path
      .extension()
      .and_then(OsStr::to_str)
      .map_or(SpecFormat::default(), SpecFormat::from_extension);

    let file = AsyncMmapFile::open(path)
      .await
      .with_context(|| format!("failed to open {}", path.display()))?;

    Ok(Self { file, format })
  }

  pub fn parse(&self) -> anyhow::Result<Value> {
    parse_document(self.file.as_slice(), self.format)
  }
}

/// Parses document text of the given format, keeping key order.
pub fn parse_document(bytes: &[u8], format: SpecFormat) -> anyhow::Result<Value> {
  match format {
    SpecFormat::Json => Ok(serde_json::from_slice(bytes)?),
    SpecFormat::Yaml => {
      let yaml = serde_yaml::from_slice::<YamlValue>(bytes)?;
      yaml_to_json(yaml)
    }
  }
}

fn yaml_to_json(value: YamlValue) -> anyhow::Result<Value> {
  Ok(match value {
    YamlValue::Null => Value::Null,
    YamlValue::Bool(b) => Value::Bool(b),
    YamlValue::Number(n) => {
      if let Some(i) = n.as_i64() {
        Value::Number(i.into())
      } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
      } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        Value::Number(Number::from_f64(f).with_context(|| format!("unsupported YAML number {n}"))?)
      }
    }
    YamlValue::String(s) => Value::String(s),
    YamlValue::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect::<Result<_, _>>()?),
    YamlValue::Mapping(mapping) => {
      let mut map = Map::with_capacity(mapping.len());
      for (key, value) in mapping {
        map.insert(yaml_key(key)?, yaml_to_json(value)?);
      }
      Value::Object(map)
    }
    YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
  })
}

// YAML allows non-string keys; response codes such as `200:` are the common case.
fn yaml_key(key: YamlValue) -> anyhow::Result<String> {
  Ok(match key {
    YamlValue::String(s) => s,
    YamlValue::Number(n) => n.to_string(),
    YamlValue::Bool(b) => b.to_string(),
    YamlValue::Null => "null".to_string(),
    other => bail!("unsupported YAML mapping key {other:?}"),
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn detects_format_from_extension() {
    assert_eq!(SpecFormat::from_extension("yaml"), SpecFormat::Yaml);
    assert_eq!(SpecFormat::from_extension("yml"), SpecFormat::Yaml);
    assert_eq!(SpecFormat::from_extension("json"), SpecFormat::Json);
  }

  #[test]
  fn yaml_numeric_keys_become_strings() {
    let doc = "responses:\n  200:\n    description: ok\n  '400':\n    description: bad\n";
    let tree = parse_document(doc.as_bytes(), SpecFormat::Yaml).unwrap();
    assert_eq!(
      tree,
      json!({"responses": {"200": {"description": "ok"}, "400": {"description": "bad"}}})
    );
  }

  #[test]
  fn yaml_keeps_key_order_and_scalars() {
    let doc = "b: 1\na: 1.5\nc: [true, null, text]\n";
    let tree = parse_document(doc.as_bytes(), SpecFormat::Yaml).unwrap();
    let keys = tree.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys, vec!["b", "a", "c"]);
    assert_eq!(tree["a"], json!(1.5));
    assert_eq!(tree["c"], json!([true, null, "text"]));
  }

  #[test]
  fn json_is_parsed_directly() {
    let tree = parse_document(br#"{"openapi": "3.0.3"}"#, SpecFormat::Json).unwrap();
    assert_eq!(tree["openapi"], json!("3.0.3"));
  }
}
