const COMPONENTS_PREFIX: &str = "#/components/";

/// Extracts the component name from an internal reference of the given
/// kind, e.g. `#/components/parameters/Limit` for kind `parameters`.
///
/// Returns `None` for external references, references into another
/// component kind and JSON pointers that go deeper than one name. `~1` and
/// `~0` escapes in the name are decoded.
pub fn parse_component_ref(ref_path: &str, kind: &str) -> Option<String> {
  let name = ref_path
    .strip_prefix(COMPONENTS_PREFIX)?
    .strip_prefix(kind)?
    .strip_prefix('/')?;

  if name.is_empty() || name.contains('/') {
    return None;
  }
  Some(name.replace("~1", "/").replace("~0", "~"))
}

/// Parses a schema `$ref` and extracts the referenced schema name.
///
/// Only `#/components/schemas/<Name>` is accepted.
pub fn parse_schema_ref_path(ref_path: &str) -> Option<String> {
  parse_component_ref(ref_path, "schemas")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_internal_schema_refs() {
    assert_eq!(
      parse_schema_ref_path("#/components/schemas/Place").as_deref(),
      Some("Place")
    );
    assert_eq!(
      parse_schema_ref_path("#/components/schemas/a~1b").as_deref(),
      Some("a/b")
    );
  }

  #[test]
  fn rejects_other_refs() {
    assert_eq!(parse_schema_ref_path("other.yaml#/components/schemas/Place"), None);
    assert_eq!(parse_schema_ref_path("#/components/parameters/Place"), None);
    assert_eq!(parse_schema_ref_path("#/components/schemas/"), None);
    assert_eq!(parse_schema_ref_path("#/components/schemas/Place/properties/name"), None);
    assert_eq!(parse_schema_ref_path("#/components/schemasPlace"), None);
  }

  #[test]
  fn parses_component_kinds() {
    assert_eq!(
      parse_component_ref("#/components/parameters/Limit", "parameters").as_deref(),
      Some("Limit")
    );
    assert_eq!(parse_component_ref("#/components/parameters/Limit", "responses"), None);
  }
}
