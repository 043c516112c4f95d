use std::{collections::HashSet, sync::LazyLock};

use any_ascii::any_ascii;
use inflections::Inflect;
use regex::Regex;

static FORBIDDEN_IDENTIFIERS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "async", "await", "dyn", "try", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "gen",
  ]
  .into_iter()
  .collect()
});

// Names the generated code relies on; declaring one would shadow it.
static RESERVED_TYPE_NAMES: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "Arc", "Clone", "Copy", "Display", "FromStr", "Method", "Option", "Result", "Send", "String", "Sync", "Type", "Vec",
  ]
  .into_iter()
  .collect()
});

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Transliterates to ASCII and replaces every run of non-alphanumeric
/// characters with a single underscore, trimming the ends.
pub(crate) fn sanitize(input: &str) -> String {
  let ascii = any_ascii(input);
  INVALID_CHARS_RE.replace_all(&ascii, "_").trim_matches('_').to_string()
}

/// Snake-cases an already sanitized name.
///
/// Names without lowercase letters (`CAR_TO_PARK`, `WALK`) carry their word
/// boundaries in separators only, so they are lowered first.
fn snake_words(sanitized: &str) -> String {
  if sanitized.chars().any(|c| c.is_ascii_lowercase()) {
    sanitized.to_snake_case()
  } else {
    sanitized.to_ascii_lowercase().to_snake_case()
  }
}

/// Converts a wire name into a `snake_case` Rust identifier.
///
/// Keywords become raw identifiers, `self` becomes `self_` (likewise `crate`
/// and `super`, which cannot be raw), a leading digit
/// gets an underscore and a leading `-` becomes `negative_`.
pub(crate) fn to_rust_field_name(name: &str) -> String {
  let negative = name.starts_with('-');
  let mut ident = snake_words(&sanitize(name.strip_prefix('-').unwrap_or(name)));

  if ident.is_empty() {
    return "_".to_string();
  }
  if negative {
    ident = format!("negative_{ident}");
  }
  if matches!(ident.as_str(), "self" | "crate" | "super") {
    return format!("{ident}_");
  }
  if FORBIDDEN_IDENTIFIERS.contains(ident.as_str()) {
    return format!("r#{ident}");
  }
  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, '_');
  }
  ident
}

/// Joins the words of `name` in `PascalCase`.
///
/// Names that are already camel-cased keep their inner capitalization
/// (`StepInstruction` stays as is); everything else is rebuilt word by word,
/// so `CAR_PARK` becomes `CarPark`.
pub(crate) fn to_pascal_case(name: &str) -> String {
  let has_separators = name.contains(|c: char| !c.is_ascii_alphanumeric());
  let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
  let has_lower = name.chars().any(|c| c.is_ascii_lowercase());

  if !has_separators && has_upper && has_lower {
    let mut chars = name.chars();
    return chars
      .next()
      .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
      .unwrap_or_default();
  }
  snake_words(&sanitize(name)).to_pascal_case()
}

/// Converts a name into a `PascalCase` Rust type identifier that is safe to
/// declare next to the generated code.
pub(crate) fn to_rust_type_name(name: &str) -> String {
  let negative = name.starts_with('-');
  let mut ident = to_pascal_case(name.strip_prefix('-').unwrap_or(name));

  if ident.is_empty() {
    return "Unnamed".to_string();
  }
  if negative {
    ident = format!("Negative{ident}");
  }
  if ident == "Self" || RESERVED_TYPE_NAMES.contains(ident.as_str()) {
    return format!("{ident}Type");
  }
  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, 'T');
  }
  ident
}

/// Strips a raw identifier prefix, giving the name as written in source.
pub(crate) fn unraw(ident: &str) -> &str {
  ident.strip_prefix("r#").unwrap_or(ident)
}

/// Appends the smallest numeric suffix (from 2) that makes `base` unused.
pub(crate) fn ensure_unique(base: &str, used: &HashSet<String>) -> String {
  if !used.contains(base) {
    return base.to_string();
  }
  (2..)
    .map(|i| format!("{}{i}", unraw(base)))
    .find(|candidate| !used.contains(candidate))
    .unwrap_or_else(|| base.to_string())
}
