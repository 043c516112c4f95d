use std::collections::HashSet;

use proc_macro2::{Ident, Literal as LiteralToken, Span, TokenStream};
use quote::{ToTokens, quote};

use super::{
  descriptor::{EnumerationType, RustPrimitive, TypeDescriptor},
  document::{DocumentInfo, Literal},
  naming::identifiers::{ensure_unique, to_rust_type_name},
};

pub mod bindings;
pub mod mod_file;
pub mod types;

pub const DEFAULT_SUPPORT_CRATE: &str = "oas3_routegen_support";
pub const DEFAULT_SERVICE_NAME: &str = "ApiService";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
  #[default]
  Public,
  Crate,
  File,
}

impl Visibility {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "public" => Some(Visibility::Public),
      "crate" => Some(Visibility::Crate),
      "file" => Some(Visibility::File),
      _ => None,
    }
  }

  pub(crate) fn to_tokens(self) -> TokenStream {
    match self {
      Visibility::Public => quote! { pub },
      Visibility::Crate => quote! { pub(crate) },
      Visibility::File => quote! {},
    }
  }
}

/// Options shared by every emitter of a run.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct CodegenConfig {
  #[builder(default)]
  pub visibility: Visibility,
  /// Path of the runtime crate the route bindings call into.
  #[builder(into, default = DEFAULT_SUPPORT_CRATE.to_string())]
  pub support_crate: String,
  /// Name of the generated service trait.
  #[builder(into, default = DEFAULT_SERVICE_NAME.to_string())]
  pub service_name: String,
}

impl Default for CodegenConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

#[derive(Debug, Clone)]
pub struct CodeMetadata {
  pub title: String,
  pub version: String,
  pub description: Option<String>,
}

impl CodeMetadata {
  pub fn from_info(info: &DocumentInfo) -> Self {
    Self {
      title: info.title.clone(),
      version: info.version.clone(),
      description: info.description.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintAllow {
  ClippyDocMarkdown,
  ClippyEnumVariantNames,
  ClippyNeedlessPassByValue,
  ClippyTooManyArguments,
  ClippyTooManyLines,
  DeadCode,
}

impl ToTokens for LintAllow {
  fn to_tokens(&self, tokens: &mut TokenStream) {
    let attr = match self {
      Self::ClippyDocMarkdown => quote! { #![allow(clippy::doc_markdown)] },
      Self::ClippyEnumVariantNames => quote! { #![allow(clippy::enum_variant_names)] },
      Self::ClippyNeedlessPassByValue => quote! { #![allow(clippy::needless_pass_by_value)] },
      Self::ClippyTooManyArguments => quote! { #![allow(clippy::too_many_arguments)] },
      Self::ClippyTooManyLines => quote! { #![allow(clippy::too_many_lines)] },
      Self::DeadCode => quote! { #![allow(dead_code)] },
    };
    tokens.extend(attr);
  }
}

#[derive(Debug, Clone)]
pub struct LintConfig {
  pub allows: Vec<LintAllow>,
}

impl Default for LintConfig {
  fn default() -> Self {
    Self {
      allows: vec![
        LintAllow::ClippyDocMarkdown,
        LintAllow::ClippyEnumVariantNames,
        LintAllow::ClippyNeedlessPassByValue,
        LintAllow::ClippyTooManyArguments,
        LintAllow::ClippyTooManyLines,
        LintAllow::DeadCode,
      ],
    }
  }
}

impl ToTokens for LintConfig {
  fn to_tokens(&self, tokens: &mut TokenStream) {
    for allow in &self.allows {
      allow.to_tokens(tokens);
    }
  }
}

/// Formats `code` and prepends the generated-file banner.
pub(crate) fn generate_source(
  code: &TokenStream,
  metadata: &CodeMetadata,
  lints: Option<&LintConfig>,
  source_path: &str,
) -> anyhow::Result<String> {
  let lints = lints.map(ToTokens::to_token_stream).unwrap_or_default();
  let syntax_tree: syn::File = syn::parse2(quote! {
    #lints
    #code
  })?;
  let formatted = prettyplease::unparse(&syntax_tree);

  let description = metadata
    .description
    .as_deref()
    .map(|d| d.trim_end().replace('\n', "\n//! "))
    .unwrap_or_else(|| String::from("No description provided"));

  Ok(format!(
    r"//! AUTO-GENERATED CODE - DO NOT EDIT!
//!
//! {}
//! Source: {}
//! Version: {}
//! Generated by `oas3-routegen v{}`
//!
//! {}

{}",
    metadata.title,
    source_path,
    metadata.version,
    env!("CARGO_PKG_VERSION"),
    description,
    formatted
  ))
}

/// Identifier for a sanitized name, honouring a `r#` prefix.
pub(crate) fn ident(name: &str) -> Ident {
  match name.strip_prefix("r#") {
    Some(raw) => Ident::new_raw(raw, Span::call_site()),
    None => Ident::new(name, Span::call_site()),
  }
}

/// Type expression a descriptor is used as.
pub(crate) fn type_tokens(descriptor: &TypeDescriptor) -> TokenStream {
  match descriptor {
    TypeDescriptor::Primitive(primitive) => {
      let repr = ident(&primitive.repr.to_string());
      quote! { #repr }
    }
    TypeDescriptor::Enumeration(enumeration) => ident(&enumeration.name).into_token_stream(),
    TypeDescriptor::Record(record) => ident(&record.name).into_token_stream(),
    TypeDescriptor::Named(named) => ident(&named.name).into_token_stream(),
    TypeDescriptor::Sequence(sequence) => {
      let items = type_tokens(&sequence.items);
      quote! { Vec<#items> }
    }
    TypeDescriptor::Map(map) => {
      let values = type_tokens(&map.values);
      quote! { std::collections::BTreeMap<String, #values> }
    }
    TypeDescriptor::Optional(inner) => {
      let inner = type_tokens(inner);
      quote! { Option<#inner> }
    }
  }
}

/// Literal expression of type `repr`.
///
/// Values were checked to fit `repr` when the schema was mapped. An `f32`
/// literal is left unsuffixed and takes its type from the context.
pub(crate) fn literal_tokens(literal: &Literal, repr: RustPrimitive) -> TokenStream {
  match (literal, repr) {
    (Literal::Integer(value), RustPrimitive::I32) => match i32::try_from(*value) {
      Ok(value) => LiteralToken::i32_suffixed(value).into_token_stream(),
      Err(_) => LiteralToken::i64_unsuffixed(*value).into_token_stream(),
    },
    (Literal::Integer(value), _) => LiteralToken::i64_suffixed(*value).into_token_stream(),
    (Literal::Number(value), RustPrimitive::F32) => LiteralToken::f64_unsuffixed(*value).into_token_stream(),
    (Literal::Number(value), _) => LiteralToken::f64_suffixed(*value).into_token_stream(),
    (Literal::Boolean(value), _) => quote! { #value },
    (Literal::String(value), _) => quote! { #value },
  }
}

fn variant_base(literal: &Literal) -> String {
  match literal {
    Literal::String(text) => to_rust_type_name(text),
    Literal::Integer(value) if *value < 0 => format!("ValueNegative{}", value.unsigned_abs()),
    Literal::Integer(value) => format!("Value{value}"),
    Literal::Number(value) => format!("Value{value}").replace('-', "Negative").replace('.', "Point"),
    Literal::Boolean(true) => "True".to_string(),
    Literal::Boolean(false) => "False".to_string(),
  }
}

/// Variant identifiers of an enumeration, one per case in case order.
///
/// Both emitters call this, so a default value in a route binding names the
/// same variant the type declaration defines.
pub(crate) fn variant_idents(enumeration: &EnumerationType) -> Vec<Ident> {
  let mut used = HashSet::new();
  enumeration
    .cases
    .iter()
    .map(|case| {
      let name = ensure_unique(&variant_base(&case.literal), &used);
      used.insert(name.clone());
      ident(&name)
    })
    .collect()
}
