use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};

use super::{CodegenConfig, Visibility, ident, literal_tokens, type_tokens, variant_idents};
use crate::generator::{
  catalog::TypeCatalog,
  descriptor::{Constraints, EnumerationType, RecordType, RustPrimitive, TypeDescriptor},
  document::Literal,
  naming::identifiers::{ensure_unique, to_rust_field_name, to_rust_type_name, unraw},
  schema_graph::{ResolvedGraph, SchemaId},
};

/// Number of declarations emitted, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
  pub records: usize,
  pub enums: usize,
  pub aliases: usize,
}

#[derive(Debug)]
pub struct TypesOutput {
  pub tokens: TokenStream,
  pub counts: TypeCounts,
}

#[derive(Debug, Clone)]
enum Declaration<'a> {
  /// A record or enumeration, named by the descriptor itself.
  Declared(&'a TypeDescriptor),
  /// A component that maps to a primitive, sequence, map or another component.
  /// A recursive one is declared as a transparent newtype.
  Alias {
    name: String,
    target: &'a TypeDescriptor,
    recursive: bool,
  },
}

/// Emits the type declarations of every component and every anonymous type.
///
/// Components appear in document order with the components they depend on
/// first. Anonymous types are emitted once per name, just before the first
/// declaration that uses them.
pub struct TypesGenerator<'a> {
  graph: &'a ResolvedGraph,
  catalog: &'a TypeCatalog,
  visibility: Visibility,
}

impl<'a> TypesGenerator<'a> {
  pub fn new(graph: &'a ResolvedGraph, catalog: &'a TypeCatalog, config: &CodegenConfig) -> Self {
    Self {
      graph,
      catalog,
      visibility: config.visibility,
    }
  }

  pub fn generate(&self) -> TypesOutput {
    let mut counts = TypeCounts::default();
    let declarations = self
      .plan()
      .into_iter()
      .map(|declaration| match declaration {
        Declaration::Declared(TypeDescriptor::Record(record)) => {
          counts.records += 1;
          RecordFragment::new(record, self.visibility).into_token_stream()
        }
        Declaration::Declared(TypeDescriptor::Enumeration(enumeration)) => {
          counts.enums += 1;
          EnumFragment::new(enumeration, self.visibility).into_token_stream()
        }
        Declaration::Declared(_) => TokenStream::new(),
        Declaration::Alias { name, target, recursive } => {
          if recursive {
            counts.records += 1;
          } else {
            counts.aliases += 1;
          }
          AliasFragment::new(&name, target, recursive, self.visibility).into_token_stream()
        }
      })
      .collect::<Vec<_>>();

    let tokens = quote! {
      use serde::{Deserialize, Serialize};

      #(#declarations)*
    };

    TypesOutput { tokens, counts }
  }

  fn plan(&self) -> Vec<Declaration<'a>> {
    let mut planner = Planner {
      graph: self.graph,
      catalog: self.catalog,
      visited: vec![false; self.graph.len()],
      names: HashSet::new(),
      out: vec![],
    };

    for (id, _) in self.graph.schemas() {
      planner.visit_component(id);
    }

    for operation in self.catalog.operations() {
      let owned = operation
        .parameters
        .iter()
        .chain(operation.request.iter())
        .chain(operation.response.iter());
      for descriptor in owned {
        planner.push_declared(descriptor, true);
      }
    }

    planner.out
  }
}

struct Planner<'a> {
  graph: &'a ResolvedGraph,
  catalog: &'a TypeCatalog,
  visited: Vec<bool>,
  names: HashSet<String>,
  out: Vec<Declaration<'a>>,
}

impl<'a> Planner<'a> {
  fn visit_component(&mut self, id: SchemaId) {
    if self.visited[id.index()] {
      return;
    }
    // Marked before the dependencies so list recursion terminates.
    self.visited[id.index()] = true;

    for dependency in self.graph.dependencies(id) {
      self.visit_component(*dependency);
    }

    let descriptor = self.catalog.component(id);
    if descriptor.declared_name().is_some() {
      self.push_declared(descriptor, true);
      return;
    }

    self.push_declared(descriptor, false);
    let name = to_rust_type_name(&self.graph.schema(id).name);
    if self.names.insert(name.clone()) {
      self.out.push(Declaration::Alias {
        name,
        target: descriptor,
        recursive: self.is_recursive_alias(id),
      });
    }
  }

  /// Whether alias `id` names itself through other aliases only, as in
  /// `Nested = Vec<Nested>`. A record on the way breaks the recursion.
  fn is_recursive_alias(&self, id: SchemaId) -> bool {
    let mut seen = vec![false; self.graph.len()];
    let mut pending = alias_targets(self.catalog.component(id));

    while let Some(next) = pending.pop() {
      if next == id {
        return true;
      }
      if std::mem::replace(&mut seen[next.index()], true) {
        continue;
      }
      let descriptor = self.catalog.component(next);
      if descriptor.declared_name().is_none() {
        pending.extend(alias_targets(descriptor));
      }
    }
    false
  }

  fn push_declared(&mut self, descriptor: &'a TypeDescriptor, include_self: bool) {
    for nested in descriptor.anonymous_declarations(include_self) {
      if let Some(name) = nested.declared_name()
        && self.names.insert(name.to_string())
      {
        self.out.push(Declaration::Declared(nested));
      }
    }
  }
}

/// Components a type expression names without a declaration in between.
fn alias_targets(descriptor: &TypeDescriptor) -> Vec<SchemaId> {
  match descriptor {
    TypeDescriptor::Named(named) => vec![named.schema],
    TypeDescriptor::Sequence(sequence) => alias_targets(&sequence.items),
    TypeDescriptor::Map(map) => alias_targets(&map.values),
    TypeDescriptor::Optional(inner) => alias_targets(inner),
    TypeDescriptor::Primitive(_) | TypeDescriptor::Enumeration(_) | TypeDescriptor::Record(_) => vec![],
  }
}

fn doc_attrs(lines: &[String]) -> TokenStream {
  let lines = lines.iter().map(|line| {
    let text = if line.is_empty() { String::new() } else { format!(" {line}") };
    quote! { #[doc = #text] }
  });
  quote! { #(#lines)* }
}

fn description_lines(description: Option<&str>) -> Vec<String> {
  description
    .map(|text| text.trim().lines().map(|line| line.trim_end().to_string()).collect())
    .unwrap_or_default()
}

fn constraint_lines(constraints: &Constraints) -> Vec<String> {
  let mut lines = vec![];
  if let Some(format) = &constraints.format {
    lines.push(format!("- Format: `{format}`"));
  }
  if let Some(default) = &constraints.default {
    lines.push(format!("- Default: `{}`", literal_text(default)));
  }
  if let Some(minimum) = &constraints.minimum {
    lines.push(format!("- Minimum: `{minimum}`"));
  }
  if let Some(maximum) = &constraints.maximum {
    lines.push(format!("- Maximum: `{maximum}`"));
  }
  if let Some(step) = &constraints.multiple_of {
    lines.push(format!("- Multiple of: `{step}`"));
  }
  lines
}

fn literal_text(literal: &Literal) -> String {
  match literal {
    Literal::String(text) => format!("{text:?}"),
    other => other.to_string(),
  }
}

/// Documentation lines for a use of `descriptor`: its description followed
/// by the constraints attached to it.
fn usage_docs(descriptor: &TypeDescriptor) -> Vec<String> {
  let descriptor = descriptor.unwrap_optional();
  let mut lines = match descriptor {
    TypeDescriptor::Record(_) | TypeDescriptor::Enumeration(_) | TypeDescriptor::Named(_) => vec![],
    other => description_lines(other.description()),
  };

  let mut constraints = vec![];
  match descriptor {
    TypeDescriptor::Primitive(primitive) => constraints.extend(constraint_lines(&primitive.constraints)),
    TypeDescriptor::Enumeration(enumeration) => {
      if let Some(default) = enumeration.default.map(|index| &enumeration.cases[index]) {
        constraints.push(format!("- Default: `{}`", literal_text(&default.literal)));
      }
    }
    TypeDescriptor::Sequence(sequence) => {
      if let Some(min_items) = sequence.min_items {
        constraints.push(format!("- Min items: `{min_items}`"));
      }
      if sequence.unique_items {
        constraints.push("- Unique items".to_string());
      }
      if let TypeDescriptor::Primitive(items) = sequence.items.unwrap_optional() {
        constraints.extend(
          constraint_lines(&items.constraints)
            .into_iter()
            .map(|line| line.replacen("- ", "- Items ", 1)),
        );
      }
    }
    _ => {}
  }

  if !lines.is_empty() && !constraints.is_empty() {
    lines.push(String::new());
  }
  lines.extend(constraints);
  lines
}

struct RecordFragment<'a> {
  record: &'a RecordType,
  visibility: Visibility,
}

impl<'a> RecordFragment<'a> {
  fn new(record: &'a RecordType, visibility: Visibility) -> Self {
    Self { record, visibility }
  }
}

impl ToTokens for RecordFragment<'_> {
  fn to_tokens(&self, tokens: &mut TokenStream) {
    let vis = self.visibility.to_tokens();
    let name = ident(&self.record.name);
    let docs = doc_attrs(&description_lines(self.record.description.as_deref()));

    let mut used = HashSet::new();
    let fields = self.record.fields.iter().map(|field| {
      let field_name = ensure_unique(&to_rust_field_name(&field.name), &used);
      used.insert(field_name.clone());

      let field_ident = ident(&field_name);
      let ty = type_tokens(&field.ty);
      let field_docs = doc_attrs(&usage_docs(&field.ty));

      let mut serde_args = vec![];
      if unraw(&field_name) != field.name {
        let wire = &field.name;
        serde_args.push(quote! { rename = #wire });
      }
      if matches!(field.ty, TypeDescriptor::Optional(_)) {
        serde_args.push(quote! { default, skip_serializing_if = "Option::is_none" });
      }
      let serde_attr = (!serde_args.is_empty()).then(|| quote! { #[serde(#(#serde_args),*)] });

      quote! {
        #field_docs
        #serde_attr
        #vis #field_ident: #ty
      }
    });

    tokens.extend(quote! {
      #docs
      #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
      #vis struct #name {
        #(#fields),*
      }
    });
  }
}

struct EnumFragment<'a> {
  enumeration: &'a EnumerationType,
  visibility: Visibility,
}

impl<'a> EnumFragment<'a> {
  fn new(enumeration: &'a EnumerationType, visibility: Visibility) -> Self {
    Self {
      enumeration,
      visibility,
    }
  }

  /// `TryFrom`/`From` conversions between the enum and its literal type,
  /// used by serde for non-string enumerations.
  fn literal_conversions(&self) -> TokenStream {
    let name = ident(&self.enumeration.name);
    let type_name = &self.enumeration.name;
    let repr = ident(&self.enumeration.repr.to_string());
    let variants = variant_idents(self.enumeration);
    let literals = self
      .enumeration
      .cases
      .iter()
      .map(|case| literal_tokens(&case.literal, self.enumeration.repr))
      .collect::<Vec<_>>();

    let try_from_arms = if self.enumeration.repr.is_float() {
      quote! { #(v if v == #literals => Ok(Self::#variants),)* }
    } else {
      quote! { #(#literals => Ok(Self::#variants),)* }
    };

    quote! {
      impl TryFrom<#repr> for #name {
        type Error = String;

        fn try_from(value: #repr) -> Result<Self, Self::Error> {
          match value {
            #try_from_arms
            other => Err(format!("invalid {} value `{other}`", #type_name)),
          }
        }
      }

      impl From<#name> for #repr {
        fn from(value: #name) -> Self {
          match value {
            #(#name::#variants => #literals,)*
          }
        }
      }
    }
  }
}

impl ToTokens for EnumFragment<'_> {
  fn to_tokens(&self, tokens: &mut TokenStream) {
    let vis = self.visibility.to_tokens();
    let name = ident(&self.enumeration.name);
    let type_name = &self.enumeration.name;
    let docs = doc_attrs(&description_lines(self.enumeration.description.as_deref()));
    let variants = variant_idents(self.enumeration);
    let texts = self
      .enumeration
      .cases
      .iter()
      .map(|case| case.literal.to_string())
      .collect::<Vec<_>>();

    let string_backed = matches!(self.enumeration.repr, RustPrimitive::String);

    let (serde_container, variant_renames) = if string_backed {
      let renames = texts.iter().map(|text| quote! { #[serde(rename = #text)] }).collect::<Vec<_>>();
      (TokenStream::new(), renames)
    } else {
      let repr = self.enumeration.repr.to_string();
      (
        quote! { #[serde(try_from = #repr, into = #repr)] },
        vec![TokenStream::new(); texts.len()],
      )
    };

    let from_str_body = if string_backed {
      quote! {
        match s {
          #(#texts => Ok(Self::#variants),)*
          other => Err(format!("invalid {} value `{other}`", #type_name)),
        }
      }
    } else {
      let repr = ident(&self.enumeration.repr.to_string());
      quote! {
        let value = s
          .parse::<#repr>()
          .map_err(|error| format!("invalid {} value `{s}`: {error}", #type_name))?;
        Self::try_from(value)
      }
    };

    let conversions = (!string_backed).then(|| self.literal_conversions());

    tokens.extend(quote! {
      #docs
      #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
      #serde_container
      #vis enum #name {
        #(
          #variant_renames
          #variants,
        )*
      }

      impl #name {
        #vis const fn as_str(self) -> &'static str {
          match self {
            #(Self::#variants => #texts,)*
          }
        }
      }

      impl std::fmt::Display for #name {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
          f.write_str(self.as_str())
        }
      }

      impl std::str::FromStr for #name {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
          #from_str_body
        }
      }

      #conversions
    });
  }
}

struct AliasFragment<'a> {
  name: &'a str,
  target: &'a TypeDescriptor,
  recursive: bool,
  visibility: Visibility,
}

impl<'a> AliasFragment<'a> {
  fn new(name: &'a str, target: &'a TypeDescriptor, recursive: bool, visibility: Visibility) -> Self {
    Self {
      name,
      target,
      recursive,
      visibility,
    }
  }
}

impl ToTokens for AliasFragment<'_> {
  fn to_tokens(&self, tokens: &mut TokenStream) {
    let vis = self.visibility.to_tokens();
    let name = ident(self.name);
    let ty = type_tokens(self.target);
    let docs = doc_attrs(&usage_docs(self.target));

    if self.recursive {
      tokens.extend(quote! {
        #docs
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        #vis struct #name(#vis #ty);
      });
    } else {
      tokens.extend(quote! {
        #docs
        #vis type #name = #ty;
      });
    }
  }
}
