use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;

use super::{CodegenConfig, Visibility, ident, literal_tokens, type_tokens, variant_idents};
use crate::generator::{
  catalog::{OperationTypes, TypeCatalog},
  descriptor::{SequenceType, TypeDescriptor},
  document::{HttpMethod, Literal, ParameterLocation},
  errors::{GeneratorError, GeneratorResult},
  naming::identifiers::{ensure_unique, to_rust_field_name},
  operation_registry::OperationRegistry,
  path_template::{CompiledPath, compile_path},
  schema_graph::{ResolvedGraph, ResolvedOperation, ResolvedParameter},
};

#[derive(Debug)]
pub struct BindingsOutput {
  pub tokens: TokenStream,
  pub operations: usize,
  pub parameters: usize,
}

/// How a raw parameter string becomes the argument value.
#[derive(Debug, Clone)]
enum Conversion {
  Required,
  Optional,
  Defaulted(TokenStream),
  Array { optional: bool, exploded: bool },
}

/// One argument of a service method, in binding order.
#[derive(Debug, Clone)]
struct BoundArgument<'a> {
  parameter: &'a ResolvedParameter,
  binding: String,
  element: &'a TypeDescriptor,
  conversion: Conversion,
}

impl BoundArgument<'_> {
  fn element_tokens(&self) -> TokenStream {
    type_tokens(self.element)
  }

  /// Parameter type in the service method signature.
  fn signature_type(&self) -> TokenStream {
    let element = self.element_tokens();
    match &self.conversion {
      Conversion::Required | Conversion::Defaulted(_) => element,
      Conversion::Optional => quote! { Option<#element> },
      Conversion::Array { optional: false, .. } => quote! { Vec<#element> },
      Conversion::Array { optional: true, .. } => quote! { Option<Vec<#element>> },
    }
  }

  fn expression(&self) -> TokenStream {
    let name = &self.parameter.name;
    let element = self.element_tokens();
    let raw = match self.parameter.location {
      ParameterLocation::Path => quote! { req.path_parameter(#name) },
      _ => quote! { req.query_parameter(#name) },
    };

    match &self.conversion {
      Conversion::Required => quote! { support::parse::<#element>(#raw, #name)? },
      Conversion::Optional => quote! { support::parse_optional::<#element>(#raw, #name)? },
      Conversion::Defaulted(default) => {
        quote! { support::parse_or::<#element, _>(#raw, #name, || #default)? }
      }
      Conversion::Array { optional, exploded } => {
        let parts = if *exploded {
          quote! { support::repeated(req.query_parameters(#name)) }
        } else {
          quote! { support::split(#raw, ',') }
        };
        if *optional {
          quote! { support::parse_array_optional::<#element>(#parts, #name)? }
        } else {
          quote! { support::parse_array::<#element>(#parts, #name)? }
        }
      }
    }
  }
}

/// Emits the service trait and the `register` function for every operation.
pub struct BindingsGenerator<'a> {
  graph: &'a ResolvedGraph,
  catalog: &'a TypeCatalog,
  support: syn::Path,
  service_name: String,
  visibility: Visibility,
}

impl<'a> BindingsGenerator<'a> {
  pub fn new(graph: &'a ResolvedGraph, catalog: &'a TypeCatalog, support: syn::Path, config: &CodegenConfig) -> Self {
    Self {
      graph,
      catalog,
      support,
      service_name: config.service_name.clone(),
      visibility: config.visibility,
    }
  }

  pub fn generate(&self) -> GeneratorResult<BindingsOutput> {
    let mut registry = OperationRegistry::new();
    let mut bound = vec![];

    for (index, operation) in self.graph.operations().iter().enumerate() {
      registry.register(operation)?;
      let compiled = compile_path(&operation.path, &operation.parameters)?;
      let arguments = self.bind_arguments(operation, &compiled, self.catalog.operation(index))?;
      bound.push(OperationBinding {
        operation,
        compiled,
        arguments,
      });
    }

    let parameters = bound.iter().map(|binding| binding.arguments.len()).sum();
    let vis = self.visibility.to_tokens();
    let support = &self.support;
    let service = ident(&self.service_name);

    let methods = bound.iter().map(OperationBinding::trait_method);
    let registrations = bound.iter().map(OperationBinding::registration);
    let unused_service = bound.is_empty().then(|| quote! { let _ = service; });

    let tokens = quote! {
      use std::sync::Arc;

      use #support as support;
      #[allow(unused_imports)]
      use support::Request as _;

      #[allow(unused_imports)]
      use super::types::*;

      #vis trait #service: Send + Sync + 'static {
        type Reply;

        #(#methods)*
      }

      #vis fn register<R, S>(router: &mut R, service: Arc<S>)
      where
        R: support::Router<Reply = S::Reply>,
        S: #service,
      {
        #unused_service
        #(#registrations)*
      }
    };

    Ok(BindingsOutput {
      tokens,
      operations: bound.len(),
      parameters,
    })
  }

  /// Path placeholders in template order, then query parameters as declared.
  fn bind_arguments(
    &self,
    operation: &'a ResolvedOperation,
    compiled: &CompiledPath,
    types: &'a OperationTypes,
  ) -> GeneratorResult<Vec<BoundArgument<'a>>> {
    let position = |name: &str, location: ParameterLocation| {
      operation
        .parameters
        .iter()
        .position(|parameter| parameter.name == name && parameter.location == location)
    };

    let mut order = compiled
      .ordered_params
      .iter()
      .filter_map(|name| position(name, ParameterLocation::Path))
      .collect::<Vec<_>>();
    order.extend(
      operation
        .parameters
        .iter()
        .enumerate()
        .filter(|(_, parameter)| parameter.location == ParameterLocation::Query)
        .map(|(index, _)| index),
    );

    let mut used = HashSet::new();
    order
      .into_iter()
      .map(|index| {
        let parameter = &operation.parameters[index];
        let binding = ensure_unique(&to_rust_field_name(&parameter.name), &used);
        used.insert(binding.clone());
        self.bind(operation, parameter, &types.parameters[index], binding)
      })
      .collect()
  }

  fn bind(
    &self,
    operation: &ResolvedOperation,
    parameter: &'a ResolvedParameter,
    descriptor: &'a TypeDescriptor,
    binding: String,
  ) -> GeneratorResult<BoundArgument<'a>> {
    let location = format!("{}.parameters.{}", operation.operation_id, parameter.name);
    let optional = !parameter.required;

    let (element, conversion) = match self.as_sequence(descriptor) {
      Some(sequence) => {
        self.ensure_scalar(&sequence.items, &location)?;
        let exploded = parameter.explode && parameter.location == ParameterLocation::Query;
        (sequence.items.as_ref(), Conversion::Array { optional, exploded })
      }
      None => {
        self.ensure_scalar(descriptor, &location)?;
        let conversion = match (optional, default_tokens(descriptor)) {
          (false, _) => Conversion::Required,
          (true, Some(default)) => Conversion::Defaulted(default),
          (true, None) => Conversion::Optional,
        };
        (descriptor, conversion)
      }
    };

    Ok(BoundArgument {
      parameter,
      binding,
      element,
      conversion,
    })
  }

  /// The sequence behind `descriptor`, looking through component aliases.
  fn as_sequence(&self, descriptor: &'a TypeDescriptor) -> Option<&'a SequenceType> {
    match descriptor {
      TypeDescriptor::Sequence(sequence) => Some(sequence),
      TypeDescriptor::Named(named) => self.as_sequence(self.catalog.component(named.schema)),
      _ => None,
    }
  }

  /// Fails unless values of `descriptor` can be parsed from a single string.
  fn ensure_scalar(&self, descriptor: &TypeDescriptor, location: &str) -> GeneratorResult<()> {
    let unsupported = |what: &str| {
      Err(GeneratorError::unsupported(
        location,
        format!("{what} parameters cannot be converted from a string"),
      ))
    };

    match descriptor {
      TypeDescriptor::Primitive(_) | TypeDescriptor::Enumeration(_) => Ok(()),
      TypeDescriptor::Named(named) => self.ensure_scalar(self.catalog.component(named.schema), location),
      TypeDescriptor::Record(_) => unsupported("object"),
      TypeDescriptor::Map(_) => unsupported("map"),
      TypeDescriptor::Sequence(_) => unsupported("nested array"),
      TypeDescriptor::Optional(inner) => self.ensure_scalar(inner, location),
    }
  }
}

/// Default value expression of a scalar parameter schema.
fn default_tokens(descriptor: &TypeDescriptor) -> Option<TokenStream> {
  match descriptor {
    TypeDescriptor::Primitive(primitive) => {
      let default = primitive.constraints.default.as_ref()?;
      Some(match default {
        Literal::String(text) => quote! { String::from(#text) },
        literal => literal_tokens(literal, primitive.repr),
      })
    }
    TypeDescriptor::Enumeration(enumeration) => {
      let index = enumeration.default?;
      let name = ident(&enumeration.name);
      let variant = variant_idents(enumeration).swap_remove(index);
      Some(quote! { #name::#variant })
    }
    _ => None,
  }
}

struct OperationBinding<'a> {
  operation: &'a ResolvedOperation,
  compiled: CompiledPath,
  arguments: Vec<BoundArgument<'a>>,
}

impl OperationBinding<'_> {
  fn method_ident(&self) -> proc_macro2::Ident {
    ident(&to_rust_field_name(&self.operation.operation_id))
  }

  fn trait_method(&self) -> TokenStream {
    let name = self.method_ident();
    let mut docs = self
      .operation
      .doc()
      .map(|doc| doc.trim().lines().map(|line| format!(" {}", line.trim_end())).collect::<Vec<_>>())
      .unwrap_or_default();
    if !docs.is_empty() {
      docs.push(String::new());
    }
    docs.push(format!(" `{}`", self.operation.route_label()));

    let params = self.arguments.iter().map(|argument| {
      let binding = ident(&argument.binding);
      let ty = argument.signature_type();
      quote! { #binding: #ty }
    });

    quote! {
      #(#[doc = #docs])*
      fn #name(&self, #(#params),*) -> Self::Reply;
    }
  }

  fn registration(&self) -> TokenStream {
    let name = self.method_ident();
    let method = method_tokens(self.operation.method);
    let pattern = &self.compiled.rewritten;
    let arguments = self.arguments.iter().map(BoundArgument::expression);

    quote! {
      {
        let service = Arc::clone(&service);
        router.register(#method, #pattern, move |req: &R::Request| {
          Ok(service.#name(#(#arguments),*))
        });
      }
    }
  }
}

fn method_tokens(method: HttpMethod) -> TokenStream {
  let constant = ident(method.as_str());
  quote! { support::Method::#constant }
}
