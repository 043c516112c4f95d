use quote::quote;

use super::{CodeMetadata, CodegenConfig, ident};

/// Emits the `mod.rs` that ties `types.rs` and `routes.rs` together.
pub struct ModFileGenerator<'a> {
  metadata: &'a CodeMetadata,
  config: &'a CodegenConfig,
}

impl<'a> ModFileGenerator<'a> {
  pub fn new(metadata: &'a CodeMetadata, config: &'a CodegenConfig) -> Self {
    Self { metadata, config }
  }

  pub fn generate(&self, source_path: &str) -> anyhow::Result<String> {
    let vis = self.config.visibility.to_tokens();
    let service = ident(&self.config.service_name);

    let code = quote! {
      mod routes;
      mod types;

      #vis use routes::{#service, register};
      #vis use types::*;
    };

    super::generate_source(&code, self.metadata, None, source_path)
  }
}
