//! Orchestration for the OpenAPI to Rust route generation pipeline.
//!
//! The [`Orchestrator`] runs the stages in order: resolve the document into a
//! [`ResolvedGraph`](super::schema_graph::ResolvedGraph), register operations,
//! map every schema into the [`TypeCatalog`], then emit the type declarations
//! and the route bindings side by side. Either every artifact is produced or
//! the run fails with the first error.
//!
//! ```no_run
//! # fn example(tree: serde_json::Value) -> anyhow::Result<()> {
//! let orchestrator = Orchestrator::from_tree(&tree, CodegenConfig::default())?;
//! let output = orchestrator.generate("openapi.yaml")?;
//! std::fs::write("types.rs", output.types)?;
//! std::fs::write("routes.rs", output.routes)?;
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use serde_json::Value;

use super::{
  catalog::TypeCatalog,
  codegen::{
    CodeMetadata, CodegenConfig, LintConfig, bindings::BindingsGenerator, generate_source,
    mod_file::ModFileGenerator, types::TypesGenerator,
  },
  context::RunContext,
  document::Document,
  metrics::GenerationStats,
  schema_graph::resolve,
};

/// The three generated files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
  pub types: String,
  pub routes: String,
  pub module: String,
  pub stats: GenerationStats,
}

pub struct Orchestrator {
  document: Document,
  config: CodegenConfig,
}

impl Orchestrator {
  #[must_use]
  pub fn new(document: Document, config: CodegenConfig) -> Self {
    Self { document, config }
  }

  pub fn from_tree(tree: &Value, config: CodegenConfig) -> anyhow::Result<Self> {
    Ok(Self::new(Document::from_tree(tree)?, config))
  }

  #[must_use]
  pub fn metadata(&self) -> CodeMetadata {
    CodeMetadata::from_info(&self.document.info)
  }

  /// Runs the pipeline. `source_path` is recorded in the file banners.
  pub fn generate(&self, source_path: &str) -> anyhow::Result<GeneratedOutput> {
    let graph = resolve(&self.document)?;

    let mut context = RunContext::new();
    context.register_operations(graph.operations())?;
    let catalog = TypeCatalog::build(&graph, &mut context)?;

    let metadata = self.metadata();
    let lints = LintConfig::default();

    let (types, routes) = rayon::join(
      || -> anyhow::Result<_> {
        let output = TypesGenerator::new(&graph, &catalog, &self.config).generate();
        let code = generate_source(&output.tokens, &metadata, Some(&lints), source_path)?;
        Ok((code, output.counts))
      },
      || -> anyhow::Result<_> {
        let support = syn::parse_str::<syn::Path>(&self.config.support_crate)
          .with_context(|| format!("invalid support crate path `{}`", self.config.support_crate))?;
        let output = BindingsGenerator::new(&graph, &catalog, support, &self.config).generate()?;
        let code = generate_source(&output.tokens, &metadata, Some(&lints), source_path)?;
        Ok((code, output.operations, output.parameters))
      },
    );
    let (types, counts) = types?;
    let (routes, operations, parameters) = routes?;

    let module = ModFileGenerator::new(&metadata, &self.config).generate(source_path)?;

    let mut stats = GenerationStats {
      schemas: graph.len(),
      ..GenerationStats::default()
    };
    stats.record_types(counts);
    stats.record_bindings(operations, parameters);
    stats.record_cycles(graph.recursive_cycles());

    Ok(GeneratedOutput {
      types,
      routes,
      module,
      stats,
    })
  }
}
