use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, Timelike};
use crossterm::style::Stylize;

use crate::{
  generator::{
    codegen::{CodegenConfig, Visibility},
    metrics::GenerationStats,
    orchestrator::{GeneratedOutput, Orchestrator},
  },
  ui::{Colors, GenerateCommand},
  utils::spec::SpecLoader,
};

const TYPES_FILE: &str = "types.rs";
const ROUTES_FILE: &str = "routes.rs";
const MODULE_FILE: &str = "mod.rs";

fn format_timestamp() -> String {
  let now = Local::now();
  format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second())
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
  pub input: PathBuf,
  pub output: PathBuf,
  pub codegen: CodegenConfig,
  pub verbose: bool,
  pub quiet: bool,
}

impl GenerateConfig {
  pub fn from_command(command: GenerateCommand) -> anyhow::Result<Self> {
    let GenerateCommand {
      input,
      output,
      visibility,
      support_crate,
      service_name,
      verbose,
      quiet,
    } = command;

    let Some(visibility) = Visibility::parse(&visibility) else {
      anyhow::bail!("Invalid visibility '{visibility}': expected public, crate or file");
    };
    syn::parse_str::<syn::Path>(&support_crate)
      .with_context(|| format!("Invalid support crate path '{support_crate}'"))?;
    syn::parse_str::<syn::Ident>(&service_name)
      .with_context(|| format!("Invalid service trait name '{service_name}'"))?;

    Ok(Self {
      input,
      output,
      codegen: CodegenConfig::builder()
        .visibility(visibility)
        .support_crate(support_crate)
        .service_name(service_name)
        .build(),
      verbose,
      quiet,
    })
  }

  async fn load_orchestrator(&self) -> anyhow::Result<Orchestrator> {
    let tree = SpecLoader::open(&self.input).await?.parse()?;
    Orchestrator::from_tree(&tree, self.codegen.clone())
      .with_context(|| format!("Failed to read OpenAPI document {}", self.input.display()))
  }

  async fn write_output(&self, output: &GeneratedOutput) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&self.output)
      .await
      .with_context(|| format!("Failed to create {}", self.output.display()))?;

    for (file, code) in [
      (TYPES_FILE, &output.types),
      (ROUTES_FILE, &output.routes),
      (MODULE_FILE, &output.module),
    ] {
      let path = self.output.join(file);
      tokio::fs::write(&path, code)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
  }
}

struct GenerateLogger<'a> {
  config: &'a GenerateConfig,
  colors: &'a Colors,
}

impl<'a> GenerateLogger<'a> {
  fn new(config: &'a GenerateConfig, colors: &'a Colors) -> Self {
    Self { config, colors }
  }

  fn info(&self, message: &str) {
    if !self.config.quiet {
      println!("{} {message}", format_timestamp().with(self.colors.timestamp()));
    }
  }

  fn stat(&self, label: &str, value: String) {
    if !self.config.quiet {
      println!(
        "            {:<25} {}",
        label.with(self.colors.label()),
        value.with(self.colors.value())
      );
    }
  }

  fn log_loading(&self) {
    self.info(
      &format!("Loading OpenAPI document from: {}", self.config.input.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_generating(&self) {
    self.info(&"Generating types and route bindings...".with(self.colors.primary()).to_string());
  }

  fn print_statistics(&self, stats: &GenerationStats) {
    if self.config.quiet {
      return;
    }

    self.stat("Schemas resolved:", stats.schemas.to_string());
    self.stat("Types generated:", stats.types_generated.to_string());
    self.stat("", format!("{} structs", stats.structs_generated));
    self.stat("", format!("{} enums", stats.enums_generated));
    self.stat("", format!("{} type aliases", stats.type_aliases_generated));
    self.stat("Operations bound:", stats.operations_bound.to_string());
    self.stat("Parameters bound:", stats.parameters_bound.to_string());
    self.print_cycles(stats);
  }

  fn print_cycles(&self, stats: &GenerationStats) {
    if stats.cycles_detected == 0 {
      return;
    }

    self.stat("Recursive schemas:", stats.cycles_detected.to_string());

    if self.config.verbose {
      for (i, cycle) in stats.cycle_details.iter().enumerate() {
        println!(
          "              {}: {}",
          format!("Cycle {}", i + 1).with(self.colors.accent()),
          cycle.join(" -> ").with(self.colors.timestamp())
        );
      }
    }
  }

  fn log_writing(&self) {
    self.info(
      &format!("Writing to: {}", self.config.output.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_written(&self, file: &Path) {
    if self.config.verbose {
      self.info(&format!("  wrote {}", file.display()));
    }
  }

  fn log_success(&self) {
    if !self.config.quiet {
      println!();
      println!(
        "{} {}",
        format_timestamp().with(self.colors.timestamp()),
        "Successfully generated types and route bindings".with(self.colors.success())
      );
    }
  }
}

pub async fn generate_code(config: GenerateConfig, colors: &Colors) -> anyhow::Result<()> {
  let logger = GenerateLogger::new(&config, colors);

  logger.log_loading();
  let orchestrator = config.load_orchestrator().await?;

  logger.log_generating();
  let source_path = config.input.display().to_string();
  let output = orchestrator
    .generate(&source_path)
    .with_context(|| format!("Failed to generate code from {source_path}"))?;
  logger.print_statistics(&output.stats);

  logger.log_writing();
  config.write_output(&output).await?;
  for file in [TYPES_FILE, ROUTES_FILE, MODULE_FILE] {
    logger.log_written(&config.output.join(file));
  }

  logger.log_success();
  Ok(())
}
