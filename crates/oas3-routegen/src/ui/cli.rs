use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::colors::{ColorMode, Colors, ThemeMode};

#[derive(Parser, Debug)]
#[command(name = "oas3-routegen")]
#[command(author, version, about = "OpenAPI to Rust type and route binding generator")]
#[command(styles = Colors::clap_styles())]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Control color output
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub color: ColorMode,

  /// Terminal theme (dark or light background)
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub theme: ThemeMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// List information from an OpenAPI document
  List {
    #[command(subcommand)]
    list_command: ListCommands,
  },
  /// Generate `types.rs`, `routes.rs` and `mod.rs` from an OpenAPI document
  Generate(GenerateCommand),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
  /// Path to the OpenAPI document (JSON or YAML)
  #[arg(short, long, value_name = "FILE")]
  pub input: PathBuf,

  /// Directory the generated files are written to
  #[arg(short, long, value_name = "DIR")]
  pub output: PathBuf,

  /// Visibility level for generated items (public, crate or file)
  #[arg(long, value_name = "VISIBILITY", default_value = "public")]
  pub visibility: String,

  /// Path of the runtime support crate used by the route bindings
  #[arg(long, value_name = "PATH", default_value = "oas3_routegen_support")]
  pub support_crate: String,

  /// Name of the generated service trait
  #[arg(long, value_name = "NAME", default_value = "ApiService")]
  pub service_name: String,

  /// Enable verbose output with detailed progress information
  #[arg(short, long, default_value_t = false)]
  pub verbose: bool,

  /// Suppress non-essential output (errors only)
  #[arg(short, long, default_value_t = false)]
  pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
  /// List all operations with their bound parameters
  Operations {
    /// Path to the OpenAPI document (JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
}
