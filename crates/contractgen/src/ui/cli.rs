use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use contractgen::generator::config::{GenerationTarget, UnionOverlapPolicy};

use super::colors::{ColorMode, Colors, ThemeMode};

#[derive(Parser, Debug)]
#[command(name = "contractgen")]
#[command(author, version, about = "Contract-first compiler from OpenAPI documents to a typed IR")]
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
  /// Compile an OpenAPI document into the intermediate representation
  Generate(GenerateCommand),
}

#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct GenerateCommand {
  /// Path to the OpenAPI document (JSON or YAML)
  #[arg(short, long, value_name = "FILE")]
  pub input: PathBuf,

  /// Directory the rendered files are written to
  #[arg(short, long, value_name = "DIR")]
  pub output: PathBuf,

  /// Package or namespace recorded for the renderer
  #[arg(long, value_name = "NAME")]
  pub package: Option<String>,

  /// Protocol binding of the response wrapper runtime construct
  #[arg(long, value_enum, default_value = "client")]
  pub target: TargetArg,

  /// Output format of the rendered IR
  #[arg(long, value_enum, default_value = "json")]
  pub format: FormatArg,

  /// Include only specific operations (comma-separated stable IDs)
  #[arg(long, value_name = "IDS", value_delimiter = ',')]
  pub only: Option<Vec<String>>,

  /// Exclude specific operations (comma-separated stable IDs)
  #[arg(long, value_name = "IDS", value_delimiter = ',')]
  pub exclude: Option<Vec<String>>,

  /// Emit only component schemas reachable from the selected operations
  #[arg(long, default_value_t = false)]
  pub referenced_only: bool,

  /// Handling of undiscriminated unions whose object members overlap
  #[arg(long, value_enum, default_value = "keep")]
  pub union_overlap: OverlapArg,

  /// Enable verbose output with detailed progress information
  #[arg(short, long, default_value_t = false)]
  pub verbose: bool,

  /// Suppress non-essential output (errors only)
  #[arg(short, long, default_value_t = false)]
  pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetArg {
  Client,
  Server,
}

impl From<TargetArg> for GenerationTarget {
  fn from(value: TargetArg) -> Self {
    match value {
      TargetArg::Client => Self::Client,
      TargetArg::Server => Self::Server,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
  Json,
  Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapArg {
  Keep,
  Reject,
}

impl From<OverlapArg> for UnionOverlapPolicy {
  fn from(value: OverlapArg) -> Self {
    match value {
      OverlapArg::Keep => Self::KeepStructural,
      OverlapArg::Reject => Self::Reject,
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
  /// List all operations with their stable IDs
  Operations {
    /// Path to the OpenAPI document (JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
  /// List the type declarations the document compiles to
  Types {
    /// Path to the OpenAPI document (JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
}
