use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{Local, Timelike};
use contractgen::{
  generator::{
    config::{GeneratorConfig, OperationFilter, SchemaScope},
    diagnostics::{Diagnostic, Severity},
    metrics::GenerationStats,
    orchestrator::{GenerationFailure, Orchestrator},
    render::{JsonIrRenderer, RenderedFile, Renderer, YamlIrRenderer},
  },
  utils::spec::load_documents,
};
use crossterm::style::Stylize;
use num_format::{Locale, ToFormattedString};

use crate::ui::{Colors, GenerateCommand, cli::FormatArg};

fn format_timestamp() -> String {
  let now = Local::now();
  format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second())
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
  pub input: PathBuf,
  pub output: PathBuf,
  pub format: FormatArg,
  pub verbose: bool,
  pub quiet: bool,
  pub generator: GeneratorConfig,
}

impl GenerateConfig {
  pub fn from_command(command: GenerateCommand) -> anyhow::Result<Self> {
    let GenerateCommand {
      input,
      output,
      package,
      target,
      format,
      only,
      exclude,
      referenced_only,
      union_overlap,
      verbose,
      quiet,
    } = command;

    if verbose && quiet {
      anyhow::bail!("--verbose and --quiet cannot be combined");
    }

    let filter = OperationFilter::new(
      only.map(|ids| ids.into_iter().collect::<HashSet<_>>()),
      exclude.map(|ids| ids.into_iter().collect::<HashSet<_>>()),
    );
    let schema_scope = if referenced_only {
      SchemaScope::ReferencedOnly
    } else {
      SchemaScope::All
    };

    let generator = GeneratorConfig::builder()
      .target(target.into())
      .maybe_package(package)
      .schema_scope(schema_scope)
      .union_overlap(union_overlap.into())
      .filter(filter)
      .build();

    Ok(Self {
      input,
      output,
      format,
      verbose,
      quiet,
      generator,
    })
  }

  fn renderer(&self) -> Box<dyn Renderer> {
    match self.format {
      FormatArg::Json => Box::new(JsonIrRenderer),
      FormatArg::Yaml => Box::new(YamlIrRenderer),
    }
  }
}

/// Writes every file under a temporary name first and renames them into place
/// once all writes succeeded, so a failed run leaves no partial output.
pub async fn write_files(output: &Path, files: &[RenderedFile]) -> anyhow::Result<()> {
  tokio::fs::create_dir_all(output)
    .await
    .with_context(|| format!("Failed to create output directory {}", output.display()))?;

  let mut staged = Vec::with_capacity(files.len());
  for file in files {
    let target = output.join(&file.path);
    let mut temp_name = target.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp = PathBuf::from(temp_name);

    if let Err(err) = tokio::fs::write(&temp, &file.contents).await {
      for (staged_temp, _) in &staged {
        let _ = tokio::fs::remove_file(staged_temp).await;
      }
      return Err(err).with_context(|| format!("Failed to write {}", temp.display()));
    }
    staged.push((temp, target));
  }

  let mut pending = staged.into_iter();
  while let Some((temp, target)) = pending.next() {
    if let Err(err) = tokio::fs::rename(&temp, &target).await {
      let _ = tokio::fs::remove_file(&temp).await;
      for (staged_temp, _) in pending {
        let _ = tokio::fs::remove_file(&staged_temp).await;
      }
      return Err(err).with_context(|| format!("Failed to move {} into place", target.display()));
    }
  }
  Ok(())
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

  fn stat(&self, label: &str, value: usize) {
    if !self.config.quiet {
      println!(
        "            {:<25} {}",
        label.with(self.colors.label()),
        value.to_formatted_string(&Locale::en).with(self.colors.value())
      );
    }
  }

  fn detail(&self, value: String) {
    if !self.config.quiet {
      println!("            {:<25} {}", "", value.with(self.colors.value()));
    }
  }

  fn log_loading(&self) {
    self.info(
      &format!("Loading OpenAPI document from: {}", self.config.input.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_unavailable(&self, documents: &[(String, String)]) {
    for (document, reason) in documents {
      self.info(
        &format!("Referenced document could not be loaded: {document} ({reason})")
          .with(self.colors.warning())
          .to_string(),
      );
    }
  }

  fn log_generating(&self) {
    self.info(
      &format!("Compiling IR for the {} binding...", self.config.generator.target)
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn print_statistics(&self, stats: &GenerationStats) {
    if self.config.quiet {
      return;
    }

    self.stat("Types generated:", stats.types_generated);
    self.detail(format!("{} objects", stats.objects_generated));
    self.detail(format!("{} enums", stats.enums_generated));
    self.detail(format!("{} unions", stats.unions_generated));
    self.detail(format!("{} arrays", stats.arrays_generated));
    self.detail(format!("{} aliases", stats.aliases_generated));
    self.stat("Operations converted:", stats.operations_converted);
    self.stat("Parameters:", stats.parameters_converted);
    self.stat("Request body variants:", stats.request_body_variants);
    self.stat("Response variants:", stats.response_variants);
    if stats.warnings_recorded > 0 {
      self.stat("Warnings:", stats.warnings_recorded);
    }
    self.print_cycles(stats);
  }

  fn print_cycles(&self, stats: &GenerationStats) {
    if stats.cycles_detected == 0 {
      return;
    }

    self.stat("Cycles:", stats.cycles_detected);
    self.stat("Back-references:", stats.back_references);

    if self.config.verbose {
      for (i, cycle) in stats.cycle_details.iter().enumerate() {
        println!(
          "              {}: {}",
          format!("Cycle {}", i + 1).with(self.colors.accent()),
          cycle.join(" -> ").with(self.colors.info())
        );
      }
    }
  }

  fn print_warnings(&self, warnings: &[Diagnostic]) {
    if warnings.is_empty() || !self.config.verbose {
      return;
    }

    println!();
    for warning in warnings {
      eprintln!(
        "{} {}",
        "Warning:".with(self.colors.warning()),
        warning.to_string().with(self.colors.primary())
      );
    }
  }

  fn print_failure(&self, failure: &GenerationFailure) {
    for diagnostic in &failure.diagnostics {
      let color = match diagnostic.severity {
        Severity::Error => self.colors.error(),
        Severity::Warning => self.colors.warning(),
      };
      eprintln!("{}", diagnostic.to_string().with(color));
    }
  }

  fn log_writing(&self, files: &[RenderedFile]) {
    for file in files {
      self.info(
        &format!("Writing {}", self.config.output.join(&file.path).display())
          .with(self.colors.primary())
          .to_string(),
      );
    }
  }

  fn log_success(&self, fingerprint: &str) {
    if !self.config.quiet {
      println!();
      println!(
        "{} {} {}",
        format_timestamp().with(self.colors.timestamp()),
        "Successfully generated IR".with(self.colors.success()),
        format!("(fingerprint {fingerprint})").with(self.colors.info())
      );
    }
  }
}

pub async fn generate(config: GenerateConfig, colors: &Colors) -> anyhow::Result<()> {
  let logger = GenerateLogger::new(&config, colors);

  logger.log_loading();
  let documents = load_documents(&config.input).await?;
  let unavailable: Vec<(String, String)> = documents
    .unavailable()
    .map(|(name, reason)| (name.to_string(), reason.to_string()))
    .collect();
  logger.log_unavailable(&unavailable);

  logger.log_generating();
  let orchestrator = Orchestrator::new(documents, config.generator.clone());
  let output = match orchestrator.generate() {
    Ok(output) => output,
    Err(failure) => {
      logger.print_failure(&failure);
      let errors = failure.errors().count();
      return Err(failure).with_context(|| format!("{errors} error(s) reported"));
    }
  };

  logger.print_statistics(&output.stats);
  logger.print_warnings(&output.warnings);

  let renderer = config.renderer();
  let files = renderer
    .render(&output.ir)
    .with_context(|| format!("The {} renderer failed", renderer.name()))?;
  logger.log_writing(&files);
  write_files(&config.output, &files).await?;

  logger.log_success(&output.ir.fingerprint()?);
  Ok(())
}
