use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::generator::errors::SpecError;

/// Location of a fragment inside the document set, rendered as `file#/json/pointer`.
///
/// The root document is written without a file prefix so paths read the same way
/// the `$ref`s in the document do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourcePath(String);

impl SourcePath {
  pub fn new(document: &str, pointer: &str) -> Self {
    Self(format!("{document}#{pointer}"))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SourcePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for SourcePath {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Warning,
  Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
  Resolve,
  Normalize,
  TypeModel,
  OperationModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub severity: Severity,
  pub stage: Stage,
  pub source_path: SourcePath,
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}[{}] {}: {}", self.severity, self.stage, self.source_path, self.message)
  }
}

/// Append-only record of everything the pipeline had to say about the input.
///
/// Records are tagged with the stage that was active when they were added, which
/// is what [`Diagnostics::stage_failed`] consults at the end of each stage.
#[derive(Debug, Clone)]
pub struct Diagnostics {
  records: Vec<Diagnostic>,
  stage: Stage,
}

impl Default for Diagnostics {
  fn default() -> Self {
    Self::new()
  }
}

impl Diagnostics {
  pub fn new() -> Self {
    Self {
      records: vec![],
      stage: Stage::Resolve,
    }
  }

  pub fn enter(&mut self, stage: Stage) {
    self.stage = stage;
  }

  pub fn stage(&self) -> Stage {
    self.stage
  }

  pub fn warn(&mut self, source_path: &SourcePath, message: impl Into<String>) {
    self.push(Severity::Warning, source_path.clone(), message.into());
  }

  pub fn error(&mut self, error: &SpecError) {
    self.push(Severity::Error, error.source_path().clone(), error.to_string());
  }

  fn push(&mut self, severity: Severity, source_path: SourcePath, message: String) {
    self.records.push(Diagnostic {
      severity,
      stage: self.stage,
      source_path,
      message,
    });
  }

  pub fn records(&self) -> &[Diagnostic] {
    &self.records
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.records.iter().filter(|d| d.severity == Severity::Warning)
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.records.iter().filter(|d| d.severity == Severity::Error)
  }

  pub fn has_errors(&self) -> bool {
    self.errors().next().is_some()
  }

  pub fn stage_failed(&self, stage: Stage) -> bool {
    self
      .records
      .iter()
      .any(|d| d.stage == stage && d.severity == Severity::Error)
  }

  pub fn into_records(self) -> Vec<Diagnostic> {
    self.records
  }
}
