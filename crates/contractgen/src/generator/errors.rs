use thiserror::Error;

use crate::generator::diagnostics::SourcePath;

/// Everything that can be wrong with an input document.
///
/// Each variant carries the path of the fragment that caused it. Whether an error
/// halts a stage or only skips one entity is decided by the stage that raises it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
  #[error("unresolved reference '{reference}' (declared at {declared_at}){}", cause_suffix(.cause))]
  UnresolvedReference {
    reference: String,
    declared_at: SourcePath,
    /// Load error of the document the reference points into, if it was unavailable.
    cause: Option<String>,
  },

  #[error("reference '{reference}' never reaches a schema (declared at {declared_at})")]
  CircularAlias { reference: String, declared_at: SourcePath },

  #[error("allOf members disagree on property '{property}': {reason}")]
  IncompatibleMerge {
    property: String,
    reason: String,
    path: SourcePath,
  },

  #[error("unsupported schema shape: {reason}")]
  UnsupportedSchemaShape { reason: String, path: SourcePath },

  #[error("operation '{operation}' uses path variable '{{{parameter}}}' with no matching path parameter")]
  MissingPathParameter {
    operation: String,
    parameter: String,
    path: SourcePath,
  },

  #[error("operation '{operation}' declares response ({status}, {content_type}) more than once")]
  DuplicateResponseVariant {
    operation: String,
    status: String,
    content_type: String,
    path: SourcePath,
  },

  #[error("no free identifier left for base name '{base}'")]
  NameCollisionExhausted { base: String, path: SourcePath },

  #[error("invalid document fragment: {message}")]
  InvalidDocument { message: String, path: SourcePath },
}

impl SpecError {
  pub fn source_path(&self) -> &SourcePath {
    match self {
      Self::UnresolvedReference { declared_at, .. } | Self::CircularAlias { declared_at, .. } => declared_at,
      Self::IncompatibleMerge { path, .. }
      | Self::UnsupportedSchemaShape { path, .. }
      | Self::MissingPathParameter { path, .. }
      | Self::DuplicateResponseVariant { path, .. }
      | Self::NameCollisionExhausted { path, .. }
      | Self::InvalidDocument { path, .. } => path,
    }
  }

  pub(crate) fn unsupported(path: &SourcePath, reason: impl Into<String>) -> Self {
    Self::UnsupportedSchemaShape {
      reason: reason.into(),
      path: path.clone(),
    }
  }

  pub(crate) fn invalid(path: &SourcePath, message: impl Into<String>) -> Self {
    Self::InvalidDocument {
      message: message.into(),
      path: path.clone(),
    }
  }
}

fn cause_suffix(cause: &Option<String>) -> String {
  cause.as_ref().map(|cause| format!(": {cause}")).unwrap_or_default()
}
