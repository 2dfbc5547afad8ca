use std::collections::HashSet;

use serde::Serialize;
use strum::Display;

/// Protocol binding recorded for the typed response-wrapper runtime construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "camelCase")]
pub enum GenerationTarget {
  #[default]
  Client,
  Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaScope {
  /// Every component schema becomes a type.
  #[default]
  All,
  /// Only component schemas reachable from the selected operations.
  ReferencedOnly,
}

/// What to do with an undiscriminated union whose object members overlap, i.e.
/// one member's property names are a subset of another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnionOverlapPolicy {
  /// Keep the members as distinct alternatives and warn.
  #[default]
  KeepStructural,
  /// Reject the union as an unsupported shape.
  Reject,
}

/// Filter for including or excluding operations by their stable id.
///
/// Exclusion wins when an id is in both sets.
#[derive(Debug, Clone, Default)]
pub struct OperationFilter {
  only: Option<HashSet<String>>,
  excluded: Option<HashSet<String>>,
}

impl OperationFilter {
  #[must_use]
  pub fn new(only: Option<HashSet<String>>, excluded: Option<HashSet<String>>) -> Self {
    Self { only, excluded }
  }

  #[must_use]
  pub fn accepts<S>(&self, base_id: S) -> bool
  where
    S: AsRef<str>,
  {
    if let Some(ref included) = self.only
      && !included.contains(base_id.as_ref())
    {
      return false;
    }

    if let Some(ref excluded) = self.excluded
      && excluded.contains(base_id.as_ref())
    {
      return false;
    }

    true
  }
}

#[derive(Debug, Clone, Default, bon::Builder)]
pub struct GeneratorConfig {
  #[builder(default)]
  pub target: GenerationTarget,
  /// Package or namespace the renderer places the generated artifacts in.
  pub package: Option<String>,
  #[builder(default)]
  pub schema_scope: SchemaScope,
  #[builder(default)]
  pub union_overlap: UnionOverlapPolicy,
  #[builder(default)]
  pub filter: OperationFilter,
}
