use std::collections::BTreeSet;

use crate::generator::{
  diagnostics::SourcePath,
  errors::SpecError,
  naming::identifiers::{ensure_unique, to_field_name, to_type_name},
};

/// A flat set of claimed identifiers.
///
/// One namespace is shared by every type and operation of a generation run and is
/// passed explicitly through the builders; short-lived namespaces scope the fields
/// of one type or the parameters of one operation. First claim wins the bare name,
/// later claims of the same base get the smallest free numeral from 2 upward.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
  claimed: BTreeSet<String>,
}

impl Namespace {
  pub fn new() -> Self {
    Self::default()
  }

  /// Claims a `PascalCase` identifier derived from `base`.
  pub fn claim_type(&mut self, base: &str, at: &SourcePath) -> Result<String, SpecError> {
    self.claim(&to_type_name(base), "", at)
  }

  /// Claims a `snake_case` identifier derived from `base`.
  pub fn claim_member(&mut self, base: &str, at: &SourcePath) -> Result<String, SpecError> {
    self.claim(&to_field_name(base), "_", at)
  }

  /// Claims `ident` as given, suffixing on collision.
  pub fn claim(&mut self, ident: &str, separator: &str, at: &SourcePath) -> Result<String, SpecError> {
    let unique = ensure_unique(ident, separator, &self.claimed).ok_or_else(|| SpecError::NameCollisionExhausted {
      base: ident.to_string(),
      path: at.clone(),
    })?;
    self.claimed.insert(unique.clone());
    Ok(unique)
  }

  pub fn contains(&self, ident: &str) -> bool {
    self.claimed.contains(ident)
  }

  pub fn len(&self) -> usize {
    self.claimed.len()
  }

  pub fn is_empty(&self) -> bool {
    self.claimed.is_empty()
  }
}
