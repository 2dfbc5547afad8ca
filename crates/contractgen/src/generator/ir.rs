//! The finalized intermediate representation handed to renderers.

use anyhow::Context;
use json_canon::to_string as to_canonical_json;
use serde::Serialize;
use serde_json::Value;

use crate::generator::{
  config::GenerationTarget,
  document::RawInfo,
  operations::OperationTable,
  types::TypeTable,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
  pub title: String,
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl From<RawInfo> for ApiInfo {
  fn from(info: RawInfo) -> Self {
    Self {
      title: info.title,
      version: info.version,
      description: info.description,
    }
  }
}

/// Read-only snapshot of one generation run: the type table and the operation
/// table, both in deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ir {
  info: ApiInfo,
  #[serde(skip_serializing_if = "Option::is_none")]
  package: Option<String>,
  target: GenerationTarget,
  types: TypeTable,
  operations: OperationTable,
}

impl Ir {
  pub(crate) fn new(
    info: ApiInfo,
    package: Option<String>,
    target: GenerationTarget,
    types: TypeTable,
    operations: OperationTable,
  ) -> Self {
    Self {
      info,
      package,
      target,
      types,
      operations,
    }
  }

  pub fn info(&self) -> &ApiInfo {
    &self.info
  }

  pub fn package(&self) -> Option<&str> {
    self.package.as_deref()
  }

  pub fn target(&self) -> GenerationTarget {
    self.target
  }

  pub fn types(&self) -> &TypeTable {
    &self.types
  }

  pub fn operations(&self) -> &OperationTable {
    &self.operations
  }

  pub fn to_json(&self) -> anyhow::Result<Value> {
    serde_json::to_value(self).context("Failed to serialize IR")
  }

  /// BLAKE3 hex digest of the RFC 8785 canonical JSON form.
  pub fn fingerprint(&self) -> anyhow::Result<String> {
    let canonical = to_canonical_json(&self.to_json()?).context("Failed to create canonical JSON string")?;
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
  }
}
