//! Rendering strategies. The IR never changes per target; a [`Renderer`] decides
//! what files a run produces from it.

use std::path::PathBuf;

use anyhow::Context;

use crate::generator::ir::Ir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
  /// Path relative to the output directory.
  pub path: PathBuf,
  pub contents: String,
}

pub trait Renderer {
  fn name(&self) -> &'static str;

  fn render(&self, ir: &Ir) -> anyhow::Result<Vec<RenderedFile>>;
}

/// Writes the IR as pretty-printed JSON to `ir.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonIrRenderer;

impl Renderer for JsonIrRenderer {
  fn name(&self) -> &'static str {
    "json"
  }

  fn render(&self, ir: &Ir) -> anyhow::Result<Vec<RenderedFile>> {
    let mut contents = serde_json::to_string_pretty(ir).context("Failed to render IR as JSON")?;
    contents.push('\n');
    Ok(vec![RenderedFile {
      path: PathBuf::from("ir.json"),
      contents,
    }])
  }
}

/// Writes the IR as YAML to `ir.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlIrRenderer;

impl Renderer for YamlIrRenderer {
  fn name(&self) -> &'static str {
    "yaml"
  }

  fn render(&self, ir: &Ir) -> anyhow::Result<Vec<RenderedFile>> {
    let contents = serde_yaml::to_string(ir).context("Failed to render IR as YAML")?;
    Ok(vec![RenderedFile {
      path: PathBuf::from("ir.yaml"),
      contents,
    }])
  }
}
