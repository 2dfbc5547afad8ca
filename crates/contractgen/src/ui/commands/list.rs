use std::path::Path;

use anyhow::Context;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Row, Table};
use contractgen::{
  generator::{
    config::GeneratorConfig,
    orchestrator::{GenerationFailure, Orchestrator},
  },
  utils::spec::load_documents,
};

use crate::ui::{Colors, colors::IntoComfyColor, term_width};

fn styled_table(colors: &Colors, headers: &[&str]) -> Table {
  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut row = Row::new();
  for header in headers {
    row.add_cell(Cell::new(header).fg(IntoComfyColor::into(colors.label())));
  }
  table.set_header(row);
  table
}

fn report(failure: GenerationFailure) -> anyhow::Error {
  for diagnostic in &failure.diagnostics {
    eprintln!("{diagnostic}");
  }
  anyhow::Error::new(failure)
}

async fn orchestrator(input: &Path) -> anyhow::Result<Orchestrator> {
  let documents = load_documents(input)
    .await
    .with_context(|| format!("Failed to load {}", input.display()))?;
  Ok(Orchestrator::new(documents, GeneratorConfig::default()))
}

pub async fn list_operations(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let mut operations = orchestrator(input).await?.operation_summaries().map_err(report)?;
  operations.sort_by(|a, b| a.stable_id.cmp(&b.stable_id));

  let mut table = styled_table(colors, &["STABLE ID", "METHOD", "PATH", "OPERATION ID"]);
  for operation in operations {
    let mut row = Row::new();
    row.add_cell(
      Cell::new(operation.stable_id)
        .fg(IntoComfyColor::into(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(
      Cell::new(operation.method)
        .fg(IntoComfyColor::into(colors.accent()))
        .set_alignment(CellAlignment::Right),
    );
    row.add_cell(Cell::new(operation.path).fg(IntoComfyColor::into(colors.primary())));
    row.add_cell(Cell::new(operation.operation_id.unwrap_or_default()).fg(IntoComfyColor::into(colors.info())));
    table.add_row(row);
  }

  println!("{table}");
  Ok(())
}

pub async fn list_types(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let output = orchestrator(input).await?.generate().map_err(report)?;

  let mut table = styled_table(colors, &["TYPE", "SHAPE", "SOURCE"]);
  for decl in output.ir.types().iter() {
    let mut row = Row::new();
    row.add_cell(
      Cell::new(&decl.qualified_name)
        .fg(IntoComfyColor::into(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(Cell::new(decl.shape.label()).fg(IntoComfyColor::into(colors.accent())));
    row.add_cell(Cell::new(decl.source_schema_path.as_str()).fg(IntoComfyColor::into(colors.primary())));
    table.add_row(row);
  }

  println!("{table}");
  Ok(())
}
