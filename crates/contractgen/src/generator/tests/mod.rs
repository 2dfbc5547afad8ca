mod normalizer;
mod orchestrator;
mod resolver;

use serde_json::{Value, json};

use crate::{
  generator::{
    config::GeneratorConfig,
    diagnostics::Diagnostics,
    orchestrator::Orchestrator,
    resolver::{ResolvedSpec, resolve},
    schema_graph::{SchemaGraph, SchemaId},
  },
  utils::spec::DocumentSet,
};

fn with_schemas(schemas: Value) -> Value {
  json!({
    "openapi": "3.1.0",
    "info": { "title": "Test", "version": "1.0.0" },
    "components": { "schemas": schemas },
  })
}

fn resolve_document(document: Value) -> (ResolvedSpec, Diagnostics) {
  let documents = DocumentSet::new("api.json", document);
  let mut diagnostics = Diagnostics::new();
  let resolved = resolve(&documents, &mut diagnostics).expect("document resolves");
  (resolved, diagnostics)
}

/// The id of the component schema declared as `name`.
fn named(resolved: &ResolvedSpec, graph: &SchemaGraph, name: &str) -> SchemaId {
  resolved
    .named
    .iter()
    .copied()
    .find(|id| graph.node(*id).name.as_deref() == Some(name))
    .unwrap_or_else(|| panic!("no schema named {name}"))
}

fn orchestrator(document: Value, config: GeneratorConfig) -> Orchestrator {
  Orchestrator::new(DocumentSet::new("api.json", document), config)
}
