mod request_bodies;
mod responses;

use serde_json::{Value, json};

use crate::{
  generator::{
    config::{GenerationTarget, UnionOverlapPolicy},
    context::BuildContext,
    diagnostics::Diagnostics,
    normalizer::normalize,
    operations::{OperationModelBuilder, OperationTable},
    resolver::resolve,
    types::{TypeModelBuilder, TypeTable},
  },
  utils::spec::DocumentSet,
};

struct Built {
  operations: OperationTable,
  types: TypeTable,
  diagnostics: Diagnostics,
}

/// A document with a `Pet` component and the given `paths`.
fn document(paths: Value) -> Value {
  json!({
    "openapi": "3.1.0",
    "info": { "title": "Pets", "version": "1.0.0" },
    "paths": paths,
    "components": {
      "schemas": {
        "Pet": {
          "type": "object",
          "required": ["name"],
          "properties": {
            "name": { "type": "string" },
            "born": { "type": "string", "format": "date" },
          },
        },
      },
    },
  })
}

fn build_operations(paths: Value, target: GenerationTarget) -> Built {
  let documents = DocumentSet::new("api.json", document(paths));
  let mut ctx = BuildContext::new();
  let resolved = resolve(&documents, &mut ctx.diagnostics).expect("document resolves");
  let graph = normalize(&resolved.graph, &mut ctx.diagnostics);

  let mut types = TypeModelBuilder::new(&graph, UnionOverlapPolicy::default());
  types.build_named(&resolved.named, &mut ctx).expect("names are available");
  let built = OperationModelBuilder::new(&mut types, target)
    .build(&resolved.operations, &mut ctx)
    .expect("names are available");

  let types = types.finish();
  Built {
    operations: OperationTable::new(built, &types),
    types,
    diagnostics: ctx.diagnostics,
  }
}
