mod runtime;

use serde_json::Value;

use crate::{
  generator::{
    config::UnionOverlapPolicy,
    context::BuildContext,
    diagnostics::Diagnostics,
    normalizer::normalize,
    resolver::resolve,
    types::{TypeModelBuilder, TypeTable},
  },
  utils::spec::DocumentSet,
};

/// Resolves, normalizes and declares every component schema of `document`.
fn build_types(document: Value, policy: UnionOverlapPolicy) -> (TypeTable, Diagnostics) {
  let documents = DocumentSet::new("api.json", document);
  let mut ctx = BuildContext::new();
  let resolved = resolve(&documents, &mut ctx.diagnostics).expect("document resolves");
  let graph = normalize(&resolved.graph, &mut ctx.diagnostics);

  let mut builder = TypeModelBuilder::new(&graph, policy);
  builder.build_named(&resolved.named, &mut ctx).expect("names are available");
  (builder.finish(), ctx.diagnostics)
}
