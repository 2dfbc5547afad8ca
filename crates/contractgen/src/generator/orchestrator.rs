//! Runs the four pipeline stages in order over a loaded document set.
//!
//! Every stage ends at a diagnostics checkpoint: warnings let the run continue,
//! any error stops it before the stage output is handed on, and the failure
//! carries every record collected up to that point.

use thiserror::Error;

use crate::{
  generator::{
    config::{GeneratorConfig, SchemaScope},
    context::BuildContext,
    diagnostics::{Diagnostic, Severity, Stage},
    ir::Ir,
    metrics::GenerationStats,
    naming::operations::compute_stable_id,
    normalizer::normalize,
    operations::{OperationModelBuilder, OperationTable},
    resolver::{OperationSkeleton, ResolvedSpec, resolve},
    schema_graph::{SchemaGraph, SchemaId},
    types::TypeModelBuilder,
  },
  utils::spec::DocumentSet,
};

#[derive(Debug, Clone)]
pub struct GeneratedOutput {
  pub ir: Ir,
  pub stats: GenerationStats,
  pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Error)]
#[error("generation stopped in the {stage} stage")]
pub struct GenerationFailure {
  pub stage: Stage,
  pub diagnostics: Vec<Diagnostic>,
}

impl GenerationFailure {
  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
  }
}

/// One selectable operation as `list operations` shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSummary {
  pub stable_id: String,
  pub method: String,
  pub path: String,
  pub operation_id: Option<String>,
}

pub struct Orchestrator {
  documents: DocumentSet,
  config: GeneratorConfig,
}

impl Orchestrator {
  pub fn new(documents: DocumentSet, config: GeneratorConfig) -> Self {
    Self { documents, config }
  }

  pub fn config(&self) -> &GeneratorConfig {
    &self.config
  }

  /// Every operation of the document with its derived id, filter not applied.
  pub fn operation_summaries(&self) -> Result<Vec<OperationSummary>, GenerationFailure> {
    let mut ctx = BuildContext::new();
    let resolved = self.resolve(&mut ctx)?;
    Ok(
      resolved
        .operations
        .iter()
        .map(|operation| OperationSummary {
          stable_id: stable_id(operation),
          method: operation.method.to_string(),
          path: operation.path.clone(),
          operation_id: operation.operation_id.clone(),
        })
        .collect(),
    )
  }

  pub fn generate(&self) -> Result<GeneratedOutput, GenerationFailure> {
    let mut ctx = BuildContext::new();
    let resolved = self.resolve(&mut ctx)?;

    ctx.diagnostics.enter(Stage::Normalize);
    let graph = normalize(&resolved.graph, &mut ctx.diagnostics);
    checkpoint(&ctx, Stage::Normalize)?;

    let operations: Vec<OperationSkeleton> = resolved
      .operations
      .iter()
      .filter(|operation| self.config.filter.accepts(stable_id(operation)))
      .cloned()
      .collect();
    let roots = self.type_roots(&resolved, &graph, &operations);

    ctx.diagnostics.enter(Stage::TypeModel);
    let mut types = TypeModelBuilder::new(&graph, self.config.union_overlap);
    if let Err(err) = types.build_named(&roots, &mut ctx) {
      ctx.diagnostics.error(&err);
    }
    checkpoint(&ctx, Stage::TypeModel)?;

    ctx.diagnostics.enter(Stage::OperationModel);
    let built = OperationModelBuilder::new(&mut types, self.config.target).build(&operations, &mut ctx);
    let built = match built {
      Ok(built) => built,
      Err(err) => {
        ctx.diagnostics.error(&err);
        vec![]
      }
    };
    checkpoint(&ctx, Stage::OperationModel)?;

    let type_table = types.finish();
    let operation_table = OperationTable::new(built, &type_table);
    let ir = Ir::new(
      resolved.info.into(),
      self.config.package.clone(),
      self.config.target,
      type_table,
      operation_table,
    );

    let warnings: Vec<Diagnostic> = ctx.diagnostics.warnings().cloned().collect();
    let mut stats = GenerationStats::from_ir(&ir);
    stats.record_cycles(cycle_names(&graph));
    stats.record_warnings(warnings.len());

    Ok(GeneratedOutput { ir, stats, warnings })
  }

  fn resolve(&self, ctx: &mut BuildContext) -> Result<ResolvedSpec, GenerationFailure> {
    ctx.diagnostics.enter(Stage::Resolve);
    match resolve(&self.documents, &mut ctx.diagnostics) {
      Ok(resolved) => {
        checkpoint(ctx, Stage::Resolve)?;
        Ok(resolved)
      }
      Err(err) => {
        ctx.diagnostics.error(&err);
        Err(failure(ctx, Stage::Resolve))
      }
    }
  }

  /// Component schemas that become declarations, in declaration order.
  fn type_roots(&self, resolved: &ResolvedSpec, graph: &SchemaGraph, operations: &[OperationSkeleton]) -> Vec<SchemaId> {
    match self.config.schema_scope {
      SchemaScope::All => resolved.named.clone(),
      SchemaScope::ReferencedOnly => {
        let reachable = graph.reachable_from(operations.iter().flat_map(OperationSkeleton::schemas));
        resolved
          .named
          .iter()
          .copied()
          .filter(|id| reachable.contains(id))
          .collect()
      }
    }
  }
}

fn stable_id(operation: &OperationSkeleton) -> String {
  compute_stable_id(
    operation.method.as_str(),
    operation.path.as_str(),
    operation.operation_id.as_deref(),
  )
}

fn checkpoint(ctx: &BuildContext, stage: Stage) -> Result<(), GenerationFailure> {
  if ctx.diagnostics.stage_failed(stage) {
    return Err(failure(ctx, stage));
  }
  Ok(())
}

fn failure(ctx: &BuildContext, stage: Stage) -> GenerationFailure {
  GenerationFailure {
    stage,
    diagnostics: ctx.diagnostics.records().to_vec(),
  }
}

fn cycle_names(graph: &SchemaGraph) -> Vec<Vec<String>> {
  graph
    .detect_cycles()
    .into_iter()
    .map(|cycle| {
      cycle
        .into_iter()
        .map(|id| {
          let node = graph.node(id);
          node.name.clone().unwrap_or_else(|| node.location.to_string())
        })
        .collect()
    })
    .collect()
}
