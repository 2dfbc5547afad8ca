use crate::generator::{
  ir::Ir,
  operations::OperationDecl,
  types::{TypeDecl, TypeShape},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationStats {
  pub types_generated: usize,
  pub objects_generated: usize,
  pub enums_generated: usize,
  pub unions_generated: usize,
  pub arrays_generated: usize,
  pub aliases_generated: usize,
  pub operations_converted: usize,
  pub parameters_converted: usize,
  pub request_body_variants: usize,
  pub response_variants: usize,
  pub back_references: usize,
  pub cycles_detected: usize,
  pub cycle_details: Vec<Vec<String>>,
  pub warnings_recorded: usize,
}

impl GenerationStats {
  pub fn from_ir(ir: &Ir) -> Self {
    let mut stats = Self::default();
    for decl in ir.types().iter() {
      stats.record_type(decl);
    }
    for operation in ir.operations().iter() {
      stats.record_operation(operation);
    }
    stats
  }

  pub fn record_type(&mut self, decl: &TypeDecl) {
    self.types_generated += 1;
    match &decl.shape {
      TypeShape::Object { fields, .. } => {
        self.objects_generated += 1;
        self.back_references += fields.iter().filter(|field| field.back_reference).count();
      }
      TypeShape::Enum { .. } => self.enums_generated += 1,
      TypeShape::Union { .. } => self.unions_generated += 1,
      TypeShape::Array { .. } => self.arrays_generated += 1,
      TypeShape::Alias { .. } => self.aliases_generated += 1,
    }
  }

  pub fn record_operation(&mut self, operation: &OperationDecl) {
    self.operations_converted += 1;
    self.parameters_converted += operation.parameters.len();
    self.request_body_variants += operation.request_body_variants.len();
    self.response_variants += operation.response_variants.len();
  }

  pub fn record_cycle(&mut self, cycle: Vec<String>) {
    self.cycles_detected += 1;
    self.cycle_details.push(cycle);
  }

  pub fn record_cycles(&mut self, cycles: Vec<Vec<String>>) {
    for cycle in cycles {
      self.record_cycle(cycle);
    }
  }

  pub fn record_warnings(&mut self, count: usize) {
    self.warnings_recorded += count;
  }
}
