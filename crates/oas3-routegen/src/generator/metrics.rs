use super::codegen::types::TypeCounts;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationStats {
  pub schemas: usize,
  pub types_generated: usize,
  pub structs_generated: usize,
  pub enums_generated: usize,
  pub type_aliases_generated: usize,
  pub operations_bound: usize,
  pub parameters_bound: usize,
  pub cycles_detected: usize,
  pub cycle_details: Vec<Vec<String>>,
}

impl GenerationStats {
  pub fn record_types(&mut self, counts: TypeCounts) {
    self.structs_generated += counts.records;
    self.enums_generated += counts.enums;
    self.type_aliases_generated += counts.aliases;
    self.types_generated += counts.records + counts.enums + counts.aliases;
  }

  pub fn record_bindings(&mut self, operations: usize, parameters: usize) {
    self.operations_bound += operations;
    self.parameters_bound += parameters;
  }

  pub fn record_cycles(&mut self, cycles: &[Vec<String>]) {
    self.cycles_detected += cycles.len();
    self.cycle_details.extend(cycles.iter().cloned());
  }
}
