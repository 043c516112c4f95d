use indexmap::IndexMap;

use super::{
  descriptor::TypeDescriptor, errors::GeneratorResult, operation_registry::OperationRegistry,
  schema_graph::ResolvedOperation,
};

/// State scoped to a single generation run.
#[derive(Debug, Default)]
pub struct RunContext {
  operations: OperationRegistry,
  type_names: IndexMap<String, TypeDescriptor>,
}

impl RunContext {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_operations(&mut self, operations: &[ResolvedOperation]) -> GeneratorResult<()> {
    operations
      .iter()
      .try_for_each(|operation| self.operations.register(operation))
  }

  /// Claims `(name, shape)` pairs together.
  ///
  /// A name already claimed by an equal shape is shared. On conflict nothing
  /// is claimed and the contested name is returned.
  pub fn claim_types(&mut self, declarations: Vec<(String, TypeDescriptor)>) -> Result<(), String> {
    let mut pending: IndexMap<String, TypeDescriptor> = IndexMap::new();

    for (name, shape) in declarations {
      let existing = self.type_names.get(&name).or_else(|| pending.get(&name));
      match existing {
        Some(claimed) if *claimed != shape => return Err(name),
        Some(_) => {}
        None => {
          pending.insert(name, shape);
        }
      }
    }

    self.type_names.extend(pending);
    Ok(())
  }

  #[cfg(test)]
  pub fn type_names(&self) -> impl Iterator<Item = &str> {
    self.type_names.keys().map(String::as_str)
  }
}
