use std::collections::HashMap;

use indexmap::IndexMap;

use super::{
  document::Operation,
  errors::{GeneratorError, GeneratorResult},
  naming::identifiers::to_rust_field_name,
};

/// Tracks the operation ids claimed during one run.
///
/// Ids must be unique as written and also after conversion to the service
/// method name, since both select the handler.
#[derive(Debug, Default)]
pub struct OperationRegistry {
  routes: IndexMap<String, String>,
  methods: HashMap<String, String>,
}

impl OperationRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<R>(&mut self, operation: &Operation<R>) -> GeneratorResult<()> {
    let id = &operation.operation_id;
    let route = operation.route_label();

    if let Some(first) = self.routes.get(id) {
      return Err(GeneratorError::DuplicateOperation {
        operation_id: id.clone(),
        first: first.clone(),
        second: route,
      });
    }

    let method = to_rust_field_name(id);
    if let Some(other) = self.methods.get(&method) {
      return Err(GeneratorError::DuplicateOperation {
        operation_id: id.clone(),
        first: format!("{} (`{other}`)", self.routes[other]),
        second: route,
      });
    }

    self.methods.insert(method, id.clone());
    self.routes.insert(id.clone(), route);
    Ok(())
  }
}
