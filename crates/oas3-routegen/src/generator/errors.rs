/// Every way a generation run can fail.
///
/// All variants are fatal; a run either produces both artifacts or none.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
  #[error("unresolved schema reference '{reference}' at {location}")]
  UnresolvedReference { reference: String, location: String },

  #[error("cyclic schema reference: {}", .cycle.join(" -> "))]
  CyclicSchema { cycle: Vec<String> },

  #[error("unsupported schema at {location}: {reason}")]
  UnsupportedSchema { location: String, reason: String },

  #[error("parameter '{parameter}' does not match path '{path}': {reason}")]
  ParameterMismatch {
    parameter: String,
    path: String,
    reason: String,
  },

  #[error("duplicate operation id '{operation_id}' used by {first} and {second}")]
  DuplicateOperation {
    operation_id: String,
    first: String,
    second: String,
  },

  #[error("invalid HTTP method '{method}' on path '{path}'")]
  InvalidMethod { method: String, path: String },

  #[error("invalid path template '{path}': {reason}")]
  InvalidTemplate { path: String, reason: String },

  #[error("operation {method} {path} has no operationId")]
  MissingOperationId { method: String, path: String },

  #[error("malformed document at {location}: {reason}")]
  MalformedDocument { location: String, reason: String },
}

impl GeneratorError {
  pub(crate) fn unsupported(location: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::UnsupportedSchema {
      location: location.into(),
      reason: reason.into(),
    }
  }

  pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::MalformedDocument {
      location: location.into(),
      reason: reason.into(),
    }
  }

  pub(crate) fn mismatch(parameter: &str, path: &str, reason: impl Into<String>) -> Self {
    Self::ParameterMismatch {
      parameter: parameter.to_string(),
      path: path.to_string(),
      reason: reason.into(),
    }
  }
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
