pub(crate) mod catalog;
pub(crate) mod codegen;
pub(crate) mod context;
pub(crate) mod descriptor;
pub(crate) mod document;
pub(crate) mod errors;
pub(crate) mod metrics;
pub(crate) mod naming;
pub(crate) mod operation_registry;
pub mod orchestrator;
pub(crate) mod path_template;
pub(crate) mod schema_graph;
pub(crate) mod type_mapper;

#[cfg(test)]
mod tests;
