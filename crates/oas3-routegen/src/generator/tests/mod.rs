mod path_template;
mod schema_graph;
mod support;
mod type_mapper;
