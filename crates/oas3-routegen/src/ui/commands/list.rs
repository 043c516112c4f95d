use std::path::Path;

use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Row, Table};
use itertools::Itertools;

use crate::{
  generator::document::{Document, Operation, ParameterLocation},
  ui::{Colors, colors::IntoComfyColor, term_width},
  utils::spec::SpecLoader,
};

/// Parameters an operation's route binding passes to the service method,
/// formatted as `name (location)`.
fn bound_parameters<R>(operation: &Operation<R>) -> String {
  operation
    .parameters
    .iter()
    .filter(|parameter| matches!(parameter.location, ParameterLocation::Path | ParameterLocation::Query))
    .map(|parameter| {
      let marker = if parameter.required { "" } else { "?" };
      format!("{}{marker} ({})", parameter.name, parameter.location)
    })
    .join(", ")
}

pub async fn list_operations(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let tree = SpecLoader::open(input).await?.parse()?;
  let document = Document::from_tree(&tree)?;

  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut row = Row::new();
  row.add_cell(Cell::new("OPERATION ID").fg(IntoComfyColor::into(colors.label())));
  row.add_cell(Cell::new("METHOD").fg(IntoComfyColor::into(colors.label())));
  row.add_cell(Cell::new("PATH").fg(IntoComfyColor::into(colors.label())));
  row.add_cell(Cell::new("PARAMETERS").fg(IntoComfyColor::into(colors.label())));
  table.set_header(row);

  for operation in document.operations() {
    let mut row = Row::new();
    row.add_cell(
      Cell::new(&operation.operation_id)
        .fg(IntoComfyColor::into(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(
      Cell::new(operation.method.as_str())
        .fg(IntoComfyColor::into(colors.accent()))
        .set_alignment(CellAlignment::Right),
    );
    row.add_cell(Cell::new(&operation.path).fg(IntoComfyColor::into(colors.primary())));
    row.add_cell(Cell::new(bound_parameters(operation)).fg(IntoComfyColor::into(colors.timestamp())));
    table.add_row(row);
  }

  println!("{table}");

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{fixtures, utils::spec::{SpecFormat, parse_document}};

  #[test]
  fn test_bound_parameters_lists_path_and_query() {
    let tree = parse_document(fixtures::MOTIS.as_bytes(), SpecFormat::Yaml).unwrap();
    let document = Document::from_tree(&tree).unwrap();
    let plan = document.operations().next().unwrap();

    let listed = bound_parameters(plan);
    assert!(listed.starts_with("fromPlace (query), toPlace (query)"));
    assert!(listed.contains("mode? (query)"));
  }
}
