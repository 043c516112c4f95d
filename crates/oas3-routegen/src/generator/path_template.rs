use oas3_routegen_support::PLACEHOLDER_MARKER;
use strum::Display;

use super::{
  document::{Parameter, ParameterLocation},
  errors::{GeneratorError, GeneratorResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TemplateParseError {
  #[strum(to_string = "unclosed '{{' at position {position} in segment '{segment}'")]
  UnclosedBrace { segment: String, position: usize },
  #[strum(to_string = "empty parameter '{{}}' in segment '{segment}'")]
  EmptyParameter { segment: String },
  #[strum(to_string = "unmatched '}}' at position {position} in segment '{segment}'")]
  UnmatchedClosingBrace { segment: String, position: usize },
  #[strum(to_string = "nested '{{' at position {position} in segment '{segment}'")]
  NestedBraces { segment: String, position: usize },
}

impl std::error::Error for TemplateParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmentPart<'a> {
  Literal(&'a str),
  Param(&'a str),
}

/// A path template validated against its operation's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
  pub template: String,
  /// Router pattern, `{name}` rewritten to `:name`.
  pub rewritten: String,
  /// Placeholder names, left to right.
  pub ordered_params: Vec<String>,
}

pub fn compile_path<R>(template: &str, parameters: &[Parameter<R>]) -> GeneratorResult<CompiledPath> {
  let mut ordered_params: Vec<String> = vec![];
  let mut rewritten_segments = vec![];

  for segment in template.split('/') {
    let parts = tokenize(segment).map_err(|error| GeneratorError::InvalidTemplate {
      path: template.to_string(),
      reason: error.to_string(),
    })?;

    let mut rewritten = String::with_capacity(segment.len());
    for part in parts {
      match part {
        SegmentPart::Literal(text) => rewritten.push_str(text),
        SegmentPart::Param(name) => {
          if ordered_params.iter().any(|seen| seen == name) {
            return Err(GeneratorError::mismatch(
              name,
              template,
              "placeholder appears more than once",
            ));
          }
          rewritten.push(PLACEHOLDER_MARKER);
          rewritten.push_str(name);
          ordered_params.push(name.to_string());
        }
      }
    }
    rewritten_segments.push(rewritten);
  }

  validate(template, &ordered_params, parameters)?;

  Ok(CompiledPath {
    template: template.to_string(),
    rewritten: rewritten_segments.join("/"),
    ordered_params,
  })
}

fn validate<R>(template: &str, placeholders: &[String], parameters: &[Parameter<R>]) -> GeneratorResult<()> {
  for name in placeholders {
    let declared = parameters.iter().find(|parameter| {
      parameter.name == *name && parameter.location == ParameterLocation::Path
    });
    match declared {
      None => {
        let reason = match parameters.iter().find(|parameter| parameter.name == *name) {
          Some(other) => format!("placeholder is declared in {}, not in path", other.location),
          None => "placeholder has no path parameter".to_string(),
        };
        return Err(GeneratorError::mismatch(name, template, reason));
      }
      Some(parameter) if !parameter.required => {
        return Err(GeneratorError::mismatch(
          name,
          template,
          "path parameters must be required",
        ));
      }
      Some(_) => {}
    }
  }

  if let Some(unused) = parameters.iter().find(|parameter| {
    parameter.location == ParameterLocation::Path && !placeholders.contains(&parameter.name)
  }) {
    return Err(GeneratorError::mismatch(
      &unused.name,
      template,
      "path parameter is not referenced by the template",
    ));
  }

  Ok(())
}

fn tokenize(segment: &str) -> Result<Vec<SegmentPart<'_>>, TemplateParseError> {
  let mut parts = vec![];
  let mut rest = segment;
  let mut offset = 0;

  while let Some(open_pos) = rest.find('{') {
    if let Some(stray_close) = rest[..open_pos].find('}') {
      return Err(TemplateParseError::UnmatchedClosingBrace {
        segment: segment.to_string(),
        position: offset + stray_close,
      });
    }

    if open_pos > 0 {
      parts.push(SegmentPart::Literal(&rest[..open_pos]));
    }

    let after_open = &rest[open_pos + 1..];
    let Some(close_pos) = after_open.find('}') else {
      return Err(TemplateParseError::UnclosedBrace {
        segment: segment.to_string(),
        position: offset + open_pos,
      });
    };

    if let Some(nested) = after_open[..close_pos].find('{') {
      return Err(TemplateParseError::NestedBraces {
        segment: segment.to_string(),
        position: offset + open_pos + 1 + nested,
      });
    }

    let name = &after_open[..close_pos];
    if name.is_empty() {
      return Err(TemplateParseError::EmptyParameter {
        segment: segment.to_string(),
      });
    }
    parts.push(SegmentPart::Param(name));

    let consumed = open_pos + 1 + close_pos + 1;
    offset += consumed;
    rest = &rest[consumed..];
  }

  if let Some(stray_close) = rest.find('}') {
    return Err(TemplateParseError::UnmatchedClosingBrace {
      segment: segment.to_string(),
      position: offset + stray_close,
    });
  }
  if !rest.is_empty() {
    parts.push(SegmentPart::Literal(rest));
  }

  Ok(parts)
}
