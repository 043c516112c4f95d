use http::Method;
use percent_encoding::percent_decode_str;

use crate::{PLACEHOLDER_MARKER, ParamError, Request, Router};

type Handler<Reply> = Box<dyn Fn(&RouteRequest) -> Result<Reply, ParamError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
  Literal(String),
  /// `:name` followed by literal text, as in `:name.json`.
  Capture { name: String, suffix: String },
}

impl PatternSegment {
  fn parse_all(pattern: &str) -> Vec<Self> {
    pattern.split('/').map(Self::parse).collect()
  }

  /// A capture name runs up to the first character that cannot appear in an
  /// identifier; the rest of the segment must match literally.
  fn parse(segment: &str) -> Self {
    let Some(rest) = segment.strip_prefix(PLACEHOLDER_MARKER) else {
      return Self::Literal(segment.to_string());
    };
    let end = rest
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
      .unwrap_or(rest.len());
    if end == 0 {
      return Self::Literal(segment.to_string());
    }

    let (name, suffix) = rest.split_at(end);
    Self::Capture {
      name: name.to_string(),
      suffix: suffix.to_string(),
    }
  }
}

struct Route<Reply> {
  method: Method,
  pattern: String,
  segments: Vec<PatternSegment>,
  handler: Handler<Reply>,
}

impl<Reply> Route<Reply> {
  fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
    let parts = path.split('/').collect::<Vec<_>>();
    if parts.len() != self.segments.len() {
      return None;
    }

    let mut captures = vec![];
    for (segment, part) in self.segments.iter().zip(parts) {
      match segment {
        PatternSegment::Literal(literal) if literal == part => {}
        PatternSegment::Literal(_) => return None,
        PatternSegment::Capture { name, suffix } => match part.strip_suffix(suffix.as_str()) {
          Some(value) if !value.is_empty() => captures.push((name.clone(), decode(value))),
          _ => return None,
        },
      }
    }
    Some(captures)
  }
}

fn decode(raw: &str) -> String {
  percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Decodes a form-encoded query component, where `+` stands for a space.
fn decode_query(raw: &str) -> String {
  decode(&raw.replace('+', " "))
}

/// Parameters of a request matched by a [`RouteTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequest {
  captures: Vec<(String, String)>,
  query: Vec<(String, String)>,
}

impl RouteRequest {
  fn new(captures: Vec<(String, String)>, query: Option<&str>) -> Self {
    let query = query
      .into_iter()
      .flat_map(|query| query.split('&'))
      .filter(|pair| !pair.is_empty())
      .map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_query(key), decode_query(value))
      })
      .collect();
    Self { captures, query }
  }
}

impl Request for RouteRequest {
  fn path_parameter(&self, name: &str) -> Option<&str> {
    self
      .captures
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  fn query_parameter(&self, name: &str) -> Option<&str> {
    self
      .query
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  fn query_parameters(&self, name: &str) -> Vec<&str> {
    self
      .query
      .iter()
      .filter(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
      .collect()
  }
}

/// Minimal router matching `:name` placeholders segment by segment.
///
/// Routes are tried in registration order; the first whose method and pattern
/// match handles the request.
pub struct RouteTable<Reply> {
  routes: Vec<Route<Reply>>,
}

impl<Reply> Default for RouteTable<Reply> {
  fn default() -> Self {
    Self { routes: vec![] }
  }
}

impl<Reply> RouteTable<Reply> {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.routes.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.routes.is_empty()
  }

  /// Registered `(method, pattern)` pairs in registration order.
  pub fn patterns(&self) -> impl Iterator<Item = (&Method, &str)> {
    self.routes.iter().map(|route| (&route.method, route.pattern.as_str()))
  }

  /// Dispatches `target` (path plus optional query string).
  ///
  /// Returns `None` when no route matches.
  pub fn dispatch(&self, method: &Method, target: &str) -> Option<Result<Reply, ParamError>> {
    let (path, query) = match target.split_once('?') {
      Some((path, query)) => (path, Some(query)),
      None => (target, None),
    };

    self
      .routes
      .iter()
      .filter(|route| route.method == *method)
      .find_map(|route| route.captures(path).map(|captures| (route, captures)))
      .map(|(route, captures)| (route.handler)(&RouteRequest::new(captures, query)))
  }
}

impl<Reply: 'static> Router for RouteTable<Reply> {
  type Request = RouteRequest;
  type Reply = Reply;

  fn register<H>(&mut self, method: Method, pattern: &str, handler: H)
  where
    H: Fn(&RouteRequest) -> Result<Reply, ParamError> + Send + Sync + 'static,
  {
    self.routes.push(Route {
      method,
      pattern: pattern.to_string(),
      segments: PatternSegment::parse_all(pattern),
      handler: Box::new(handler),
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{parse, parse_array_optional, parse_or, split};

  fn table() -> RouteTable<String> {
    let mut table = RouteTable::new();
    table.register(Method::GET, "/api/v1/items/:id", |req: &RouteRequest| {
      let id: i64 = parse(req.path_parameter("id"), "id")?;
      Ok(format!("item {id}"))
    });
    table.register(Method::GET, "/api/v1/plan", |req: &RouteRequest| {
      let from: String = parse(req.query_parameter("fromPlace"), "fromPlace")?;
      let modes: Option<Vec<String>> = parse_array_optional(split(req.query_parameter("mode"), ','), "mode")?;
      let window: i64 = parse_or(req.query_parameter("searchWindow"), "searchWindow", || 7200)?;
      Ok(format!("{from} {modes:?} {window}"))
    });
    table
  }

  #[test]
  fn dispatches_path_captures() {
    let reply = table().dispatch(&Method::GET, "/api/v1/items/42").unwrap().unwrap();
    assert_eq!(reply, "item 42");
  }

  #[test]
  fn decodes_captures_and_query_values() {
    let reply = table()
      .dispatch(&Method::GET, "/api/v1/plan?fromPlace=a%20b&mode=WALK,BUS")
      .unwrap()
      .unwrap();
    assert_eq!(reply, r#"a b Some(["WALK", "BUS"]) 7200"#);
  }

  #[test]
  fn missing_required_query_parameter_is_reported() {
    let err = table().dispatch(&Method::GET, "/api/v1/plan").unwrap().unwrap_err();
    assert_eq!(err, ParamError::Missing {
      name: "fromPlace".to_string()
    });
  }

  #[test]
  fn unmatched_routes_return_none() {
    let table = table();
    assert!(table.dispatch(&Method::POST, "/api/v1/plan").is_none());
    assert!(table.dispatch(&Method::GET, "/api/v1/items").is_none());
    assert!(table.dispatch(&Method::GET, "/api/v1/items/").is_none());
    assert!(table.dispatch(&Method::GET, "/api/v2/plan").is_none());
  }

  #[test]
  fn repeated_query_values_are_collected() {
    let request = RouteRequest::new(vec![], Some("mode=WALK&mode=BUS&other=1"));
    assert_eq!(request.query_parameters("mode"), vec!["WALK", "BUS"]);
    assert_eq!(request.query_parameter("mode"), Some("WALK"));
    assert_eq!(request.query_parameter("missing"), None);
  }

  #[test]
  fn patterns_keep_registration_order() {
    let table = table();
    let patterns = table.patterns().map(|(_, pattern)| pattern).collect::<Vec<_>>();
    assert_eq!(patterns, vec!["/api/v1/items/:id", "/api/v1/plan"]);
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn captures_stop_at_non_identifier_characters() {
    let mut table = RouteTable::new();
    table.register(Method::GET, "/files/:name.json", |req: &RouteRequest| {
      parse::<String>(req.path_parameter("name"), "name")
    });

    let reply = table.dispatch(&Method::GET, "/files/report.json").unwrap().unwrap();
    assert_eq!(reply, "report");
    assert!(table.dispatch(&Method::GET, "/files/report.xml").is_none());
    assert!(table.dispatch(&Method::GET, "/files/.json").is_none());
  }

  #[test]
  fn segment_patterns() {
    assert_eq!(PatternSegment::parse(":id"), PatternSegment::Capture {
      name: "id".to_string(),
      suffix: String::new(),
    });
    assert_eq!(PatternSegment::parse(":file_id.tar.gz"), PatternSegment::Capture {
      name: "file_id".to_string(),
      suffix: ".tar.gz".to_string(),
    });
    assert_eq!(PatternSegment::parse(":.json"), PatternSegment::Literal(":.json".to_string()));
    assert_eq!(PatternSegment::parse("items"), PatternSegment::Literal("items".to_string()));
  }

  #[test]
  fn plus_in_query_decodes_to_space() {
    let request = RouteRequest::new(vec![], Some("from+place=Central+Station&sign=a%2Bb"));
    assert_eq!(request.query_parameter("from place"), Some("Central Station"));
    assert_eq!(request.query_parameter("sign"), Some("a+b"));
  }

  #[test]
  fn plus_in_path_capture_is_kept() {
    let reply = table().dispatch(&Method::GET, "/api/v1/items/+1");
    assert!(matches!(reply, Some(Ok(ref text)) if text == "item 1"), "{reply:?}");
  }
}
