//! Runtime support for route bindings produced by `oas3-routegen`.
//!
//! Generated `register` functions are written against the [`Router`] and
//! [`Request`] traits and convert raw parameter strings with the parse
//! primitives exported here. [`RouteTable`] is a small in-memory router that
//! implements both sides of the contract.

mod params;
mod route_table;

pub use http::Method;
pub use params::{ParamError, parse, parse_array, parse_array_optional, parse_each, parse_optional, parse_or, repeated, split};
pub use route_table::{RouteRequest, RouteTable};

/// Marker that introduces a named capture in a route pattern (`/items/:id`).
pub const PLACEHOLDER_MARKER: char = ':';

/// Read access to the raw parameters of an incoming request.
pub trait Request {
  /// Value captured by the `:name` placeholder of the matched pattern.
  fn path_parameter(&self, name: &str) -> Option<&str>;

  /// First value of the query parameter `name`, if present.
  fn query_parameter(&self, name: &str) -> Option<&str>;

  /// Every value of a repeated query parameter (`?mode=WALK&mode=BUS`).
  fn query_parameters(&self, name: &str) -> Vec<&str> {
    self.query_parameter(name).into_iter().collect()
  }
}

/// Registration surface the generated bindings plug into.
pub trait Router {
  type Request: Request;
  type Reply;

  fn register<H>(&mut self, method: Method, pattern: &str, handler: H)
  where
    H: Fn(&Self::Request) -> Result<Self::Reply, ParamError> + Send + Sync + 'static;
}
