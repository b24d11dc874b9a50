//! Handler invocation and response shaping.
//!
//! The router never looks inside a handler. A [`HandlerInvoker`] receives the
//! matched route and calls whatever the handler refers to with the named
//! arguments extracted by dispatch; [`RouteResponseParser`] turns the result
//! into a transport-neutral [`HandlerResponse`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{Result, RoutingError};
use crate::params::Params;
use crate::route::Route;

/// Maximum inline response headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 4;

/// Stack-allocated header storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Callable handler: named arguments in, result out.
pub type HandlerFn = Arc<dyn Fn(&Params) -> RouteResponse + Send + Sync>;

/// What a route dispatches to.
#[derive(Clone)]
pub enum Handler {
    Closure(HandlerFn),
    /// Controller and action, resolved by the invoker. `extras` are literal
    /// arguments merged over the extracted request parameters.
    Action {
        controller: String,
        action: String,
        extras: Params,
    },
    /// Handler registered with the invoker under a name.
    Named(String),
}

impl Handler {
    pub fn closure<F>(handler: F) -> Self
    where
        F: Fn(&Params) -> RouteResponse + Send + Sync + 'static,
    {
        Handler::Closure(Arc::new(handler))
    }

    #[must_use]
    pub fn action(controller: &str, action: &str) -> Self {
        Handler::Action {
            controller: controller.to_owned(),
            action: action.to_owned(),
            extras: Params::new(),
        }
    }

    #[must_use]
    pub fn action_with(controller: &str, action: &str, extras: Params) -> Self {
        Handler::Action {
            controller: controller.to_owned(),
            action: action.to_owned(),
            extras,
        }
    }

    #[must_use]
    pub fn named(name: &str) -> Self {
        Handler::Named(name.to_owned())
    }

    /// Registry key: `Controller@action`, the handler name, or `None` for closures.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Handler::Closure(_) => None,
            Handler::Action {
                controller, action, ..
            } => Some(action_key(controller, action)),
            Handler::Named(name) => Some(name.clone()),
        }
    }
}

fn action_key(controller: &str, action: &str) -> String {
    format!("{controller}@{action}")
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Closure(_) => f.write_str("Closure"),
            Handler::Action {
                controller,
                action,
                extras,
            } => f
                .debug_struct("Action")
                .field("controller", controller)
                .field("action", action)
                .field("extras", extras)
                .finish(),
            Handler::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<&str> for Handler {
    fn from(name: &str) -> Self {
        Handler::named(name)
    }
}

impl From<String> for Handler {
    fn from(name: String) -> Self {
        Handler::Named(name)
    }
}

impl From<(&str, &str)> for Handler {
    fn from((controller, action): (&str, &str)) -> Self {
        Handler::action(controller, action)
    }
}

impl From<HandlerFn> for Handler {
    fn from(handler: HandlerFn) -> Self {
        Handler::Closure(handler)
    }
}

/// Result of calling a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResponse {
    Text(String),
    Json(Value),
    /// No result.
    Empty,
}

impl RouteResponse {
    /// Serialize structured data as a JSON result.
    pub fn json<T: Serialize>(data: &T) -> Self {
        serde_json::to_value(data).map_or(RouteResponse::Empty, RouteResponse::Json)
    }
}

impl From<&str> for RouteResponse {
    fn from(text: &str) -> Self {
        RouteResponse::Text(text.to_owned())
    }
}

impl From<String> for RouteResponse {
    fn from(text: String) -> Self {
        RouteResponse::Text(text)
    }
}

impl From<Value> for RouteResponse {
    fn from(value: Value) -> Self {
        RouteResponse::Json(value)
    }
}

impl<T: Into<RouteResponse>> From<Option<T>> for RouteResponse {
    fn from(value: Option<T>) -> Self {
        value.map_or(RouteResponse::Empty, Into::into)
    }
}

/// Calls the handler of a matched route.
pub trait HandlerInvoker {
    fn invoke(&self, route: &Route) -> Result<RouteResponse>;
}

/// Default invoker backed by a registry of callables.
///
/// Closures are called directly; action and named handlers are looked up by
/// [`Handler::key`].
#[derive(Default, Clone)]
pub struct RouteHandler {
    handlers: HashMap<String, HandlerFn>,
}

impl RouteHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callable for a named handler.
    pub fn register_handler<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&Params) -> RouteResponse + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_owned(), Arc::new(handler));
        self
    }

    /// Register a callable for a controller action.
    pub fn register_action<F>(&mut self, controller: &str, action: &str, handler: F) -> &mut Self
    where
        F: Fn(&Params) -> RouteResponse + Send + Sync + 'static,
    {
        self.handlers
            .insert(action_key(controller, action), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn has_handler(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Named arguments for a route: request parameters, then handler extras.
    #[must_use]
    pub fn arguments(route: &Route) -> Params {
        let mut args = route.request_parameters().clone();
        if let Handler::Action { extras, .. } = route.handler() {
            for (key, value) in extras.iter() {
                args.insert(key, value);
            }
        }
        args
    }
}

impl HandlerInvoker for RouteHandler {
    fn invoke(&self, route: &Route) -> Result<RouteResponse> {
        let args = Self::arguments(route);
        let handler = match route.handler() {
            Handler::Closure(handler) => Arc::clone(handler),
            other => {
                let key = other.key().unwrap_or_default();
                match self.handlers.get(&key) {
                    Some(handler) => Arc::clone(handler),
                    None => return Err(RoutingError::HandlerNotFound { handler: key }),
                }
            }
        };
        debug!(
            route_name = route.route_name().unwrap_or(""),
            handler = ?route.handler(),
            args = args.len(),
            "Invoking route handler"
        );
        Ok(handler(&args))
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.handlers.keys().collect();
        keys.sort_unstable();
        f.debug_struct("RouteHandler").field("handlers", &keys).finish()
    }
}

/// Transport-neutral response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// JSON value, or a JSON string for text bodies.
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    #[must_use]
    pub fn text(status: u16, body: String) -> Self {
        Self::new(status, HeaderVec::new(), Value::String(body))
    }

    #[must_use]
    pub fn status_only(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as it goes on the wire.
    #[must_use]
    pub fn body_string(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Shapes handler results: structured data as JSON, text as the body, no result as 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteResponseParser;

impl RouteResponseParser {
    #[must_use]
    pub fn parse(&self, response: RouteResponse) -> HandlerResponse {
        match response {
            RouteResponse::Json(body) => HandlerResponse::json(200, body),
            RouteResponse::Text(body) => HandlerResponse::text(200, body),
            RouteResponse::Empty => HandlerResponse::status_only(404),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteFactory;
    use serde_json::json;

    fn matched(handler: Handler) -> Route {
        let mut route = RouteFactory::default().create_route("GET", "blog/{id}", handler);
        route.params_mut().request_parameters = Params::from([("id", "45")]);
        route
    }

    #[test]
    fn test_closure_receives_request_parameters() {
        let route = matched(Handler::closure(|args| {
            RouteResponse::from(format!("blog {}", args.get("id").unwrap_or("?")))
        }));
        let response = RouteHandler::new().invoke(&route).unwrap();
        assert_eq!(response, RouteResponse::Text("blog 45".to_string()));
    }

    #[test]
    fn test_action_extras_override_request_parameters() {
        let extras = Params::from([("id", "1"), ("format", "json")]);
        let route = matched(Handler::action_with("BlogController", "show", extras));

        let mut invoker = RouteHandler::new();
        invoker.register_action("BlogController", "show", |args| {
            RouteResponse::from(json!({ "id": args.get("id"), "format": args.get("format") }))
        });

        let response = invoker.invoke(&route).unwrap();
        assert_eq!(response, RouteResponse::Json(json!({"id": "1", "format": "json"})));
    }

    #[test]
    fn test_unregistered_handler() {
        let route = matched(Handler::named("missing"));
        let err = RouteHandler::new().invoke(&route).unwrap_err();
        assert!(matches!(err, RoutingError::HandlerNotFound { ref handler } if handler == "missing"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_response_parser() {
        let parser = RouteResponseParser;

        let json = parser.parse(RouteResponse::json(&vec!["a", "b"]));
        assert_eq!(json.status, 200);
        assert_eq!(json.get_header("Content-Type"), Some("application/json"));
        assert_eq!(json.body_string(), r#"["a","b"]"#);

        let text = parser.parse(RouteResponse::from("hello"));
        assert_eq!(text.status, 200);
        assert_eq!(text.get_header("content-type"), None);
        assert_eq!(text.body_string(), "hello");

        let empty = parser.parse(RouteResponse::from(None::<String>));
        assert_eq!(empty.status, 404);
    }
}
