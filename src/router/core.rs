use std::borrow::Cow;
use std::fmt;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::RouterConfig;
use crate::constrainer::{ConstraintRule, Rule};
use crate::dispatcher::RouteDispatcher;
use crate::domain::Domains;
use crate::error::{Result, RoutingError, UrlGenerationError};
use crate::handler::{HandlerInvoker, HandlerResponse, RouteHandler, RouteResponseParser};
use crate::matched::MatchedRouteHandler;
use crate::params::Params;
use crate::request::{split_uri, RequestData};
use crate::route::{Route, RouteFactory, RouteRegistrar};
use crate::url::{Url, UrlGenerator};

/// Owns the route table and the request being routed.
///
/// One router serves one logical request at a time. Dispatch is memoized:
/// the first successful [`Router::dispatch`] is cached until the request
/// data changes or [`Router::clear`] runs. Routes are registered through
/// [`RouteRegistrar`].
pub struct Router {
    request: RequestData,
    generator: UrlGenerator,
    factory: RouteFactory,
    dispatcher: RouteDispatcher,
    handlers: RouteHandler,
    invoker: Option<Box<dyn HandlerInvoker + Send + Sync>>,
    listeners: MatchedRouteHandler,
    parser: RouteResponseParser,
    routes: Vec<Route>,
    old_routes: Vec<Route>,
    matched: Option<Route>,
    base_uri: Option<String>,
    request_attributes: Vec<String>,
}

impl Router {
    #[must_use]
    pub fn new(request: RequestData, url_base: &str, signature_key: &str) -> Self {
        let defaults = RouterConfig::default();
        Self {
            request,
            generator: UrlGenerator::new(url_base, signature_key),
            factory: RouteFactory::default(),
            dispatcher: RouteDispatcher::default(),
            handlers: RouteHandler::new(),
            invoker: None,
            listeners: MatchedRouteHandler::new(),
            parser: RouteResponseParser,
            routes: Vec::new(),
            old_routes: Vec::new(),
            matched: None,
            base_uri: None,
            request_attributes: defaults.request_attributes,
        }
    }

    #[must_use]
    pub fn from_config(config: &RouterConfig, request: RequestData) -> Self {
        let mut router = Self::new(request, &config.base_url, &config.signature_key);
        router.generator = UrlGenerator::with_names(
            &config.base_url,
            &config.signature_key,
            &config.signature_name,
            &config.expires_name,
        );
        router.factory = RouteFactory::new(&config.signature_name, &config.expires_name)
            .with_domains(Domains::new(config.domains.iter().cloned()));
        if let Some(base_uri) = &config.base_uri {
            router.set_base_uri(base_uri);
        }
        router.request_attributes = config.request_attributes.clone();
        info!(
            base_url = %config.base_url,
            base_uri = config.base_uri.as_deref().unwrap_or(""),
            domains = config.domains.len(),
            "Router configured"
        );
        router
    }

    /// Replace the domain registry used to resolve routes registered from now on.
    #[must_use]
    pub fn with_domains(mut self, domains: Domains) -> Self {
        self.factory = self.factory.with_domains(domains);
        self
    }

    #[must_use]
    pub fn request_data(&self) -> &RequestData {
        &self.request
    }

    /// Replace the request being routed and drop the memoized match.
    pub fn set_request_data(&mut self, request: RequestData) -> &mut Self {
        self.request = request;
        self.matched = None;
        self
    }

    /// Mount prefix stripped from request paths before matching.
    pub fn set_base_uri(&mut self, base_uri: &str) -> &mut Self {
        let base_uri = base_uri.trim_matches('/');
        self.base_uri = (!base_uri.is_empty()).then(|| base_uri.to_owned());
        self.matched = None;
        self
    }

    #[must_use]
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// The request as the dispatcher sees it, with the mount prefix removed.
    pub(crate) fn routing_request(&self) -> Cow<'_, RequestData> {
        let Some(base) = self.base_uri.as_deref().map(|b| b.trim_matches('/')) else {
            return Cow::Borrowed(&self.request);
        };
        let (path, query) = split_uri(self.request.uri());
        let rest = if path == base {
            ""
        } else if let Some(rest) = path.strip_prefix(base).and_then(|r| r.strip_prefix('/')) {
            rest
        } else {
            return Cow::Borrowed(&self.request);
        };
        let uri = match query {
            Some(query) => format!("/{rest}?{query}"),
            None => format!("/{rest}"),
        };
        Cow::Owned(self.request.with_uri(uri))
    }

    #[must_use]
    pub fn url_generator(&self) -> &UrlGenerator {
        &self.generator
    }

    pub fn url_generator_mut(&mut self) -> &mut UrlGenerator {
        &mut self.generator
    }

    #[must_use]
    pub fn dispatcher(&self) -> &RouteDispatcher {
        &self.dispatcher
    }

    /// Start an inline constraint rule.
    pub fn rule(&mut self, name: &str) -> &mut Rule {
        self.dispatcher.rule(name)
    }

    pub fn add_rule(&mut self, name: &str, rule: impl ConstraintRule + 'static) -> &mut Self {
        self.dispatcher.add_rule(name, rule);
        self
    }

    /// Registry used to invoke named and action handlers.
    pub fn handlers_mut(&mut self) -> &mut RouteHandler {
        &mut self.handlers
    }

    /// Replace the handler registry with another invoker.
    pub fn set_invoker(&mut self, invoker: impl HandlerInvoker + Send + Sync + 'static) -> &mut Self {
        self.invoker = Some(Box::new(invoker));
        self
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Named routes archived by [`Router::clear`].
    #[must_use]
    pub fn old_routes(&self) -> &[Route] {
        &self.old_routes
    }

    pub fn add_routes(&mut self, routes: Vec<Route>) -> &mut Self {
        self.routes.extend(routes);
        self
    }

    /// Route registered under `name`: the latest registration wins, then the archive.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&Route> {
        let named = |route: &&Route| route.route_name() == Some(name);
        self.routes
            .iter()
            .rev()
            .find(named)
            .or_else(|| self.old_routes.iter().rev().find(named))
    }

    /// Select the route for the current request, once.
    pub fn dispatch(&mut self) -> Result<&Route> {
        let route = match self.matched.take() {
            Some(route) => {
                debug!(route_uri = %route.uri(), "Dispatch cache hit");
                route
            }
            None => {
                info!(
                    routes = self.routes.len(),
                    old_routes = self.old_routes.len(),
                    base_uri = self.base_uri.as_deref().unwrap_or(""),
                    "Dispatching against routing table"
                );
                self.dispatcher.dispatch(self)?
            }
        };
        Ok(&*self.matched.insert(route))
    }

    #[must_use]
    pub fn matched_route(&self) -> Option<&Route> {
        self.matched.as_ref()
    }

    /// Link builder for the route named `name`.
    pub fn url(&self, name: &str, params: impl Into<Params>) -> Result<Url<'_>> {
        let Some(route) = self.route(name) else {
            debug!(route_name = %name, "Url requested for undefined route");
            return Err(UrlGenerationError::UndefinedRoute {
                name: name.to_owned(),
            }
            .into());
        };
        Ok(Url::new(
            &self.generator,
            route,
            params.into(),
            self.request.domain(),
        ))
    }

    /// Run `listener` once when the route named `route_name` is matched by [`Router::respond`].
    pub fn matched<F>(&mut self, route_name: &str, listener: F, priority: i32) -> &mut Self
    where
        F: FnOnce(&Route) + Send + 'static,
    {
        self.listeners.register(route_name, listener, priority);
        self
    }

    /// Archive named routes and reset the table and the memoized match.
    pub fn clear(&mut self) -> &mut Self {
        let cleared = self.routes.len();
        self.old_routes
            .extend(self.routes.drain(..).filter(|route| route.route_name().is_some()));
        self.matched = None;
        debug!(cleared, old_routes = self.old_routes.len(), "Router cleared");
        self
    }

    pub fn set_request_attributes<I, S>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// `route.<name>` values of the matched route for downstream consumers.
    ///
    /// Empty before a successful dispatch; unset values are skipped.
    #[must_use]
    pub fn request_attributes(&self) -> Vec<(String, Value)> {
        let Some(route) = &self.matched else {
            return Vec::new();
        };
        self.request_attributes
            .iter()
            .filter_map(|name| Some((format!("route.{name}"), route.parameter_value(name)?)))
            .collect()
    }

    /// Dispatch, fire matched listeners, invoke the handler and shape the response.
    ///
    /// Routing failures become 404 responses; handler lookup and URL
    /// building failures become 500 responses.
    pub fn respond(&mut self) -> HandlerResponse {
        let route = match self.dispatch() {
            Ok(route) => route.clone(),
            Err(err) => return error_response(&err),
        };
        self.listeners.handle(&route);

        let invoker: &dyn HandlerInvoker = match &self.invoker {
            Some(invoker) => invoker.as_ref(),
            None => &self.handlers,
        };
        match invoker.invoke(&route) {
            Ok(response) => self.parser.parse(response),
            Err(err) => error_response(&err),
        }
    }
}

fn error_response(err: &RoutingError) -> HandlerResponse {
    let status = err.status_code();
    if err.is_client_error() {
        warn!(status, error = %err, "Routing failed");
    } else {
        error!(status, error = %err, "Route handling failed");
    }
    let reason = if err.is_client_error() {
        "Not Found"
    } else {
        "Internal Server Error"
    };
    HandlerResponse::json(status, json!({ "error": reason, "message": err.to_string() }))
}

impl RouteRegistrar for Router {
    fn factory(&self) -> &RouteFactory {
        &self.factory
    }

    fn push_route(&mut self, route: Route) -> &mut Route {
        let index = self.routes.len();
        self.routes.push(route);
        &mut self.routes[index]
    }

    fn extend_routes(&mut self, routes: Vec<Route>) {
        self.routes.extend(routes);
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("request", &self.request)
            .field("generator", &self.generator)
            .field("routes", &self.routes.len())
            .field("old_routes", &self.old_routes.len())
            .field("matched", &self.matched.as_ref().map(Route::uri))
            .field("base_uri", &self.base_uri)
            .finish_non_exhaustive()
    }
}
