use super::core::{Route, RouteFactory};
use super::group::RouteGroup;
use super::resource::RouteResource;
use crate::handler::Handler;

/// Route registration shared by the router and route groups.
///
/// Implementors provide storage; the verb shorthands, groups and resources
/// come for free.
pub trait RouteRegistrar {
    fn factory(&self) -> &RouteFactory;

    /// Store a route and return it for further configuration.
    fn push_route(&mut self, route: Route) -> &mut Route;

    fn extend_routes(&mut self, routes: Vec<Route>);

    /// Full pattern for a URI registered here.
    fn prefixed(&self, uri: &str) -> String {
        uri.to_owned()
    }

    /// Register a route. `method` is a verb, a `|`-separated set or `*`.
    fn add_route(&mut self, method: &str, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        let route = self
            .factory()
            .create_route(method, &self.prefixed(uri), handler.into());
        self.push_route(route)
    }

    fn get(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("GET", uri, handler)
    }

    fn head(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("HEAD", uri, handler)
    }

    fn post(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("POST", uri, handler)
    }

    fn put(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("PUT", uri, handler)
    }

    fn patch(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("PATCH", uri, handler)
    }

    fn delete(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("DELETE", uri, handler)
    }

    fn options(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("OPTIONS", uri, handler)
    }

    /// Register for every supported verb.
    fn any(&mut self, uri: &str, handler: impl Into<Handler>) -> &mut Route {
        self.add_route("*", uri, handler)
    }

    /// Register a group of routes under `uri`.
    ///
    /// The group is materialized when `build` returns.
    fn group<F>(&mut self, uri: &str, build: F)
    where
        F: FnOnce(&mut RouteGroup),
    {
        let mut group = RouteGroup::new(self.factory().clone(), &self.prefixed(uri));
        build(&mut group);
        self.extend_routes(group.into_routes());
    }

    /// Register the CRUD routes of `controller` under `name`.
    fn resource<F>(&mut self, name: &str, controller: &str, build: F)
    where
        F: FnOnce(&mut RouteResource),
    {
        let mut resource = RouteResource::new(self.factory().clone(), &self.prefixed(name), controller);
        build(&mut resource);
        self.extend_routes(resource.into_routes());
    }
}
