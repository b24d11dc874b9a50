use serde_json::Value;

use super::core::{Route, RouteFactory};
use super::registrar::RouteRegistrar;
use crate::constrainer::Constraint;
use crate::params::Params;

/// Routes sharing a URI prefix and configuration.
///
/// Built inside [`RouteRegistrar::group`]. Shared settings may be declared
/// before or after the child routes; once the builder closure returns they
/// are applied to every child that has not set the same value itself.
#[derive(Debug)]
pub struct RouteGroup {
    factory: RouteFactory,
    uri: String,
    routes: Vec<Route>,
    shared: SharedConfig,
}

#[derive(Debug, Default)]
struct SharedConfig {
    middleware: Vec<String>,
    constraints: Vec<(String, Constraint)>,
    domains: Vec<String>,
    base_url: Option<String>,
    locale: Option<String>,
    locales: Option<Vec<String>>,
    locale_omit: Option<String>,
    locale_name: Option<String>,
    locale_fallbacks: Option<Params>,
    locale_base_urls: Option<Params>,
    extra: Vec<(String, Value)>,
}

impl RouteGroup {
    pub(crate) fn new(factory: RouteFactory, uri: &str) -> Self {
        Self {
            factory,
            uri: uri.to_owned(),
            routes: Vec::new(),
            shared: SharedConfig::default(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn middleware<I, S>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared.middleware = middleware.into_iter().map(Into::into).collect();
        self
    }

    pub fn constrain(&mut self, key: &str, constraint: impl Into<Constraint>) -> &mut Self {
        self.shared.constraints.push((key.to_owned(), constraint.into()));
        self
    }

    pub fn domain(&mut self, domain: &str) -> &mut Self {
        self.shared.domains.push(domain.to_owned());
        self
    }

    pub fn base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.shared.base_url = Some(base_url.into());
        self
    }

    pub fn locale(&mut self, locale: impl Into<String>) -> &mut Self {
        self.shared.locale = Some(locale.into());
        self
    }

    pub fn locales<I, S>(&mut self, locales: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared.locales = Some(locales.into_iter().map(Into::into).collect());
        self
    }

    pub fn locale_omit(&mut self, locale: impl Into<String>) -> &mut Self {
        self.shared.locale_omit = Some(locale.into());
        self
    }

    pub fn locale_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.shared.locale_name = Some(name.into());
        self
    }

    pub fn locale_fallbacks(&mut self, fallbacks: impl Into<Params>) -> &mut Self {
        self.shared.locale_fallbacks = Some(fallbacks.into());
        self
    }

    pub fn locale_base_urls(&mut self, base_urls: impl Into<Params>) -> &mut Self {
        self.shared.locale_base_urls = Some(base_urls.into());
        self
    }

    pub fn parameter(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.shared.extra.push((name.to_owned(), value.into()));
        self
    }

    /// Apply the shared configuration and hand back the flat route list.
    pub(crate) fn into_routes(self) -> Vec<Route> {
        let shared = self.shared;
        let mut routes = self.routes;
        for route in &mut routes {
            shared.overlay(route);
        }
        routes
    }
}

impl SharedConfig {
    fn overlay(&self, route: &mut Route) {
        if route.params().middleware.is_empty() && !self.middleware.is_empty() {
            route.middleware(self.middleware.iter().cloned());
        }
        for (key, constraint) in &self.constraints {
            if !route.params().constraints.contains_key(key) {
                route.constrain(key, constraint.clone());
            }
        }
        if !route.params().has_domains() {
            for domain in &self.domains {
                route.domain(domain);
            }
        }
        if route.params().base_url.is_none() {
            if let Some(base_url) = &self.base_url {
                route.base_url(base_url.as_str());
            }
        }
        if route.params().locale.is_none() {
            if let Some(locale) = &self.locale {
                route.locale(locale.as_str());
            }
        }
        // An auto-enabled empty list counts as unset, so a shared allow-list still applies.
        let locales_unset = route.params().locales.as_ref().map_or(true, Vec::is_empty);
        if locales_unset {
            if let Some(locales) = &self.locales {
                route.locales(locales.iter().cloned());
            }
        }
        let params = route.params_mut();
        if params.locale_omit.is_none() {
            params.locale_omit.clone_from(&self.locale_omit);
        }
        if params.locale_name.is_none() {
            params.locale_name.clone_from(&self.locale_name);
        }
        if params.locale_fallbacks.is_none() {
            params.locale_fallbacks.clone_from(&self.locale_fallbacks);
        }
        if params.locale_base_urls.is_none() {
            params.locale_base_urls.clone_from(&self.locale_base_urls);
        }
        for (name, value) in &self.extra {
            params
                .extra
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl RouteRegistrar for RouteGroup {
    fn factory(&self) -> &RouteFactory {
        &self.factory
    }

    fn prefixed(&self, uri: &str) -> String {
        format!("{}/{}", self.uri, uri)
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
