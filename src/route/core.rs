use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::refine::{Refined, Refinement, RefinementStep};
use crate::constrainer::Constraint;
use crate::domain::Domains;
use crate::error::Result;
use crate::handler::Handler;
use crate::params::Params;

/// Default locale parameter name.
pub const DEFAULT_LOCALE_NAME: &str = "locale";

/// Domain-specific configuration, applied when a route is forked for a domain.
pub type DomainConfig = Arc<dyn Fn(Route) -> Route + Send + Sync>;

/// One domain alternative of a route.
#[derive(Clone)]
pub struct DomainBinding {
    /// Physical hostname, already resolved through the domain registry.
    pub domain: String,
    pub config: Option<DomainConfig>,
}

impl fmt::Debug for DomainBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainBinding")
            .field("domain", &self.domain)
            .field("config", &self.config.is_some())
            .finish()
    }
}

/// Constraint on the raw query string, tested as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryConstraint {
    /// Any query string is accepted (`"*"`).
    Any,
    /// Requests carrying a query string are rejected.
    Deny,
    /// Regex over the entire raw query string, not per key.
    Pattern(String),
}

impl From<&str> for QueryConstraint {
    fn from(value: &str) -> Self {
        match value {
            "*" => QueryConstraint::Any,
            pattern => QueryConstraint::Pattern(pattern.to_owned()),
        }
    }
}

impl From<Option<&str>> for QueryConstraint {
    fn from(value: Option<&str>) -> Self {
        value.map_or(QueryConstraint::Deny, QueryConstraint::from)
    }
}

/// Route configuration plus the request context written during matching.
///
/// Every key the router interprets is an explicit field; anything else an
/// application attaches lives in `extra`.
#[derive(Clone, Default)]
pub struct RouteParams {
    pub name: Option<String>,
    pub middleware: Vec<String>,
    pub constraints: HashMap<String, Constraint>,
    /// `None` until declared; dispatch treats it as [`QueryConstraint::Any`].
    pub query: Option<QueryConstraint>,
    /// Selected hostname.
    pub domain: Option<String>,
    /// Base URL of the selected domain, from the registry.
    pub domain_uri: Option<String>,
    pub domains: Vec<DomainBinding>,
    pub locale: Option<String>,
    pub locales: Option<Vec<String>>,
    pub locale_omit: Option<String>,
    pub locale_name: Option<String>,
    pub locale_fallbacks: Option<Params>,
    pub locale_base_urls: Option<Params>,
    /// Translated segment values: key → (locale → value).
    pub trans: Vec<(String, Params)>,
    /// `Some(true)` validates signatures on dispatch, `Some(false)` only shapes the pattern.
    pub signed: Option<bool>,
    pub base_url: Option<String>,
    pub extra: BTreeMap<String, Value>,
    pub(crate) refinements: Vec<RefinementStep>,

    pub request_method: Option<String>,
    pub request_uri: Option<String>,
    pub request_parameters: Params,
    pub request_domain: Option<String>,
}

impl RouteParams {
    /// Configured locale parameter name, `locale` by default.
    #[must_use]
    pub fn locale_name(&self) -> &str {
        self.locale_name.as_deref().unwrap_or(DEFAULT_LOCALE_NAME)
    }

    #[must_use]
    pub fn translations(&self, key: &str) -> Option<&Params> {
        self.trans.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    #[must_use]
    pub fn fallback_for(&self, locale: &str) -> Option<&str> {
        self.locale_fallbacks.as_ref()?.get(locale)
    }

    #[must_use]
    pub fn has_domains(&self) -> bool {
        !self.domains.is_empty()
    }
}

/// Creates routes that share the signing parameter names and the domain registry.
#[derive(Debug, Clone)]
pub struct RouteFactory {
    signature_name: Arc<str>,
    expires_name: Arc<str>,
    domains: Option<Arc<Domains>>,
}

impl Default for RouteFactory {
    fn default() -> Self {
        Self::new("signature", "expires")
    }
}

impl RouteFactory {
    #[must_use]
    pub fn new(signature_name: &str, expires_name: &str) -> Self {
        Self {
            signature_name: Arc::from(signature_name),
            expires_name: Arc::from(expires_name),
            domains: None,
        }
    }

    #[must_use]
    pub fn with_domains(mut self, domains: Domains) -> Self {
        self.domains = Some(Arc::new(domains));
        self
    }

    #[must_use]
    pub fn domains(&self) -> Option<&Domains> {
        self.domains.as_deref()
    }

    #[must_use]
    pub fn signature_name(&self) -> &str {
        &self.signature_name
    }

    #[must_use]
    pub fn expires_name(&self) -> &str {
        &self.expires_name
    }

    /// Pattern suffix carrying the signature and expiry: `/{?signature}/{?expires}`.
    #[must_use]
    pub fn signature_suffix(&self) -> String {
        signature_suffix(&self.signature_name, &self.expires_name)
    }

    #[must_use]
    pub fn create_route(&self, method: &str, uri: &str, handler: Handler) -> Route {
        Route {
            method: method.to_owned(),
            uri: normalize_pattern(uri),
            handler,
            params: RouteParams::default(),
            factory: self.clone(),
        }
    }

    /// Resolve a key or hostname to `(hostname, base uri)`.
    fn resolve_domain(&self, domain: &str) -> (String, Option<String>) {
        match self.domains().and_then(|d| d.get(domain)) {
            Some(found) => (found.domain().to_owned(), Some(found.uri().to_owned())),
            None => (domain.to_owned(), None),
        }
    }
}

pub(crate) fn signature_suffix(signature_name: &str, expires_name: &str) -> String {
    format!("/{{?{signature_name}}}/{{?{expires_name}}}")
}

/// Drop empty segments: `/blog//{id}/` → `blog/{id}`.
#[must_use]
pub fn normalize_pattern(uri: &str) -> String {
    uri.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A method + pattern + handler registration with its configuration.
///
/// Configuration methods take `&mut self` and return `&mut Self` so they
/// chain on the reference the router hands back:
///
/// ```rust,ignore
/// router
///     .get("{?locale}/about", |_| RouteResponse::from("about"))
///     .name("about")
///     .locales(["de", "en"])
///     .locale_omit("en");
/// ```
#[derive(Clone)]
pub struct Route {
    method: String,
    uri: String,
    handler: Handler,
    params: RouteParams,
    factory: RouteFactory,
}

impl Route {
    /// Method spec as registered: a verb, `GET|HEAD` style set, or `*`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Pattern, e.g. `{?locale}/blog/{id}`.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.params.name.as_deref()
    }

    #[must_use]
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut RouteParams {
        &mut self.params
    }

    /// Path and query values extracted during dispatch.
    #[must_use]
    pub fn request_parameters(&self) -> &Params {
        &self.params.request_parameters
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.params.signed.is_some()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.params.name = Some(name.into());
        self
    }

    /// Bind a domain alternative (registry key or hostname).
    ///
    /// The first bound domain becomes the route's selected domain.
    pub fn domain(&mut self, domain: &str) -> &mut Self {
        self.bind_domain(domain, None)
    }

    /// Bind a domain alternative with configuration applied when it is selected.
    pub fn domain_with<F>(&mut self, domain: &str, config: F) -> &mut Self
    where
        F: Fn(Route) -> Route + Send + Sync + 'static,
    {
        self.bind_domain(domain, Some(Arc::new(config)))
    }

    fn bind_domain(&mut self, domain: &str, config: Option<DomainConfig>) -> &mut Self {
        let (host, domain_uri) = self.factory.resolve_domain(domain);
        match self.params.domains.iter_mut().find(|b| b.domain == host) {
            Some(binding) => binding.config = config,
            None => self.params.domains.push(DomainBinding {
                domain: host.clone(),
                config,
            }),
        }
        if self.params.domain.is_none() {
            self.params.domain = Some(host);
            self.params.domain_uri = domain_uri;
        }
        self
    }

    /// Fork this route for a domain, applying that domain's configuration.
    ///
    /// The receiver is never modified. A domain the route is not bound to
    /// yields an unmodified copy.
    #[must_use]
    pub fn for_domain(&self, domain: &str) -> Route {
        let (host, domain_uri) = self.factory.resolve_domain(domain);
        let mut route = self.clone();
        let Some(binding) = self.params.domains.iter().find(|b| b.domain == host) else {
            return route;
        };
        route.params.domain = Some(host);
        route.params.domain_uri = domain_uri;
        match &binding.config {
            Some(config) => config(route),
            None => route,
        }
    }

    /// Mark the route as signed and name it.
    ///
    /// Appends `/{?signature}/{?expires}` to the pattern once; calling it
    /// again only updates the name and validation flag.
    pub fn signed(&mut self, name: impl Into<String>, validate: bool) -> &mut Self {
        self.params.signed = Some(validate);
        let suffix = self.factory.signature_suffix();
        if !self.uri.ends_with(&suffix) {
            self.uri = normalize_pattern(&format!("{}{suffix}", self.uri));
        }
        self.name(name)
    }

    pub fn middleware<I, S>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params
            .middleware
            .extend(middleware.into_iter().map(Into::into));
        self
    }

    /// Constrain a placeholder.
    pub fn constrain(&mut self, key: &str, constraint: impl Into<Constraint>) -> &mut Self {
        self.params
            .constraints
            .insert(key.to_owned(), constraint.into());
        self
    }

    /// Constrain the raw query string. `"*"` accepts any, `None` rejects any query.
    pub fn query(&mut self, constraint: impl Into<QueryConstraint>) -> &mut Self {
        self.params.query = Some(constraint.into());
        self
    }

    pub fn locale(&mut self, locale: impl Into<String>) -> &mut Self {
        self.params.locale = Some(locale.into());
        if self.params.locales.is_none() {
            self.locales(Vec::<String>::new());
        }
        self
    }

    /// Enable locale resolution. An empty list accepts any locale.
    pub fn locales<I, S>(&mut self, locales: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.locales = Some(locales.into_iter().map(Into::into).collect());
        self.refine_keyed("locales", Refinement::Locales)
    }

    pub fn locale_omit(&mut self, locale: impl Into<String>) -> &mut Self {
        self.params.locale_omit = Some(locale.into());
        self
    }

    pub fn locale_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.params.locale_name = Some(name.into());
        self
    }

    /// Locale → fallback locale, one hop.
    pub fn locale_fallbacks(&mut self, fallbacks: impl Into<Params>) -> &mut Self {
        self.params.locale_fallbacks = Some(fallbacks.into());
        self
    }

    /// Locale → base URL for generated links.
    pub fn locale_base_urls(&mut self, base_urls: impl Into<Params>) -> &mut Self {
        self.params.locale_base_urls = Some(base_urls.into());
        self
    }

    /// Translate the `key` placeholder per locale.
    pub fn trans(&mut self, key: &str, translations: impl Into<Params>) -> &mut Self {
        let translations = translations.into();
        match self.params.trans.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = translations,
            None => self.params.trans.push((key.to_owned(), translations)),
        }
        if self.params.locales.is_none() {
            self.locales(Vec::<String>::new());
        }
        self.refine_keyed("translations", Refinement::Translations)
    }

    /// Append a custom refinement step run after a successful path match.
    pub fn matches<F>(&mut self, refine: F) -> &mut Self
    where
        F: Fn(Route) -> Result<Refined> + Send + Sync + 'static,
    {
        self.params.refinements.push(RefinementStep {
            key: None,
            refinement: Refinement::Custom(Arc::new(refine)),
        });
        self
    }

    /// Add or replace (in place) a keyed custom refinement step.
    pub fn matches_keyed<F>(&mut self, key: &str, refine: F) -> &mut Self
    where
        F: Fn(Route) -> Result<Refined> + Send + Sync + 'static,
    {
        self.refine_keyed(key, Refinement::Custom(Arc::new(refine)))
    }

    fn refine_keyed(&mut self, key: &str, refinement: Refinement) -> &mut Self {
        let steps = &mut self.params.refinements;
        match steps.iter_mut().find(|s| s.key.as_deref() == Some(key)) {
            Some(step) => step.refinement = refinement,
            None => steps.push(RefinementStep {
                key: Some(key.to_owned()),
                refinement,
            }),
        }
        self
    }

    pub fn base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.params.base_url = Some(base_url.into());
        self
    }

    /// Attach an application-specific value.
    pub fn parameter(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.params.extra.insert(name.to_owned(), value.into());
        self
    }

    /// Value of a named parameter as exported to request attributes.
    #[must_use]
    pub fn parameter_value(&self, name: &str) -> Option<Value> {
        let p = &self.params;
        let text = |s: &Option<String>| s.clone().map(Value::String);
        match name {
            "uri" => Some(Value::String(self.uri.clone())),
            "method" => Some(Value::String(self.method.clone())),
            "name" => text(&p.name),
            "domain" => text(&p.domain),
            "domain_uri" => text(&p.domain_uri),
            "locale" => text(&p.locale),
            "base_url" => text(&p.base_url),
            "request_uri" => text(&p.request_uri),
            "request_domain" => text(&p.request_domain),
            "request_method" => text(&p.request_method),
            "request_parameters" => serde_json::to_value(&p.request_parameters).ok(),
            "middleware" => Some(Value::from(p.middleware.clone())),
            "signed" => p.signed.map(Value::Bool),
            other => p.extra.get(other).cloned(),
        }
    }

    /// Base URL generated links for this route start with.
    ///
    /// Precedence: per-locale base URL, then the selected domain (its
    /// registry URI or `scheme://host` with the scheme of `url_base`), then
    /// the route's own base URL. `None` leaves the choice to the generator.
    #[must_use]
    pub fn base_url_for(&self, locale: Option<&str>, url_base: &str) -> Option<String> {
        let p = &self.params;
        if let Some(base) = locale.and_then(|l| p.locale_base_urls.as_ref()?.get(l)) {
            return Some(base.to_owned());
        }
        if let Some(domain) = &p.domain {
            return Some(p.domain_uri.clone().unwrap_or_else(|| {
                let scheme = if url_base.starts_with("https://") {
                    "https://"
                } else {
                    "http://"
                };
                format!("{scheme}{domain}")
            }));
        }
        p.base_url.clone()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("handler", &self.handler)
            .field("name", &self.params.name)
            .field("domain", &self.params.domain)
            .field("locale", &self.params.locale)
            .field("request_parameters", &self.params.request_parameters)
            .finish_non_exhaustive()
    }
}
