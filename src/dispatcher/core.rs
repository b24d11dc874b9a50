use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::constrainer::{Constrainer, ConstraintRule, Rule};
use crate::error::{Result, RoutingError};
use crate::params::Params;
use crate::request::RequestData;
use crate::route::{refine, QueryConstraint, Route};
use crate::router::Router;
use crate::url::UrlGenerator;

/// Verbs a `*` method spec expands to.
pub const SUPPORTED_METHODS: [&str; 7] = ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Capture rule for a placeholder without a constraint.
const SEGMENT_RULE: &str = "[^/]+";
/// Capture rule for a wildcard placeholder: every remaining segment.
const WILDCARD_RULE: &str = "[^?]+";

/// A route pattern compiled into an anchored regex.
///
/// Placeholders capture into generated group names (`p0`, `p1`, …) mapped
/// back to the placeholder names, so any placeholder name is accepted.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Arc<Regex>,
    pub names: Vec<String>,
}

impl CompiledPattern {
    /// Match a trimmed request path, returning the placeholder values.
    ///
    /// Values lose their leading `/`; an absent optional segment yields `""`.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Params> {
        let subject = if path.is_empty() {
            String::new()
        } else {
            format!("/{path}")
        };
        let captures = self.regex.captures(&subject)?;
        let mut params = Params::new();
        for (index, name) in self.names.iter().enumerate() {
            let value = captures
                .name(&format!("p{index}"))
                .map_or("", |m| m.as_str().trim_start_matches('/'));
            params.insert(name.as_str(), value);
        }
        Some(params)
    }
}

/// Build the regex source for a pattern.
///
/// Segments are static literals, `{name}`, `{?name}` (the whole segment,
/// slash included, is optional) or `{name*}` (greedy over the remaining
/// segments; compilation stops there). A constraint resolving to a regex
/// replaces the default capture rule.
#[must_use]
pub fn pattern_source(
    pattern: &str,
    constraints: &HashMap<String, crate::constrainer::Constraint>,
    constrainer: &Constrainer,
) -> (String, Vec<String>) {
    let mut source = String::from("^");
    let mut names = Vec::new();

    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let Some(placeholder) = segment.strip_prefix('{') else {
            source.push('/');
            source.push_str(&regex::escape(segment));
            continue;
        };
        let inner = placeholder.trim_end_matches('}');
        let (name, optional, wildcard) = if let Some(name) = inner.strip_suffix('*') {
            (name, false, true)
        } else if let Some(name) = inner.strip_prefix('?') {
            (name, true, false)
        } else {
            (inner, false, false)
        };

        let rule = constraints
            .get(name)
            .and_then(|constraint| constrainer.regex(constraint))
            .unwrap_or_else(|| {
                if wildcard {
                    WILDCARD_RULE.to_owned()
                } else {
                    SEGMENT_RULE.to_owned()
                }
            });

        let index = names.len();
        source.push_str(&format!("(?P<p{index}>/(?:{rule}))"));
        if optional {
            source.push('?');
        }
        names.push(name.to_owned());

        if wildcard {
            break;
        }
    }
    source.push('$');
    (source, names)
}

/// Selects the first route accepting the current request.
///
/// Candidates are tried in registration order. For each one: domain,
/// method, query constraint, path, per-placeholder constraint checks and
/// refinement steps must all accept; a signed route additionally has its
/// signature verified.
pub struct RouteDispatcher {
    constrainer: Constrainer,
    regex_cache: Mutex<HashMap<String, Arc<Regex>>>,
}

impl Default for RouteDispatcher {
    fn default() -> Self {
        Self::new(Constrainer::new())
    }
}

impl RouteDispatcher {
    #[must_use]
    pub fn new(constrainer: Constrainer) -> Self {
        Self {
            constrainer,
            regex_cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn constrainer(&self) -> &Constrainer {
        &self.constrainer
    }

    /// Start an inline constraint rule.
    pub fn rule(&mut self, name: &str) -> &mut Rule {
        self.constrainer.rule(name)
    }

    pub fn add_rule(&mut self, name: &str, rule: impl ConstraintRule + 'static) -> &mut Self {
        self.constrainer.add_rule(name, rule);
        self
    }

    /// Dispatch the router's current request, mount prefix removed, against its route table.
    pub fn dispatch(&self, router: &Router) -> Result<Route> {
        self.dispatch_routes(
            router.routes(),
            &router.routing_request(),
            router.url_generator(),
        )
    }

    pub fn dispatch_routes(
        &self,
        routes: &[Route],
        request: &RequestData,
        generator: &UrlGenerator,
    ) -> Result<Route> {
        let start = Instant::now();
        debug!(
            method = %request.method(),
            uri = %request.uri(),
            domain = request.domain().unwrap_or(""),
            candidates = routes.len(),
            "Route match attempt"
        );

        for candidate in routes {
            let Some(route) = self.route_matches(request, candidate)? else {
                continue;
            };

            if route.params().signed == Some(true) {
                let base_url =
                    route.base_url_for(route.params().locale.as_deref(), generator.url_base());
                if !generator.has_valid_signature(route.uri(), request.uri(), base_url.as_deref()) {
                    warn!(
                        route_uri = %route.uri(),
                        route_name = route.route_name().unwrap_or(""),
                        request_uri = %request.uri(),
                        "Invalid route signature"
                    );
                    return Err(RoutingError::InvalidSignature {
                        route: Some(Box::new(route)),
                        message: "Invalid Route Signature".to_owned(),
                    });
                }
            }

            info!(
                method = %request.method(),
                route_uri = %route.uri(),
                route_name = route.route_name().unwrap_or(""),
                request_parameters = ?route.request_parameters(),
                duration_us = start.elapsed().as_micros() as u64,
                "Route matched"
            );
            return Ok(route);
        }

        warn!(
            method = %request.method(),
            uri = %request.uri(),
            candidates = routes.len(),
            "No route matched"
        );
        Err(RoutingError::RouteNotFound {
            method: request.method().to_string(),
            uri: request.uri().to_owned(),
        })
    }

    /// The candidate, enriched with request context, if it accepts the request.
    fn route_matches(&self, request: &RequestData, candidate: &Route) -> Result<Option<Route>> {
        let route: Cow<'_, Route> = if candidate.params().has_domains() {
            match request.domain() {
                Some(domain) => Cow::Owned(candidate.for_domain(domain)),
                None => return Ok(None),
            }
        } else {
            Cow::Borrowed(candidate)
        };

        if let Some(domain) = route.params().domain.as_deref() {
            if request.domain() != Some(domain) {
                return Ok(None);
            }
        }

        if !method_allowed(route.method(), request.method().as_str()) {
            return Ok(None);
        }

        if let Some(query) = request.query() {
            match route.params().query.as_ref().unwrap_or(&QueryConstraint::Any) {
                QueryConstraint::Any => {}
                QueryConstraint::Deny => return Ok(None),
                QueryConstraint::Pattern(pattern) => {
                    let Some(regex) = self.compiled(pattern) else {
                        return Ok(None);
                    };
                    if !regex.is_match(query) {
                        return Ok(None);
                    }
                }
            }
        }

        let Some(mut parameters) = self.match_path(&route, request.path()) else {
            return Ok(None);
        };
        for (key, value) in request.query_params().iter() {
            parameters.insert_missing(key, value);
        }

        let mut route = route.into_owned();
        let params = route.params_mut();
        params.request_method = Some(request.method().to_string());
        params.request_uri = Some(request.uri().to_owned());
        params.request_parameters = parameters;
        params.request_domain = request.domain().map(str::to_owned);

        refine(route)
    }

    fn match_path(&self, route: &Route, path: &str) -> Option<Params> {
        let pattern = route.uri();
        if !pattern.contains('{') {
            return (pattern == path).then(Params::new);
        }

        let constraints = &route.params().constraints;
        let compiled = self.compile_pattern(pattern, constraints)?;
        let values = compiled.captures(path)?;

        for (name, value) in values.iter() {
            if value.is_empty() {
                continue;
            }
            if let Some(constraint) = constraints.get(name) {
                if !self.constrainer.matches(constraint, value) {
                    debug!(
                        route_uri = %pattern,
                        parameter = %name,
                        value = %value,
                        "Route constraint rejected value"
                    );
                    return None;
                }
            }
        }
        Some(values)
    }

    /// Compile a route pattern with its constraints, reusing earlier compilations.
    #[must_use]
    pub fn compile_pattern(
        &self,
        pattern: &str,
        constraints: &HashMap<String, crate::constrainer::Constraint>,
    ) -> Option<CompiledPattern> {
        let (source, names) = pattern_source(pattern, constraints, &self.constrainer);
        let regex = self.compiled(&source)?;
        Some(CompiledPattern { regex, names })
    }

    fn compiled(&self, source: &str) -> Option<Arc<Regex>> {
        if let Ok(cache) = self.regex_cache.lock() {
            if let Some(regex) = cache.get(source) {
                return Some(Arc::clone(regex));
            }
        }
        match Regex::new(source) {
            Ok(regex) => {
                let regex = Arc::new(regex);
                if let Ok(mut cache) = self.regex_cache.lock() {
                    cache.insert(source.to_owned(), Arc::clone(&regex));
                }
                Some(regex)
            }
            Err(err) => {
                warn!(regex = %source, error = %err, "Invalid route regex, candidate skipped");
                None
            }
        }
    }
}

fn method_allowed(spec: &str, method: &str) -> bool {
    if spec == "*" {
        return SUPPORTED_METHODS.contains(&method);
    }
    spec.split('|')
        .any(|allowed| allowed.trim().eq_ignore_ascii_case(method))
}

impl fmt::Debug for RouteDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.regex_cache.lock().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("RouteDispatcher")
            .field("constrainer", &self.constrainer)
            .field("cached_regexes", &cached)
            .finish()
    }
}
