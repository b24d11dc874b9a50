//! Post-match refinement steps.
//!
//! After a route's pattern matched, its refinement steps run in
//! registration order. Each receives the in-flight route (with
//! `request_parameters` populated) and either continues with a possibly
//! updated route or rejects the candidate, in which case dispatch moves on
//! to the next route. An `Err` aborts dispatch.
//!
//! Locale and translation resolution are the two built-in steps; custom
//! steps are added with [`Route::matches`].

use std::fmt;
use std::sync::Arc;

use super::core::Route;
use crate::error::{Result, RoutingError};

/// Outcome of one refinement step.
#[derive(Debug)]
pub enum Refined {
    Continue(Route),
    Reject,
}

/// User-supplied refinement.
pub type RefineFn = Arc<dyn Fn(Route) -> Result<Refined> + Send + Sync>;

#[derive(Clone)]
pub enum Refinement {
    /// Establish the request locale from the locale segment, the route locale or the omit locale.
    Locales,
    /// Check translated segments against the resolved locale.
    Translations,
    Custom(RefineFn),
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refinement::Locales => f.write_str("Locales"),
            Refinement::Translations => f.write_str("Translations"),
            Refinement::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RefinementStep {
    pub(crate) key: Option<String>,
    pub(crate) refinement: Refinement,
}

impl Refinement {
    pub(crate) fn apply(&self, route: Route) -> Result<Refined> {
        match self {
            Refinement::Locales => resolve_locale(route),
            Refinement::Translations => check_translations(route),
            Refinement::Custom(refine) => refine(route),
        }
    }
}

/// Run every refinement step of `route` in order, stopping at the first rejection.
pub(crate) fn refine(route: Route) -> Result<Option<Route>> {
    let steps: Vec<Refinement> = route
        .params()
        .refinements
        .iter()
        .map(|step| step.refinement.clone())
        .collect();

    let mut route = route;
    for step in &steps {
        match step.apply(route)? {
            Refined::Continue(next) => route = next,
            Refined::Reject => {
                tracing::debug!(refinement = ?step, "Route candidate rejected by refinement");
                return Ok(None);
            }
        }
    }
    Ok(Some(route))
}

fn resolve_locale(mut route: Route) -> Result<Refined> {
    let params = route.params_mut();
    let locale_name = params.locale_name().to_owned();
    let requested = params
        .request_parameters
        .get(&locale_name)
        .map(str::to_owned);

    // The omitted locale never appears in a URL; spelling it out is a different route.
    if let (Some(omit), Some(requested)) = (&params.locale_omit, &requested) {
        if omit == requested {
            return Ok(Refined::Reject);
        }
    }

    if let Some(requested) = requested.filter(|l| !l.is_empty()) {
        params.locale = Some(requested);
    }
    if params.locale.is_none() {
        params.locale.clone_from(&params.locale_omit);
    }
    let Some(locale) = params.locale.clone() else {
        return Err(RoutingError::translation(
            Some(&route),
            "No locale detected for translation",
        ));
    };

    params.request_parameters.insert(locale_name, &locale);

    let allowed = params.locales.as_deref().unwrap_or_default();
    if !allowed.is_empty() && !allowed.contains(&locale) {
        return Ok(Refined::Reject);
    }
    Ok(Refined::Continue(route))
}

fn check_translations(route: Route) -> Result<Refined> {
    let params = route.params();
    let Some(locale) = params.locale.as_deref() else {
        return Err(RoutingError::translation(
            Some(&route),
            "No locale detected for translation",
        ));
    };

    for (key, translations) in &params.trans {
        let expected = translations.get(locale).or_else(|| {
            params
                .fallback_for(locale)
                .and_then(|fallback| translations.get(fallback))
        });
        if expected.is_none() || expected != params.request_parameters.get(key) {
            return Ok(Refined::Reject);
        }
    }
    Ok(Refined::Continue(route))
}
