use tracing::debug;

use super::generator::{Expiration, UrlGenerator};
use crate::error::{Result, RoutingError};
use crate::params::Params;
use crate::route::Route;

#[derive(Debug, Clone, Copy, Default)]
struct Signing {
    expiration: Option<Expiration>,
    with_query: bool,
}

/// Link builder bound to one named route.
///
/// Accumulates parameters, a locale and signing intent; [`Url::generate`]
/// resolves them into a string and clears the parameters and the locale, so
/// the same builder can be reused for another link to the route.
///
/// ```rust,ignore
/// let mut url = router.url("about", Params::new())?;
/// let english = url.locale(Some("en"))?.generate()?;
/// let switcher = url.translated(None)?;
/// ```
#[derive(Debug, Clone)]
pub struct Url<'g> {
    generator: &'g UrlGenerator,
    default_route: Route,
    route: Route,
    params: Params,
    signing: Option<Signing>,
    locale: Option<String>,
    locale_resolved: bool,
}

impl<'g> Url<'g> {
    /// Builder for `route`, forked for `request_domain` when the route is bound to domains.
    #[must_use]
    pub fn new(
        generator: &'g UrlGenerator,
        route: &Route,
        params: Params,
        request_domain: Option<&str>,
    ) -> Self {
        let forked = match request_domain {
            Some(domain) if route.params().has_domains() => route.for_domain(domain),
            _ => route.clone(),
        };
        Self {
            generator,
            default_route: route.clone(),
            route: forked,
            params,
            signing: None,
            locale: None,
            locale_resolved: false,
        }
    }

    /// The route links are built for, after domain selection.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn with(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.params.insert(key, value);
        self
    }

    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.params = params;
        self
    }

    /// Resolve the locale links are built for.
    ///
    /// Resolution order: a non-empty caller parameter named like the
    /// route's locale parameter, then `locale`, then the route locale, then
    /// the omit locale. A route locale outside a non-empty locale list
    /// falls back to the first listed locale. Translated segments not set
    /// by the caller are filled in for the resolved locale (one fallback
    /// hop); a missing translation is an error here, unlike during matching.
    pub fn locale(&mut self, locale: Option<&str>) -> Result<&mut Self> {
        let params = self.route.params();
        let locale_name = params.locale_name().to_owned();

        let mut explicit = locale.is_some();
        let mut resolved = locale
            .map(str::to_owned)
            .or_else(|| params.locale.clone())
            .or_else(|| params.locale_omit.clone());
        if let Some(requested) = self.params.get(&locale_name).filter(|l| !l.is_empty()) {
            resolved = Some(requested.to_owned());
            explicit = true;
        }
        if !explicit {
            if let (Some(current), Some(locales)) = (&resolved, &params.locales) {
                if !locales.is_empty() && !locales.contains(current) {
                    resolved = locales.first().cloned();
                }
            }
        }

        for (key, translations) in &params.trans {
            if self.params.contains_key(key) {
                continue;
            }
            let Some(current) = resolved.as_deref() else {
                return Err(RoutingError::translation(
                    Some(&self.route),
                    format!("No locale detected to translate [{key}]"),
                ));
            };
            let translated = translations.get(current).or_else(|| {
                params
                    .fallback_for(current)
                    .and_then(|fallback| translations.get(fallback))
            });
            let Some(translated) = translated else {
                return Err(RoutingError::translation(
                    Some(&self.route),
                    format!("No translation for [{key}] in locale [{current}]"),
                ));
            };
            self.params.insert(key.as_str(), translated);
        }

        // An unresolved locale stays unset so a required `{locale}` is reported missing.
        let segment = match (&resolved, &params.locale_omit) {
            (Some(current), Some(omit)) if current == omit => Some(String::new()),
            (Some(current), _) => Some(current.clone()),
            (None, _) => None,
        };
        let uri = self.route.uri();
        if let Some(segment) = segment {
            if uri.contains(&format!("{{{locale_name}}}"))
                || uri.contains(&format!("{{?{locale_name}}}"))
            {
                self.params.insert(locale_name, segment);
            }
        }

        self.locale = resolved;
        self.locale_resolved = true;
        Ok(self)
    }

    /// Sign the next generated link.
    pub fn sign(&mut self, expiration: Option<Expiration>, with_query: bool) -> &mut Self {
        self.signing = Some(Signing {
            expiration,
            with_query,
        });
        self
    }

    /// Switch to another domain alternative of the route.
    pub fn domain(&mut self, domain: &str) -> &mut Self {
        self.route = self.default_route.for_domain(domain);
        self.locale = None;
        self.locale_resolved = false;
        self
    }

    /// One link per bound domain, keyed by hostname.
    pub fn domained(&mut self) -> Result<Params> {
        let current = self.route.clone();
        let domains: Vec<String> = self
            .default_route
            .params()
            .domains
            .iter()
            .map(|binding| binding.domain.clone())
            .collect();

        let mut urls = Params::new();
        for domain in domains {
            let params = self.params.clone();
            self.domain(&domain);
            let url = self.generate();
            self.params = params;
            match url {
                Ok(url) => {
                    urls.insert(domain, url);
                }
                Err(err) => {
                    self.route = current;
                    return Err(err);
                }
            }
        }
        self.route = current;
        Ok(urls)
    }

    /// One link per locale, skipping locales without a translation.
    ///
    /// Candidates are `locales`, else the route's locale list, else the
    /// locales of its first translation table, else the route locale.
    pub fn translated(&mut self, locales: Option<&[&str]>) -> Result<Params> {
        let candidates: Vec<String> = match locales {
            Some(locales) => locales.iter().map(|l| (*l).to_owned()).collect(),
            None => self.candidate_locales(),
        };

        let mut urls = Params::new();
        for locale in candidates {
            let params = self.params.clone();
            let url = self.locale(Some(&locale)).and_then(|url| url.generate());
            self.params = params;
            match url {
                Ok(url) => {
                    urls.insert(locale, url);
                }
                Err(RoutingError::TranslationMissing { message, .. }) => {
                    debug!(locale = %locale, reason = %message, "Skipping untranslated locale");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(urls)
    }

    /// Whether a link can be built for `locale`.
    pub fn has_translation(&mut self, locale: &str) -> Result<bool> {
        Ok(self.translated(None)?.contains_key(locale))
    }

    fn candidate_locales(&self) -> Vec<String> {
        let params = self.route.params();
        if let Some(locales) = params.locales.as_ref().filter(|l| !l.is_empty()) {
            return locales.clone();
        }
        if let Some((_, translations)) = params.trans.first() {
            return translations.keys().map(str::to_owned).collect();
        }
        params.locale.iter().cloned().collect()
    }

    /// Resolve the link and reset the builder's parameters and locale.
    ///
    /// Signed routes are signed even without [`Url::sign`], in path mode
    /// and without expiry.
    pub fn generate(&mut self) -> Result<String> {
        if !self.locale_resolved {
            if let Err(err) = self.locale(None) {
                self.reset();
                return Err(err);
            }
        }

        let base_url = self
            .route
            .base_url_for(self.locale.as_deref(), self.generator.url_base());
        let signing = self
            .signing
            .or_else(|| self.route.is_signed().then(Signing::default));
        let params = std::mem::take(&mut self.params);
        self.reset();

        let url = match signing {
            Some(Signing {
                expiration,
                with_query,
            }) => self.generator.generate_signed(
                self.route.uri(),
                &params,
                expiration,
                with_query,
                base_url.as_deref(),
            ),
            None => self
                .generator
                .generate(self.route.uri(), &params, base_url.as_deref()),
        };
        Ok(url?)
    }

    fn reset(&mut self) {
        self.params.clear();
        self.locale = None;
        self.locale_resolved = false;
    }
}
