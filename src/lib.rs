//! # Waymark
//!
//! **Waymark** is a request router and URL generator for HTTP applications.
//! It matches incoming requests against a table of route patterns, extracts
//! named parameters, and builds links (localized, domain-aware and
//! HMAC-signed) from the same table.
//!
//! ## Overview
//!
//! A [`Router`] owns the route table and the request currently being
//! routed. Routes are registered with verb shorthands from
//! [`RouteRegistrar`], grouped under shared prefixes, or expanded from CRUD
//! resources. Dispatch walks the table in registration order and returns the
//! first route that accepts the request; the [`Url`] builder turns a named
//! route and parameters back into an absolute URL.
//!
//! ## Architecture
//!
//! - **[`route`]** - route definitions, groups, resources and post-match refinement
//! - **[`dispatcher`]** - pattern compilation and first-match selection
//! - **[`constrainer`]** - named constraint rules (`:num`, `:in:de:en`, ...)
//! - **[`url`]** - link building and HMAC signing
//! - **[`router`]** - the route table, dispatch memoization and handler invocation
//! - **[`middleware`]** - signature verification and HTTP method override
//! - **[`config`]** / **[`logging`]** - environment and YAML configuration, structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use waymark::{RequestData, RouteRegistrar, Router};
//!
//! let request = RequestData::new(Method::GET, "/de/blog/45", Some("example.com"));
//! let mut router = Router::new(request, "https://example.com", "secret-key");
//!
//! router
//!     .get("{?locale}/blog/{id}", "blog.show")
//!     .name("blog.show")
//!     .constrain("id", ":num")
//!     .locales(["de", "en"])
//!     .locale_omit("en");
//!
//! let route = router.dispatch().unwrap();
//! assert_eq!(route.request_parameters().get("id"), Some("45"));
//! assert_eq!(route.params().locale.as_deref(), Some("de"));
//!
//! let mut url = router.url("blog.show", [("id", "46")]).unwrap();
//! url.locale(Some("en")).unwrap();
//! assert_eq!(url.generate().unwrap(), "https://example.com/blog/46");
//! ```
//!
//! ## Signed Links
//!
//! A route marked with [`Route::signed`] gains optional `signature` and
//! `expires` segments. Links are signed with HMAC-SHA256 over the canonical
//! URL and verified on dispatch:
//!
//! ```rust,ignore
//! router.get("unsubscribe/{user}", "unsubscribe").signed("unsubscribe", true);
//!
//! let mut url = router.url("unsubscribe", [("user", "5")])?;
//! url.sign(Some(Expiration::from(1_634_767_200)), false);
//! let link = url.generate()?;
//! ```
//!
//! ## Logging
//!
//! Every routing decision emits a `tracing` event. Install a subscriber with
//! [`logging::init_logging`] or bring your own.

pub mod config;
pub mod constrainer;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod handler;
pub mod logging;
pub mod matched;
pub mod middleware;
pub mod params;
pub mod request;
pub mod route;
pub mod router;
pub mod url;

pub use config::RouterConfig;
pub use constrainer::{Constrainer, Constraint, ConstraintRule, Rule};
pub use dispatcher::RouteDispatcher;
pub use domain::{Domain, Domains};
pub use error::{Result, RoutingError, UrlGenerationError};
pub use handler::{Handler, HandlerInvoker, HandlerResponse, RouteHandler, RouteResponse};
pub use params::Params;
pub use request::RequestData;
pub use route::{QueryConstraint, Refined, Route, RouteGroup, RouteRegistrar, RouteResource};
pub use router::Router;
pub use url::{Expiration, Url, UrlGenerator};
